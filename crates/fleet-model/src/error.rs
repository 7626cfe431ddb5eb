//! Model error type.

use fleet_core::{JobId, NameId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown facility id {0}")]
    UnknownFacility(NameId),

    #[error("unknown item id {0}")]
    UnknownItem(NameId),

    #[error("unknown job id {0}")]
    UnknownJob(JobId),
}

pub type ModelResult<T> = Result<T, ModelError>;

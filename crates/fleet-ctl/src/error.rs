//! Controller error type.

use thiserror::Error;

use fleet_plan::PlanError;

#[derive(Debug, Error)]
pub enum CtlError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("controller used out of order: {0}")]
    State(&'static str),

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CtlResult<T> = Result<T, CtlError>;

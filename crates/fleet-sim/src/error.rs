//! Simulator error type.
//!
//! These are internal-consistency failures (a task naming a facility the
//! situation has never seen, an unroutable position pair).  Planner-level
//! failures — out of battery, missing inputs — are data, not errors: they
//! land in each task's [`TaskResult`](fleet_model::TaskResult) and drive
//! strategy repair.

use thiserror::Error;

use fleet_graph::GraphError;
use fleet_model::ModelError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type SimResult<T> = Result<T, SimError>;

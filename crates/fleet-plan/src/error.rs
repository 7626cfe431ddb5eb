//! Planner error type.

use thiserror::Error;

use fleet_graph::GraphError;
use fleet_sim::SimError;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type PlanResult<T> = Result<T, PlanError>;

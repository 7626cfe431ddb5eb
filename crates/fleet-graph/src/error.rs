//! Graph-subsystem error type.

use thiserror::Error;

use crate::position::GraphPos;

/// Errors produced by `fleet-graph`.
#[derive(Debug, Error)]
pub enum GraphError {
    /// No path between two graph positions.  Should be impossible after SCC
    /// pruning; treated as a fatal internal error by the planner.
    #[error("no road path from {from:?} to {to:?}")]
    NoPath { from: GraphPos, to: GraphPos },

    #[error("bad road file header in {file}: {reason}")]
    BadHeader { file: &'static str, reason: String },

    #[error("road file {file} truncated at byte {at}")]
    Truncated { file: &'static str, at: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;

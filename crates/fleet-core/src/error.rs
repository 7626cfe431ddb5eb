//! Core error type.
//!
//! Sub-crates define their own error enums and either convert into
//! `CoreError` via `From` impls or wrap it as one variant; both patterns are
//! acceptable, prefer whichever keeps error sites clean.

use thiserror::Error;

/// Errors produced by `fleet-core` primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{what} is full (capacity {cap})")]
    Capacity { what: &'static str, cap: usize },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `fleet-core`.
pub type CoreResult<T> = Result<T, CoreError>;

//! `fleet-core` — foundational types for the fleet city-logistics planner.
//!
//! This crate is a dependency of every other `fleet-*` crate.  It intentionally
//! has no `fleet-*` dependencies and minimal external ones (only `rand`,
//! `rustc-hash` and `thiserror`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`ids`]     | `NodeId`, `EdgeId`, `NameId`, `JobId`, `AgentId`          |
//! | [`intern`]  | Fixed-capacity string interning (`NameTable`, `JobTable`) |
//! | [`pos`]     | `Pos` lattice point, `MapBounds` affine conversion        |
//! | [`arena`]   | Append-only byte arena with embedded `FlatArray`s         |
//! | [`rng`]     | `PlanRng` — deterministic planner RNG                     |
//! | [`error`]   | `CoreError`, `CoreResult`                                 |

pub mod arena;
pub mod error;
pub mod ids;
pub mod intern;
pub mod pos;
pub mod rng;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use arena::{Arena, Flat, FlatArray};
pub use error::{CoreError, CoreResult};
pub use ids::{AgentId, EdgeId, JobId, NameId, NodeId};
pub use intern::{JobTable, NameTable};
pub use pos::{MapBounds, Pos, LAT_LON_PADDING};
pub use rng::PlanRng;

/// Number of agents in one match (two teams of eight).
pub const AGENTS: usize = 16;

/// Number of agents under this controller's command.
pub const AGENTS_PER_TEAM: usize = 8;

/// Capacity of one agent's task queue.
pub const TASKS_MAX: usize = 8;

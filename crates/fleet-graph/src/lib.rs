//! `fleet-graph` — compressed road network, snapping, and routing.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`network`]   | `Graph`, `Node`, `Edge`, intrusive adjacency iteration    |
//! | [`position`]  | `GraphPos` — unified node-or-edge coordinate              |
//! | [`builder`]   | `GraphBuilder` for synthetic networks (tests, demos)      |
//! | [`loader`]    | Binary road-file loader (nodes / edges / geometry)        |
//! | [`scc`]       | Strongly-connected-component pruning                      |
//! | [`snap`]      | `Pos` → `GraphPos` snapping                               |
//! | [`router`]    | `dist_road` — bidirectional A* with early termination     |
//! | [`lookup`]    | Per-position single-source Dijkstra cache                 |
//! | [`dist_cache`]| Facility×facility / agent×facility distance memo          |
//! | [`error`]     | `GraphError`, `GraphResult<T>`                            |
//!
//! # Distance units
//!
//! Edge lengths are stored in the road files' native unit of metres·10³.
//! Everything that sums or compares route lengths (`dist_road`, the lookup
//! cache) stays in that unit; [`dist_cache::DistCache`] divides by 1000 when
//! memoising so a whole city fits a `u16` cell.

pub mod builder;
pub mod dist_cache;
pub mod error;
pub mod loader;
pub mod lookup;
pub mod network;
pub mod position;
pub mod router;
pub mod scc;
pub mod snap;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use builder::GraphBuilder;
pub use dist_cache::DistCache;
pub use error::{GraphError, GraphResult};
pub use network::{Edge, EdgeRef, Graph, Node};
pub use position::GraphPos;
pub use lookup::LookupTable;

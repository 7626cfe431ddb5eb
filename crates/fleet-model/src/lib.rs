//! `fleet-model` — the planner's data model.
//!
//! Three lifetimes of state:
//!
//! - [`World`](world::World) — static per match: item recipes, agent roles,
//!   the road graph handle.  Built from the first sim-start message.
//! - [`Situation`](situation::Situation) — one snapshot per step: facilities,
//!   jobs, the sixteen agent self blocks, the strategy, and the book of
//!   partial deliveries.  Cheap to clone; the simulator works on a clone.
//! - [`Strategy`](task::Strategy) — the per-agent bounded task queues that
//!   planning edits in place.
//!
//! List edits that must not happen mid-iteration go through the
//! [`DiffQueue`](diff::DiffQueue) journal and are applied atomically between
//! simulation rounds.

pub mod action;
pub mod diff;
pub mod error;
pub mod facility;
pub mod items;
pub mod job;
pub mod percept;
pub mod situation;
pub mod task;
pub mod world;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use action::{ActionKind, ActionResult};
pub use diff::{DiffQueue, SitEdit};
pub use error::{ModelError, ModelResult};
pub use facility::{
    ChargingStation, Dump, Entity, ResourceNode, Shop, ShopItem, Storage, StorageItem, Workshop,
};
pub use items::{find_stack, find_stack_mut, Item, ItemStack, Role};
pub use job::{Auction, Job, JobKind, Mission};
pub use percept::{Percept, SelfPercept, SimStart};
pub use situation::{Bookkeeping, DeliveredItem, SelfState, Situation};
pub use task::{Strategy, Task, TaskErr, TaskKind, TaskResult, TaskSlot};
pub use world::World;

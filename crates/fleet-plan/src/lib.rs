//! `fleet-plan` — editing strategies until they simulate cleanly.
//!
//! Planning is a fix-point iteration:
//!
//! 1. [`create_work`](work::create_work) seeds a `DeliverItem` task chain
//!    for every open job nobody has claimed yet.
//! 2. [`fix_errors`](repair::fix_errors) repeatedly rolls the plan forward
//!    in the simulator, finds the first task that fails, and applies the
//!    edit that addresses that failure — a charge stop, a purchase, an
//!    assist by a capable teammate, or removal of a doomed task.
//!
//! Buy-and-craft chains are never planned up front: the delivery task fails
//! with `NotInInventory`, the inserted purchase fails with `CraftNoItem`,
//! and so on — each repair materialises exactly the prerequisite the
//! simulator proved missing.
//!
//! The only randomness in the planner lives here (choosing among equally
//! capable agents) and flows through one seeded [`PlanRng`].

pub mod error;
pub mod repair;
pub mod work;


pub use error::{PlanError, PlanResult};
pub use repair::{fix_errors, RepairOutcome, REPAIR_MAX_ITER};
pub use work::create_work;

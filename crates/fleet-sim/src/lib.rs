//! `fleet-sim` — the deterministic forward simulator.
//!
//! # Event-driven clock
//!
//! The simulator does not tick step by step.  Every agent carries a sleep
//! counter; one round runs `task_update` for each agent whose counter hit
//! zero, then advances the clock by the smallest non-zero sleep and
//! subtracts it from everyone.  A full-horizon roll-out therefore costs one
//! round per task *completion event*, not one per step.
//!
//! # Purity
//!
//! `fast_forward` is a pure function of `(World, Situation, Strategy)` — it
//! consults no RNG and no wall clock, so two roll-outs from the same
//! snapshot are byte-identical.  All randomness lives in strategy repair.
//!
//! # Known approximations
//!
//! Shop restocking is modelled as a flat `restock × amount` stall instead of
//! the server's periodic replenishment; money predictions more than a few
//! steps out are unreliable.  Auction bidding and fines are not modelled at
//! all — deliveries against auctions and missions resolve, nothing else.

pub mod error;
pub mod params;
pub mod sim;

#[cfg(test)]
mod tests;

pub use error::{SimError, SimResult};
pub use params::SimParams;
pub use sim::{SimState, SPEED_CONVERSION};

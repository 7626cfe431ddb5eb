//! Simulator tuning constants.

use serde::Deserialize;

/// Knobs for the forward simulator, embedded in the planner configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Steps a crafter waits for inputs or assistants before the craft is
    /// declared failed.
    pub craft_max_wait: u8,

    /// Assumed duration of a shop visit when projecting where an agent will
    /// be, used by repair when slotting in extra purchases.
    pub shop_assume_duration: u8,

    /// Planning horizon in steps; 0 means "to the end of the game".
    pub planning_horizon: u16,
}

impl Default for SimParams {
    fn default() -> Self {
        SimParams {
            craft_max_wait: 10,
            shop_assume_duration: 5,
            planning_horizon: 0,
        }
    }
}

impl SimParams {
    /// The roll-out horizon for a game of `steps` steps.
    pub fn horizon(&self, steps: u16) -> u16 {
        if self.planning_horizon == 0 {
            steps
        } else {
            self.planning_horizon.min(steps)
        }
    }
}

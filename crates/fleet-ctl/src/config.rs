//! Planner configuration.
//!
//! Loaded from a JSON file by the application, or built with `Default` for
//! tests and demos.  Everything has a sensible default so a config file only
//! needs the keys it changes.

use std::path::Path;

use serde::Deserialize;

use fleet_plan::REPAIR_MAX_ITER;
use fleet_sim::SimParams;

use crate::error::CtlResult;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Our team name (matches the team attribute of sim-start).
    pub team: String,

    /// Seed for the repair tie-break RNG; a fixed seed replays a match.
    pub seed: u64,

    /// Iteration cap for one repair pass.
    pub repair_max_iter: usize,

    /// Forward-simulator tuning.
    pub sim: SimParams,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            team: "A".to_owned(),
            seed: 0x5eed,
            repair_max_iter: REPAIR_MAX_ITER,
            sim: SimParams::default(),
        }
    }
}

impl PlannerConfig {
    pub fn from_json_file(path: &Path) -> CtlResult<PlannerConfig> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

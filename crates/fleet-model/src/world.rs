//! The static world: match invariants that never change after sim-start.

use std::sync::Arc;

use fleet_core::{AgentId, NameId, AGENTS};
use fleet_graph::Graph;

use crate::items::{Item, Role};
use crate::percept::SimStart;

/// Item catalogue, per-slot roles and names, match parameters, and the road
/// graph handle.  Built from agent 0's sim-start; the remaining agents fill
/// in their role slots via [`update`](World::update).
#[derive(Clone)]
pub struct World {
    pub team: NameId,
    pub seed_capital: u32,
    pub steps: u16,
    pub items: Vec<Item>,
    pub roles: Vec<Role>,
    /// Agent name per slot (used to key agent positions in caches).
    pub agents: Vec<NameId>,
    pub graph: Arc<Graph>,
}

impl World {
    pub fn new(s0: &SimStart, graph: Arc<Graph>) -> World {
        World {
            team: s0.team,
            seed_capital: s0.seed_capital,
            steps: s0.steps,
            items: s0.items.clone(),
            roles: vec![Role::default(); AGENTS],
            agents: vec![NameId::EMPTY; AGENTS],
            graph,
        }
    }

    /// Record one agent's role and name.
    pub fn update(&mut self, s: &SimStart, agent: AgentId) {
        self.roles[agent.index()] = s.role.clone();
        self.agents[agent.index()] = s.agent;
    }

    pub fn item(&self, id: NameId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    #[inline]
    pub fn role(&self, agent: AgentId) -> &Role {
        &self.roles[agent.index()]
    }
}

//! The per-step situation snapshot.
//!
//! A `Situation` owns everything observable at one step: facilities, the
//! four job lists, sixteen agent self blocks, the team strategy, and the
//! book of partial deliveries.  It is built fresh from agent 0's percept,
//! refined by each further agent's percept, and **cloned** into the
//! simulation state for planning — all children are plain owned values, so
//! the clone relocates freely and mutations to the copy never touch the
//! live snapshot.
//!
//! Two things carry over from the previous step's snapshot:
//! - the delivery book, purged of rows whose job has vanished;
//! - the strategy and each agent's task progress, so half-finished tasks
//!   continue instead of restarting.

use fleet_core::{AgentId, JobId, NameId, Pos, AGENTS};

use crate::action::{ActionKind, ActionResult};
use crate::facility::{
    ChargingStation, Dump, Entity, ResourceNode, Shop, Storage, Workshop,
};
use crate::items::ItemStack;
use crate::job::{Auction, Job, JobKind, Mission};
use crate::percept::Percept;
use crate::task::{Strategy, TaskSlot};

/// `task_state` value marking a completed task awaiting its final sleep.
pub const TASK_DONE: u8 = 0xff;

/// `task_sleep` value for "parked until further notice".
pub const SLEEP_MAX: u8 = 0xff;

// ── SelfState ─────────────────────────────────────────────────────────────────

/// Everything the planner tracks about one agent.
#[derive(Clone, Debug, Default)]
pub struct SelfState {
    pub pos: Pos,
    pub charge: u16,
    pub load: u16,
    /// Facility the agent is inside, or `NameId::EMPTY`.
    pub facility: NameId,
    /// Last `goto` target, so the controller can emit `continue`.
    pub last_go: NameId,
    pub action_kind: ActionKind,
    pub action_result: ActionResult,
    pub items: Vec<ItemStack>,
    /// Head of the agent's task queue.
    pub task_index: u8,
    /// Micro-progress within the active task: 0 = not arrived, 1 = arrived,
    /// 2 = assistant staged, [`TASK_DONE`] = completed pending sleep.
    pub task_state: u8,
    /// Steps until the simulator looks at this agent again.
    pub task_sleep: u8,
}

// ── Bookkeeping ───────────────────────────────────────────────────────────────

/// A partial delivery: what our team has already handed to a job's storage.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DeliveredItem {
    pub job: JobId,
    pub item: ItemStack,
}

/// Cross-step planner bookkeeping that the server does not echo back.
#[derive(Clone, Debug, Default)]
pub struct Bookkeeping {
    pub delivered: Vec<DeliveredItem>,
}

impl Bookkeeping {
    /// Units of `item` already delivered towards `job`.
    pub fn delivered_amount(&self, job: JobId, item: NameId) -> u8 {
        self.delivered
            .iter()
            .find(|d| d.job == job && d.item.item == item)
            .map(|d| d.item.amount)
            .unwrap_or(0)
    }
}

// ── Situation ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Situation {
    pub simulation_step: u16,
    pub team_money: u32,
    pub entities: Vec<Entity>,
    pub charging_stations: Vec<ChargingStation>,
    pub dumps: Vec<Dump>,
    pub shops: Vec<Shop>,
    pub storages: Vec<Storage>,
    pub workshops: Vec<Workshop>,
    pub resource_nodes: Vec<ResourceNode>,
    pub auctions: Vec<Auction>,
    pub jobs: Vec<Job>,
    pub missions: Vec<Mission>,
    pub posteds: Vec<Job>,
    pub selves: [SelfState; AGENTS],
    pub strategy: Strategy,
    pub book: Bookkeeping,
}

impl Situation {
    /// Build the step's snapshot from the first percept, carrying the book
    /// and strategy forward from the previous snapshot where they are still
    /// valid.
    pub fn from_percept(p: &Percept, old: Option<&Situation>) -> Situation {
        let mut sit = Situation {
            simulation_step: p.simulation_step,
            team_money: p.team_money,
            entities: p.entities.clone(),
            charging_stations: p.charging_stations.clone(),
            dumps: p.dumps.clone(),
            shops: p.shops.clone(),
            storages: p.storages.clone(),
            workshops: p.workshops.clone(),
            resource_nodes: p.resource_nodes.clone(),
            auctions: p.auctions.clone(),
            jobs: p.jobs.clone(),
            missions: p.missions.clone(),
            posteds: p.posteds.clone(),
            selves: std::array::from_fn(|_| SelfState::default()),
            strategy: Strategy::new(),
            book: Bookkeeping::default(),
        };
        if let Some(old) = old {
            // Completed and expired jobs drop out of the book.
            for d in &old.book.delivered {
                if sit.find_job(d.job).is_some() {
                    sit.book.delivered.push(*d);
                }
            }
            sit.strategy = old.strategy;
            for (new, prev) in sit.selves.iter_mut().zip(old.selves.iter()) {
                new.task_index = prev.task_index;
                new.task_state = prev.task_state;
                new.last_go = prev.last_go;
            }
        }
        sit
    }

    /// Fold one agent's percept into the snapshot.
    pub fn update(&mut self, p: &Percept, agent: AgentId) {
        let d = &mut self.selves[agent.index()];
        d.pos = p.this_agent.pos;
        d.charge = p.this_agent.charge;
        d.load = p.this_agent.load;
        d.facility = p.this_agent.facility;
        d.action_kind = p.this_agent.action_kind;
        d.action_result = p.this_agent.action_result;
        d.items = p.this_agent.items.clone();
    }

    // ── Access ────────────────────────────────────────────────────────────

    #[inline]
    pub fn agent(&self, agent: AgentId) -> &SelfState {
        &self.selves[agent.index()]
    }

    #[inline]
    pub fn agent_mut(&mut self, agent: AgentId) -> &mut SelfState {
        &mut self.selves[agent.index()]
    }

    /// The slot the agent is currently working on.
    pub fn task_slot(&self, agent: AgentId) -> &TaskSlot {
        let idx = self.selves[agent.index()].task_index as usize;
        self.strategy.task(agent, idx.min(fleet_core::TASKS_MAX - 1))
    }

    /// Position of a facility by id, across all facility lists.
    pub fn find_pos(&self, id: NameId) -> Option<Pos> {
        if let Some(f) = self.charging_stations.iter().find(|f| f.id == id) {
            return Some(f.pos);
        }
        if let Some(f) = self.dumps.iter().find(|f| f.id == id) {
            return Some(f.pos);
        }
        if let Some(f) = self.shops.iter().find(|f| f.id == id) {
            return Some(f.pos);
        }
        if let Some(f) = self.storages.iter().find(|f| f.id == id) {
            return Some(f.pos);
        }
        if let Some(f) = self.workshops.iter().find(|f| f.id == id) {
            return Some(f.pos);
        }
        if let Some(f) = self.resource_nodes.iter().find(|f| f.id == id) {
            return Some(f.pos);
        }
        None
    }

    /// Find a job by id across the kind vectors, in priority order.
    pub fn find_job(&self, id: JobId) -> Option<(JobKind, &Job)> {
        if let Some(j) = self.jobs.iter().find(|j| j.id == id) {
            return Some((JobKind::Priced, j));
        }
        if let Some(a) = self.auctions.iter().find(|a| a.job.id == id) {
            return Some((JobKind::Auction, &a.job));
        }
        if let Some(m) = self.missions.iter().find(|m| m.job.id == id) {
            return Some((JobKind::Mission, &m.job));
        }
        if let Some(j) = self.posteds.iter().find(|j| j.id == id) {
            return Some((JobKind::Posted, j));
        }
        None
    }

    /// Remove a job from whichever vector holds it.  Returns its reward.
    pub fn remove_job(&mut self, id: JobId) -> Option<u16> {
        if let Some(i) = self.jobs.iter().position(|j| j.id == id) {
            return Some(self.jobs.remove(i).reward);
        }
        if let Some(i) = self.auctions.iter().position(|a| a.job.id == id) {
            return Some(self.auctions.remove(i).job.reward);
        }
        if let Some(i) = self.missions.iter().position(|m| m.job.id == id) {
            return Some(self.missions.remove(i).job.reward);
        }
        if let Some(i) = self.posteds.iter().position(|j| j.id == id) {
            return Some(self.posteds.remove(i).reward);
        }
        None
    }
}

//! Inbound message bodies, already interned.
//!
//! The wire protocol (XML over TCP) is an external collaborator; by the time
//! data reaches the planner it has been parsed and every name replaced by
//! its interned id.  These structs are that post-parse shape: `SimStart`
//! once per match per agent, `Percept` once per agent per step.

use fleet_core::{NameId, Pos};

use crate::action::{ActionKind, ActionResult};
use crate::facility::{
    ChargingStation, Dump, Entity, ResourceNode, Shop, Storage, Workshop,
};
use crate::items::{Item, ItemStack, Role};
use crate::job::{Auction, Job, Mission};

/// Match parameters, sent once per agent when a simulation starts.
#[derive(Clone, Debug)]
pub struct SimStart {
    /// The perceiving agent's own name.
    pub agent: NameId,
    pub team: NameId,
    pub seed_capital: u32,
    pub steps: u16,
    /// The perceiving agent's role.
    pub role: Role,
    /// Full item catalogue (identical for every agent).
    pub items: Vec<Item>,
}

/// The perceiving agent's own state within a percept.
#[derive(Clone, Debug, Default)]
pub struct SelfPercept {
    pub pos: Pos,
    pub charge: u16,
    pub load: u16,
    /// Facility the agent is inside, or `NameId::EMPTY`.
    pub facility: NameId,
    pub action_kind: ActionKind,
    pub action_result: ActionResult,
    pub items: Vec<ItemStack>,
}

/// One step's observation for one agent.
#[derive(Clone, Debug)]
pub struct Percept {
    /// Perception id; the action reply must quote it.
    pub id: u16,
    /// Absolute reply deadline in milliseconds.
    pub deadline_ms: u64,
    pub simulation_step: u16,
    pub team_money: u32,
    pub this_agent: SelfPercept,
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
}

//! citysim — smallest end-to-end exercise of the fleet planner.
//!
//! A toy in-process "server" publishes percepts for 16 agents on a four-
//! facility city, the mothership plans, and the server applies the returned
//! actions with one-step travel and a simple buy/deliver economy.  Watching
//! the log shows the whole loop: job intake, repair inserting purchases,
//! agents fanning out, money going up.
//!
//! Run with `RUST_LOG=info cargo run -p citysim` (or `debug` for per-action
//! lines).

mod network;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fleet_core::{AgentId, JobId, NameId, Pos, AGENTS, AGENTS_PER_TEAM};
use fleet_model::{
    ActionKind, ActionResult, ChargingStation, Item, ItemStack, Job, Percept, Role, SelfPercept,
    Shop, ShopItem, SimStart, Storage, Workshop,
};
use fleet_ctl::{Action, Mothership, PlannerConfig};

use network::{
    build_city, shop_pos, station_pos, storage_pos, workshop_pos, SHOP, STATION, STORAGE, WORKSHOP,
};

const ITEM9: NameId = NameId(9);
const STEPS: u16 = 30;
const SEED_MONEY: u32 = 500;

// ── Toy server ────────────────────────────────────────────────────────────────

/// One agent as the toy server sees it.
struct ServerAgent {
    pos: Pos,
    facility: NameId,
    charge: u16,
    items: Vec<ItemStack>,
    last_kind: ActionKind,
    last_result: ActionResult,
}

/// The in-process stand-in for the contest server: instant one-step travel,
/// literal stock, single-line jobs.
struct CityServer {
    step: u16,
    money: u32,
    shop_stock: u8,
    jobs: Vec<Job>,
    agents: Vec<ServerAgent>,
}

impl CityServer {
    fn new() -> CityServer {
        let agents = (0..AGENTS)
            .map(|_| ServerAgent {
                pos: station_pos(),
                facility: STATION,
                charge: 250,
                items: vec![],
                last_kind: ActionKind::NoAction,
                last_result: ActionResult::Successful,
            })
            .collect();
        CityServer {
            step: 0,
            money: SEED_MONEY,
            shop_stock: 10,
            jobs: vec![
                Job {
                    id: JobId(100),
                    storage: STORAGE,
                    start: 0,
                    end: STEPS,
                    reward: 400,
                    required: vec![ItemStack::new(ITEM9, 1)],
                },
                Job {
                    id: JobId(101),
                    storage: STORAGE,
                    start: 0,
                    end: STEPS,
                    reward: 250,
                    required: vec![ItemStack::new(ITEM9, 1)],
                },
            ],
            agents,
        }
    }

    fn facility_pos(&self, id: NameId) -> Option<Pos> {
        match id {
            SHOP => Some(shop_pos()),
            STORAGE => Some(storage_pos()),
            WORKSHOP => Some(workshop_pos()),
            STATION => Some(station_pos()),
            _ => None,
        }
    }

    fn percept_for(&self, agent: AgentId) -> Percept {
        let a = &self.agents[agent.index()];
        Percept {
            id: self.step,
            deadline_ms: 0,
            simulation_step: self.step,
            team_money: self.money,
            this_agent: SelfPercept {
                pos: a.pos,
                charge: a.charge,
                load: 0,
                facility: a.facility,
                action_kind: a.last_kind,
                action_result: a.last_result,
                items: a.items.clone(),
            },
            entities: vec![],
            charging_stations: vec![ChargingStation {
                id: STATION,
                pos: station_pos(),
                rate: 5,
                price: 0,
                slots: 4,
                q_size: 0,
            }],
            dumps: vec![],
            shops: vec![Shop {
                id: SHOP,
                pos: shop_pos(),
                restock: 5,
                items: vec![ShopItem { item: ITEM9, amount: self.shop_stock, cost: 50, restock: 5 }],
            }],
            storages: vec![Storage {
                id: STORAGE,
                pos: storage_pos(),
                price: 0,
                total_cap: 10_000,
                used_cap: 0,
                items: vec![],
            }],
            workshops: vec![Workshop { id: WORKSHOP, pos: workshop_pos(), price: 0 }],
            resource_nodes: vec![],
            auctions: vec![],
            jobs: self.jobs.clone(),
            missions: vec![],
            posteds: vec![],
        }
    }

    /// Execute one agent's action: one-step travel, literal economy.
    fn apply(&mut self, agent: AgentId, action: Action) {
        let i = agent.index();
        let (kind, result) = match action {
            Action::GotoFacility(f) => match self.facility_pos(f) {
                Some(pos) => {
                    self.agents[i].pos = pos;
                    self.agents[i].facility = f;
                    self.agents[i].charge = self.agents[i].charge.saturating_sub(10);
                    (ActionKind::Goto, ActionResult::Successful)
                }
                None => (ActionKind::Goto, ActionResult::FailedUnknownFacility),
            },
            Action::Buy(stack) => {
                if self.agents[i].facility == SHOP && self.shop_stock >= stack.amount {
                    self.shop_stock -= stack.amount;
                    self.money = self.money.saturating_sub(stack.amount as u32 * 50);
                    add_stack(&mut self.agents[i].items, stack);
                    (ActionKind::Buy, ActionResult::Successful)
                } else {
                    (ActionKind::Buy, ActionResult::FailedItemAmount)
                }
            }
            Action::DeliverJob(job_id) => {
                let Some(jx) = self.jobs.iter().position(|j| j.id == job_id) else {
                    self.agents[i].last_kind = ActionKind::DeliverJob;
                    self.agents[i].last_result = ActionResult::FailedUnknownJob;
                    return;
                };
                let at_storage = self.agents[i].facility == self.jobs[jx].storage;
                let line = self.jobs[jx].required[0];
                let carried = self.agents[i]
                    .items
                    .iter()
                    .find(|s| s.item == line.item)
                    .map(|s| s.amount)
                    .unwrap_or(0);
                if at_storage && carried >= line.amount {
                    take_stack(&mut self.agents[i].items, line);
                    self.money += self.jobs[jx].reward as u32;
                    self.jobs.remove(jx);
                    (ActionKind::DeliverJob, ActionResult::Successful)
                } else {
                    (ActionKind::DeliverJob, ActionResult::FailedJobStatus)
                }
            }
            Action::Charge => {
                if self.agents[i].facility == STATION {
                    self.agents[i].charge = 250;
                    (ActionKind::Charge, ActionResult::Successful)
                } else {
                    (ActionKind::Charge, ActionResult::FailedWrongFacility)
                }
            }
            Action::Continue => (ActionKind::Continue, ActionResult::Successful),
            _ => (action.kind(), ActionResult::Useless),
        };
        self.agents[i].last_kind = kind;
        self.agents[i].last_result = result;
    }
}

fn add_stack(items: &mut Vec<ItemStack>, stack: ItemStack) {
    match items.iter_mut().find(|s| s.item == stack.item) {
        Some(s) => s.amount += stack.amount,
        None => items.push(stack),
    }
}

fn take_stack(items: &mut [ItemStack], stack: ItemStack) {
    if let Some(s) = items.iter_mut().find(|s| s.item == stack.item) {
        s.amount = s.amount.saturating_sub(stack.amount);
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let graph = build_city();
    let mut ship = Mothership::new(graph, PlannerConfig::default());
    let mut server = CityServer::new();

    // Sim-start for every agent slot.
    for i in 0..AGENTS {
        let start = SimStart {
            agent: NameId(40 + i as u8),
            team: NameId(1),
            seed_capital: SEED_MONEY,
            steps: STEPS,
            role: Role { id: NameId(30), speed: 2, battery: 250, load: 300, tools: vec![] },
            items: vec![Item {
                id: ITEM9,
                volume: 10,
                assembled: false,
                consumed: vec![],
                tools: vec![],
            }],
        };
        ship.on_sim_start(AgentId(i as u8), &start);
    }

    for step in 0..STEPS {
        server.step = step;
        ship.pre_step();
        for i in 0..AGENTS {
            let agent = AgentId(i as u8);
            let percept = server.percept_for(agent);
            ship.perceive(agent, &percept)?;
        }
        let outcome = ship.plan()?;
        for i in 0..AGENTS_PER_TEAM {
            let agent = AgentId(i as u8);
            let action = ship.action_for(agent)?;
            info!(step, agent = i, %action, "acting");
            server.apply(agent, action);
        }
        info!(
            step,
            money = server.money,
            open_jobs = server.jobs.len(),
            converged = outcome.converged,
            "step done"
        );
        if server.jobs.is_empty() {
            info!(step, money = server.money, "all jobs delivered");
            break;
        }
    }

    info!(final_money = server.money, "simulation over");
    Ok(())
}

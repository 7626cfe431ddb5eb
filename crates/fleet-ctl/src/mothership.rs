//! The controller.
//!
//! # Per-step control flow
//!
//! ```text
//! pre_step()                 swap the situation buffers
//! perceive(agent, percept)   × agents: build the snapshot (agent 0), fold
//!                            in the agent's self block, absorb its last
//!                            action's result into the task queue, register
//!                            its position in the distance cache
//! plan()                     compact queues, seed work, repair to fix-point
//! action_for(agent)          × agents: derive one action from the task head
//! ```
//!
//! Result interpretation and action emission are deliberately split: a
//! percept that reports a successful buy/assemble/delivery advances (or
//! counts down) the matching task *before* planning, so repair always works
//! on an up-to-date queue, and `action_for` only has to look at the head
//! task's kind and micro-state.
//!
//! The controller owns three pieces of cross-step state: the static world,
//! the current and previous situations, and the facility distance cache.
//! The simulation state is private to planning — `plan` resets it from the
//! live situation on every repair iteration, and only the repaired strategy
//! survives (it lives in the live situation the repair loop edits).

use std::sync::Arc;

use tracing::{debug, info};

use fleet_core::{AgentId, NameId, PlanRng, AGENTS, AGENTS_PER_TEAM, TASKS_MAX};
use fleet_graph::{DistCache, Graph};
use fleet_model::situation::DeliveredItem;
use fleet_model::{
    find_stack, ActionKind, ActionResult, ItemStack, Percept, SimStart, Situation, TaskKind, World,
};
use fleet_plan::{create_work, fix_errors, RepairOutcome};
use fleet_sim::SimState;

use crate::action::Action;
use crate::config::PlannerConfig;
use crate::error::{CtlError, CtlResult};

pub struct Mothership {
    graph: Arc<Graph>,
    config: PlannerConfig,
    rng: PlanRng,
    world: Option<World>,
    sit: Option<Situation>,
    sit_old: Option<Situation>,
    sim: Option<SimState>,
    cache: Option<DistCache>,
}

impl Mothership {
    pub fn new(graph: Arc<Graph>, config: PlannerConfig) -> Mothership {
        let rng = PlanRng::new(config.seed);
        Mothership {
            graph,
            config,
            rng,
            world: None,
            sit: None,
            sit_old: None,
            sim: None,
            cache: None,
        }
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn situation(&self) -> Option<&Situation> {
        self.sit.as_ref()
    }

    // ── Match setup ───────────────────────────────────────────────────────

    /// Ingest one agent's sim-start.  The first one builds the world; every
    /// agent contributes its role and name.
    pub fn on_sim_start(&mut self, agent: AgentId, s: &SimStart) {
        if self.world.is_none() {
            self.world = Some(World::new(s, self.graph.clone()));
        }
        if let Some(world) = self.world.as_mut() {
            world.update(s, agent);
        }
    }

    // ── Perception ────────────────────────────────────────────────────────

    /// Start a new step: the current situation becomes the previous one.
    pub fn pre_step(&mut self) {
        self.sit_old = self.sit.take();
    }

    /// Ingest one agent's percept.  The first percept of the step builds the
    /// snapshot (carrying the book and strategy forward); each percept then
    /// fills in that agent's self block and absorbs its action result.
    pub fn perceive(&mut self, agent: AgentId, p: &Percept) -> CtlResult<()> {
        if self.sit.is_none() {
            let sit = Situation::from_percept(p, self.sit_old.as_ref());
            if let Some(cache) = self.cache.as_mut() {
                cache.reset();
            } else {
                self.cache = Some(build_cache(&self.graph, &sit));
            }
            self.sit = Some(sit);
        }
        let world = self.world.as_ref().ok_or(CtlError::State("no world"))?;
        let sit = self.sit.as_mut().ok_or(CtlError::State("no situation"))?;
        sit.update(p, agent);

        let old_items: Vec<ItemStack> = self
            .sit_old
            .as_ref()
            .map(|old| old.agent(agent).items.clone())
            .unwrap_or_default();
        absorb_result(sit, agent, &old_items);

        // Owned agents' positions join the distance cache for this step.
        if agent.index() < AGENTS_PER_TEAM {
            if let Some(cache) = self.cache.as_mut() {
                cache.register_pos(&self.graph, world.agents[agent.index()], p.this_agent.pos);
            }
        }
        Ok(())
    }

    // ── Planning ──────────────────────────────────────────────────────────

    /// Seed work for open jobs and repair the strategy to a fix-point.
    pub fn plan(&mut self) -> CtlResult<RepairOutcome> {
        let world = self.world.as_ref().ok_or(CtlError::State("no world"))?;
        let sit = self.sit.as_mut().ok_or(CtlError::State("no situation"))?;
        let cache = self.cache.as_mut().ok_or(CtlError::State("no distance cache"))?;
        cache.load_positions();

        // Completed queue heads are dropped so planning always edits a
        // front-aligned queue.
        for i in 0..AGENTS {
            let agent = AgentId(i as u8);
            let done = sit.agent(agent).task_index as usize;
            if done > 0 {
                sit.strategy.drop_front(agent, done);
                sit.agent_mut(agent).task_index = 0;
            }
        }

        let seeded = create_work(world, sit, cache)?;

        if self.sim.is_none() {
            self.sim = Some(SimState::new(sit, self.config.sim.clone()));
        }
        let sim = self.sim.as_mut().expect("simulation state just initialised");

        let outcome = fix_errors(world, sit, sim, &mut self.rng, self.config.repair_max_iter)?;
        info!(
            step = sit.simulation_step,
            money = sit.team_money,
            seeded,
            converged = outcome.converged,
            iterations = outcome.iterations,
            edits = outcome.edits,
            "planning pass finished"
        );
        Ok(outcome)
    }

    // ── Action derivation ─────────────────────────────────────────────────

    /// One concrete action for `agent`, derived from its task head.
    pub fn action_for(&mut self, agent: AgentId) -> CtlResult<Action> {
        let world = self.world.as_ref().ok_or(CtlError::State("no world"))?;
        let sit = self.sit.as_mut().ok_or(CtlError::State("no situation"))?;
        let action = derive_action(world, sit, agent);
        debug!(agent = agent.0, %action, "action derived");
        Ok(action)
    }
}

// ── Cache construction ────────────────────────────────────────────────────────

/// Register every facility of the first snapshot and warm its lookups.
fn build_cache(graph: &Graph, sit: &Situation) -> DistCache {
    let count = sit.charging_stations.len()
        + sit.dumps.len()
        + sit.shops.len()
        + sit.storages.len()
        + sit.workshops.len()
        + sit.resource_nodes.len();
    let mut cache = DistCache::new(count);
    for f in &sit.charging_stations {
        cache.register_pos(graph, f.id, f.pos);
    }
    for f in &sit.dumps {
        cache.register_pos(graph, f.id, f.pos);
    }
    for f in &sit.shops {
        cache.register_pos(graph, f.id, f.pos);
    }
    for f in &sit.storages {
        cache.register_pos(graph, f.id, f.pos);
    }
    for f in &sit.workshops {
        cache.register_pos(graph, f.id, f.pos);
    }
    for f in &sit.resource_nodes {
        cache.register_pos(graph, f.id, f.pos);
    }
    cache.calc_facilities(graph);
    cache
}

// ── Result absorption ─────────────────────────────────────────────────────────

fn delivery_ok(result: ActionResult) -> bool {
    matches!(result, ActionResult::Successful | ActionResult::SuccessfulPartial)
}

/// Fold the observed result of the agent's last action into its queue:
/// successful buys/assemblies/deliveries advance or count down the matching
/// task, and delivered goods are written into the book.
fn absorb_result(sit: &mut Situation, agent: AgentId, old_items: &[ItemStack]) {
    let idx = sit.agent(agent).task_index as usize;
    if idx >= TASKS_MAX {
        return;
    }
    let task = sit.strategy.task(agent, idx).task;
    let d = sit.agent(agent);
    let kind = d.action_kind;
    let result = d.action_result;

    let mut advance = false;
    match task.kind {
        TaskKind::BuyItem => {
            advance = kind == ActionKind::Buy && result.ok();
        }
        TaskKind::Retrieve => {
            advance = kind == ActionKind::Retrieve && result.ok();
        }
        TaskKind::CraftItem => {
            if kind == ActionKind::Assemble && result.ok() {
                let slot = sit.strategy.task_mut(agent, idx);
                slot.task.item.amount = slot.task.item.amount.saturating_sub(1);
                advance = slot.task.item.amount == 0;
            }
        }
        TaskKind::CraftAssist => {
            if kind == ActionKind::AssistAssemble && result.ok() {
                let slot = sit.strategy.task_mut(agent, idx);
                slot.task.item.amount = slot.task.item.amount.saturating_sub(1);
                advance = slot.task.item.amount == 0;
            }
        }
        TaskKind::DeliverItem => {
            if kind == ActionKind::DeliverJob && delivery_ok(result) {
                // Whatever left the inventory since last step went into the
                // job's storage.
                let current = sit.agent(agent).items.clone();
                for old in old_items {
                    let now = find_stack(&current, old.item).map(|s| s.amount).unwrap_or(0);
                    if old.amount > now {
                        book_delivery(sit, task.job, ItemStack::new(old.item, old.amount - now));
                    }
                }
                advance = true;
            }
        }
        TaskKind::None | TaskKind::Charge | TaskKind::Visit => {
            // Charge and visit complete by state, in `derive_action`.
        }
    }

    if advance {
        let d = sit.agent_mut(agent);
        d.task_index += 1;
        d.task_state = 0;
    }
}

fn book_delivery(sit: &mut Situation, job: fleet_core::JobId, item: ItemStack) {
    let row = sit
        .book
        .delivered
        .iter_mut()
        .find(|r| r.job == job && r.item.item == item.item);
    match row {
        Some(r) => r.item.amount = r.item.amount.saturating_add(item.amount),
        None => sit.book.delivered.push(DeliveredItem { job, item }),
    }
}

// ── Task head → action ────────────────────────────────────────────────────────

/// Emit the action the head task needs right now.  Completion by observed
/// result happened in [`absorb_result`]; the loop here only advances over
/// tasks that complete by state (arrival, full battery, `None` queues).
fn derive_action(world: &World, sit: &mut Situation, agent: AgentId) -> Action {
    loop {
        let idx = sit.agent(agent).task_index as usize;
        if idx >= TASKS_MAX {
            return Action::Abort;
        }
        let task = sit.strategy.task(agent, idx).task;

        match task.kind {
            TaskKind::None => return Action::Abort,

            TaskKind::BuyItem => {
                return staged(sit, agent, task.where_).unwrap_or(Action::Buy(task.item));
            }

            TaskKind::Retrieve => {
                return staged(sit, agent, task.where_).unwrap_or(Action::Retrieve(task.item));
            }

            TaskKind::CraftItem => {
                return staged(sit, agent, task.where_)
                    .unwrap_or(Action::Assemble(task.item.item));
            }

            TaskKind::CraftAssist => {
                let crafter = world
                    .agents
                    .get(task.crafter.index())
                    .copied()
                    .unwrap_or(NameId::EMPTY);
                return staged(sit, agent, task.where_)
                    .unwrap_or(Action::AssistAssemble(crafter));
            }

            TaskKind::DeliverItem => {
                return staged(sit, agent, task.where_)
                    .unwrap_or(Action::DeliverJob(task.job));
            }

            TaskKind::Charge => {
                if let Some(goto) = staged(sit, agent, task.where_) {
                    return goto;
                }
                if sit.agent(agent).charge >= world.role(agent).battery {
                    // Fully charged: this task is done by state.
                    let d = sit.agent_mut(agent);
                    d.task_index += 1;
                    d.task_state = 0;
                    continue;
                }
                return Action::Charge;
            }

            TaskKind::Visit => {
                match agent_goto(sit, agent, task.where_) {
                    Some(goto) => return goto,
                    None => {
                        let d = sit.agent_mut(agent);
                        d.task_index += 1;
                        d.task_state = 0;
                        continue;
                    }
                }
            }
        }
    }
}

/// Travel staging for facility-bound tasks: returns the goto/continue action
/// while still under way, or `None` once arrived (micro-state set to 1).
fn staged(sit: &mut Situation, agent: AgentId, where_: NameId) -> Option<Action> {
    if sit.agent(agent).task_state == 0 {
        match agent_goto(sit, agent, where_) {
            Some(a) => return Some(a),
            None => sit.agent_mut(agent).task_state = 1,
        }
    }
    None
}

/// Route towards a facility: `None` once the agent is inside it, `continue`
/// while a previously issued goto is still being followed successfully, a
/// fresh `goto` otherwise.
fn agent_goto(sit: &mut Situation, agent: AgentId, where_: NameId) -> Option<Action> {
    if sit.agent(agent).facility == where_ {
        return None;
    }
    let d = sit.agent_mut(agent);
    if d.last_go == where_ && d.action_kind == ActionKind::Goto && d.action_result.ok() {
        Some(Action::Continue)
    } else {
        d.last_go = where_;
        Some(Action::GotoFacility(where_))
    }
}

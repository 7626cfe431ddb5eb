//! The simulation state and its event-driven roll-out.

use fleet_core::{AgentId, JobId, NameId, AGENTS, TASKS_MAX};
use fleet_model::situation::{SLEEP_MAX, TASK_DONE};
use fleet_model::{
    find_stack, find_stack_mut, DiffQueue, ItemStack, ModelError, SitEdit, Situation, Task,
    TaskErr, TaskKind, World,
};

use crate::error::SimResult;
use crate::params::SimParams;

/// Metres one unit of role speed covers per step.  Route lengths divide down
/// to "travel units" so that `units / speed` is a step count.
pub const SPEED_CONVERSION: u32 = 500;

/// Outcome of a craft feasibility check.
enum CraftCheck {
    Feasible,
    NoItem(ItemStack),
    NoTool(NameId),
}

// ── SimState ──────────────────────────────────────────────────────────────────

/// A forward simulation over a private clone of the live situation.
///
/// [`reset`](Self::reset) re-clones the live snapshot; [`fast_forward`]
/// (Self::fast_forward) rolls tasks out to a horizon, writing each task's
/// verdict into its strategy slot.  The live situation is never touched.
pub struct SimState {
    sit: Situation,
    diff: DiffQueue,
    pub params: SimParams,
}

impl SimState {
    pub fn new(live: &Situation, params: SimParams) -> SimState {
        SimState { sit: live.clone(), diff: DiffQueue::new(), params }
    }

    /// Discard all simulated progress and restart from `live`.
    pub fn reset(&mut self, live: &Situation) {
        self.sit = live.clone();
        self.diff.clear();
    }

    /// The simulated situation (read-only; mutate only through a roll-out).
    pub fn sit(&self) -> &Situation {
        &self.sit
    }

    // ── Roll-out ──────────────────────────────────────────────────────────

    /// Advance the simulation to `max_step`.
    ///
    /// One round wakes every agent whose sleep counter reached zero, runs
    /// its [`task_update`](Self::task_update), then advances the clock by
    /// the smallest non-zero sleep.  Queued diff edits apply between
    /// rounds; expired jobs are dropped after each clock advance.
    pub fn fast_forward(&mut self, world: &World, max_step: u16) -> SimResult<()> {
        let mut sleep_old: u8 = 0;
        while self.sit.simulation_step < max_step {
            let remaining = max_step - self.sit.simulation_step;
            let mut sleep_min: u8 = remaining.min(SLEEP_MAX as u16) as u8;

            for i in 0..AGENTS {
                let agent = AgentId(i as u8);
                {
                    let d = &mut self.sit.selves[i];
                    if d.task_sleep != SLEEP_MAX {
                        d.task_sleep = d.task_sleep.saturating_sub(sleep_old);
                    }
                    if d.task_sleep != 0 {
                        continue;
                    }
                }
                self.task_update(world, agent)?;

                let (sleep, state, idx) = {
                    let d = &self.sit.selves[i];
                    (d.task_sleep, d.task_state, d.task_index as usize)
                };
                sleep_min = sleep_min.min(sleep);

                if state == TASK_DONE {
                    let slot = self.sit.strategy.task_mut(agent, idx.min(TASKS_MAX - 1));
                    slot.result.time = self.sit.simulation_step + sleep as u16;
                    slot.result.err = TaskErr::Success;
                    let d = &mut self.sit.selves[i];
                    d.task_index += 1;
                    d.task_state = 0;
                    // Sleep deliberately kept: some tasks sleep on completion.
                }

                // An assistant that just staged (state 2) wakes a crafter
                // processed earlier in this round out of its input wait.
                let cur = self.sit.selves[i].task_index as usize;
                if cur < TASKS_MAX {
                    let t = self.sit.strategy.task(agent, cur).task;
                    if t.kind == TaskKind::CraftAssist
                        && self.sit.selves[i].task_state == 2
                        && t.crafter != AgentId::INVALID
                        && t.crafter < agent
                        && self.sit.agent(t.crafter).task_state == 2
                    {
                        self.sit.selves[t.crafter.index()].task_sleep = 1;
                        sleep_min = 1;
                    }
                }
            }

            self.diff.apply(&mut self.sit);

            debug_assert!(sleep_min > 0, "simulation failed to advance");
            let advance = sleep_min.max(1);
            self.sit.simulation_step += advance as u16;
            self.expire_jobs();
            sleep_old = advance;
        }
        Ok(())
    }

    /// Remove every job past its end step, bookkeeping included.
    fn expire_jobs(&mut self) {
        let step = self.sit.simulation_step;
        let mut expired: Vec<JobId> = Vec::new();
        expired.extend(self.sit.jobs.iter().filter(|j| j.end < step).map(|j| j.id));
        expired.extend(self.sit.auctions.iter().filter(|a| a.job.end < step).map(|a| a.job.id));
        expired.extend(self.sit.missions.iter().filter(|m| m.job.end < step).map(|m| m.job.id));
        expired.extend(self.sit.posteds.iter().filter(|j| j.end < step).map(|j| j.id));
        for id in expired {
            self.sit.book.delivered.retain(|d| d.job != id);
            self.sit.remove_job(id);
        }
    }

    // ── Travel ────────────────────────────────────────────────────────────

    /// Schedule travel to `target` without emitting an action ("no-level"
    /// travel: pure simulation).  Charges battery and sets the sleep; an
    /// unreachable-on-this-charge route fails the current task with
    /// `OutOfBattery`.
    fn agent_goto_nl(&mut self, world: &World, agent: AgentId, target: NameId) -> SimResult<()> {
        if self.sit.agent(agent).facility == target {
            return Ok(());
        }
        let target_pos = self
            .sit
            .find_pos(target)
            .ok_or(ModelError::UnknownFacility(target))?;
        let from = self.sit.agent(agent).pos;
        let p1 = world.graph.snap(from);
        let p2 = world.graph.snap(target_pos);
        let dist = world.graph.dist_road(p1, p2)? / 1000 / SPEED_CONVERSION;
        let speed = world.role(agent).speed.max(1) as u32;
        let idx = (self.sit.agent(agent).task_index as usize).min(TASKS_MAX - 1);

        let d = &mut self.sit.selves[agent.index()];
        if dist > (d.charge as u32 / 10) * speed {
            d.task_sleep = SLEEP_MAX;
            self.sit.strategy.task_mut(agent, idx).result.err = TaskErr::OutOfBattery;
        } else {
            d.charge -= ((dist / speed) * 10) as u16;
            d.task_sleep = (dist / speed).min(0xfe) as u8;
            // Teleport-at-arrival: nothing reads the position mid-sleep.
            d.pos = target_pos;
            d.facility = target;
        }
        Ok(())
    }

    // ── Task effects ──────────────────────────────────────────────────────

    /// Attempt the next atomic effect of `agent`'s active task.  Called only
    /// when the agent's sleep counter is zero.
    fn task_update(&mut self, world: &World, agent: AgentId) -> SimResult<()> {
        let idx = self.sit.agent(agent).task_index as usize;
        if idx >= TASKS_MAX {
            self.sit.selves[agent.index()].task_sleep = SLEEP_MAX;
            return Ok(());
        }
        let task = self.sit.strategy.task(agent, idx).task;

        match task.kind {
            TaskKind::None => {
                self.sit.selves[agent.index()].task_sleep = SLEEP_MAX;
            }

            TaskKind::BuyItem => {
                if self.sit.agent(agent).task_state == 0 {
                    self.agent_goto_nl(world, agent, task.where_)?;
                    self.sit.selves[agent.index()].task_state = 1;
                }
                if self.sit.agent(agent).task_state == 1 && self.sit.agent(agent).task_sleep == 0 {
                    let (in_stock, restock, cost) = {
                        let shop = self
                            .sit
                            .shops
                            .iter_mut()
                            .find(|s| s.id == task.where_)
                            .ok_or(ModelError::UnknownFacility(task.where_))?;
                        let restock = shop.restock;
                        let line = shop
                            .stock_mut(task.item.item)
                            .ok_or(ModelError::UnknownItem(task.item.item))?;
                        let in_stock = line.amount >= task.item.amount;
                        let cost = line.cost;
                        line.amount = line.amount.saturating_sub(task.item.amount);
                        (in_stock, restock, cost)
                    };
                    self.sit.team_money = self
                        .sit
                        .team_money
                        .saturating_sub(task.item.amount as u32 * cost as u32);
                    let d = &mut self.sit.selves[agent.index()];
                    d.task_state = TASK_DONE;
                    d.task_sleep = if in_stock {
                        1
                    } else {
                        // Coarse restock model; see the crate docs.
                        restock.saturating_mul(task.item.amount).max(1)
                    };
                    self.add_to_inventory(agent, task.item);
                }
            }

            TaskKind::Retrieve => {
                if self.sit.agent(agent).task_state == 0 {
                    self.agent_goto_nl(world, agent, task.where_)?;
                    self.sit.selves[agent.index()].task_state = 1;
                }
                if self.sit.agent(agent).task_state == 1 && self.sit.agent(agent).task_sleep == 0 {
                    let took = {
                        let storage = self
                            .sit
                            .storages
                            .iter_mut()
                            .find(|s| s.id == task.where_)
                            .ok_or(ModelError::UnknownFacility(task.where_))?;
                        match storage.items.iter_mut().find(|s| s.item == task.item.item) {
                            Some(line) => {
                                let took = line.delivered.min(task.item.amount);
                                line.delivered -= took;
                                took
                            }
                            None => 0,
                        }
                    };
                    if took == 0 {
                        let slot = self.sit.strategy.task_mut(agent, idx);
                        slot.result.err = TaskErr::NotInInventory;
                        slot.result.err_arg = task.item;
                        self.sit.selves[agent.index()].task_sleep = SLEEP_MAX;
                        return Ok(());
                    }
                    self.add_to_inventory(agent, ItemStack::new(task.item.item, took));
                    let d = &mut self.sit.selves[agent.index()];
                    d.task_sleep = 1;
                    d.task_state = TASK_DONE;
                }
            }

            TaskKind::CraftItem => self.update_craft(world, agent, idx, &task)?,

            TaskKind::CraftAssist => {
                if self.sit.agent(agent).task_state == 0 {
                    self.agent_goto_nl(world, agent, task.where_)?;
                    self.sit.selves[agent.index()].task_state = 1;
                }
                if self.sit.agent(agent).task_state == 1 && self.sit.agent(agent).task_sleep == 0 {
                    let d = &mut self.sit.selves[agent.index()];
                    d.task_sleep = SLEEP_MAX;
                    d.task_state = 2;
                    let found = task.crafter != AgentId::INVALID
                        && self
                            .sit
                            .strategy
                            .queue(task.crafter)
                            .iter()
                            .any(|s| s.task.kind == TaskKind::CraftItem);
                    if !found {
                        self.sit.strategy.task_mut(agent, idx).result.err =
                            TaskErr::NoCrafterFound;
                        self.sit.selves[agent.index()].task_sleep = SLEEP_MAX;
                    }
                }
                // State 2 is resolved externally by the crafter.
            }

            TaskKind::DeliverItem => self.update_deliver(world, agent, idx, &task)?,

            TaskKind::Charge => {
                if self.sit.agent(agent).task_state == 0 {
                    self.agent_goto_nl(world, agent, task.where_)?;
                    self.sit.selves[agent.index()].task_state = 1;
                }
                if self.sit.agent(agent).task_state == 1 && self.sit.agent(agent).task_sleep == 0 {
                    let rate = self
                        .sit
                        .charging_stations
                        .iter()
                        .find(|c| c.id == task.where_)
                        .ok_or(ModelError::UnknownFacility(task.where_))?
                        .rate
                        .max(1);
                    let battery = world.role(agent).battery;
                    let d = &mut self.sit.selves[agent.index()];
                    d.task_sleep =
                        ((battery.saturating_sub(d.charge) / rate as u16).min(0xfe) as u8).max(1);
                    d.charge = battery;
                    d.task_state = TASK_DONE;
                }
            }

            TaskKind::Visit => {
                if self.sit.agent(agent).task_state == 0 {
                    self.agent_goto_nl(world, agent, task.where_)?;
                    self.sit.selves[agent.index()].task_state = 1;
                }
                if self.sit.agent(agent).task_state == 1 && self.sit.agent(agent).task_sleep == 0 {
                    let d = &mut self.sit.selves[agent.index()];
                    d.task_sleep = 1;
                    d.task_state = TASK_DONE;
                }
            }
        }
        Ok(())
    }

    // ── Crafting ──────────────────────────────────────────────────────────

    fn update_craft(
        &mut self,
        world: &World,
        agent: AgentId,
        idx: usize,
        task: &Task,
    ) -> SimResult<()> {
        if self.sit.agent(agent).task_state == 0 {
            self.agent_goto_nl(world, agent, task.where_)?;
            self.sit.selves[agent.index()].task_state = 1;
        }
        let state = self.sit.agent(agent).task_state;
        let sleep = self.sit.agent(agent).task_sleep;

        if state == 1 && sleep == 0 {
            if !matches!(self.craft_check(world, agent, task)?, CraftCheck::Feasible) {
                // Inputs or assistants missing: wait for them once.
                let d = &mut self.sit.selves[agent.index()];
                d.task_state = 2;
                d.task_sleep = self.params.craft_max_wait.max(1);
                return Ok(());
            }
        } else if state == 2 && sleep == 0 {
            // Woken from the wait; still infeasible means the craft failed.
            match self.craft_check(world, agent, task)? {
                CraftCheck::Feasible => {}
                CraftCheck::NoItem(missing) => {
                    let slot = self.sit.strategy.task_mut(agent, idx);
                    slot.result.err = TaskErr::CraftNoItem;
                    slot.result.err_arg = missing;
                    let d = &mut self.sit.selves[agent.index()];
                    d.task_state = 3; // keep clear of the assistant wake-up
                    d.task_sleep = SLEEP_MAX;
                    return Ok(());
                }
                CraftCheck::NoTool(tool) => {
                    let slot = self.sit.strategy.task_mut(agent, idx);
                    slot.result.err = TaskErr::CraftNoTool;
                    slot.result.err_arg = ItemStack::new(tool, 1);
                    let d = &mut self.sit.selves[agent.index()];
                    d.task_state = 3;
                    d.task_sleep = SLEEP_MAX;
                    return Ok(());
                }
            }
        }

        let state = self.sit.agent(agent).task_state;
        if (state == 1 || state == 2) && self.sit.agent(agent).task_sleep == 0 {
            // Feasible: consume inputs across crafter and staged assistants,
            // in agent order.
            let participants = self.craft_participants(agent);
            let consumed = world
                .item(task.item.item)
                .ok_or(ModelError::UnknownItem(task.item.item))?
                .consumed
                .clone();
            for stack in &consumed {
                let mut need = stack.amount as i32 * task.item.amount as i32;
                for &o in &participants {
                    if need <= 0 {
                        break;
                    }
                    if let Some(s) = find_stack_mut(&mut self.sit.selves[o.index()].items, stack.item)
                    {
                        let take = (s.amount as i32).min(need) as u8;
                        s.amount -= take;
                        need -= take as i32;
                    }
                }
            }

            let sleep = task.item.amount.max(1);
            {
                let d = &mut self.sit.selves[agent.index()];
                d.task_state = TASK_DONE;
                d.task_sleep = sleep;
            }
            self.add_to_inventory(agent, task.item);

            // Wake every participating assistant with the crafter.
            for o in participants {
                if o == agent {
                    continue;
                }
                let d = &mut self.sit.selves[o.index()];
                d.task_state = TASK_DONE;
                d.task_sleep = sleep;
            }
        }
        Ok(())
    }

    /// Crafter plus every assistant staged on it, in agent order.
    fn craft_participants(&self, crafter: AgentId) -> Vec<AgentId> {
        (0..AGENTS as u8)
            .map(AgentId)
            .filter(|&o| o == crafter || self.is_staged_assistant(o, crafter))
            .collect()
    }

    /// Is `o` currently a `CraftAssist` for `crafter`, arrived and staged?
    fn is_staged_assistant(&self, o: AgentId, crafter: AgentId) -> bool {
        let d = self.sit.agent(o);
        if d.task_state != 2 || (d.task_index as usize) >= TASKS_MAX {
            return false;
        }
        let t = self.sit.strategy.task(o, d.task_index as usize).task;
        t.kind == TaskKind::CraftAssist && t.crafter == crafter
    }

    /// Can `agent` assemble `task.item` right now, with the currently staged
    /// assistants?  Inputs are summed across all participants; each required
    /// tool needs a participant whose role owns it and who carries it.
    fn craft_check(&self, world: &World, agent: AgentId, task: &Task) -> SimResult<CraftCheck> {
        let item = world
            .item(task.item.item)
            .ok_or(ModelError::UnknownItem(task.item.item))?;
        let participants = self.craft_participants(agent);

        for stack in &item.consumed {
            let mut need = stack.amount as i32 * task.item.amount as i32;
            for &o in &participants {
                if let Some(s) = find_stack(&self.sit.agent(o).items, stack.item) {
                    need -= s.amount as i32;
                    if need <= 0 {
                        break;
                    }
                }
            }
            if need > 0 {
                return Ok(CraftCheck::NoItem(ItemStack::new(
                    stack.item,
                    need.clamp(1, u8::MAX as i32) as u8,
                )));
            }
        }

        for &tool in &item.tools {
            let found = participants.iter().any(|&o| {
                world.role(o).has_tool(tool)
                    && find_stack(&self.sit.agent(o).items, tool).is_some_and(|s| s.amount > 0)
            });
            if !found {
                return Ok(CraftCheck::NoTool(tool));
            }
        }
        Ok(CraftCheck::Feasible)
    }

    // ── Delivery ──────────────────────────────────────────────────────────

    fn update_deliver(
        &mut self,
        world: &World,
        agent: AgentId,
        idx: usize,
        task: &Task,
    ) -> SimResult<()> {
        if self.sit.agent(agent).task_state == 0 {
            self.agent_goto_nl(world, agent, task.where_)?;
            self.sit.selves[agent.index()].task_state = 1;
        }
        if self.sit.agent(agent).task_state != 1 || self.sit.agent(agent).task_sleep != 0 {
            return Ok(());
        }

        // The targeted item must actually be carried.
        let have = find_stack(&self.sit.agent(agent).items, task.item.item)
            .map(|s| s.amount)
            .unwrap_or(0);
        if have < task.item.amount {
            let slot = self.sit.strategy.task_mut(agent, idx);
            slot.result.err = TaskErr::NotInInventory;
            slot.result.err_arg = ItemStack::new(task.item.item, task.item.amount - have);
            self.sit.selves[agent.index()].task_sleep = SLEEP_MAX;
            return Ok(());
        }

        let Some((_, job)) = self.sit.find_job(task.job) else {
            let slot = self.sit.strategy.task_mut(agent, idx);
            slot.result.err = TaskErr::NoSuchJob;
            self.sit.selves[agent.index()].task_sleep = SLEEP_MAX;
            return Ok(());
        };
        let required = job.required.clone();
        let reward = job.reward;

        // Greedy: top up every still-open line of the job from inventory —
        // the task names one item, but anything else we carry counts too.
        let mut complete = true;
        for line in &required {
            let mut already = self.sit.book.delivered_amount(task.job, line.item);
            if already < line.amount {
                let carried = find_stack_mut(&mut self.sit.selves[agent.index()].items, line.item)
                    .filter(|s| s.amount > 0)
                    .map(|s| {
                        let deliv = (line.amount - already).min(s.amount);
                        s.amount -= deliv;
                        deliv
                    });
                if let Some(deliv) = carried {
                    already += deliv;
                    // Merge into an existing book row in place so later lines
                    // of this round see it; only brand-new rows are deferred.
                    let row = self
                        .sit
                        .book
                        .delivered
                        .iter_mut()
                        .find(|r| r.job == task.job && r.item.item == line.item);
                    match row {
                        Some(r) => r.item.amount = r.item.amount.saturating_add(deliv),
                        None => self.diff.add(SitEdit::AddDelivered {
                            job: task.job,
                            item: ItemStack::new(line.item, deliv),
                        }),
                    }
                }
            }
            if already < line.amount {
                complete = false;
            }
        }

        if complete {
            self.diff.add(SitEdit::RemoveDeliveredFor { job: task.job });
            self.diff.add(SitEdit::RemoveJob { job: task.job });
            self.sit.team_money += reward as u32;
        }

        let d = &mut self.sit.selves[agent.index()];
        d.task_sleep = 1;
        d.task_state = TASK_DONE;
        Ok(())
    }

    // ── Inventory ─────────────────────────────────────────────────────────

    /// Merge `item` into the agent's inventory, deferring the push of a new
    /// stack to the diff queue.
    fn add_to_inventory(&mut self, agent: AgentId, item: ItemStack) {
        match find_stack_mut(&mut self.sit.selves[agent.index()].items, item.item) {
            Some(s) => s.amount = s.amount.saturating_add(item.amount),
            None => self.diff.add(SitEdit::AddAgentItem { agent, item }),
        }
    }
}

//! The strategy repair loop.
//!
//! Each iteration resets the simulator to the live situation, fast-forwards
//! to the planning horizon, and scans the sixteen queues for the first task
//! whose simulated result is an error.  One edit is applied per iteration:
//!
//! | Error            | Edit                                                |
//! |------------------|-----------------------------------------------------|
//! | `OutOfBattery`   | Insert a `Charge` at the detour-minimising station  |
//! | `CraftNoItem`    | Buy + assist by a random capable teammate           |
//! | `CraftNoTool`    | Move-only assist by a tool carrier, else buy + assist |
//! | `NotInInventory` | Insert the purchase on the delivering agent itself  |
//! | `NoCrafterFound` | Remove the orphan assist                            |
//! | `NotValidForJob` / `NoSuchJob` | Remove the task                       |
//!
//! The loop stops when a pass simulates with no errors, or at the iteration
//! cap — the cap doubles as the planning time budget.

use tracing::debug;

use fleet_core::{AgentId, PlanRng, Pos, AGENTS, AGENTS_PER_TEAM, TASKS_MAX};
use fleet_model::{
    find_stack, ItemStack, Situation, Task, TaskErr, TaskKind, TaskResult, World,
};
use fleet_sim::SimState;

use crate::error::PlanResult;

/// Iteration cap for one planning pass.
pub const REPAIR_MAX_ITER: usize = 16;

/// How a repair pass ended.
#[derive(Copy, Clone, Debug)]
pub struct RepairOutcome {
    /// `true` if the final fast-forward reported no task errors.
    pub converged: bool,
    pub iterations: usize,
    pub edits: usize,
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Iterate reset → fast-forward → first-error → edit until the plan
/// simulates cleanly or `max_iter` passes have run.
///
/// Edits apply to `plan` (the live strategy); `sim` only ever works on its
/// own clone.
pub fn fix_errors(
    world: &World,
    plan: &mut Situation,
    sim: &mut SimState,
    rng: &mut PlanRng,
    max_iter: usize,
) -> PlanResult<RepairOutcome> {
    let horizon = sim.params.horizon(world.steps);
    let mut edits = 0;
    for it in 0..max_iter {
        sim.reset(plan);
        sim.fast_forward(world, horizon)?;

        let Some((agent, index, err, err_arg)) = first_error(plan, sim) else {
            return Ok(RepairOutcome { converged: true, iterations: it + 1, edits });
        };
        debug!(agent = agent.0, index, ?err, "repairing task failure");
        edits += 1;

        match err {
            TaskErr::OutOfBattery => add_charging(world, plan, agent, index)?,
            TaskErr::CraftNoItem => {
                add_item_for(world, plan, sim, rng, agent, index, err_arg, false)?
            }
            TaskErr::CraftNoTool => {
                add_item_for(world, plan, sim, rng, agent, index, err_arg, true)?
            }
            TaskErr::NotInInventory => add_buy_for(world, plan, agent, index, err_arg)?,
            TaskErr::NoCrafterFound | TaskErr::NotValidForJob | TaskErr::NoSuchJob => {
                plan.strategy.remove_task(agent, index);
            }
            TaskErr::Success => unreachable!("first_error never yields Success"),
        }
        // Queue surgery at or before the head invalidates micro-progress.
        plan.agent_mut(agent).task_state = 0;
    }
    Ok(RepairOutcome { converged: false, iterations: max_iter, edits })
}

/// First failing task across all queues: scan each agent's queue from its
/// live head.  Slots the roll-out never reached keep their default
/// `Success` and are skipped naturally.
fn first_error(plan: &Situation, sim: &SimState) -> Option<(AgentId, usize, TaskErr, ItemStack)> {
    for i in 0..AGENTS {
        let agent = AgentId(i as u8);
        let start = (plan.agent(agent).task_index as usize).min(TASKS_MAX);
        for index in start..TASKS_MAX {
            let slot = sim.sit().strategy.task(agent, index);
            if slot.task.is_none() {
                break;
            }
            if slot.result.err != TaskErr::Success {
                return Some((agent, index, slot.result.err, slot.result.err_arg));
            }
        }
    }
    None
}

// ── Charge insertion ──────────────────────────────────────────────────────────

/// Insert a `Charge` immediately before the failing task, at the station
/// minimising `dist(from, station) + dist(station, target)`.  A failing
/// `Charge` task is folded (re-targeted) instead of stacking a second one.
fn add_charging(
    world: &World,
    plan: &mut Situation,
    agent: AgentId,
    before: usize,
) -> PlanResult<()> {
    let index = if plan.strategy.task(agent, before).task.kind == TaskKind::Charge {
        if before > 0 {
            plan.strategy.swap_tasks(agent, before - 1, before);
            before - 1
        } else {
            before
        }
    } else {
        plan.strategy.insert_task(agent, before, Task::none());
        before
    };

    let from = task_origin(plan, agent, index);
    let to = if index + 1 < TASKS_MAX {
        let w = plan.strategy.task(agent, index + 1).task.where_;
        if w.is_empty() { from } else { plan.find_pos(w).unwrap_or(from) }
    } else {
        from
    };

    let graph = &world.graph;
    let from_g = graph.snap(from);
    let to_g = graph.snap(to);

    let mut best: Option<(u64, fleet_core::NameId)> = None;
    for station in &plan.charging_stations {
        let st_g = graph.snap(station.pos);
        let d = graph.dist_road(from_g, st_g)? as u64 + graph.dist_road(st_g, to_g)? as u64;
        if best.is_none_or(|(bd, _)| d < bd) {
            best = Some((d, station.id));
        }
    }

    match best {
        Some((_, station)) => {
            let id = plan.strategy.fresh_id();
            plan.strategy.task_mut(agent, index).task =
                Task { kind: TaskKind::Charge, where_: station, id, ..Task::default() };
        }
        None => {
            // No station on the map: the insertion cannot help.
            plan.strategy.remove_task(agent, index);
        }
    }
    Ok(())
}

/// An insertion at or before an agent's active task changes what its head
/// is; any travel progress towards the old head no longer applies.
fn reset_if_head_moved(plan: &mut Situation, agent: AgentId, inserted_at: usize) {
    if inserted_at <= plan.agent(agent).task_index as usize {
        plan.agent_mut(agent).task_state = 0;
    }
}

/// Where the agent will be when the task at `index` starts: the previous
/// task's facility, or the agent's current position for the queue head.
fn task_origin(plan: &Situation, agent: AgentId, index: usize) -> Pos {
    if index > 0 {
        let prev = plan.strategy.task(agent, index - 1).task.where_;
        if let Some(pos) = plan.find_pos(prev) {
            return pos;
        }
    }
    plan.agent(agent).pos
}

// ── Purchase / assist insertion ───────────────────────────────────────────────

#[derive(Copy, Clone)]
struct Viable {
    agent: AgentId,
    index: usize,
    /// The agent already holds the goods; a move-only assist suffices.
    only_move: bool,
}

/// Make `for_item` available at the failing craft of `for_agent`: choose a
/// capable teammate (uniformly via `rng`), then either send it over with a
/// move-only assist or prepend a purchase at the nearest stocked shop.
fn add_item_for(
    world: &World,
    plan: &mut Situation,
    sim: &SimState,
    rng: &mut PlanRng,
    for_agent: AgentId,
    for_index: usize,
    for_item: ItemStack,
    for_tool: bool,
) -> PlanResult<()> {
    let for_time = if for_index > 0 {
        sim.sit().strategy.task(for_agent, for_index - 1).result.time
    } else {
        0
    };
    let shop_dur = sim.params.shop_assume_duration as u16;

    let mut viables: Vec<Viable> = Vec::new();
    for i in 0..AGENTS_PER_TEAM {
        let agent = AgentId(i as u8);
        // The crafter cannot assist itself.
        if agent == for_agent {
            continue;
        }
        if for_tool && !world.role(agent).has_tool(for_item.item) {
            continue;
        }

        // The earliest queue slot whose projected completion still makes it
        // to the craft in time.
        let mut index = 0;
        while index + 1 < TASKS_MAX {
            let t = sim.sit().strategy.task(agent, index).result.time + shop_dur;
            if t > for_time {
                break;
            }
            index += 1;
        }

        // Project how many units the agent will hold at that point.
        let mut count = find_stack(&plan.agent(agent).items, for_item.item)
            .map(|s| s.amount as i32)
            .unwrap_or(0);
        for i in 0..index {
            count += task_item_diff(
                world,
                &plan.strategy.task(agent, i).task,
                &sim.sit().strategy.task(agent, i).result,
                for_item.item,
            );
        }

        let only_move = if for_tool {
            count > 0
        } else {
            // Items must also have survived the roll-out unconsumed.
            count > 0
                && find_stack(&sim.sit().agent(agent).items, for_item.item)
                    .is_some_and(|s| s.amount > 0)
        };
        viables.push(Viable { agent, index, only_move });
    }

    if viables.is_empty() {
        return Ok(());
    }
    // Carriers beat buyers; the tie-break among equals is random.
    let movers: Vec<Viable> = viables.iter().copied().filter(|v| v.only_move).collect();
    let pool = if movers.is_empty() { &viables } else { &movers };
    let pick = *rng.choose(pool).expect("pool is non-empty");

    let target = plan.strategy.task(for_agent, for_index).task;
    let assist = Task {
        kind: TaskKind::CraftAssist,
        where_: target.where_,
        crafter: for_agent,
        item: target.item,
        ..Task::default()
    };

    if pick.only_move {
        let id = plan.strategy.fresh_id();
        plan.strategy.insert_task(pick.agent, pick.index, Task { id, ..assist });
        reset_if_head_moved(plan, pick.agent, pick.index);
        return Ok(());
    }

    let Some(shop) = nearest_stocked_shop(world, plan, pick.agent, pick.index, target.where_, for_item)?
    else {
        return Ok(());
    };
    let buy_id = plan.strategy.fresh_id();
    let assist_id = plan.strategy.fresh_id();
    plan.strategy.insert_task(
        pick.agent,
        pick.index,
        Task { kind: TaskKind::BuyItem, where_: shop, item: for_item, id: buy_id, ..Task::default() },
    );
    plan.strategy
        .insert_task(pick.agent, pick.index + 1, Task { id: assist_id, ..assist });
    reset_if_head_moved(plan, pick.agent, pick.index);
    Ok(())
}

/// Insert a purchase of `item` on the delivering agent itself, right before
/// its failing delivery.
fn add_buy_for(
    world: &World,
    plan: &mut Situation,
    agent: AgentId,
    before: usize,
    item: ItemStack,
) -> PlanResult<()> {
    let target = plan.strategy.task(agent, before).task.where_;
    let Some(shop) = nearest_stocked_shop(world, plan, agent, before, target, item)? else {
        // Nothing stocks it: the delivery cannot be saved.
        plan.strategy.remove_task(agent, before);
        return Ok(());
    };
    let id = plan.strategy.fresh_id();
    plan.strategy.insert_task(
        agent,
        before,
        Task { kind: TaskKind::BuyItem, where_: shop, item, id, ..Task::default() },
    );
    Ok(())
}

/// The shop stocking at least `item.amount` units that minimises the detour
/// `dist(origin, shop) + dist(shop, destination)`.
fn nearest_stocked_shop(
    world: &World,
    plan: &Situation,
    agent: AgentId,
    index: usize,
    destination: fleet_core::NameId,
    item: ItemStack,
) -> PlanResult<Option<fleet_core::NameId>> {
    let from = task_origin(plan, agent, index);
    let to = plan.find_pos(destination).unwrap_or(from);
    let graph = &world.graph;
    let from_g = graph.snap(from);
    let to_g = graph.snap(to);

    let mut best: Option<(u64, fleet_core::NameId)> = None;
    for shop in &plan.shops {
        let stocked = shop.stock(item.item).is_some_and(|s| s.amount >= item.amount);
        if !stocked {
            continue;
        }
        let sh_g = graph.snap(shop.pos);
        let d = graph.dist_road(from_g, sh_g)? as u64 + graph.dist_road(sh_g, to_g)? as u64;
        if best.is_none_or(|(bd, _)| d < bd) {
            best = Some((d, shop.id));
        }
    }
    Ok(best.map(|(_, id)| id))
}

// ── Inventory projection ──────────────────────────────────────────────────────

/// Net effect of one completed task on the agent's holdings of `item`.
/// Failed tasks contribute nothing.
fn task_item_diff(world: &World, task: &Task, result: &TaskResult, item: fleet_core::NameId) -> i32 {
    if result.err != TaskErr::Success {
        return 0;
    }
    match task.kind {
        TaskKind::None | TaskKind::Charge | TaskKind::Visit => 0,
        TaskKind::BuyItem | TaskKind::Retrieve => {
            if task.item.item == item {
                task.item.amount as i32
            } else {
                0
            }
        }
        TaskKind::CraftItem | TaskKind::CraftAssist => {
            if task.item.item == item {
                return task.item.amount as i32;
            }
            if let Some(it) = world.item(task.item.item) {
                for c in &it.consumed {
                    if c.item == item {
                        return -(c.amount as i32);
                    }
                }
            }
            0
        }
        TaskKind::DeliverItem => {
            if task.item.item == item {
                -(task.item.amount as i32)
            } else {
                0
            }
        }
    }
}

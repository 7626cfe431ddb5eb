//! Work creation: turning open jobs into delivery tasks.
//!
//! Only the delivery itself is seeded — one `DeliverItem` per required line,
//! on the least-loaded owned agent (distance to the job's storage breaks
//! ties, via the facility distance cache).  The repair loop then grows the
//! purchase/craft/assist chain in front of it from the errors the simulator
//! reports.
//!
//! Priced jobs are taken first, then missions (they fine us if ignored).
//! Auctions and posted jobs are never seeded: bidding is not modelled, and
//! delivering against an auction we did not win would be money down the
//! drain.  This is a recorded gap, not an oversight.

use tracing::debug;

use fleet_core::{AgentId, JobId, NameId, AGENTS_PER_TEAM, TASKS_MAX};
use fleet_graph::DistCache;
use fleet_model::{ItemStack, Situation, Task, TaskKind, World};

use crate::error::PlanResult;

/// Seed delivery tasks for every unclaimed priced job and mission.
/// Returns the number of jobs assigned.
///
/// Requires the owned agents' positions to be registered in `cache` for the
/// current step (the controller does this while ingesting percepts).
pub fn create_work(
    world: &World,
    plan: &mut Situation,
    cache: &mut DistCache,
) -> PlanResult<usize> {
    let mut open: Vec<(JobId, NameId, Vec<ItemStack>)> = Vec::new();
    for j in &plan.jobs {
        open.push((j.id, j.storage, j.required.clone()));
    }
    for m in &plan.missions {
        open.push((m.job.id, m.job.storage, m.job.required.clone()));
    }

    let mut seeded = 0;
    for (job, storage, required) in open {
        if plan.strategy.job_claimed(job) {
            continue;
        }

        // Least-loaded owned agent; nearer to the storage wins ties.
        let mut best: Option<(usize, u16, AgentId)> = None;
        for i in 0..AGENTS_PER_TEAM {
            let agent = AgentId(i as u8);
            let free = TASKS_MAX - plan.strategy.queued(agent);
            if free == 0 {
                continue;
            }
            let dist = cache.lookup(&world.graph, world.agents[agent.index()], storage)?;
            let better = match best {
                None => true,
                Some((bf, bd, _)) => free > bf || (free == bf && dist < bd),
            };
            if better {
                best = Some((free, dist, agent));
            }
        }
        let Some((_, _, agent)) = best else { continue };

        for line in required {
            let id = plan.strategy.fresh_id();
            let task = Task {
                kind: TaskKind::DeliverItem,
                where_: storage,
                job,
                item: line,
                id,
                ..Task::default()
            };
            if plan.strategy.push_task(agent, 0, task).is_none() {
                break;
            }
        }
        debug!(job = job.0, agent = agent.0, "seeded delivery tasks");
        seeded += 1;
    }
    Ok(seeded)
}

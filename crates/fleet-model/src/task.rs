//! Tasks, task results, and the per-agent strategy queues.
//!
//! A task is the atomic unit of the plan: go somewhere and apply one effect.
//! Each agent owns a fixed queue of [`TASKS_MAX`] slots; the self block's
//! `task_index` points at the active one.  Every slot also carries the
//! result the forward simulator computed for it on the last pass — repair
//! reads those results to decide its edits.

use fleet_core::{AgentId, JobId, NameId, AGENTS, TASKS_MAX};

use crate::items::ItemStack;

// ── Task ──────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum TaskKind {
    #[default]
    None,
    BuyItem,
    Retrieve,
    CraftItem,
    CraftAssist,
    DeliverItem,
    Charge,
    Visit,
}

/// One planned step: task kind, target facility, and payload.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Task {
    pub kind: TaskKind,
    /// Facility the agent must reach before the effect applies.
    pub where_: NameId,
    /// Job being delivered to (DeliverItem only).
    pub job: JobId,
    /// Agent being assisted (CraftAssist only).
    pub crafter: AgentId,
    pub item: ItemStack,
    /// Unique id within the strategy, from [`Strategy::fresh_id`].
    pub id: u16,
}

impl Default for Task {
    fn default() -> Self {
        Task {
            kind: TaskKind::None,
            where_: NameId::EMPTY,
            job: JobId::EMPTY,
            crafter: AgentId::INVALID,
            item: ItemStack::default(),
            id: 0,
        }
    }
}

impl Task {
    pub fn none() -> Task {
        Task::default()
    }

    pub fn is_none(&self) -> bool {
        self.kind == TaskKind::None
    }
}

// ── TaskResult ────────────────────────────────────────────────────────────────

/// Simulation verdict for one task.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum TaskErr {
    #[default]
    Success,
    OutOfBattery,
    CraftNoItem,
    CraftNoTool,
    NoCrafterFound,
    NotInInventory,
    NotValidForJob,
    NoSuchJob,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct TaskResult {
    /// Step at which the task completed (or failed) in the simulation.
    pub time: u16,
    pub err: TaskErr,
    /// What was missing, for the errors that name an item.
    pub err_arg: ItemStack,
}

/// A queue slot: the task plus its latest simulation result.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct TaskSlot {
    pub task: Task,
    pub result: TaskResult,
}

// ── Strategy ──────────────────────────────────────────────────────────────────

/// The whole team's plan: one bounded task queue per agent.
///
/// Plain value type — copying a strategy in and out of the simulation state
/// is a flat memcpy of the fixed-size slot array.
#[derive(Copy, Clone, Debug)]
pub struct Strategy {
    tasks: [[TaskSlot; TASKS_MAX]; AGENTS],
    /// Monotonic counter for task ids.
    pub next_id: u16,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy { tasks: [[TaskSlot::default(); TASKS_MAX]; AGENTS], next_id: 1 }
    }
}

impl Strategy {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn task(&self, agent: AgentId, index: usize) -> &TaskSlot {
        &self.tasks[agent.index()][index]
    }

    #[inline]
    pub fn task_mut(&mut self, agent: AgentId, index: usize) -> &mut TaskSlot {
        &mut self.tasks[agent.index()][index]
    }

    pub fn queue(&self, agent: AgentId) -> &[TaskSlot; TASKS_MAX] {
        &self.tasks[agent.index()]
    }

    /// Allocate a task id unique within this strategy.
    pub fn fresh_id(&mut self) -> u16 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    /// Insert `task` at `index`, shifting later slots right; the last slot
    /// falls off the end.  The inserted slot's result is cleared.
    pub fn insert_task(&mut self, agent: AgentId, index: usize, task: Task) {
        let q = &mut self.tasks[agent.index()];
        for i in (index + 1..TASKS_MAX).rev() {
            q[i] = q[i - 1];
        }
        q[index] = TaskSlot { task, result: TaskResult::default() };
    }

    /// Remove the slot at `index`, shifting later slots left; the freed tail
    /// slot becomes `None`.
    pub fn remove_task(&mut self, agent: AgentId, index: usize) {
        let q = &mut self.tasks[agent.index()];
        for i in index..TASKS_MAX - 1 {
            q[i] = q[i + 1];
        }
        q[TASKS_MAX - 1] = TaskSlot::default();
    }

    /// Append `task` to the first free slot of `agent`'s queue at or after
    /// `from`.  Returns the slot index, or `None` if the queue is full.
    pub fn push_task(&mut self, agent: AgentId, from: usize, task: Task) -> Option<usize> {
        let q = &mut self.tasks[agent.index()];
        for (i, slot) in q.iter_mut().enumerate().skip(from) {
            if slot.task.is_none() {
                *slot = TaskSlot { task, result: TaskResult::default() };
                return Some(i);
            }
        }
        None
    }

    pub fn swap_tasks(&mut self, agent: AgentId, a: usize, b: usize) {
        self.tasks[agent.index()].swap(a, b);
    }

    /// Number of non-`None` tasks queued for `agent`.
    pub fn queued(&self, agent: AgentId) -> usize {
        self.tasks[agent.index()]
            .iter()
            .filter(|s| !s.task.is_none())
            .count()
    }

    /// Drop the first `n` slots of `agent`'s queue (completed tasks),
    /// shifting the rest to the front.
    pub fn drop_front(&mut self, agent: AgentId, n: usize) {
        for _ in 0..n.min(TASKS_MAX) {
            self.remove_task(agent, 0);
        }
    }

    /// `true` if any queued task targets `job`.
    pub fn job_claimed(&self, job: fleet_core::JobId) -> bool {
        self.tasks.iter().flatten().any(|s| {
            s.task.kind == TaskKind::DeliverItem && s.task.job == job
        })
    }
}

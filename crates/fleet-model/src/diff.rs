//! The diff journal: deferred situation edits.
//!
//! The forward simulator walks the situation's lists while deciding what to
//! change, so structural edits (inventory inserts, job removal, book rows)
//! are recorded here and applied in one batch between wake rounds.  Apply
//! order is insertion order, which keeps a planning pass deterministic no
//! matter how agent updates interleave.

use fleet_core::{AgentId, JobId};

use crate::items::{find_stack_mut, ItemStack};
use crate::situation::{DeliveredItem, Situation};

/// One recorded edit.
#[derive(Clone, Debug)]
pub enum SitEdit {
    /// Add `item` to an agent's inventory (merging with an existing stack).
    AddAgentItem { agent: AgentId, item: ItemStack },
    /// Credit a partial delivery towards `job`.
    AddDelivered { job: JobId, item: ItemStack },
    /// Drop every book row of `job` (job completed or expired).
    RemoveDeliveredFor { job: JobId },
    /// Remove `job` from whichever job list holds it.
    RemoveJob { job: JobId },
}

/// FIFO journal of [`SitEdit`]s.
#[derive(Default)]
pub struct DiffQueue {
    edits: Vec<SitEdit>,
}

impl DiffQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, edit: SitEdit) {
        self.edits.push(edit);
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn clear(&mut self) {
        self.edits.clear();
    }

    /// Apply and drain all recorded edits.
    pub fn apply(&mut self, sit: &mut Situation) {
        for edit in self.edits.drain(..) {
            match edit {
                SitEdit::AddAgentItem { agent, item } => {
                    let items = &mut sit.selves[agent.index()].items;
                    match find_stack_mut(items, item.item) {
                        Some(s) => s.amount = s.amount.saturating_add(item.amount),
                        None => items.push(item),
                    }
                }
                SitEdit::AddDelivered { job, item } => {
                    let row = sit
                        .book
                        .delivered
                        .iter_mut()
                        .find(|d| d.job == job && d.item.item == item.item);
                    match row {
                        Some(d) => d.item.amount = d.item.amount.saturating_add(item.amount),
                        None => sit.book.delivered.push(DeliveredItem { job, item }),
                    }
                }
                SitEdit::RemoveDeliveredFor { job } => {
                    sit.book.delivered.retain(|d| d.job != job);
                }
                SitEdit::RemoveJob { job } => {
                    sit.remove_job(job);
                }
            }
        }
    }
}

//! The outbound action sum type.
//!
//! One enum replaces a per-action struct hierarchy; the serializer (an
//! external collaborator) pattern-matches on it and writes the wire name
//! plus the ordered parameter list.

use fleet_core::{JobId, NameId, Pos};
use fleet_model::{ActionKind, ItemStack};

/// One agent's action for one step.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Action {
    /// Travel towards a facility.
    GotoFacility(NameId),
    /// Travel towards raw coordinates.
    GotoPos(Pos),
    Buy(ItemStack),
    Retrieve(ItemStack),
    /// Assemble one unit of the item.
    Assemble(NameId),
    /// Assist the named agent's assembly.
    AssistAssemble(NameId),
    DeliverJob(JobId),
    Charge,
    /// Solar trickle-charge in place.
    Recharge,
    /// Keep following the current route.
    Continue,
    Skip,
    Abort,
}

impl Action {
    pub fn kind(self) -> ActionKind {
        match self {
            Action::GotoFacility(_) | Action::GotoPos(_) => ActionKind::Goto,
            Action::Buy(_) => ActionKind::Buy,
            Action::Retrieve(_) => ActionKind::Retrieve,
            Action::Assemble(_) => ActionKind::Assemble,
            Action::AssistAssemble(_) => ActionKind::AssistAssemble,
            Action::DeliverJob(_) => ActionKind::DeliverJob,
            Action::Charge => ActionKind::Charge,
            Action::Recharge => ActionKind::Recharge,
            Action::Continue => ActionKind::Continue,
            Action::Skip => ActionKind::Skip,
            Action::Abort => ActionKind::Abort,
        }
    }

    /// The lower-case wire name.
    pub fn name(self) -> &'static str {
        self.kind().as_str()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::GotoFacility(id) => write!(f, "goto({id})"),
            Action::GotoPos(pos) => write!(f, "goto{pos}"),
            Action::Buy(s) => write!(f, "buy({} ×{})", s.item, s.amount),
            Action::Retrieve(s) => write!(f, "retrieve({} ×{})", s.item, s.amount),
            Action::Assemble(id) => write!(f, "assemble({id})"),
            Action::AssistAssemble(id) => write!(f, "assist_assemble({id})"),
            Action::DeliverJob(id) => write!(f, "deliver_job({id})"),
            other => f.write_str(other.name()),
        }
    }
}

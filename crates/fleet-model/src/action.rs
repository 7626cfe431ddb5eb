//! Action vocabulary shared between perceptions and the controller.
//!
//! The perception reports each agent's last action and its result; the
//! controller emits the next action.  Both sides use these enums — the
//! payload-carrying action sum type lives with the controller.

/// Every action name the server understands, in wire order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum ActionKind {
    Goto,
    Buy,
    Give,
    Receive,
    Store,
    Retrieve,
    RetrieveDelivered,
    Dump,
    Assemble,
    AssistAssemble,
    DeliverJob,
    Charge,
    BidForJob,
    PostJob,
    CallBreakdownService,
    Continue,
    Skip,
    Abort,
    Gather,
    Recharge,
    /// No action yet (step 0) or none recognised.
    #[default]
    NoAction,
}

impl ActionKind {
    /// The lower-case wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Goto => "goto",
            ActionKind::Buy => "buy",
            ActionKind::Give => "give",
            ActionKind::Receive => "receive",
            ActionKind::Store => "store",
            ActionKind::Retrieve => "retrieve",
            ActionKind::RetrieveDelivered => "retrieve_delivered",
            ActionKind::Dump => "dump",
            ActionKind::Assemble => "assemble",
            ActionKind::AssistAssemble => "assist_assemble",
            ActionKind::DeliverJob => "deliver_job",
            ActionKind::Charge => "charge",
            ActionKind::BidForJob => "bid_for_job",
            ActionKind::PostJob => "post_job",
            ActionKind::CallBreakdownService => "call_breakdown_service",
            ActionKind::Continue => "continue",
            ActionKind::Skip => "skip",
            ActionKind::Abort => "abort",
            ActionKind::Gather => "gather",
            ActionKind::Recharge => "recharge",
            ActionKind::NoAction => "noAction",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an agent's last action, as reported by the server.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum ActionResult {
    #[default]
    Successful,
    SuccessfulPartial,
    Useless,
    FailedLocation,
    FailedUnknownItem,
    FailedUnknownAgent,
    FailedUnknownJob,
    FailedUnknownFacility,
    FailedNoRoute,
    FailedItemAmount,
    FailedCapacity,
    FailedWrongFacility,
    FailedTools,
    FailedItemType,
    FailedJobStatus,
    FailedJobType,
    FailedCounterpart,
    FailedWrongParam,
    FailedRandom,
    FailedUnknownError,
}

impl ActionResult {
    /// `true` for full success (the guarantee callers assert on).
    #[inline]
    pub fn ok(self) -> bool {
        self == ActionResult::Successful
    }
}

//! Jobs, auctions and missions.
//!
//! All job kinds share the same core fields; auctions and missions carry the
//! bidding extras on top.  They live in separate vectors searched in a fixed
//! priority order (priced jobs, then auctions, then missions) — the 16-bit
//! job id is unique across kinds, so the first hit wins.

use fleet_core::{JobId, NameId};

use crate::items::ItemStack;

/// Which vector a job was found in.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum JobKind {
    Priced,
    Auction,
    Mission,
    Posted,
}

/// Core fields shared by every job kind.
#[derive(Clone, Debug)]
pub struct Job {
    pub id: JobId,
    /// Target storage facility.
    pub storage: NameId,
    pub start: u16,
    pub end: u16,
    pub reward: u16,
    pub required: Vec<ItemStack>,
}

impl Job {
    pub fn requires(&self, item: NameId) -> Option<&ItemStack> {
        self.required.iter().find(|r| r.item == item)
    }
}

/// A job up for auction: teams bid, lowest bid below `max_bid` wins, and
/// failing to complete costs `fine`.
#[derive(Clone, Debug)]
pub struct Auction {
    pub job: Job,
    pub fine: u16,
    pub max_bid: u16,
    /// Steps the auction stays open for bidding.
    pub auction_time: u16,
}

/// A mission: an auction the server assigns directly, fine included.
#[derive(Clone, Debug)]
pub struct Mission {
    pub job: Job,
    pub fine: u16,
}

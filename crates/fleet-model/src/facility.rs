//! Facility records — the named points of interest on the map.
//!
//! All facilities share an interned `id` and a lattice `pos`; the rest of
//! each record mirrors what the server reports.  Values the server hides
//! until an agent stands nearby (`q_size`, shop stock) use `u8::MAX` as the
//! "not observed" marker, exactly as they arrive.

use fleet_core::{NameId, Pos};

/// "Not observed this step" marker for locally-visible fields.
pub const NOT_OBSERVED: u8 = u8::MAX;

#[derive(Copy, Clone, Debug)]
pub struct ChargingStation {
    pub id: NameId,
    pub pos: Pos,
    /// Charge units restored per step.
    pub rate: u8,
    pub price: u16,
    pub slots: u8,
    /// Queue length, `NOT_OBSERVED` unless seen this step.
    pub q_size: u8,
}

#[derive(Copy, Clone, Debug)]
pub struct Dump {
    pub id: NameId,
    pub pos: Pos,
    pub price: u16,
}

/// One stock line of a shop.
#[derive(Copy, Clone, Debug)]
pub struct ShopItem {
    pub item: NameId,
    pub amount: u8,
    pub cost: u16,
    /// Steps per restocked unit (coarse model; see the simulator docs).
    pub restock: u8,
}

#[derive(Clone, Debug)]
pub struct Shop {
    pub id: NameId,
    pub pos: Pos,
    pub restock: u8,
    pub items: Vec<ShopItem>,
}

impl Shop {
    pub fn stock(&self, item: NameId) -> Option<&ShopItem> {
        self.items.iter().find(|s| s.item == item)
    }

    pub fn stock_mut(&mut self, item: NameId) -> Option<&mut ShopItem> {
        self.items.iter_mut().find(|s| s.item == item)
    }
}

#[derive(Copy, Clone, Debug)]
pub struct StorageItem {
    pub item: NameId,
    pub amount: u8,
    /// Units delivered for our team, retrievable via `retrieve_delivered`.
    pub delivered: u8,
}

#[derive(Clone, Debug)]
pub struct Storage {
    pub id: NameId,
    pub pos: Pos,
    pub price: u16,
    pub total_cap: u16,
    pub used_cap: u16,
    pub items: Vec<StorageItem>,
}

#[derive(Copy, Clone, Debug)]
pub struct Workshop {
    pub id: NameId,
    pub pos: Pos,
    pub price: u16,
}

#[derive(Copy, Clone, Debug)]
pub struct ResourceNode {
    pub id: NameId,
    pub pos: Pos,
    /// The resource minable here with `gather`.
    pub resource: NameId,
}

/// An observed agent — opponents and teammates alike.
#[derive(Copy, Clone, Debug)]
pub struct Entity {
    pub name: NameId,
    pub team: NameId,
    pub pos: Pos,
    pub role: NameId,
}

//! Items, recipes, and agent roles.

use fleet_core::NameId;

// ── ItemStack ─────────────────────────────────────────────────────────────────

/// A counted pile of one item kind.  Two bytes; lives in inventories, shop
/// stock lines, job requirements and task payloads.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct ItemStack {
    pub item: NameId,
    pub amount: u8,
}

impl ItemStack {
    pub fn new(item: NameId, amount: u8) -> Self {
        ItemStack { item, amount }
    }
}

/// First stack of `id` in a list, if present.
pub fn find_stack(stacks: &[ItemStack], id: NameId) -> Option<&ItemStack> {
    stacks.iter().find(|s| s.item == id)
}

/// Mutable variant of [`find_stack`].
pub fn find_stack_mut(stacks: &mut [ItemStack], id: NameId) -> Option<&mut ItemStack> {
    stacks.iter_mut().find(|s| s.item == id)
}

// ── Item ──────────────────────────────────────────────────────────────────────

/// An item kind: base resource or assembled product.
#[derive(Clone, Debug, Default)]
pub struct Item {
    pub id: NameId,
    pub volume: u16,
    /// `true` for products that must be assembled at a workshop.
    pub assembled: bool,
    /// Inputs consumed per unit assembled.
    pub consumed: Vec<ItemStack>,
    /// Tools that must be present (carried by a participant) to assemble.
    pub tools: Vec<NameId>,
}

// ── Role ──────────────────────────────────────────────────────────────────────

/// Capabilities of one agent slot.
#[derive(Clone, Debug)]
pub struct Role {
    pub id: NameId,
    /// Distance units covered per simulation step.
    pub speed: u8,
    pub battery: u16,
    pub load: u16,
    /// Tools this role is able to operate.
    pub tools: Vec<NameId>,
}

impl Role {
    #[inline]
    pub fn has_tool(&self, tool: NameId) -> bool {
        self.tools.contains(&tool)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role { id: NameId::EMPTY, speed: 0, battery: 0, load: 0, tools: Vec::new() }
    }
}

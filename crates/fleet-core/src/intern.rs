//! Fixed-capacity string interning.
//!
//! # Design
//!
//! Every short name the server mentions (facility, item, role) is interned
//! once into an 8-bit id; job names get a separate 16-bit table.  Slots are
//! found by hashing the string modulo the capacity with linear probing, so an
//! id is stable for the life of the process: tables are append-only and never
//! rehash.  Id 0 is reserved for the empty string in both namespaces.
//!
//! Interning is what lets the rest of the planner store names in one byte and
//! compare them with `==` — the hot simulator loops never touch a `str`.

use std::hash::Hasher;

use rustc_hash::FxHasher;

use crate::error::{CoreError, CoreResult};
use crate::ids::{JobId, NameId};

fn str_hash(s: &str) -> u64 {
    let mut h = FxHasher::default();
    h.write(s.as_bytes());
    h.finish()
}

/// Fixed-capacity open-addressing intern table.
///
/// `CAP` must be a power of two so `hash & (CAP - 1)` is a valid slot.
/// Slot 0 is reserved for the empty string; probing never lands on it.
struct Table<const CAP: usize> {
    slots: Vec<Option<Box<str>>>,
    len: usize,
}

impl<const CAP: usize> Table<CAP> {
    fn new() -> Self {
        const { assert!(CAP.is_power_of_two()) };
        let mut slots = Vec::with_capacity(CAP);
        slots.resize_with(CAP, || None);
        slots[0] = Some("".into());
        Table { slots, len: 1 }
    }

    /// Find the slot holding `s`, or the first free slot on its probe chain.
    fn probe(&self, s: &str) -> Option<usize> {
        let start = (str_hash(s) as usize) & (CAP - 1);
        let mut i = start.max(1);
        loop {
            match &self.slots[i] {
                Some(v) if &**v == s => return Some(i),
                None => return Some(i),
                Some(_) => {
                    i += 1;
                    if i == CAP {
                        i = 1;
                    }
                    if i == start.max(1) {
                        return None; // full and absent
                    }
                }
            }
        }
    }

    fn try_register(&mut self, s: &str) -> CoreResult<usize> {
        if s.is_empty() {
            return Ok(0);
        }
        let slot = self
            .probe(s)
            .ok_or(CoreError::Capacity { what: "intern table", cap: CAP })?;
        if self.slots[slot].is_none() {
            self.slots[slot] = Some(s.into());
            self.len += 1;
        }
        Ok(slot)
    }

    fn get(&self, s: &str) -> Option<usize> {
        if s.is_empty() {
            return Some(0);
        }
        match self.probe(s) {
            Some(slot) if self.slots[slot].is_some() => Some(slot),
            _ => None,
        }
    }

    fn string_of(&self, slot: usize) -> &str {
        self.slots[slot]
            .as_deref()
            .expect("intern id does not name a registered string")
    }
}

// ── NameTable ─────────────────────────────────────────────────────────────────

/// Intern table for facility, item and role names (8-bit ids, capacity 256).
pub struct NameTable(Table<256>);

impl NameTable {
    pub fn new() -> Self {
        NameTable(Table::new())
    }

    /// Intern `s`, allocating an id on first sight.  Idempotent.
    ///
    /// # Panics
    /// Panics if the table is full — more than 256 distinct names is a
    /// protocol violation, not a recoverable condition.
    pub fn register(&mut self, s: &str) -> NameId {
        self.try_register(s).expect("name table overflow")
    }

    /// Fallible variant of [`register`](Self::register).
    pub fn try_register(&mut self, s: &str) -> CoreResult<NameId> {
        self.0.try_register(s).map(|slot| NameId(slot as u8))
    }

    /// Look up an already-registered name.
    ///
    /// # Panics
    /// Panics if `s` was never registered; lookups of unseen names indicate a
    /// perception-handling bug upstream.
    pub fn lookup(&self, s: &str) -> NameId {
        self.get(s).expect("name was never registered")
    }

    /// Non-panicking lookup.
    pub fn get(&self, s: &str) -> Option<NameId> {
        self.0.get(s).map(|slot| NameId(slot as u8))
    }

    /// The original bytes behind an id.
    pub fn string_of(&self, id: NameId) -> &str {
        self.0.string_of(id.index())
    }

    /// Number of registered names, the empty string included.
    pub fn len(&self) -> usize {
        self.0.len
    }

    pub fn is_empty(&self) -> bool {
        false // id 0 is always present
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

// ── JobTable ──────────────────────────────────────────────────────────────────

/// Intern table for job names (16-bit ids, capacity 4096).
pub struct JobTable(Table<4096>);

impl JobTable {
    pub fn new() -> Self {
        JobTable(Table::new())
    }

    /// Intern `s`, allocating an id on first sight.  Idempotent.
    ///
    /// # Panics
    /// Panics if the table is full.
    pub fn register(&mut self, s: &str) -> JobId {
        self.try_register(s).expect("job table overflow")
    }

    /// Fallible variant of [`register`](Self::register).
    pub fn try_register(&mut self, s: &str) -> CoreResult<JobId> {
        self.0.try_register(s).map(|slot| JobId(slot as u16))
    }

    /// Look up an already-registered job name.
    ///
    /// # Panics
    /// Panics if `s` was never registered.
    pub fn lookup(&self, s: &str) -> JobId {
        self.get(s).expect("job was never registered")
    }

    /// Non-panicking lookup.
    pub fn get(&self, s: &str) -> Option<JobId> {
        self.0.get(s).map(|slot| JobId(slot as u16))
    }

    /// The original bytes behind an id.
    pub fn string_of(&self, id: JobId) -> &str {
        self.0.string_of(id.index())
    }

    pub fn len(&self) -> usize {
        self.0.len
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

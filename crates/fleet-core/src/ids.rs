//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  The inner integer is `pub` to allow
//! direct indexing into flat storage via `id.0 as usize`, but callers should
//! prefer the `.index()` helpers for clarity.
//!
//! `NameId` and `JobId` come out of the interning tables in [`crate::intern`];
//! value 0 is the reserved empty string in both namespaces, exposed as
//! `NameId::EMPTY` / `JobId::EMPTY` and used throughout the planner as the
//! "no facility / no item / no job" marker.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" — the type's `MAX` value.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as an index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a road-network node.
    pub struct NodeId(u32);
}

typed_id! {
    /// Index of a road-network edge.
    pub struct EdgeId(u32);
}

typed_id! {
    /// Interned short name — facility, item or role.  One shared 8-bit
    /// namespace, capacity 256, id 0 reserved for the empty string.
    pub struct NameId(u8);
}

typed_id! {
    /// Interned job identifier.  Jobs get their own 16-bit namespace because
    /// a long match churns through far more than 256 of them.
    pub struct JobId(u16);
}

typed_id! {
    /// Agent slot in the match, 0..16.  Slots 0..8 are the owned team.
    pub struct AgentId(u8);
}

impl NameId {
    /// The reserved empty string.  Doubles as "not in a facility", "no item"
    /// and similar absent markers.
    pub const EMPTY: NameId = NameId(0);

    #[inline(always)]
    pub fn is_empty(self) -> bool {
        self == NameId::EMPTY
    }
}

impl JobId {
    /// The reserved empty job id.
    pub const EMPTY: JobId = JobId(0);

    #[inline(always)]
    pub fn is_empty(self) -> bool {
        self == JobId::EMPTY
    }
}

//! Opaque identifiers for entities of the simulated circuit.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub const fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub const fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the index as a `usize`, e.g. for trace bit positions.
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID of a chip (one pin row of an instance) in the circuit.
    ChipId,
    "#"
);

/// The 5V rail, always the first chip built.
pub const VCC_ID: ChipId = ChipId::from_raw(0);
/// The ground rail, always the second chip built.
pub const GND_ID: ChipId = ChipId::from_raw(1);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_roundtrip_and_display() {
        let id = ChipId::from_raw(17);
        assert_eq!(id.as_raw(), 17);
        assert_eq!(id.index(), 17);
        assert_eq!(id.to_string(), "#17");
    }

    #[test]
    fn rails_come_first() {
        assert!(VCC_ID < GND_ID);
        assert_eq!(GND_ID.index(), 1);
    }
}

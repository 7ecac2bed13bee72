//! Chip library for the DICE circuit simulator.
//!
//! Each part is a static [`ChipDesc`] describing its package pins: one row
//! per gate, numbered as in the data book. Sequential parts are modelled
//! from their internal gates, with internal nodes on pin numbers above the
//! package pins.

#![warn(missing_docs)]

pub mod clock;
pub mod ttl;

pub use clock::{clock_data, CLOCK};
pub use ttl::{
    CHIP_7400, CHIP_7402, CHIP_7404, CHIP_7408, CHIP_7410, CHIP_7432, CHIP_7474, CHIP_7486,
};

use dice_sim::ChipDesc;

/// Every part in the library.
pub static CATALOG: &[&ChipDesc] = &[
    &CHIP_7400, &CHIP_7402, &CHIP_7404, &CHIP_7408, &CHIP_7410, &CHIP_7432, &CHIP_7474,
    &CHIP_7486, &CLOCK,
];

/// Looks a part up by name, e.g. `"7404"`.
pub fn lookup(name: &str) -> Option<&'static ChipDesc> {
    CATALOG.iter().copied().find(|chip| chip.name == name)
}

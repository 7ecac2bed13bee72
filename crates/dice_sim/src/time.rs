//! Simulated time with picosecond resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

pub use dice_config::{PS_PER_MS, PS_PER_NS, PS_PER_S, PS_PER_US};

/// A point in simulated time, in picoseconds since circuit start.
///
/// Picoseconds are the finest unit the simulator distinguishes: gate delays
/// are specified in them, and a `u64` still covers over 200 days of board
/// time.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SimTime(u64);

impl SimTime {
    /// Circuit start.
    pub const ZERO: SimTime = SimTime(0);

    /// Creates a time from picoseconds.
    pub const fn from_ps(ps: u64) -> Self {
        Self(ps)
    }

    /// Creates a time from nanoseconds.
    pub const fn from_ns(ns: u64) -> Self {
        Self(ns * PS_PER_NS)
    }

    /// Creates a time from microseconds.
    pub const fn from_us(us: u64) -> Self {
        Self(us * PS_PER_US)
    }

    /// Returns the time in picoseconds.
    pub const fn as_ps(self) -> u64 {
        self.0
    }

    /// Returns the time in whole microseconds (truncated).
    pub const fn as_us(self) -> u64 {
        self.0 / PS_PER_US
    }

    /// Returns the time `delay_ps` later, saturating at the end of representable time.
    pub const fn after(self, delay_ps: u64) -> Self {
        Self(self.0.saturating_add(delay_ps))
    }

    /// Picoseconds elapsed from `earlier` to `self`, or zero if `earlier` is later.
    pub const fn since(self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ps = self.0;
        if ps == 0 {
            write!(f, "0 ps")
        } else if ps % PS_PER_S == 0 {
            write!(f, "{} s", ps / PS_PER_S)
        } else if ps % PS_PER_MS == 0 {
            write!(f, "{} ms", ps / PS_PER_MS)
        } else if ps % PS_PER_US == 0 {
            write!(f, "{} us", ps / PS_PER_US)
        } else if ps % PS_PER_NS == 0 {
            write!(f, "{} ns", ps / PS_PER_NS)
        } else {
            write!(f, "{ps} ps")
        }
    }
}

//! Shared foundational types used across the DICE circuit simulator.
//!
//! This crate provides interned chip names, content hashing for trace
//! comparison, and frequency values for clock oscillators.

#![warn(missing_docs)]

pub mod frequency;
pub mod hash;
pub mod ident;

pub use frequency::{Frequency, ParseFrequencyError};
pub use hash::ContentHash;
pub use ident::{Ident, Interner};

//! Simulation error types.
//!
//! Netlist problems found while building a circuit are diagnostics, not
//! errors; [`SimError`] covers the failures that stop a run.

use crate::ids::ChipId;
use crate::time::SimTime;
use std::io;
use std::path::PathBuf;

/// Errors that can occur while constructing or running a circuit.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The event queue is full.
    #[error("event queue overflow at {time}: capacity of {capacity} events exhausted")]
    QueueOverflow {
        /// The configured queue capacity.
        capacity: usize,
        /// Simulated time when the push failed.
        time: SimTime,
    },

    /// A chip was scheduled with a zero delay.
    #[error("chip {chip} scheduled with zero delay")]
    InvalidDelay {
        /// The chip that was scheduled.
        chip: ChipId,
    },

    /// The state trace file could not be created.
    #[error("cannot open state trace '{}': {source}", path.display())]
    RecorderOpen {
        /// The path that failed to open.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// Writing the state trace failed.
    #[error("state trace I/O error: {0}")]
    RecorderIo(#[from] io::Error),

    /// A custom chip behaviour rejected its configuration or inputs.
    #[error("custom logic of chip {chip} failed: {reason}")]
    CustomLogic {
        /// The chip whose behaviour failed.
        chip: ChipId,
        /// What went wrong.
        reason: String,
    },
}

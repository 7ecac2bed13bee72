//! Gate-level, event-driven simulator for discrete-logic arcade boards.
//!
//! A board is described declaratively as a [`CircuitDesc`]: instances of
//! static chip types, named `instance.pin` connections and sub-circuits
//! included under a name prefix. The [`NetlistBuilder`] turns that into a
//! flat graph of single-output [`Chip`]s in an arena, and [`Circuit`] runs it
//! in picosecond time.
//!
//! # Architecture
//!
//! Every pin row of a chip type becomes one chip, evaluated either through a
//! precomputed truth table or through custom behaviour. An output change
//! updates the input masks of the chip's loads and schedules each load after
//! its own propagation delay. The event queue is bounded and uses lazy
//! cancellation; a popped entry only fires if it still matches the chip's
//! pending event. Runs are deterministic, so a [`StateRecorder`] trace of
//! the same board and the same run calls is byte-identical every time.
//!
//! # Usage
//!
//! ```ignore
//! use dice_sim::{Circuit, CircuitDesc};
//!
//! let sink = DiagnosticSink::new();
//! let mut circuit = Circuit::new(&desc, &SimSettings::default(), &sink)?;
//! circuit.run(2_500_000_000)?;
//! println!("stopped at {}", circuit.global_time());
//! ```
//!
//! # Modules
//!
//! - `desc` - chip types and board descriptions
//! - `resolve` - hierarchical connection resolution
//! - `builder` - netlist construction, elimination, tie-off, fan-out check
//! - `kernel` - the circuit and its run loop
//! - `recorder` / `trace` - writing and reading state traces
//! - `bridge` - video and audio back-end contracts
//! - `special` - rails, de-optimizer and bridge chips

#![warn(missing_docs)]

pub mod arena;
pub mod bridge;
pub mod builder;
pub mod chip;
pub mod custom;
pub mod desc;
pub mod diagnostics;
pub mod error;
pub mod ids;
pub mod kernel;
pub mod queue;
pub mod recorder;
pub mod resolve;
pub mod special;
pub mod time;
pub mod trace;

pub use arena::{Arena, ArenaId};
pub use bridge::{
    audio_mix, AudioBridge, AudioBuffer, AudioSample, HeadlessVideo, NullAudio, VideoBridge,
};
pub use builder::{BuildStats, Netlist, NetlistBuilder};
pub use chip::{Chip, ChipKind, ChipLink, Transition};
pub use custom::CustomContext;
pub use desc::{
    AudioDesc, ChipDesc, CircuitDesc, CustomData, CustomLogicFn, LogicFn, Orientation, PinRow,
    PropDelay, VideoDesc,
};
pub use dice_config::SampleMode;
pub use error::SimError;
pub use ids::{ChipId, GND_ID, VCC_ID};
pub use kernel::{Circuit, RunStats};
pub use queue::EventQueue;
pub use recorder::StateRecorder;
pub use time::SimTime;
pub use trace::{diff_traces, TraceDiff, TraceDump, TraceError, TraceReader, TraceRow};

use dice_config::SimSettings;
use dice_diagnostics::DiagnosticSink;
use serde::Serialize;

/// Outcome of a batch [`simulate`] call.
#[derive(Clone, Debug, Serialize)]
pub struct SimSummary {
    /// Simulated time when the run stopped.
    pub final_time: SimTime,
    /// Chips in the netlist.
    pub chips: usize,
    /// Netlist construction counters.
    pub build: BuildStats,
    /// Run loop counters.
    pub run: RunStats,
}

/// Builds `desc` and runs it headless for `duration_ps`.
pub fn simulate(
    desc: &CircuitDesc,
    settings: &SimSettings,
    duration_ps: u64,
    sink: &DiagnosticSink,
) -> Result<SimSummary, SimError> {
    let mut circuit = Circuit::new(desc, settings, sink)?;
    circuit.run(duration_ps)?;
    Ok(SimSummary {
        final_time: circuit.global_time(),
        chips: circuit.chip_count(),
        build: circuit.build_stats().clone(),
        run: circuit.run_stats(),
    })
}

//! Declarative hardware descriptions consumed by the netlist builder.
//!
//! A chip type is a static table of [`PinRow`]s, one per output pin. A board
//! is a [`CircuitDesc`]: named instances of chip types, point-to-point
//! connections between `instance.pin` endpoints, sub-circuits included under
//! a name prefix, and per-instance timing hints.

use crate::custom::CustomContext;
use crate::error::SimError;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Maximum number of inputs on a table-driven row (the table has `2^n` entries).
pub const MAX_TABLE_INPUTS: usize = 16;

/// Maximum number of inputs on a custom row (one bit each in the input mask).
pub const MAX_CUSTOM_INPUTS: usize = 32;

/// Combinational behaviour: maps an input bitmask (bit `k` = `inputs[k]`) to the output level.
pub type LogicFn = fn(u32) -> bool;

/// Arbitrary behaviour of a custom chip, invoked when it is evaluated.
pub type CustomLogicFn = fn(&mut CustomContext<'_>) -> Result<(), SimError>;

/// Opaque per-instance data handed to custom behaviour (e.g. a clock frequency).
pub type CustomData = Arc<dyn Any + Send + Sync>;

/// Rise and fall propagation delays of a pin row, in picoseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropDelay {
    /// Delay of a low-to-high output transition.
    pub rise_ps: u64,
    /// Delay of a high-to-low output transition.
    pub fall_ps: u64,
}

impl PropDelay {
    /// Creates a delay pair from rise and fall times in picoseconds.
    pub const fn new(rise_ps: u64, fall_ps: u64) -> Self {
        Self { rise_ps, fall_ps }
    }

    /// Creates a delay pair from rise and fall times in nanoseconds.
    pub const fn ns(rise_ns: u64, fall_ns: u64) -> Self {
        Self::new(rise_ns * 1_000, fall_ns * 1_000)
    }

    /// The same delay for both edges.
    pub const fn symmetric(ps: u64) -> Self {
        Self::new(ps, ps)
    }

    /// The delay that applies when the output is heading to `level`, at least 1 ps.
    pub fn toward(self, level: bool) -> u64 {
        let ps = if level { self.rise_ps } else { self.fall_ps };
        ps.max(1)
    }

    /// The shorter of the two delays, at least 1 ps.
    pub fn min_ps(self) -> u64 {
        self.rise_ps.min(self.fall_ps).max(1)
    }
}

/// How a pin row computes its output.
#[derive(Clone, Copy, Debug)]
pub enum RowLogic {
    /// Output looked up in a truth table precomputed from this function.
    Table(LogicFn),
    /// Output produced by custom behaviour; `None` for passive chips such as the rails.
    Custom(Option<CustomLogicFn>),
}

/// One single-output logic element of a chip type.
#[derive(Clone, Copy, Debug)]
pub struct PinRow {
    /// Output computation.
    pub logic: RowLogic,
    /// Input pin numbers, in bitmask order.
    pub inputs: &'static [u8],
    /// Output pin number; `0` when the row drives nothing.
    pub output: u8,
    /// Propagation delay.
    pub delay: PropDelay,
}

impl PinRow {
    /// A table-driven row.
    pub const fn table(inputs: &'static [u8], output: u8, logic: LogicFn, delay: PropDelay) -> Self {
        Self {
            logic: RowLogic::Table(logic),
            inputs,
            output,
            delay,
        }
    }

    /// A row with custom behaviour.
    pub const fn custom(
        inputs: &'static [u8],
        output: u8,
        logic: Option<CustomLogicFn>,
        delay: PropDelay,
    ) -> Self {
        Self {
            logic: RowLogic::Custom(logic),
            inputs,
            output,
            delay,
        }
    }

    /// Returns `true` for rows with custom behaviour.
    pub fn is_custom(&self) -> bool {
        matches!(self.logic, RowLogic::Custom(_))
    }

    /// Returns the bit position of `pin` among this row's inputs.
    pub fn input_bit(&self, pin: u8) -> Option<usize> {
        self.inputs.iter().position(|&p| p == pin)
    }
}

/// A chip type: a name and one row per output.
#[derive(Debug)]
pub struct ChipDesc {
    /// Part name, e.g. `"7400"`.
    pub name: &'static str,
    /// The rows making up the part.
    pub rows: &'static [PinRow],
}

/// A named instance of a chip type.
#[derive(Clone)]
pub struct ChipInstance {
    /// Instance name, unique within its circuit description.
    pub name: String,
    /// The chip type.
    pub chip: &'static ChipDesc,
    /// Data passed to custom behaviour.
    pub custom_data: Option<CustomData>,
}

impl fmt::Debug for ChipInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChipInstance")
            .field("name", &self.name)
            .field("chip", &self.chip.name)
            .field("custom_data", &self.custom_data.is_some())
            .finish()
    }
}

/// A named connection `name1.pin1 <-> name2.pin2`.
///
/// Direction is not fixed: whichever endpoint is an output drives the other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionDesc {
    /// First endpoint instance name.
    pub name1: String,
    /// First endpoint pin.
    pub pin1: u8,
    /// Second endpoint instance name.
    pub name2: String,
    /// Second endpoint pin.
    pub pin2: u8,
}

impl fmt::Display for ConnectionDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} -> {}.{}", self.name1, self.pin1, self.name2, self.pin2)
    }
}

/// Per-instance override of the chip timing defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptimizationHint {
    /// Instance name within the describing circuit.
    pub chip: String,
    /// Transition history depth.
    pub queue_capacity: usize,
    /// Skew-coalescing divisor.
    pub subcycle_resolution: u64,
}

/// A circuit included in another under a name prefix.
#[derive(Clone, Debug)]
pub struct SubcircuitDesc {
    /// Prefix prepended to every instance name of `desc`.
    pub prefix: String,
    /// The included circuit.
    pub desc: Arc<CircuitDesc>,
}

/// Monitor orientation of a board's video output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    /// Landscape monitor.
    #[default]
    Horizontal,
    /// Portrait monitor.
    Vertical,
}

/// Video timing description handed to the video bridge.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoDesc {
    /// Monitor orientation.
    pub orientation: Orientation,
    /// Nominal scanlines per frame.
    pub lines_per_frame: u32,
}

impl Default for VideoDesc {
    fn default() -> Self {
        Self {
            orientation: Orientation::Horizontal,
            lines_per_frame: 262,
        }
    }
}

/// Audio description handed to the audio bridge.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioDesc {
    /// Gain applied to the mixed input level.
    pub gain: f64,
}

impl Default for AudioDesc {
    fn default() -> Self {
        Self { gain: 1.0 }
    }
}

/// Immutable description of a board.
///
/// Built with chained calls:
///
/// ```ignore
/// let desc = CircuitDesc::new()
///     .chip("U1", &TTL_7404)
///     .connect("U1", 2, "U1", 3);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CircuitDesc {
    chips: Vec<ChipInstance>,
    connections: Vec<ConnectionDesc>,
    sub_circuits: Vec<SubcircuitDesc>,
    hints: Vec<OptimizationHint>,
    video: Option<VideoDesc>,
    audio: Option<AudioDesc>,
}

impl CircuitDesc {
    /// Creates an empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a chip instance.
    pub fn chip(mut self, name: impl Into<String>, chip: &'static ChipDesc) -> Self {
        self.chips.push(ChipInstance {
            name: name.into(),
            chip,
            custom_data: None,
        });
        self
    }

    /// Adds a chip instance carrying data for its custom behaviour.
    pub fn chip_with_data(
        mut self,
        name: impl Into<String>,
        chip: &'static ChipDesc,
        data: CustomData,
    ) -> Self {
        self.chips.push(ChipInstance {
            name: name.into(),
            chip,
            custom_data: Some(data),
        });
        self
    }

    /// Connects `name1.pin1` with `name2.pin2`.
    pub fn connect(
        mut self,
        name1: impl Into<String>,
        pin1: u8,
        name2: impl Into<String>,
        pin2: u8,
    ) -> Self {
        self.connections.push(ConnectionDesc {
            name1: name1.into(),
            pin1,
            name2: name2.into(),
            pin2,
        });
        self
    }

    /// Includes `desc` with every instance name prefixed by `prefix`.
    pub fn subcircuit(mut self, prefix: impl Into<String>, desc: Arc<CircuitDesc>) -> Self {
        self.sub_circuits.push(SubcircuitDesc {
            prefix: prefix.into(),
            desc,
        });
        self
    }

    /// Overrides the timing defaults of one instance.
    pub fn hint(
        mut self,
        chip: impl Into<String>,
        queue_capacity: usize,
        subcycle_resolution: u64,
    ) -> Self {
        self.hints.push(OptimizationHint {
            chip: chip.into(),
            queue_capacity,
            subcycle_resolution,
        });
        self
    }

    /// Sets the video description.
    pub fn with_video(mut self, video: VideoDesc) -> Self {
        self.video = Some(video);
        self
    }

    /// Sets the audio description.
    pub fn with_audio(mut self, audio: AudioDesc) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Chip instances in declaration order.
    pub fn chips(&self) -> &[ChipInstance] {
        &self.chips
    }

    /// Connections in declaration order.
    pub fn connections(&self) -> &[ConnectionDesc] {
        &self.connections
    }

    /// Included sub-circuits.
    pub fn sub_circuits(&self) -> &[SubcircuitDesc] {
        &self.sub_circuits
    }

    /// Timing hints.
    pub fn hints(&self) -> &[OptimizationHint] {
        &self.hints
    }

    /// Video description, if the board has one.
    pub fn video(&self) -> Option<&VideoDesc> {
        self.video.as_ref()
    }

    /// Audio description, if the board has one.
    pub fn audio(&self) -> Option<&AudioDesc> {
        self.audio.as_ref()
    }
}

//! The chip model: one single-output logic element and its links.

use crate::desc::{CustomData, CustomLogicFn, PinRow, RowLogic, MAX_TABLE_INPUTS};
use crate::ids::ChipId;
use crate::time::SimTime;
use dice_common::Ident;
use std::collections::VecDeque;

/// Whether a chip is evaluated through a truth table or custom behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChipKind {
    /// Table-driven combinational logic.
    Combinational,
    /// Arbitrary behaviour (rails, de-optimizer, bridges, oscillators).
    Custom,
}

/// A resolved edge: the source chip's output drives the `mask` bit of `target`'s inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChipLink {
    /// The driven chip.
    pub target: ChipId,
    /// Single input bit of `target` fed by this link.
    pub mask: u32,
}

/// An output transition kept in a chip's history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// When the output changed.
    pub time: SimTime,
    /// The new output level.
    pub level: bool,
}

/// Evaluation strategy of a chip.
pub enum ChipLogic {
    /// Dense truth table indexed by the input bitmask.
    Table(Box<[bool]>),
    /// Custom behaviour and its per-instance data.
    Custom {
        /// Behaviour, `None` for passive chips.
        func: Option<CustomLogicFn>,
        /// Instance data.
        data: Option<CustomData>,
    },
}

/// One pin row of a chip instance, as simulated.
pub struct Chip {
    pub(crate) instance: Ident,
    pub(crate) row: &'static PinRow,
    pub(crate) logic: ChipLogic,
    pub(crate) inputs: u32,
    pub(crate) output: bool,
    pub(crate) analog_output: f64,
    pub(crate) pending_event: Option<SimTime>,
    pub(crate) input_links: Vec<Option<ChipId>>,
    pub(crate) output_links: Vec<ChipLink>,
    pub(crate) optimization_disabled: bool,
    pub(crate) queue_capacity: usize,
    pub(crate) subcycle_resolution: u64,
    transitions: VecDeque<Transition>,
    toggles: u64,
}

impl Chip {
    /// Creates a chip for `row` of instance `instance`.
    ///
    /// Table rows get their truth table built here; the caller must have
    /// checked the row against [`MAX_TABLE_INPUTS`].
    pub(crate) fn new(
        instance: Ident,
        row: &'static PinRow,
        custom_data: Option<CustomData>,
        queue_capacity: usize,
        subcycle_resolution: u64,
    ) -> Self {
        let logic = match row.logic {
            RowLogic::Table(func) => ChipLogic::Table(build_table(func, row.inputs.len())),
            RowLogic::Custom(func) => ChipLogic::Custom {
                func,
                data: custom_data,
            },
        };
        let queue_capacity = queue_capacity.max(1);
        Self {
            instance,
            row,
            logic,
            inputs: 0,
            output: false,
            analog_output: 0.0,
            pending_event: None,
            input_links: vec![None; row.inputs.len()],
            output_links: Vec::new(),
            optimization_disabled: false,
            queue_capacity,
            subcycle_resolution: subcycle_resolution.max(1),
            transitions: VecDeque::with_capacity(queue_capacity),
            toggles: 0,
        }
    }

    /// Table-driven or custom.
    pub fn kind(&self) -> ChipKind {
        match self.logic {
            ChipLogic::Table(_) => ChipKind::Combinational,
            ChipLogic::Custom { .. } => ChipKind::Custom,
        }
    }

    /// Interned name of the instance this row belongs to.
    pub fn instance(&self) -> Ident {
        self.instance
    }

    /// The pin row this chip simulates.
    pub fn row(&self) -> &'static PinRow {
        self.row
    }

    /// Output pin number (0 if the row drives nothing).
    pub fn output_pin(&self) -> u8 {
        self.row.output
    }

    /// Bitmask of asserted inputs.
    pub fn inputs(&self) -> u32 {
        self.inputs
    }

    /// Level of input `pin`, if the row has such an input.
    pub fn input_level(&self, pin: u8) -> Option<bool> {
        self.row
            .input_bit(pin)
            .map(|bit| self.inputs & (1 << bit) != 0)
    }

    /// Current output level.
    pub fn output(&self) -> bool {
        self.output
    }

    /// Analog output: the rail voltage, or the `AUDIO` chip's mixed level.
    pub fn analog_output(&self) -> f64 {
        self.analog_output
    }

    /// Time of the next honoured re-evaluation, if any.
    pub fn pending_event(&self) -> Option<SimTime> {
        self.pending_event
    }

    /// Driver of each input, in input-bit order.
    pub fn input_links(&self) -> &[Option<ChipId>] {
        &self.input_links
    }

    /// Loads driven by this chip's output.
    pub fn output_links(&self) -> &[ChipLink] {
        &self.output_links
    }

    /// Whether scheduling shortcuts are disabled for this chip.
    pub fn optimization_disabled(&self) -> bool {
        self.optimization_disabled
    }

    /// Disables or re-enables scheduling shortcuts.
    pub fn set_optimization_disabled(&mut self, disabled: bool) {
        self.optimization_disabled = disabled;
    }

    /// Transition history depth.
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Skew-coalescing divisor.
    pub fn subcycle_resolution(&self) -> u64 {
        self.subcycle_resolution
    }

    /// Output level the truth table gives for the current inputs.
    ///
    /// Custom chips have no table and report their current output.
    pub fn predicted_output(&self) -> bool {
        match &self.logic {
            ChipLogic::Table(table) => table[self.inputs as usize],
            ChipLogic::Custom { .. } => self.output,
        }
    }

    /// Delay before a re-evaluation heading toward `level` is due.
    ///
    /// Custom chips do not know their next level and always use the shorter delay.
    pub(crate) fn delay_toward(&self, level: bool) -> u64 {
        match self.logic {
            ChipLogic::Table(_) => self.row.delay.toward(level),
            ChipLogic::Custom { .. } => self.row.delay.min_ps(),
        }
    }

    /// Width of the window within which a reschedule reuses the pending event.
    pub(crate) fn coalesce_window(&self) -> u64 {
        self.row.delay.min_ps() / self.subcycle_resolution
    }

    /// The most recent output transitions, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    /// Number of output changes since the circuit started running.
    pub fn toggle_count(&self) -> u64 {
        self.toggles
    }

    pub(crate) fn record_transition(&mut self, time: SimTime, level: bool) {
        if self.transitions.len() == self.queue_capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(Transition { time, level });
        self.toggles += 1;
    }

    pub(crate) fn custom_data(&self) -> Option<&CustomData> {
        match &self.logic {
            ChipLogic::Custom { data, .. } => data.as_ref(),
            ChipLogic::Table(_) => None,
        }
    }

    pub(crate) fn custom_func(&self) -> Option<CustomLogicFn> {
        match self.logic {
            ChipLogic::Custom { func, .. } => func,
            ChipLogic::Table(_) => None,
        }
    }
}

impl std::fmt::Debug for Chip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chip")
            .field("kind", &self.kind())
            .field("output_pin", &self.row.output)
            .field("inputs", &format_args!("{:#b}", self.inputs))
            .field("output", &self.output)
            .field("pending_event", &self.pending_event)
            .field("output_links", &self.output_links.len())
            .finish()
    }
}

/// Precomputes the `2^inputs` truth table of a combinational row.
fn build_table(func: fn(u32) -> bool, inputs: usize) -> Box<[bool]> {
    debug_assert!(inputs <= MAX_TABLE_INPUTS);
    (0..1u32 << inputs).map(func).collect()
}

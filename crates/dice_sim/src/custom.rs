//! The view of the circuit handed to custom chip behaviour.

use crate::arena::Arena;
use crate::bridge::{AudioBridge, VideoBridge};
use crate::chip::{Chip, ChipLink};
use crate::error::SimError;
use crate::ids::ChipId;
use crate::kernel::drive_output;
use crate::queue::EventQueue;
use crate::time::SimTime;
use std::any::Any;

/// Everything a custom behaviour may read or change while it runs.
///
/// Besides its own state a behaviour may reach the chips on its output
/// links through [`chip_mut`](Self::chip_mut), and the video and audio
/// bridges.
pub struct CustomContext<'a> {
    pub(crate) id: ChipId,
    pub(crate) now: SimTime,
    pub(crate) chips: &'a mut Arena<ChipId, Chip>,
    pub(crate) queue: &'a mut EventQueue,
    pub(crate) video: &'a mut dyn VideoBridge,
    pub(crate) audio: &'a mut dyn AudioBridge,
}

impl<'a> CustomContext<'a> {
    /// The chip being evaluated.
    pub fn id(&self) -> ChipId {
        self.id
    }

    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    fn chip(&self) -> &Chip {
        &self.chips[self.id]
    }

    /// Bitmask of this chip's asserted inputs.
    pub fn inputs(&self) -> u32 {
        self.chip().inputs()
    }

    /// Level of input `pin`, if the chip has such an input.
    pub fn input(&self, pin: u8) -> Option<bool> {
        self.chip().input_level(pin)
    }

    /// This chip's current output level.
    pub fn output(&self) -> bool {
        self.chip().output()
    }

    /// Drives the output to `level`, scheduling every affected load.
    pub fn set_output(&mut self, level: bool) -> Result<(), SimError> {
        if self.chip().output() == level {
            return Ok(());
        }
        drive_output(self.chips, self.queue, self.now, self.id, level)
    }

    /// Sets the analog output value.
    pub fn set_analog_output(&mut self, value: f64) {
        self.chips[self.id].analog_output = value;
    }

    /// Re-evaluates this chip again `delay_ps` from now.
    pub fn schedule_in(&mut self, delay_ps: u64) -> Result<(), SimError> {
        if delay_ps == 0 {
            return Err(SimError::InvalidDelay { chip: self.id });
        }
        let due = self.now.after(delay_ps);
        self.queue.push(due, self.id)?;
        self.chips[self.id].pending_event = Some(due);
        Ok(())
    }

    /// This chip's loads.
    pub fn output_links(&self) -> &[ChipLink] {
        self.chip().output_links()
    }

    /// Mutable access to another chip, normally one of [`output_links`](Self::output_links).
    pub fn chip_mut(&mut self, id: ChipId) -> &mut Chip {
        &mut self.chips[id]
    }

    /// This instance's custom data, if it is of type `T`.
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.chip().custom_data()?.downcast_ref::<T>()
    }

    /// The video bridge.
    pub fn video(&mut self) -> &mut dyn VideoBridge {
        &mut *self.video
    }

    /// The audio bridge.
    pub fn audio(&mut self) -> &mut dyn AudioBridge {
        &mut *self.audio
    }

    /// Builds a [`SimError::CustomLogic`] for this chip.
    pub fn fail(&self, reason: impl Into<String>) -> SimError {
        SimError::CustomLogic {
            chip: self.id,
            reason: reason.into(),
        }
    }
}

//! Chips every circuit gets: power rails, the de-optimizer, and the I/O bridges.

use crate::bridge::{audio_mix, AUDIO_INPUT_PINS, VIDEO_INPUT_PINS};
use crate::custom::CustomContext;
use crate::desc::{ChipDesc, PinRow, PropDelay};
use crate::error::SimError;
use tracing::debug;

/// Instance name of the 5V rail.
pub const VCC_NAME: &str = "_VCC";
/// Instance name of the ground rail.
pub const GND_NAME: &str = "_GND";
/// Instance name of the de-optimizer.
pub const DEOPTIMIZER_NAME: &str = "_DEOPTIMIZER";
/// Instance name of the video bridge chip.
pub const VIDEO_NAME: &str = "VIDEO";
/// Instance name of the audio bridge chip.
pub const AUDIO_NAME: &str = "AUDIO";

/// 5V rail. Its output is forced high once at start and never scheduled.
pub static VCC: ChipDesc = ChipDesc {
    name: VCC_NAME,
    rows: &[PinRow::custom(&[], 1, None, PropDelay::symmetric(1))],
};

/// Ground rail, the driver of every tied-off input.
pub static GND: ChipDesc = ChipDesc {
    name: GND_NAME,
    rows: &[PinRow::custom(&[], 1, None, PropDelay::symmetric(1))],
};

/// Disables scheduling shortcuts on every chip its output is connected to.
pub static DEOPTIMIZER: ChipDesc = ChipDesc {
    name: DEOPTIMIZER_NAME,
    rows: &[PinRow::custom(&[], 1, Some(deoptimize), PropDelay::symmetric(1))],
};

/// Forwards its inputs to the video bridge.
pub static VIDEO: ChipDesc = ChipDesc {
    name: VIDEO_NAME,
    rows: &[PinRow::custom(VIDEO_INPUT_PINS, 0, Some(video), PropDelay::symmetric(1))],
};

/// Forwards its inputs to the audio bridge.
pub static AUDIO: ChipDesc = ChipDesc {
    name: AUDIO_NAME,
    rows: &[PinRow::custom(AUDIO_INPUT_PINS, 0, Some(audio), PropDelay::symmetric(1))],
};

/// A special chip with the timing parameters it is built with.
pub(crate) struct SpecialChip {
    pub desc: &'static ChipDesc,
    pub queue_capacity: usize,
    pub subcycle_resolution: u64,
}

/// Special chips in construction order; the rails must stay first.
pub(crate) static SPECIAL_CHIPS: [SpecialChip; 5] = [
    SpecialChip {
        desc: &VCC,
        queue_capacity: 1,
        subcycle_resolution: 64,
    },
    SpecialChip {
        desc: &GND,
        queue_capacity: 1,
        subcycle_resolution: 64,
    },
    SpecialChip {
        desc: &DEOPTIMIZER,
        queue_capacity: 1,
        subcycle_resolution: 64,
    },
    SpecialChip {
        desc: &VIDEO,
        queue_capacity: 8,
        subcycle_resolution: 64,
    },
    SpecialChip {
        desc: &AUDIO,
        queue_capacity: 8,
        subcycle_resolution: 64,
    },
];

fn deoptimize(ctx: &mut CustomContext<'_>) -> Result<(), SimError> {
    for k in 0..ctx.output_links().len() {
        let target = ctx.output_links()[k].target;
        debug!(chip = %target, "deoptimizing");
        ctx.chip_mut(target).set_optimization_disabled(true);
    }
    Ok(())
}

fn video(ctx: &mut CustomContext<'_>) -> Result<(), SimError> {
    let (now, inputs) = (ctx.now(), ctx.inputs());
    ctx.video().signal(now, inputs);
    Ok(())
}

fn audio(ctx: &mut CustomContext<'_>) -> Result<(), SimError> {
    let (now, inputs) = (ctx.now(), ctx.inputs());
    ctx.set_analog_output(audio_mix(inputs));
    ctx.audio().signal(now, inputs);
    Ok(())
}

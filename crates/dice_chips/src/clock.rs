//! Free-running clock oscillator.

use dice_common::Frequency;
use dice_sim::{ChipDesc, CustomContext, CustomData, PinRow, PropDelay, SimError};
use std::sync::Arc;

/// Square-wave oscillator on pin 1.
///
/// The instance's custom data must be a [`Frequency`] (see [`clock_data`]).
/// The output starts high at time zero and toggles every half period.
pub static CLOCK: ChipDesc = ChipDesc {
    name: "CLOCK",
    rows: &[PinRow::custom(&[], 1, Some(oscillate), PropDelay::symmetric(1))],
};

/// Custom data for a [`CLOCK`] instance.
pub fn clock_data(frequency: Frequency) -> CustomData {
    Arc::new(frequency)
}

fn oscillate(ctx: &mut CustomContext<'_>) -> Result<(), SimError> {
    let half_period = ctx
        .data::<Frequency>()
        .and_then(Frequency::half_period_ps)
        .ok_or_else(|| ctx.fail("clock needs a positive frequency as custom data"))?;
    let level = !ctx.output();
    ctx.set_output(level)?;
    ctx.schedule_in(half_period)
}

//! Chip types shared by the integration tests.

#![allow(dead_code)]

use dice_sim::{ChipDesc, CircuitDesc, CustomContext, PinRow, PropDelay, SimError};
use std::sync::{Arc, Mutex};

/// Inverter, input 1, output 2.
pub static INV: ChipDesc = ChipDesc {
    name: "inv",
    rows: &[PinRow::table(&[1], 2, |i| i == 0, PropDelay::ns(10, 7))],
};

/// Buffer driving pin 1 from pin 2, so `X.1 -> Y.1` style wiring resolves.
pub static BUF_OUT1: ChipDesc = ChipDesc {
    name: "buf-out1",
    rows: &[PinRow::table(&[2], 1, |i| i != 0, PropDelay::ns(5, 5))],
};

/// Passive load with one input; keeps whatever drives it alive.
pub static PROBE: ChipDesc = ChipDesc {
    name: "probe",
    rows: &[PinRow::custom(&[1], 0, None, PropDelay::symmetric(1))],
};

/// Toggles its output every `u64` picoseconds of custom data.
pub static TOGGLER: ChipDesc = ChipDesc {
    name: "toggler",
    rows: &[PinRow::custom(&[], 1, Some(toggle), PropDelay::symmetric(1))],
};

/// Appends the simulated time of every evaluation to a shared log.
pub static LOGGER: ChipDesc = ChipDesc {
    name: "logger",
    rows: &[PinRow::custom(&[], 1, Some(log_time), PropDelay::symmetric(1))],
};

fn toggle(ctx: &mut CustomContext<'_>) -> Result<(), SimError> {
    let half = *ctx
        .data::<u64>()
        .ok_or_else(|| ctx.fail("missing toggle period"))?;
    let level = !ctx.output();
    ctx.set_output(level)?;
    ctx.schedule_in(half)
}

pub type TimeLog = Mutex<Vec<u64>>;

fn log_time(ctx: &mut CustomContext<'_>) -> Result<(), SimError> {
    let log = ctx
        .data::<TimeLog>()
        .ok_or_else(|| ctx.fail("missing log"))?;
    log.lock().unwrap().push(ctx.now().as_ps());
    Ok(())
}

/// Three inverters in a loop, observed by a probe.
pub fn ring_oscillator() -> CircuitDesc {
    CircuitDesc::new()
        .chip("A", &INV)
        .chip("B", &INV)
        .chip("C", &INV)
        .chip("P", &PROBE)
        .connect("A", 2, "B", 1)
        .connect("B", 2, "C", 1)
        .connect("C", 2, "A", 1)
        .connect("C", 2, "P", 1)
}

/// A logger chip sharing `log` with the test.
pub fn logger_board(log: Arc<TimeLog>) -> CircuitDesc {
    CircuitDesc::new().chip_with_data("L", &LOGGER, log)
}

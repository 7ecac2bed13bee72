//! Built-in boards runnable with `dice run <name>`.

use std::error::Error;

use dice_chips::{clock_data, CHIP_7404, CHIP_7474, CLOCK};
use dice_common::Frequency;
use dice_sim::{CircuitDesc, VideoDesc};

use crate::GlobalArgs;

/// A named board.
pub struct Demo {
    /// Name given on the command line.
    pub name: &'static str,
    /// One-line description for `dice demos`.
    pub about: &'static str,
    /// Builds the board description.
    pub build: fn() -> CircuitDesc,
}

/// Every built-in board.
pub static DEMOS: &[Demo] = &[
    Demo {
        name: "ring",
        about: "three-inverter ring oscillator",
        build: ring,
    },
    Demo {
        name: "counter",
        about: "two-bit ripple counter on a 1 MHz clock",
        build: counter,
    },
    Demo {
        name: "video",
        about: "NTSC line and frame sync feeding the video back-end",
        build: video,
    },
];

/// Looks a board up by name.
pub fn find_demo(name: &str) -> Option<&'static Demo> {
    DEMOS.iter().find(|demo| demo.name == name)
}

/// `dice demos`: prints the board names.
pub fn list(_global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let width = DEMOS.iter().map(|d| d.name.len()).max().unwrap_or(0);
    for demo in DEMOS {
        println!("{:width$}  {}", demo.name, demo.about);
    }
    Ok(0)
}

fn ring() -> CircuitDesc {
    CircuitDesc::new()
        .chip("U1", &CHIP_7404)
        .connect("U1", 2, "U1", 3)
        .connect("U1", 4, "U1", 5)
        .connect("U1", 6, "U1", 1)
        .connect("U1", 6, "VIDEO", 1)
}

fn counter() -> CircuitDesc {
    CircuitDesc::new()
        .chip_with_data("CLK", &CLOCK, clock_data(Frequency::new(1_000_000.0)))
        .chip("U1", &CHIP_7474)
        .connect("CLK", 1, "U1", 3)
        // Each /Q feeds its own D; the first /Q clocks the second stage.
        .connect("U1", 6, "U1", 2)
        .connect("U1", 6, "U1", 11)
        .connect("U1", 8, "U1", 12)
        .connect("_VCC", 1, "U1", 1)
        .connect("_VCC", 1, "U1", 4)
        .connect("_VCC", 1, "U1", 10)
        .connect("_VCC", 1, "U1", 13)
        .connect("U1", 5, "VIDEO", 1)
        .connect("U1", 9, "VIDEO", 2)
}

fn video() -> CircuitDesc {
    CircuitDesc::new()
        .chip_with_data("HSYNC", &CLOCK, clock_data(Frequency::new(15_734.0)))
        .chip_with_data("VSYNC", &CLOCK, clock_data(Frequency::new(59.94)))
        .connect("HSYNC", 1, "VIDEO", 9)
        .connect("VSYNC", 1, "VIDEO", 10)
        .with_video(VideoDesc::default())
}

//! State traces: determinism, frame-edge sampling, reading back.

mod common;

use common::{ring_oscillator, PROBE, TOGGLER};
use dice_config::SimSettings;
use dice_diagnostics::DiagnosticSink;
use dice_sim::recorder::STATE_FILE;
use dice_sim::{
    diff_traces, Circuit, CircuitDesc, HeadlessVideo, SampleMode, TraceDiff, TraceDump,
    VideoBridge,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn record_ring(dir: &Path, slices: &[u64]) -> u64 {
    let mut c = Circuit::new(&ring_oscillator(), &SimSettings::default(), &DiagnosticSink::new())
        .unwrap();
    c.record_to_dir(dir, SampleMode::Tick, false).unwrap();
    for &slice in slices {
        c.run(slice).unwrap();
    }
    c.finish_recording().unwrap().unwrap()
}

#[test]
fn identical_runs_give_identical_traces() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let slices = [40_000, 125_000, 3_000];
    let samples_a = record_ring(a.path(), &slices);
    let samples_b = record_ring(b.path(), &slices);
    assert_eq!(samples_a, samples_b);
    assert!(samples_a > 0);

    let bytes_a = fs::read(a.path().join(STATE_FILE)).unwrap();
    let bytes_b = fs::read(b.path().join(STATE_FILE)).unwrap();
    assert!(!bytes_a.is_empty());
    assert_eq!(bytes_a, bytes_b);

    let dump_a = TraceDump::open(a.path()).unwrap();
    let dump_b = TraceDump::open(b.path()).unwrap();
    assert_eq!(dump_a.hash().unwrap(), dump_b.hash().unwrap());
    assert_eq!(
        diff_traces(&dump_a, &dump_b).unwrap(),
        TraceDiff::Identical { rows: samples_a }
    );
}

#[test]
fn trace_rows_are_time_ordered_and_sized() {
    let dir = tempfile::tempdir().unwrap();
    let samples = record_ring(dir.path(), &[200_000]);
    let dump = TraceDump::open(dir.path()).unwrap();
    assert_eq!(dump.chip_count(), 9);
    assert_eq!(dump.labels()[0], "_VCC.1");
    assert_eq!(dump.labels()[5], "A.2");

    let rows: Vec<_> = dump.rows().unwrap().map(Result::unwrap).collect();
    assert_eq!(rows.len() as u64, samples);
    assert!(rows.windows(2).all(|w| w[0].time <= w[1].time));
    // VCC is high in every record, GND never.
    assert!(rows.iter().all(|r| r.output(0) && !r.output(1)));
}

fn video_board() -> CircuitDesc {
    CircuitDesc::new()
        .chip_with_data("HSYNC", &TOGGLER, Arc::new(10_000u64))
        .chip_with_data("VSYNC", &TOGGLER, Arc::new(100_000u64))
        .chip("P", &PROBE)
        .connect("HSYNC", 1, "VIDEO", 9)
        .connect("VSYNC", 1, "VIDEO", 10)
        .connect("HSYNC", 1, "P", 1)
}

#[test]
fn frame_edge_samples_once_per_frame() {
    let dir = tempfile::tempdir().unwrap();
    let mut c = Circuit::new(&video_board(), &SimSettings::default(), &DiagnosticSink::new())
        .unwrap();
    c.record_to_dir(dir.path(), SampleMode::FrameEdge, true).unwrap();
    c.run(1_000_000).unwrap();

    let frames = c.video().frame_count();
    assert_eq!(frames, 5);
    assert_eq!(c.run_stats().samples, u64::from(frames));
    assert_eq!(c.finish_recording().unwrap(), Some(u64::from(frames)));

    let video = c.video_bridge::<HeadlessVideo>().unwrap();
    assert_eq!(video.last_frame_period_ps(), Some(200_000));
    assert_eq!(video.lines_in_last_frame(), 10);

    // Compressed dumps read back the same way.
    let dump = TraceDump::open(dir.path()).unwrap();
    assert_eq!(dump.rows().unwrap().count() as u32, frames);
}

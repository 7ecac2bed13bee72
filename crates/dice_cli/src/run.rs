//! `dice run`: simulate a built-in board.
//!
//! Builds the board, optionally starts a state dump, then runs the circuit
//! in slices of simulated time. With throttling on, each slice is paced so
//! simulated time tracks the wall clock.

use std::error::Error;
use std::path::Path;
use std::time::{Duration, Instant};

use dice_config::{SampleMode, SimSettings, PS_PER_NS};
use dice_diagnostics::DiagnosticSink;
use dice_sim::{Circuit, SimSummary};
use tracing::{debug, info, warn};

use crate::demos::{find_demo, DEMOS};
use crate::pipeline::{parse_duration, render_diagnostics, resolve_settings};
use crate::{GlobalArgs, ReportFormat, RunArgs};

/// How far simulated time may run ahead of the wall clock.
const MAX_AHEAD: Duration = Duration::from_millis(50);
/// How far simulated time may fall behind before pacing restarts.
const MAX_BEHIND: Duration = Duration::from_millis(100);

/// Runs the `dice run` command.
///
/// Construction diagnostics never stop the run: they are rendered and the
/// board runs as built. Returns exit code 0 once the run completes.
pub fn run(args: &RunArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let settings = resolve_settings(global)?;
    let demo = find_demo(&args.demo).ok_or_else(|| {
        let names: Vec<&str> = DEMOS.iter().map(|d| d.name).collect();
        format!("unknown board '{}' (available: {})", args.demo, names.join(", "))
    })?;
    let duration = parse_duration(&args.time)?;
    let slice = parse_duration(&settings.run.slice)?.max(1);

    let sink = DiagnosticSink::new();
    let built = Circuit::new(&(demo.build)(), &settings, &sink);
    let errors = render_diagnostics(&sink, args.format, global.color, global.quiet);
    let mut circuit = built?;
    if errors > 0 {
        warn!(errors, "running board despite construction errors");
    }

    if let Some((dir, mode)) = dump_target(args, &settings) {
        circuit.record_to_dir(Path::new(dir), mode, settings.recorder.compress)?;
    }

    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!("   Running {} for {}", demo.name, args.time);
    }
    info!(board = demo.name, chips = circuit.chip_count(), duration, "run started");

    let throttle = settings.run.throttle && !args.no_throttle;
    let mut pacer = Pacer::new(circuit.global_time().as_ps());
    let started = Instant::now();
    let mut remaining = duration;
    while remaining > 0 {
        let step = remaining.min(slice);
        circuit.run(step)?;
        remaining -= step;
        if throttle {
            pacer.pace(circuit.global_time().as_ps());
        }
    }
    let samples = circuit.finish_recording()?;
    let elapsed = started.elapsed();

    let summary = SimSummary {
        final_time: circuit.global_time(),
        chips: circuit.chip_count(),
        build: circuit.build_stats().clone(),
        run: circuit.run_stats(),
    };
    match args.format {
        ReportFormat::Json => println!("{}", serde_json::to_string(&summary)?),
        ReportFormat::Text if !global.quiet => {
            eprintln!(
                "    Finished at {} ({} chips, {} events, {} stale) in {:.2}s",
                summary.final_time,
                summary.chips,
                summary.run.events,
                summary.run.stale,
                elapsed.as_secs_f64()
            );
            if let Some(samples) = samples {
                eprintln!("    Recorded {samples} state samples");
            }
        }
        ReportFormat::Text => {}
    }
    Ok(0)
}

/// Dump directory and sampling mode requested for this run.
///
/// `--dump-state` samples as `[recorder] mode` says; `--dump-state-frame`
/// always samples on frame edges.
fn dump_target<'a>(args: &'a RunArgs, settings: &SimSettings) -> Option<(&'a str, SampleMode)> {
    match (&args.dump_state, &args.dump_state_frame) {
        (Some(dir), _) => Some((dir.as_str(), settings.recorder.mode)),
        (None, Some(dir)) => Some((dir.as_str(), SampleMode::FrameEdge)),
        (None, None) => None,
    }
}

/// What the pacer does after a slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaceAction {
    /// Keep going.
    Continue,
    /// Simulated time is ahead; wait.
    Sleep(Duration),
    /// Simulated time fell too far behind; restart pacing from here.
    Resync,
}

/// Keeps simulated time within a window of wall-clock time.
pub struct Pacer {
    wall_base: Instant,
    sim_base_ps: u64,
}

impl Pacer {
    /// Starts pacing at simulated time `sim_ps`.
    pub fn new(sim_ps: u64) -> Self {
        Self {
            wall_base: Instant::now(),
            sim_base_ps: sim_ps,
        }
    }

    /// Decides what to do given elapsed wall-clock and simulated time.
    pub fn plan(wall: Duration, sim: Duration) -> PaceAction {
        if sim > wall + MAX_AHEAD {
            PaceAction::Sleep(sim - wall - MAX_AHEAD)
        } else if wall > sim + MAX_BEHIND {
            PaceAction::Resync
        } else {
            PaceAction::Continue
        }
    }

    /// Blocks as needed after the circuit reached simulated time `sim_ps`.
    pub fn pace(&mut self, sim_ps: u64) {
        let sim = Duration::from_nanos(sim_ps.saturating_sub(self.sim_base_ps) / PS_PER_NS);
        match Self::plan(self.wall_base.elapsed(), sim) {
            PaceAction::Continue => {}
            PaceAction::Sleep(d) => std::thread::sleep(d),
            PaceAction::Resync => {
                debug!(sim_ps, "simulation behind wall clock, resyncing");
                self.wall_base = Instant::now();
                self.sim_base_ps = sim_ps;
            }
        }
    }
}

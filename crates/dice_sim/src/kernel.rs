//! The event-driven simulation kernel.
//!
//! [`Circuit`] owns the chip graph, the event queue and the bridges. Time
//! advances only inside [`Circuit::run`], which drains the queue up to a
//! time budget.
//!
//! Scheduling uses lazy cancellation: rescheduling a chip overwrites its
//! `pending_event` and leaves the old queue entry where it is. When an entry
//! is popped, the chip is evaluated only if the entry's time still equals its
//! `pending_event`; every other pop is stale and does nothing.

use crate::arena::Arena;
use crate::bridge::{AudioBridge, HeadlessVideo, NullAudio, VideoBridge};
use crate::builder::{BuildStats, NetlistBuilder};
use crate::chip::{Chip, ChipKind};
use crate::custom::CustomContext;
use crate::desc::{CircuitDesc, CustomLogicFn, VideoDesc};
use crate::error::SimError;
use crate::ids::{ChipId, GND_ID, VCC_ID};
use crate::queue::EventQueue;
use crate::recorder::StateRecorder;
use crate::time::SimTime;
use dice_common::Interner;
use dice_config::{SampleMode, SimSettings};
use dice_diagnostics::DiagnosticSink;
use serde::Serialize;
use std::any::Any;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Passes of in-order settling before the remaining chips are left to the scheduler.
const SETTLE_PASSES: usize = 16;

/// Counters gathered while running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Queue entries popped.
    pub events: u64,
    /// Popped entries that no longer matched their chip's pending event.
    pub stale: u64,
    /// Chip evaluations performed by the run loop.
    pub evaluations: u64,
    /// Trace records written.
    pub samples: u64,
}

/// A built circuit, ready to run.
pub struct Circuit {
    chips: Arena<ChipId, Chip>,
    names: Interner,
    queue: EventQueue,
    global_time: SimTime,
    video: Box<dyn VideoBridge>,
    audio: Box<dyn AudioBridge>,
    recorder: Option<StateRecorder>,
    last_frame_count: u32,
    build_stats: BuildStats,
    run_stats: RunStats,
}

impl Circuit {
    /// Builds `desc` with headless bridges.
    pub fn new(
        desc: &CircuitDesc,
        settings: &SimSettings,
        sink: &DiagnosticSink,
    ) -> Result<Self, SimError> {
        Self::with_bridges(
            desc,
            settings,
            sink,
            Box::new(HeadlessVideo::new()),
            Box::new(NullAudio),
        )
    }

    /// Builds `desc` wired to the given video and audio back-ends.
    pub fn with_bridges(
        desc: &CircuitDesc,
        settings: &SimSettings,
        sink: &DiagnosticSink,
        mut video: Box<dyn VideoBridge>,
        mut audio: Box<dyn AudioBridge>,
    ) -> Result<Self, SimError> {
        video.configure(desc.video().unwrap_or(&VideoDesc::default()));
        if let Some(audio_desc) = desc.audio() {
            audio.configure(audio_desc);
        }

        let netlist = NetlistBuilder::build(desc, settings, sink);
        let mut circuit = Self {
            chips: netlist.chips,
            names: netlist.names,
            queue: EventQueue::with_capacity(settings.scheduler.queue_capacity),
            global_time: SimTime::ZERO,
            video,
            audio,
            recorder: None,
            last_frame_count: 0,
            build_stats: netlist.stats,
            run_stats: RunStats::default(),
        };
        circuit.initialize()?;
        Ok(circuit)
    }

    /// Brings the circuit to a consistent state at time zero.
    fn initialize(&mut self) -> Result<(), SimError> {
        let vcc = &mut self.chips[VCC_ID];
        vcc.analog_output = 5.0;
        vcc.output = true;
        apply_level(&mut self.chips, VCC_ID, true);
        let gnd = &mut self.chips[GND_ID];
        gnd.analog_output = 0.0;
        gnd.output = false;

        let ids: Vec<ChipId> = self.chips.ids().collect();
        for pass in 0..SETTLE_PASSES {
            let mut changed = false;
            for &id in &ids {
                let chip = &mut self.chips[id];
                if chip.kind() != ChipKind::Combinational {
                    continue;
                }
                let next = chip.predicted_output();
                if next != chip.output {
                    chip.output = next;
                    apply_level(&mut self.chips, id, next);
                    changed = true;
                }
            }
            if !changed {
                debug!(passes = pass + 1, "circuit settled");
                break;
            }
        }

        for &id in &ids {
            let chip = &self.chips[id];
            if chip.kind() == ChipKind::Combinational && chip.predicted_output() != chip.output {
                schedule_input_change(&mut self.chips, &mut self.queue, self.global_time, id)?;
            }
        }
        for &id in &ids {
            if let Some(func) = self.chips[id].custom_func() {
                self.call_custom(id, func)?;
            }
        }
        Ok(())
    }

    /// Schedules an evaluation of `chip` `delay_ps` from now.
    ///
    /// Supersedes any evaluation already pending for the chip.
    pub fn schedule(&mut self, chip: ChipId, delay_ps: u64) -> Result<(), SimError> {
        if delay_ps == 0 {
            return Err(SimError::InvalidDelay { chip });
        }
        let due = self.global_time.after(delay_ps);
        self.queue.push(due, chip)?;
        self.chips[chip].pending_event = Some(due);
        Ok(())
    }

    /// Processes every event due within `budget_ps` of the current time,
    /// then sets the clock to exactly the end of the budget.
    ///
    /// On error the clock stays at the failing event.
    pub fn run(&mut self, budget_ps: u64) -> Result<(), SimError> {
        let end = self.global_time.after(budget_ps);
        while let Some(entry) = self.queue.peek() {
            if entry.time > end {
                break;
            }
            self.queue.pop();
            self.global_time = entry.time;
            self.run_stats.events += 1;

            let chip = &mut self.chips[entry.chip];
            if chip.pending_event == Some(entry.time) {
                chip.pending_event = None;
                self.evaluate(entry.chip)?;
            } else {
                self.run_stats.stale += 1;
            }
            self.sample()?;
        }
        self.global_time = end;
        Ok(())
    }

    fn evaluate(&mut self, id: ChipId) -> Result<(), SimError> {
        self.run_stats.evaluations += 1;
        let chip = &self.chips[id];
        match chip.kind() {
            ChipKind::Combinational => {
                let next = chip.predicted_output();
                if next != chip.output {
                    drive_output(&mut self.chips, &mut self.queue, self.global_time, id, next)?;
                }
                Ok(())
            }
            ChipKind::Custom => match chip.custom_func() {
                Some(func) => self.call_custom(id, func),
                None => Ok(()),
            },
        }
    }

    fn call_custom(&mut self, id: ChipId, func: CustomLogicFn) -> Result<(), SimError> {
        let mut ctx = CustomContext {
            id,
            now: self.global_time,
            chips: &mut self.chips,
            queue: &mut self.queue,
            video: &mut *self.video,
            audio: &mut *self.audio,
        };
        func(&mut ctx)
    }

    fn sample(&mut self) -> Result<(), SimError> {
        let frames = self.video.frame_count();
        let new_frame = frames != self.last_frame_count;
        self.last_frame_count = frames;

        let Some(recorder) = self.recorder.as_mut() else {
            return Ok(());
        };
        if recorder.mode() == SampleMode::Tick || new_frame {
            recorder.sample(self.global_time, &self.chips)?;
            self.run_stats.samples += 1;
        }
        Ok(())
    }

    /// Current simulated time.
    pub fn global_time(&self) -> SimTime {
        self.global_time
    }

    /// Number of chips in the netlist.
    pub fn chip_count(&self) -> usize {
        self.chips.len()
    }

    /// A chip by ID.
    pub fn chip(&self, id: ChipId) -> &Chip {
        &self.chips[id]
    }

    /// All chips in construction order.
    pub fn chips(&self) -> impl Iterator<Item = (ChipId, &Chip)> {
        self.chips.iter()
    }

    /// Qualified instance name of a chip.
    pub fn chip_name(&self, id: ChipId) -> &str {
        self.names.resolve(self.chips[id].instance)
    }

    /// `instance.output_pin` label of a chip.
    pub fn chip_label(&self, id: ChipId) -> String {
        format!("{}.{}", self.chip_name(id), self.chips[id].output_pin())
    }

    /// Chips created for instance `name`, one per surviving pin row.
    pub fn find_instance(&self, name: &str) -> Vec<ChipId> {
        let Some(ident) = self.names.get(name) else {
            return Vec::new();
        };
        self.chips
            .iter()
            .filter(|(_, c)| c.instance == ident)
            .map(|(id, _)| id)
            .collect()
    }

    /// The chip driving output `pin` of instance `name`.
    pub fn find_output(&self, name: &str, pin: u8) -> Option<ChipId> {
        self.find_instance(name)
            .into_iter()
            .find(|&id| self.chips[id].output_pin() == pin)
    }

    /// Current level of output `pin` of instance `name`.
    pub fn output_level(&self, name: &str, pin: u8) -> Option<bool> {
        self.find_output(name, pin).map(|id| self.chips[id].output)
    }

    /// Queue entries outstanding, stale ones included.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Netlist construction counters.
    pub fn build_stats(&self) -> &BuildStats {
        &self.build_stats
    }

    /// Run loop counters.
    pub fn run_stats(&self) -> RunStats {
        self.run_stats
    }

    /// The video back-end.
    pub fn video(&self) -> &dyn VideoBridge {
        &*self.video
    }

    /// The audio back-end.
    pub fn audio(&self) -> &dyn AudioBridge {
        &*self.audio
    }

    /// The video back-end as its concrete type.
    pub fn video_bridge<T: Any>(&self) -> Option<&T> {
        self.video.as_any().downcast_ref()
    }

    /// The audio back-end as its concrete type.
    pub fn audio_bridge<T: Any>(&self) -> Option<&T> {
        self.audio.as_any().downcast_ref()
    }

    /// Starts recording into `recorder`, replacing any previous one.
    pub fn attach_recorder(&mut self, recorder: StateRecorder) {
        self.last_frame_count = self.video.frame_count();
        self.recorder = Some(recorder);
    }

    /// Starts recording into the dump directory `dir`; returns the trace path.
    pub fn record_to_dir(
        &mut self,
        dir: &Path,
        mode: SampleMode,
        compress: bool,
    ) -> Result<PathBuf, SimError> {
        let labels: Vec<String> = self.chips.ids().map(|id| self.chip_label(id)).collect();
        let recorder = StateRecorder::open_dir(dir, &labels, mode, compress)?;
        let path = recorder
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dir.to_path_buf());
        info!(path = %path.display(), ?mode, "recording state");
        self.attach_recorder(recorder);
        Ok(path)
    }

    /// Stops recording and flushes the trace; returns the number of records.
    pub fn finish_recording(&mut self) -> Result<Option<u64>, SimError> {
        self.recorder.take().map(StateRecorder::finish).transpose()
    }
}

impl std::fmt::Debug for Circuit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Circuit")
            .field("chips", &self.chips.len())
            .field("global_time", &self.global_time)
            .field("queue_len", &self.queue.len())
            .field("recording", &self.recorder.is_some())
            .finish()
    }
}

/// Sets or clears `id`'s bit in every load's input mask.
fn apply_level(chips: &mut Arena<ChipId, Chip>, id: ChipId, level: bool) {
    for k in 0..chips[id].output_links.len() {
        let link = chips[id].output_links[k];
        let target = &mut chips[link.target];
        if level {
            target.inputs |= link.mask;
        } else {
            target.inputs &= !link.mask;
        }
    }
}

/// Changes `id`'s output to `level` at `now` and schedules every load.
pub(crate) fn drive_output(
    chips: &mut Arena<ChipId, Chip>,
    queue: &mut EventQueue,
    now: SimTime,
    id: ChipId,
    level: bool,
) -> Result<(), SimError> {
    let chip = &mut chips[id];
    chip.output = level;
    chip.record_transition(now, level);
    apply_level(chips, id, level);
    for k in 0..chips[id].output_links.len() {
        let target = chips[id].output_links[k].target;
        schedule_input_change(chips, queue, now, target)?;
    }
    Ok(())
}

/// Reacts to a change on one of `id`'s inputs.
///
/// Combinational chips whose table predicts no change cancel any pending
/// event. A reschedule falling within the coalescing window after the
/// pending event keeps the pending one. De-optimized and custom chips always
/// get a fresh event.
pub(crate) fn schedule_input_change(
    chips: &mut Arena<ChipId, Chip>,
    queue: &mut EventQueue,
    now: SimTime,
    id: ChipId,
) -> Result<(), SimError> {
    let chip = &mut chips[id];
    let next = chip.predicted_output();
    let due = now.after(chip.delay_toward(next));

    if !chip.optimization_disabled && chip.kind() == ChipKind::Combinational {
        if next == chip.output {
            chip.pending_event = None;
            return Ok(());
        }
        if let Some(pending) = chip.pending_event {
            if due >= pending && due.since(pending) <= chip.coalesce_window() {
                return Ok(());
            }
        }
    }

    queue.push(due, id)?;
    chip.pending_event = Some(due);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::{ChipDesc, PinRow, PropDelay};

    static INV: ChipDesc = ChipDesc {
        name: "inv",
        rows: &[PinRow::table(&[1], 2, |i| i == 0, PropDelay::ns(10, 6))],
    };

    static PROBE: ChipDesc = ChipDesc {
        name: "probe",
        rows: &[PinRow::custom(&[1], 0, None, PropDelay::symmetric(1))],
    };

    fn circuit(desc: &CircuitDesc) -> Circuit {
        Circuit::new(desc, &SimSettings::default(), &DiagnosticSink::new()).unwrap()
    }

    #[test]
    fn rails_after_init() {
        let c = circuit(&CircuitDesc::new());
        assert!(c.chip(VCC_ID).output());
        assert_eq!(c.chip(VCC_ID).analog_output(), 5.0);
        assert!(!c.chip(GND_ID).output());
        assert_eq!(c.chip(VCC_ID).pending_event(), None);
        assert_eq!(c.global_time(), SimTime::ZERO);
    }

    #[test]
    fn audio_chip_carries_the_mixed_level() {
        let desc = CircuitDesc::new()
            .connect("_VCC", 1, "AUDIO", 1)
            .connect("_VCC", 1, "AUDIO", 3);
        let c = circuit(&desc);
        let audio = c.find_instance("AUDIO")[0];
        assert_eq!(c.chip(audio).analog_output(), 0.5);
        assert_eq!(c.chip(GND_ID).analog_output(), 0.0);
    }

    #[test]
    fn inverter_settles_without_events() {
        // GND -> inverter -> probe: the inverter settles high at start.
        let desc = CircuitDesc::new()
            .chip("U1", &INV)
            .chip("P", &PROBE)
            .connect("U1", 2, "P", 1);
        let c = circuit(&desc);
        assert_eq!(c.output_level("U1", 2), Some(true));
        let probe = c.find_instance("P")[0];
        assert_eq!(c.chip(probe).inputs(), 1);
    }

    #[test]
    fn vcc_tied_inverter_settles_low() {
        let desc = CircuitDesc::new()
            .chip("U1", &INV)
            .chip("P", &PROBE)
            .connect("_VCC", 1, "U1", 1)
            .connect("U1", 2, "P", 1);
        let c = circuit(&desc);
        assert_eq!(c.output_level("U1", 2), Some(false));
    }

    #[test]
    fn run_lands_exactly_on_budget() {
        let mut c = circuit(&CircuitDesc::new());
        c.run(1_000).unwrap();
        assert_eq!(c.global_time(), SimTime::from_ps(1_000));
        c.run(250).unwrap();
        assert_eq!(c.global_time(), SimTime::from_ps(1_250));
    }

    #[test]
    fn zero_delay_rejected() {
        let mut c = circuit(&CircuitDesc::new());
        let err = c.schedule(GND_ID, 0).unwrap_err();
        assert!(matches!(err, SimError::InvalidDelay { .. }));
    }

    #[test]
    fn rescheduling_leaves_one_stale_entry() {
        let desc = CircuitDesc::new()
            .chip("U1", &INV)
            .chip("P", &PROBE)
            .connect("U1", 2, "P", 1);
        let mut c = circuit(&desc);
        let u1 = c.find_output("U1", 2).unwrap();
        c.schedule(u1, 100).unwrap();
        c.schedule(u1, 150).unwrap();
        assert_eq!(c.queue_len(), 2);
        assert_eq!(c.chip(u1).pending_event(), Some(SimTime::from_ps(150)));

        c.run(120).unwrap();
        assert_eq!(c.run_stats().stale, 1);
        assert_eq!(c.run_stats().evaluations, 0);

        c.run(100).unwrap();
        assert_eq!(c.run_stats().evaluations, 1);
        assert_eq!(c.chip(u1).pending_event(), None);
        assert_eq!(c.queue_len(), 0);
    }

    #[test]
    fn coalescing_window_keeps_pending_event() {
        let desc = CircuitDesc::new()
            .chip("U1", &INV)
            .chip("P", &PROBE)
            .connect("U1", 2, "P", 1);
        let mut c = circuit(&desc);
        let u1 = c.find_output("U1", 2).unwrap();

        // Raise the input by hand so the table predicts a fall.
        c.chips[u1].inputs = 1;
        schedule_input_change(&mut c.chips, &mut c.queue, SimTime::ZERO, u1).unwrap();
        let first = c.chip(u1).pending_event().unwrap();
        assert_eq!(first, SimTime::from_ns(6));

        // Within 6000 / 64 ps after the pending event: no new entry.
        let window = c.chip(u1).coalesce_window();
        schedule_input_change(&mut c.chips, &mut c.queue, SimTime::from_ps(window), u1).unwrap();
        assert_eq!(c.queue_len(), 1);
        assert_eq!(c.chip(u1).pending_event(), Some(first));

        // Beyond the window: a fresh event replaces it.
        schedule_input_change(&mut c.chips, &mut c.queue, SimTime::from_ps(window + 1), u1)
            .unwrap();
        assert_eq!(c.queue_len(), 2);

        // Prediction back to the current output cancels.
        c.chips[u1].inputs = 0;
        schedule_input_change(&mut c.chips, &mut c.queue, SimTime::from_ps(10), u1).unwrap();
        assert_eq!(c.chip(u1).pending_event(), None);
    }

    #[test]
    fn deoptimized_chip_always_reschedules() {
        let desc = CircuitDesc::new()
            .chip("U1", &INV)
            .chip("P", &PROBE)
            .connect("U1", 2, "P", 1)
            .connect("_DEOPTIMIZER", 1, "U1", 1);
        let mut c = circuit(&desc);
        let u1 = c.find_output("U1", 2).unwrap();
        assert!(c.chip(u1).optimization_disabled());

        // No change predicted, yet an event is queued.
        let before = c.queue_len();
        schedule_input_change(&mut c.chips, &mut c.queue, SimTime::ZERO, u1).unwrap();
        assert_eq!(c.queue_len(), before + 1);
        assert!(c.chip(u1).pending_event().is_some());
    }

    #[test]
    fn overflow_stops_the_run() {
        let desc = CircuitDesc::new()
            .chip("U1", &INV)
            .chip("P", &PROBE)
            .connect("U1", 2, "P", 1);
        let mut settings = SimSettings::default();
        settings.scheduler.queue_capacity = 1;
        let mut c = Circuit::new(&desc, &settings, &DiagnosticSink::new()).unwrap();
        let u1 = c.find_output("U1", 2).unwrap();
        c.schedule(u1, 10).unwrap();
        let err = c.schedule(u1, 20).unwrap_err();
        assert!(matches!(err, SimError::QueueOverflow { capacity: 1, .. }));
    }

    #[test]
    fn names_and_labels() {
        let desc = CircuitDesc::new()
            .chip("U1", &INV)
            .chip("P", &PROBE)
            .connect("U1", 2, "P", 1);
        let c = circuit(&desc);
        let u1 = c.find_output("U1", 2).unwrap();
        assert_eq!(c.chip_name(u1), "U1");
        assert_eq!(c.chip_label(u1), "U1.2");
        assert_eq!(c.chip_label(VCC_ID), "_VCC.1");
        assert!(c.find_instance("nope").is_empty());
        assert!(c.video_bridge::<HeadlessVideo>().is_some());
        assert!(c.audio_bridge::<HeadlessVideo>().is_none());
    }
}

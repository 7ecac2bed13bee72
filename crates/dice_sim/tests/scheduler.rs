//! Run loop behaviour: lazy cancellation, budgets, rails, overflow.

mod common;

use common::{logger_board, ring_oscillator, TimeLog, INV, PROBE, TOGGLER};
use dice_config::SimSettings;
use dice_diagnostics::DiagnosticSink;
use dice_sim::{simulate, Circuit, CircuitDesc, SimError, SimTime, VCC_ID};
use std::sync::Arc;

fn circuit(desc: &CircuitDesc) -> Circuit {
    Circuit::new(desc, &SimSettings::default(), &DiagnosticSink::new()).unwrap()
}

#[test]
fn superseded_event_evaluates_once_at_the_later_time() {
    let log = Arc::new(TimeLog::default());
    let mut c = circuit(&logger_board(log.clone()));
    let l = c.find_instance("L")[0];

    c.schedule(l, 100).unwrap();
    c.schedule(l, 150).unwrap();
    c.run(1_000).unwrap();

    // One call at start, then exactly one at 150 ps.
    assert_eq!(*log.lock().unwrap(), vec![0, 150]);
    assert_eq!(c.run_stats().stale, 1);
    assert_eq!(c.run_stats().evaluations, 1);
}

#[test]
fn run_never_overshoots_its_budget() {
    let mut c = circuit(&ring_oscillator());
    for budget in [1, 999, 7_000, 33_333, 1_000_000] {
        let before = c.global_time();
        c.run(budget).unwrap();
        assert_eq!(c.global_time(), before.after(budget));
    }
    // The ring keeps oscillating.
    let a = c.find_output("A", 2).unwrap();
    assert!(c.chip(a).toggle_count() > 10);
    assert!(c.queue_len() > 0);
}

#[test]
fn empty_queue_jumps_to_budget_end() {
    let mut c = circuit(&CircuitDesc::new());
    c.run(5_000_000).unwrap();
    assert_eq!(c.global_time(), SimTime::from_us(5));
    assert_eq!(c.run_stats().events, 0);
}

#[test]
fn vcc_stays_high_and_unscheduled() {
    let desc = ring_oscillator()
        .chip("V", &INV)
        .chip("Q", &PROBE)
        .connect("_VCC", 1, "V", 1)
        .connect("V", 2, "Q", 1);
    let mut c = circuit(&desc);
    for _ in 0..10 {
        c.run(50_000).unwrap();
        assert!(c.chip(VCC_ID).output());
        assert_eq!(c.chip(VCC_ID).pending_event(), None);
    }
    assert_eq!(c.chip(VCC_ID).toggle_count(), 0);
    assert_eq!(c.output_level("V", 2), Some(false));
}

#[test]
fn transitions_follow_propagation_delays() {
    // Toggler -> inverter: the inverter output changes 7 ns (fall) or 10 ns
    // (rise) after each toggler edge.
    let desc = CircuitDesc::new()
        .chip_with_data("T", &TOGGLER, Arc::new(100_000u64))
        .chip("U", &INV)
        .chip("P", &PROBE)
        .connect("T", 1, "U", 1)
        .connect("U", 2, "P", 1);
    let mut c = circuit(&desc);
    c.run(250_000).unwrap();

    let u = c.find_output("U", 2).unwrap();
    let times: Vec<(u64, bool)> = c
        .chip(u)
        .transitions()
        .map(|t| (t.time.as_ps(), t.level))
        .collect();
    assert_eq!(
        times,
        vec![(7_000, false), (110_000, true), (207_000, false)]
    );
}

#[test]
fn overflow_is_an_error() {
    // One toggler edge lands on three loads; the queue holds two.
    let desc = CircuitDesc::new()
        .chip_with_data("T", &TOGGLER, Arc::new(1_000u64))
        .chip("U1", &INV)
        .chip("U2", &INV)
        .chip("U3", &INV)
        .chip("P", &PROBE)
        .connect("T", 1, "U1", 1)
        .connect("T", 1, "U2", 1)
        .connect("T", 1, "U3", 1)
        .connect("U1", 2, "P", 1)
        .connect("U2", 2, "P", 1)
        .connect("U3", 2, "P", 1);
    let mut settings = SimSettings::default();
    settings.scheduler.queue_capacity = 2;
    let err = Circuit::new(&desc, &settings, &DiagnosticSink::new()).unwrap_err();
    assert!(matches!(err, SimError::QueueOverflow { capacity: 2, .. }));
}

#[test]
fn custom_chip_without_data_fails() {
    let desc = CircuitDesc::new().chip("T", &TOGGLER);
    let err = Circuit::new(&desc, &SimSettings::default(), &DiagnosticSink::new()).unwrap_err();
    assert!(matches!(err, SimError::CustomLogic { .. }));
    assert!(err.to_string().contains("missing toggle period"));
}

#[test]
fn batch_simulate_reports_counters() {
    let summary = simulate(
        &ring_oscillator(),
        &SimSettings::default(),
        1_000_000,
        &DiagnosticSink::new(),
    )
    .unwrap();
    assert_eq!(summary.final_time, SimTime::from_us(1));
    assert_eq!(summary.chips, 9);
    assert!(summary.run.evaluations > 0);
    assert_eq!(summary.build.chips_removed, 0);
}

//! Settings types deserialized from `dice.toml`.

use serde::{Deserialize, Serialize};

/// The top-level simulator settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimSettings {
    /// Netlist construction policies.
    pub builder: BuilderSettings,
    /// Per-chip timing defaults applied when no hint overrides them.
    pub chip_defaults: ChipDefaults,
    /// Global event queue settings.
    pub scheduler: SchedulerSettings,
    /// State trace recording settings.
    pub recorder: RecorderSettings,
    /// Run loop settings for the CLI.
    pub run: RunSettings,
}

/// What to do with an input pin nothing drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieOffPolicy {
    /// Tie to GND and emit a warning.
    #[default]
    Warn,
    /// Tie to GND and emit an error diagnostic.
    Error,
    /// Tie to GND without a diagnostic.
    Silent,
}

/// Netlist construction policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderSettings {
    /// Maximum number of loads a single output may drive.
    pub fanout_limit: usize,
    /// Instance names exempt from the fan-out ceiling.
    pub fanout_exempt: Vec<String>,
    /// Handling of undriven input pins.
    pub tie_off: TieOffPolicy,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            fanout_limit: 64,
            fanout_exempt: vec!["_VCC".to_string(), "_GND".to_string()],
            tie_off: TieOffPolicy::Warn,
        }
    }
}

/// Per-chip timing defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChipDefaults {
    /// Depth of each chip's transition history.
    pub queue_capacity: usize,
    /// Divisor of the minimum delay that gives the skew-coalescing window.
    pub subcycle_resolution: u64,
}

impl Default for ChipDefaults {
    fn default() -> Self {
        Self {
            queue_capacity: 128,
            subcycle_resolution: 64,
        }
    }
}

/// Global event queue settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerSettings {
    /// Maximum number of queued events before the run fails.
    pub queue_capacity: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 1 << 20,
        }
    }
}

/// When the recorder samples chip outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SampleMode {
    /// After every drained event.
    #[default]
    Tick,
    /// Whenever the video frame counter changes.
    FrameEdge,
}

/// State trace recording settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecorderSettings {
    /// Sampling mode.
    pub mode: SampleMode,
    /// Gzip the trace file.
    pub compress: bool,
}

/// Run loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSettings {
    /// Simulated time per `run()` call, e.g. `"2500us"`.
    pub slice: String,
    /// Pace the simulation against the wall clock.
    pub throttle: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            slice: "2500us".to_string(),
            throttle: true,
        }
    }
}

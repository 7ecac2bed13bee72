//! Settings file loading and validation.

use crate::duration::parse_duration_ps;
use crate::error::ConfigError;
use crate::types::SimSettings;
use std::path::Path;

/// Name of the settings file looked up in a project directory.
pub const CONFIG_FILE_NAME: &str = "dice.toml";

/// Loads and validates `<dir>/dice.toml`.
///
/// A missing file is not an error: the defaults are returned instead.
pub fn load_config(dir: &Path) -> Result<SimSettings, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(SimSettings::default());
    }
    let content = std::fs::read_to_string(&path)?;
    load_config_from_str(&content)
}

/// Parses and validates settings from a TOML string.
pub fn load_config_from_str(content: &str) -> Result<SimSettings, ConfigError> {
    let settings: SimSettings =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_settings(&settings)?;
    Ok(settings)
}

fn validate_settings(settings: &SimSettings) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if settings.builder.fanout_limit == 0 {
        return invalid("builder.fanout_limit must be non-zero");
    }
    if settings.chip_defaults.queue_capacity == 0 {
        return invalid("chip_defaults.queue_capacity must be non-zero");
    }
    if settings.chip_defaults.subcycle_resolution == 0 {
        return invalid("chip_defaults.subcycle_resolution must be non-zero");
    }
    if settings.scheduler.queue_capacity == 0 {
        return invalid("scheduler.queue_capacity must be non-zero");
    }
    if parse_duration_ps(&settings.run.slice)? == 0 {
        return invalid("run.slice must be longer than zero");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SampleMode, TieOffPolicy};

    #[test]
    fn empty_file_gives_defaults() {
        let settings = load_config_from_str("").unwrap();
        assert_eq!(settings, SimSettings::default());
        assert_eq!(settings.builder.fanout_limit, 64);
        assert_eq!(settings.builder.fanout_exempt, vec!["_VCC", "_GND"]);
        assert_eq!(settings.chip_defaults.queue_capacity, 128);
        assert_eq!(settings.chip_defaults.subcycle_resolution, 64);
        assert!(settings.run.throttle);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[builder]
fanout_limit = 32
fanout_exempt = ["_VCC", "_GND", "CLK"]
tie_off = "error"

[chip_defaults]
queue_capacity = 16
subcycle_resolution = 8

[scheduler]
queue_capacity = 4096

[recorder]
mode = "frame-edge"
compress = true

[run]
slice = "1ms"
throttle = false
"#;
        let s = load_config_from_str(toml).unwrap();
        assert_eq!(s.builder.fanout_limit, 32);
        assert_eq!(s.builder.fanout_exempt.len(), 3);
        assert_eq!(s.builder.tie_off, TieOffPolicy::Error);
        assert_eq!(s.chip_defaults.subcycle_resolution, 8);
        assert_eq!(s.scheduler.queue_capacity, 4096);
        assert_eq!(s.recorder.mode, SampleMode::FrameEdge);
        assert!(s.recorder.compress);
        assert_eq!(s.run.slice, "1ms");
        assert!(!s.run.throttle);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let s = load_config_from_str("[builder]\ntie_off = \"silent\"\n").unwrap();
        assert_eq!(s.builder.tie_off, TieOffPolicy::Silent);
        assert_eq!(s.builder.fanout_limit, 64);
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = load_config_from_str("[scheduler]\nqueue_capacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn rejects_bad_slice() {
        let err = load_config_from_str("[run]\nslice = \"soon\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration { .. }));
        let err = load_config_from_str("[run]\nslice = \"0us\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn rejects_unknown_policy_and_keys() {
        assert!(matches!(
            load_config_from_str("[builder]\ntie_off = \"ignore\"\n"),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            load_config_from_str("[builder]\nfanout = 3\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config(dir.path()).unwrap(), SimSettings::default());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[recorder]\ncompress = true\n",
        )
        .unwrap();
        assert!(load_config(dir.path()).unwrap().recorder.compress);
    }
}

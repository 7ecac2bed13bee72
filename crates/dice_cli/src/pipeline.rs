//! Shared plumbing for the commands: settings lookup, durations and
//! diagnostic output.

use std::error::Error;
use std::path::Path;

use dice_config::{load_config, load_config_from_str, parse_duration_ps, SimSettings};
use dice_diagnostics::{DiagnosticRenderer, DiagnosticSink, JsonRenderer, TerminalRenderer};

use crate::{GlobalArgs, ReportFormat};

/// Loads the settings named by `--config`, or `dice.toml` in the working directory.
///
/// `--config` may point at the file itself or at the directory holding it.
pub fn resolve_settings(global: &GlobalArgs) -> Result<SimSettings, Box<dyn Error>> {
    let settings = match &global.config {
        Some(path) => {
            let path = Path::new(path);
            if path.is_dir() {
                load_config(path)?
            } else {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| format!("cannot read '{}': {e}", path.display()))?;
                load_config_from_str(&content)?
            }
        }
        None => load_config(&std::env::current_dir()?)?,
    };
    Ok(settings)
}

/// Parses a duration such as `"250us"` into picoseconds.
pub fn parse_duration(s: &str) -> Result<u64, Box<dyn Error>> {
    Ok(parse_duration_ps(s)?)
}

/// Writes the collected diagnostics and returns how many were errors.
///
/// Terminal output goes to stderr and is skipped when `quiet` unless it is an
/// error. JSON lines go to stdout.
pub fn render_diagnostics(
    sink: &DiagnosticSink,
    format: ReportFormat,
    color: bool,
    quiet: bool,
) -> usize {
    let diags = sink.diagnostics();
    match format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(color);
            for diag in diags.iter().filter(|d| !quiet || d.severity.is_error()) {
                eprint!("{}", renderer.render(diag));
            }
        }
        ReportFormat::Json => {
            let renderer = JsonRenderer;
            for diag in &diags {
                print!("{}", renderer.render(diag));
            }
        }
    }
    sink.error_count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dice_config::TieOffPolicy;

    fn global(config: Option<String>) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config,
        }
    }

    #[test]
    fn config_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.toml");
        std::fs::write(&path, "[builder]\ntie_off = \"silent\"\n").unwrap();
        let settings = resolve_settings(&global(Some(path.display().to_string()))).unwrap();
        assert_eq!(settings.builder.tie_off, TieOffPolicy::Silent);
    }

    #[test]
    fn config_directory_without_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = resolve_settings(&global(Some(dir.path().display().to_string()))).unwrap();
        assert_eq!(settings, SimSettings::default());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(resolve_settings(&global(Some(path.display().to_string()))).is_err());
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("2ms").unwrap(), 2_000_000_000);
        assert!(parse_duration("fast").is_err());
    }
}

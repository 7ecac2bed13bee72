//! Diagnostic rendering for terminal and machine-readable output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Formats a diagnostic into a string for some output target.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// ```text
/// warning[W102]: input pin 3 of `U4` has multiple drivers
///   --> U4.3
///    = note: previous driver kept
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, severity: Severity, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        let ansi = match severity {
            Severity::Error => "1;31",
            Severity::Warning => "1;33",
            Severity::Note => "1;36",
            Severity::Help => "1;32",
        };
        format!("\x1b[{ansi}m{text}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = String::new();

        let head = format!("{}[{}]", diag.severity, diag.code);
        out.push_str(&format!(
            "{}: {}\n",
            self.paint(diag.severity, &head),
            diag.message
        ));

        if let Some(subject) = &diag.subject {
            out.push_str(&format!("  --> {subject}\n"));
        }
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }

        out
    }
}

/// Renders each diagnostic as one line of JSON.
///
/// Suited to piping build diagnostics into other tools; the field names are
/// those of [`Diagnostic`].
pub struct JsonRenderer;

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut line = serde_json::to_string(diag).unwrap_or_else(|_| "{}".to_string());
        line.push('\n');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};

    #[test]
    fn render_warning_with_subject_and_notes() {
        let code = DiagnosticCode::new(Category::Warning, 103);
        let diag = Diagnostic::warning(code, "unconnected input pin")
            .with_subject("U9.2")
            .with_note("tied to GND")
            .with_help("connect the pin explicitly");

        let out = TerminalRenderer::new(false).render(&diag);
        assert!(out.starts_with("warning[W103]: unconnected input pin\n"));
        assert!(out.contains("  --> U9.2\n"));
        assert!(out.contains("= note: tied to GND"));
        assert!(out.contains("= help: connect the pin explicitly"));
    }

    #[test]
    fn render_without_subject() {
        let diag = Diagnostic::error(DiagnosticCode::new(Category::Error, 101), "too many loads");
        let out = TerminalRenderer::new(false).render(&diag);
        assert_eq!(out, "error[E101]: too many loads\n");
    }

    #[test]
    fn color_wraps_header_only() {
        let diag = Diagnostic::error(DiagnosticCode::new(Category::Error, 101), "boom");
        let out = TerminalRenderer::new(true).render(&diag);
        assert!(out.starts_with("\x1b[1;31merror[E101]\x1b[0m: boom"));
    }

    #[test]
    fn json_renderer_emits_one_line() {
        let diag = Diagnostic::warning(DiagnosticCode::new(Category::Warning, 101), "bad net")
            .with_subject("U1.3");
        let out = JsonRenderer.render(&diag);
        assert!(out.ends_with('\n'));
        assert_eq!(out.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["severity"], "Warning");
        assert_eq!(value["message"], "bad net");
        assert_eq!(value["subject"], "U1.3");
    }
}

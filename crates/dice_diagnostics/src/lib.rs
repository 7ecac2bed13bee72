//! Netlist diagnostics: codes, severities, accumulation and rendering.
//!
//! Building a circuit reports recoverable problems (unresolvable connections,
//! duplicate drivers, floating inputs) as structured [`Diagnostic`] values
//! collected in a [`DiagnosticSink`] rather than printing them directly. The
//! CLI then renders them with a [`DiagnosticRenderer`].

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;

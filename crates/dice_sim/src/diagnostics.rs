//! Diagnostic codes and constructors for netlist construction.
//!
//! Warnings `W101`-`W103` cover anomalies the builder repairs or ignores.
//! Errors `E101`-`E103` cover anomalies it reports but cannot repair. None of
//! them stops construction.

use dice_diagnostics::{Category, Diagnostic, DiagnosticCode};

/// A connection matched no output/input pin pair.
pub const W101: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 101,
};

/// An input pin was connected to more than one driver.
pub const W102: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 102,
};

/// An undriven input pin was tied to GND.
pub const W103: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 103,
};

/// An output drives more loads than the fan-out ceiling.
pub const E101: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 101,
};

/// A row has more inputs than its input mask or truth table holds.
pub const E102: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 102,
};

/// An undriven input pin under the `error` tie-off policy.
pub const E103: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 103,
};

/// A chip nothing reads was removed.
pub const I101: DiagnosticCode = DiagnosticCode {
    category: Category::Info,
    number: 101,
};

/// Creates a diagnostic for a connection that resolved to nothing.
pub fn warning_invalid_connection(prefix: &str, conn: &str) -> Diagnostic {
    let scope = if prefix.is_empty() { "<root>" } else { prefix };
    Diagnostic::warning(W101, format!("invalid connection `{conn}`"))
        .with_subject(scope)
        .with_note("neither endpoint has a matching output pin feeding the other's input pin")
}

/// Creates a diagnostic for a second driver on an input pin.
pub fn warning_multiple_drivers(instance: &str, pin: u8) -> Diagnostic {
    Diagnostic::warning(W102, format!("attempted multiple connections to input pin {pin}"))
        .with_subject(format!("{instance}.{pin}"))
        .with_note("all drivers stay linked; the first one is recorded as the pin's driver")
}

/// Creates a warning for an undriven input tied to GND.
pub fn warning_unconnected_input(pin_label: &str) -> Diagnostic {
    Diagnostic::warning(W103, "unconnected input pin, connecting to GND").with_subject(pin_label)
}

/// Creates an error for an undriven input under the `error` policy.
pub fn error_unconnected_input(pin_label: &str) -> Diagnostic {
    Diagnostic::error(E103, "unconnected input pin").with_subject(pin_label)
        .with_note("the pin was tied to GND")
        .with_help("connect the pin or set `builder.tie_off` to \"warn\"")
}

/// Creates a diagnostic for an output over the fan-out ceiling.
pub fn error_fanout_exceeded(output_label: &str, loads: usize, limit: usize) -> Diagnostic {
    Diagnostic::error(E101, format!("maximum output connection limit reached ({loads} > {limit})"))
        .with_subject(output_label)
        .with_help("buffer the signal or raise `builder.fanout_limit`")
}

/// Creates a diagnostic for a row with too many inputs.
pub fn error_row_too_wide(output_label: &str, inputs: usize, max: usize) -> Diagnostic {
    Diagnostic::error(E102, format!("row has {inputs} inputs (max {max})"))
        .with_subject(output_label)
        .with_note("the row was not instantiated")
}

/// Creates a note for a chip removed because nothing reads its output.
pub fn note_removed_chip(output_label: &str) -> Diagnostic {
    Diagnostic::note(I101, "removing unused chip").with_subject(output_label)
}

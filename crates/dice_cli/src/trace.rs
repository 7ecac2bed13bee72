//! `dice trace`: inspect state dumps written by `dice run --dump-state`.

use std::error::Error;
use std::path::Path;

use dice_sim::{diff_traces, TraceDiff, TraceDump};

use crate::{GlobalArgs, TraceCommand};

/// Runs a `dice trace` subcommand.
///
/// `diff` exits with 1 when the dumps differ; everything else exits with 0.
pub fn run(cmd: &TraceCommand, _global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    match cmd {
        TraceCommand::Hash { dir } => {
            let dump = TraceDump::open(Path::new(dir))?;
            println!("{}", dump.hash()?);
            Ok(0)
        }
        TraceCommand::Diff { left, right } => {
            let left = TraceDump::open(Path::new(left))?;
            let right = TraceDump::open(Path::new(right))?;
            let diff = diff_traces(&left, &right)?;
            println!("{}", describe_diff(&diff, left.labels()));
            Ok(if matches!(diff, TraceDiff::Identical { .. }) { 0 } else { 1 })
        }
        TraceCommand::Show { dir, limit } => {
            let dump = TraceDump::open(Path::new(dir))?;
            for (i, label) in dump.labels().iter().enumerate() {
                println!("# {i:>4} {label}");
            }
            for row in dump.rows()?.take(*limit) {
                let row = row?;
                let bits: String = (0..dump.chip_count())
                    .map(|i| if row.output(i) { '1' } else { '0' })
                    .collect();
                println!("{:>16} {bits}", row.time.as_ps());
            }
            Ok(0)
        }
    }
}

/// One-paragraph report of a comparison.
fn describe_diff(diff: &TraceDiff, labels: &[String]) -> String {
    match diff {
        TraceDiff::Identical { rows } => format!("identical ({rows} records)"),
        TraceDiff::Diverged(d) => {
            let chips: Vec<&str> = d
                .chips
                .iter()
                .map(|&i| labels.get(i).map_or("?", String::as_str))
                .collect();
            format!(
                "diverged at record {} (left {}, right {}): {}",
                d.record,
                d.left_time,
                d.right_time,
                chips.join(", ")
            )
        }
        TraceDiff::LengthMismatch {
            common_rows,
            left_rows,
            right_rows,
        } => format!(
            "first {common_rows} records match; left has {left_rows}, right has {right_rows}"
        ),
    }
}

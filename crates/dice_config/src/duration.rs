//! Duration strings in simulated picoseconds.

use crate::error::ConfigError;

/// Picoseconds per nanosecond.
pub const PS_PER_NS: u64 = 1_000;
/// Picoseconds per microsecond.
pub const PS_PER_US: u64 = 1_000_000;
/// Picoseconds per millisecond.
pub const PS_PER_MS: u64 = 1_000_000_000;
/// Picoseconds per second.
pub const PS_PER_S: u64 = 1_000_000_000_000;

/// Parses a duration such as `"100ns"`, `"2500us"` or `"1.5ms"` into picoseconds.
///
/// A unit is mandatory. Fractional values are accepted and rounded to the
/// nearest picosecond.
pub fn parse_duration_ps(s: &str) -> Result<u64, ConfigError> {
    let s = s.trim();
    let fail = |reason: &str| ConfigError::InvalidDuration {
        input: s.to_string(),
        reason: reason.to_string(),
    };
    if s.is_empty() {
        return Err(fail("empty duration"));
    }

    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    if split == 0 {
        return Err(fail("no numeric value"));
    }
    let (number, unit) = s.split_at(split);

    let scale = match unit.trim() {
        "ps" => 1,
        "ns" => PS_PER_NS,
        "us" => PS_PER_US,
        "ms" => PS_PER_MS,
        "s" => PS_PER_S,
        "" => return Err(fail("missing unit (use ps, ns, us, ms, or s)")),
        _ => return Err(fail("unknown unit (use ps, ns, us, ms, or s)")),
    };

    if let Ok(whole) = number.parse::<u64>() {
        return whole.checked_mul(scale).ok_or_else(|| fail("out of range"));
    }
    let value: f64 = number.parse().map_err(|_| fail("invalid number"))?;
    let ps = (value * scale as f64).round();
    if !ps.is_finite() || ps >= u64::MAX as f64 {
        return Err(fail("out of range"));
    }
    Ok(ps as u64)
}

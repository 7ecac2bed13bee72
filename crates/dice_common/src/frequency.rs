//! Clock frequencies with unit parsing and picosecond period conversion.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const PS_PER_SECOND: f64 = 1e12;

/// A clock frequency stored in Hertz.
///
/// Parses strings like `"14.318MHz"`, `"7.16KHz"` or `"60Hz"`; a bare number
/// is taken as Hz. Oscillator chips convert it to a half period in
/// picoseconds, the unit of simulated time.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frequency(f64);

impl Frequency {
    /// Creates a frequency from a value in Hertz.
    pub fn new(hz: f64) -> Self {
        Self(hz)
    }

    /// Returns the frequency in Hertz.
    pub fn hz(&self) -> f64 {
        self.0
    }

    /// Returns the frequency in megahertz.
    pub fn mhz(&self) -> f64 {
        self.0 / 1_000_000.0
    }

    /// Full period in picoseconds, rounded to the nearest picosecond.
    ///
    /// Returns `None` for non-positive or non-finite frequencies, and for
    /// frequencies so high the period rounds to zero.
    pub fn period_ps(&self) -> Option<u64> {
        if !self.0.is_finite() || self.0 <= 0.0 {
            return None;
        }
        let ps = (PS_PER_SECOND / self.0).round();
        (ps >= 1.0 && ps < u64::MAX as f64).then_some(ps as u64)
    }

    /// Half period in picoseconds, i.e. the time between two output edges.
    pub fn half_period_ps(&self) -> Option<u64> {
        if !self.0.is_finite() || self.0 <= 0.0 {
            return None;
        }
        let ps = (PS_PER_SECOND / (2.0 * self.0)).round();
        (ps >= 1.0 && ps < u64::MAX as f64).then_some(ps as u64)
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({self})")
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hz = self.0;
        if hz >= 1_000_000.0 {
            write!(f, "{}MHz", hz / 1_000_000.0)
        } else if hz >= 1_000.0 {
            write!(f, "{}KHz", hz / 1_000.0)
        } else {
            write!(f, "{hz}Hz")
        }
    }
}

/// Error returned when a frequency string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFrequencyError {
    /// The input string that failed to parse.
    pub input: String,
}

impl fmt::Display for ParseFrequencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid frequency: '{}'", self.input)
    }
}

impl std::error::Error for ParseFrequencyError {}

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseFrequencyError {
            input: s.to_string(),
        };

        let lower = s.to_ascii_lowercase();
        let (num, scale) = if let Some(num) = lower.strip_suffix("mhz") {
            (num, 1_000_000.0)
        } else if let Some(num) = lower.strip_suffix("khz") {
            (num, 1_000.0)
        } else if let Some(num) = lower.strip_suffix("hz") {
            (num, 1.0)
        } else {
            (lower.as_str(), 1.0)
        };

        let val: f64 = num.trim().parse().map_err(|_| err())?;
        if !val.is_finite() || val <= 0.0 {
            return Err(err());
        }
        Ok(Frequency(val * scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mhz() {
        let f: Frequency = "14.318MHz".parse().unwrap();
        assert!((f.hz() - 14_318_000.0).abs() < 1e-3);
    }

    #[test]
    fn parse_khz_and_hz() {
        assert_eq!("100KHz".parse::<Frequency>().unwrap().hz(), 100_000.0);
        assert_eq!("60Hz".parse::<Frequency>().unwrap().hz(), 60.0);
    }

    #[test]
    fn parse_bare_number() {
        let f: Frequency = "1000000".parse().unwrap();
        assert_eq!(f.mhz(), 1.0);
    }

    #[test]
    fn parse_rejects_garbage_and_zero() {
        assert!("fast".parse::<Frequency>().is_err());
        assert!("0Hz".parse::<Frequency>().is_err());
        assert!("-5MHz".parse::<Frequency>().is_err());
    }

    #[test]
    fn periods_in_picoseconds() {
        let f = Frequency::new(1_000_000.0);
        assert_eq!(f.period_ps(), Some(1_000_000));
        assert_eq!(f.half_period_ps(), Some(500_000));
    }

    #[test]
    fn degenerate_periods() {
        assert_eq!(Frequency::new(0.0).period_ps(), None);
        assert_eq!(Frequency::new(f64::NAN).half_period_ps(), None);
        assert_eq!(Frequency::new(1e15).period_ps(), None);
    }

    #[test]
    fn display_selects_best_unit() {
        assert_eq!(Frequency::new(50_000_000.0).to_string(), "50MHz");
        assert_eq!(Frequency::new(44_100.0).to_string(), "44.1KHz");
        assert_eq!(Frequency::new(500.0).to_string(), "500Hz");
    }
}

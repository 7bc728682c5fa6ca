//! Poll frequency of a pipeline.
//!
//! Accepts the compact duration notation operators already write in the YAML
//! (`30m`, `1h30m`, `1.5h`, `250ms`). A bare `0`, an empty string, or an absent
//! key all mean "run once and stop".

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

const NANOS_PER_MICRO: f64 = 1_000.0;
const NANOS_PER_MILLI: f64 = 1_000_000.0;
const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Interval between two poll cycles. Zero means single shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Frequency(pub Duration);

impl Frequency {
    pub const ZERO: Frequency = Frequency(Duration::ZERO);

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// `true` when the pipeline should perform exactly one cycle.
    pub fn is_single_shot(&self) -> bool {
        self.0.is_zero()
    }

    /// Parse a duration string such as `1h30m` or `250ms`.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::Duration {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut rest = input.trim();
        if rest.is_empty() || rest == "0" {
            return Ok(Self::ZERO);
        }
        if let Some(stripped) = rest.strip_prefix('+') {
            rest = stripped;
        } else if rest.starts_with('-') {
            return Err(invalid("negative durations are not allowed"));
        }
        if rest == "0" {
            return Ok(Self::ZERO);
        }

        let mut total_nanos = 0f64;
        while !rest.is_empty() {
            let number_len = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .unwrap_or(rest.len());
            let (number, tail) = rest.split_at(number_len);
            if number.is_empty() || number == "." {
                return Err(invalid("expected a number"));
            }
            let value: f64 = number.parse().map_err(|_| invalid("malformed number"))?;

            let unit_len = tail
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(tail.len());
            let (unit, tail) = tail.split_at(unit_len);
            let scale = match unit {
                "ns" => 1.0,
                "us" | "µs" | "μs" => NANOS_PER_MICRO,
                "ms" => NANOS_PER_MILLI,
                "s" => NANOS_PER_SEC,
                "m" => 60.0 * NANOS_PER_SEC,
                "h" => 60.0 * 60.0 * NANOS_PER_SEC,
                "" => return Err(invalid("missing unit")),
                _ => return Err(invalid("unknown unit")),
            };

            total_nanos += value * scale;
            rest = tail;
        }

        if !total_nanos.is_finite() || total_nanos >= u64::MAX as f64 {
            return Err(invalid("duration overflows"));
        }
        Ok(Self(Duration::from_nanos(total_nanos.round() as u64)))
    }
}

impl From<Duration> for Frequency {
    fn from(d: Duration) -> Self {
        Self(d)
    }
}

impl FromStr for Frequency {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.0;
        if d.is_zero() {
            return write!(f, "0s");
        }
        if d.subsec_nanos() != 0 && d.as_secs() == 0 {
            if d.subsec_nanos() % 1_000_000 == 0 {
                return write!(f, "{}ms", d.subsec_millis());
            }
            return write!(f, "{}ns", d.subsec_nanos());
        }

        let secs = d.as_secs();
        let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        let mut out = String::new();
        if h > 0 {
            out.push_str(&format!("{h}h"));
        }
        if m > 0 {
            out.push_str(&format!("{m}m"));
        }
        if s > 0 || d.subsec_nanos() != 0 {
            if d.subsec_millis() != 0 {
                out.push_str(&format!("{s}.{:03}s", d.subsec_millis()));
            } else {
                out.push_str(&format!("{s}s"));
            }
        }
        f.write_str(&out)
    }
}

impl Serialize for Frequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct FrequencyVisitor;

impl<'de> Visitor<'de> for FrequencyVisitor {
    type Value = Frequency;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a duration string such as \"30m\" or 0")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Frequency, E> {
        Frequency::parse(v).map_err(E::custom)
    }

    // YAML reads `frequency: 0` as an integer; any other bare number lacks a unit.
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Frequency, E> {
        Frequency::parse(&v.to_string()).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Frequency, E> {
        Frequency::parse(&v.to_string()).map_err(E::custom)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Frequency, E> {
        Ok(Frequency::ZERO)
    }

    fn visit_none<E: de::Error>(self) -> Result<Frequency, E> {
        Ok(Frequency::ZERO)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Frequency, D::Error> {
        deserializer.deserialize_any(FrequencyVisitor)
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FrequencyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_forms_are_single_shot() {
        for input in ["", "0", "+0", "0s", "0h0m"] {
            let freq = Frequency::parse(input).expect(input);
            assert!(freq.is_single_shot(), "{input:?} should be single shot");
        }
    }

    #[test]
    fn compound_duration_sums_components() {
        let freq = Frequency::parse("1h30m15s").expect("parse");
        assert_eq!(freq.as_duration(), Duration::from_secs(5415));
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(Frequency(Duration::from_secs(1800)).to_string(), "30m");
        assert_eq!(Frequency(Duration::from_secs(5415)).to_string(), "1h30m15s");
        assert_eq!(Frequency(Duration::from_millis(250)).to_string(), "250ms");
        assert_eq!(Frequency::ZERO.to_string(), "0s");
    }

    #[test]
    fn yaml_integer_zero_is_accepted() {
        let freq: Frequency = serde_yaml::from_str("0").expect("deserialize");
        assert_eq!(freq, Frequency::ZERO);
    }

    #[test]
    fn yaml_bare_integer_without_unit_is_rejected() {
        let err = serde_yaml::from_str::<Frequency>("30").unwrap_err();
        assert!(err.to_string().contains("missing unit"), "got: {err}");
    }
}

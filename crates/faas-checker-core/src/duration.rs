//! Duration strings as used by OpenFaaS components
//!
//! Components read timeouts such as `30s`, `1m30s` or `1.5h` from their
//! environment. This module parses that syntax with nanosecond resolution
//! and prints durations back in the same canonical form (`1m0s`, `1.5s`).

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const NANOSECOND: u64 = 1;
const MICROSECOND: u64 = 1_000 * NANOSECOND;
const MILLISECOND: u64 = 1_000 * MICROSECOND;
const SECOND: u64 = 1_000 * MILLISECOND;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;

/// Largest magnitude a duration may reach before the sign is applied
const MAX_MAGNITUDE: u64 = 1 << 63;

/// Errors produced while parsing a duration string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDurationError {
    #[error("invalid duration \"{0}\"")]
    Invalid(String),

    #[error("missing unit in duration \"{0}\"")]
    MissingUnit(String),

    #[error("unknown unit \"{unit}\" in duration \"{input}\"")]
    UnknownUnit { unit: String, input: String },

    #[error("duration \"{0}\" is out of range")]
    Overflow(String),
}

/// A signed span of time with nanosecond resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(i64);

impl Duration {
    pub const ZERO: Duration = Duration(0);

    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * SECOND as i64)
    }

    pub const fn from_mins(mins: i64) -> Self {
        Self(mins * MINUTE as i64)
    }

    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Duration as a floating point number of minutes
    pub fn minutes(self) -> f64 {
        let minute = MINUTE as i64;
        let whole = self.0 / minute;
        let rest = self.0 % minute;
        whole as f64 + rest as f64 / minute as f64
    }

    /// Parse a duration such as `300ms`, `-1.5h` or `2h45m`
    ///
    /// Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. A bare
    /// `0` is accepted without a unit.
    pub fn parse(input: &str) -> Result<Self, ParseDurationError> {
        let invalid = || ParseDurationError::Invalid(input.to_string());
        let overflow = || ParseDurationError::Overflow(input.to_string());

        let mut rest = input;
        let mut negative = false;
        if let Some(stripped) = rest.strip_prefix('-') {
            negative = true;
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('+') {
            rest = stripped;
        }

        if rest == "0" {
            return Ok(Duration::ZERO);
        }
        if rest.is_empty() {
            return Err(invalid());
        }

        let mut total: u64 = 0;
        while !rest.is_empty() {
            // The next character must be [0-9.]
            if !rest.starts_with(|c: char| c == '.' || c.is_ascii_digit()) {
                return Err(invalid());
            }

            let (whole, after_whole) = leading_int(rest).ok_or_else(invalid)?;
            let has_whole = after_whole.len() != rest.len();
            rest = after_whole;

            let mut fraction = 0u64;
            let mut scale = 1f64;
            let mut has_fraction = false;
            if let Some(after_dot) = rest.strip_prefix('.') {
                let (f, s, after_fraction) = leading_fraction(after_dot);
                has_fraction = after_fraction.len() != after_dot.len();
                fraction = f;
                scale = s;
                rest = after_fraction;
            }

            if !has_whole && !has_fraction {
                return Err(invalid());
            }

            let unit_len = rest
                .find(|c: char| c == '.' || c.is_ascii_digit())
                .unwrap_or(rest.len());
            if unit_len == 0 {
                return Err(ParseDurationError::MissingUnit(input.to_string()));
            }
            let (unit_str, after_unit) = rest.split_at(unit_len);
            rest = after_unit;

            let unit = unit_nanos(unit_str).ok_or_else(|| ParseDurationError::UnknownUnit {
                unit: unit_str.to_string(),
                input: input.to_string(),
            })?;

            if whole > MAX_MAGNITUDE / unit {
                return Err(overflow());
            }
            let mut value = whole * unit;
            if fraction > 0 {
                // f64 keeps fractions of hours nanosecond accurate
                value += (fraction as f64 * (unit as f64 / scale)) as u64;
                if value > MAX_MAGNITUDE {
                    return Err(overflow());
                }
            }

            total = total.checked_add(value).ok_or_else(overflow)?;
            if total > MAX_MAGNITUDE {
                return Err(overflow());
            }
        }

        if negative {
            // -(1 << 63) is the only magnitude that does not fit positively
            return Ok(Duration((total as i64).wrapping_neg()));
        }
        if total > MAX_MAGNITUDE - 1 {
            return Err(overflow());
        }
        Ok(Duration(total as i64))
    }
}

impl FromStr for Duration {
    type Err = ParseDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Duration::parse(s)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut magnitude = self.0.unsigned_abs();
        let sign = if self.0 < 0 { "-" } else { "" };

        if magnitude == 0 {
            return write!(f, "0s");
        }

        if magnitude < SECOND {
            let (precision, unit) = if magnitude < MICROSECOND {
                (0, "ns")
            } else if magnitude < MILLISECOND {
                (3, "µs")
            } else {
                (6, "ms")
            };
            let (fraction, whole) = format_fraction(magnitude, precision);
            return write!(f, "{sign}{whole}{fraction}{unit}");
        }

        let (fraction, whole_secs) = format_fraction(magnitude, 9);
        magnitude = whole_secs;
        let secs = magnitude % 60;
        magnitude /= 60;
        if magnitude == 0 {
            return write!(f, "{sign}{secs}{fraction}s");
        }
        let mins = magnitude % 60;
        let hours = magnitude / 60;
        if hours == 0 {
            write!(f, "{sign}{mins}m{secs}{fraction}s")
        } else {
            write!(f, "{sign}{hours}h{mins}m{secs}{fraction}s")
        }
    }
}

fn unit_nanos(unit: &str) -> Option<u64> {
    match unit {
        "ns" => Some(NANOSECOND),
        // U+00B5 micro sign and U+03BC Greek mu
        "us" | "µs" | "μs" => Some(MICROSECOND),
        "ms" => Some(MILLISECOND),
        "s" => Some(SECOND),
        "m" => Some(MINUTE),
        "h" => Some(HOUR),
        _ => None,
    }
}

/// Consume leading ASCII digits, failing on overflow
fn leading_int(s: &str) -> Option<(u64, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let mut value: u64 = 0;
    for digit in s[..end].bytes() {
        if value > MAX_MAGNITUDE / 10 {
            return None;
        }
        value = value * 10 + u64::from(digit - b'0');
        if value > MAX_MAGNITUDE {
            return None;
        }
    }
    Some((value, &s[end..]))
}

/// Consume fraction digits after a decimal point
///
/// Digits beyond what fits in a u64 are consumed but ignored.
fn leading_fraction(s: &str) -> (u64, f64, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let mut value: u64 = 0;
    let mut scale = 1f64;
    let mut overflowed = false;
    for digit in s[..end].bytes() {
        if overflowed {
            continue;
        }
        if value > (MAX_MAGNITUDE - 1) / 10 {
            overflowed = true;
            continue;
        }
        let next = value * 10 + u64::from(digit - b'0');
        if next > MAX_MAGNITUDE {
            overflowed = true;
            continue;
        }
        value = next;
        scale *= 10.0;
    }
    (value, scale, &s[end..])
}

/// Split off `precision` decimal digits, dropping trailing zeros
///
/// Returns the fraction text (".5", or "" when it is zero) and the
/// remaining integer part.
fn format_fraction(mut value: u64, precision: u32) -> (String, u64) {
    let mut digits = Vec::new();
    let mut significant = false;
    for _ in 0..precision {
        let digit = value % 10;
        significant = significant || digit != 0;
        if significant {
            digits.push(char::from(b'0' + digit as u8));
        }
        value /= 10;
    }
    if digits.is_empty() {
        return (String::new(), value);
    }
    let fraction: String = std::iter::once('.').chain(digits.into_iter().rev()).collect();
    (fraction, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> i64 {
        Duration::parse(s).unwrap().as_nanos()
    }

    #[test]
    fn test_parse_simple_units() {
        assert_eq!(parse("0"), 0);
        assert_eq!(parse("5s"), 5 * SECOND as i64);
        assert_eq!(parse("30s"), 30 * SECOND as i64);
        assert_eq!(parse("478ms"), 478 * MILLISECOND as i64);
        assert_eq!(parse("-5s"), -5 * SECOND as i64);
        assert_eq!(parse("+5s"), 5 * SECOND as i64);
        assert_eq!(parse("2m"), 2 * MINUTE as i64);
        assert_eq!(parse("1h"), HOUR as i64);
        assert_eq!(parse("10ns"), 10);
        assert_eq!(parse("11us"), 11 * MICROSECOND as i64);
        assert_eq!(parse("12µs"), 12 * MICROSECOND as i64);
        assert_eq!(parse("12μs"), 12 * MICROSECOND as i64);
    }

    #[test]
    fn test_parse_fractions_and_compounds() {
        assert_eq!(parse("1.5s"), 1_500 * MILLISECOND as i64);
        assert_eq!(parse("1.004s"), 1_004 * MILLISECOND as i64);
        assert_eq!(parse(".5s"), 500 * MILLISECOND as i64);
        assert_eq!(parse("1.s"), SECOND as i64);
        assert_eq!(parse("1h30m"), (HOUR + 30 * MINUTE) as i64);
        assert_eq!(parse("1m30s"), (MINUTE + 30 * SECOND) as i64);
        assert_eq!(parse("39h9m14.425s"), 140_954_425 * MILLISECOND as i64);
        assert_eq!(parse("0.3333333333333333333h"), 20 * MINUTE as i64);
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        for input in ["", "3", "-", "s", ".", "-.", ".s", "+.s", "1d", "3000000h", "x1s"] {
            assert!(Duration::parse(input).is_err(), "{input:?} should not parse");
        }
        assert_eq!(
            Duration::parse("3"),
            Err(ParseDurationError::MissingUnit("3".to_string()))
        );
        assert!(matches!(
            Duration::parse("1d"),
            Err(ParseDurationError::UnknownUnit { unit, .. }) if unit == "d"
        ));
    }

    #[test]
    fn test_parse_extremes() {
        assert_eq!(parse("9223372036854775807ns"), i64::MAX);
        assert_eq!(parse("-9223372036854775808ns"), i64::MIN);
        assert!(Duration::parse("9223372036854775808ns").is_err());
    }

    #[test]
    fn test_display_canonical_form() {
        let cases = [
            (0, "0s"),
            (1, "1ns"),
            (1_100, "1.1µs"),
            (2_200_000, "2.2ms"),
            (3_300_000_000, "3.3s"),
            (4 * MINUTE as i64 + 5 * SECOND as i64, "4m5s"),
            (MINUTE as i64, "1m0s"),
            (30 * SECOND as i64, "30s"),
            (5 * HOUR as i64 + 6 * MINUTE as i64 + 7_001_000_000, "5h6m7.001s"),
            (-(SECOND as i64), "-1s"),
        ];
        for (nanos, expected) in cases {
            assert_eq!(Duration::from_nanos(nanos).to_string(), expected);
        }
    }

    #[test]
    fn test_minutes() {
        assert_eq!(Duration::from_mins(2).minutes(), 2.0);
        assert_eq!(Duration::from_secs(90).minutes(), 1.5);
        assert_eq!(format!("{:.2}", Duration::parse("2m").unwrap().minutes()), "2.00");
    }

    #[test]
    fn test_ordering() {
        assert!(Duration::parse("60s").unwrap() > Duration::parse("30s").unwrap());
        assert!(Duration::parse("1m").unwrap() == Duration::parse("60s").unwrap());
        assert!(Duration::from_mins(5) > Duration::parse("4m59.9s").unwrap());
    }
}

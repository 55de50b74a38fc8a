//! Parser for Go-style duration strings (`300ms`, `1.5s`, `1m30s`, `2h`).

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedDuration {
    Positive(Duration),
    /// Negative values are syntactically valid but never a usable duration.
    Negative(Duration),
}

const NANOS_PER_UNIT: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60 * 1_000_000_000),
    ("h", 60 * 60 * 1_000_000_000),
];

/// Parse a duration such as `30s` or `1h15m`.
///
/// A bare `0` is accepted; any other number must carry a unit.
pub fn parse_go_duration(input: &str) -> Result<ParsedDuration, String> {
    let mut s = input;
    let negative = match s.as_bytes().first() {
        Some(b'-') => {
            s = &s[1..];
            true
        }
        Some(b'+') => {
            s = &s[1..];
            false
        }
        _ => false,
    };

    if s == "0" {
        return Ok(ParsedDuration::Positive(Duration::ZERO));
    }
    if s.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total: u128 = 0;
    while !s.is_empty() {
        let int_len = s.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, rest) = s.split_at(int_len);
        s = rest;

        let mut frac_part = "";
        if let Some(rest) = s.strip_prefix('.') {
            let frac_len = rest.bytes().take_while(u8::is_ascii_digit).count();
            frac_part = &rest[..frac_len];
            s = &rest[frac_len..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err("expected a number".to_string());
        }

        let unit_len = s
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() || *c == '.')
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        let (unit, rest) = s.split_at(unit_len);
        s = rest;
        if unit.is_empty() {
            return Err("missing unit".to_string());
        }
        let scale = NANOS_PER_UNIT
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| format!("unknown unit {:?}", unit))?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| "number out of range".to_string())?
        };
        let mut nanos = whole
            .checked_mul(scale)
            .ok_or_else(|| "duration out of range".to_string())?;

        if !frac_part.is_empty() {
            // Anything beyond nanosecond precision is truncated.
            let digits = &frac_part[..frac_part.len().min(18)];
            let numerator: u128 = digits
                .parse()
                .map_err(|_| "number out of range".to_string())?;
            let denominator = 10u128.pow(digits.len() as u32);
            nanos += numerator * scale / denominator;
        }

        total = total
            .checked_add(nanos)
            .ok_or_else(|| "duration out of range".to_string())?;
    }

    if total > u64::MAX as u128 {
        return Err("duration out of range".to_string());
    }
    let duration = Duration::from_nanos(total as u64);
    Ok(if negative && !duration.is_zero() {
        ParsedDuration::Negative(duration)
    } else {
        ParsedDuration::Positive(duration)
    })
}

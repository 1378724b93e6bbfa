//! Literal token images to values.
//!
//! Token patterns are case-insensitive, so suffixes and hex digits are
//! lowercased before inspection.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rill_core::{PrimitiveKind, Value};

use crate::diagnostics::SemanticErrorKind;
use crate::options::FALLBACK_DATE_TIME_FORMAT;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
    #[error("constant `{0}` is out of range")]
    Overflow(String),
    #[error("{0}")]
    InvalidFormat(String),
}

impl LiteralError {
    pub fn kind(&self) -> SemanticErrorKind {
        match self {
            Self::Overflow(_) => SemanticErrorKind::ConstantOverflow,
            Self::InvalidFormat(_) => SemanticErrorKind::InvalidFormat,
        }
    }

    /// Detail for `SemanticError::new`.
    pub fn detail(&self) -> &str {
        match self {
            Self::Overflow(image) | Self::InvalidFormat(image) => image,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntSuffix {
    None,
    Unsigned,
    Long,
    UnsignedLong,
}

impl IntSuffix {
    fn is_unsigned(self) -> bool {
        matches!(self, Self::Unsigned | Self::UnsignedLong)
    }
}

fn split_int_suffix(image: &str) -> (&str, IntSuffix) {
    let lower = image.to_ascii_lowercase();
    for (suffix, kind) in [
        ("ul", IntSuffix::UnsignedLong),
        ("lu", IntSuffix::UnsignedLong),
        ("u", IntSuffix::Unsigned),
        ("l", IntSuffix::Long),
    ] {
        if lower.ends_with(suffix) {
            return (&image[..image.len() - suffix.len()], kind);
        }
    }
    (image, IntSuffix::None)
}

/// First kind in the suffix's candidate list that holds `v`.
fn fit_integer(v: u64, suffix: IntSuffix) -> Value {
    let fits_i32 = v <= i32::MAX as u64;
    let fits_u32 = v <= u32::MAX as u64;
    let fits_i64 = v <= i64::MAX as u64;
    match suffix {
        IntSuffix::None if fits_i32 => Value::I32(v as i32),
        IntSuffix::None | IntSuffix::Unsigned if fits_u32 => Value::U32(v as u32),
        IntSuffix::None | IntSuffix::Long if fits_i64 => Value::I64(v as i64),
        _ => Value::U64(v),
    }
}

/// Decimal integer literal. Returns the value and whether a `u` or `ul`
/// suffix was written.
pub fn parse_integer(image: &str, as_double: bool) -> Result<(Value, bool), LiteralError> {
    let (digits, suffix) = split_int_suffix(image);
    if as_double && suffix == IntSuffix::None {
        let v: f64 = digits
            .parse()
            .map_err(|_| LiteralError::InvalidFormat(image.to_string()))?;
        return Ok((Value::F64(v), false));
    }
    let v: u64 = digits
        .parse()
        .map_err(|_| LiteralError::Overflow(image.to_string()))?;
    Ok((fit_integer(v, suffix), suffix.is_unsigned()))
}

/// `0x` literal, same kind order as decimal integers.
pub fn parse_hex(image: &str) -> Result<(Value, bool), LiteralError> {
    let (body, suffix) = split_int_suffix(image);
    let digits = &body[2..];
    let v = u64::from_str_radix(digits, 16).map_err(|_| LiteralError::Overflow(image.to_string()))?;
    Ok((fit_integer(v, suffix), suffix.is_unsigned()))
}

/// Real literal with `d`/`f` suffix or the configured default kind.
pub fn parse_real(
    image: &str,
    decimal_separator: char,
    default_kind: PrimitiveKind,
) -> Result<Value, LiteralError> {
    let lower = image.to_ascii_lowercase();
    let (body, kind) = if let Some(body) = lower.strip_suffix('f') {
        (body, PrimitiveKind::Single)
    } else if let Some(body) = lower.strip_suffix('d') {
        (body, PrimitiveKind::Double)
    } else {
        (lower.as_str(), default_kind)
    };
    let text = body.replace(decimal_separator, ".");
    let invalid = || LiteralError::InvalidFormat(image.to_string());
    let value = match kind {
        PrimitiveKind::Single => {
            let v: f32 = text.parse().map_err(|_| invalid())?;
            if v.is_infinite() {
                return Err(LiteralError::Overflow(image.to_string()));
            }
            Value::F32(v)
        }
        _ => {
            let v: f64 = text.parse().map_err(|_| invalid())?;
            if v.is_infinite() {
                return Err(LiteralError::Overflow(image.to_string()));
            }
            Value::F64(v)
        }
    };
    Ok(value)
}

fn unescape(body: &str) -> Result<String, LiteralError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(e) = chars.next() else {
            return Err(LiteralError::InvalidFormat(
                "unterminated escape sequence".to_string(),
            ));
        };
        match e {
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = (hex.len() == 4)
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .ok_or_else(|| LiteralError::InvalidFormat(format!("invalid escape `\\u{hex}`")))?;
                let decoded = char::from_u32(code).ok_or_else(|| {
                    LiteralError::InvalidFormat(format!("`\\u{hex}` is not a scalar value"))
                })?;
                out.push(decoded);
            }
            other => {
                return Err(LiteralError::InvalidFormat(format!(
                    "unrecognized escape sequence `\\{other}`"
                )));
            }
        }
    }
    Ok(out)
}

fn strip_quotes(image: &str, quote: char) -> &str {
    image
        .strip_prefix(quote)
        .and_then(|s| s.strip_suffix(quote))
        .unwrap_or(image)
}

pub fn parse_string(image: &str) -> Result<Value, LiteralError> {
    Ok(Value::string(unescape(strip_quotes(image, '"'))?))
}

pub fn parse_char(image: &str) -> Result<Value, LiteralError> {
    let text = unescape(strip_quotes(image, '\''))?;
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::Char(c)),
        _ => Err(LiteralError::InvalidFormat(format!(
            "`{image}` is not a single character"
        ))),
    }
}

/// `#...#` date literal: `format` as date-time, then as a date at midnight,
/// then the fallback date-time format.
pub fn parse_date_time(image: &str, format: &str) -> Result<Value, LiteralError> {
    let text = strip_quotes(image, '#').trim();
    NaiveDateTime::parse_from_str(text, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .or_else(|| NaiveDateTime::parse_from_str(text, FALLBACK_DATE_TIME_FORMAT).ok())
        .map(Value::DateTime)
        .ok_or_else(|| LiteralError::InvalidFormat(format!("`{text}` is not a valid date")))
}

/// `##[d.]hh:mm[:ss[.fffffff]]#` time span literal.
pub fn parse_time_span(image: &str) -> Result<Value, LiteralError> {
    let text = image.trim_start_matches('#').trim_end_matches('#');
    let invalid = || LiteralError::InvalidFormat(format!("`{text}` is not a valid time span"));
    let overflow = || LiteralError::Overflow(image.to_string());

    let (head, rest) = text.split_once(':').ok_or_else(invalid)?;
    let (days, hours) = match head.split_once('.') {
        Some((d, h)) => (d, h),
        None => ("0", head),
    };
    let mut parts = rest.splitn(2, ':');
    let minutes = parts.next().ok_or_else(invalid)?;
    let (seconds, fraction) = match parts.next() {
        Some(s) => match s.split_once('.') {
            Some((s, f)) => (s, f),
            None => (s, ""),
        },
        None => ("0", ""),
    };

    let num = |s: &str| s.parse::<i64>().map_err(|_| overflow());
    let (days, hours, minutes, seconds) = (num(days)?, num(hours)?, num(minutes)?, num(seconds)?);
    if hours > 23 || minutes > 59 || seconds > 59 {
        return Err(invalid());
    }
    // Fraction digits are 100ns ticks, left-aligned.
    let ticks = if fraction.is_empty() {
        0
    } else {
        num(&format!("{fraction:0<7}"))?
    };

    let span = TimeDelta::try_days(days)
        .and_then(|d| d.checked_add(&TimeDelta::try_hours(hours)?))
        .and_then(|d| d.checked_add(&TimeDelta::try_minutes(minutes)?))
        .and_then(|d| d.checked_add(&TimeDelta::try_seconds(seconds)?))
        .and_then(|d| d.checked_add(&TimeDelta::nanoseconds(ticks * 100)))
        .ok_or_else(overflow)?;
    Ok(Value::TimeSpan(span))
}

//! Raw cell values as they come out of a spreadsheet.

use serde::{Deserialize, Serialize};

/// A single cell from the source table.
///
/// Spreadsheet hosts hand back typed values (a checkbox is a boolean, a
/// price may be a number); CSV sources only ever produce [`CellValue::Text`]
/// or [`CellValue::Empty`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Returns `true` when the cell carries no usable value.
    ///
    /// Empty cells, empty strings and boolean `false` are blank. Numeric zero
    /// is significant and is never blank, nor is whitespace-only text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Bool(b) => !b,
            CellValue::Number(_) => false,
            CellValue::Text(s) => s.is_empty(),
        }
    }

    /// Renders the cell as display text.
    ///
    /// Whole numbers print without a fractional part (`12345`, not `12345.0`)
    /// so numeric SKUs and barcodes survive the trip.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
        }
    }

    /// Lenient integer read: leading sign and digits after optional
    /// whitespace. Anything unreadable becomes `0`.
    #[must_use]
    pub fn to_int_lenient(&self) -> i64 {
        match self {
            // Truncation toward zero matches reading the integer prefix of the
            // decimal rendering.
            #[allow(clippy::cast_possible_truncation)]
            CellValue::Number(n) if n.is_finite() => n.trunc() as i64,
            CellValue::Text(s) => parse_int_prefix(s).unwrap_or(0),
            _ => 0,
        }
    }

    /// Lenient float read: longest leading decimal prefix. Anything
    /// unreadable becomes `0.0`.
    #[must_use]
    pub fn to_float_lenient(&self) -> f64 {
        match self {
            CellValue::Number(n) if n.is_finite() => *n,
            CellValue::Text(s) => parse_float_prefix(s).unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_owned())
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

/// Byte length of an optional sign followed by ASCII digits at the start of `s`.
fn signed_digits_len(s: &str) -> (usize, usize) {
    let bytes = s.as_bytes();
    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits = bytes[sign..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    (sign, digits)
}

fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = signed_digits_len(s);
    if digits == 0 {
        return None;
    }
    s[..sign + digits].parse::<i64>().ok()
}

fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let (sign, int_digits) = signed_digits_len(s);
    let mut end = sign + int_digits;

    let bytes = s.as_bytes();
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = bytes[end + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    // Optional exponent, only consumed when followed by at least one digit.
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let (exp_sign, exp_digits) = signed_digits_len(&s[end + 1..]);
        if exp_digits > 0 {
            end += 1 + exp_sign + exp_digits;
        }
    }

    s[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

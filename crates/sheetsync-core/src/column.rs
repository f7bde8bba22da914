//! Spreadsheet column letters (`A`, `Z`, `AA`, ...) and zero-based indices.

/// Parses a column letter such as `"Z"` or `"ab"` into a zero-based index.
///
/// Returns `None` for empty input, non-ASCII-letter characters, or values
/// that overflow `usize`.
#[must_use]
pub fn column_index(letters: &str) -> Option<usize> {
    let letters = letters.trim();
    if letters.is_empty() {
        return None;
    }

    let mut index: usize = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as usize) - ('A' as usize) + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index - 1)
}

/// Formats a zero-based column index as its letter form (`0` → `"A"`, `26` → `"AA"`).
#[must_use]
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        // rem < 26, so the cast cannot truncate
        #[allow(clippy::cast_possible_truncation)]
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

//! String operations for sequence data
//!
//! Reverse-complementing of residue buffers, cleanup of numbered
//! residue lines, and the quoting/wrapping rules of flat-file text fields.

use super::{ComputeError, ComputeResult};

/// Reverse-complement a buffer using a per-symbol complement function
///
/// Fails on the first symbol the function cannot complement.
pub fn reverse_complement_with<F>(sequence: &[u8], complement: F) -> ComputeResult<Vec<u8>>
where
    F: Fn(u8) -> Option<u8>,
{
    sequence
        .iter()
        .rev()
        .map(|&symbol| {
            complement(symbol).ok_or_else(|| {
                ComputeError::UnsupportedOperation(format!(
                    "symbol '{}' has no complement",
                    symbol as char
                ))
            })
        })
        .collect()
}

/// Extract residues from a numbered sequence line such as
/// `"       61 gatcctccat atacaacggt"`
///
/// Digits and whitespace are dropped; everything else is kept upper-cased.
pub fn strip_numbered_line(line: &str, residues: &mut Vec<u8>) {
    residues.extend(
        line.bytes()
            .filter(|b| !b.is_ascii_digit() && !b.is_ascii_whitespace())
            .map(|b| b.to_ascii_uppercase()),
    );
}

/// Escape embedded double quotes the flat-file way (`"` becomes `""`)
pub fn escape_quotes(value: &str) -> String {
    value.replace('"', "\"\"")
}

/// Reverse of [`escape_quotes`]
pub fn unescape_quotes(value: &str) -> String {
    value.replace("\"\"", "\"")
}

/// Whether a quoted value that started on an earlier line is closed by `text`
///
/// `text` is everything seen after the opening quote. Doubled quotes are
/// escapes and do not close the value.
pub fn closes_quoted_value(text: &str) -> bool {
    let trailing = text.bytes().rev().take_while(|&b| b == b'"').count();
    trailing % 2 == 1
}

/// Split `text` into lines of at most `width` characters
///
/// Lines break at spaces, so joining the lines with single spaces gives
/// back the text, runs of spaces included: only one space of a run is
/// used as the break. A word longer than `width` overflows its line
/// instead of being cut. When `break_anywhere` is set the text is cut at exactly
/// `width` characters regardless of spaces.
pub fn wrap_text(text: &str, width: usize, break_anywhere: bool) -> ComputeResult<Vec<String>> {
    if width == 0 {
        return Err(ComputeError::InvalidInput(
            "wrap width must be positive".to_string(),
        ));
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Ok(vec![String::new()]);
    }

    if break_anywhere {
        return Ok(chars.chunks(width).map(|c| c.iter().collect()).collect());
    }

    let mut lines = Vec::new();
    let mut start = 0;
    while chars.len() - start > width {
        let window = &chars[start..=start + width];
        // A break consumes exactly one space, never the first char of a line
        let split = match window.iter().rposition(|&c| c == ' ').filter(|&s| s > 0) {
            Some(space) => space,
            None => match chars[start + 1..].iter().position(|&c| c == ' ') {
                Some(space) => space + 1,
                None => break,
            },
        };
        lines.push(chars[start..start + split].iter().collect());
        start += split + 1;
    }
    lines.push(chars[start..].iter().collect());

    Ok(lines)
}

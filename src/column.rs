//! Column naming conventions for gradebook exports.
//!
//! A scored column carries its maximum point value in an angle-bracketed
//! metadata token, the way Brightspace names grade items:
//!
//! ```text
//! Quiz 1 Points Grade <Numeric MaxPoints:10 Weight:5 Category:Quizzes>
//! ```
//!
//! The token opens at `<Numeric`, closes at the next `>`, and must contain a
//! whitespace-delimited `MaxPoints:<number>` pair. Other `key:value` pairs are
//! ignored. No other delimiter pair is recognised.

use thiserror::Error;

const TOKEN_OPEN: &str = "<Numeric";
const TOKEN_CLOSE: char = '>';
const MAX_POINTS_KEY: &str = "MaxPoints:";

#[derive(Error, Debug, PartialEq)]
pub enum TokenError {
    #[error("no `<Numeric ...>` metadata token")]
    Missing,
    #[error("metadata token has no `MaxPoints:` entry")]
    NoMaxPoints,
    #[error("`MaxPoints:{0}` is not a positive number")]
    InvalidMaxPoints(String),
}

/// Byte range of the metadata token, closing `>` included.
fn token_span(column: &str) -> Option<(usize, usize)> {
    let start = column.find(TOKEN_OPEN)?;
    let close = start + column[start..].find(TOKEN_CLOSE)?;
    Some((start, close + TOKEN_CLOSE.len_utf8()))
}

/// Canonical identity of a column: trimmed, BOM-free, and cut right after the
/// metadata token when there is one.
pub fn normalize(column: &str) -> String {
    let trimmed = column.trim_start_matches('\u{feff}').trim();
    match token_span(trimmed) {
        Some((_, end)) => trimmed[..end].to_string(),
        None => trimmed.to_string(),
    }
}

/// Human-facing name of a column: the text in front of its metadata token.
pub fn display_label(column: &str) -> &str {
    let trimmed = column.trim();
    match token_span(trimmed) {
        Some((start, _)) => trimmed[..start].trim_end(),
        None => trimmed,
    }
}

/// Extracts the declared maximum points from a column's metadata token.
pub fn max_points(column: &str) -> Result<f64, TokenError> {
    let (start, end) = token_span(column).ok_or(TokenError::Missing)?;
    let body = &column[start + TOKEN_OPEN.len()..end - TOKEN_CLOSE.len_utf8()];

    let raw = body
        .split_whitespace()
        .find_map(|pair| pair.strip_prefix(MAX_POINTS_KEY))
        .ok_or(TokenError::NoMaxPoints)?;

    match raw.parse::<f64>() {
        Ok(points) if points.is_finite() && points > 0.0 => Ok(points),
        _ => Err(TokenError::InvalidMaxPoints(raw.to_string())),
    }
}

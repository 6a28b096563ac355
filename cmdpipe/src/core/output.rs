//! Conversions from captured output bytes to caller-facing shapes.
//!
//! Text conversions decode UTF-8 lossily; invalid sequences become U+FFFD.

use crate::errors::{CommandError, Result};
use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static NEWLINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n+").expect("newline pattern is valid"));

#[allow(clippy::expect_used)]
static NUL_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x00+").expect("NUL pattern is valid"));

/// Decodes the bytes as UTF-8 text.
#[must_use]
pub fn to_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Decodes the bytes and trims surrounding whitespace.
#[must_use]
pub fn to_trimmed(bytes: &[u8]) -> String {
    to_text(bytes).trim().to_string()
}

/// Splits the output into lines on runs of newlines.
///
/// A leading newline yields an empty first line; trailing separators do not
/// produce empty lines and empty output yields no lines.
#[must_use]
pub fn to_lines(bytes: &[u8]) -> Vec<String> {
    split_on(&NEWLINE_RUNS, &to_text(bytes))
}

/// Splits the output into fields on runs of NUL bytes, as produced by
/// `find -print0` and friends.
#[must_use]
pub fn to_nul_separated(bytes: &[u8]) -> Vec<String> {
    split_on(&NUL_RUNS, &to_text(bytes))
}

/// Parses the trimmed output as a signed 64-bit integer.
pub fn to_long(bytes: &[u8]) -> Result<i64> {
    let text = to_trimmed(bytes);
    text.parse::<i64>()
        .map_err(|source| CommandError::Parse { text, source })
}

fn split_on(separator: &Regex, text: &str) -> Vec<String> {
    let mut parts: Vec<String> = separator.split(text).map(str::to_string).collect();
    while parts.last().is_some_and(String::is_empty) {
        parts.pop();
    }
    parts
}

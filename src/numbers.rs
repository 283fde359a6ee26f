//! Numeral run detection.
//!
//! A run starts at the first digit of any supported script and continues
//! while the next rune is a digit of a compatible script (see
//! [`DigitScript::is_compatible`]): Persian and Arabic-Indic digits may mix,
//! an ASCII digit next to an Eastern digit starts a new run.

use crate::error::{Error, Result};
use crate::rules::DigitScript;
use serde::{Deserialize, Serialize};
use std::iter::Peekable;
use std::str::CharIndices;

/// Where a detected number came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "script")]
pub enum NumberSource {
    /// A digit run; carries the script of its first digit.
    Digits(DigitScript),
    /// Spelled-out Persian number words.
    Words,
}

/// A number found in a text. Offsets are half-open: `[start, end)` in runes
/// and `[byte_start, byte_end)` in bytes of the original input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberMatch {
    /// `None` when the run does not fit in an `i64`.
    pub value: Option<i64>,
    pub start: usize,
    pub end: usize,
    pub byte_start: usize,
    pub byte_end: usize,
    pub source: NumberSource,
}

impl NumberMatch {
    pub fn is_overflow(&self) -> bool {
        self.value.is_none()
    }

    /// The matched slice of the text the match was produced from.
    pub fn as_str<'a>(&self, text: &'a str) -> &'a str {
        &text[self.byte_start..self.byte_end]
    }

    pub fn rune_len(&self) -> usize {
        self.end - self.start
    }
}

/// Lazy iterator over the numeral runs of a string.
pub struct DigitRuns<'a> {
    chars: Peekable<CharIndices<'a>>,
    rune: usize,
}

impl<'a> DigitRuns<'a> {
    pub fn new(text: &'a str) -> Self {
        DigitRuns {
            chars: text.char_indices().peekable(),
            rune: 0,
        }
    }
}

impl Iterator for DigitRuns<'_> {
    type Item = NumberMatch;

    fn next(&mut self) -> Option<NumberMatch> {
        let (byte_start, first, script, digit) = loop {
            let (idx, c) = self.chars.next()?;
            self.rune += 1;
            if let Some((script, digit)) = DigitScript::classify(c) {
                break (idx, c, script, digit);
            }
        };

        let start = self.rune - 1;
        let mut value = Some(i64::from(digit));
        let mut byte_end = byte_start + first.len_utf8();

        while let Some(&(idx, c)) = self.chars.peek() {
            match DigitScript::classify(c) {
                Some((next, digit)) if next.is_compatible(script) => {
                    value = value
                        .and_then(|v| v.checked_mul(10))
                        .and_then(|v| v.checked_add(i64::from(digit)));
                    byte_end = idx + c.len_utf8();
                    self.rune += 1;
                    self.chars.next();
                }
                _ => break,
            }
        }

        Some(NumberMatch {
            value,
            start,
            end: self.rune,
            byte_start,
            byte_end,
            source: NumberSource::Digits(script),
        })
    }
}

/// Something that finds numbers in text.
pub trait NumberDetector: Send + Sync {
    fn detect(&self, text: &str) -> Vec<NumberMatch>;
}

/// Detects numeral runs only.
#[derive(Debug, Default, Clone, Copy)]
pub struct DigitDetector;

impl NumberDetector for DigitDetector {
    fn detect(&self, text: &str) -> Vec<NumberMatch> {
        detect_numbers(text)
    }
}

/// All numeral runs in `text`, in ascending order.
pub fn detect_numbers(text: &str) -> Vec<NumberMatch> {
    DigitRuns::new(text).collect()
}

/// Parse a single numeral run (any compatible mix of one script family).
pub fn parse_digits(s: &str) -> Result<i64> {
    let mut runs = DigitRuns::new(s);
    match (runs.next(), runs.next()) {
        (Some(run), None) if run.byte_start == 0 && run.byte_end == s.len() => {
            run.value.ok_or_else(|| Error::NumberOverflow {
                digits: s.to_string(),
            })
        }
        _ => Err(Error::NotANumber(s.to_string())),
    }
}

/// Rebuild `text` with every numeral run replaced by `f(run)`.
pub fn replace_digit_runs<F>(text: &str, mut f: F) -> String
where
    F: FnMut(&NumberMatch, &str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for run in DigitRuns::new(text) {
        let original = run.as_str(text);
        if let Some(replacement) = f(&run, original) {
            out.push_str(&text[last..run.byte_start]);
            out.push_str(&replacement);
            last = run.byte_end;
        }
    }
    out.push_str(&text[last..]);
    out
}

//! Persian number words: "بیست و پنج", "دومین", "هزاروهفتصد".

use crate::numbers::{detect_numbers, NumberDetector, NumberMatch, NumberSource};
use crate::rules::{tables, HALF_SPACE, NUMBER_CONJUNCTION};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Word,
    Space,
    Other,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    /// Letters after 1:1 folding; empty for non-word tokens.
    text: String,
    /// (rune, byte_start, byte_end) of every char kept in `text`.
    positions: Vec<(usize, usize, usize)>,
}

impl Token {
    fn new(kind: TokenKind) -> Self {
        Token {
            kind,
            text: String::new(),
            positions: Vec::new(),
        }
    }

    fn start(&self) -> usize {
        self.positions.first().map(|p| p.0).unwrap_or(0)
    }

    fn end(&self) -> usize {
        self.positions.last().map(|p| p.0 + 1).unwrap_or(0)
    }

    fn byte_start(&self) -> usize {
        self.positions.first().map(|p| p.1).unwrap_or(0)
    }

    fn byte_end(&self) -> usize {
        self.positions.last().map(|p| p.2).unwrap_or(0)
    }

    /// Sub-token over chars `[from, to)` of this word.
    fn slice(&self, from: usize, to: usize) -> Token {
        Token {
            kind: TokenKind::Word,
            text: self.text.chars().skip(from).take(to - from).collect(),
            positions: self.positions[from..to].to_vec(),
        }
    }
}

fn tokenize(text: &str) -> Vec<Token> {
    let t = tables();
    let mut tokens: Vec<Token> = Vec::new();

    for (rune, (byte, c)) in text.char_indices().enumerate() {
        let in_word = matches!(tokens.last(), Some(tok) if tok.kind == TokenKind::Word);
        if in_word && t.is_dropped(c) {
            continue;
        }

        let kind = if c.is_alphabetic() {
            TokenKind::Word
        } else if c.is_whitespace() || c == HALF_SPACE {
            TokenKind::Space
        } else {
            TokenKind::Other
        };

        let extend = matches!(tokens.last(), Some(tok) if tok.kind == kind && kind != TokenKind::Other);
        if !extend {
            tokens.push(Token::new(kind));
        }
        if let Some(tok) = tokens.last_mut() {
            if kind == TokenKind::Word {
                tok.text.push(t.fold_letter(c).unwrap_or(c));
            }
            tok.positions.push((rune, byte, byte + c.len_utf8()));
        }
    }

    split_conjoined(tokens)
}

/// Break words like "هزاروهفتصد" into "هزار", "و", "هفتصد".
fn split_conjoined(tokens: Vec<Token>) -> Vec<Token> {
    let t = tables();
    let mut out = Vec::with_capacity(tokens.len());
    for tok in tokens {
        let known = t.number_word(&tok.text).is_some() || t.ordinal_word(&tok.text).is_some();
        if tok.kind != TokenKind::Word || known || !tok.text.contains(NUMBER_CONJUNCTION) {
            out.push(tok);
            continue;
        }
        let chars: Vec<char> = tok.text.chars().collect();
        match segment(&chars, 0) {
            Some(parts) if parts.len() > 1 => {
                out.extend(parts.into_iter().map(|(from, to)| tok.slice(from, to)));
            }
            _ => out.push(tok),
        }
    }
    out
}

fn segment(chars: &[char], from: usize) -> Option<Vec<(usize, usize)>> {
    let t = tables();
    for end in (from + 1..=chars.len()).rev() {
        let word: String = chars[from..end].iter().collect();
        let is_last = end == chars.len();
        let known = t.number_word(&word).is_some() || (is_last && t.ordinal_word(&word).is_some());
        if !known {
            continue;
        }
        if is_last {
            return Some(vec![(from, end)]);
        }
        if chars[end].to_string() == NUMBER_CONJUNCTION && end + 1 < chars.len() {
            if let Some(rest) = segment(chars, end + 1) {
                let mut parts = vec![(from, end), (end, end + 1)];
                parts.extend(rest);
                return Some(parts);
            }
        }
    }
    None
}

/// Running value of a compound number.
#[derive(Debug, Default)]
struct Accumulator {
    total: u64,
    current: u64,
    overflow: bool,
}

impl Accumulator {
    fn push(&mut self, word: &str, value: u64) {
        match tables().multiplier(word) {
            Some(m) => self.scale(m),
            None => self.add(value),
        }
    }

    fn add(&mut self, value: u64) {
        match self.current.checked_add(value) {
            Some(v) => self.current = v,
            None => self.overflow = true,
        }
    }

    fn scale(&mut self, multiplier: u64) {
        let base = self.current.max(1);
        match base.checked_mul(multiplier) {
            Some(v) if multiplier < 1000 => self.current = v,
            Some(v) => {
                match self.total.checked_add(v) {
                    Some(total) => self.total = total,
                    None => self.overflow = true,
                }
                self.current = 0;
            }
            None => self.overflow = true,
        }
    }

    fn value(&self) -> Option<i64> {
        if self.overflow {
            return None;
        }
        self.total
            .checked_add(self.current)
            .and_then(|v| i64::try_from(v).ok())
    }
}

fn next_non_space(tokens: &[Token], from: usize) -> Option<usize> {
    (from..tokens.len()).find(|&i| tokens[i].kind != TokenKind::Space)
}

/// Consume a compound number starting at `first`; returns its value and the
/// index of the last token it used.
fn parse_compound(tokens: &[Token], first: usize, value: u64) -> (Option<i64>, usize) {
    let t = tables();
    let mut acc = Accumulator::default();
    acc.push(&tokens[first].text, value);
    let mut last = first;

    while let Some(j) = next_non_space(tokens, last + 1) {
        let next = &tokens[j];
        if next.kind != TokenKind::Word {
            break;
        }
        if let Some(m) = t.multiplier(&next.text) {
            acc.scale(m);
            last = j;
            continue;
        }
        if next.text != NUMBER_CONJUNCTION {
            break;
        }
        let Some(k) = next_non_space(tokens, j + 1) else {
            break;
        };
        let operand = &tokens[k];
        if operand.kind != TokenKind::Word {
            break;
        }
        if let Some(v) = t.number_word(&operand.text) {
            acc.push(&operand.text, v);
            last = k;
            continue;
        }
        if let Some(v) = t.ordinal_word(&operand.text) {
            acc.add(v);
            last = k;
        }
        break;
    }

    (acc.value(), last)
}

fn word_match(tokens: &[Token], first: usize, last: usize, value: Option<i64>) -> NumberMatch {
    NumberMatch {
        value,
        start: tokens[first].start(),
        end: tokens[last].end(),
        byte_start: tokens[first].byte_start(),
        byte_end: tokens[last].byte_end(),
        source: NumberSource::Words,
    }
}

/// Persian number words in `text`, in ascending order.
pub fn detect_number_words(text: &str) -> Vec<NumberMatch> {
    let t = tables();
    let tokens = tokenize(text);
    let mut matches = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        let tok = &tokens[i];
        if tok.kind != TokenKind::Word {
            i += 1;
            continue;
        }
        if let Some(v) = t.number_word(&tok.text) {
            let (value, last) = parse_compound(&tokens, i, v);
            matches.push(word_match(&tokens, i, last, value));
            i = last + 1;
        } else if let Some(v) = t.ordinal_word(&tok.text) {
            matches.push(word_match(&tokens, i, i, i64::try_from(v).ok()));
            i += 1;
        } else {
            i += 1;
        }
    }

    debug!(count = matches.len(), "detected number words");
    matches
}

/// Digit runs and number words together, ordered by position.
pub fn detect_all(text: &str) -> Vec<NumberMatch> {
    let mut matches = detect_numbers(text);
    matches.extend(detect_number_words(text));
    matches.sort_by_key(|m| m.start);
    matches
}

/// Rewrite every detected number word as ASCII digits.
pub fn replace_number_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in detect_number_words(text) {
        if let Some(v) = m.value {
            out.push_str(&text[last..m.byte_start]);
            out.push_str(&v.to_string());
            last = m.byte_end;
        }
    }
    out.push_str(&text[last..]);
    out
}

/// Detects spelled-out Persian numbers only.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordDetector;

impl NumberDetector for WordDetector {
    fn detect(&self, text: &str) -> Vec<NumberMatch> {
        detect_number_words(text)
    }
}

/// Detects digit runs and number words.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllNumbersDetector;

impl NumberDetector for AllNumbersDetector {
    fn detect(&self, text: &str) -> Vec<NumberMatch> {
        detect_all(text)
    }
}

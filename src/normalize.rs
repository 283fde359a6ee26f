use crate::error::Result;
use crate::num2words::{int_to_words, NumberLanguage};
use crate::numbers::replace_digit_runs;
use crate::rules::{
    tables, DigitScript, HALF_SPACE, HALF_SPACE_ENTITY, HALF_SPACE_PREFIXES, HALF_SPACE_SUFFIXES,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use unicode_normalization::UnicodeNormalization;

lazy_static::lazy_static! {
    static ref RE_MULTI_SPACE: Regex = Regex::new(r"\s{2,}").unwrap();
}

/// Switches of the normalization pipeline. Every switch is off by default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub convert_half_space: bool,
    pub combine_space: bool,
    pub remove_outer_space: bool,
    pub remove_url: bool,
    pub normalize_punctuation: bool,
    pub end_with_eol: bool,
    pub int_to_word: bool,
    /// Lexicon for `int_to_word`; unknown codes fall back to `en`.
    pub number_language: Option<String>,

    pub restore_half_space: bool,
    pub normalize_characters: bool,
    pub remove_punctuation: bool,
    pub lowercase: bool,
    pub digit_script: Option<DigitScript>,
}

impl NormalizationConfig {
    /// Every spacing, URL and punctuation switch on; the setup used before
    /// tokenizing text for indexing or similarity.
    pub fn full() -> Self {
        NormalizationConfig {
            convert_half_space: true,
            combine_space: true,
            remove_outer_space: true,
            remove_url: true,
            normalize_punctuation: true,
            normalize_characters: true,
            ..Default::default()
        }
    }

    pub fn with_convert_half_space(mut self) -> Self {
        self.convert_half_space = true;
        self
    }

    pub fn with_restore_half_space(mut self) -> Self {
        self.restore_half_space = true;
        self
    }

    pub fn with_combine_space(mut self) -> Self {
        self.combine_space = true;
        self
    }

    pub fn with_remove_outer_space(mut self) -> Self {
        self.remove_outer_space = true;
        self
    }

    pub fn with_remove_url(mut self) -> Self {
        self.remove_url = true;
        self
    }

    pub fn with_normalize_punctuation(mut self) -> Self {
        self.normalize_punctuation = true;
        self
    }

    pub fn with_remove_punctuation(mut self) -> Self {
        self.remove_punctuation = true;
        self
    }

    pub fn with_normalize_characters(mut self) -> Self {
        self.normalize_characters = true;
        self
    }

    pub fn with_lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }

    pub fn with_end_with_eol(mut self) -> Self {
        self.end_with_eol = true;
        self
    }

    pub fn with_int_to_word(mut self, language: &str) -> Self {
        self.int_to_word = true;
        self.number_language = Some(language.to_string());
        self
    }

    pub fn with_digit_script(mut self, script: DigitScript) -> Self {
        self.digit_script = Some(script);
        self
    }

    pub fn language(&self) -> NumberLanguage {
        self.number_language
            .as_deref()
            .map(NumberLanguage::from_code_or_default)
            .unwrap_or_default()
    }

    fn rewrites_script(&self) -> bool {
        self.normalize_characters
            || self.digit_script.is_some()
            || self.normalize_punctuation
            || self.remove_punctuation
            || self.lowercase
    }
}

/// Applies the configured pipeline. Stage order is fixed: URL removal,
/// script and punctuation rewriting (followed by a second URL sweep), half-space
/// conversion, space combining, outer trimming, integer to words, end of line.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizationConfig,
    language: NumberLanguage,
}

impl Normalizer {
    pub fn new(config: NormalizationConfig) -> Self {
        let language = config.language();
        Normalizer { config, language }
    }

    pub fn config(&self) -> &NormalizationConfig {
        &self.config
    }

    #[instrument(level = "debug", skip_all, fields(input_len = input.len()))]
    pub fn normalize(&self, input: &str) -> String {
        let cfg = &self.config;
        if input.trim().is_empty() {
            return if cfg.end_with_eol {
                "\n".to_string()
            } else {
                String::new()
            };
        }

        let mut s = input.to_string();

        if cfg.remove_url {
            s = remove_urls(&s);
        }
        if cfg.rewrites_script() {
            s = self.rewrite_script(&s);
            // folding can complete a URL, e.g. a fullwidth dot
            if cfg.remove_url {
                s = remove_urls(&s);
            }
        }
        if cfg.convert_half_space {
            s = half_space_to_space(&s);
        } else if cfg.restore_half_space {
            s = space_to_half_space(&s);
        }
        if cfg.combine_space {
            s = combine_spaces(&s);
        }
        if cfg.remove_outer_space {
            s = s.trim().to_string();
        }
        if cfg.int_to_word {
            s = self.spell_numbers(&s);
        }
        if s.trim().is_empty() {
            s.clear();
        }
        if cfg.end_with_eol {
            if cfg.combine_space {
                // trailing whitespace would pair with the newline
                s.truncate(s.trim_end().len());
                s.push('\n');
            } else if !s.ends_with('\n') {
                s.push('\n');
            }
        }

        debug!(output_len = s.len(), "normalized");
        s
    }

    /// Normalize raw bytes, rejecting malformed UTF-8.
    pub fn normalize_bytes(&self, input: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(input)?;
        Ok(self.normalize(text))
    }

    /// Spell out digit runs. The words go through the same script rewriting
    /// and half-space joining as the rest of the text so a second pass leaves
    /// them alone.
    fn spell_numbers(&self, input: &str) -> String {
        let cfg = &self.config;
        let spelled = replace_digit_runs(input, |run, _| {
            run.value.map(|v| {
                let words = int_to_words(v, self.language);
                if cfg.rewrites_script() {
                    self.rewrite_script(&words)
                } else {
                    words
                }
            })
        });
        if cfg.restore_half_space && !cfg.convert_half_space {
            space_to_half_space(&spelled)
        } else {
            spelled
        }
    }

    fn rewrite_script(&self, input: &str) -> String {
        let cfg = &self.config;
        let t = tables();
        let mut s = String::with_capacity(input.len());

        // the entity would not survive punctuation rewriting
        let input = input.replace(HALF_SPACE_ENTITY, &HALF_SPACE.to_string());
        for c in input.chars() {
            if cfg.normalize_characters && t.is_presentation_form(c) {
                for folded in std::iter::once(c).nfkc() {
                    self.push_rewritten(&mut s, folded);
                }
            } else {
                self.push_rewritten(&mut s, c);
            }
        }
        s
    }

    fn push_rewritten(&self, out: &mut String, c: char) {
        let cfg = &self.config;
        let t = tables();

        let mut c = c;
        if cfg.normalize_characters {
            if t.is_dropped(c) {
                return;
            }
            c = t.fold_letter(c).unwrap_or(c);
        }
        if let Some(script) = cfg.digit_script {
            if let Some((_, v)) = DigitScript::classify(c) {
                c = script.digit(v);
            }
        }
        if cfg.normalize_punctuation {
            c = t.canonical_punctuation(c).unwrap_or(c);
        }
        if cfg.remove_punctuation && t.is_punctuation(c) {
            out.push(' ');
            return;
        }
        if cfg.lowercase {
            for lower in c.to_lowercase() {
                if !(cfg.normalize_characters && t.is_dropped(lower)) {
                    out.push(lower);
                }
            }
        } else {
            out.push(c);
        }
    }
}

/// Normalize `input` with `config`.
pub fn normalize_text(input: &str, config: &NormalizationConfig) -> String {
    Normalizer::new(config.clone()).normalize(input)
}

/// Normalize raw bytes with `config`, rejecting malformed UTF-8.
pub fn normalize_bytes(input: &[u8], config: &NormalizationConfig) -> Result<String> {
    Normalizer::new(config.clone()).normalize_bytes(input)
}

/// Normalize for indexing and split into terms.
pub fn tokenize(input: &str) -> Vec<String> {
    let config = NormalizationConfig::full()
        .with_remove_punctuation()
        .with_lowercase();
    Normalizer::new(config)
        .normalize(input)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

pub fn remove_urls(input: &str) -> String {
    tables().url_pattern().replace_all(input, "").into_owned()
}

/// Collapse every run of two or more whitespace characters into one space.
pub fn combine_spaces(input: &str) -> String {
    RE_MULTI_SPACE.replace_all(input, " ").into_owned()
}

/// Replace every half-space (raw or as an HTML entity) with a space.
pub fn half_space_to_space(input: &str) -> String {
    input.replace(HALF_SPACE_ENTITY, " ").replace(HALF_SPACE, " ")
}

/// Join verbal prefixes and plural/comparative suffixes to their word with a
/// half-space instead of whitespace.
pub fn space_to_half_space(input: &str) -> String {
    let segments = split_segments(input);
    let mut out = String::with_capacity(input.len());

    for (i, (segment, is_space)) in segments.iter().enumerate() {
        if *is_space && i > 0 && i + 1 < segments.len() {
            let prev = segments[i - 1].0;
            let next = segments[i + 1].0;
            if joins_with_half_space(prev, next) {
                out.push(HALF_SPACE);
                continue;
            }
        }
        out.push_str(segment);
    }
    out
}

/// Split into alternating runs of whitespace and non-whitespace.
fn split_segments(input: &str) -> Vec<(&str, bool)> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;
    for (idx, c) in input.char_indices() {
        let is_space = c.is_whitespace();
        match current {
            Some(kind) if kind == is_space => {}
            Some(kind) => {
                segments.push((&input[start..idx], kind));
                start = idx;
                current = Some(is_space);
            }
            None => current = Some(is_space),
        }
    }
    if let Some(kind) = current {
        segments.push((&input[start..], kind));
    }
    segments
}

fn joins_with_half_space(prev: &str, next: &str) -> bool {
    let ends_in_letter = prev.chars().last().is_some_and(char::is_alphabetic);
    let starts_with_letter = next.chars().next().is_some_and(char::is_alphabetic);
    if !(ends_in_letter && starts_with_letter) {
        return false;
    }
    let prev_word = prev.rsplit(HALF_SPACE).next().unwrap_or(prev);
    let next_word = next.split(HALF_SPACE).next().unwrap_or(next);
    HALF_SPACE_PREFIXES.contains(&prev_word) || HALF_SPACE_SUFFIXES.contains(&next_word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_stable() {
        let cfg = NormalizationConfig::full();
        assert_eq!(normalize_text("", &cfg), "");
        assert_eq!(normalize_text("", &cfg.clone().with_end_with_eol()), "\n");
        assert_eq!(normalize_text(" \t\n ", &cfg), "");
        assert_eq!(
            normalize_text("   ", &NormalizationConfig::default().with_end_with_eol()),
            "\n"
        );
    }

    #[test]
    fn test_no_switches_is_identity() {
        let cfg = NormalizationConfig::default();
        assert_eq!(normalize_text(" سلام  دنیا ", &cfg), " سلام  دنیا ");
    }

    #[test]
    fn test_half_space_to_space() {
        let cfg = NormalizationConfig::default().with_convert_half_space();
        assert_eq!(normalize_text("آسمان\u{200c}آبی", &cfg), "آسمان آبی");
        assert_eq!(normalize_text("می&zwnj;روم", &cfg), "می روم");
    }

    #[test]
    fn test_half_space_restore() {
        let cfg = NormalizationConfig::default().with_restore_half_space();
        assert_eq!(normalize_text("می روم", &cfg), "می\u{200c}روم");
        assert_eq!(normalize_text("کتاب ها", &cfg), "کتاب\u{200c}ها");
        assert_eq!(normalize_text("بزرگ   ترین شهر", &cfg), "بزرگ\u{200c}ترین شهر");
        assert_eq!(normalize_text("کتاب خوب", &cfg), "کتاب خوب");
    }

    #[test]
    fn test_half_space_wins_over_restore() {
        let mut cfg = NormalizationConfig::default().with_convert_half_space();
        cfg.restore_half_space = true;
        assert_eq!(normalize_text("می\u{200c}روم", &cfg), "می روم");
    }

    #[test]
    fn test_combine_spaces_keeps_half_space() {
        let cfg = NormalizationConfig::default().with_combine_space();
        assert_eq!(normalize_text("تست   تست", &cfg), "تست تست");
        assert_eq!(normalize_text("a \u{200c} b", &cfg), "a \u{200c} b");
        assert_eq!(normalize_text("a\t\n b", &cfg), "a b");
        assert_eq!(normalize_text("a\tb", &cfg), "a\tb");
    }

    #[test]
    fn test_outer_space() {
        let cfg = NormalizationConfig::default().with_remove_outer_space();
        assert_eq!(normalize_text("  تست   ", &cfg), "تست");
    }

    #[test]
    fn test_url_removal() {
        let cfg = NormalizationConfig::default()
            .with_remove_url()
            .with_combine_space();
        assert_eq!(normalize_text("see http://example.com now", &cfg), "see now");
        assert_eq!(normalize_text("برو به www.example.ir/page لطفا", &cfg), "برو به لطفا");

        let only_url = NormalizationConfig::default().with_remove_url();
        assert_eq!(normalize_text("تست https://example.com", &only_url), "تست ");
        assert_eq!(normalize_text("http:// رها", &only_url), "http:// رها");

        let trimmed = only_url.clone().with_remove_outer_space();
        assert_eq!(normalize_text("تست https://example.com", &trimmed), "تست");
    }

    #[test]
    fn test_url_completed_by_folding() {
        let cfg = NormalizationConfig::default()
            .with_remove_url()
            .with_normalize_punctuation();
        let once = normalize_text("see www\u{FF0E}example\u{FF0E}com now", &cfg);
        assert_eq!(once, "see  now");
        assert_eq!(normalize_text(&once, &cfg), once);
        assert_eq!(normalize_text("http\u{FF1A}//example.com", &cfg), "");

        let chars = NormalizationConfig::default()
            .with_remove_url()
            .with_normalize_characters()
            .with_combine_space();
        let once = normalize_text("see ww\u{200d}w.example.com now", &chars);
        assert_eq!(once, "see now");
        assert_eq!(normalize_text(&once, &chars), once);
    }

    #[test]
    fn test_eol_absorbs_trailing_space() {
        let cfg = NormalizationConfig::default()
            .with_combine_space()
            .with_end_with_eol();
        let once = normalize_text("x\t", &cfg);
        assert_eq!(once, "x\n");
        assert_eq!(normalize_text(&once, &cfg), once);
        assert_eq!(normalize_text("x \t\n", &cfg), "x\n");

        let plain = NormalizationConfig::default().with_end_with_eol();
        assert_eq!(normalize_text("x\t", &plain), "x\t\n");
    }

    #[test]
    fn test_punctuation() {
        let cfg = NormalizationConfig::default().with_normalize_punctuation();
        assert_eq!(normalize_text("سلام,خوبی?", &cfg), "سلام،خوبی؟");
        assert_eq!(normalize_text("«نقل»", &cfg), "\"نقل\"");
        assert_eq!(normalize_text("a;b", &cfg), "a؛b");

        let removed = cfg
            .with_remove_punctuation()
            .with_combine_space()
            .with_remove_outer_space();
        assert_eq!(normalize_text("سلام,خوبی؟چه خبرا.", &removed), "سلام خوبی چه خبرا");
    }

    #[test]
    fn test_character_normalization() {
        let cfg = NormalizationConfig::default().with_normalize_characters();
        assert_eq!(normalize_text("علي", &cfg), "علی");
        assert_eq!(normalize_text("كتاب", &cfg), "کتاب");
        assert_eq!(normalize_text("بـــاران", &cfg), "باران");
        assert_eq!(normalize_text("کَتاب", &cfg), "کتاب");
        // presentation forms of lam and alef
        assert_eq!(normalize_text("\u{FEDF}\u{FE8E}", &cfg), "لا");
    }

    #[test]
    fn test_digit_script() {
        let cfg = NormalizationConfig::default().with_digit_script(DigitScript::Ascii);
        assert_eq!(normalize_text("۶ ٠ 9 ۷", &cfg), "6 0 9 7");
        let fa = NormalizationConfig::default().with_digit_script(DigitScript::Persian);
        assert_eq!(normalize_text("12", &fa), "۱۲");
    }

    #[test]
    fn test_int_to_word() {
        let fa = NormalizationConfig::default().with_int_to_word("fa");
        assert_eq!(normalize_text("کوچه 110", &fa), "کوچه صد و ده");
        assert_eq!(normalize_text("کوچه ۱۱۰", &fa), "کوچه صد و ده");
        assert_eq!(normalize_text("abc12", &fa), "abcدوازده");

        let en = NormalizationConfig::default().with_int_to_word("en");
        assert_eq!(normalize_text("room 21", &en), "room twenty-one");

        let unknown = NormalizationConfig::default().with_int_to_word("xx");
        assert_eq!(normalize_text("7", &unknown), "seven");
    }

    #[test]
    fn test_int_to_word_leaves_overflow() {
        let cfg = NormalizationConfig::default().with_int_to_word("en");
        let huge = "99999999999999999999";
        assert_eq!(normalize_text(huge, &cfg), huge);
    }

    #[test]
    fn test_spelled_numbers_are_stable() {
        let cfg = NormalizationConfig::default()
            .with_int_to_word("en")
            .with_remove_punctuation();
        let once = normalize_text("room 21", &cfg);
        assert_eq!(once, "room twenty one");
        assert_eq!(normalize_text(&once, &cfg), once);

        let fa = NormalizationConfig::default()
            .with_int_to_word("fa")
            .with_restore_half_space();
        let once = normalize_text("می 5", &fa);
        assert_eq!(once, "می\u{200c}پنج");
        assert_eq!(normalize_text(&once, &fa), once);
    }

    #[test]
    fn test_punctuation_only_collapses_to_empty() {
        let cfg = NormalizationConfig::default().with_remove_punctuation();
        assert_eq!(normalize_text("!!", &cfg), "");
        assert_eq!(normalize_text("!!", &cfg.with_end_with_eol()), "\n");
    }

    #[test]
    fn test_entity_survives_punctuation() {
        let cfg = NormalizationConfig::default()
            .with_normalize_punctuation()
            .with_convert_half_space();
        assert_eq!(normalize_text("می&zwnj;روم", &cfg), "می روم");
    }

    #[test]
    fn test_end_with_eol() {
        let cfg = NormalizationConfig::default().with_end_with_eol();
        assert_eq!(normalize_text("تست", &cfg), "تست\n");
        assert_eq!(normalize_text("تست\n", &cfg), "تست\n");
    }

    #[test]
    fn test_lowercase() {
        let cfg = NormalizationConfig::default().with_lowercase();
        assert_eq!(normalize_text("Hello تست", &cfg), "hello تست");
    }

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("سلام، دنیای  زیبا! Hello");
        assert_eq!(tokens, vec!["سلام", "دنیای", "زیبا", "hello"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_invalid_utf8() {
        let cfg = NormalizationConfig::default();
        let err = normalize_bytes(&[0x61, 0xc3], &cfg).unwrap_err();
        assert_eq!(err, crate::Error::InvalidUtf8 { valid_up_to: 1 });
        assert_eq!(normalize_bytes("ok".as_bytes(), &cfg).unwrap(), "ok");
    }

    #[test]
    fn test_config_from_partial_json() {
        let cfg: NormalizationConfig =
            serde_json::from_str(r#"{"combine_space": true, "digit_script": "persian"}"#).unwrap();
        assert!(cfg.combine_space);
        assert!(!cfg.remove_url);
        assert_eq!(cfg.digit_script, Some(DigitScript::Persian));
        assert_eq!(cfg.language(), NumberLanguage::En);
    }
}

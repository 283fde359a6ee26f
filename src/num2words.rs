//! Integer to words conversion for English and Persian.

use crate::rules::{tables, Lexicon};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Language of the spelled-out numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberLanguage {
    #[default]
    En,
    Fa,
}

impl NumberLanguage {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" | "eng" | "english" => Some(NumberLanguage::En),
            "fa" | "fas" | "per" | "persian" | "farsi" => Some(NumberLanguage::Fa),
            _ => None,
        }
    }

    /// Resolve a language code, falling back to English for unknown codes.
    pub fn from_code_or_default(code: &str) -> Self {
        Self::from_code(code).unwrap_or_else(|| {
            warn!(code, "unsupported number language, falling back to en");
            NumberLanguage::default()
        })
    }

    pub fn code(self) -> &'static str {
        match self {
            NumberLanguage::En => "en",
            NumberLanguage::Fa => "fa",
        }
    }
}

/// Spell out `num` in `lang`.
pub fn int_to_words(num: i64, lang: NumberLanguage) -> String {
    let lex = tables().lexicon(lang);
    let magnitude = unsigned_to_words(num.unsigned_abs(), lex);
    if num < 0 {
        format!("{} {}", lex.minus, magnitude)
    } else {
        magnitude
    }
}

fn unsigned_to_words(num: u64, lex: &Lexicon) -> String {
    if num == 0 {
        return lex.zero.to_string();
    }

    let mut triplets = Vec::with_capacity(7);
    let mut n = num;
    while n > 0 {
        triplets.push((n % 1000) as usize);
        n /= 1000;
    }

    let mut words: Vec<String> = Vec::with_capacity(triplets.len() * 2);
    for (idx, triplet) in triplets.iter().enumerate().rev() {
        if *triplet == 0 {
            continue;
        }
        words.push(triplet_to_words(*triplet, lex));
        if idx > 0 {
            words.push(lex.scales[idx - 1].to_string());
        }
    }
    words.join(" ")
}

/// Convert 1..=999 to words.
fn triplet_to_words(n: usize, lex: &Lexicon) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(2);

    let h = n / 100;
    if h > 0 {
        parts.push(lex.hundreds[h].to_string());
    }

    let remainder = n % 100;
    if remainder > 0 {
        if remainder < 20 {
            parts.push(lex.ones[remainder].to_string());
        } else {
            let tens = remainder / 10;
            let ones = remainder % 10;
            if ones > 0 {
                parts.push(format!("{}{}{}", lex.tens[tens], lex.tens_joiner, lex.ones[ones]));
            } else {
                parts.push(lex.tens[tens].to_string());
            }
        }
    }

    parts.join(lex.part_joiner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persian_basic() {
        assert_eq!(int_to_words(0, NumberLanguage::Fa), "صفر");
        assert_eq!(int_to_words(3, NumberLanguage::Fa), "سه");
        assert_eq!(int_to_words(23, NumberLanguage::Fa), "بیست و سه");
        assert_eq!(int_to_words(110, NumberLanguage::Fa), "صد و ده");
        assert_eq!(int_to_words(123, NumberLanguage::Fa), "صد و بیست و سه");
    }

    #[test]
    fn test_persian_thousands() {
        assert_eq!(
            int_to_words(1235, NumberLanguage::Fa),
            "یک هزار دویست و سی و پنج"
        );
        assert_eq!(
            int_to_words(12356, NumberLanguage::Fa),
            "دوازده هزار سیصد و پنجاه و شش"
        );
        assert_eq!(
            int_to_words(123567, NumberLanguage::Fa),
            "صد و بیست و سه هزار پانصد و شصت و هفت"
        );
        assert_eq!(int_to_words(2_000_000, NumberLanguage::Fa), "دو میلیون");
    }

    #[test]
    fn test_english() {
        assert_eq!(int_to_words(0, NumberLanguage::En), "zero");
        assert_eq!(int_to_words(21, NumberLanguage::En), "twenty-one");
        assert_eq!(int_to_words(101, NumberLanguage::En), "one hundred one");
        assert_eq!(
            int_to_words(2345, NumberLanguage::En),
            "two thousand three hundred forty-five"
        );
        assert_eq!(int_to_words(1_000_000, NumberLanguage::En), "one million");
    }

    #[test]
    fn test_negative_and_extremes() {
        assert_eq!(int_to_words(-15, NumberLanguage::En), "minus fifteen");
        assert_eq!(int_to_words(-2, NumberLanguage::Fa), "منفی دو");
        let max = int_to_words(i64::MAX, NumberLanguage::En);
        assert!(max.starts_with("nine quintillion"));
        let min = int_to_words(i64::MIN, NumberLanguage::En);
        assert!(min.starts_with("minus nine quintillion"));
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(NumberLanguage::from_code("FA"), Some(NumberLanguage::Fa));
        assert_eq!(NumberLanguage::from_code("xx"), None);
        assert_eq!(NumberLanguage::from_code_or_default("xx"), NumberLanguage::En);
        assert_eq!(NumberLanguage::Fa.code(), "fa");
    }
}

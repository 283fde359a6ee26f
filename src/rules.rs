//! Static rule tables shared by every engine operation.
//!
//! Everything here is built once on first use and never mutated afterwards,
//! so concurrent callers share a single `&'static RuleTables`.

use crate::num2words::NumberLanguage;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Zero-width non-joiner, the Persian half-space.
pub const HALF_SPACE: char = '\u{200C}';

/// HTML entity some sources use instead of the raw half-space.
pub const HALF_SPACE_ENTITY: &str = "&zwnj;";

/// Verbal prefixes written with a half-space before the verb stem.
pub const HALF_SPACE_PREFIXES: &[&str] = &["می", "نمی"];

/// Suffixes written with a half-space after the word they attach to.
pub const HALF_SPACE_SUFFIXES: &[&str] = &[
    "ها", "های", "هایی", "هایم", "هایت", "هایش", "هایمان", "هایتان", "هایشان", "تر", "ترین",
];

/// Conjunction used between the parts of a compound number.
pub const NUMBER_CONJUNCTION: &str = "و";

const ORDINAL_SUFFIXES: &[&str] = &["مین", "ام", "وم", "م", "ین"];

const IRREGULAR_ORDINALS: &[(&str, u64)] = &[("اول", 1), ("دوم", 2), ("سوم", 3)];

const COLLOQUIAL_NUMBERS: &[(&str, u64)] = &[
    ("یکصد", 100),
    ("چارصد", 400),
    ("پونصد", 500),
    ("شونصد", 600),
    ("هیجده", 18),
];

/// (canonical, variants) per punctuation class.
const PUNCTUATION_CLASSES: &[(char, &[char])] = &[
    ('،', &[',', '٬', '、', '，', '﹐', '﹑']),
    ('؟', &['?', '？', '⸮', '﹖']),
    ('؛', &[';', '；', '⁏', '﹔']),
    ('٪', &['%', '％', '﹪']),
    ('"', &['“', '”', '„', '‟', '«', '»', '″', '＂', '〝', '〞']),
    ('\'', &['‘', '’', '‚', '‛', '′', '＇', '`', '´']),
    (':', &['：', '﹕', '꞉']),
    ('!', &['！', '﹗']),
    ('.', &['。', '．', '۔']),
    (
        '-',
        &['–', '—', '―', '‐', '‑', '‒', '−', '➖', '﹣', '－', '─', '━'],
    ),
    ('…', &['┅', '┄', '┈', '⋯']),
];

/// Punctuation that has no variant class but is still removed by
/// punctuation stripping.
const EXTRA_PUNCTUATION: &[char] = &['·', '‼', '⁉', '٫', '؍', '٭'];

/// (Persian letter, Arabic and regional variants folded into it).
const LETTER_FOLDS: &[(char, &[char])] = &[
    ('ی', &['ي', 'ى', 'ئ', 'ۍ', 'ې', 'ۑ', 'ے', 'ۓ', 'ؽ', 'ؾ', 'ؿ', 'ٸ']),
    ('ک', &['ك', 'ڪ', 'ػ', 'ګ', 'ڬ', 'ڭ', 'ڮ', 'ݢ', 'ݣ', 'ݤ']),
    ('ه', &['ة', 'ۀ', 'ۂ', 'ۃ', 'ە', 'ہ', 'ھ', 'ۿ']),
    ('ا', &['أ', 'إ', 'آ', 'ٱ', 'ٲ', 'ٳ', 'ٵ']),
    (
        'و',
        &['ؤ', 'ۄ', 'ۅ', 'ۆ', 'ۇ', 'ۈ', 'ۉ', 'ۊ', 'ۋ', 'ۏ', 'ٶ', 'ٷ'],
    ),
    ('ب', &['ٮ', 'ݕ']),
    ('پ', &['ݐ', 'ݒ']),
    ('ت', &['ٹ', 'ٺ', 'ټ', 'ٿ', 'ݓ']),
    ('ث', &['ٽ', 'ݑ']),
    ('ج', &['ڃ']),
    ('چ', &['ڇ', 'ڿ', 'ݘ']),
    ('ح', &['ځ']),
    ('خ', &['ڂ', 'ݗ']),
    ('د', &['ڈ', 'ډ', 'ڊ', 'ڋ', 'ڌ', 'ڍ', 'ڐ', 'ۮ']),
    ('ر', &['ڑ', 'ڒ', 'ړ', 'ڔ', 'ڕ', 'ږ', 'ۯ', 'ݛ', 'ݬ']),
    ('ز', &['ڗ', 'ݫ']),
    ('س', &['ښ', 'ڛ', 'ݭ']),
    ('ش', &['ڜ', 'ۺ', 'ݜ']),
    ('ص', &['ڝ']),
    ('ض', &['ۻ']),
    ('ظ', &['ڟ']),
    ('ع', &['ڠ', '؏']),
    ('غ', &['ۼ', 'ݞ', 'ݟ']),
    ('ف', &['ڢ', 'ڣ', 'ڤ', 'ڥ', '؋']),
    ('ق', &['ڦ', 'ڧ', 'ڨ']),
    ('گ', &['ڰ', 'ڲ', 'ڳ', 'ڴ']),
    ('ل', &['ڵ', 'ڶ', 'ڷ', 'ڸ', 'ݪ']),
    ('م', &['۾', 'ݥ']),
    ('ن', &['ڹ', 'ں', 'ڻ', 'ݧ']),
];

/// Word lists used to spell out integers in one language.
#[derive(Debug)]
pub struct Lexicon {
    pub zero: &'static str,
    pub minus: &'static str,
    /// 0..=19; index 0 is unused.
    pub ones: [&'static str; 20],
    pub tens: [&'static str; 10],
    pub hundreds: [&'static str; 10],
    /// 10^3, 10^6, ... 10^18.
    pub scales: [&'static str; 6],
    /// Between a tens word and a unit word.
    pub tens_joiner: &'static str,
    /// Between the hundreds word and the rest of a triplet.
    pub part_joiner: &'static str,
}

pub static PERSIAN_LEXICON: Lexicon = Lexicon {
    zero: "صفر",
    minus: "منفی",
    ones: [
        "", "یک", "دو", "سه", "چهار", "پنج", "شش", "هفت", "هشت", "نه", "ده", "یازده", "دوازده",
        "سیزده", "چهارده", "پانزده", "شانزده", "هفده", "هجده", "نوزده",
    ],
    tens: [
        "", "ده", "بیست", "سی", "چهل", "پنجاه", "شصت", "هفتاد", "هشتاد", "نود",
    ],
    hundreds: [
        "", "صد", "دویست", "سیصد", "چهارصد", "پانصد", "ششصد", "هفتصد", "هشتصد", "نهصد",
    ],
    scales: ["هزار", "میلیون", "میلیارد", "بیلیون", "بیلیارد", "تریلیون"],
    tens_joiner: " و ",
    part_joiner: " و ",
};

pub static ENGLISH_LEXICON: Lexicon = Lexicon {
    zero: "zero",
    minus: "minus",
    ones: [
        "",
        "one",
        "two",
        "three",
        "four",
        "five",
        "six",
        "seven",
        "eight",
        "nine",
        "ten",
        "eleven",
        "twelve",
        "thirteen",
        "fourteen",
        "fifteen",
        "sixteen",
        "seventeen",
        "eighteen",
        "nineteen",
    ],
    tens: [
        "", "ten", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
    ],
    hundreds: [
        "",
        "one hundred",
        "two hundred",
        "three hundred",
        "four hundred",
        "five hundred",
        "six hundred",
        "seven hundred",
        "eight hundred",
        "nine hundred",
    ],
    scales: [
        "thousand",
        "million",
        "billion",
        "trillion",
        "quadrillion",
        "quintillion",
    ],
    tens_joiner: "-",
    part_joiner: " ",
};

/// Numeral alphabets the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigitScript {
    Ascii,
    Persian,
    ArabicIndic,
}

/// Scripts in the same family may share one numeral run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFamily {
    Western,
    Eastern,
}

impl DigitScript {
    pub const ALL: [DigitScript; 3] = [
        DigitScript::Ascii,
        DigitScript::Persian,
        DigitScript::ArabicIndic,
    ];

    fn zero(self) -> char {
        match self {
            DigitScript::Ascii => '0',
            DigitScript::Persian => '\u{06F0}',
            DigitScript::ArabicIndic => '\u{0660}',
        }
    }

    /// Value of `c` in this script, if `c` is one of its digits.
    pub fn digit_value(self, c: char) -> Option<u8> {
        let offset = (c as u32).checked_sub(self.zero() as u32)?;
        (offset < 10).then_some(offset as u8)
    }

    /// The digit for `value` (0..=9) in this script.
    pub fn digit(self, value: u8) -> char {
        debug_assert!(value < 10);
        char::from_u32(self.zero() as u32 + u32::from(value % 10)).unwrap_or(self.zero())
    }

    pub fn family(self) -> ScriptFamily {
        match self {
            DigitScript::Ascii => ScriptFamily::Western,
            DigitScript::Persian | DigitScript::ArabicIndic => ScriptFamily::Eastern,
        }
    }

    pub fn is_compatible(self, other: DigitScript) -> bool {
        self.family() == other.family()
    }

    /// Script and value of `c` if it is a digit of any supported script.
    pub fn classify(c: char) -> Option<(DigitScript, u8)> {
        Self::ALL
            .iter()
            .find_map(|script| script.digit_value(c).map(|v| (*script, v)))
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "ascii" | "en" | "latin" => Some(DigitScript::Ascii),
            "persian" | "fa" => Some(DigitScript::Persian),
            "arabic_indic" | "arabic" | "ar" => Some(DigitScript::ArabicIndic),
            _ => None,
        }
    }
}

pub struct RuleTables {
    punctuation: HashMap<char, char>,
    letters: HashMap<char, char>,
    number_words: HashMap<&'static str, u64>,
    multipliers: HashMap<&'static str, u64>,
    url: Regex,
}

static TABLES: Lazy<RuleTables> = Lazy::new(RuleTables::build);

/// Process-wide rule tables.
pub fn tables() -> &'static RuleTables {
    &TABLES
}

impl RuleTables {
    fn build() -> Self {
        let mut punctuation = HashMap::new();
        for (canonical, variants) in PUNCTUATION_CLASSES {
            punctuation.insert(*canonical, *canonical);
            for v in variants.iter() {
                punctuation.insert(*v, *canonical);
            }
        }

        let mut letters = HashMap::new();
        for (target, variants) in LETTER_FOLDS {
            for v in variants.iter() {
                letters.insert(*v, *target);
            }
        }

        let lex = &PERSIAN_LEXICON;
        let mut number_words = HashMap::new();
        number_words.insert(lex.zero, 0);
        for (value, word) in lex.ones.iter().enumerate().skip(1) {
            number_words.insert(*word, value as u64);
        }
        for (tens, word) in lex.tens.iter().enumerate().skip(2) {
            number_words.insert(*word, tens as u64 * 10);
        }
        let mut multipliers = HashMap::new();
        for (hundreds, word) in lex.hundreds.iter().enumerate().skip(1) {
            number_words.insert(*word, hundreds as u64 * 100);
        }
        multipliers.insert(lex.hundreds[1], 100);
        let mut scale = 1u64;
        for word in lex.scales.iter() {
            scale *= 1000;
            number_words.insert(*word, scale);
            multipliers.insert(*word, scale);
        }
        for (word, value) in COLLOQUIAL_NUMBERS {
            number_words.insert(*word, *value);
        }

        let url = Regex::new(
            r#"(?i)(?:(?:https?|ftps?|file)://|www\.[^\s.<>"]+\.)[^\s<>"]*[^\s<>".,;:!?'،؛؟)\]}]"#,
        )
        .expect("url pattern is valid");

        RuleTables {
            punctuation,
            letters,
            number_words,
            multipliers,
            url,
        }
    }

    /// Canonical member of the punctuation class `c` belongs to.
    pub fn canonical_punctuation(&self, c: char) -> Option<char> {
        self.punctuation.get(&c).copied()
    }

    pub fn is_punctuation(&self, c: char) -> bool {
        c.is_ascii_punctuation()
            || self.punctuation.contains_key(&c)
            || EXTRA_PUNCTUATION.contains(&c)
    }

    /// Persian letter an Arabic or regional variant folds into.
    pub fn fold_letter(&self, c: char) -> Option<char> {
        self.letters.get(&c).copied()
    }

    /// Marks removed outright by character normalization.
    pub fn is_dropped(&self, c: char) -> bool {
        matches!(c,
            '\u{064B}'..='\u{065F}'   // harakat, tanwin, shadda, sukun
            | '\u{0670}'              // superscript alef
            | '\u{0640}'              // tatweel
            | '\u{0621}'              // standalone hamza
            | '\u{06D6}'..='\u{06ED}' // Quranic annotation marks
            | '\u{0300}'..='\u{036F}' // combining diacritical marks
            | '\u{200D}'              // zero width joiner
            | '\u{200E}' | '\u{200F}' | '\u{061C}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2066}'..='\u{2069}'
            | '\u{FE00}'..='\u{FE0F}' // variation selectors
            | '\u{FEFF}')
    }

    /// Arabic presentation forms, which NFKC folds back to nominal letters.
    pub fn is_presentation_form(&self, c: char) -> bool {
        matches!(c, '\u{FB50}'..='\u{FDFF}' | '\u{FE70}'..='\u{FEFC}')
    }

    /// Value of a Persian cardinal number word.
    pub fn number_word(&self, word: &str) -> Option<u64> {
        self.number_words.get(word).copied()
    }

    /// Value of a word that scales what precedes it (`صد`, `هزار`, ...).
    pub fn multiplier(&self, word: &str) -> Option<u64> {
        self.multipliers.get(word).copied()
    }

    /// Value of an ordinal (`اول`, `پنجم`, `دومین`, ...).
    pub fn ordinal_word(&self, word: &str) -> Option<u64> {
        if let Some((_, v)) = IRREGULAR_ORDINALS.iter().find(|(w, _)| *w == word) {
            return Some(*v);
        }
        for suffix in ORDINAL_SUFFIXES {
            if let Some(base) = word.strip_suffix(suffix) {
                if base.is_empty() {
                    continue;
                }
                if let Some(v) = self.number_word(base) {
                    return Some(v);
                }
                if let Some((_, v)) = IRREGULAR_ORDINALS.iter().find(|(w, _)| *w == base) {
                    return Some(*v);
                }
            }
        }
        None
    }

    pub fn lexicon(&self, lang: NumberLanguage) -> &'static Lexicon {
        match lang {
            NumberLanguage::En => &ENGLISH_LEXICON,
            NumberLanguage::Fa => &PERSIAN_LEXICON,
        }
    }

    pub fn url_pattern(&self) -> &Regex {
        &self.url
    }
}

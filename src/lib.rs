//! Persian text normalization.
//!
//! Three engine operations share one set of immutable rule tables:
//!
//! * [`normalize_text`]: configurable cleanup pipeline (URLs, punctuation,
//!   half-spaces, whitespace, digits to words).
//! * [`detect_numbers`]: numeral runs in ASCII, Persian and Arabic-Indic
//!   digits with rune offsets; [`detect_number_words`] does the same for
//!   spelled-out Persian numbers.
//! * [`cosine_similarity`]: term-frequency cosine of queries against batches
//!   of candidate rows.
//!
//! The [`ffi`] module exposes the same operations through a C ABI.

pub mod error;
pub mod ffi;
pub mod normalize;
pub mod num2words;
pub mod numbers;
pub mod rules;
pub mod similarity;
pub mod words;

pub use error::{Error, Result};
pub use normalize::{normalize_bytes, normalize_text, tokenize, NormalizationConfig, Normalizer};
pub use num2words::{int_to_words, NumberLanguage};
pub use numbers::{detect_numbers, parse_digits, NumberDetector, NumberMatch, NumberSource};
pub use rules::DigitScript;
pub use similarity::{
    cosine_similarity, jaccard_similarity, longest_common_subsequence, BatchMode,
    SimilarityRequest, SimilarityResult, SimilarityScorer, TermVector,
};
pub use words::{detect_all, detect_number_words, replace_number_words};

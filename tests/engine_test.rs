// Integration tests for the normalization engine
use farsi_norm::{
    cosine_similarity, detect_all, detect_numbers, normalize_text, parse_digits, DigitScript,
    Error, NormalizationConfig, NumberSource, TermVector,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const PIECES: &[&str] = &[
    "می", "نمی", "ها", "ترین", "کتاب", "روم", "علي", "كتاب", " ", "  ", "\t", "\n", "\u{200c}",
    "&zwnj;", "١٢", "۳۴", "45", "99999999999999999999", ",", "?", "«", "»", "!", "-", "ـ", "\u{064e}",
    "http://example.com", "www.test.ir", "Hello", "بیست و سه", "سوم", "\u{FF0E}", "\u{FF1A}",
    "\u{200d}", "www", "ww", "http", "//", "example", "x\t", "İ",
];

fn random_text(rng: &mut StdRng) -> String {
    let len = rng.random_range(0..12);
    (0..len)
        .map(|_| PIECES[rng.random_range(0..PIECES.len())])
        .collect()
}

fn random_config(rng: &mut StdRng) -> NormalizationConfig {
    let mut cfg = NormalizationConfig {
        convert_half_space: rng.random_bool(0.5),
        combine_space: rng.random_bool(0.5),
        remove_outer_space: rng.random_bool(0.5),
        remove_url: rng.random_bool(0.5),
        normalize_punctuation: rng.random_bool(0.5),
        end_with_eol: rng.random_bool(0.5),
        restore_half_space: rng.random_bool(0.5),
        normalize_characters: rng.random_bool(0.5),
        remove_punctuation: rng.random_bool(0.3),
        lowercase: rng.random_bool(0.3),
        ..Default::default()
    };
    if rng.random_bool(0.5) {
        let lang = ["en", "fa", "xx"][rng.random_range(0..3)];
        cfg = cfg.with_int_to_word(lang);
    }
    if rng.random_bool(0.3) {
        cfg = cfg.with_digit_script(DigitScript::ALL[rng.random_range(0..3)]);
    }
    cfg
}

#[test]
fn test_normalize_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..20_000 {
        let text = random_text(&mut rng);
        let cfg = random_config(&mut rng);
        let once = normalize_text(&text, &cfg);
        let twice = normalize_text(&once, &cfg);
        assert_eq!(once, twice, "input {:?} with {:?}", text, cfg);
    }
}

#[test]
fn test_combined_spaces_never_repeat() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..5000 {
        let text = random_text(&mut rng);
        let mut cfg = random_config(&mut rng);
        cfg.combine_space = true;
        let out = normalize_text(&text, &cfg);
        let chars: Vec<char> = out.chars().collect();
        for pair in chars.windows(2) {
            assert!(
                !(pair[0].is_whitespace() && pair[1].is_whitespace()),
                "{:?} -> {:?}",
                text,
                out
            );
        }
    }
}

#[test]
fn test_folded_urls_and_trailing_tabs_are_stable() {
    let punct = NormalizationConfig::default()
        .with_remove_url()
        .with_normalize_punctuation();
    let chars = NormalizationConfig::default()
        .with_remove_url()
        .with_normalize_characters();
    let eol = NormalizationConfig::default()
        .with_combine_space()
        .with_end_with_eol();
    let cases = [
        ("see www\u{FF0E}example\u{FF0E}com now", &punct),
        ("http\u{FF1A}//example.com", &punct),
        ("see ww\u{200d}w.example.com now", &chars),
        ("\u{6f0}x\t", &eol),
        ("'0\t", &eol),
    ];
    for (text, cfg) in cases {
        let once = normalize_text(text, cfg);
        assert_eq!(normalize_text(&once, cfg), once, "input {:?}", text);
    }
}

#[test]
fn test_half_space_round_trip() {
    let to_space = NormalizationConfig::default().with_convert_half_space();
    let to_half = NormalizationConfig::default().with_restore_half_space();
    for word in ["می\u{200c}روم", "نمی\u{200c}دانم", "کتاب\u{200c}ها", "بزرگ\u{200c}ترین"] {
        let spaced = normalize_text(word, &to_space);
        assert!(!spaced.contains('\u{200c}'));
        assert_eq!(normalize_text(&spaced, &to_half), word);
    }
}

#[test]
fn test_url_example() {
    let cfg = NormalizationConfig::default()
        .with_remove_url()
        .with_combine_space();
    assert_eq!(normalize_text("see http://example.com now", &cfg), "see now");
}

#[test]
fn test_price_detection() {
    let text = "قیمت ۱۲۳۴ تومان";
    let matches = detect_numbers(text);
    assert_eq!(matches.len(), 1);
    let m = &matches[0];
    assert_eq!(m.value, Some(1234));
    let sub: String = text.chars().skip(m.start).take(m.end - m.start).collect();
    assert_eq!(parse_digits(&sub).unwrap(), 1234);
}

#[test]
fn test_matches_are_ordered_and_disjoint() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..1000 {
        let text = random_text(&mut rng);
        let matches = detect_all(&text);
        for pair in matches.windows(2) {
            assert!(pair[0].end <= pair[1].start, "{:?}: {:?}", text, matches);
        }
        for m in detect_numbers(&text) {
            assert!(matches!(m.source, NumberSource::Digits(_)));
            if let Some(v) = m.value {
                assert_eq!(parse_digits(m.as_str(&text)).unwrap(), v);
            }
        }
    }
}

#[test]
fn test_cosine_properties() {
    let mut rng = StdRng::seed_from_u64(11);
    let vocab = ["سیب", "موز", "کتاب", "a", "b"];
    let zero = TermVector::default();
    for _ in 0..500 {
        let draw = |rng: &mut StdRng| {
            let n = rng.random_range(1..8);
            TermVector::from_terms((0..n).map(|_| vocab[rng.random_range(0..vocab.len())]))
        };
        let a = draw(&mut rng);
        let b = draw(&mut rng);
        let s = a.cosine(&b);
        assert!((0.0..=1.0).contains(&s));
        assert!((s - b.cosine(&a)).abs() < 1e-12);
        assert!((a.cosine(&a) - 1.0).abs() < 1e-12);
        assert_eq!(a.cosine(&zero), 0.0);
    }
}

#[test]
fn test_cosine_shape_validation() {
    let q = |s: &str| s.split_whitespace().map(str::to_string).collect::<Vec<_>>();
    let queries = vec![q("a b"), q("c")];
    let batches = vec![vec![q("a"), q("b")], vec![q("c")]];
    let err = cosine_similarity(&queries, &batches).unwrap_err();
    assert!(err.is_shape_error());
    assert_eq!(
        err,
        Error::RowCountMismatch {
            batch: 1,
            expected: 2,
            actual: 1
        }
    );
}

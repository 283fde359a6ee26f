//! C ABI.
//!
//! Every entry point returns a status code and writes its result through an
//! out-pointer. Buffers handed out here are owned by this library and must be
//! given back to the matching `farsi_norm_free_*` function. Panics are caught
//! and reported as [`FARSI_NORM_PANIC`].

use crate::error::{Error, Result};
use crate::normalize::{NormalizationConfig, Normalizer};
use crate::numbers::detect_numbers;
use crate::similarity::SimilarityScorer;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use tracing::{error, warn};

pub const FARSI_NORM_OK: i32 = 0;
pub const FARSI_NORM_NULL_ARGUMENT: i32 = 1;
pub const FARSI_NORM_INVALID_UTF8: i32 = 2;
pub const FARSI_NORM_SHAPE: i32 = 3;
pub const FARSI_NORM_OUT_OF_RANGE: i32 = 4;
pub const FARSI_NORM_INTERIOR_NUL: i32 = 5;
pub const FARSI_NORM_PANIC: i32 = 6;

/// Index-aligned arrays of `count` entries each. Overflowed runs have
/// `overflowed[i] == true` and `values[i] == 0`.
#[repr(C)]
#[derive(Debug)]
pub struct NumberMatches {
    pub values: *mut i64,
    pub start_indices: *mut i32,
    pub end_indices: *mut i32,
    pub overflowed: *mut bool,
    pub count: i32,
}

impl NumberMatches {
    fn empty() -> Self {
        NumberMatches {
            values: ptr::null_mut(),
            start_indices: ptr::null_mut(),
            end_indices: ptr::null_mut(),
            overflowed: ptr::null_mut(),
            count: 0,
        }
    }
}

fn guard<F>(name: &'static str, f: F) -> i32
where
    F: FnOnce() -> Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => FARSI_NORM_OK,
        Ok(Err(err)) => {
            warn!(call = name, code = err.code(), "{}", err);
            err.code()
        }
        Err(_) => {
            error!(call = name, "panic caught at the C boundary");
            FARSI_NORM_PANIC
        }
    }
}

unsafe fn read_str<'a>(ptr: *const c_char, name: &'static str) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(Error::NullArgument(name));
    }
    Ok(CStr::from_ptr(ptr).to_str()?)
}

fn to_i32(n: usize) -> Result<i32> {
    i32::try_from(n).map_err(|_| Error::OffsetOutOfRange(n))
}

fn to_usize(n: i32) -> Result<usize> {
    usize::try_from(n).map_err(|_| Error::OffsetOutOfRange(n.unsigned_abs() as usize))
}

fn into_raw_buffer<T>(items: Vec<T>) -> *mut T {
    if items.is_empty() {
        return ptr::null_mut();
    }
    Box::into_raw(items.into_boxed_slice()) as *mut T
}

unsafe fn free_raw_buffer<T>(ptr: *mut T, len: usize) {
    if !ptr.is_null() {
        drop(Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, len)));
    }
}

/// Normalize `text` and store a newly allocated string in `*out`.
///
/// # Safety
///
/// `text` must be a valid NUL-terminated string, `number_language` either
/// null or a valid NUL-terminated string, and `out` a valid pointer. The
/// string written to `*out` must be released with
/// [`farsi_norm_free_string`].
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn farsi_norm_normalize_text(
    text: *const c_char,
    convert_half_space: bool,
    combine_space: bool,
    remove_outer_space: bool,
    remove_url: bool,
    normalize_punctuation: bool,
    end_with_eol: bool,
    int_to_word: bool,
    number_language: *const c_char,
    out: *mut *mut c_char,
) -> i32 {
    guard("normalize_text", || {
        if out.is_null() {
            return Err(Error::NullArgument("out"));
        }
        *out = ptr::null_mut();

        let text = read_str(text, "text")?;
        let number_language = if number_language.is_null() {
            None
        } else {
            Some(read_str(number_language, "number_language")?.to_string())
        };
        let config = NormalizationConfig {
            convert_half_space,
            combine_space,
            remove_outer_space,
            remove_url,
            normalize_punctuation,
            end_with_eol,
            int_to_word,
            number_language,
            ..Default::default()
        };

        let normalized = Normalizer::new(config).normalize(text);
        let c_string = CString::new(normalized).map_err(|_| Error::InteriorNul)?;
        *out = c_string.into_raw();
        Ok(())
    })
}

/// Release a string returned by [`farsi_norm_normalize_text`].
///
/// # Safety
///
/// `s` must be null or a pointer obtained from this library that has not been
/// freed yet.
#[no_mangle]
pub unsafe extern "C" fn farsi_norm_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Detect numeral runs in `text`. Offsets are rune indices, end exclusive.
///
/// # Safety
///
/// `text` must be a valid NUL-terminated string and `out` a valid pointer.
/// The arrays written to `*out` must be released with
/// [`farsi_norm_free_number_matches`].
#[no_mangle]
pub unsafe extern "C" fn farsi_norm_detect_persian_numbers(
    text: *const c_char,
    out: *mut NumberMatches,
) -> i32 {
    guard("detect_persian_numbers", || {
        if out.is_null() {
            return Err(Error::NullArgument("out"));
        }
        *out = NumberMatches::empty();

        let text = read_str(text, "text")?;
        let matches = detect_numbers(text);

        let mut values = Vec::with_capacity(matches.len());
        let mut starts = Vec::with_capacity(matches.len());
        let mut ends = Vec::with_capacity(matches.len());
        let mut overflowed = Vec::with_capacity(matches.len());
        for m in &matches {
            values.push(m.value.unwrap_or(0));
            starts.push(to_i32(m.start)?);
            ends.push(to_i32(m.end)?);
            overflowed.push(m.is_overflow());
        }
        let count = to_i32(matches.len())?;

        *out = NumberMatches {
            values: into_raw_buffer(values),
            start_indices: into_raw_buffer(starts),
            end_indices: into_raw_buffer(ends),
            overflowed: into_raw_buffer(overflowed),
            count,
        };
        Ok(())
    })
}

/// Release the arrays of a [`NumberMatches`] and reset it to empty.
///
/// # Safety
///
/// `matches` must be null or point to a value filled by
/// [`farsi_norm_detect_persian_numbers`] whose arrays have not been freed.
#[no_mangle]
pub unsafe extern "C" fn farsi_norm_free_number_matches(matches: *mut NumberMatches) {
    if matches.is_null() {
        return;
    }
    let m = &mut *matches;
    let len = usize::try_from(m.count).unwrap_or(0);
    free_raw_buffer(m.values, len);
    free_raw_buffer(m.start_indices, len);
    free_raw_buffer(m.end_indices, len);
    free_raw_buffer(m.overflowed, len);
    *m = NumberMatches::empty();
}

/// Count the rows of a NULL-terminated batch, reading at most
/// `expected + 1` entries.
unsafe fn read_batch(
    batch: *const *const c_char,
    index: usize,
    expected: usize,
) -> Result<Vec<Vec<String>>> {
    if batch.is_null() {
        return Err(Error::NullArgument("candidate_batches"));
    }
    let mut rows = Vec::with_capacity(expected);
    for i in 0..=expected {
        let row = *batch.add(i);
        if row.is_null() {
            break;
        }
        if i == expected {
            // more rows than declared; the real count is at least this
            return Err(Error::RowCountMismatch {
                batch: index,
                expected,
                actual: expected + 1,
            });
        }
        rows.push(split_terms(read_str(row, "candidate row")?));
    }
    if rows.len() != expected {
        return Err(Error::RowCountMismatch {
            batch: index,
            expected,
            actual: rows.len(),
        });
    }
    Ok(rows)
}

fn split_terms(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

/// Cosine similarity of each query against its merged candidate batch.
///
/// `queries` holds `query_count` strings, `candidate_batches` holds
/// `batch_count` NULL-terminated arrays of `rows_per_batch` strings each.
/// Strings are split on whitespace into terms. On success `*out` receives
/// `query_count` scores.
///
/// # Safety
///
/// The arrays must be valid for the declared lengths (each batch for
/// `rows_per_batch + 1` entries or up to its NULL terminator), every string
/// NUL-terminated, and `out` a valid pointer. The scores must be released
/// with [`farsi_norm_free_scores`].
#[no_mangle]
pub unsafe extern "C" fn farsi_norm_cosine_similarity(
    queries: *const *const c_char,
    candidate_batches: *const *const *const c_char,
    query_count: i32,
    batch_count: i32,
    rows_per_batch: i32,
    out: *mut *mut f64,
) -> i32 {
    guard("cosine_similarity", || {
        if out.is_null() {
            return Err(Error::NullArgument("out"));
        }
        *out = ptr::null_mut();

        let query_count = to_usize(query_count)?;
        let batch_count = to_usize(batch_count)?;
        let rows_per_batch = to_usize(rows_per_batch)?;
        if query_count != batch_count {
            return Err(Error::QueryCountMismatch {
                queries: query_count,
                batches: batch_count,
            });
        }
        if query_count > 0 && (queries.is_null() || candidate_batches.is_null()) {
            return Err(Error::NullArgument("queries"));
        }

        let mut query_terms = Vec::with_capacity(query_count);
        let mut batches = Vec::with_capacity(batch_count);
        for i in 0..query_count {
            query_terms.push(split_terms(read_str(*queries.add(i), "query")?));
            batches.push(read_batch(*candidate_batches.add(i), i, rows_per_batch)?);
        }

        let scores = SimilarityScorer::default().score_batches(
            &query_terms,
            &batches,
            Some(rows_per_batch),
        )?;
        *out = into_raw_buffer(scores);
        Ok(())
    })
}

/// Release scores returned by [`farsi_norm_cosine_similarity`].
///
/// # Safety
///
/// `scores` must be null or a pointer obtained from this library together
/// with the `len` it was returned with.
#[no_mangle]
pub unsafe extern "C" fn farsi_norm_free_scores(scores: *mut f64, len: i32) {
    free_raw_buffer(scores, usize::try_from(len).unwrap_or(0));
}

//! Term-frequency cosine similarity plus two lexical scores.
//!
//! Terms are compared verbatim; run them through the normalizer first.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Occurrence count per term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermVector {
    counts: HashMap<String, u64>,
}

impl TermVector {
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts = HashMap::new();
        for term in terms {
            *counts.entry(term.as_ref().to_string()).or_insert(0) += 1;
        }
        TermVector { counts }
    }

    pub fn from_text(text: &str) -> Self {
        Self::from_terms(text.split_whitespace())
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count(&self, term: &str) -> u64 {
        self.counts.get(term).copied().unwrap_or(0)
    }

    /// Add the counts of `other` into `self`.
    pub fn merge(&mut self, other: &TermVector) {
        for (term, n) in &other.counts {
            *self.counts.entry(term.clone()).or_insert(0) += n;
        }
    }

    pub fn dot(&self, other: &TermVector) -> f64 {
        let (small, large) = if self.counts.len() <= other.counts.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .counts
            .iter()
            .map(|(term, n)| *n as f64 * large.count(term) as f64)
            .sum()
    }

    pub fn norm_squared(&self) -> f64 {
        self.counts.values().map(|n| (*n as f64) * (*n as f64)).sum()
    }

    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Cosine of the angle between the two vectors, in `[0, 1]`. Zero when
    /// either side has no terms.
    pub fn cosine(&self, other: &TermVector) -> f64 {
        let denom = self.norm_squared() * other.norm_squared();
        if denom == 0.0 {
            return 0.0;
        }
        (self.dot(other) / denom.sqrt()).clamp(0.0, 1.0)
    }
}

/// How the rows of one candidate batch are compared with its query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// The rows form one composite document.
    #[default]
    Merged,
    /// Each row is scored on its own and the best score is kept.
    BestRow,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityRequest {
    pub queries: Vec<Vec<String>>,
    pub candidates: Vec<Vec<Vec<String>>>,
    /// Expected row count of every batch; inferred from the first batch when
    /// absent.
    #[serde(default)]
    pub rows_per_batch: Option<usize>,
    #[serde(default)]
    pub mode: BatchMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub scores: Vec<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityScorer {
    mode: BatchMode,
}

impl SimilarityScorer {
    pub fn new(mode: BatchMode) -> Self {
        SimilarityScorer { mode }
    }

    /// Score a request; its own `mode` overrides the scorer's.
    pub fn score(&self, request: &SimilarityRequest) -> Result<SimilarityResult> {
        let scorer = SimilarityScorer::new(request.mode);
        let scores = scorer.score_batches(
            &request.queries,
            &request.candidates,
            request.rows_per_batch,
        )?;
        Ok(SimilarityResult { scores })
    }

    /// One score per query against its batch of candidate rows.
    pub fn score_batches<Q, R>(
        &self,
        queries: &[Q],
        batches: &[Vec<R>],
        rows_per_batch: Option<usize>,
    ) -> Result<Vec<f64>>
    where
        Q: AsRef<[String]>,
        R: AsRef<[String]>,
    {
        validate_shape(queries.len(), batches, rows_per_batch)?;

        let scores: Vec<f64> = queries
            .iter()
            .zip(batches)
            .map(|(query, batch)| {
                let q = TermVector::from_terms(query.as_ref());
                self.score_batch(&q, batch)
            })
            .collect();

        debug!(queries = scores.len(), mode = ?self.mode, "scored similarity batches");
        Ok(scores)
    }

    fn score_batch<R: AsRef<[String]>>(&self, query: &TermVector, batch: &[R]) -> f64 {
        match self.mode {
            BatchMode::Merged => {
                let mut doc = TermVector::default();
                for row in batch {
                    doc.merge(&TermVector::from_terms(row.as_ref()));
                }
                query.cosine(&doc)
            }
            BatchMode::BestRow => batch
                .iter()
                .map(|row| query.cosine(&TermVector::from_terms(row.as_ref())))
                .fold(0.0, f64::max),
        }
    }
}

/// Check that there is one batch per query and every batch holds the same
/// number of rows.
pub fn validate_shape<R>(
    query_count: usize,
    batches: &[Vec<R>],
    rows_per_batch: Option<usize>,
) -> Result<()> {
    if query_count != batches.len() {
        return Err(Error::QueryCountMismatch {
            queries: query_count,
            batches: batches.len(),
        });
    }
    let expected = match rows_per_batch.or_else(|| batches.first().map(Vec::len)) {
        Some(n) => n,
        None => return Ok(()),
    };
    for (batch, rows) in batches.iter().enumerate() {
        if rows.len() != expected {
            return Err(Error::RowCountMismatch {
                batch,
                expected,
                actual: rows.len(),
            });
        }
    }
    Ok(())
}

/// Cosine similarity of each query against its merged candidate batch.
pub fn cosine_similarity(
    queries: &[Vec<String>],
    batches: &[Vec<Vec<String>>],
) -> Result<Vec<f64>> {
    SimilarityScorer::default().score_batches(queries, batches, None)
}

fn char_bigrams(text: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = text.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

fn jaccard(query: &HashSet<(char, char)>, candidate: &str) -> f64 {
    let other = char_bigrams(candidate);
    let intersection = query.intersection(&other).count();
    let union = query.len() + other.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Best character-bigram Jaccard score of each query over its candidates.
pub fn jaccard_similarity(queries: &[String], candidates: &[Vec<String>]) -> Result<Vec<f64>> {
    if queries.len() != candidates.len() {
        return Err(Error::QueryCountMismatch {
            queries: queries.len(),
            batches: candidates.len(),
        });
    }
    Ok(queries
        .iter()
        .zip(candidates)
        .map(|(query, set)| {
            let q = char_bigrams(query);
            if q.is_empty() {
                return 0.0;
            }
            set.iter().map(|c| jaccard(&q, c)).fold(0.0, f64::max)
        })
        .collect())
}

/// Length in characters of the longest common subsequence of `a` and `b`.
pub fn lcs_len(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Longest common subsequence of each query with its best candidate.
pub fn longest_common_subsequence(
    queries: &[String],
    candidates: &[Vec<String>],
) -> Result<Vec<usize>> {
    if queries.len() != candidates.len() {
        return Err(Error::QueryCountMismatch {
            queries: queries.len(),
            batches: candidates.len(),
        });
    }
    Ok(queries
        .iter()
        .zip(candidates)
        .map(|(query, set)| set.iter().map(|c| lcs_len(query, c)).max().unwrap_or(0))
        .collect())
}

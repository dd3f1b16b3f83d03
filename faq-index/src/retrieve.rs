//! Retrieval policy: nearest neighbour plus the validity rules for accepting it.

use std::fmt;

use tracing::debug;

use crate::errors::IndexError;
use crate::record::{FaqEntry, SearchHit};
use crate::store::FaqStore;

/// Accepted best match.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchedEntry {
    pub index: usize,
    pub distance: f32,
    pub entry: FaqEntry,
}

/// Why the best candidate was not accepted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NotFoundReason {
    /// The search produced no candidate at all.
    NoCandidate,
    /// Candidate position is outside the lookup table.
    OutOfRange { index: usize, len: usize },
    /// Candidate is farther than the configured threshold.
    TooFar { distance: f32, max_distance: f32 },
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::NoCandidate => f.write_str("no candidate"),
            NotFoundReason::OutOfRange { index, len } => {
                write!(f, "candidate {index} outside lookup table of {len}")
            }
            NotFoundReason::TooFar {
                distance,
                max_distance,
            } => write!(f, "distance {distance} exceeds {max_distance}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MatchOutcome {
    Found(MatchedEntry),
    NotFound(NotFoundReason),
}

/// Nearest-neighbour retriever with an optional distance threshold.
///
/// Without a threshold any in-range nearest entry is accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Retriever {
    pub max_distance: Option<f32>,
}

impl Retriever {
    pub fn new(max_distance: Option<f32>) -> Self {
        Self { max_distance }
    }

    /// Top-`k` hits, closest first.
    ///
    /// # Errors
    /// [`IndexError::DimensionMismatch`] for a query of the wrong width.
    pub fn search(
        &self,
        store: &FaqStore,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<SearchHit>, IndexError> {
        store.index().search(query, k)
    }

    /// Searches with k = 1 and applies the validity policy.
    ///
    /// # Errors
    /// Only search errors; an unacceptable candidate is `Ok(NotFound)`.
    pub fn best_match(&self, store: &FaqStore, query: &[f32]) -> Result<MatchOutcome, IndexError> {
        let hit = self.search(store, query, 1)?.into_iter().next();
        let outcome = match self.validate(hit, store.len()) {
            Ok(h) => match store.entry(h.index) {
                Some(entry) => MatchOutcome::Found(MatchedEntry {
                    index: h.index,
                    distance: h.distance,
                    entry: entry.clone(),
                }),
                None => MatchOutcome::NotFound(NotFoundReason::OutOfRange {
                    index: h.index,
                    len: store.len(),
                }),
            },
            Err(reason) => MatchOutcome::NotFound(reason),
        };
        debug!(?outcome, "best match resolved");
        Ok(outcome)
    }

    /// Applies the acceptance rules to a raw candidate.
    pub fn validate(&self, hit: Option<SearchHit>, len: usize) -> Result<SearchHit, NotFoundReason> {
        let hit = hit.ok_or(NotFoundReason::NoCandidate)?;
        if hit.index >= len {
            return Err(NotFoundReason::OutOfRange {
                index: hit.index,
                len,
            });
        }
        if let Some(max_distance) = self.max_distance {
            // NaN compares false both ways; it must not pass the threshold.
            if hit.distance.is_nan() || hit.distance > max_distance {
                return Err(NotFoundReason::TooFar {
                    distance: hit.distance,
                    max_distance,
                });
            }
        }
        Ok(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SimilarityIndex;
    use crate::record::EmbeddingInput;

    fn store() -> FaqStore {
        let mut idx = SimilarityIndex::new(2);
        idx.add(&[0.0, 0.0]).unwrap();
        idx.add(&[1.0, 1.0]).unwrap();
        let lookup = vec![
            FaqEntry {
                question: "What is COVID-19?".into(),
                answer: "A viral respiratory illness.".into(),
            },
            FaqEntry {
                question: "Is there a vaccine?".into(),
                answer: "Yes.".into(),
            },
        ];
        FaqStore::new(idx, lookup, EmbeddingInput::QuestionAndAnswer, "m").unwrap()
    }

    #[test]
    fn unconditional_match_without_threshold() {
        let r = Retriever::default();
        let out = r.best_match(&store(), &[50.0, 50.0]).unwrap();
        match out {
            MatchOutcome::Found(m) => assert_eq!(m.index, 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn threshold_rejects_far_queries() {
        let r = Retriever::new(Some(0.5));
        let out = r.best_match(&store(), &[10.0, 10.0]).unwrap();
        assert!(matches!(out, MatchOutcome::NotFound(NotFoundReason::TooFar { .. })));
    }

    #[test]
    fn threshold_is_inclusive() {
        let r = Retriever::new(Some(2.0));
        let out = r.best_match(&store(), &[1.0, -1.0]).unwrap();
        assert!(matches!(out, MatchOutcome::Found(MatchedEntry { index: 0, .. })));
    }

    #[test]
    fn absent_or_out_of_range_hits_are_not_found() {
        let r = Retriever::default();
        assert_eq!(r.validate(None, 3), Err(NotFoundReason::NoCandidate));
        let stray = SearchHit {
            index: 3,
            distance: 0.0,
        };
        assert_eq!(
            r.validate(Some(stray), 3),
            Err(NotFoundReason::OutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn nan_distance_is_rejected_under_threshold() {
        let r = Retriever::new(Some(10.0));
        let hit = SearchHit {
            index: 0,
            distance: f32::NAN,
        };
        assert!(matches!(
            r.validate(Some(hit), 2),
            Err(NotFoundReason::TooFar { .. })
        ));
    }

    #[test]
    fn exact_query_hits_its_entry() {
        let r = Retriever::new(Some(0.0));
        let out = r.best_match(&store(), &[1.0, 1.0]).unwrap();
        match out {
            MatchOutcome::Found(m) => {
                assert_eq!(m.distance, 0.0);
                assert_eq!(m.entry.answer, "Yes.");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

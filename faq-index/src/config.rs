//! Index paths and build/retrieval knobs loaded from environment variables.

use std::path::PathBuf;

use ai_llm_service::error_handler::env_opt;

use crate::errors::IndexError;
use crate::record::EmbeddingInput;

pub const DEFAULT_INDEX_PATH: &str = "data/faq_index.bin";
pub const DEFAULT_LOOKUP_PATH: &str = "data/faq_data.json";
pub const DEFAULT_CORPUS_PATH: &str = "data/faq_bank.jsonl";
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Configuration for index building, loading and retrieval.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexConfig {
    /// Bincode index blob (`FAQ_INDEX_PATH`).
    pub index_path: PathBuf,
    /// JSON lookup table (`FAQ_LOOKUP_PATH`).
    pub lookup_path: PathBuf,
    /// JSONL corpus read by the builder (`FAQ_CORPUS_PATH`).
    pub corpus_path: PathBuf,
    /// Embedder input policy for builds (`FAQ_EMBEDDING_INPUT`).
    pub embedding_input: EmbeddingInput,
    /// Parallel embedding requests during builds (`EMBEDDING_CONCURRENCY`).
    pub concurrency: usize,
    /// Optional acceptance threshold on squared L2 distance (`FAQ_MAX_DISTANCE`).
    pub max_distance: Option<f32>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_path: DEFAULT_INDEX_PATH.into(),
            lookup_path: DEFAULT_LOOKUP_PATH.into(),
            corpus_path: DEFAULT_CORPUS_PATH.into(),
            embedding_input: EmbeddingInput::default(),
            concurrency: DEFAULT_CONCURRENCY,
            max_distance: None,
        }
    }
}

impl IndexConfig {
    /// Builds the config from the process environment.
    ///
    /// # Errors
    /// [`IndexError::Config`] for unparsable or out-of-range values.
    pub fn from_env() -> Result<Self, IndexError> {
        Self::from_lookup(&env_opt)
    }

    /// Builds the config through an arbitrary variable lookup.
    pub fn from_lookup(get: &dyn Fn(&str) -> Option<String>) -> Result<Self, IndexError> {
        let d = Self::default();
        let cfg = Self {
            index_path: get("FAQ_INDEX_PATH").map(PathBuf::from).unwrap_or(d.index_path),
            lookup_path: get("FAQ_LOOKUP_PATH").map(PathBuf::from).unwrap_or(d.lookup_path),
            corpus_path: get("FAQ_CORPUS_PATH").map(PathBuf::from).unwrap_or(d.corpus_path),
            embedding_input: match get("FAQ_EMBEDDING_INPUT") {
                Some(v) => v.parse()?,
                None => d.embedding_input,
            },
            concurrency: parse(get, "EMBEDDING_CONCURRENCY")?.unwrap_or(d.concurrency),
            max_distance: parse(get, "FAQ_MAX_DISTANCE")?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.index_path == self.lookup_path {
            return Err(IndexError::Config(
                "FAQ_INDEX_PATH and FAQ_LOOKUP_PATH must differ".into(),
            ));
        }
        if self.concurrency == 0 {
            return Err(IndexError::Config("EMBEDDING_CONCURRENCY must be > 0".into()));
        }
        if let Some(d) = self.max_distance {
            if !d.is_finite() || d < 0.0 {
                return Err(IndexError::Config(
                    "FAQ_MAX_DISTANCE must be a finite, non-negative number".into(),
                ));
            }
        }
        Ok(())
    }
}

fn parse<T: std::str::FromStr>(
    get: &dyn Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, IndexError> {
    get(key)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| IndexError::Config(format!("{key}: cannot parse `{v}`")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply() {
        let cfg = IndexConfig::from_lookup(&lookup(&[])).unwrap();
        assert_eq!(cfg, IndexConfig::default());
        assert_eq!(cfg.embedding_input, EmbeddingInput::QuestionAndAnswer);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = IndexConfig::from_lookup(&lookup(&[
            ("FAQ_INDEX_PATH", "/srv/idx.bin"),
            ("FAQ_EMBEDDING_INPUT", "question"),
            ("EMBEDDING_CONCURRENCY", "8"),
            ("FAQ_MAX_DISTANCE", "0.75"),
        ]))
        .unwrap();
        assert_eq!(cfg.index_path, PathBuf::from("/srv/idx.bin"));
        assert_eq!(cfg.embedding_input, EmbeddingInput::Question);
        assert_eq!(cfg.concurrency, 8);
        assert_eq!(cfg.max_distance, Some(0.75));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(IndexConfig::from_lookup(&lookup(&[("EMBEDDING_CONCURRENCY", "0")])).is_err());
        assert!(IndexConfig::from_lookup(&lookup(&[("FAQ_MAX_DISTANCE", "-1")])).is_err());
        assert!(IndexConfig::from_lookup(&lookup(&[("FAQ_MAX_DISTANCE", "far")])).is_err());
    }
}

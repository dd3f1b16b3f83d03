//! FAQ retrieval core: corpus ingestion, flat L2 index, persistence, retrieval.
//!
//! This crate provides a small API to:
//! - Build an index offline from a JSONL corpus with any [`EmbeddingsProvider`]
//! - Persist and reload the index/lookup pair as one atomic unit
//! - Retrieve the nearest FAQ entry for a query vector under a validity policy
//!
//! The lookup table position of an entry is always its index position.

pub mod builder;
pub mod config;
pub mod embed;
mod embed_pool;
mod errors;
pub mod index;
pub mod io_jsonl;
mod record;
pub mod retrieve;
pub mod store;

pub use builder::{BuildOptions, build, build_from_config};
pub use config::IndexConfig;
pub use embed::{EmbeddingsProvider, llm::LlmEmbedder, probe_dimension};
pub use errors::IndexError;
pub use index::SimilarityIndex;
pub use record::{CorpusRow, EmbeddingInput, FaqEntry, SearchHit};
pub use retrieve::{MatchOutcome, MatchedEntry, NotFoundReason, Retriever};
pub use store::{FaqStore, IndexHeader};

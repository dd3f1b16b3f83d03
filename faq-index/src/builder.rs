//! Offline index builder: corpus rows → aligned similarity index + lookup table.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::config::IndexConfig;
use crate::embed::EmbeddingsProvider;
use crate::embed_pool::embed_all;
use crate::errors::IndexError;
use crate::index::SimilarityIndex;
use crate::io_jsonl::read_corpus;
use crate::record::{CorpusRow, EmbeddingInput, FaqEntry};
use crate::store::FaqStore;

/// Knobs for a single build.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    pub embedding_input: EmbeddingInput,
    pub concurrency: usize,
    /// Model name recorded in the index header.
    pub embedding_model: String,
    /// Draw an `indicatif` bar while embedding (CLI only).
    pub show_progress: bool,
}

impl BuildOptions {
    pub fn from_config(cfg: &IndexConfig, embedding_model: impl Into<String>) -> Self {
        Self {
            embedding_input: cfg.embedding_input,
            concurrency: cfg.concurrency,
            embedding_model: embedding_model.into(),
            show_progress: false,
        }
    }
}

/// Keeps rows with a non-blank question, in corpus order.
///
/// A missing answer becomes the empty string.
pub fn retain_rows(rows: Vec<CorpusRow>) -> Vec<FaqEntry> {
    let total = rows.len();
    let kept: Vec<FaqEntry> = rows
        .into_iter()
        .filter_map(|r| {
            let question = r.question.filter(|q| !q.trim().is_empty())?;
            Some(FaqEntry {
                question,
                answer: r.answer.unwrap_or_default(),
            })
        })
        .collect();
    debug!(total, kept = kept.len(), "filtered corpus rows");
    kept
}

/// Embeds the retained rows and returns the in-memory store.
///
/// Entry `i` of the lookup table always owns vector `i` of the index.
///
/// # Errors
/// - [`IndexError::CorpusEmpty`] if no row survives filtering.
/// - Embedding failures and [`IndexError::VectorSizeMismatch`].
pub async fn build(
    rows: Vec<CorpusRow>,
    embedder: &dyn EmbeddingsProvider,
    opts: &BuildOptions,
) -> Result<FaqStore, IndexError> {
    let lookup = retain_rows(rows);
    if lookup.is_empty() {
        return Err(IndexError::CorpusEmpty);
    }

    let texts: Vec<String> = lookup
        .iter()
        .map(|e| opts.embedding_input.text_for(e))
        .collect();

    let pb = opts.show_progress.then(|| progress_bar(texts.len() as u64));
    let vectors = embed_all(&texts, embedder, None, opts.concurrency, pb.as_ref()).await?;
    if let Some(pb) = &pb {
        pb.finish_with_message("embedded");
    }

    let dim = vectors.first().map(Vec::len).unwrap_or_default();
    if dim == 0 {
        return Err(IndexError::ModelUnavailable(
            "embedder returned zero-length vectors".into(),
        ));
    }
    let mut index = SimilarityIndex::new(dim);
    for v in &vectors {
        index.add(v)?;
    }

    info!(
        entries = lookup.len(),
        dim,
        embedding_input = %opts.embedding_input,
        "FAQ index built"
    );
    FaqStore::new(index, lookup, opts.embedding_input, opts.embedding_model.clone())
}

/// Reads the corpus named in `cfg`, builds, and persists both artifacts.
///
/// Nothing is written when the build fails.
pub async fn build_from_config(
    cfg: &IndexConfig,
    embedder: &dyn EmbeddingsProvider,
    opts: &BuildOptions,
) -> Result<FaqStore, IndexError> {
    let rows = read_corpus(&cfg.corpus_path)?;
    let store = build(rows, embedder, opts).await?;
    store.persist(&cfg.index_path, &cfg.lookup_path)?;
    Ok(store)
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>4}/{len:4} {msg}") {
        pb.set_style(style);
    }
    pb
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::embed::testing::TableEmbedder;
    use tempfile::tempdir;

    fn row(q: Option<&str>, a: Option<&str>) -> CorpusRow {
        CorpusRow {
            question: q.map(str::to_string),
            answer: a.map(str::to_string),
        }
    }

    fn opts(input: EmbeddingInput) -> BuildOptions {
        BuildOptions {
            embedding_input: input,
            concurrency: 2,
            embedding_model: "test-model".into(),
            show_progress: false,
        }
    }

    #[test]
    fn drops_blank_questions_and_keeps_order() {
        let kept = retain_rows(vec![
            row(Some("first"), Some("1")),
            row(Some("   "), Some("x")),
            row(None, Some("y")),
            row(Some("second"), None),
        ]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].question, "first");
        assert_eq!(kept[1].question, "second");
        assert_eq!(kept[1].answer, "");
    }

    #[tokio::test]
    async fn single_entry_corpus_builds_aligned_store() {
        let e = TableEmbedder::new(
            &[(
                "What is COVID-19? A viral respiratory illness.",
                vec![1.0, 0.0, 0.0],
            )],
            vec![0.0, 0.0, 0.0],
        );
        let store = build(
            vec![row(Some("What is COVID-19?"), Some("A viral respiratory illness."))],
            &e,
            &opts(EmbeddingInput::QuestionAndAnswer),
        )
        .await
        .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.index().len(), 1);
        assert_eq!(store.index().vector(0), Some(&[1.0, 0.0, 0.0][..]));
        assert_eq!(store.header().embedding_model, "test-model");
    }

    #[tokio::test]
    async fn question_policy_embeds_question_only() {
        let e = TableEmbedder::new(&[("q", vec![5.0, 5.0])], vec![0.0, 0.0]);
        let store = build(vec![row(Some("q"), Some("a"))], &e, &opts(EmbeddingInput::Question))
            .await
            .unwrap();
        assert_eq!(store.index().vector(0), Some(&[5.0, 5.0][..]));
        assert_eq!(store.header().embedding_input, EmbeddingInput::Question);
    }

    #[tokio::test]
    async fn empty_corpus_writes_nothing() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("faq_bank.jsonl");
        fs::write(&corpus, "{\"question\":\"  \",\"answer\":\"a\"}\n{\"answer\":\"b\"}\n").unwrap();
        let cfg = IndexConfig {
            corpus_path: corpus,
            index_path: dir.path().join("faq_index.bin"),
            lookup_path: dir.path().join("faq_data.json"),
            ..IndexConfig::default()
        };
        let e = TableEmbedder::new(&[], vec![1.0]);

        let err = build_from_config(&cfg, &e, &opts(EmbeddingInput::QuestionAndAnswer))
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::CorpusEmpty));
        assert!(!cfg.index_path.exists());
        assert!(!cfg.lookup_path.exists());
        assert_eq!(e.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn build_from_config_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("faq_bank.jsonl");
        fs::write(
            &corpus,
            "{\"question\":\"a\",\"answer\":\"1\"}\n{\"question\":\"b\",\"answer\":\"2\"}\n",
        )
        .unwrap();
        let cfg = IndexConfig {
            corpus_path: corpus,
            index_path: dir.path().join("faq_index.bin"),
            lookup_path: dir.path().join("faq_data.json"),
            ..IndexConfig::default()
        };
        let e = TableEmbedder::new(&[("a 1", vec![0.0, 1.0]), ("b 2", vec![1.0, 0.0])], vec![]);

        build_from_config(&cfg, &e, &opts(EmbeddingInput::QuestionAndAnswer))
            .await
            .unwrap();
        let loaded = FaqStore::load(&cfg.index_path, &cfg.lookup_path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.index().len(), loaded.len());
        assert_eq!(loaded.index().vector(1), Some(&[1.0, 0.0][..]));
    }
}

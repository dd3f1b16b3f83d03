//! Request handler: validate → embed → retrieve → enhance or fall back.

use std::sync::Arc;

use ai_llm_service::service_profiles::LlmServiceProfiles;
use faq_index::{
    EmbeddingsProvider, FaqStore, IndexConfig, LlmEmbedder, MatchOutcome, Retriever,
    probe_dimension,
};
use tracing::{info, instrument};

use crate::api_types::{ConversationTurn, QueryOutcome, QueryResult};
use crate::cfg::EnhancerConfig;
use crate::enhance::Enhancer;
use crate::error::AnswerError;

/// Everything a request needs, built once at startup and shared by `Arc`.
pub struct ServiceContext {
    store: Arc<FaqStore>,
    retriever: Retriever,
    embedder: Arc<dyn EmbeddingsProvider>,
    enhancer: Enhancer,
}

impl ServiceContext {
    pub fn new(
        store: Arc<FaqStore>,
        retriever: Retriever,
        embedder: Arc<dyn EmbeddingsProvider>,
        enhancer: Enhancer,
    ) -> Self {
        Self {
            store,
            retriever,
            embedder,
            enhancer,
        }
    }

    /// Loads the index, probes the embedding model, and wires the enhancer.
    ///
    /// # Errors
    /// `IndexNotFound` / `IndexCorrupt` / `ModelUnavailable` (as
    /// [`AnswerError::Index`]) and config errors. All are fatal to the process.
    pub async fn bootstrap(
        svc: Arc<LlmServiceProfiles>,
        index_cfg: &IndexConfig,
        enhancer_cfg: EnhancerConfig,
    ) -> Result<Self, AnswerError> {
        let store = FaqStore::load(&index_cfg.index_path, &index_cfg.lookup_path)?;

        let embedder = LlmEmbedder::new(svc.clone(), None);
        if embedder.model() != store.header().embedding_model {
            tracing::warn!(
                configured = embedder.model(),
                indexed = %store.header().embedding_model,
                "embedding model differs from the one the index was built with"
            );
        }
        probe_dimension(&embedder, Some(store.dim())).await?;
        let embedder = embedder.with_dim(store.dim());

        info!(
            entries = store.len(),
            dim = store.dim(),
            max_distance = ?index_cfg.max_distance,
            "service context ready"
        );
        Ok(Self::new(
            Arc::new(store),
            Retriever::new(index_cfg.max_distance),
            Arc::new(embedder),
            Enhancer::new(svc, enhancer_cfg),
        ))
    }

    pub fn store(&self) -> &FaqStore {
        &self.store
    }

    /// Answers one query.
    ///
    /// Only a malformed history, an embedding failure, or a search error is an
    /// `Err`. No acceptable match is `Ok(QueryOutcome::NotFound)`, and a failed
    /// enhancement still yields `Answered` with the FAQ text.
    #[instrument(skip_all, fields(query_len = query.len(), history = history.len()))]
    pub async fn answer(
        &self,
        query: &str,
        history: &[ConversationTurn],
    ) -> Result<QueryOutcome, AnswerError> {
        validate_history(history)?;

        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(AnswerError::Embedding)?;

        let matched = match self
            .retriever
            .best_match(&self.store, &vector)
            .map_err(AnswerError::Retrieval)?
        {
            MatchOutcome::Found(m) => m,
            MatchOutcome::NotFound(reason) => {
                info!(%reason, "no FAQ entry accepted");
                return Ok(QueryOutcome::NotFound {
                    query: query.to_string(),
                    reason,
                });
            }
        };

        let (text, source) = self
            .enhancer
            .enhance_with_source(&matched.entry.question, &matched.entry.answer, history)
            .await;

        info!(
            index = matched.index,
            distance = matched.distance,
            ?source,
            "query answered"
        );
        Ok(QueryOutcome::Answered(QueryResult {
            query: query.to_string(),
            matched_question: Some(matched.entry.question),
            matched_answer: Some(matched.entry.answer),
            enhanced_answer: text,
            source,
            distance: matched.distance,
        }))
    }
}

/// Every turn must carry a non-blank question.
pub fn validate_history(history: &[ConversationTurn]) -> Result<(), AnswerError> {
    match history.iter().position(|t| t.question.trim().is_empty()) {
        Some(index) => Err(AnswerError::InvalidHistory {
            index,
            reason: "question must not be blank",
        }),
        None => Ok(()),
    }
}

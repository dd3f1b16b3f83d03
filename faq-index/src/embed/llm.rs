//! Embedding provider backed by the shared LLM service's embedding profile.

use std::{future::Future, pin::Pin, sync::Arc};

use ai_llm_service::service_profiles::LlmServiceProfiles;
use tracing::{debug, warn};

use crate::{EmbeddingsProvider, IndexError};

/// Embedder over [`LlmServiceProfiles::embed`].
#[derive(Clone, Debug)]
pub struct LlmEmbedder {
    svc: Arc<LlmServiceProfiles>,
    /// Expected output width; `None` until known (e.g. the first build).
    dim: Option<usize>,
}

impl LlmEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>, dim: Option<usize>) -> Self {
        Self { svc, dim }
    }

    /// Same embedder, enforcing `dim` on every vector.
    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = Some(dim);
        self
    }

    /// Embedding model name, recorded in the index header.
    pub fn model(&self) -> &str {
        &self.svc.embedding_profile().model
    }
}

impl EmbeddingsProvider for LlmEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>> {
        Box::pin(async move {
            // Providers do not encode blank text reliably; once the width is
            // known, blank text maps to the origin.
            if text.trim().is_empty() {
                if let Some(dim) = self.dim {
                    debug!(dim, "blank text encoded as zero vector");
                    return Ok(vec![0.0; dim]);
                }
            }

            let v = self.svc.embed(text).await?;

            if let Some(want) = self.dim {
                if v.len() != want {
                    warn!(got = v.len(), want, "embedding width differs from index");
                    return Err(IndexError::VectorSizeMismatch { got: v.len(), want });
                }
            }

            Ok(v)
        })
    }
}

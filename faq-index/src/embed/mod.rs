//! Embedding abstraction and the startup probe.

use std::{future::Future, pin::Pin};

use tracing::{debug, error};

use crate::errors::IndexError;

pub mod llm;

/// Asynchronous embedding provider.
///
/// Async is required because real providers (Ollama, OpenAI, Azure) perform
/// HTTP requests. Implementations must accept the empty string.
pub trait EmbeddingsProvider: Send + Sync {
    /// Produces an embedding vector for the given text.
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>>;
}

/// Text encoded once at startup to prove the model is reachable.
///
/// Must be non-empty: Ollama answers an empty prompt with an empty vector and
/// OpenAI/Azure reject empty input.
pub const PROBE_TEXT: &str = "ping";

/// Encodes [`PROBE_TEXT`] once to prove the model is reachable.
///
/// Returns the model's output width. When `expected_dim` is given, a different
/// width is reported as unavailable too, since every query would fail.
///
/// # Errors
/// [`IndexError::ModelUnavailable`] for any failure.
pub async fn probe_dimension(
    provider: &dyn EmbeddingsProvider,
    expected_dim: Option<usize>,
) -> Result<usize, IndexError> {
    let v = provider.embed(PROBE_TEXT).await.map_err(|e| {
        error!(error = %e, "embedding probe failed");
        IndexError::ModelUnavailable(e.to_string())
    })?;

    if v.is_empty() {
        return Err(IndexError::ModelUnavailable(
            "model returned an empty vector".into(),
        ));
    }
    if let Some(want) = expected_dim {
        if v.len() != want {
            return Err(IndexError::ModelUnavailable(format!(
                "model produces {}-dimensional vectors but the index holds {want}",
                v.len()
            )));
        }
    }

    debug!(dim = v.len(), "embedding probe succeeded");
    Ok(v.len())
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn probe_reports_dimension() {
        let e = TableEmbedder::new(&[], vec![0.0; 3]);
        assert_eq!(probe_dimension(&e, None).await.unwrap(), 3);
        assert_eq!(probe_dimension(&e, Some(3)).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn startup_check_uses_non_empty_text() {
        // Only the probe text yields a usable vector, like a provider that
        // answers an empty prompt with `[]`.
        let e = TableEmbedder::new(&[(PROBE_TEXT, vec![0.5, 0.5])], vec![]);
        assert_eq!(probe_dimension(&e, None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn empty_text_is_accepted() {
        let e = TableEmbedder::new(&[], vec![0.0; 3]);
        assert_eq!(e.embed("").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn probe_rejects_wrong_width() {
        let e = TableEmbedder::new(&[], vec![0.0; 3]);
        let err = probe_dimension(&e, Some(4)).await.unwrap_err();
        assert!(matches!(err, IndexError::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn probe_maps_failures_to_unavailable() {
        let err = probe_dimension(&DownEmbedder, None).await.unwrap_err();
        assert!(matches!(err, IndexError::ModelUnavailable(_)));
    }
}

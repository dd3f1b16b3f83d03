//! Embedding executor with bounded concurrency and dimension checks.

use futures::stream::{self, TryStreamExt};
use indicatif::ProgressBar;
use tracing::{debug, info};

use crate::{embed::EmbeddingsProvider, errors::IndexError};

/// Embeds every text, returning vectors in the same order as `texts`.
///
/// Requests run `concurrency` at a time and complete in any order; results are
/// placed back by position. All vectors must share one width (the first
/// vector's, unless `expected_dim` fixes it).
///
/// # Errors
/// The first provider failure, or [`IndexError::VectorSizeMismatch`].
pub async fn embed_all(
    texts: &[String],
    provider: &dyn EmbeddingsProvider,
    expected_dim: Option<usize>,
    concurrency: usize,
    progress: Option<&ProgressBar>,
) -> Result<Vec<Vec<f32>>, IndexError> {
    info!(total = texts.len(), concurrency, "embedding corpus");

    // The first failure ends the stream; in-flight requests are dropped and
    // queued ones never start.
    let results: Vec<(usize, Vec<f32>)> =
        stream::iter(texts.iter().enumerate().map(Ok::<_, IndexError>))
            .map_ok(|(i, text)| async move {
                let v = provider.embed(text).await?;
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                Ok::<_, IndexError>((i, v))
            })
            .try_buffer_unordered(concurrency.max(1))
            .try_collect()
            .await?;

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
    let mut want = expected_dim;
    for (i, v) in results {
        match want {
            Some(w) if v.len() != w => {
                return Err(IndexError::VectorSizeMismatch { got: v.len(), want: w });
            }
            Some(_) => {}
            None => want = Some(v.len()),
        }
        slots[i] = Some(v);
    }

    let out = slots.into_iter().flatten().collect::<Vec<_>>();
    debug!(embedded = out.len(), dim = ?want, "embeddings filled");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::embed::testing::{DownEmbedder, TableEmbedder};

    fn texts(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn keeps_input_order_under_concurrency() {
        let e = TableEmbedder::new(
            &[("a", vec![1.0, 0.0]), ("b", vec![2.0, 0.0]), ("c", vec![3.0, 0.0])],
            vec![0.0, 0.0],
        );
        let out = embed_all(&texts(&["c", "a", "b"]), &e, None, 3, None)
            .await
            .unwrap();
        assert_eq!(out, vec![vec![3.0, 0.0], vec![1.0, 0.0], vec![2.0, 0.0]]);
    }

    #[tokio::test]
    async fn rejects_mixed_widths() {
        let e = TableEmbedder::new(&[("a", vec![1.0, 0.0]), ("b", vec![1.0])], vec![]);
        let err = embed_all(&texts(&["a", "b"]), &e, None, 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::VectorSizeMismatch { .. }));
    }

    /// Fails on every call and counts how many were started.
    struct CountingFailure(AtomicUsize);

    impl EmbeddingsProvider for CountingFailure {
        fn embed<'a>(
            &'a self,
            _text: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Err(IndexError::Embedding("HTTP 503".into())) })
        }
    }

    #[tokio::test]
    async fn stops_at_first_failure() {
        let e = CountingFailure(AtomicUsize::new(0));
        let err = embed_all(&texts(&["a", "b", "c", "d", "e"]), &e, None, 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::Embedding(_)));
        assert_eq!(e.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn propagates_provider_failure() {
        let err = embed_all(&texts(&["a"]), &DownEmbedder, None, 2, None)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::Embedding(_)));
    }
}

pub mod embedding;
pub mod model;

use embedding::EmbeddingMatrix;
use model::{EmbeddingModel, ModelError};
use std::num::NonZeroUsize;
use thiserror::Error;
use tracing::{debug, error, info};

/// Failure while fetching the vectors for a run. Fatal to the whole call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbeddingServiceError {
    #[error("Embedding batch {batch_index} failed: {source}")]
    Model {
        batch_index: usize,
        #[source]
        source: ModelError,
    },
    #[error("Embedding batch {batch_index} returned {actual} vectors, expected {expected}")]
    CountMismatch {
        batch_index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Embedding batch {batch_index}, item {item_index} is an empty vector")]
    EmptyVector {
        batch_index: usize,
        item_index: usize,
    },
    #[error("Embedding batch {batch_index}, item {item_index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        batch_index: usize,
        item_index: usize,
        expected: usize,
        actual: usize,
    },
}

/// Splits texts into fixed-size batches and fetches their vectors from an [`EmbeddingModel`].
///
/// Batches are requested one after another and the matrix is assembled in
/// request order, so row `i` of the result always belongs to `texts[i]`.
pub struct Embedder<M: EmbeddingModel> {
    embedding_model: M,
}

impl<M: EmbeddingModel> Embedder<M> {
    pub fn new(embedding_model: M) -> Self {
        Self { embedding_model }
    }

    pub fn model(&self) -> &M {
        &self.embedding_model
    }

    /// Embed `texts` in batches of at most `batch_size`.
    ///
    /// # Errors
    /// Returns an [`EmbeddingServiceError`] when a request fails or a response
    /// doesn't contain exactly one well-formed vector per input text.
    pub async fn embed(
        &self,
        texts: &[String],
        batch_size: NonZeroUsize,
    ) -> Result<EmbeddingMatrix, EmbeddingServiceError> {
        let mut matrix = EmbeddingMatrix::with_capacity(texts.len());
        if texts.is_empty() {
            return Ok(matrix);
        }

        let total = texts.len();
        let mut done = 0;
        for (batch_index, batch) in texts.chunks(batch_size.get()).enumerate() {
            let vectors = self
                .embedding_model
                .embed(batch)
                .await
                .map_err(|source| {
                    error!(batch_index, %source, "embedding request failed");
                    EmbeddingServiceError::Model {
                        batch_index,
                        source,
                    }
                })?;

            if vectors.len() != batch.len() {
                error!(
                    batch_index,
                    expected = batch.len(),
                    actual = vectors.len(),
                    "embedding response size mismatch"
                );
                return Err(EmbeddingServiceError::CountMismatch {
                    batch_index,
                    expected: batch.len(),
                    actual: vectors.len(),
                });
            }
            matrix.append_batch(batch_index, vectors)?;

            done += batch.len();
            debug!(batch_index, "embedding progress {done}/{total}");
        }

        info!(
            count = matrix.len(),
            dimension = ?matrix.dimension(),
            "embeddings generated"
        );
        Ok(matrix)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory model: returns a fixed vector per text and records every request.
    pub(crate) struct FakeEmbeddingModel {
        vectors: HashMap<String, Vec<f64>>,
        pub(crate) requests: Mutex<Vec<Vec<String>>>,
    }

    impl FakeEmbeddingModel {
        pub(crate) fn new<I, S>(vectors: I) -> Self
        where
            I: IntoIterator<Item = (S, Vec<f64>)>,
            S: Into<String>,
        {
            Self {
                vectors: vectors.into_iter().map(|(k, v)| (k.into(), v)).collect(),
                requests: Mutex::new(vec![]),
            }
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl EmbeddingModel for FakeEmbeddingModel {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ModelError> {
            self.requests.lock().unwrap().push(texts.to_vec());
            texts
                .iter()
                .map(|t| {
                    self.vectors
                        .get(t)
                        .cloned()
                        .ok_or_else(|| ModelError::ProviderError(404, format!("unknown text {t}")))
                })
                .collect()
        }
    }

    /// Always answers with `count` vectors, whatever the batch size.
    struct FixedCountModel {
        count: usize,
    }

    #[async_trait]
    impl EmbeddingModel for FixedCountModel {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f64>>, ModelError> {
            Ok(vec![vec![1.0, 0.0]; self.count])
        }
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn batch(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_batches_preserve_order() {
        let model = FakeEmbeddingModel::new([
            ("a", vec![1.0, 0.0]),
            ("b", vec![0.0, 1.0]),
            ("c", vec![1.0, 1.0]),
        ]);
        let embedder = Embedder::new(model);

        let matrix = embedder.embed(&texts(&["a", "b", "c"]), batch(1)).await.unwrap();

        assert_eq!(embedder.model().request_count(), 3);
        assert_eq!(
            *embedder.model().requests.lock().unwrap(),
            vec![texts(&["a"]), texts(&["b"]), texts(&["c"])]
        );
        assert_eq!(&matrix[0], &[1.0, 0.0]);
        assert_eq!(&matrix[1], &[0.0, 1.0]);
        assert_eq!(&matrix[2], &[1.0, 1.0]);
    }

    #[tokio::test]
    async fn test_batch_granularity_does_not_change_matrix() {
        let pairs = [
            ("a", vec![1.0, 0.0]),
            ("b", vec![0.0, 1.0]),
            ("c", vec![1.0, 1.0]),
            ("d", vec![2.0, 1.0]),
            ("e", vec![1.0, 2.0]),
        ];
        let input = texts(&["a", "b", "c", "d", "e"]);

        let single = Embedder::new(FakeEmbeddingModel::new(pairs.clone()))
            .embed(&input, batch(5))
            .await
            .unwrap();
        let embedder = Embedder::new(FakeEmbeddingModel::new(pairs));
        let chunked = embedder.embed(&input, batch(2)).await.unwrap();

        assert_eq!(embedder.model().request_count(), 3);
        assert_eq!(single, chunked);
    }

    #[tokio::test]
    async fn test_empty_input_skips_model() {
        let embedder = Embedder::new(FakeEmbeddingModel::new(Vec::<(String, Vec<f64>)>::new()));
        let matrix = embedder.embed(&[], batch(10)).await.unwrap();
        assert!(matrix.is_empty());
        assert_eq!(embedder.model().request_count(), 0);
    }

    #[tokio::test]
    async fn test_short_response_rejected() {
        let embedder = Embedder::new(FixedCountModel { count: 1 });
        let err = embedder
            .embed(&texts(&["a", "b", "c"]), batch(2))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EmbeddingServiceError::CountMismatch {
                batch_index: 0,
                expected: 2,
                actual: 1
            }
        );
    }

    #[tokio::test]
    async fn test_long_response_rejected() {
        let embedder = Embedder::new(FixedCountModel { count: 2 });
        let err = embedder
            .embed(&texts(&["a", "b", "c"]), batch(2))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EmbeddingServiceError::CountMismatch {
                batch_index: 1,
                expected: 1,
                actual: 2
            }
        );
    }

    #[tokio::test]
    async fn test_model_error_carries_batch_index() {
        let embedder = Embedder::new(FakeEmbeddingModel::new([("a", vec![1.0])]));
        let err = embedder
            .embed(&texts(&["a", "missing"]), batch(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EmbeddingServiceError::Model {
                batch_index: 1,
                source: ModelError::ProviderError(404, _)
            }
        ));
        // no request is made after the failing batch
        assert_eq!(embedder.model().request_count(), 2);
    }
}

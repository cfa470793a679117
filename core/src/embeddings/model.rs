use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single request to an embedding provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("RequestError: {0}")]
    RequestError(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Provider error -> HTTP Status {0}: {1}")]
    ProviderError(u16, String),
    #[error("ParseError: {0}")]
    ParseError(String),
}

/// A provider that turns one batch of texts into one vector per text.
///
/// Implementations make a single request per call and return the vectors in
/// the order of `texts`. Batching, count checks and shape checks are done by
/// [`Embedder`](super::Embedder).
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ModelError>;
}

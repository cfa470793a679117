use crate::{embeddings::EmbeddingServiceError, providers::embeddings::ConfigError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Embedding service error: {0}")]
    Embedding(#[from] EmbeddingServiceError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Similarity threshold must be a finite number, got {0}")]
    InvalidThreshold(f64),
    #[error("Batch size must be at least 1")]
    InvalidBatchSize,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

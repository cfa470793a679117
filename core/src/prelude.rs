pub use crate::checker::{
    DuplicateCheckRequest, DuplicateChecker, DEFAULT_BATCH_SIZE, DEFAULT_REVIEW_THRESHOLD,
    DEFAULT_SIMILARITY_THRESHOLD,
};
pub use crate::clustering::DuplicateGroup;
pub use crate::embeddings::{model::EmbeddingModel, EmbeddingServiceError};
pub use crate::error::{Error, Result};
pub use crate::format::DuplicateReport;
pub use crate::providers::embeddings::{EmbeddingConfig, OpenAIEmbedding};
pub use crate::record::{Record, ScoredRecord};
pub use crate::similarity::cosine_similarity;

pub(crate) mod openai;

pub use openai::{ConfigError, EmbeddingConfig, OpenAIEmbeddingModel as OpenAIEmbedding};

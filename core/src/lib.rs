//! # neardup - Core API Documentation
//!
//! neardup finds near-duplicate question/answer records in a knowledge corpus
//! so they can be reviewed before they pile up.
//!
//! ## Features
//!
//! - **Embedding client** that fetches vectors from an OpenAI-compatible
//!   `/v1/embeddings` service in fixed-size, strictly ordered batches
//! - **Cosine similarity** with a `0.0` floor for zero vectors
//! - **Anchor based grouping**: every group is a star around its first record,
//!   members are only ever compared with that anchor
//! - **Ranked reports** ready to be serialised for a review UI
//!
//! Vectors are never persisted: every call embeds its records from scratch.
//!
//! ## Example
//!
//! ```rust,no_run
//! use neardup::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // falls back to EMBEDDING_SERVICE_URL, EMBEDDING_MODEL_NAME and EMBEDDING_TIMEOUT
//!     let checker = DuplicateChecker::from_config(None)?;
//!
//!     let records = vec![
//!         Record::new("1", "价格", "100"),
//!         Record::new("2", "价格多少", "100元"),
//!         Record::new("3", "天气", "晴"),
//!     ];
//!
//!     let groups = checker.find_duplicates(&records, 0.85, 100).await?;
//!     let report = checker.format_duplicate_groups(&groups);
//!     println!("{}", serde_json::to_string_pretty(&report).unwrap());
//!     Ok(())
//! }
//! ```
//!
//! ## Custom embedding providers
//!
//! Anything implementing [`EmbeddingModel`](embeddings::model::EmbeddingModel)
//! can back a [`DuplicateChecker`](checker::DuplicateChecker); implementations
//! only handle one batch per call, batching and response validation are done
//! by the checker.

/// Duplicate check entrypoints
pub mod checker;

/// Anchor based grouping of records
pub mod clustering;

/// Batched embedding of texts and the provider trait
pub mod embeddings;

/// Error types for all library operations
pub mod error;

/// Ranking and serialisation of duplicate groups
pub mod format;

/// Convenience prelude exports
pub mod prelude;

/// Builtin embedding model providers
pub mod providers;

/// Question/answer records
pub mod record;

/// Cosine similarity between embedding vectors
pub mod similarity;

use serde::Deserialize;
use std::num::NonZeroUsize;
use tracing::{info, instrument};

use crate::{
    clustering::{ClusteringRun, DuplicateGroup},
    embeddings::{model::EmbeddingModel, Embedder},
    error::{Error, Result},
    format::{format_duplicate_groups, DuplicateReport},
    providers::embeddings::OpenAIEmbedding,
    record::Record,
};

/// Threshold used by [`DuplicateChecker::find_duplicates_default`]
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;
/// Threshold of a review request that doesn't specify one
pub const DEFAULT_REVIEW_THRESHOLD: f64 = 0.8;
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Body of a duplicate check request from the review workflow
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DuplicateCheckRequest {
    #[serde(default = "default_review_threshold")]
    pub similarity_threshold: f64,
}

fn default_review_threshold() -> f64 {
    DEFAULT_REVIEW_THRESHOLD
}

impl Default for DuplicateCheckRequest {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_REVIEW_THRESHOLD,
        }
    }
}

/// Finds near-duplicate records by embedding them and grouping them around anchors.
///
/// Holds no state between calls: vectors are fetched fresh on every run and
/// the caller's records are copied, never modified.
pub struct DuplicateChecker<M: EmbeddingModel> {
    embedder: Embedder<M>,
}

impl DuplicateChecker<OpenAIEmbedding> {
    /// Checker backed by the HTTP embedding service, see
    /// [`EmbeddingConfig::resolve`](crate::providers::embeddings::EmbeddingConfig::resolve)
    /// for the accepted configuration.
    ///
    /// # Errors
    /// Fails when the embedding configuration is invalid.
    pub fn from_config(json_config: Option<&str>) -> Result<Self> {
        Ok(Self::new(OpenAIEmbedding::new(json_config)?))
    }
}

impl<M: EmbeddingModel> DuplicateChecker<M> {
    pub fn new(embedding_model: M) -> Self {
        info!("duplicate checker initialised");
        Self {
            embedder: Embedder::new(embedding_model),
        }
    }

    pub fn embedder(&self) -> &Embedder<M> {
        &self.embedder
    }

    /// Group `records` whose embeddings are at least `similarity_threshold`
    /// similar to a common anchor.
    ///
    /// Groups come out in anchor order, each with two or more members; records
    /// that match nothing are left out. An empty input returns no groups
    /// without calling the embedding service.
    ///
    /// # Errors
    /// Fails on a non-finite threshold, a zero batch size, or any embedding
    /// service failure. No partial result is returned.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn find_duplicates(
        &self,
        records: &[Record],
        similarity_threshold: f64,
        batch_size: usize,
    ) -> Result<Vec<DuplicateGroup>> {
        if !similarity_threshold.is_finite() {
            return Err(Error::InvalidThreshold(similarity_threshold));
        }
        let batch_size = NonZeroUsize::new(batch_size).ok_or(Error::InvalidBatchSize)?;
        if records.is_empty() {
            return Ok(vec![]);
        }

        info!(
            total = records.len(),
            threshold = similarity_threshold,
            "starting duplicate check"
        );
        let texts: Vec<String> = records.iter().map(Record::embedding_text).collect();
        let vectors = self.embedder.embed(&texts, batch_size).await?;

        let groups: Vec<DuplicateGroup> = ClusteringRun::new(&vectors, similarity_threshold)
            .run()
            .iter()
            .map(|cluster| DuplicateGroup::from_cluster(cluster, records))
            .collect();

        info!(groups = groups.len(), "duplicate check finished");
        Ok(groups)
    }

    /// [`find_duplicates`](Self::find_duplicates) with the default threshold and batch size
    ///
    /// # Errors
    /// See [`find_duplicates`](Self::find_duplicates).
    pub async fn find_duplicates_default(&self, records: &[Record]) -> Result<Vec<DuplicateGroup>> {
        self.find_duplicates(records, DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_BATCH_SIZE)
            .await
    }

    /// Rank groups for presentation, see [`format_duplicate_groups`].
    pub fn format_duplicate_groups(&self, groups: &[DuplicateGroup]) -> DuplicateReport {
        format_duplicate_groups(groups)
    }

    /// Find and format in one call, as the review workflow does.
    ///
    /// # Errors
    /// See [`find_duplicates`](Self::find_duplicates).
    pub async fn check(
        &self,
        records: &[Record],
        request: DuplicateCheckRequest,
    ) -> Result<DuplicateReport> {
        let groups = self
            .find_duplicates(records, request.similarity_threshold, DEFAULT_BATCH_SIZE)
            .await?;
        let report = format_duplicate_groups(&groups);
        info!(
            total_groups = report.total_groups,
            total_duplicates = report.total_duplicates,
            "duplicate report ready"
        );
        Ok(report)
    }
}

//! Greedy, anchor based grouping of near-duplicate records.
//!
//! Records are scanned in input order. The first record not yet placed in a
//! group becomes an anchor, and every later unplaced record whose similarity
//! *to the anchor* reaches the threshold joins it. Members are never compared
//! with each other, so a group is a star around its anchor rather than a
//! transitively closed cluster: two members may be well below the threshold
//! from one another. Anchors that attract nobody are dropped.

use serde::Serialize;
use tracing::debug;

use crate::embeddings::embedding::EmbeddingMatrix;
use crate::record::{Record, ScoredRecord};
use crate::similarity::cosine_similarity;

/// Similarity recorded for the anchor of every group
pub const ANCHOR_SIMILARITY: f64 = 1.0;

/// Position of a record in the input and its similarity to the group anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterMember {
    pub index: usize,
    pub score: f64,
}

/// Indices of one group, anchor first, then members in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    members: Vec<ClusterMember>,
}

impl Cluster {
    fn anchored_at(index: usize) -> Self {
        Self {
            members: vec![ClusterMember {
                index,
                score: ANCHOR_SIMILARITY,
            }],
        }
    }

    pub fn anchor(&self) -> usize {
        self.members[0].index
    }

    pub fn members(&self) -> &[ClusterMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// State of a single clustering pass over one embedding matrix.
///
/// Owns the visited set for the duration of the run and nothing else, so
/// runs are independent of one another.
pub struct ClusteringRun<'a> {
    vectors: &'a EmbeddingMatrix,
    threshold: f64,
    visited: Vec<bool>,
}

impl<'a> ClusteringRun<'a> {
    pub fn new(vectors: &'a EmbeddingMatrix, threshold: f64) -> Self {
        Self {
            vectors,
            threshold,
            visited: vec![false; vectors.len()],
        }
    }

    /// Partition the rows into groups of two or more. O(n²) comparisons worst case.
    pub fn run(mut self) -> Vec<Cluster> {
        let vectors = self.vectors;
        let n = vectors.len();
        let mut clusters = vec![];

        for i in 0..n {
            if self.visited[i] {
                continue;
            }
            self.visited[i] = true;
            let mut cluster = Cluster::anchored_at(i);
            let anchor = &vectors[i];

            for j in (i + 1)..n {
                if self.visited[j] {
                    continue;
                }
                let score = cosine_similarity(anchor, &vectors[j]);
                if score >= self.threshold {
                    cluster.members.push(ClusterMember { index: j, score });
                    self.visited[j] = true;
                }
            }

            if cluster.len() >= 2 {
                debug!(anchor = i, size = cluster.len(), "duplicate group found");
                clusters.push(cluster);
            }
        }
        clusters
    }
}

/// A group of at least two near-duplicate records.
///
/// The first member is the anchor with a similarity of exactly `1.0`; every
/// other member carries its similarity to that anchor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DuplicateGroup {
    members: Vec<ScoredRecord>,
}

impl DuplicateGroup {
    /// Materialise a cluster as annotated copies of `records`.
    ///
    /// # Panics
    /// Panics if the cluster refers to an index outside `records`.
    pub fn from_cluster(cluster: &Cluster, records: &[Record]) -> Self {
        let members = cluster
            .members()
            .iter()
            .map(|m| ScoredRecord::new(records[m.index].clone(), m.score))
            .collect();
        Self { members }
    }

    pub fn anchor(&self) -> &ScoredRecord {
        &self.members[0]
    }

    pub fn members(&self) -> &[ScoredRecord] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Mean similarity over all members, the anchor's `1.0` included
    pub fn average_similarity(&self) -> f64 {
        if self.members.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.members.len() as f64;
        self.members.iter().map(|m| m.similarity_score).sum::<f64>() / count
    }
}

//! Ranked, serialisable presentation of duplicate groups for review.

use serde::Serialize;
use std::cmp::Ordering;

use crate::clustering::DuplicateGroup;

/// Output of [`format_duplicate_groups`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateReport {
    pub total_groups: usize,
    /// Sum of all group sizes, anchors included
    pub total_duplicates: usize,
    pub groups: Vec<FormattedGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedGroup {
    /// 1-based position of the group in clustering order
    pub group_id: usize,
    /// Average member similarity as a percentage, one decimal place
    pub similarity: f64,
    pub count: usize,
    pub items: Vec<FormattedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedItem {
    pub segment_id: String,
    pub document_id: String,
    pub document_name: String,
    pub classification: String,
    pub question: String,
    pub answer: String,
    /// Similarity to the group anchor as a percentage, one decimal place
    pub similarity: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Express a similarity in `[0, 1]` as a percentage rounded to one decimal place.
///
/// Ties round half away from zero: `0.8125` becomes `81.3`.
pub fn percentage(similarity: f64) -> f64 {
    (similarity * 1000.0).round() / 10.0
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

impl FormattedGroup {
    fn new(group_id: usize, group: &DuplicateGroup) -> Self {
        let mut members: Vec<_> = group.members().iter().collect();
        // stable: equal scores keep clustering order, so the anchor stays first among 100%s
        members.sort_by(|a, b| descending(a.similarity_score, b.similarity_score));

        let items = members
            .into_iter()
            .map(|m| FormattedItem {
                segment_id: m.record.id.clone(),
                document_id: m.record.document_id.clone(),
                document_name: m.record.document_name.clone(),
                classification: m.record.classification.clone(),
                question: m.record.question.clone(),
                answer: m.record.answer.clone(),
                similarity: percentage(m.similarity_score),
                created_at: m.record.created_at,
                updated_at: m.record.updated_at,
            })
            .collect();

        Self {
            group_id,
            similarity: percentage(group.average_similarity()),
            count: group.len(),
            items,
        }
    }
}

/// Rank groups and their members for presentation.
///
/// Members are sorted by similarity descending within each group, and groups
/// by average similarity descending. Both sorts are stable.
pub fn format_duplicate_groups(groups: &[DuplicateGroup]) -> DuplicateReport {
    let mut formatted: Vec<FormattedGroup> = groups
        .iter()
        .enumerate()
        .map(|(idx, group)| FormattedGroup::new(idx + 1, group))
        .collect();
    formatted.sort_by(|a, b| descending(a.similarity, b.similarity));

    DuplicateReport {
        total_groups: formatted.len(),
        total_duplicates: formatted.iter().map(|g| g.count).sum(),
        groups: formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::{ClusteringRun, DuplicateGroup};
    use crate::embeddings::embedding::EmbeddingMatrix;
    use crate::record::Record;

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                Record::new(format!("seg-{i}"), format!("q{i}"), format!("a{i}"))
                    .with_document("doc", "FAQ")
            })
            .collect()
    }

    fn at_angle(degrees: f64) -> Vec<f64> {
        let r = degrees.to_radians();
        vec![r.cos(), r.sin()]
    }

    fn groups_for(rows: Vec<Vec<f64>>, threshold: f64) -> Vec<DuplicateGroup> {
        let records = records(rows.len());
        let matrix = EmbeddingMatrix::from_rows(rows).unwrap();
        ClusteringRun::new(&matrix, threshold)
            .run()
            .iter()
            .map(|c| DuplicateGroup::from_cluster(c, &records))
            .collect()
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(1.0), 100.0);
        assert_eq!(percentage(0.9), 90.0);
        assert_eq!(percentage(0.87654), 87.7);
        assert_eq!(percentage(0.12345), 12.3);
        assert_eq!(percentage(0.0), 0.0);
    }

    #[test]
    fn test_percentage_ties_round_away_from_zero() {
        // exactly representable ties
        assert_eq!(percentage(0.8125), 81.3);
        assert_eq!(percentage(0.0625), 6.3);
        assert_eq!(percentage(0.9375), 93.8);
    }

    #[test]
    fn test_anchor_listed_first_for_parallel_member() {
        let mut rows = vec![];
        for i in 0..50 {
            let x = f64::from(i) * 0.37 - 9.0;
            rows.push(vec![x, 0.3 + 0.7 * x, 1.1 - 0.2 * x]);
        }
        for row in rows {
            let scaled = row.iter().map(|v| v * 3.0).collect();
            let groups = groups_for(vec![row, scaled], 0.99);
            let report = format_duplicate_groups(&groups);

            let group = &report.groups[0];
            assert_eq!(group.items[0].segment_id, "seg-0");
            assert_eq!(group.items[1].segment_id, "seg-1");
            assert!(groups[0].members()[1].similarity_score <= 1.0);
        }
    }

    #[test]
    fn test_empty_report() {
        let report = format_duplicate_groups(&[]);
        assert_eq!(report.total_groups, 0);
        assert_eq!(report.total_duplicates, 0);
        assert!(report.groups.is_empty());
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({"total_groups": 0, "total_duplicates": 0, "groups": []})
        );
    }

    #[test]
    fn test_items_sorted_by_similarity() {
        // anchor at 0°, members at 20° then 5°: the closer one must be listed first
        let groups = groups_for(vec![at_angle(0.0), at_angle(20.0), at_angle(5.0)], 0.9);
        let report = format_duplicate_groups(&groups);

        let group = &report.groups[0];
        let ids: Vec<_> = group.items.iter().map(|i| i.segment_id.as_str()).collect();
        assert_eq!(ids, vec!["seg-0", "seg-2", "seg-1"]);
        assert_eq!(group.items[0].similarity, 100.0);
        assert_eq!(group.items[1].similarity, percentage(5f64.to_radians().cos()));
        assert_eq!(group.count, 3);
    }

    #[test]
    fn test_groups_sorted_by_average_similarity() {
        let groups = groups_for(
            vec![
                at_angle(0.0),
                at_angle(90.0),
                at_angle(20.0),
                at_angle(91.0),
                at_angle(180.0),
                at_angle(225.0),
            ],
            0.7,
        );
        let report = format_duplicate_groups(&groups);

        assert_eq!(report.total_groups, 3);
        assert_eq!(report.total_duplicates, 6);
        let ids: Vec<_> = report.groups.iter().map(|g| g.group_id).collect();
        // group 2 (1° apart) beats group 1 (20°) which beats group 3 (45°)
        assert_eq!(ids, vec![2, 1, 3]);
        assert!(report
            .groups
            .windows(2)
            .all(|w| w[0].similarity >= w[1].similarity));
        for group in &report.groups {
            assert_eq!(group.items[0].similarity, 100.0);
            assert!(group
                .items
                .windows(2)
                .all(|w| w[0].similarity >= w[1].similarity));
        }
    }

    #[test]
    fn test_equal_groups_keep_clustering_order() {
        let groups = groups_for(
            vec![
                at_angle(0.0),
                at_angle(10.0),
                at_angle(120.0),
                at_angle(130.0),
            ],
            0.9,
        );
        let report = format_duplicate_groups(&groups);
        let ids: Vec<_> = report.groups.iter().map(|g| g.group_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_serialized_shape() {
        let groups = groups_for(vec![at_angle(0.0), at_angle(0.0)], 0.9);
        let value = serde_json::to_value(format_duplicate_groups(&groups)).unwrap();

        assert_eq!(value["total_groups"], 1);
        assert_eq!(value["total_duplicates"], 2);
        let group = &value["groups"][0];
        assert_eq!(group["group_id"], 1);
        assert_eq!(group["similarity"], 100.0);
        assert_eq!(group["count"], 2);
        assert_eq!(
            group["items"][1],
            serde_json::json!({
                "segment_id": "seg-1",
                "document_id": "doc",
                "document_name": "FAQ",
                "classification": "-",
                "question": "q1",
                "answer": "a1",
                "similarity": 100.0,
                "created_at": 0,
                "updated_at": 0
            })
        );
    }
}

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::engine::{NodeScore, SubmissionScore};
use crate::tree::NodePath;

/// Group key: ids are disambiguated by their path in case two templates
/// reuse one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeKey {
    pub node_id: String,
    pub node_path: NodePath,
}

/// Distribution of one node's score across a cohort of submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatistics {
    pub node_id: String,
    pub node_path: NodePath,
    pub title: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortStatistics {
    nodes: BTreeMap<NodeKey, NodeStatistics>,
}

impl CohortStatistics {
    pub fn get(&self, key: &NodeKey) -> Option<&NodeStatistics> {
        self.nodes.get(key)
    }

    /// First entry for an id, in key order.
    pub fn by_node_id(&self, node_id: &str) -> Option<&NodeStatistics> {
        self.nodes
            .iter()
            .find(|(key, _)| key.node_id == node_id)
            .map(|(_, stats)| stats)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeKey, &NodeStatistics)> {
        self.nodes.iter()
    }

    pub fn into_vec(self) -> Vec<NodeStatistics> {
        self.nodes.into_values().collect()
    }
}

/// Fold per-submission node scores into per-node statistics.
///
/// Non-finite scores are ignored; a node left without samples is absent
/// from the result rather than reported with NaN.
pub fn aggregate_scores(per_submission: &[Vec<NodeScore>]) -> CohortStatistics {
    let mut grouped: BTreeMap<NodeKey, (String, Vec<f64>)> = BTreeMap::new();

    for scores in per_submission {
        for score in scores {
            if !score.score.is_finite() {
                continue;
            }
            let key = NodeKey {
                node_id: score.node_id.clone(),
                node_path: score.node_path.clone(),
            };
            grouped
                .entry(key)
                .or_insert_with(|| (score.title.clone(), Vec::new()))
                .1
                .push(score.score);
        }
    }

    let nodes = grouped
        .into_iter()
        .filter_map(|(key, (title, values))| {
            let summary = Summary::of(&values)?;
            let stats = NodeStatistics {
                node_id: key.node_id.clone(),
                node_path: key.node_path.clone(),
                title,
                count: summary.count,
                mean: summary.mean,
                median: summary.median,
                std_dev: summary.std_dev,
                min: summary.min,
                max: summary.max,
            };
            Some((key, stats))
        })
        .collect();

    CohortStatistics { nodes }
}

/// Statistics over the overall score of each submission.
pub fn aggregate_overall(scores: &[SubmissionScore]) -> Option<NodeStatistics> {
    let values: Vec<f64> = scores
        .iter()
        .map(|score| score.overall_score)
        .filter(|value| value.is_finite())
        .collect();
    let summary = Summary::of(&values)?;

    Some(NodeStatistics {
        node_id: "overall".to_string(),
        node_path: NodePath::default(),
        title: "Overall".to_string(),
        count: summary.count,
        mean: summary.mean,
        median: summary.median,
        std_dev: summary.std_dev,
        min: summary.min,
        max: summary.max,
    })
}

struct Summary {
    count: usize,
    mean: f64,
    median: f64,
    std_dev: f64,
    min: f64,
    max: f64,
}

impl Summary {
    fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 1 {
            sorted[count / 2]
        } else {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        };
        let variance = sorted
            .iter()
            .map(|value| (value - mean).powi(2))
            .sum::<f64>()
            / count as f64;

        Some(Self {
            count,
            mean,
            median,
            std_dev: variance.sqrt(),
            min: sorted[0],
            max: sorted[count - 1],
        })
    }
}

//! Input document schema: clusters, their process graphs and traces.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

/// Cluster label reserved for noise points; never drawn in the overview.
pub const NOISE_CLUSTER: &str = "-1";

/// Gap marker used in aligned traces.
pub const GAP_ACTIVITY: &str = "-";

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cluster {cluster} has no coordinates")]
    MissingSeed { cluster: String },
    #[error("Cluster {cluster} has a non-finite coordinate")]
    InvalidCoordinate { cluster: String },
    #[error("Cluster {cluster} has duplicate process graph node {id}")]
    DuplicateNode { cluster: String, id: String },
}

/// A loaded visualization document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub clusters: IndexMap<String, ClusterSummary>,
    #[serde(default)]
    pub legend: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub cluster_info: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub size: u64,
    #[serde(default)]
    pub coords: Vec<[f64; 2]>,
    #[serde(default)]
    pub activity_distribution: IndexMap<String, f64>,
    #[serde(default)]
    pub process_graph: ProcessGraph,
    #[serde(default)]
    pub aligned_traces: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub label: String,
}

/// Directed transition between two activity nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(deserialize_with = "id_string")]
    pub from: String,
    #[serde(deserialize_with = "id_string")]
    pub to: String,
}

/// Node ids appear both as strings and as integers in exported documents.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Str(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Float(f) => f.to_string(),
    })
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl ProcessGraph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// True when there is nothing meaningful to lay out.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() || self.edges.is_empty()
    }

    /// First id that occurs more than once, if any.
    pub fn duplicate_node(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.nodes
            .iter()
            .map(|n| n.id.as_str())
            .find(|id| !seen.insert(*id))
    }
}

impl ClusterSummary {
    /// Glyph footprint used by both the force pass and the draw pass.
    pub fn radius(&self) -> f64 {
        glyph_radius(self.size)
    }

    /// Seed position for the overview layout.
    pub fn seed(&self) -> Option<[f64; 2]> {
        self.coords.first().copied()
    }

    /// Sorted unique activity labels across the aligned traces.
    pub fn activities(&self) -> Vec<String> {
        self.aligned_traces
            .iter()
            .flatten()
            .filter(|a| a.as_str() != GAP_ACTIVITY)
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

/// Radius of the size ring drawn inside a glyph.
pub fn size_ring_radius(size: u64) -> f64 {
    ((size as f64) + 1.0).ln() * 3.0
}

pub fn glyph_radius(size: u64) -> f64 {
    size_ring_radius(size).max(15.0) + 10.0
}

impl Document {
    pub fn from_json(source: &str) -> Result<Self, DocumentError> {
        let document: Document = serde_json::from_str(source)?;
        document.validate()?;
        tracing::info!(
            clusters = document.clusters.len(),
            legend = document.legend.len(),
            "loaded document"
        );
        Ok(document)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    /// Reject schema violations the layout engine cannot recover from.
    ///
    /// The noise cluster is never seeded, so it may have no coordinates.
    pub fn validate(&self) -> Result<(), DocumentError> {
        for (id, cluster) in &self.clusters {
            if cluster.coords.is_empty() && id != NOISE_CLUSTER {
                return Err(DocumentError::MissingSeed {
                    cluster: id.clone(),
                });
            }
            if cluster
                .coords
                .iter()
                .flatten()
                .any(|v| !v.is_finite())
            {
                return Err(DocumentError::InvalidCoordinate {
                    cluster: id.clone(),
                });
            }
            if let Some(dup) = cluster.process_graph.duplicate_node() {
                return Err(DocumentError::DuplicateNode {
                    cluster: id.clone(),
                    id: dup.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn cluster(&self, id: &str) -> Option<&ClusterSummary> {
        self.clusters.get(id)
    }

    /// Legend labels in document order.
    pub fn legend_labels(&self) -> impl Iterator<Item = &str> {
        self.legend.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "clusters": {
            "0": {
                "size": 12,
                "coords": [[1.5, 2.0], [3.0, 4.0]],
                "activity_distribution": {"A": 3, "B": 1},
                "process_graph": {
                    "nodes": [{"id": 1, "label": "A"}, {"id": 2, "label": "B"}],
                    "edges": [{"from": 1, "to": 2}]
                },
                "aligned_traces": [["A", "-", "B"], ["B", "A"]]
            },
            "-1": { "size": 3, "coords": [[0.0, 0.0]] }
        },
        "legend": {"A": 0, "B": 1},
        "cluster_info": {}
    }"#;

    #[test]
    fn test_parse_document() {
        let doc = Document::from_json(SAMPLE).unwrap();
        assert_eq!(doc.clusters.len(), 2);
        let keys: Vec<&str> = doc.clusters.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["0", "-1"]);

        let c = doc.cluster("0").unwrap();
        assert_eq!(c.process_graph.nodes[0].id, "1");
        assert_eq!(c.process_graph.edges[0].to, "2");
        assert_eq!(c.seed(), Some([1.5, 2.0]));
        assert!(doc.cluster("-1").unwrap().process_graph.is_empty());
    }

    #[test]
    fn test_activities_sorted_without_gaps() {
        let doc = Document::from_json(SAMPLE).unwrap();
        assert_eq!(doc.cluster("0").unwrap().activities(), vec!["A", "B"]);
    }

    #[test]
    fn test_radius_rule() {
        // ln(1) * 3 = 0, so the floor of 15 applies
        assert_eq!(glyph_radius(0), 25.0);
        let big = glyph_radius(10_000);
        assert!((big - ((10_001f64).ln() * 3.0 + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_missing_coords_rejected() {
        let input = r#"{"clusters": {"3": {"size": 1, "coords": []}}}"#;
        let err = Document::from_json(input).unwrap_err();
        assert!(matches!(err, DocumentError::MissingSeed { ref cluster } if cluster == "3"));
    }

    #[test]
    fn test_noise_cluster_needs_no_coords() {
        let input = r#"{"clusters": {
            "0": {"size": 4, "coords": [[1, 1]]},
            "-1": {"size": 9, "coords": []}
        }}"#;
        let doc = Document::from_json(input).unwrap();
        assert!(doc.cluster("-1").unwrap().seed().is_none());
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let input = r#"{"clusters": {"0": {"size": 1, "coords": [[0, 0]],
            "process_graph": {"nodes": [{"id": "a", "label": "A"}, {"id": "a", "label": "B"}],
                              "edges": []}}}}"#;
        let err = Document::from_json(input).unwrap_err();
        assert!(matches!(err, DocumentError::DuplicateNode { .. }));
    }
}

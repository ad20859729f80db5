//! Gradient-boosted tree ensemble loaded from a JSON model file.
//!
//! Probability = sigmoid(base_score + sum of one leaf per tree).
//! A split sends the sample left when x[feature] < threshold.
//!
//! Split nodes may carry `value`, the tree's expected output at that node.
//! When present it drives path attribution: each step down the tree credits
//! the change in expected output to the split feature.

use crate::{
    error::{ChurnError, ChurnResult},
    explain::FeatureAttributor,
    schema::{FeatureSchema, FeatureVector},
    scoring::Scorer,
    types::Probability,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature:   usize,
        threshold: f64,
        left:      usize,
        right:     usize,
        #[serde(default)]
        value:     f64,
    },
    Leaf {
        value: f64,
    },
}

impl TreeNode {
    fn value(&self) -> f64 {
        match self {
            TreeNode::Split { value, .. } | TreeNode::Leaf { value } => *value,
        }
    }
}

/// A single regression tree; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    /// Indices of the nodes visited from root to leaf.
    fn path(&self, x: &[f64]) -> Vec<usize> {
        let mut path = vec![0];
        let mut i = 0;
        while let TreeNode::Split { feature, threshold, left, right, .. } = &self.nodes[i] {
            i = if x[*feature] < *threshold { *left } else { *right };
            path.push(i);
        }
        path
    }

    fn predict(&self, x: &[f64]) -> f64 {
        let leaf = self.path(x).last().copied().unwrap_or(0);
        self.nodes[leaf].value()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub feature_names: Vec<String>,
    /// Initial prediction in log-odds.
    #[serde(default)]
    pub base_score:    f64,
    pub trees:         Vec<Tree>,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl TreeEnsemble {
    pub fn from_json(json: &str) -> ChurnResult<Self> {
        let model: TreeEnsemble = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let model = Self::from_json(&content)?;
        log::info!(
            "model: loaded {} trees over {} features from {path}",
            model.trees.len(),
            model.feature_names.len()
        );
        Ok(model)
    }

    /// Structural checks: in-range feature indices and children that
    /// always point forward, so every walk terminates.
    pub fn validate(&self) -> ChurnResult<()> {
        let n_features = self.feature_names.len();
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(malformed(format!("tree {t} has no nodes")));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                if let TreeNode::Split { feature, left, right, threshold, .. } = node {
                    if *feature >= n_features {
                        return Err(malformed(format!(
                            "tree {t} node {i} splits on feature {feature}, model has {n_features}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(malformed(format!("tree {t} node {i} has a non-finite threshold")));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= tree.nodes.len() {
                            return Err(malformed(format!(
                                "tree {t} node {i} has invalid child {child}"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn predict_raw(&self, x: &[f64]) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.predict(x)).sum::<f64>()
    }

    pub fn predict_proba(&self, x: &[f64]) -> Probability {
        sigmoid(self.predict_raw(x))
    }

    fn check_len(&self, vector: &FeatureVector) -> ChurnResult<()> {
        if vector.len() != self.feature_names.len() {
            return Err(ChurnError::SchemaMismatch {
                reason: format!(
                    "model expects {} features, vector has {}",
                    self.feature_names.len(),
                    vector.len()
                ),
            });
        }
        Ok(())
    }
}

impl Scorer for TreeEnsemble {
    fn score(&self, vector: &FeatureVector) -> ChurnResult<Probability> {
        self.check_len(vector)?;
        Ok(self.predict_proba(vector.values()))
    }

    /// The model must have been trained on exactly this schema.
    fn check_schema(&self, schema: &FeatureSchema) -> ChurnResult<()> {
        if self.feature_names.as_slice() != schema.names() {
            let first_diff = self
                .feature_names
                .iter()
                .zip(schema.names())
                .position(|(a, b)| a != b);
            return Err(ChurnError::SchemaMismatch {
                reason: match first_diff {
                    Some(i) => format!(
                        "model feature {i} is '{}' but schema has '{}'",
                        self.feature_names[i],
                        schema.names()[i]
                    ),
                    None => format!(
                        "model has {} features but schema has {}",
                        self.feature_names.len(),
                        schema.len()
                    ),
                },
            });
        }
        Ok(())
    }
}

impl FeatureAttributor for TreeEnsemble {
    /// Path attribution in log-odds space.
    fn attribute(&self, vector: &FeatureVector) -> ChurnResult<Vec<f64>> {
        self.check_len(vector)?;
        let x = vector.values();
        let mut impacts = vec![0.0; x.len()];

        for tree in &self.trees {
            let path = tree.path(x);
            for step in path.windows(2) {
                let (parent, child) = (&tree.nodes[step[0]], &tree.nodes[step[1]]);
                if let TreeNode::Split { feature, .. } = parent {
                    impacts[*feature] += child.value() - parent.value();
                }
            }
        }
        Ok(impacts)
    }
}

fn malformed(reason: String) -> ChurnError {
    ChurnError::Other(anyhow::anyhow!("malformed model: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const STUMP: &str = r#"{
        "feature_names": ["tenure", "Contract_Two year"],
        "base_score": 0.0,
        "trees": [
            {"nodes": [
                {"kind": "split", "feature": 0, "threshold": 12.0, "left": 1, "right": 2, "value": 0.1},
                {"kind": "leaf", "value": 0.8},
                {"kind": "leaf", "value": -0.4}
            ]},
            {"nodes": [
                {"kind": "split", "feature": 1, "threshold": 0.5, "left": 1, "right": 2, "value": 0.0},
                {"kind": "leaf", "value": 0.3},
                {"kind": "leaf", "value": -1.0}
            ]}
        ]
    }"#;

    fn vector(model: &TreeEnsemble, values: Vec<f64>) -> FeatureVector {
        let schema = FeatureSchema::new(model.feature_names.clone()).unwrap();
        FeatureVector::from_values(Arc::new(schema), values).unwrap()
    }

    #[test]
    fn sums_leaves_in_log_odds() {
        let model = TreeEnsemble::from_json(STUMP).unwrap();
        let raw = model.predict_raw(&[3.0, 0.0]);
        assert!((raw - 1.1).abs() < 1e-12, "raw={raw}");
        let p = model.score(&vector(&model, vec![3.0, 0.0])).unwrap();
        assert!((p - sigmoid(1.1)).abs() < 1e-12);
    }

    #[test]
    fn threshold_is_strict_less_than() {
        let model = TreeEnsemble::from_json(STUMP).unwrap();
        assert!((model.predict_raw(&[12.0, 1.0]) - (-1.4)).abs() < 1e-12);
    }

    #[test]
    fn path_attribution_sums_to_leaf_minus_root() {
        let model = TreeEnsemble::from_json(STUMP).unwrap();
        let v = vector(&model, vec![3.0, 1.0]);
        let impacts = model.attribute(&v).unwrap();
        assert!((impacts[0] - 0.7).abs() < 1e-12, "tenure impact {}", impacts[0]);
        assert!((impacts[1] - -1.0).abs() < 1e-12, "contract impact {}", impacts[1]);
    }

    #[test]
    fn backward_child_pointer_is_rejected() {
        let json = r#"{
            "feature_names": ["a"],
            "trees": [{"nodes": [
                {"kind": "split", "feature": 0, "threshold": 1.0, "left": 0, "right": 1},
                {"kind": "leaf", "value": 0.0}
            ]}]
        }"#;
        assert!(TreeEnsemble::from_json(json).is_err());
    }

    #[test]
    fn schema_check_reports_first_difference() {
        let model = TreeEnsemble::from_json(STUMP).unwrap();
        let other = FeatureSchema::new(vec!["tenure".into(), "Contract_One year".into()]).unwrap();
        match model.check_schema(&other).unwrap_err() {
            ChurnError::SchemaMismatch { reason } => assert!(reason.contains("Contract_One year")),
            e => panic!("unexpected error: {e}"),
        }
    }
}

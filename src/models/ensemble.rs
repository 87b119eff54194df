//! Gradient-boosted tree ensemble read from an XGBoost JSON tree dump.
//!
//! The artifact wraps the output of `Booster.get_dump(dump_format="json",
//! with_stats=True)` with the objective and base score:
//!
//! ```json
//! {
//!   "name": "churn-xgb",
//!   "objective": "binary:logistic",
//!   "base_score": 0.5,
//!   "trees": [
//!     { "nodeid": 0, "split": "tenure", "split_condition": 12.5,
//!       "yes": 1, "no": 2, "missing": 1, "cover": 100.0,
//!       "children": [ { "nodeid": 1, "leaf": 0.3, "cover": 40.0 }, ... ] }
//!   ]
//! }
//! ```

use crate::error::{ChurnError, ChurnResult};
use crate::feature_vector::{FeatureNames, FeatureVector};
use crate::models::model::ChurnModel;
use crate::models::shap;
use crate::types::report::{Explanation, FeatureContribution};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

const BINARY_LOGISTIC: &str = "binary:logistic";

fn default_model_name() -> String {
    "xgboost".to_string()
}

fn default_base_score() -> f64 {
    0.5
}

/// Serialized model artifact
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    #[serde(default = "default_model_name")]
    pub name: String,
    pub objective: String,
    /// Prior probability of the positive class
    #[serde(default = "default_base_score")]
    pub base_score: f64,
    pub trees: Vec<DumpNode>,
}

/// One node of an XGBoost JSON dump
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DumpNode {
    Split(DumpSplit),
    Leaf(DumpLeaf),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DumpSplit {
    pub nodeid: u32,
    /// Feature name, or `f<index>` when the booster had no names
    pub split: String,
    pub split_condition: f64,
    pub yes: u32,
    pub no: u32,
    pub missing: u32,
    #[serde(default)]
    pub cover: f64,
    pub children: Vec<DumpNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DumpLeaf {
    pub nodeid: u32,
    pub leaf: f64,
    #[serde(default)]
    pub cover: f64,
}

impl DumpNode {
    fn nodeid(&self) -> u32 {
        match self {
            DumpNode::Split(s) => s.nodeid,
            DumpNode::Leaf(l) => l.nodeid,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Node {
    Split {
        feature: usize,
        /// Stored in single precision, as XGBoost evaluates splits
        threshold: f32,
        yes: usize,
        no: usize,
        missing: usize,
        cover: f64,
    },
    Leaf {
        value: f64,
        cover: f64,
    },
}

impl Node {
    pub(crate) fn cover(&self) -> f64 {
        match *self {
            Node::Split { cover, .. } | Node::Leaf { cover, .. } => cover,
        }
    }
}

/// Flattened tree, root at index 0
#[derive(Debug, Clone)]
pub(crate) struct Tree {
    pub(crate) nodes: Vec<Node>,
}

impl Tree {
    fn from_dump(root: &DumpNode, feature_names: &FeatureNames) -> Result<Self, String> {
        let mut nodes = Vec::new();
        flatten(root, feature_names, &mut nodes)?;
        Ok(Self { nodes })
    }

    /// Child taken by `x` at split node `idx`. XGBoost casts the value to
    /// `f32`, sends `value < threshold` to `yes` and NaN to `missing`.
    pub(crate) fn next(&self, idx: usize, x: &[f64]) -> usize {
        match self.nodes[idx] {
            Node::Split {
                feature,
                threshold,
                yes,
                no,
                missing,
                ..
            } => {
                let value = x[feature];
                if value.is_nan() {
                    missing
                } else if (value as f32) < threshold {
                    yes
                } else {
                    no
                }
            }
            Node::Leaf { .. } => idx,
        }
    }

    fn predict(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value, .. } => return value,
                Node::Split { .. } => idx = self.next(idx, x),
            }
        }
    }

    /// Cover-weighted mean leaf value
    pub(crate) fn expected_value(&self) -> Result<f64, String> {
        self.node_mean(0)
    }

    fn node_mean(&self, idx: usize) -> Result<f64, String> {
        match self.nodes[idx] {
            Node::Leaf { value, .. } => Ok(value),
            Node::Split { yes, no, cover, .. } => {
                if cover <= 0.0 {
                    return Err(format!("node {} has no cover statistics", idx));
                }
                let yes_cover = self.nodes[yes].cover();
                let no_cover = self.nodes[no].cover();
                Ok((yes_cover * self.node_mean(yes)? + no_cover * self.node_mean(no)?) / cover)
            }
        }
    }
}

fn flatten(node: &DumpNode, feature_names: &FeatureNames, nodes: &mut Vec<Node>) -> Result<usize, String> {
    let idx = nodes.len();
    match node {
        DumpNode::Leaf(leaf) => nodes.push(Node::Leaf {
            value: leaf.leaf,
            cover: leaf.cover,
        }),
        DumpNode::Split(split) => {
            let feature = resolve_feature(&split.split, feature_names).ok_or_else(|| {
                format!("split feature '{}' is not in the feature list", split.split)
            })?;

            // Placeholder until the children have indices
            nodes.push(Node::Leaf { value: 0.0, cover: 0.0 });

            let mut children = HashMap::with_capacity(split.children.len());
            for child in &split.children {
                children.insert(child.nodeid(), flatten(child, feature_names, nodes)?);
            }
            let child = |id: u32| {
                children.get(&id).copied().ok_or_else(|| {
                    format!("node {} references missing child {}", split.nodeid, id)
                })
            };

            nodes[idx] = Node::Split {
                feature,
                threshold: split.split_condition as f32,
                yes: child(split.yes)?,
                no: child(split.no)?,
                missing: child(split.missing)?,
                cover: split.cover,
            };
        }
    }
    Ok(idx)
}

fn resolve_feature(name: &str, feature_names: &FeatureNames) -> Option<usize> {
    feature_names.index_of(name).or_else(|| {
        name.strip_prefix('f')
            .and_then(|idx| idx.parse::<usize>().ok())
            .filter(|&idx| idx < feature_names.len())
    })
}

fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

/// Binary logistic tree ensemble bound to its feature list
#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    name: String,
    feature_names: FeatureNames,
    base_margin: f64,
    trees: Vec<Tree>,
}

impl TreeEnsemble {
    /// Bind an artifact to a feature list. Every split feature must resolve
    /// against `feature_names`.
    pub fn from_artifact(artifact: ModelArtifact, feature_names: FeatureNames) -> Result<Self, String> {
        if artifact.objective != BINARY_LOGISTIC {
            return Err(format!(
                "unsupported objective '{}', expected '{}'",
                artifact.objective, BINARY_LOGISTIC
            ));
        }
        if !(artifact.base_score > 0.0 && artifact.base_score < 1.0) {
            return Err(format!("base_score {} outside (0, 1)", artifact.base_score));
        }
        if artifact.trees.is_empty() {
            return Err("model has no trees".to_string());
        }

        let trees = artifact
            .trees
            .iter()
            .enumerate()
            .map(|(i, root)| Tree::from_dump(root, &feature_names).map_err(|e| format!("tree {}: {}", i, e)))
            .collect::<Result<Vec<_>, _>>()?;

        let base_margin = (artifact.base_score / (1.0 - artifact.base_score)).ln();

        Ok(Self {
            name: artifact.name,
            feature_names,
            base_margin,
            trees,
        })
    }

    pub fn from_json(bytes: &[u8], feature_names: FeatureNames) -> Result<Self, String> {
        let artifact: ModelArtifact = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        Self::from_artifact(artifact, feature_names)
    }

    pub fn feature_names(&self) -> &FeatureNames {
        &self.feature_names
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Raw log-odds output
    pub fn margin(&self, x: &[f64]) -> f64 {
        self.base_margin + self.trees.iter().map(|t| t.predict(x)).sum::<f64>()
    }

    fn check_schema(&self, vector: &FeatureVector) -> Result<(), String> {
        if vector.len() != self.feature_names.len() {
            return Err(format!(
                "feature shape mismatch, expected {} columns but got {}",
                self.feature_names.len(),
                vector.len()
            ));
        }
        if vector.columns() != &self.feature_names {
            return Err("feature names differ from the model's training columns".to_string());
        }
        Ok(())
    }
}

impl ChurnModel for TreeEnsemble {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_probability(&self, vector: &FeatureVector) -> ChurnResult<f64> {
        self.check_schema(vector).map_err(ChurnError::PredictionFailed)?;

        let margin = self.margin(vector.values());
        let probability = sigmoid(margin);
        if !probability.is_finite() {
            return Err(ChurnError::PredictionFailed(format!(
                "non-finite output for margin {}",
                margin
            )));
        }

        debug!(model = %self.name, margin = margin, probability = probability, "Scored vector");
        Ok(probability)
    }

    fn explain(&self, vector: &FeatureVector) -> ChurnResult<Explanation> {
        self.check_schema(vector).map_err(ChurnError::ExplanationFailed)?;

        let x = vector.values();
        let mut phi = vec![0.0; x.len()];
        let mut base_value = self.base_margin;

        for (i, tree) in self.trees.iter().enumerate() {
            base_value += tree
                .expected_value()
                .map_err(|e| ChurnError::ExplanationFailed(format!("tree {}: {}", i, e)))?;
            shap::tree_shap(tree, x, &mut phi)
                .map_err(|e| ChurnError::ExplanationFailed(format!("tree {}: {}", i, e)))?;
        }

        let contributions = self
            .feature_names
            .iter()
            .zip(phi)
            .map(|(feature, contribution)| FeatureContribution {
                feature: feature.to_string(),
                contribution,
            })
            .collect();

        Ok(Explanation {
            base_value,
            contributions,
        })
    }
}

//! Decision-tree ensemble, the gesture identity model.
//!
//! Trees are stored as flat node arrays with index links, root at 0. A
//! prediction walks every tree to a leaf and majority-votes the leaf
//! labels; the distribution is the vote fraction per identity.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::identity::{label_index, IdentityDistribution, IDENTITY_COUNT, IDENTITY_LABELS};
use crate::model::Classifier;

/// One node of a decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    /// Internal split: `features[feature] <= threshold` goes left.
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
    /// Terminal node carrying an identity label.
    Leaf { label: u32 },
}

/// A single decision tree; `nodes[0]` is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walks the tree to a leaf label. Bounded by the node count, so a
    /// corrupt link table errors instead of looping.
    fn walk(&self, features: &[f32]) -> Result<u32, ModelError> {
        let mut idx = 0usize;
        for _ in 0..self.nodes.len() {
            match self
                .nodes
                .get(idx)
                .ok_or_else(|| ModelError::Malformed(format!("tree link to missing node {idx}")))?
            {
                Node::Leaf { label } => return Ok(*label),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = *features.get(*feature).ok_or(ModelError::DimensionMismatch {
                        expected: *feature + 1,
                        got: features.len(),
                    })?;
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
        Err(ModelError::Malformed("tree walk did not reach a leaf".into()))
    }
}

/// Tree-ensemble model exported from training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestModel {
    /// Input dimensionality (sensor channels + relative time).
    pub dim: usize,
    pub trees: Vec<Tree>,
}

impl ForestModel {
    /// Checks link-table and label sanity. Called once at artifact load.
    pub(crate) fn validate(&self) -> Result<(), ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::Malformed("forest has no trees".into()));
        }
        for tree in &self.trees {
            if tree.nodes.is_empty() {
                return Err(ModelError::Malformed("tree has no nodes".into()));
            }
            for node in &tree.nodes {
                match node {
                    Node::Leaf { label } => {
                        if label_index(*label).is_none() {
                            return Err(ModelError::UnknownLabel(*label));
                        }
                    }
                    Node::Split {
                        feature,
                        left,
                        right,
                        ..
                    } => {
                        if *feature >= self.dim {
                            return Err(ModelError::Malformed(format!(
                                "split on feature {feature}, model dim is {}",
                                self.dim
                            )));
                        }
                        if *left >= tree.nodes.len() || *right >= tree.nodes.len() {
                            return Err(ModelError::Malformed(format!(
                                "split links ({left}, {right}) out of range"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Leaf-label votes per identity, ascending label order.
    fn votes(&self, features: &[f32]) -> Result<[u32; IDENTITY_COUNT], ModelError> {
        if features.len() != self.dim {
            return Err(ModelError::DimensionMismatch {
                expected: self.dim,
                got: features.len(),
            });
        }
        let mut counts = [0u32; IDENTITY_COUNT];
        for tree in &self.trees {
            let label = tree.walk(features)?;
            let i = label_index(label).ok_or(ModelError::UnknownLabel(label))?;
            counts[i] += 1;
        }
        Ok(counts)
    }
}

impl Classifier for ForestModel {
    fn predict_one(&self, features: &[f32]) -> Result<u32, ModelError> {
        let counts = self.votes(features)?;
        let mut best = 0usize;
        for i in 1..IDENTITY_COUNT {
            if counts[i] > counts[best] {
                best = i;
            }
        }
        Ok(IDENTITY_LABELS[best])
    }

    fn predict_proba(&self, features: &[f32]) -> Result<IdentityDistribution, ModelError> {
        let counts = self.votes(features)?;
        let total = self.trees.len() as f32;
        let mut dist = IdentityDistribution::zero();
        for (i, &label) in IDENTITY_LABELS.iter().enumerate() {
            dist.set(label, counts[i] as f32 / total);
        }
        Ok(dist)
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

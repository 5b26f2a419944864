//! Multi-class linear scorer, the audio identity model.
//!
//! One weight row and bias per enrolled identity. The point prediction is
//! the argmax of the decision scores; the distribution is the softmax of
//! the same scores.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::identity::{label_index, IdentityDistribution};
use crate::model::Classifier;

/// Linear decision model exported from training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    /// Identity label per class row, ascending.
    pub labels: Vec<u32>,
    /// Input dimensionality.
    pub dim: usize,
    /// Per-class weight rows, `[labels.len()][dim]`.
    pub weights: Vec<Vec<f32>>,
    /// Per-class bias terms, `[labels.len()]`.
    pub bias: Vec<f32>,
}

impl LinearModel {
    /// Checks internal shape consistency. Called once at artifact load;
    /// prediction paths rely on it afterwards.
    pub(crate) fn validate(&self) -> Result<(), ModelError> {
        if self.labels.is_empty() {
            return Err(ModelError::Malformed("linear model has no classes".into()));
        }
        if self.weights.len() != self.labels.len() || self.bias.len() != self.labels.len() {
            return Err(ModelError::Malformed(format!(
                "linear model shape: {} labels, {} weight rows, {} biases",
                self.labels.len(),
                self.weights.len(),
                self.bias.len()
            )));
        }
        for row in &self.weights {
            if row.len() != self.dim {
                return Err(ModelError::Malformed(format!(
                    "weight row has {} values, expected {}",
                    row.len(),
                    self.dim
                )));
            }
        }
        for &label in &self.labels {
            if label_index(label).is_none() {
                return Err(ModelError::UnknownLabel(label));
            }
        }
        Ok(())
    }

    /// Decision score per class row.
    fn scores(&self, features: &[f32]) -> Result<Vec<f64>, ModelError> {
        if features.len() != self.dim {
            return Err(ModelError::DimensionMismatch {
                expected: self.dim,
                got: features.len(),
            });
        }
        let mut scores = Vec::with_capacity(self.labels.len());
        for (row, &b) in self.weights.iter().zip(self.bias.iter()) {
            let mut acc = b as f64;
            for (w, x) in row.iter().zip(features.iter()) {
                acc += (*w as f64) * (*x as f64);
            }
            scores.push(acc);
        }
        Ok(scores)
    }
}

impl Classifier for LinearModel {
    fn predict_one(&self, features: &[f32]) -> Result<u32, ModelError> {
        let scores = self.scores(features)?;
        let mut best = 0usize;
        for i in 1..scores.len() {
            if scores[i] > scores[best] {
                best = i;
            }
        }
        Ok(self.labels[best])
    }

    fn predict_proba(&self, features: &[f32]) -> Result<IdentityDistribution, ModelError> {
        let scores = self.scores(features)?;

        // Softmax with the usual max-shift for stability.
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = scores.iter().map(|&s| (s - max).exp()).collect();
        let total: f64 = exp.iter().sum();

        let mut dist = IdentityDistribution::zero();
        for (&label, &e) in self.labels.iter().zip(exp.iter()) {
            dist.set(label, (e / total) as f32);
        }
        Ok(dist)
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

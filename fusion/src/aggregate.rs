//! Per-row gesture predictions reduced to one decision.

use fuseid_classifier::{
    Classifier, IdentityDistribution, IDENTITY_COUNT, IDENTITY_LABELS,
};
use fuseid_features::GestureMatrix;
use tracing::debug;

use crate::error::FusionError;

/// Runs the gesture classifier on every row of `matrix` and reduces the
/// row labels to a single identity plus a frequency distribution.
///
/// The aggregate label is the most frequent row label; the distribution is
/// each identity's row count divided by the total row count. Ties resolve
/// to the smallest label. An empty matrix is an error, not a zero
/// distribution.
pub fn aggregate(
    matrix: &GestureMatrix,
    classifier: &dyn Classifier,
) -> Result<(u32, IdentityDistribution), FusionError> {
    if matrix.is_empty() {
        return Err(FusionError::EmptyMatrix);
    }

    let mut counts = [0u32; IDENTITY_COUNT];
    for row in &matrix.rows {
        let label = classifier.predict_one(row)?;
        let i = IDENTITY_LABELS
            .iter()
            .position(|&l| l == label)
            .ok_or(fuseid_classifier::ModelError::UnknownLabel(label))?;
        counts[i] += 1;
    }

    let mut best = 0usize;
    for i in 1..IDENTITY_COUNT {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    let label = IDENTITY_LABELS[best];

    let total = matrix.len() as f32;
    let mut dist = IdentityDistribution::zero();
    for (i, &l) in IDENTITY_LABELS.iter().enumerate() {
        dist.set(l, counts[i] as f32 / total);
    }

    debug!(rows = matrix.len(), label, "gesture rows aggregated");
    Ok((label, dist))
}

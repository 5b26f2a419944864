//! Reconciling the two per-modality identity decisions.

use std::fmt;

use fuseid_classifier::{IdentityDistribution, IDENTITY_LABELS};
use tracing::debug;

/// How the final identity was reached. Observability only; both paths are
/// terminal within one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionPath {
    /// Both modalities named the same identity; distributions were not
    /// consulted.
    Agreement,
    /// The modalities disagreed; the joint probability ranking decided.
    JointResolved,
}

impl fmt::Display for DecisionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agreement => write!(f, "agreement"),
            Self::JointResolved => write!(f, "joint-resolved"),
        }
    }
}

/// Output of the fusion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FusionResult {
    /// The fused identity label.
    pub label: u32,
    /// The decision path taken.
    pub path: DecisionPath,
}

/// Fuses one audio decision and one gesture decision into a final identity.
///
/// Fast path: matching point predictions are returned as-is, without
/// touching the distributions. On disagreement, each identity `u` is ranked
/// by `audio_dist[u] * gesture_dist[u]` and the maximum wins; the product is
/// the joint probability under the conditional-independence assumption the
/// crate docs spell out. Ties go to the smallest label.
pub fn fuse(
    audio_label: u32,
    gesture_label: u32,
    audio_dist: &IdentityDistribution,
    gesture_dist: &IdentityDistribution,
) -> FusionResult {
    if audio_label == gesture_label {
        debug!(label = audio_label, "modalities agree");
        return FusionResult {
            label: audio_label,
            path: DecisionPath::Agreement,
        };
    }

    let mut best_label = IDENTITY_LABELS[0];
    let mut best_joint = f32::NEG_INFINITY;
    for &u in &IDENTITY_LABELS {
        let joint = audio_dist.get(u) * gesture_dist.get(u);
        if joint > best_joint {
            best_joint = joint;
            best_label = u;
        }
    }

    debug!(
        audio = audio_label,
        gesture = gesture_label,
        fused = best_label,
        joint = best_joint,
        "modalities disagree, resolved by joint probability"
    );
    FusionResult {
        label: best_label,
        path: DecisionPath::JointResolved,
    }
}

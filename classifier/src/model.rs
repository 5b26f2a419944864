use crate::error::ModelError;
use crate::identity::IdentityDistribution;

/// The prediction contract every pretrained identity model satisfies.
///
/// Implementations are loaded once from a static artifact, never mutated,
/// and shared across sessions without synchronization.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use.
pub trait Classifier: Send + Sync {
    /// Predicts the single most likely identity label for one feature
    /// vector (audio) or one feature row (gesture).
    fn predict_one(&self, features: &[f32]) -> Result<u32, ModelError>;

    /// Predicts a probability distribution over the identity set.
    fn predict_proba(&self, features: &[f32]) -> Result<IdentityDistribution, ModelError>;

    /// The input dimensionality the model was trained on.
    fn dimension(&self) -> usize;
}

use thiserror::Error;

use fuseid_classifier::ModelError;

/// Errors from gesture aggregation.
#[derive(Debug, Error)]
pub enum FusionError {
    /// The gesture table produced no feature rows; there is nothing to
    /// vote over. Reported to the caller, never silently treated as a
    /// zero distribution.
    #[error("fusion: gesture matrix has no rows")]
    EmptyMatrix,

    #[error(transparent)]
    Model(#[from] ModelError),
}

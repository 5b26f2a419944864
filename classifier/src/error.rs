use thiserror::Error;

/// Errors returned by classifier loading and prediction.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model: empty artifact data")]
    EmptyData,

    #[error("model: io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model: undecodable artifact: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("model: artifact encoding failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("model: bad artifact magic {found:?}")]
    BadMagic { found: String },

    #[error("model: unsupported artifact version {0}")]
    UnsupportedVersion(u32),

    #[error("model: malformed artifact: {0}")]
    Malformed(String),

    #[error("model: dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("model: label {0} is outside the identity set")]
    UnknownLabel(u32),
}

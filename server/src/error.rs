//! Session-level error taxonomy.

use thiserror::Error;

use fuseid_classifier::ModelError;
use fuseid_features::InputError;
use fuseid_fusion::FusionError;

use crate::convert::ConvertError;

/// Everything that can abort a prediction cycle.
///
/// All variants are recoverable at the cycle boundary: the session cleans
/// up its staged files, returns to `EMPTY`, and keeps serving. Other
/// sessions are never affected.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Malformed client payload (audio or gesture).
    #[error(transparent)]
    Input(#[from] InputError),

    /// The external codec failed to produce a decodable container.
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// Messages arrived in an order the protocol forbids.
    #[error("protocol: {0}")]
    Protocol(String),

    /// A classifier rejected its input or produced an out-of-set label.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Gesture aggregation failed.
    #[error(transparent)]
    Fusion(#[from] FusionError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything unclassified (e.g. a panicked worker task). Logged in
    /// full; clients only see a generic diagnostic.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// The short diagnostic string sent to the client.
    ///
    /// Input and protocol problems are the client's to fix, so they get
    /// the real message; everything else is reported generically and kept
    /// in the server logs.
    pub fn client_message(&self) -> String {
        match self {
            Self::Input(err) => format!("error: {err}"),
            Self::Protocol(msg) => format!("error: {msg}"),
            Self::Convert(_) => "error: audio conversion failed".to_string(),
            Self::Fusion(FusionError::EmptyMatrix) => {
                format!("error: {}", FusionError::EmptyMatrix)
            }
            Self::Model(_) | Self::Fusion(_) | Self::Io(_) | Self::Internal(_) => {
                "error: internal".to_string()
            }
        }
    }
}

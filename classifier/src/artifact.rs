//! Model artifact container: encode, decode, and load classifiers.
//!
//! Artifacts are MessagePack-encoded [`ModelArtifact`] values with a magic
//! string and version checked before the payload is trusted. Call sites get
//! back an `Arc<dyn Classifier>` and never see the concrete kind.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::forest::ForestModel;
use crate::linear::LinearModel;
use crate::model::Classifier;

const ARTIFACT_MAGIC: &str = "fuseid-model";
const ARTIFACT_VERSION: u32 = 1;

/// On-disk artifact envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub magic: String,
    pub version: u32,
    pub model: ModelKind,
}

/// The concrete model kinds an artifact can carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelKind {
    Linear(LinearModel),
    Forest(ForestModel),
}

impl ModelArtifact {
    /// Wraps a model in a versioned envelope.
    pub fn new(model: ModelKind) -> Self {
        Self {
            magic: ARTIFACT_MAGIC.to_string(),
            version: ARTIFACT_VERSION,
            model,
        }
    }
}

/// Serializes an artifact. Used by export tooling and tests.
pub fn encode_artifact(artifact: &ModelArtifact) -> Result<Vec<u8>, ModelError> {
    Ok(rmp_serde::to_vec(artifact)?)
}

/// Decodes artifact bytes into a ready-to-use classifier.
pub fn decode_artifact(data: &[u8]) -> Result<Arc<dyn Classifier>, ModelError> {
    if data.is_empty() {
        return Err(ModelError::EmptyData);
    }

    let artifact: ModelArtifact = rmp_serde::from_slice(data)?;
    if artifact.magic != ARTIFACT_MAGIC {
        return Err(ModelError::BadMagic {
            found: artifact.magic,
        });
    }
    if artifact.version != ARTIFACT_VERSION {
        return Err(ModelError::UnsupportedVersion(artifact.version));
    }

    match artifact.model {
        ModelKind::Linear(model) => {
            model.validate()?;
            Ok(Arc::new(model))
        }
        ModelKind::Forest(model) => {
            model.validate()?;
            Ok(Arc::new(model))
        }
    }
}

/// Reads and decodes an artifact file.
pub fn load_classifier(path: &Path) -> Result<Arc<dyn Classifier>, ModelError> {
    let data = std::fs::read(path)?;
    decode_artifact(&data)
}

/// The two pretrained models the service runs with, loaded once at
/// start-up and shared read-only across all sessions.
#[derive(Clone)]
pub struct ModelSet {
    pub audio: Arc<dyn Classifier>,
    pub gesture: Arc<dyn Classifier>,
}

impl ModelSet {
    /// Loads both model artifacts. Any failure here is fatal to start-up;
    /// the process must not serve without its models.
    pub fn load(audio_path: &Path, gesture_path: &Path) -> Result<Self, ModelError> {
        let audio = load_classifier(audio_path)?;
        let gesture = load_classifier(gesture_path)?;
        Ok(Self { audio, gesture })
    }
}

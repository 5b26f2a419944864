//! Shared doubles for session and server tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use fuseid_classifier::{Classifier, IdentityDistribution, ModelError, ModelSet};
use fuseid_features::{wav, AUDIO_FEATURE_LEN, FEATURE_SAMPLE_RATE};

use crate::convert::{AudioConverter, ConvertError};

/// Fresh per-test staging directory under the system temp dir.
pub(crate) fn test_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fuseid-test-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Converter double: wraps the staged raw PCM in a WAV header at the
/// feature sample rate instead of shelling out to ffmpeg.
pub(crate) struct WavWrapConverter;

#[async_trait]
impl AudioConverter for WavWrapConverter {
    async fn convert(&self, raw: &Path, out: &Path) -> Result<(), ConvertError> {
        let bytes = tokio::fs::read(raw).await.map_err(|source| ConvertError::Launch {
            command: "wav-wrap".into(),
            source,
        })?;
        let samples: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        let container = wav::encode_wav(FEATURE_SAMPLE_RATE, &samples);
        tokio::fs::write(out, container)
            .await
            .map_err(|source| ConvertError::Launch {
                command: "wav-wrap".into(),
                source,
            })?;
        Ok(())
    }
}

/// Audio model double: always answers 1 with {1: 0.6, 4: 0.4}.
struct AudioStub;

impl Classifier for AudioStub {
    fn predict_one(&self, features: &[f32]) -> Result<u32, ModelError> {
        assert_eq!(features.len(), AUDIO_FEATURE_LEN);
        Ok(1)
    }

    fn predict_proba(&self, _features: &[f32]) -> Result<IdentityDistribution, ModelError> {
        Ok(IdentityDistribution::from_pairs(&[(1, 0.6), (4, 0.4)]))
    }

    fn dimension(&self) -> usize {
        AUDIO_FEATURE_LEN
    }
}

/// Gesture model double: the row's first sensor cell is the label, so a
/// test chooses the per-row votes directly.
struct GestureStub;

impl Classifier for GestureStub {
    fn predict_one(&self, features: &[f32]) -> Result<u32, ModelError> {
        Ok(features[0] as u32)
    }

    fn predict_proba(&self, features: &[f32]) -> Result<IdentityDistribution, ModelError> {
        Ok(IdentityDistribution::from_pairs(&[(features[0] as u32, 1.0)]))
    }

    fn dimension(&self) -> usize {
        7
    }
}

pub(crate) fn stub_models() -> ModelSet {
    ModelSet {
        audio: Arc::new(AudioStub),
        gesture: Arc::new(GestureStub),
    }
}

/// One second of silent wire-format audio (PCM16 @ 44.1 kHz).
pub(crate) fn audio_payload() -> Vec<u8> {
    vec![0u8; 88_200]
}

/// A gesture CSV whose per-row AccelX values are the labels the
/// [`GestureStub`] will vote.
pub(crate) fn gesture_payload(row_labels: &[u32]) -> Vec<u8> {
    let mut csv = String::from("Timestamp,AccelX,AccelY,AccelZ,GyroX,GyroY,GyroZ\n");
    for (i, label) in row_labels.iter().enumerate() {
        csv.push_str(&format!("{},{label},0.0,0.0,0.0,0.0,0.0\n", 100 + 50 * i));
    }
    csv.into_bytes()
}

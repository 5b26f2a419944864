//! The per-connection session state machine.
//!
//! A session cycles `EMPTY -> AUDIO_STAGED -> EMPTY`, one prediction per
//! cycle. Audio must arrive first because the wire carries no type tag
//! beyond content sniffing and the gesture step consumes the converted
//! audio artifact. Every error path resets the session: staged files are
//! removed and the stage returns to `EMPTY`, so a failed cycle cannot
//! contaminate the next one.

use std::path::Path;
use std::sync::Arc;

use tokio::task;
use tracing::{debug, info, warn};

use fuseid_classifier::ModelSet;
use fuseid_features::{extract_audio_features, extract_gesture_features};
use fuseid_fusion::{aggregate, fuse, FusionResult};

use crate::convert::AudioConverter;
use crate::error::SessionError;
use crate::sniff::{classify, ContentKind};
use crate::staging::Staging;

/// Where a session is inside its cycle.
///
/// A completed cycle collapses straight back to [`Stage::Empty`] inside
/// the same call, so `Empty` and `AudioStaged` are the only observable
/// states between messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing staged; the next message must be audio.
    Empty,
    /// A converted audio artifact is staged; the next message should be
    /// the gesture table.
    AudioStaged,
}

/// One client connection's identification session.
///
/// Owned exclusively by its connection task. The only shared state is the
/// immutable [`ModelSet`], which is safe to read from any number of
/// sessions at once.
pub struct Session {
    stage: Stage,
    staging: Staging,
    models: ModelSet,
    converter: Arc<dyn AudioConverter>,
}

impl Session {
    /// Creates an empty session staging its artifacts under `staging_dir`.
    pub fn new(models: ModelSet, converter: Arc<dyn AudioConverter>, staging_dir: &Path) -> Self {
        Self {
            stage: Stage::Empty,
            staging: Staging::new(staging_dir),
            models,
            converter,
        }
    }

    /// The session's current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Feeds one inbound payload through the state machine.
    ///
    /// Returns `Ok(None)` when the payload was staged and the session is
    /// waiting for its counterpart, `Ok(Some(response))` with the fused
    /// identity label when a cycle completed, and `Err` when the cycle
    /// aborted; on error the session has already been reset.
    pub async fn handle_message(
        &mut self,
        payload: &[u8],
    ) -> Result<Option<String>, SessionError> {
        let result = match classify(payload) {
            ContentKind::Audio => self.stage_audio(payload).await.map(|()| None),
            ContentKind::Gesture => self.run_cycle(payload).await.map(Some),
        };
        if result.is_err() {
            self.reset().await;
        }
        result
    }

    /// Clears staged artifacts and returns the stage to `EMPTY`.
    pub async fn reset(&mut self) {
        self.staging.clear().await;
        self.stage = Stage::Empty;
    }

    /// Stages an audio payload and converts it. A stale artifact from an
    /// incomplete cycle is discarded first; it must never leak into the
    /// prediction that follows.
    async fn stage_audio(&mut self, payload: &[u8]) -> Result<(), SessionError> {
        if self.stage == Stage::AudioStaged {
            warn!("replacing staged audio from an incomplete cycle");
            self.staging.discard_audio().await;
            self.stage = Stage::Empty;
        }

        debug!(bytes = payload.len(), "staging audio payload");
        self.staging.write_audio(payload).await?;
        self.converter
            .convert(self.staging.audio_raw(), self.staging.audio_wav())
            .await?;

        self.stage = Stage::AudioStaged;
        Ok(())
    }

    /// Stages the gesture payload and runs the full prediction pipeline.
    async fn run_cycle(&mut self, payload: &[u8]) -> Result<String, SessionError> {
        if self.stage == Stage::Empty {
            return Err(SessionError::Protocol(
                "audio must precede gesture".to_string(),
            ));
        }

        debug!(bytes = payload.len(), "staging gesture payload");
        self.staging.write_gesture(payload).await?;

        let wav_bytes = tokio::fs::read(self.staging.audio_wav()).await?;
        let gesture_bytes = tokio::fs::read(self.staging.gesture_csv()).await?;
        let models = self.models.clone();

        // Feature extraction and inference are CPU-bound; keep them off
        // the runtime threads so other sessions are not stalled.
        let result = task::spawn_blocking(move || predict(&models, &wav_bytes, &gesture_bytes))
            .await
            .map_err(|err| SessionError::Internal(format!("prediction task failed: {err}")))??;

        info!(label = result.label, path = %result.path, "prediction cycle complete");

        self.staging.clear().await;
        self.stage = Stage::Empty;
        Ok(result.label.to_string())
    }
}

/// The synchronous pipeline: normalize both payloads, predict per
/// modality, aggregate gesture rows, fuse.
fn predict(
    models: &ModelSet,
    wav_bytes: &[u8],
    gesture_bytes: &[u8],
) -> Result<FusionResult, SessionError> {
    let audio_features = extract_audio_features(wav_bytes)?;
    let audio_label = models.audio.predict_one(&audio_features)?;
    let audio_dist = models.audio.predict_proba(&audio_features)?;
    debug!(label = audio_label, "audio modality decided");

    let matrix = extract_gesture_features(gesture_bytes)?;
    let (gesture_label, gesture_dist) = aggregate(&matrix, models.gesture.as_ref())?;
    debug!(label = gesture_label, rows = matrix.len(), "gesture modality decided");

    Ok(fuse(audio_label, gesture_label, &audio_dist, &gesture_dist))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{audio_payload, gesture_payload, stub_models, test_dir, WavWrapConverter};

    fn session(dir: &Path) -> Session {
        Session::new(stub_models(), Arc::new(WavWrapConverter), dir)
    }

    #[tokio::test]
    async fn gesture_before_audio_is_a_protocol_error() {
        let dir = test_dir();
        let mut session = session(&dir);

        let err = session
            .handle_message(&gesture_payload(&[1, 4]))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)));
        assert_eq!(err.client_message(), "error: audio must precede gesture");
        assert_eq!(session.stage(), Stage::Empty);

        // A correctly ordered pair still works afterwards.
        assert!(session.handle_message(&audio_payload()).await.unwrap().is_none());
        assert_eq!(session.stage(), Stage::AudioStaged);
        let response = session
            .handle_message(&gesture_payload(&[1, 4, 4, 4, 4]))
            .await
            .unwrap();
        assert_eq!(response.as_deref(), Some("4"));
        assert_eq!(session.stage(), Stage::Empty);

        drop(session);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn joint_resolution_end_to_end() {
        let dir = test_dir();
        let mut session = session(&dir);

        // Audio stub answers 1 with {1:0.6, 4:0.4}; rows vote 1 once and
        // 4 four times, so the gesture modality answers 4 with
        // {1:0.2, 4:0.8}. Joint: 1 -> 0.12, 4 -> 0.32.
        session.handle_message(&audio_payload()).await.unwrap();
        let response = session
            .handle_message(&gesture_payload(&[1, 4, 4, 4, 4]))
            .await
            .unwrap();
        assert_eq!(response.as_deref(), Some("4"));

        drop(session);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn agreement_end_to_end() {
        let dir = test_dir();
        let mut session = session(&dir);

        session.handle_message(&audio_payload()).await.unwrap();
        let response = session
            .handle_message(&gesture_payload(&[1, 1, 1]))
            .await
            .unwrap();
        assert_eq!(response.as_deref(), Some("1"));

        drop(session);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn staged_artifacts_removed_after_cycle() {
        let dir = test_dir();
        let mut session = session(&dir);

        session.handle_message(&audio_payload()).await.unwrap();
        assert!(session.staging.audio_wav().exists());

        session
            .handle_message(&gesture_payload(&[1, 1]))
            .await
            .unwrap();
        assert!(!session.staging.audio_raw().exists());
        assert!(!session.staging.audio_wav().exists());
        assert!(!session.staging.gesture_csv().exists());

        drop(session);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn stale_audio_is_replaced() {
        let dir = test_dir();
        let mut session = session(&dir);

        session.handle_message(&audio_payload()).await.unwrap();
        assert_eq!(session.stage(), Stage::AudioStaged);

        // A second audio message starts a fresh cycle.
        session.handle_message(&audio_payload()).await.unwrap();
        assert_eq!(session.stage(), Stage::AudioStaged);

        let response = session
            .handle_message(&gesture_payload(&[2, 2, 2]))
            .await
            .unwrap();
        assert_eq!(response.as_deref(), Some("2"));

        drop(session);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn malformed_gesture_resets_the_session() {
        let dir = test_dir();
        let mut session = session(&dir);

        session.handle_message(&audio_payload()).await.unwrap();

        // Header only: sniffed as gesture, rejected by the normalizer.
        let err = session
            .handle_message(b"Timestamp,AccelX\n")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Input(_)));
        assert_eq!(session.stage(), Stage::Empty);
        assert!(!session.staging.audio_wav().exists());

        // The session keeps serving.
        session.handle_message(&audio_payload()).await.unwrap();
        let response = session
            .handle_message(&gesture_payload(&[3, 3]))
            .await
            .unwrap();
        assert_eq!(response.as_deref(), Some("3"));

        drop(session);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn failed_conversion_aborts_the_cycle() {
        use crate::convert::{ConvertError, FfmpegConverter};

        let dir = test_dir();
        let mut session = Session::new(
            stub_models(),
            Arc::new(FfmpegConverter::new("fuseid-no-such-binary")),
            &dir,
        );

        let err = session.handle_message(&audio_payload()).await.unwrap_err();
        assert!(matches!(err, SessionError::Convert(ConvertError::Launch { .. })));
        assert_eq!(session.stage(), Stage::Empty);
        assert!(!session.staging.audio_raw().exists());

        drop(session);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}

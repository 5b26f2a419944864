//! External audio codec collaborator.
//!
//! The wire carries containerless PCM; the feature pipeline wants a
//! decodable WAV at its training sample rate. An external ffmpeg process
//! bridges the two. The seam is a trait so session tests can substitute a
//! converter that does not shell out.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use fuseid_features::FEATURE_SAMPLE_RATE;

use crate::WIRE_SAMPLE_RATE;

/// Errors from the external conversion step. Fatal to the current cycle.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("convert: failed to launch {command:?}: {source}")]
    Launch {
        command: String,
        source: std::io::Error,
    },

    #[error("convert: {command} failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("convert: converter produced no output at {path}")]
    MissingOutput { path: PathBuf },
}

/// Converts a staged raw-PCM file into a decodable audio container.
#[async_trait]
pub trait AudioConverter: Send + Sync {
    /// Reads raw PCM16 mono at [`WIRE_SAMPLE_RATE`] from `raw` and writes
    /// a decodable container to `out`. Blocking work happens in the
    /// external process; the call itself only awaits it.
    async fn convert(&self, raw: &Path, out: &Path) -> Result<(), ConvertError>;
}

/// [`AudioConverter`] backed by an ffmpeg subprocess.
///
/// Invocation mirrors the classic raw-capture recipe:
/// `ffmpeg -f s16le -ar 44100 -ac 1 -i <raw> -ar 22050 <out.wav>`,
/// resampling to the feature pipeline's rate while attaching the
/// container.
pub struct FfmpegConverter {
    program: String,
}

impl FfmpegConverter {
    /// Creates a converter running the given executable (usually
    /// `"ffmpeg"`, overridable for sandboxed installs).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl AudioConverter for FfmpegConverter {
    async fn convert(&self, raw: &Path, out: &Path) -> Result<(), ConvertError> {
        debug!(raw = %raw.display(), out = %out.display(), "converting staged audio");

        let output = Command::new(&self.program)
            .args(["-y", "-hide_banner", "-loglevel", "error"])
            .args(["-f", "s16le"])
            .args(["-ar", &WIRE_SAMPLE_RATE.to_string()])
            .args(["-ac", "1"])
            .arg("-i")
            .arg(raw)
            .args(["-ar", &FEATURE_SAMPLE_RATE.to_string()])
            .args(["-ac", "1"])
            .arg(out)
            .output()
            .await
            .map_err(|source| ConvertError::Launch {
                command: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ConvertError::Failed {
                command: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // A zero exit with no file is still a failed conversion.
        if tokio::fs::metadata(out).await.is_err() {
            return Err(ConvertError::MissingOutput {
                path: out.to_path_buf(),
            });
        }

        Ok(())
    }
}

//! Per-session staged artifact files.
//!
//! The session state machine is the source of truth; these files are just
//! where the bytes wait between the two messages of a cycle. Names carry a
//! session-unique id so concurrent sessions sharing one staging directory
//! never collide, and a common prefix so a start-up sweep can reclaim
//! leftovers from a crashed process.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;

/// Filename prefix of every staged artifact.
pub const STAGING_PREFIX: &str = "fuseid-";

/// Handles to one session's staged files.
///
/// Dropping a `Staging` removes whatever is still on disk, so a session
/// torn down mid-cycle (connection loss, handler panic) reclaims its
/// artifacts without anyone remembering to ask.
#[derive(Debug)]
pub struct Staging {
    audio_raw: PathBuf,
    audio_wav: PathBuf,
    gesture_csv: PathBuf,
}

impl Staging {
    /// Creates handles for a new session under `dir`. No files are
    /// created until something is staged.
    pub fn new(dir: &Path) -> Self {
        let id = Uuid::new_v4();
        let name = |suffix: &str| dir.join(format!("{STAGING_PREFIX}{id}-{suffix}"));
        Self {
            audio_raw: name("audio.raw"),
            audio_wav: name("audio.wav"),
            gesture_csv: name("gesture.csv"),
        }
    }

    /// Path of the staged raw audio payload.
    pub fn audio_raw(&self) -> &Path {
        &self.audio_raw
    }

    /// Path the converter writes the decodable container to.
    pub fn audio_wav(&self) -> &Path {
        &self.audio_wav
    }

    /// Path of the staged gesture table.
    pub fn gesture_csv(&self) -> &Path {
        &self.gesture_csv
    }

    /// Stages a raw audio payload.
    pub async fn write_audio(&self, payload: &[u8]) -> std::io::Result<()> {
        tokio::fs::write(&self.audio_raw, payload).await
    }

    /// Stages a gesture table payload.
    pub async fn write_gesture(&self, payload: &[u8]) -> std::io::Result<()> {
        tokio::fs::write(&self.gesture_csv, payload).await
    }

    /// Removes the staged audio artifacts (raw and converted), keeping the
    /// handles usable for the replacement. Missing files are fine.
    pub async fn discard_audio(&self) {
        remove_quiet(&self.audio_raw).await;
        remove_quiet(&self.audio_wav).await;
    }

    /// Removes everything this session staged. Missing files are fine.
    pub async fn clear(&self) {
        self.discard_audio().await;
        remove_quiet(&self.gesture_csv).await;
    }

    /// Deletes every leftover `fuseid-*` file under `dir`, typically from
    /// a previous process that died mid-cycle. Returns the number of files
    /// removed.
    pub async fn sweep(dir: &Path) -> std::io::Result<usize> {
        let mut removed = 0usize;
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(STAGING_PREFIX) {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(err) => warn!(file = name, %err, "sweep could not remove staged file"),
            }
        }
        if removed > 0 {
            info!(dir = %dir.display(), removed, "swept stale staged artifacts");
        }
        Ok(removed)
    }
}

async fn remove_quiet(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed staged file"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), %err, "could not remove staged file"),
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        for path in [&self.audio_raw, &self.audio_wav, &self.gesture_csv] {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => warn!(path = %path.display(), %err, "drop could not remove staged file"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fuseid-staging-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn unique_names_per_session() {
        let dir = test_dir();
        let a = Staging::new(&dir);
        let b = Staging::new(&dir);
        assert_ne!(a.audio_raw(), b.audio_raw());
        assert_ne!(a.gesture_csv(), b.gesture_csv());
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn write_discard_clear() {
        let dir = test_dir();
        let staging = Staging::new(&dir);

        staging.write_audio(b"pcm").await.unwrap();
        staging.write_gesture(b"Timestamp\n1\n").await.unwrap();
        assert!(staging.audio_raw().exists());
        assert!(staging.gesture_csv().exists());

        staging.discard_audio().await;
        assert!(!staging.audio_raw().exists());
        assert!(staging.gesture_csv().exists());

        staging.clear().await;
        assert!(!staging.gesture_csv().exists());

        // Clearing an already-clean session is a no-op.
        staging.clear().await;

        drop(staging);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn drop_reclaims_files() {
        let dir = test_dir();
        let raw_path;
        {
            let staging = Staging::new(&dir);
            staging.write_audio(b"pcm").await.unwrap();
            raw_path = staging.audio_raw().to_path_buf();
            assert!(raw_path.exists());
        }
        assert!(!raw_path.exists());
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn sweep_removes_only_prefixed_files() {
        let dir = test_dir();
        tokio::fs::write(dir.join("fuseid-dead-session-audio.raw"), b"x")
            .await
            .unwrap();
        tokio::fs::write(dir.join("fuseid-dead-session-gesture.csv"), b"y")
            .await
            .unwrap();
        tokio::fs::write(dir.join("unrelated.txt"), b"z").await.unwrap();

        let removed = Staging::sweep(&dir).await.unwrap();
        assert_eq!(removed, 2);
        assert!(dir.join("unrelated.txt").exists());

        let removed = Staging::sweep(&dir).await.unwrap();
        assert_eq!(removed, 0);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}

//! WebSocket accept loop and per-connection message pump.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, info, warn};

use fuseid_classifier::ModelSet;

use crate::convert::{AudioConverter, FfmpegConverter};
use crate::session::Session;
use crate::staging::Staging;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP listener address (e.g., "127.0.0.1:8086").
    pub addr: String,
    /// Directory for staged per-session artifacts.
    pub staging_dir: PathBuf,
    /// External codec executable.
    pub ffmpeg: String,
}

impl ServerConfig {
    /// Creates a config with the default staging directory (system temp)
    /// and codec (`ffmpeg` on PATH).
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            staging_dir: std::env::temp_dir(),
            ffmpeg: "ffmpeg".to_string(),
        }
    }

    /// Overrides the staging directory.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    /// Overrides the codec executable.
    pub fn with_ffmpeg(mut self, program: impl Into<String>) -> Self {
        self.ffmpeg = program.into();
        self
    }
}

/// The identity-fusion WebSocket server.
///
/// Each accepted connection gets its own task and its own [`Session`];
/// the only shared state is the immutable [`ModelSet`] and the converter
/// handle.
pub struct Server {
    config: ServerConfig,
    models: ModelSet,
    converter: Arc<dyn AudioConverter>,
    listener: TcpListener,
}

impl Server {
    /// Binds the listener with the ffmpeg-backed converter.
    ///
    /// Also prepares the staging directory and sweeps artifacts left over
    /// by a previous process, so a crash mid-cycle cannot leave stale
    /// files visible to new sessions.
    pub async fn bind(config: ServerConfig, models: ModelSet) -> std::io::Result<Self> {
        let converter = Arc::new(FfmpegConverter::new(config.ffmpeg.clone()));
        Self::bind_with(config, models, converter).await
    }

    /// Binds the listener with a caller-supplied converter.
    pub async fn bind_with(
        config: ServerConfig,
        models: ModelSet,
        converter: Arc<dyn AudioConverter>,
    ) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(&config.staging_dir).await?;
        Staging::sweep(&config.staging_dir).await?;

        let listener = TcpListener::bind(&config.addr).await?;
        info!(addr = %listener.local_addr()?, "listening");

        Ok(Self {
            config,
            models,
            converter,
            listener,
        })
    }

    /// The bound listener address (useful when binding to port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until the listener fails. Runs forever in
    /// normal operation.
    pub async fn serve(self) -> std::io::Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            debug!(%peer, "connection accepted");

            let session = Session::new(
                self.models.clone(),
                self.converter.clone(),
                &self.config.staging_dir,
            );
            tokio::spawn(handle_connection(stream, peer, session));
        }
    }
}

/// One connection's sequential message loop: receive, classify, predict,
/// respond. Errors abort the cycle, never the process; the session resets
/// itself and the client gets a short diagnostic.
async fn handle_connection(stream: TcpStream, peer: SocketAddr, mut session: Session) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(err) => {
            warn!(%peer, %err, "websocket handshake failed");
            return;
        }
    };
    info!(%peer, "session opened");

    let (mut write, mut read) = ws.split();

    while let Some(message) = read.next().await {
        let payload: Bytes = match message {
            Ok(Message::Binary(payload)) => payload,
            // Some clients send CSV as a text frame; the discriminant
            // works on bytes either way.
            Ok(Message::Text(text)) => Bytes::from(text.as_bytes().to_vec()),
            Ok(Message::Ping(data)) => {
                if write.send(Message::Pong(data)).await.is_err() {
                    break;
                }
                continue;
            }
            Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => continue,
            Ok(Message::Close(_)) => break,
            Err(err) => {
                warn!(%peer, %err, "read error");
                break;
            }
        };

        let reply = match session.handle_message(&payload).await {
            Ok(Some(response)) => response,
            Ok(None) => continue,
            Err(err) => {
                warn!(%peer, %err, "prediction cycle aborted");
                err.client_message()
            }
        };

        if let Err(err) = write.send(Message::Text(reply.into())).await {
            warn!(%peer, %err, "write error");
            break;
        }
    }

    // Dropping the session reclaims any staged artifacts.
    info!(%peer, "session closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{audio_payload, gesture_payload, stub_models, test_dir, WavWrapConverter};
    use tokio_tungstenite::connect_async;

    async fn start_test_server() -> (SocketAddr, PathBuf) {
        let dir = test_dir();
        let config = ServerConfig::new("127.0.0.1:0").with_staging_dir(&dir);
        let server = Server::bind_with(config, stub_models(), Arc::new(WavWrapConverter))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.serve());
        (addr, dir)
    }

    #[tokio::test]
    async fn full_cycle_over_the_wire() {
        let (addr, dir) = start_test_server().await;

        let (mut ws, _) = connect_async(format!("ws://{addr}")).await.unwrap();
        ws.send(Message::Binary(audio_payload().into())).await.unwrap();
        ws.send(Message::Binary(gesture_payload(&[1, 4, 4, 4, 4]).into()))
            .await
            .unwrap();

        let reply = ws.next().await.unwrap().unwrap();
        assert_eq!(reply, Message::Text("4".into()));

        ws.close(None).await.unwrap();
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn ordering_violation_then_recovery() {
        let (addr, dir) = start_test_server().await;

        let (mut ws, _) = connect_async(format!("ws://{addr}")).await.unwrap();

        // Gesture first: rejected, session stays usable.
        ws.send(Message::Binary(gesture_payload(&[2, 2]).into()))
            .await
            .unwrap();
        let reply = ws.next().await.unwrap().unwrap();
        assert_eq!(
            reply,
            Message::Text("error: audio must precede gesture".into())
        );

        // Correct order succeeds on the same connection.
        ws.send(Message::Binary(audio_payload().into())).await.unwrap();
        ws.send(Message::Binary(gesture_payload(&[2, 2]).into()))
            .await
            .unwrap();
        let reply = ws.next().await.unwrap().unwrap();
        assert_eq!(reply, Message::Text("2".into()));

        ws.close(None).await.unwrap();
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn consecutive_cycles_on_one_connection() {
        let (addr, dir) = start_test_server().await;

        let (mut ws, _) = connect_async(format!("ws://{addr}")).await.unwrap();
        for labels in [&[1u32, 1][..], &[5, 5, 5][..]] {
            ws.send(Message::Binary(audio_payload().into())).await.unwrap();
            ws.send(Message::Binary(gesture_payload(labels).into()))
                .await
                .unwrap();
            let reply = ws.next().await.unwrap().unwrap();
            let expected = if labels[0] == 1 { "1" } else { "5" };
            assert_eq!(reply, Message::Text(expected.into()));
        }

        ws.close(None).await.unwrap();
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let (addr, dir) = start_test_server().await;

        let (mut a, _) = connect_async(format!("ws://{addr}")).await.unwrap();
        let (mut b, _) = connect_async(format!("ws://{addr}")).await.unwrap();

        // A stages audio; B's session is still EMPTY and must reject a
        // gesture even though A is mid-cycle.
        a.send(Message::Binary(audio_payload().into())).await.unwrap();
        b.send(Message::Binary(gesture_payload(&[3, 3]).into()))
            .await
            .unwrap();
        let reply = b.next().await.unwrap().unwrap();
        assert_eq!(
            reply,
            Message::Text("error: audio must precede gesture".into())
        );

        // A's cycle is unaffected.
        a.send(Message::Binary(gesture_payload(&[3, 3]).into()))
            .await
            .unwrap();
        let reply = a.next().await.unwrap().unwrap();
        assert_eq!(reply, Message::Text("3".into()));

        a.close(None).await.unwrap();
        b.close(None).await.unwrap();
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}

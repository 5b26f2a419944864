//! Identity-fusion session server.
//!
//! One WebSocket connection carries one session. The client sends two
//! binary messages per prediction cycle, audio first, gesture second; the
//! server answers each completed cycle with the fused identity label as a
//! decimal string. Modality is inferred from the payload itself (see
//! [`sniff`]) because the wire protocol carries no type tag.
//!
//! # Session lifecycle
//!
//! ```text
//! EMPTY --audio--> AUDIO_STAGED --gesture--> (predict, respond) --> EMPTY
//!   ^                                                                |
//!   +----------------- error: cleanup, diagnostic ------------------+
//! ```
//!
//! Staged payloads live as uniquely named files under the staging
//! directory; they are deleted after every cycle, on any error, when the
//! connection drops, and by a sweep at start-up, so a crashed cycle can
//! never leak into the next one.

mod convert;
mod error;
mod server;
mod session;
mod sniff;
mod staging;
#[cfg(test)]
mod testutil;

pub use convert::{AudioConverter, ConvertError, FfmpegConverter};
pub use error::SessionError;
pub use server::{Server, ServerConfig};
pub use session::{Session, Stage};
pub use sniff::{classify, ContentKind};
pub use staging::Staging;

/// Sample rate of raw audio on the wire, in Hz.
pub const WIRE_SAMPLE_RATE: u32 = 44_100;

//! Content-based message classification.
//!
//! The wire protocol has no message-type header, so modality is inferred
//! from the payload itself: a gesture table is CSV text whose header row
//! starts with the `Timestamp` column, so its first four bytes are the
//! ASCII literal `Time`. Everything else is raw audio.

/// The leading bytes of a gesture table payload.
const GESTURE_HEADER_PREFIX: &[u8; 4] = b"Time";

/// The two payload kinds a session can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Raw single-channel PCM16 little-endian audio at 44 100 Hz.
    Audio,
    /// A gesture CSV table with a `Timestamp` header column.
    Gesture,
}

/// Classifies a payload by its first four bytes.
///
/// Payloads shorter than the prefix cannot be a gesture table and fall
/// through to audio, where short-signal validation rejects them with a
/// proper diagnostic.
pub fn classify(payload: &[u8]) -> ContentKind {
    if payload.len() >= GESTURE_HEADER_PREFIX.len()
        && &payload[..GESTURE_HEADER_PREFIX.len()] == GESTURE_HEADER_PREFIX
    {
        ContentKind::Gesture
    } else {
        ContentKind::Audio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gesture_header_is_gesture() {
        let csv = b"Timestamp,AccelX,AccelY\n100,0.1,0.2\n";
        assert_eq!(classify(csv), ContentKind::Gesture);
    }

    #[test]
    fn bare_prefix_is_gesture() {
        assert_eq!(classify(b"Time"), ContentKind::Gesture);
    }

    #[test]
    fn pcm_is_audio() {
        let pcm = [0x00, 0x10, 0xFF, 0x7F, 0x01, 0x80];
        assert_eq!(classify(&pcm), ContentKind::Audio);
    }

    #[test]
    fn pcm_resembling_text_is_audio() {
        // Arbitrary ASCII that does not open with the header keyword.
        assert_eq!(classify(b"RIFFdata"), ContentKind::Audio);
        assert_eq!(classify(b"timestamp,x\n"), ContentKind::Audio); // case matters
    }

    #[test]
    fn short_payloads_are_audio() {
        assert_eq!(classify(b""), ContentKind::Audio);
        assert_eq!(classify(b"Tim"), ContentKind::Audio);
    }
}

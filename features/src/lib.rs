//! Feature normalization for the two identification modalities.
//!
//! # Pipeline
//!
//! Audio: WAV container -> PCM samples -> MFCC matrix -> flattened,
//! fixed-length [`FeatureVector`](audio::extract_audio_features):
//!
//! 1. [`wav::decode_wav`]: PCM16 mono WAV -> normalized f32 samples
//! 2. [`mfcc::Extractor::extract`]: samples -> `[frames][20]` cepstral coefficients
//! 3. [`audio::extract_audio_features`]: first 3 seconds, flattened frame-major,
//!    zero-padded / truncated to exactly 2500 values
//!
//! Gesture: CSV table -> [`gesture::GestureMatrix`]: per-row sensor channels
//! plus a derived `relative_time` column, absolute timestamps removed.
//!
//! Both entry points return [`InputError`] for malformed input; they never
//! panic on client-supplied bytes.

mod error;

pub mod audio;
pub mod gesture;
pub mod mfcc;
pub mod wav;

pub use audio::{extract_audio_features, AUDIO_FEATURE_LEN, FEATURE_SAMPLE_RATE, MAX_AUDIO_SECONDS};
pub use error::InputError;
pub use gesture::{extract_gesture_features, GestureMatrix, RELATIVE_TIME_COLUMN, TIMESTAMP_COLUMN};

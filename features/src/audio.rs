//! Audio feature vector extraction.
//!
//! Turns the converter's WAV output into the fixed-length input the
//! pretrained audio classifier was trained on.

use crate::error::InputError;
use crate::mfcc::Extractor;
use crate::wav;

/// Canonical audio feature vector length, fixed at training time.
pub const AUDIO_FEATURE_LEN: usize = 2500;

/// Sample rate the MFCC front end (and the classifier) expects, in Hz.
pub const FEATURE_SAMPLE_RATE: u32 = 22_050;

/// At most this many seconds of audio are analyzed; the rest is ignored.
pub const MAX_AUDIO_SECONDS: u32 = 3;

/// Extracts the canonical feature vector from a WAV-contained audio clip.
///
/// Pipeline:
///
/// 1. Decode the PCM16 mono WAV container.
/// 2. Keep at most the first [`MAX_AUDIO_SECONDS`] of samples.
/// 3. Compute MFCC frames and flatten them frame-major.
/// 4. Right-pad with zeros or right-truncate to [`AUDIO_FEATURE_LEN`].
///
/// The container's sample rate must match [`FEATURE_SAMPLE_RATE`]; the
/// converter is responsible for resampling, not this crate.
pub fn extract_audio_features(wav_bytes: &[u8]) -> Result<Vec<f32>, InputError> {
    let audio = wav::decode_wav(wav_bytes)?;
    if audio.sample_rate != FEATURE_SAMPLE_RATE {
        return Err(InputError::SampleRateMismatch {
            expected: FEATURE_SAMPLE_RATE,
            got: audio.sample_rate,
        });
    }
    if audio.samples.is_empty() {
        return Err(InputError::EmptyAudio);
    }

    let extractor = Extractor::default();
    let max_samples = (FEATURE_SAMPLE_RATE * MAX_AUDIO_SECONDS) as usize;
    let pcm = if audio.samples.len() > max_samples {
        &audio.samples[..max_samples]
    } else {
        &audio.samples[..]
    };

    let frames = extractor.extract(pcm);
    if frames.is_empty() {
        return Err(InputError::AudioTooShort {
            min_samples: extractor.window_size(),
            got_samples: pcm.len(),
        });
    }

    let mut flat = Vec::with_capacity(frames.len() * extractor.num_coeffs());
    for frame in &frames {
        flat.extend_from_slice(frame);
    }

    Ok(pad_to_canonical(flat))
}

/// Right-pads with zeros or right-truncates to [`AUDIO_FEATURE_LEN`].
pub fn pad_to_canonical(mut coeffs: Vec<f32>) -> Vec<f32> {
    if coeffs.len() < AUDIO_FEATURE_LEN {
        coeffs.resize(AUDIO_FEATURE_LEN, 0.0);
    } else {
        coeffs.truncate(AUDIO_FEATURE_LEN);
    }
    coeffs
}

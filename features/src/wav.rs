//! Minimal RIFF/WAVE reader for the converter's output.
//!
//! Only the subset the pipeline produces is accepted: PCM16 signed
//! little-endian, mono. Anything else is an [`InputError`], not a panic.

use crate::error::InputError;

/// Decoded audio: normalized f32 samples in [-1, 1].
#[derive(Debug, Clone)]
pub struct WavAudio {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

const RIFF_HEADER_LEN: usize = 12;
const FORMAT_PCM: u16 = 1;

/// Decodes a PCM16 mono WAV container.
///
/// Walks the chunk list for `fmt ` and `data`; unknown chunks are skipped.
/// Returns [`InputError::UndecodableAudio`] on structural problems and
/// [`InputError::EmptyAudio`] when the data chunk holds no samples.
pub fn decode_wav(data: &[u8]) -> Result<WavAudio, InputError> {
    if data.len() < RIFF_HEADER_LEN {
        return Err(bad("shorter than a RIFF header"));
    }
    if &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err(bad("not a RIFF/WAVE container"));
    }

    let mut fmt: Option<FmtChunk> = None;
    let mut pcm: Option<&[u8]> = None;

    let mut pos = RIFF_HEADER_LEN;
    while pos + 8 <= data.len() {
        let id = &data[pos..pos + 4];
        let size = u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
            as usize;
        let body_start = pos + 8;
        let body_end = body_start
            .checked_add(size)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| bad("chunk size exceeds container"))?;
        let body = &data[body_start..body_end];

        match id {
            b"fmt " => fmt = Some(parse_fmt(body)?),
            b"data" => pcm = Some(body),
            _ => {}
        }

        // Chunk bodies are word-aligned; odd sizes carry a pad byte.
        pos = body_end + (size & 1);
    }

    let fmt = fmt.ok_or_else(|| bad("missing fmt chunk"))?;
    let pcm = pcm.ok_or_else(|| bad("missing data chunk"))?;

    if pcm.is_empty() {
        return Err(InputError::EmptyAudio);
    }

    let n = pcm.len() / 2;
    let mut samples = Vec::with_capacity(n);
    for i in 0..n {
        let s = i16::from_le_bytes([pcm[2 * i], pcm[2 * i + 1]]);
        samples.push(s as f32 / 32768.0);
    }

    Ok(WavAudio {
        sample_rate: fmt.sample_rate,
        samples,
    })
}

struct FmtChunk {
    sample_rate: u32,
}

fn parse_fmt(body: &[u8]) -> Result<FmtChunk, InputError> {
    if body.len() < 16 {
        return Err(bad("fmt chunk truncated"));
    }
    let format = u16::from_le_bytes([body[0], body[1]]);
    let channels = u16::from_le_bytes([body[2], body[3]]);
    let sample_rate = u32::from_le_bytes([body[4], body[5], body[6], body[7]]);
    let bits = u16::from_le_bytes([body[14], body[15]]);

    if format != FORMAT_PCM {
        return Err(bad(format!("unsupported audio format tag {format}")));
    }
    if channels != 1 {
        return Err(bad(format!("expected mono, got {channels} channels")));
    }
    if bits != 16 {
        return Err(bad(format!("expected 16-bit samples, got {bits}")));
    }

    Ok(FmtChunk { sample_rate })
}

fn bad(reason: impl Into<String>) -> InputError {
    InputError::UndecodableAudio(reason.into())
}

/// Builds a PCM16 mono WAV container around raw samples.
/// Used by tests and by converter stubs; the serving path only reads.
pub fn encode_wav(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
    let data_len = samples.len() * 2;
    let mut out = Vec::with_capacity(44 + data_len);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((36 + data_len) as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // channels
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    out.extend_from_slice(&2u16.to_le_bytes()); // block align
    out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data_len as u32).to_le_bytes());
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let samples: Vec<i16> = vec![0, 16384, -16384, 32767, -32768];
        let bytes = encode_wav(22050, &samples);
        let wav = decode_wav(&bytes).unwrap();

        assert_eq!(wav.sample_rate, 22050);
        assert_eq!(wav.samples.len(), 5);
        assert!((wav.samples[1] - 0.5).abs() < 1e-4);
        assert!((wav.samples[4] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_wav(b"not a wav at all").is_err());
        assert!(decode_wav(&[]).is_err());
    }

    #[test]
    fn rejects_stereo() {
        let mut bytes = encode_wav(22050, &[0; 8]);
        // Patch the channel count inside the fmt chunk.
        bytes[22] = 2;
        assert!(decode_wav(&bytes).is_err());
    }

    #[test]
    fn rejects_truncated_chunk() {
        let mut bytes = encode_wav(22050, &[0; 8]);
        // Claim a data chunk larger than the container.
        let data_size_at = 40;
        bytes[data_size_at..data_size_at + 4].copy_from_slice(&1_000_000u32.to_le_bytes());
        assert!(decode_wav(&bytes).is_err());
    }

    #[test]
    fn empty_data_chunk_is_empty_audio() {
        let bytes = encode_wav(22050, &[]);
        assert!(matches!(decode_wav(&bytes), Err(InputError::EmptyAudio)));
    }
}

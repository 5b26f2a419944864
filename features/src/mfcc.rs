//! MFCC extraction from PCM audio.
//!
//! Front end for the pretrained audio identity classifier. The chain is the
//! usual one: pre-emphasis, Hamming window, power-spectrum FFT, triangular
//! mel filterbank, log, orthonormal DCT-II down to cepstral coefficients.
//! Output is a `[frames][num_coeffs]` f32 matrix.

use std::f64::consts::PI;

/// Configures MFCC extraction.
///
/// Defaults match the audio classifier's training front end:
/// 22 050 Hz input, 2048-sample window, 512-sample hop, 40 mel bins,
/// 20 cepstral coefficients.
#[derive(Debug, Clone)]
pub struct MfccConfig {
    /// Input sample rate in Hz (default: 22050).
    pub sample_rate: usize,
    /// Analysis window length in samples; also the FFT size (default: 2048).
    pub window_size: usize,
    /// Hop between consecutive frames in samples (default: 512).
    pub hop_size: usize,
    /// Number of mel filterbank channels (default: 40).
    pub num_mels: usize,
    /// Number of cepstral coefficients kept after the DCT (default: 20).
    pub num_coeffs: usize,
    /// Low cutoff frequency for the mel bank (default: 0 Hz).
    pub low_freq: f64,
    /// High cutoff frequency; zero or negative means Nyquist (default: 0).
    pub high_freq: f64,
    /// Pre-emphasis coefficient (default: 0.97).
    pub pre_emphasis: f64,
    /// Floor for log energy (default: 1e-10).
    pub energy_floor: f64,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            window_size: 2048,
            hop_size: 512,
            num_mels: 40,
            num_coeffs: 20,
            low_freq: 0.0,
            high_freq: 0.0,
            pre_emphasis: 0.97,
            energy_floor: 1e-10,
        }
    }
}

/// MFCC extractor with precomputed window, mel bank, and DCT basis.
pub struct Extractor {
    cfg: MfccConfig,
    window: Vec<f64>,
    mel_bank: Vec<Vec<f64>>,
    dct: Vec<Vec<f64>>,
}

impl Extractor {
    /// Creates a new extractor with the given config.
    pub fn new(cfg: MfccConfig) -> Self {
        let high_freq = if cfg.high_freq <= 0.0 {
            cfg.sample_rate as f64 / 2.0
        } else {
            cfg.high_freq
        };
        let window = hamming_window(cfg.window_size);
        let mel_bank = mel_filterbank(
            cfg.num_mels,
            cfg.window_size,
            cfg.sample_rate,
            cfg.low_freq,
            high_freq,
        );
        let dct = dct_basis(cfg.num_coeffs, cfg.num_mels);
        Self {
            cfg,
            window,
            mel_bank,
            dct,
        }
    }

    /// Extracts MFCC frames from normalized f32 PCM samples (range [-1, 1]).
    ///
    /// Returns `[T][num_coeffs]` where
    /// `T = (len(pcm) - window_size) / hop_size + 1`, empty if the signal
    /// is shorter than one window.
    pub fn extract(&self, pcm: &[f32]) -> Vec<Vec<f32>> {
        let cfg = &self.cfg;
        let n = pcm.len();
        if n < cfg.window_size {
            return Vec::new();
        }

        let num_frames = (n - cfg.window_size) / cfg.hop_size + 1;
        let nfft = cfg.window_size;
        let half_fft = nfft / 2 + 1;

        let mut features = Vec::with_capacity(num_frames);
        let mut real = vec![0.0f64; nfft];
        let mut imag = vec![0.0f64; nfft];

        for t in 0..num_frames {
            let start = t * cfg.hop_size;

            // Pre-emphasis + windowing.
            for i in 0..cfg.window_size {
                let mut s = pcm[start + i] as f64;
                if start + i > 0 {
                    s -= cfg.pre_emphasis * pcm[start + i - 1] as f64;
                }
                real[i] = s * self.window[i];
            }
            for v in imag.iter_mut() {
                *v = 0.0;
            }

            fft(&mut real, &mut imag);

            // Power spectrum.
            let mut power = vec![0.0f64; half_fft];
            for k in 0..half_fft {
                power[k] = real[k] * real[k] + imag[k] * imag[k];
            }

            // Mel filterbank + log.
            let mut log_mel = vec![0.0f64; cfg.num_mels];
            for m in 0..cfg.num_mels {
                let mut sum = 0.0f64;
                for (k, &w) in self.mel_bank[m].iter().enumerate() {
                    sum += w * power[k];
                }
                if sum < cfg.energy_floor {
                    sum = cfg.energy_floor;
                }
                log_mel[m] = sum.ln();
            }

            // DCT-II down to cepstral coefficients.
            let mut frame = vec![0.0f32; cfg.num_coeffs];
            for (c, basis) in self.dct.iter().enumerate() {
                let mut acc = 0.0f64;
                for (m, &b) in basis.iter().enumerate() {
                    acc += b * log_mel[m];
                }
                frame[c] = acc as f32;
            }
            features.push(frame);
        }

        features
    }

    /// The configured number of cepstral coefficients per frame.
    pub fn num_coeffs(&self) -> usize {
        self.cfg.num_coeffs
    }

    /// The configured input sample rate.
    pub fn sample_rate(&self) -> usize {
        self.cfg.sample_rate
    }

    /// The configured analysis window length in samples.
    pub fn window_size(&self) -> usize {
        self.cfg.window_size
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(MfccConfig::default())
    }
}

fn hamming_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// Computes triangular mel filterbank weights, `[num_mels][half_fft]`.
fn mel_filterbank(
    num_mels: usize,
    fft_size: usize,
    sample_rate: usize,
    low_freq: f64,
    high_freq: f64,
) -> Vec<Vec<f64>> {
    let half_fft = fft_size / 2 + 1;
    let mel_low = hz_to_mel(low_freq);
    let mel_high = hz_to_mel(high_freq);

    // Equally spaced points on the mel scale, mapped to FFT bins.
    let bin_indices: Vec<usize> = (0..num_mels + 2)
        .map(|i| {
            let mel = mel_low + i as f64 * (mel_high - mel_low) / (num_mels + 1) as f64;
            let hz = mel_to_hz(mel);
            let bin = (hz * fft_size as f64 / sample_rate as f64).floor() as isize;
            bin.max(0).min(half_fft as isize - 1) as usize
        })
        .collect();

    let mut bank = Vec::with_capacity(num_mels);
    for m in 0..num_mels {
        let mut filter = vec![0.0f64; half_fft];
        let left = bin_indices[m];
        let center = bin_indices[m + 1];
        let right = bin_indices[m + 2];

        if center > left {
            for k in left..=center {
                filter[k] = (k - left) as f64 / (center - left) as f64;
            }
        }
        if right > center {
            for k in center..=right {
                filter[k] = (right - k) as f64 / (right - center) as f64;
            }
        }
        bank.push(filter);
    }
    bank
}

/// Orthonormal DCT-II basis, `[num_coeffs][num_mels]`.
fn dct_basis(num_coeffs: usize, num_mels: usize) -> Vec<Vec<f64>> {
    let m = num_mels as f64;
    (0..num_coeffs)
        .map(|c| {
            let scale = if c == 0 {
                (1.0 / m).sqrt()
            } else {
                (2.0 / m).sqrt()
            };
            (0..num_mels)
                .map(|i| scale * (PI * c as f64 * (i as f64 + 0.5) / m).cos())
                .collect()
        })
        .collect()
}

/// In-place radix-2 Cooley-Tukey FFT over split real/imag buffers.
/// Input length must be a power of 2.
fn fft(real: &mut [f64], imag: &mut [f64]) {
    let n = real.len();
    debug_assert_eq!(n, imag.len());
    debug_assert!(n.is_power_of_two());
    if n <= 1 {
        return;
    }

    // Bit-reversal permutation.
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            real.swap(i, j);
            imag.swap(i, j);
        }
    }

    // Butterflies.
    let mut size = 2;
    while size <= n {
        let half = size / 2;
        let angle = -2.0 * PI / size as f64;
        let (wn_re, wn_im) = (angle.cos(), angle.sin());
        let mut start = 0;
        while start < n {
            let (mut w_re, mut w_im) = (1.0f64, 0.0f64);
            for k in 0..half {
                let a = start + k;
                let b = a + half;
                let t_re = w_re * real[b] - w_im * imag[b];
                let t_im = w_re * imag[b] + w_im * real[b];
                real[b] = real[a] - t_re;
                imag[b] = imag[a] - t_im;
                real[a] += t_re;
                imag[a] += t_im;
                let next_re = w_re * wn_re - w_im * wn_im;
                w_im = w_re * wn_im + w_im * wn_re;
                w_re = next_re;
            }
            start += size;
        }
        size <<= 1;
    }
}

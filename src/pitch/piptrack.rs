// Spectral peak picking ("piptrack")
// Short-time FFT with parabolic peak interpolation, producing a
// (bin x frame) matrix of candidate pitches and their magnitudes

use realfft::{RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::backend::PitchError;
use super::types::PeakMatrix;

/// Configuration for spectral peak picking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PiptrackConfig {
    /// FFT size in samples
    pub n_fft: usize,

    /// Hop size in samples
    pub hop_length: usize,

    /// Lowest frequency considered (Hz)
    pub fmin: f32,

    /// Upper frequency bound, exclusive (Hz)
    pub fmax: f32,

    /// A peak must exceed `threshold * max(frame magnitude)`
    pub threshold: f32,

    /// Pad the signal so frame `i` is centred on sample `i * hop_length`
    pub center: bool,
}

impl Default for PiptrackConfig {
    fn default() -> Self {
        PiptrackConfig {
            n_fft: 2048,
            hop_length: 512,
            fmin: 150.0,
            fmax: 4000.0,
            threshold: 0.1,
            center: true,
        }
    }
}

/// Short-time spectral peak tracker
pub struct PiptrackAnalyzer {
    config: PiptrackConfig,
    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
}

impl PiptrackAnalyzer {
    pub fn new(config: PiptrackConfig) -> Result<Self, PitchError> {
        if config.n_fft < 4 || config.hop_length == 0 {
            return Err(PitchError::InvalidFrameSize {
                frame_length: config.n_fft,
                hop_length: config.hop_length,
            });
        }
        if !(config.fmin >= 0.0 && config.fmin < config.fmax) {
            return Err(PitchError::InvalidRange {
                fmin: config.fmin,
                fmax: config.fmax,
            });
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(config.n_fft);
        let window = hann_window(config.n_fft);

        Ok(PiptrackAnalyzer {
            config,
            fft,
            window,
        })
    }

    pub fn config(&self) -> &PiptrackConfig {
        &self.config
    }

    /// Analyse a mono signal into a peak matrix
    pub fn analyze(&self, samples: &[f32], sample_rate: u32) -> Result<PeakMatrix, PitchError> {
        if sample_rate == 0 {
            return Err(PitchError::InvalidSampleRate(sample_rate));
        }

        let n_fft = self.config.n_fft;
        let hop_length = self.config.hop_length;
        let n_bins = n_fft / 2 + 1;

        let padded = if self.config.center {
            let pad = n_fft / 2;
            let mut padded = vec![0.0f32; samples.len() + 2 * pad];
            padded[pad..pad + samples.len()].copy_from_slice(samples);
            padded
        } else {
            samples.to_vec()
        };

        let n_frames = if samples.is_empty() || padded.len() < n_fft {
            0
        } else {
            1 + (padded.len() - n_fft) / hop_length
        };

        let mut pitches = vec![vec![0.0f32; n_frames]; n_bins];
        let mut magnitudes = vec![vec![0.0f32; n_frames]; n_bins];

        let bin_width = sample_rate as f32 / n_fft as f32;
        let mut input = vec![0.0f32; n_fft];
        let mut spectrum = self.fft.make_output_vec();

        for frame in 0..n_frames {
            let start = frame * hop_length;
            for (dst, (&x, &w)) in input
                .iter_mut()
                .zip(padded[start..start + n_fft].iter().zip(&self.window))
            {
                *dst = x * w;
            }

            self.fft
                .process(&mut input, &mut spectrum)
                .map_err(|e| PitchError::Fft(e.to_string()))?;

            let column: Vec<f32> = spectrum.iter().map(|c| c.norm()).collect();
            let reference = column.iter().cloned().fold(0.0f32, f32::max);
            let floor = self.config.threshold * reference;

            for bin in 1..n_bins - 1 {
                let freq = bin as f32 * bin_width;
                if freq < self.config.fmin || freq >= self.config.fmax {
                    continue;
                }

                let (left, center, right) = (column[bin - 1], column[bin], column[bin + 1]);
                let is_peak = center > left && center >= right;
                if !is_peak || center <= floor {
                    continue;
                }

                let avg = 0.5 * (right - left);
                let curvature = 2.0 * center - left - right;
                let shift = if curvature.abs() < f32::MIN_POSITIVE {
                    avg
                } else {
                    avg / curvature
                };

                pitches[bin][frame] = (bin as f32 + shift) * bin_width;
                magnitudes[bin][frame] = center + 0.5 * avg * shift;
            }
        }

        log::debug!(
            "piptrack analysed {} frames x {} bins at {} Hz",
            n_frames,
            n_bins,
            sample_rate
        );

        Ok(PeakMatrix {
            pitches,
            magnitudes,
            hop_length,
            sample_rate,
        })
    }
}

/// Periodic Hann window
fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos()))
        .collect()
}

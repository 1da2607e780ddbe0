// Probabilistic YIN pitch tracking
// Per-frame fundamental frequency, voicing decision and voicing probability
// for monophonic signals (whistling, humming, singing)

use serde::{Deserialize, Serialize};

use super::backend::PitchError;
use super::types::{frames_to_time, note_to_hz, Frame, PitchTrack};

/// Frames below this energy are treated as silence
const SILENCE_ENERGY: f64 = 1e-10;

/// Configuration for the probabilistic YIN tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PyinConfig {
    /// Lowest detectable frequency in Hz (default C4)
    pub fmin: f32,

    /// Highest detectable frequency in Hz (default C7)
    pub fmax: f32,

    /// Analysis frame length in samples
    pub frame_length: usize,

    /// Hop size in samples between frames
    pub hop_length: usize,

    /// Pad the signal so frame `i` is centred on sample `i * hop_length`
    pub center: bool,

    /// Number of YIN thresholds sampled between 0 and 1
    pub n_thresholds: usize,

    /// Beta distribution parameters for the threshold prior
    pub beta_a: f32,
    pub beta_b: f32,

    /// Probability mass given to the global minimum when no trough
    /// falls below a threshold
    pub no_trough_prob: f32,

    /// Voicing probability at or above which a frame is flagged voiced
    pub voicing_threshold: f32,
}

impl Default for PyinConfig {
    fn default() -> Self {
        PyinConfig {
            fmin: note_to_hz("C4").unwrap_or(261.63),
            fmax: note_to_hz("C7").unwrap_or(2093.0),
            frame_length: 2048,
            hop_length: 512,
            center: true,
            n_thresholds: 100,
            beta_a: 2.0,
            beta_b: 18.0,
            no_trough_prob: 0.01,
            voicing_threshold: 0.5,
        }
    }
}

impl PyinConfig {
    /// Correlation window length (half the frame)
    pub fn win_length(&self) -> usize {
        self.frame_length / 2
    }
}

/// Probabilistic YIN tracker
pub struct PyinTracker {
    config: PyinConfig,

    /// Normalized prior weight for each threshold
    threshold_weights: Vec<(f64, f64)>,
}

/// Per-frame estimate before voicing decision
#[derive(Debug, Clone, Copy, PartialEq)]
struct FrameEstimate {
    frequency: Option<f32>,
    voiced_prob: f32,
}

impl PyinTracker {
    pub fn new(config: PyinConfig) -> Self {
        let threshold_weights = beta_threshold_weights(config.n_thresholds, config.beta_a, config.beta_b);
        PyinTracker {
            config,
            threshold_weights,
        }
    }

    pub fn config(&self) -> &PyinConfig {
        &self.config
    }

    /// Check the configuration against a sample rate without analysing audio
    pub fn validate(&self, sample_rate: u32) -> Result<(), PitchError> {
        self.lag_range(sample_rate).map(|_| ())
    }

    /// Track pitch across a mono signal
    pub fn track(&self, samples: &[f32], sample_rate: u32) -> Result<PitchTrack, PitchError> {
        let (min_tau, max_tau) = self.lag_range(sample_rate)?;
        let frame_length = self.config.frame_length;
        let hop_length = self.config.hop_length;

        if samples.is_empty() {
            return Ok(PitchTrack {
                frames: Vec::new(),
                hop_length,
                sample_rate,
            });
        }

        let padded = if self.config.center {
            let pad = frame_length / 2;
            let mut padded = vec![0.0f32; samples.len() + 2 * pad];
            padded[pad..pad + samples.len()].copy_from_slice(samples);
            padded
        } else {
            samples.to_vec()
        };

        if padded.len() < frame_length {
            return Err(PitchError::SignalTooShort {
                samples: samples.len(),
                frame_length,
            });
        }

        let n_frames = 1 + (padded.len() - frame_length) / hop_length;
        let mut frames = Vec::with_capacity(n_frames);

        for i in 0..n_frames {
            let start = i * hop_length;
            let estimate = self.estimate_frame(
                &padded[start..start + frame_length],
                sample_rate,
                min_tau,
                max_tau,
            );

            let time = frames_to_time(i, hop_length, sample_rate);
            let in_range = estimate
                .frequency
                .map(|f| f >= self.config.fmin && f <= self.config.fmax)
                .unwrap_or(false);
            let voiced = in_range && estimate.voiced_prob >= self.config.voicing_threshold;

            let frame = match estimate.frequency {
                Some(f) if voiced => Frame::voiced(time, f, estimate.voiced_prob),
                _ => Frame::unvoiced(time, estimate.voiced_prob),
            };
            frames.push(frame);
        }

        log::debug!(
            "pYIN tracked {} frames ({} voiced) at {} Hz",
            frames.len(),
            frames.iter().filter(|f| f.voiced).count(),
            sample_rate
        );

        Ok(PitchTrack {
            frames,
            hop_length,
            sample_rate,
        })
    }

    /// Lag search range `[sr / fmax, sr / fmin]`, clamped to the frame
    fn lag_range(&self, sample_rate: u32) -> Result<(usize, usize), PitchError> {
        let config = &self.config;
        if sample_rate == 0 {
            return Err(PitchError::InvalidSampleRate(sample_rate));
        }
        if config.hop_length == 0 || config.frame_length < 4 {
            return Err(PitchError::InvalidFrameSize {
                frame_length: config.frame_length,
                hop_length: config.hop_length,
            });
        }
        if !(config.fmin > 0.0 && config.fmin < config.fmax) {
            return Err(PitchError::InvalidRange {
                fmin: config.fmin,
                fmax: config.fmax,
            });
        }

        let sr = sample_rate as f32;
        let min_tau = ((sr / config.fmax).floor() as usize).max(1);
        // Leave room for the lookahead of the local minimum check
        let lag_limit = config.frame_length - config.win_length() - 2;
        let max_tau = ((sr / config.fmin).ceil() as usize).min(lag_limit);

        if min_tau >= max_tau {
            return Err(PitchError::InvalidRange {
                fmin: config.fmin,
                fmax: config.fmax,
            });
        }

        Ok((min_tau, max_tau))
    }

    /// Estimate pitch and voicing probability for one frame
    fn estimate_frame(
        &self,
        frame: &[f32],
        sample_rate: u32,
        min_tau: usize,
        max_tau: usize,
    ) -> FrameEstimate {
        let win = self.config.win_length();

        let energy: f64 = frame[..win].iter().map(|&x| (x as f64) * (x as f64)).sum();
        if energy < SILENCE_ENERGY {
            return FrameEstimate {
                frequency: None,
                voiced_prob: 0.0,
            };
        }

        let diff = difference_function(frame, win, max_tau + 1);
        let cmndf = cumulative_mean_normalized_difference(&diff);

        let troughs: Vec<usize> = (min_tau..=max_tau)
            .filter(|&tau| cmndf[tau] < cmndf[tau - 1] && cmndf[tau] <= cmndf[tau + 1])
            .collect();

        if troughs.is_empty() {
            return FrameEstimate {
                frequency: None,
                voiced_prob: 0.0,
            };
        }

        let probs = self.trough_probabilities(&cmndf, &troughs);

        let (best_idx, _) = probs
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, &p)| if p > best.1 { (i, p) } else { best });
        let voiced_prob = probs.iter().sum::<f64>().clamp(0.0, 1.0) as f32;

        let tau = parabolic_interpolation(&cmndf, troughs[best_idx]);
        let frequency = if tau > 0.0 {
            Some((sample_rate as f64 / tau) as f32)
        } else {
            None
        };

        FrameEstimate {
            frequency,
            voiced_prob,
        }
    }

    /// Distribute the threshold prior over the candidate troughs
    fn trough_probabilities(&self, cmndf: &[f64], troughs: &[usize]) -> Vec<f64> {
        let mut probs = vec![0.0; troughs.len()];

        let global_min = troughs
            .iter()
            .enumerate()
            .fold((0, f64::INFINITY), |best, (i, &tau)| {
                if cmndf[tau] < best.1 {
                    (i, cmndf[tau])
                } else {
                    best
                }
            })
            .0;

        for &(threshold, weight) in &self.threshold_weights {
            match troughs.iter().position(|&tau| cmndf[tau] < threshold) {
                Some(i) => probs[i] += weight,
                None => probs[global_min] += weight * self.config.no_trough_prob as f64,
            }
        }

        probs
    }
}

/// Beta(a, b) prior over thresholds `1/n, 2/n, ..., 1`, normalized to sum 1
fn beta_threshold_weights(n: usize, a: f32, b: f32) -> Vec<(f64, f64)> {
    if n == 0 {
        return Vec::new();
    }

    let (a, b) = (a as f64, b as f64);
    let raw: Vec<(f64, f64)> = (1..=n)
        .map(|k| {
            let t = k as f64 / n as f64;
            (t, t.powf(a - 1.0) * (1.0 - t).powf(b - 1.0))
        })
        .collect();

    let total: f64 = raw.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return raw.into_iter().map(|(t, _)| (t, 1.0 / n as f64)).collect();
    }

    raw.into_iter().map(|(t, w)| (t, w / total)).collect()
}

/// YIN difference function d(tau) for tau in `0..=max_lag`
fn difference_function(frame: &[f32], win: usize, max_lag: usize) -> Vec<f64> {
    (0..=max_lag)
        .map(|tau| {
            frame[..win]
                .iter()
                .zip(&frame[tau..tau + win])
                .map(|(&a, &b)| {
                    let d = (a - b) as f64;
                    d * d
                })
                .sum()
        })
        .collect()
}

/// Cumulative mean normalized difference d'(tau)
fn cumulative_mean_normalized_difference(diff: &[f64]) -> Vec<f64> {
    let mut cmndf = vec![1.0; diff.len()];
    let mut running_sum = 0.0;

    for tau in 1..diff.len() {
        running_sum += diff[tau];
        cmndf[tau] = if running_sum > 0.0 {
            diff[tau] * tau as f64 / running_sum
        } else {
            1.0
        };
    }

    cmndf
}

/// Sub-sample refinement of a trough position
fn parabolic_interpolation(values: &[f64], tau: usize) -> f64 {
    if tau == 0 || tau + 1 >= values.len() {
        return tau as f64;
    }

    let s0 = values[tau - 1];
    let s1 = values[tau];
    let s2 = values[tau + 1];
    let adjustment = (s0 - s2) / (2.0 * (s0 - 2.0 * s1 + s2));

    if adjustment.is_finite() && adjustment.abs() < 1.0 {
        tau as f64 + adjustment
    } else {
        tau as f64
    }
}

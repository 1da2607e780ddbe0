// Sample rate conversion
// Band-limited sinc resampling of mono signals via rubato

use rubato::{Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction};
use serde::{Deserialize, Serialize};

use super::ingest::AudioError;

/// Trade-off between resampling speed and fidelity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleQuality {
    Quick,
    #[default]
    Medium,
    High,
}

impl ResampleQuality {
    /// (sinc length, oversampling factor)
    fn sinc_params(self) -> (usize, usize) {
        match self {
            ResampleQuality::Quick => (64, 64),
            ResampleQuality::Medium => (128, 128),
            ResampleQuality::High => (256, 256),
        }
    }
}

/// Resample a mono signal from `from_rate` to `to_rate`
///
/// The output is aligned with the input (output sample `i` sits at time
/// `i / to_rate`) and has `round(len * to_rate / from_rate)` samples.
pub fn resample_mono(
    samples: &[f32],
    from_rate: u32,
    to_rate: u32,
    quality: ResampleQuality,
) -> Result<Vec<f32>, AudioError> {
    if from_rate == 0 || to_rate == 0 {
        return Err(AudioError::InvalidData);
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let (sinc_len, oversampling) = quality.sinc_params();
    let params = SincInterpolationParameters {
        sinc_len,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: oversampling,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let expected = (samples.len() as f64 * ratio).round() as usize;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, samples.len(), 1)
        .map_err(|e| AudioError::ResampleError(e.to_string()))?;

    let input = vec![samples.to_vec()];

    let mut output = resampler
        .process(&input, None)
        .map_err(|e| AudioError::ResampleError(e.to_string()))?
        .swap_remove(0);

    // rubato already compensates its filter delay; only top up a short tail
    while output.len() < expected {
        let tail = resampler
            .process_partial::<Vec<f32>>(None, None)
            .map_err(|e| AudioError::ResampleError(e.to_string()))?
            .swap_remove(0);
        if tail.is_empty() {
            break;
        }
        output.extend(tail);
    }

    output.truncate(expected);
    output.resize(expected, 0.0);

    log::debug!(
        "Resampled {} samples at {} Hz to {} samples at {} Hz",
        samples.len(),
        from_rate,
        output.len(),
        to_rate
    );

    Ok(output)
}

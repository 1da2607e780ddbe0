// Pitch track smoothing
// Median filtering of frequency estimates to suppress octave jumps and jitter

use super::backend::PitchError;
use super::types::Frame;

/// Median-filter a sequence of optional values
///
/// Each defined value is replaced by the median of the defined values in a
/// window of `kernel_size` centred on it; the window shrinks at the edges.
/// Undefined values stay undefined.
pub fn median_filter(values: &[Option<f32>], kernel_size: usize) -> Result<Vec<Option<f32>>, PitchError> {
    if kernel_size == 0 || kernel_size % 2 == 0 {
        return Err(PitchError::InvalidKernel(kernel_size));
    }

    let half = kernel_size / 2;
    let mut window: Vec<f32> = Vec::with_capacity(kernel_size);

    let filtered = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            value.map(|v| {
                let lo = i.saturating_sub(half);
                let hi = (i + half + 1).min(values.len());

                window.clear();
                window.extend(values[lo..hi].iter().flatten());
                if window.is_empty() {
                    return v;
                }

                window.sort_by(|a, b| a.total_cmp(b));
                let mid = window.len() / 2;
                if window.len() % 2 == 1 {
                    window[mid]
                } else {
                    0.5 * (window[mid - 1] + window[mid])
                }
            })
        })
        .collect();

    Ok(filtered)
}

/// Median-filter the frequencies of a frame sequence
/// Voicing flags and confidences are left untouched
pub fn smooth_frames(frames: &[Frame], kernel_size: usize) -> Result<Vec<Frame>, PitchError> {
    let frequencies: Vec<Option<f32>> = frames.iter().map(|f| f.frequency).collect();
    let filtered = median_filter(&frequencies, kernel_size)?;

    Ok(frames
        .iter()
        .zip(filtered)
        .map(|(frame, frequency)| Frame { frequency, ..*frame })
        .collect())
}

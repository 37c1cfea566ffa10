//! Signal Building Blocks
//!
//! Leaf components shared by the tooth-mesh, bearing and degradation
//! synthesizers:
//!
//! - **amplitude**: per-value multipliers (constant, gaussian, repeated)
//! - **scale**: torque/metric dependent multipliers (linear, polynomial, exponential)
//! - **waveform**: closed-form carriers (Gaussian pulse, sine)
//! - **shifter**: pulse placement along a time grid with center bookkeeping
//! - **window**: full/real sample grids and trim offsets
//!
//! All vectors are plain `Vec<f64>` sample buffers; a "column" is one
//! sample buffer as long as the time grid it was built on.

pub mod amplitude;
pub mod scale;
pub mod shifter;
pub mod waveform;
pub mod window;

pub use amplitude::AmplitudeModel;
pub use scale::{ScaleBounds, ScaleModel};
pub use shifter::{MeshEventBounds, SignalShifter};
pub use waveform::{GaussPulse, PulsePrototype, Sine};
pub use window::{SampleWindow, TrimWindow};

use thiserror::Error;

/// Errors raised while evaluating signal models.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("amplitude method '{method}' is missing its parameters: {detail}")]
    InvalidAmplitude { method: &'static str, detail: String },

    #[error("scale model has a degenerate value range [{value_min}, {value_max}]")]
    DegenerateScaleRange { value_min: f64, value_max: f64 },

    #[error("mesh event bounds deviate by {gap} samples at event {event} (lower {lower}, previous upper {previous_upper})")]
    BoundsDeviation {
        event: usize,
        lower: i64,
        previous_upper: i64,
        gap: i64,
    },

    #[error("time grid needs at least {needed} samples, got {got}")]
    GridTooShort { needed: usize, got: usize },

    #[error("invalid noise distribution: {0}")]
    Distribution(String),
}

// ============================================================================
// Vector helpers
// ============================================================================

/// Tile `values` until `len` entries exist, truncating the last repetition.
///
/// Returns an all-zero vector if `values` is empty.
pub fn repeat_to_len(values: &[f64], len: usize) -> Vec<f64> {
    if values.is_empty() {
        return vec![0.0; len];
    }
    values.iter().copied().cycle().take(len).collect()
}

/// Half-open evenly spaced range, same length rule as `numpy.arange`.
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let count = sample_count(stop - start, step);
    (0..count).map(|i| start + i as f64 * step).collect()
}

/// Number of grid points in a half-open span of `length` with spacing `step`.
///
/// A small tolerance keeps `2.05 / 0.0002` from rounding up to an extra sample.
pub fn sample_count(length: f64, step: f64) -> usize {
    if !(length > 0.0 && step > 0.0) {
        return 0;
    }
    let ratio = length / step;
    let count = (ratio - 1e-9).ceil();
    if count < 0.0 {
        0
    } else {
        count as usize
    }
}

/// Greatest common divisor.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b > 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Least common multiple; zero if either argument is zero.
pub fn lcm(a: u64, b: u64) -> u64 {
    if a == 0 || b == 0 {
        return 0;
    }
    a / gcd(a, b) * b
}

/// Element-wise sum of equally long columns into `acc`.
pub(crate) fn add_into(acc: &mut [f64], column: &[f64]) {
    for (a, c) in acc.iter_mut().zip(column) {
        *a += c;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_to_len_tiles_and_truncates() {
        assert_eq!(repeat_to_len(&[1.0, 2.0, 3.0], 7), vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0]);
        assert_eq!(repeat_to_len(&[1.0, 2.0, 3.0], 2), vec![1.0, 2.0]);
        assert_eq!(repeat_to_len(&[], 3), vec![0.0; 3]);
    }

    #[test]
    fn test_lcm_of_reference_teeth() {
        assert_eq!(lcm(21, 41), 861);
        assert_eq!(lcm(10, 10), 10);
        assert_eq!(lcm(13, 17), 221);
        assert_eq!(gcd(12, 18), 6);
    }

    #[test]
    fn test_arange_matches_half_open_length() {
        let grid = arange(0.0, 0.1, 1.0 / 5000.0);
        assert_eq!(grid.len(), 500);
        assert!(grid[0].abs() < f64::EPSILON);
        assert!((grid[499] - 499.0 / 5000.0).abs() < 1e-12);

        // 2.05 s at 5 kHz must not pick up a spurious 10251st sample
        assert_eq!(sample_count(2.05, 1.0 / 5000.0), 10_250);
        assert_eq!(sample_count(0.0, 0.1), 0);
    }
}

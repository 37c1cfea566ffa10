//! Closed-form carriers: a Gaussian-modulated pulse for tooth mesh events
//! and a sine for stationary bearing frequencies.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Values at or below this magnitude are treated as zero in a pulse.
const PULSE_ZERO_THRESHOLD: f64 = 1e-5;

fn default_bandwidth() -> f64 {
    0.5
}

fn default_bandwidth_reference_db() -> f64 {
    -6.0
}

/// Gaussian-modulated cosine pulse.
///
/// `bandwidth` is the fractional bandwidth in the frequency domain,
/// measured at `bandwidth_reference_db` below the peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussPulse {
    #[serde(default = "default_bandwidth")]
    pub bandwidth: f64,
    #[serde(default = "default_bandwidth_reference_db")]
    pub bandwidth_reference_db: f64,
}

impl Default for GaussPulse {
    fn default() -> Self {
        Self {
            bandwidth: default_bandwidth(),
            bandwidth_reference_db: default_bandwidth_reference_db(),
        }
    }
}

impl GaussPulse {
    /// Envelope decay coefficient for carrier frequency `fc`.
    fn decay(&self, fc: f64) -> f64 {
        let reference = 10f64.powf(self.bandwidth_reference_db / 20.0);
        -(PI * fc * self.bandwidth).powi(2) / (4.0 * reference.ln())
    }

    /// Pulse value at time `t` for carrier frequency `fc`.
    pub fn evaluate(&self, t: f64, fc: f64) -> f64 {
        let a = self.decay(fc);
        (-a * t * t).exp() * (2.0 * PI * fc * t).cos()
    }

    /// Build a prototype pulse on `time` mirrored around zero.
    ///
    /// `time` must start at zero. The mirrored axis lets the pulse be
    /// centred on any sample of the original grid without edge effects.
    pub fn prototype(&self, time: &[f64], fc: f64) -> PulsePrototype {
        let a = self.decay(fc);
        let n = time.len();
        if n == 0 {
            return PulsePrototype::silent();
        }

        let mirrored = time.iter().rev().map(|t| -t).chain(time.iter().skip(1).copied());
        let mut samples: Vec<f64> = mirrored
            .map(|t| {
                let v = (-a * t * t).exp() * (2.0 * PI * fc * t).cos();
                if v.abs() <= PULSE_ZERO_THRESHOLD {
                    0.0
                } else {
                    v
                }
            })
            .collect();
        let mut center = n - 1;

        let Some(first) = samples.iter().position(|v| *v != 0.0) else {
            return PulsePrototype::silent();
        };
        // keep one leading zero
        let cut = first.saturating_sub(1);
        samples.drain(..cut);
        center -= cut;

        if let Some(last) = samples.iter().rposition(|v| *v != 0.0) {
            samples.truncate(last + 2);
        }

        PulsePrototype { samples, center }
    }
}

/// A trimmed pulse with the index of its time-zero sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PulsePrototype {
    samples: Vec<f64>,
    center: usize,
}

impl PulsePrototype {
    fn silent() -> Self {
        Self {
            samples: vec![0.0],
            center: 0,
        }
    }

    pub fn center(&self) -> usize {
        self.center
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Value `offset` samples away from the pulse center; zero outside.
    pub fn value_at(&self, offset: i64) -> f64 {
        let idx = self.center as i64 + offset;
        if idx < 0 {
            return 0.0;
        }
        self.samples.get(idx as usize).copied().unwrap_or(0.0)
    }

    /// Add `weight` times the pulse, centred on sample `at`, into `column`.
    pub fn add_centered(&self, column: &mut [f64], at: usize, weight: f64) {
        let first = at as i64 - self.center as i64;
        for (k, v) in self.samples.iter().enumerate() {
            let idx = first + k as i64;
            if idx < 0 {
                continue;
            }
            match column.get_mut(idx as usize) {
                Some(slot) => *slot += weight * v,
                None => break,
            }
        }
    }
}

/// Stationary sine carrier.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sine;

impl Sine {
    pub fn sample(time: &[f64], frequency: f64, amplitude: f64) -> Vec<f64> {
        time.iter()
            .map(|t| (2.0 * PI * frequency * t).sin() * amplitude)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::arange;

    #[test]
    fn test_pulse_peaks_at_center() {
        let time = arange(0.0, 0.1, 1.0 / 5000.0);
        let proto = GaussPulse::default().prototype(&time, 420.0);
        assert!((proto.value_at(0) - 1.0).abs() < 1e-12, "Pulse must be 1 at time zero");
        assert!(proto.value_at(1).abs() < 1.0);
        // symmetric around zero
        for k in 1..20 {
            assert!((proto.value_at(k) - proto.value_at(-k)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_pulse_is_trimmed() {
        let time = arange(0.0, 1.0, 1.0 / 5000.0);
        let proto = GaussPulse::default().prototype(&time, 420.0);
        assert!(proto.len() < 200, "Trimmed pulse too long: {}", proto.len());
        assert_eq!(proto.value_at(-(proto.center() as i64) - 5), 0.0);
        assert_eq!(proto.value_at(10_000), 0.0);
    }

    #[test]
    fn test_gauss_pulse_reference_bandwidth() {
        // envelope at -6 dB bandwidth edge: exp(-a t^2) with scipy's coefficient
        let pulse = GaussPulse::default();
        let a = pulse.decay(1000.0);
        let expected = (PI * 1000.0 * 0.5).powi(2) / (4.0 * -(10f64.powf(-0.3)).ln());
        assert!((a - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn test_add_centered_clips_at_edges() {
        let time = arange(0.0, 0.05, 1.0 / 5000.0);
        let proto = GaussPulse::default().prototype(&time, 420.0);
        let mut column = vec![0.0; 50];
        proto.add_centered(&mut column, 0, 2.0);
        assert!((column[0] - 2.0).abs() < 1e-12);
        proto.add_centered(&mut column, 49, 1.0);
        assert!((column[49] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_sine_quarter_period() {
        let s = Sine::sample(&[0.0, 0.25], 1.0, 2.0);
        assert!(s[0].abs() < 1e-12);
        assert!((s[1] - 2.0).abs() < 1e-12);
    }
}

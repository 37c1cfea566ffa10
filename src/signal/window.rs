//! Sample grids
//!
//! Two grids at the same sample rate:
//!
//! - **full**: an integer number of `lcm(teeth_in, teeth_out)` mesh periods,
//!   strictly longer than the requested interval, so every tooth pairing
//!   appears at least once.
//! - **real**: exactly the requested interval.
//!
//! Signals are synthesized on the full grid and trimmed to a real-length
//! window, unless fixed-start mode synthesizes directly on the real grid.

use rand::Rng;
use serde::Serialize;

use super::{arange, lcm, SignalError};

/// `[start, stop)` sample range cut from the synthesis grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrimWindow {
    pub start: usize,
    pub stop: usize,
}

impl TrimWindow {
    pub fn apply<'a>(&self, signal: &'a [f64]) -> &'a [f64] {
        let stop = self.stop.min(signal.len());
        &signal[self.start.min(stop)..stop]
    }
}

#[derive(Debug, Clone)]
pub struct SampleWindow {
    sample_rate: f64,
    sample_interval: f64,
    coverage: f64,
    coverage_multiple: u64,
    teeth_lcm: u64,
    full_time: Vec<f64>,
    real_time: Vec<f64>,
    fixed_start: bool,
}

impl SampleWindow {
    pub fn new(
        rotational_frequency_in: f64,
        teeth_in: u32,
        teeth_out: u32,
        sample_interval: f64,
        sample_rate: f64,
        fixed_start: bool,
    ) -> Result<Self, SignalError> {
        let teeth_lcm = lcm(u64::from(teeth_in), u64::from(teeth_out));
        let mesh_period_in = 1.0 / rotational_frequency_in / f64::from(teeth_in);
        let coverage = mesh_period_in * teeth_lcm as f64;

        let mut multiple = 1u64;
        if coverage > 0.0 && coverage.is_finite() {
            multiple = (sample_interval / coverage).floor() as u64 + 1;
            while multiple > 1 && (multiple - 1) as f64 * coverage > sample_interval {
                multiple -= 1;
            }
            while multiple as f64 * coverage <= sample_interval {
                multiple += 1;
            }
        }

        let step = 1.0 / sample_rate;
        let full_time = arange(0.0, multiple as f64 * coverage, step);
        let real_time = arange(0.0, sample_interval, step);
        if real_time.is_empty() || full_time.len() < real_time.len() {
            return Err(SignalError::GridTooShort {
                needed: real_time.len().max(1),
                got: full_time.len(),
            });
        }

        Ok(Self {
            sample_rate,
            sample_interval,
            coverage,
            coverage_multiple: multiple,
            teeth_lcm,
            full_time,
            real_time,
            fixed_start,
        })
    }

    /// Minimal torque grid: one `lcm` mesh cycle at the sample rate.
    ///
    /// A torque profile of this length covers every tooth pairing once.
    pub fn minimum_torque_time(
        rotational_frequency_in: f64,
        sample_rate: f64,
        teeth_in: u32,
        teeth_out: u32,
    ) -> Vec<f64> {
        let teeth_lcm = lcm(u64::from(teeth_in), u64::from(teeth_out));
        let min_time = 1.0 / rotational_frequency_in / f64::from(teeth_in) * teeth_lcm as f64;
        arange(0.0, min_time, 1.0 / sample_rate)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn sample_interval(&self) -> f64 {
        self.sample_interval
    }

    /// `lcm(teeth_in, teeth_out)` mesh periods of the input gear, in seconds.
    pub fn coverage(&self) -> f64 {
        self.coverage
    }

    /// How many coverage periods the full grid spans.
    pub fn coverage_multiple(&self) -> u64 {
        self.coverage_multiple
    }

    pub fn teeth_lcm(&self) -> u64 {
        self.teeth_lcm
    }

    pub fn full_duration(&self) -> f64 {
        self.coverage_multiple as f64 * self.coverage
    }

    pub fn full_time(&self) -> &[f64] {
        &self.full_time
    }

    pub fn real_time(&self) -> &[f64] {
        &self.real_time
    }

    pub fn full_len(&self) -> usize {
        self.full_time.len()
    }

    pub fn real_len(&self) -> usize {
        self.real_time.len()
    }

    pub fn fixed_start(&self) -> bool {
        self.fixed_start
    }

    /// Grid the element signals are computed on.
    pub fn synthesis_time(&self) -> &[f64] {
        if self.fixed_start {
            &self.real_time
        } else {
            &self.full_time
        }
    }

    pub fn synthesis_len(&self) -> usize {
        self.synthesis_time().len()
    }

    /// Pick the real-length window for one vibration run.
    pub fn draw_trim<R: Rng + ?Sized>(&self, rng: &mut R) -> TrimWindow {
        let real = self.real_len();
        if self.fixed_start {
            return TrimWindow { start: 0, stop: real };
        }
        let slack = self.full_len() - real;
        let start = rng.gen_range(0..=slack);
        TrimWindow {
            start,
            stop: start + real,
        }
    }
}

//! Scale models
//!
//! Map a torque (or pitting) series onto a multiplier series. The input is
//! divided by `norm_divisor`, transformed (identity, power, exp), and then
//! mapped linearly from the transformed `[value_min, value_max]` onto
//! `[scale_min, scale_max]`. Values outside the domain are extrapolated,
//! not clipped.

use serde::{Deserialize, Serialize};

use super::SignalError;

fn default_norm_divisor() -> f64 {
    1.0
}

/// Domain and range of a scale model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleBounds {
    pub scale_min: f64,
    pub scale_max: f64,
    pub value_min: f64,
    pub value_max: f64,
    #[serde(default = "default_norm_divisor")]
    pub norm_divisor: f64,
    /// Only read by the polynomial method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exponent: Option<f64>,
}

impl ScaleBounds {
    pub fn new(scale_min: f64, scale_max: f64, value_min: f64, value_max: f64) -> Self {
        Self {
            scale_min,
            scale_max,
            value_min,
            value_max,
            norm_divisor: 1.0,
            exponent: None,
        }
    }

    pub fn with_exponent(mut self, exponent: f64) -> Self {
        self.exponent = Some(exponent);
        self
    }
}

/// Scaling method, tagged by `method` in configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ScaleModel {
    Linear(ScaleBounds),
    Polynomial(ScaleBounds),
    Exponential(ScaleBounds),
    /// Constant base, no dependency on the input.
    #[default]
    None,
}

/// Whether the mapped value is added to a base of one or of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleBase {
    /// `1 + mapped`: a multiplicative gain around unity (torque influence).
    Ones,
    /// `0 + mapped`: the mapped value itself (pitting to burst amplitude).
    Zeros,
}

impl ScaleBase {
    fn value(self) -> f64 {
        match self {
            Self::Ones => 1.0,
            Self::Zeros => 0.0,
        }
    }
}

impl ScaleModel {
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::Linear(_) => "linear",
            Self::Polynomial(_) => "polynomial",
            Self::Exponential(_) => "exponential",
            Self::None => "none",
        }
    }

    pub fn bounds(&self) -> Option<&ScaleBounds> {
        match self {
            Self::Linear(b) | Self::Polynomial(b) | Self::Exponential(b) => Some(b),
            Self::None => None,
        }
    }

    fn transform(&self, x: f64) -> f64 {
        match self {
            Self::Linear(_) | Self::None => x,
            Self::Polynomial(b) => x.powf(b.exponent.unwrap_or(1.0)),
            Self::Exponential(_) => x.exp(),
        }
    }

    /// Scale every value of `input`.
    pub fn apply(&self, input: &[f64], base: ScaleBase) -> Result<Vec<f64>, SignalError> {
        let base = base.value();
        let Some(bounds) = self.bounds() else {
            return Ok(vec![base; input.len()]);
        };

        let lo = self.transform(bounds.value_min);
        let hi = self.transform(bounds.value_max);
        let span = hi - lo;
        if !span.is_finite() || span == 0.0 {
            return Err(SignalError::DegenerateScaleRange {
                value_min: bounds.value_min,
                value_max: bounds.value_max,
            });
        }
        let gain = (bounds.scale_max - bounds.scale_min) / span;

        Ok(input
            .iter()
            .map(|&v| {
                let t = self.transform(v / bounds.norm_divisor);
                base + bounds.scale_min + (t - lo) * gain
            })
            .collect())
    }

    /// Scale a series, truncated to `len` samples.
    pub fn apply_truncated(
        &self,
        input: &[f64],
        len: usize,
        base: ScaleBase,
    ) -> Result<Vec<f64>, SignalError> {
        self.apply(&input[..len.min(input.len())], base)
    }
}

//! Amplitude models
//!
//! Produce one multiplier per value. Used three ways: tooth-indexed gear
//! amplitudes, sample-indexed bearing amplitudes, and additive noise.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::{repeat_to_len, SignalError};

/// Amplitude (or noise) generation method.
///
/// Serialized as a table tagged by `method`, e.g.
/// `{ method = "gaussian", mu = 0.0, sigma = 0.005 }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum AmplitudeModel {
    /// Every value equals `constant`.
    Constant { constant: f64 },
    /// The list is tiled to the requested length.
    ConstantRepeat { constants: Vec<f64> },
    /// Independent normal draws per value.
    Gaussian { mu: f64, sigma: f64 },
    /// `draws` normal values, tiled to the requested length.
    GaussianRepeat { mu: f64, sigma: f64 },
    /// All zeros. Mutes a signal when used as amplitude; disables noise.
    #[default]
    None,
}

impl AmplitudeModel {
    /// Method name as written in configuration files.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::Constant { .. } => "constant",
            Self::ConstantRepeat { .. } => "constant_repeat",
            Self::Gaussian { .. } => "gaussian",
            Self::GaussianRepeat { .. } => "gaussian_repeat",
            Self::None => "none",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Generate `len` values.
    ///
    /// `draws` is the number of independent values drawn before tiling for
    /// the repeat methods (gear amplitudes draw one per tooth). Non-repeat
    /// methods ignore it.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        draws: usize,
        len: usize,
    ) -> Result<Vec<f64>, SignalError> {
        match self {
            Self::Constant { constant } => Ok(vec![*constant; len]),
            Self::ConstantRepeat { constants } => {
                if constants.is_empty() {
                    return Err(SignalError::InvalidAmplitude {
                        method: self.method_name(),
                        detail: "constants list is empty".to_string(),
                    });
                }
                Ok(repeat_to_len(constants, len))
            }
            Self::Gaussian { mu, sigma } => sample_normal(rng, *mu, *sigma, len),
            Self::GaussianRepeat { mu, sigma } => {
                let drawn = sample_normal(rng, *mu, *sigma, draws.max(1))?;
                Ok(repeat_to_len(&drawn, len))
            }
            Self::None => Ok(vec![0.0; len]),
        }
    }

    /// Additive noise of length `len`. `None` yields silence.
    pub fn noise<R: Rng + ?Sized>(&self, rng: &mut R, len: usize) -> Result<Vec<f64>, SignalError> {
        self.generate(rng, len, len)
    }
}

fn sample_normal<R: Rng + ?Sized>(
    rng: &mut R,
    mu: f64,
    sigma: f64,
    count: usize,
) -> Result<Vec<f64>, SignalError> {
    // Normal::new only rejects a non-finite sigma
    if !(sigma.is_finite() && sigma >= 0.0) {
        return Err(SignalError::Distribution(format!("sigma must be finite and >= 0, got {sigma}")));
    }
    let normal = Normal::new(mu, sigma).map_err(|e| SignalError::Distribution(e.to_string()))?;
    Ok((0..count).map(|_| normal.sample(rng)).collect())
}

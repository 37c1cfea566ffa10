//! Gearbox configuration records.
//!
//! Every physical element (gear, bearing, degradation model) has an explicit
//! typed record. Required fields carry no serde default; the raw TOML is
//! checked for them before deserialization so a missing key surfaces as a
//! named [`ConfigError::MissingDeclaration`] instead of a generic parse error.

use rand::Rng;
use rand_distr::{Distribution, LogNormal, Normal, Uniform};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;
use crate::signal::{AmplitudeModel, GaussPulse, ScaleBounds, ScaleModel};

// ============================================================================
// Root
// ============================================================================

/// Complete gearbox description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearboxConfig {
    pub simulation: SimulationConfig,
    pub gear_in: GearConfig,
    pub gear_out: GearConfig,
    #[serde(default)]
    pub bearings: Vec<BearingConfig>,
}

/// Shaft speed, acquisition grid and randomness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Input shaft rotational frequency (Hz).
    pub rotational_frequency_in: f64,
    /// Length of one acquired waveform (s).
    pub sample_interval: f64,
    /// Samples per second.
    pub sample_rate: f64,
    /// Top-level seed. Absent means a seed is drawn from entropy and logged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Acquire every waveform from sample zero of the real grid.
    #[serde(default = "default_fixed_start")]
    pub fixed_start: bool,
    /// Retry limit for the draw-and-fit of the initial tooth states.
    #[serde(default = "default_max_state0_attempts")]
    pub max_state0_attempts: u32,
}

fn default_fixed_start() -> bool {
    true
}

fn default_max_state0_attempts() -> u32 {
    defaults::MAX_STATE0_ATTEMPTS
}

// ============================================================================
// Gears
// ============================================================================

/// One gear: vibration model plus its fatigue model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearConfig {
    pub no_teeth: u32,
    /// Harmonic orders of the mesh pulse train (1 = fundamental).
    pub harmonics: Vec<u32>,
    /// Per-harmonic weights; all ones when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harmonics_fac: Option<Vec<f64>>,
    pub signal: PulseCarrier,
    /// Tooth-indexed amplitude.
    pub amplitude: AmplitudeModel,
    pub noise: AmplitudeModel,
    pub torque_scale: ScaleModel,
    pub degradation: DegradationConfig,
    #[serde(default)]
    pub degradation_signal: DegradationSignalConfig,
}

impl GearConfig {
    /// Harmonic weights, defaulting to one per harmonic.
    pub fn harmonic_weights(&self) -> Vec<f64> {
        self.harmonics_fac
            .clone()
            .unwrap_or_else(|| vec![1.0; self.harmonics.len()])
    }
}

/// Non-stationary carrier of a tooth mesh event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PulseCarrier {
    Gausspulse(GaussPulse),
}

impl PulseCarrier {
    pub fn gauss_pulse(&self) -> GaussPulse {
        match self {
            Self::Gausspulse(p) => *p,
        }
    }
}

/// Burst injected for pitted teeth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DegradationSignalConfig {
    /// Maps pitting size onto burst amplitude (added to a zero base).
    pub scale: ScaleModel,
    /// Multiply the burst by half the gear's torque scale.
    pub torque_influence: bool,
    pub noise: AmplitudeModel,
}

impl Default for DegradationSignalConfig {
    fn default() -> Self {
        Self {
            scale: ScaleModel::Linear(ScaleBounds::new(0.0, 1.0, 0.0, 4.0).with_exponent(2.0)),
            torque_influence: true,
            noise: AmplitudeModel::Gaussian {
                mu: 0.0,
                sigma: 0.005,
            },
        }
    }
}

// ============================================================================
// Bearings
// ============================================================================

/// Shaft a bearing sits on; selects rotational frequency and torque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shaft {
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BearingConfig {
    pub name: String,
    pub shaft: Shaft,
    pub no_elements: u32,
    pub inner_ring: FaultSourceConfig,
    pub rolling_element: FaultSourceConfig,
    pub outer_ring: FaultSourceConfig,
}

/// One bearing fault frequency family (sine carrier).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultSourceConfig {
    pub harmonics: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harmonics_fac: Option<Vec<f64>>,
    /// Sample-indexed amplitude.
    pub amplitude: AmplitudeModel,
    pub noise: AmplitudeModel,
    pub torque_scale: ScaleModel,
}

impl FaultSourceConfig {
    pub fn harmonic_weights(&self) -> Vec<f64> {
        self.harmonics_fac
            .clone()
            .unwrap_or_else(|| vec![1.0; self.harmonics.len()])
    }
}

// ============================================================================
// Degradation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradationConfig {
    /// Number of teeth that develop pitting; zero disables the model.
    pub failing_teeth: u32,
    pub chances: ChanceFactors,
    /// Initiation load cycle (input-shaft reference).
    pub n0: SampleDistribution,
    /// Initial pitting size (%).
    pub a0: SampleDistribution,
    /// End-of-life load cycle (input-shaft reference).
    pub neol: SampleDistribution,
    /// End-of-life pitting size (%).
    pub aeol: SampleDistribution,
    pub woehler: WoehlerConfig,
    pub grid: CurveFitGrid,
}

/// Weight multipliers for the failing-tooth draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChanceFactors {
    /// Applied to teeth adjacent to an already drawn tooth.
    pub neighbouring: f64,
    /// Applied to teeth diametrically opposite an already drawn tooth.
    pub opposite: f64,
    /// Applied to the end-of-life position implied by the initiation order.
    pub keep_order: f64,
}

/// Woehler (S-N) curve parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WoehlerConfig {
    /// Woehler exponent.
    pub k: f64,
    /// Reference load cycles (input-shaft reference). Not read by the damage
    /// model, which uses `neol - n0` of each tooth as its life span.
    pub n_ref: f64,
    /// Reference torque (Nm) at which the state distributions apply.
    pub torque_ref: f64,
}

/// Grid-search axes for `a(n) = θ1·exp(θ2·n) + θ3`, each `[start, stop, step]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveFitGrid {
    pub theta1: [f64; 3],
    pub theta2: [f64; 3],
    pub theta3: [f64; 3],
}

impl CurveFitGrid {
    /// Axis values of one `[start, stop, step]` range.
    pub fn axis(range: [f64; 3]) -> Vec<f64> {
        crate::signal::arange(range[0], range[1], range[2])
    }
}

/// Statistical distribution of an initial or end-of-life quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "distribution", rename_all = "lowercase")]
pub enum SampleDistribution {
    Normal { mean: f64, std: f64 },
    /// Parameters of the underlying normal distribution.
    Lognormal { mean: f64, std: f64 },
    Uniform { low: f64, high: f64 },
}

impl SampleDistribution {
    /// Draw `count` values.
    pub fn sample_n<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Result<Vec<f64>, String> {
        match *self {
            Self::Normal { mean, std } => {
                check_spread(std)?;
                let d = Normal::new(mean, std).map_err(|e| e.to_string())?;
                Ok((0..count).map(|_| d.sample(rng)).collect())
            }
            Self::Lognormal { mean, std } => {
                check_spread(std)?;
                let d = LogNormal::new(mean, std).map_err(|e| e.to_string())?;
                Ok((0..count).map(|_| d.sample(rng)).collect())
            }
            Self::Uniform { low, high } => {
                if !(low < high) {
                    return Err(format!("uniform bounds must satisfy low < high, got [{low}, {high})"));
                }
                let d = Uniform::new(low, high);
                Ok((0..count).map(|_| d.sample(rng)).collect())
            }
        }
    }

    pub fn mean(&self) -> f64 {
        match *self {
            Self::Normal { mean, .. } => mean,
            Self::Lognormal { mean, std } => (mean + std * std / 2.0).exp(),
            Self::Uniform { low, high } => (low + high) / 2.0,
        }
    }
}

fn check_spread(std: f64) -> Result<(), String> {
    if std.is_finite() && std >= 0.0 {
        Ok(())
    } else {
        Err(format!("std must be finite and >= 0, got {std}"))
    }
}

// ============================================================================
// Loading
// ============================================================================

impl GearboxConfig {
    /// Load configuration using the standard search order.
    ///
    /// 1. `GEARBOX_CONFIG` environment variable
    /// 2. `./gearbox.toml`
    /// 3. The built-in reference gearbox
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded gearbox config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load gearbox config, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{} points to a non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(defaults::CONFIG_FILE_NAME);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded gearbox config from ./{}", defaults::CONFIG_FILE_NAME);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using reference gearbox", defaults::CONFIG_FILE_NAME);
                }
            }
        }

        info!("No gearbox config found, using reference gearbox");
        Self::reference()
    }

    /// Load from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse, check declarations, deserialize and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let raw: toml::Value = contents
            .parse()
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;

        // Typos never fail a config; they are only reported
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        super::validation::check_required_declarations(&raw)?;

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;

        let (_, range_warnings) = super::validation::validate_physical_ranges(&config);
        for w in range_warnings {
            warn!("{}", w);
        }
        Ok(config)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Saved gearbox config");
        Ok(())
    }

    /// Semantic checks that serde cannot express.
    ///
    /// All violations are collected so an operator sees every problem at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, _) = super::validation::validate_physical_ranges(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Gear ratio `teeth_out / teeth_in`.
    pub fn gear_ratio(&self) -> f64 {
        f64::from(self.gear_out.no_teeth) / f64::from(self.gear_in.no_teeth)
    }

    /// Output shaft rotational frequency (Hz).
    pub fn rotational_frequency_out(&self) -> f64 {
        self.simulation.rotational_frequency_in / self.gear_ratio()
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[source] toml::ser::Error),

    #[error("Missing declaration of key '{0}'")]
    MissingDeclaration(String),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_reference_config_is_valid() {
        let config = GearboxConfig::reference();
        assert!(config.validate().is_ok(), "Reference gearbox must validate: {:?}", config.validate());
        assert!((config.gear_ratio() - 41.0 / 21.0).abs() < 1e-12);
    }

    #[test]
    fn test_toml_roundtrip_preserves_reference() {
        let config = GearboxConfig::reference();
        let toml_str = config.to_toml().unwrap();
        let parsed = GearboxConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gearbox.toml");
        let config = GearboxConfig::reference();
        config.save_to_file(&path).unwrap();
        let loaded = GearboxConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.gear_in.no_teeth, 21);
        assert_eq!(loaded.bearings.len(), 4);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = GearboxConfig::load_from_file(Path::new("/nonexistent/gearbox.toml"));
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }

    #[test]
    fn test_harmonic_weights_default_to_ones() {
        let mut gear = GearboxConfig::reference().gear_in;
        gear.harmonics_fac = None;
        assert_eq!(gear.harmonic_weights(), vec![1.0; gear.harmonics.len()]);
    }

    #[test]
    fn test_zero_sigma_normal_is_constant() {
        let mut rng = StdRng::seed_from_u64(5);
        let d = SampleDistribution::Normal { mean: 4.0, std: 0.0 };
        let v = d.sample_n(&mut rng, 3).unwrap();
        assert!(v.iter().all(|x| (x - 4.0).abs() < 1e-12));
    }

    #[test]
    fn test_negative_std_is_rejected() {
        let mut rng = StdRng::seed_from_u64(5);
        let normal = SampleDistribution::Normal { mean: 1e6, std: -5e4 };
        assert!(normal.sample_n(&mut rng, 3).is_err());
        let lognormal = SampleDistribution::Lognormal { mean: 0.0, std: -0.1 };
        assert!(lognormal.sample_n(&mut rng, 3).is_err());
    }

    #[test]
    fn test_uniform_requires_ordered_bounds() {
        let mut rng = StdRng::seed_from_u64(5);
        let d = SampleDistribution::Uniform { low: 2.0, high: 1.0 };
        assert!(d.sample_n(&mut rng, 1).is_err());
    }

    #[test]
    fn test_validation_error_lists_every_problem() {
        let mut config = GearboxConfig::reference();
        config.simulation.sample_rate = 0.0;
        config.gear_in.harmonics_fac = Some(vec![1.0]);
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.len() >= 2, "Expected both problems reported: {errors:?}");
                let msg = ConfigError::Validation(errors).to_string();
                assert!(msg.contains("sample_rate"));
            }
            other => panic!("Expected validation error, got {other:?}"),
        }
    }
}

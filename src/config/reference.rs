//! Built-in reference gearbox.
//!
//! Two-stage spur gearbox with 21/41 teeth on four rolling bearings. The
//! input gear develops pitting on one tooth; the output gear stays healthy.

use super::gearbox_config::{
    BearingConfig, ChanceFactors, CurveFitGrid, DegradationConfig, DegradationSignalConfig,
    FaultSourceConfig, GearConfig, GearboxConfig, PulseCarrier, SampleDistribution, Shaft,
    SimulationConfig, WoehlerConfig,
};
use super::defaults;
use crate::signal::{AmplitudeModel, GaussPulse, ScaleBounds, ScaleModel};

const REFERENCE_HARMONICS: [u32; 11] = [1, 2, 3, 4, 5, 6, 7, 9, 10, 11, 12];

impl GearboxConfig {
    /// The reference gearbox used when no config file is found.
    pub fn reference() -> Self {
        Self {
            simulation: SimulationConfig {
                rotational_frequency_in: 20.0,
                sample_interval: 1.0,
                sample_rate: 5000.0,
                seed: None,
                fixed_start: true,
                max_state0_attempts: defaults::MAX_STATE0_ATTEMPTS,
            },
            gear_in: GearConfig {
                no_teeth: 21,
                harmonics: REFERENCE_HARMONICS.to_vec(),
                harmonics_fac: Some(vec![
                    0.25, 0.75, 0.475, 0.225, 0.4, 0.525, 0.61, 0.59, 0.46, 0.44, 0.2,
                ]),
                signal: PulseCarrier::Gausspulse(GaussPulse::default()),
                amplitude: AmplitudeModel::GaussianRepeat { mu: 1.8, sigma: 0.2 },
                noise: gear_noise(),
                torque_scale: ScaleModel::None,
                degradation: DegradationConfig {
                    failing_teeth: 1,
                    chances: reference_chances(),
                    n0: SampleDistribution::Normal { mean: 6.875e6, std: 1.053e6 },
                    a0: SampleDistribution::Normal { mean: 0.45, std: 0.205 },
                    neol: SampleDistribution::Normal { mean: 11.39e6, std: 1.053e6 },
                    aeol: SampleDistribution::Normal { mean: 4.0, std: 0.0 },
                    woehler: reference_woehler(),
                    grid: reference_grid(),
                },
                degradation_signal: reference_degradation_signal(),
            },
            gear_out: GearConfig {
                no_teeth: 41,
                harmonics: REFERENCE_HARMONICS.to_vec(),
                harmonics_fac: Some(vec![
                    0.1, 0.8, 0.3, 0.1, 0.1, 0.1, 0.45, 0.15, 0.05, 0.3, 0.1,
                ]),
                signal: PulseCarrier::Gausspulse(GaussPulse::default()),
                amplitude: AmplitudeModel::GaussianRepeat { mu: 1.8, sigma: 0.2 },
                noise: gear_noise(),
                torque_scale: ScaleModel::None,
                degradation: DegradationConfig {
                    failing_teeth: 0,
                    chances: reference_chances(),
                    n0: SampleDistribution::Normal { mean: 6.875e6, std: 1.053e6 },
                    a0: SampleDistribution::Normal { mean: 0.45, std: 0.305 },
                    neol: SampleDistribution::Normal { mean: 10.39e6, std: 1.053e6 },
                    aeol: SampleDistribution::Normal { mean: 4.0, std: 0.0 },
                    woehler: reference_woehler(),
                    grid: reference_grid(),
                },
                degradation_signal: reference_degradation_signal(),
            },
            bearings: vec![
                BearingConfig {
                    name: "Bearing 1".to_string(),
                    shaft: Shaft::Input,
                    no_elements: 11,
                    inner_ring: fault_source(&[10], None, Some(0.16)),
                    rolling_element: fault_source(&[85], None, Some(0.11)),
                    outer_ring: fault_source(&[1], None, None),
                },
                BearingConfig {
                    name: "Bearing 2".to_string(),
                    shaft: Shaft::Input,
                    no_elements: 9,
                    inner_ring: fault_source(&[8, 12, 16], Some(&[1.0, 1.0, 0.35]), Some(0.132)),
                    rolling_element: fault_source(&[85], None, None),
                    outer_ring: fault_source(&[30], None, Some(0.05)),
                },
                BearingConfig {
                    name: "Bearing 3".to_string(),
                    shaft: Shaft::Output,
                    no_elements: 13,
                    inner_ring: fault_source(&[1], None, None),
                    rolling_element: fault_source(&[772], None, Some(0.035)),
                    outer_ring: fault_source(&[16, 19, 30], Some(&[1.1, 1.0, 1.4]), Some(0.07)),
                },
                BearingConfig {
                    name: "Bearing 4".to_string(),
                    shaft: Shaft::Output,
                    no_elements: 12,
                    inner_ring: fault_source(&[1], None, None),
                    rolling_element: fault_source(&[198], None, Some(0.425)),
                    outer_ring: fault_source(&[1], None, None),
                },
            ],
        }
    }
}

fn gear_noise() -> AmplitudeModel {
    AmplitudeModel::Gaussian { mu: 0.0, sigma: 0.0005 }
}

fn reference_chances() -> ChanceFactors {
    ChanceFactors {
        neighbouring: 10.0,
        opposite: 10.0,
        keep_order: 1.0,
    }
}

fn reference_woehler() -> WoehlerConfig {
    WoehlerConfig {
        k: 10.5,
        n_ref: 10_390_000.0,
        torque_ref: 200.0,
    }
}

fn reference_grid() -> CurveFitGrid {
    CurveFitGrid {
        theta1: [0.0001, 0.0902, 0.01],
        theta2: [0.10e-6, 1.51e-6, 0.005e-6],
        theta3: [-2.0, 0.5, 0.05],
    }
}

fn reference_degradation_signal() -> DegradationSignalConfig {
    DegradationSignalConfig {
        scale: ScaleModel::Linear(ScaleBounds::new(1.0, 2.0, 0.0, 4.0).with_exponent(2.0)),
        torque_influence: false,
        noise: AmplitudeModel::Gaussian { mu: 0.0, sigma: 0.0005 },
    }
}

/// Sine fault source without noise or torque influence.
/// A `None` amplitude mutes the source.
fn fault_source(harmonics: &[u32], fac: Option<&[f64]>, amplitude: Option<f64>) -> FaultSourceConfig {
    FaultSourceConfig {
        harmonics: harmonics.to_vec(),
        harmonics_fac: fac.map(<[f64]>::to_vec),
        amplitude: amplitude.map_or(AmplitudeModel::None, |constant| AmplitudeModel::Constant { constant }),
        noise: AmplitudeModel::None,
        torque_scale: ScaleModel::None,
    }
}

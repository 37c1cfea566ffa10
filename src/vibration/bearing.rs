//! Rolling bearing fault frequencies.
//!
//! Three stationary fault families per bearing, each a sum of sine
//! harmonics of its characteristic frequency:
//!
//! - inner ring rollover: `(1 - c)·f·Z`
//! - rolling element spin: `c·f`
//! - outer ring rollover: `c·f·Z`
//!
//! with shaft frequency `f`, element count `Z` and contact factor `c`.

use rand::Rng;
use serde::Serialize;

use crate::config::defaults::BEARING_CONTACT_FACTOR;
use crate::config::{BearingConfig, FaultSourceConfig, Shaft};
use crate::signal::scale::ScaleBase;
use crate::signal::{add_into, AmplitudeModel, ScaleModel, SignalError, Sine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultKind {
    InnerRing,
    RollingElement,
    OuterRing,
}

impl FaultKind {
    pub const ALL: [Self; 3] = [Self::InnerRing, Self::RollingElement, Self::OuterRing];

    pub fn label(self) -> &'static str {
        match self {
            Self::InnerRing => "Inner Ring Rollover",
            Self::RollingElement => "Rolling Element",
            Self::OuterRing => "Outer Ring Rollover",
        }
    }
}

/// Characteristic fault frequencies (Hz).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BearingFrequencies {
    pub inner_ring: f64,
    pub rolling_element: f64,
    pub outer_ring: f64,
}

impl BearingFrequencies {
    pub fn new(rotational_frequency: f64, no_elements: u32) -> Self {
        let z = f64::from(no_elements);
        Self {
            inner_ring: (1.0 - BEARING_CONTACT_FACTOR) * rotational_frequency * z,
            rolling_element: BEARING_CONTACT_FACTOR * rotational_frequency,
            outer_ring: BEARING_CONTACT_FACTOR * rotational_frequency * z,
        }
    }

    pub fn of(&self, kind: FaultKind) -> f64 {
        match kind {
            FaultKind::InnerRing => self.inner_ring,
            FaultKind::RollingElement => self.rolling_element,
            FaultKind::OuterRing => self.outer_ring,
        }
    }
}

#[derive(Debug, Clone)]
struct FaultSource {
    kind: FaultKind,
    frequency: f64,
    harmonics: Vec<u32>,
    weights: Vec<f64>,
    amplitude: AmplitudeModel,
    noise: AmplitudeModel,
    torque_scale: ScaleModel,
}

impl FaultSource {
    fn new(kind: FaultKind, frequency: f64, config: &FaultSourceConfig) -> Self {
        Self {
            kind,
            frequency,
            harmonics: config.harmonics.clone(),
            weights: config.harmonic_weights(),
            amplitude: config.amplitude.clone(),
            noise: config.noise.clone(),
            torque_scale: config.torque_scale.clone(),
        }
    }

    fn label(&self) -> String {
        let first = self.harmonics.first().copied().unwrap_or(1);
        format!("{}: Harmonic no {first}", self.kind.label())
    }
}

/// One realisation of a bearing: a column per harmonic instance.
#[derive(Debug, Clone, PartialEq)]
pub struct BearingSignal {
    pub columns: Vec<Vec<f64>>,
    /// Column of the first harmonic of each fault source.
    pub first_harmonic_ids: Vec<usize>,
    pub labels: Vec<String>,
}

impl BearingSignal {
    /// Sum over all columns.
    pub fn total(&self, len: usize) -> Vec<f64> {
        let mut total = vec![0.0; len];
        for column in &self.columns {
            add_into(&mut total, column);
        }
        total
    }
}

/// Signal model of one bearing.
#[derive(Debug, Clone)]
pub struct BearingFaultSynthesizer {
    name: String,
    shaft: Shaft,
    frequencies: BearingFrequencies,
    sources: Vec<FaultSource>,
}

impl BearingFaultSynthesizer {
    /// `rotational_frequency` is the frequency of the shaft the bearing sits on.
    pub fn new(rotational_frequency: f64, config: &BearingConfig) -> Self {
        let frequencies = BearingFrequencies::new(rotational_frequency, config.no_elements);
        let sources = vec![
            FaultSource::new(FaultKind::InnerRing, frequencies.inner_ring, &config.inner_ring),
            FaultSource::new(
                FaultKind::RollingElement,
                frequencies.rolling_element,
                &config.rolling_element,
            ),
            FaultSource::new(FaultKind::OuterRing, frequencies.outer_ring, &config.outer_ring),
        ];
        Self {
            name: config.name.clone(),
            shaft: config.shaft,
            frequencies,
            sources,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shaft(&self) -> Shaft {
        self.shaft
    }

    pub fn frequencies(&self) -> BearingFrequencies {
        self.frequencies
    }

    /// Labels of the first-harmonic columns, one per fault source.
    pub fn labels(&self) -> Vec<String> {
        self.sources.iter().map(FaultSource::label).collect()
    }

    /// Every harmonic of every source on `time`.
    ///
    /// Per column the draws are: amplitude, then noise.
    pub fn raw_signal<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        time: &[f64],
        torque: &[f64],
    ) -> Result<BearingSignal, SignalError> {
        let len = time.len();
        let mut columns = Vec::new();
        let mut first_harmonic_ids = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            first_harmonic_ids.push(columns.len());
            let scale = source.torque_scale.apply_truncated(torque, len, ScaleBase::Ones)?;
            for (&harmonic, &fac) in source.harmonics.iter().zip(&source.weights) {
                let mut column = Sine::sample(time, source.frequency * f64::from(harmonic), fac);
                let amplitude = source.amplitude.generate(rng, len, len)?;
                for ((c, a), k) in column.iter_mut().zip(&amplitude).zip(&scale) {
                    *c *= a * k;
                }
                let noise = source.noise.noise(rng, len)?;
                add_into(&mut column, &noise);
                columns.push(column);
            }
        }

        Ok(BearingSignal {
            columns,
            first_harmonic_ids,
            labels: self.labels(),
        })
    }
}

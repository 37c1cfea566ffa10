//! Tooth mesh vibration of one gear.
//!
//! One Gaussian pulse per tooth mesh event, placed every mesh period on the
//! synthesis grid. The pulse train is superposed over the configured
//! harmonic orders: row `i` of harmonic `h` reads the train at sample
//! `(i·h) mod N`, weighted by `±fac(h)` (odd orders positive, even
//! negative) and normalised by the harmonic count.
//!
//! The superposition is linear in the train, so per-event amplitudes are
//! applied to the train first and the harmonics once afterwards.

use rand::Rng;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

use crate::config::GearConfig;
use crate::signal::scale::ScaleBase;
use crate::signal::{
    AmplitudeModel, MeshEventBounds, PulsePrototype, SampleWindow, ScaleModel, SignalError,
    SignalShifter,
};

/// Mean torque per mesh event, bucketed by tooth number (1-based).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadCollective {
    loads: BTreeMap<u32, Vec<f64>>,
}

impl LoadCollective {
    /// Empty buckets for teeth `1..=no_teeth`.
    pub fn with_teeth(no_teeth: u32) -> Self {
        Self {
            loads: (1..=no_teeth).map(|t| (t, Vec::new())).collect(),
        }
    }

    pub fn push(&mut self, tooth: u32, load: f64) {
        self.loads.entry(tooth).or_default().push(load);
    }

    /// Loads seen by `tooth`, in mesh order. Empty for unknown teeth.
    pub fn tooth(&self, tooth: u32) -> &[f64] {
        self.loads.get(&tooth).map_or(&[], Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[f64])> + '_ {
        self.loads.iter().map(|(t, l)| (*t, l.as_slice()))
    }

    pub fn no_teeth(&self) -> usize {
        self.loads.len()
    }

    /// Total number of mesh events across all teeth.
    pub fn event_count(&self) -> usize {
        self.loads.values().map(Vec::len).sum()
    }
}

/// Signal model of one gear.
#[derive(Debug, Clone)]
pub struct ToothMeshSynthesizer {
    no_teeth: u32,
    rotational_frequency: f64,
    harmonics: Vec<u32>,
    /// `sign(h)·fac(h) / H` per harmonic.
    harmonic_gains: Vec<f64>,
    prototype: PulsePrototype,
    /// Mesh event centers on the synthesis grid.
    centers: Vec<usize>,
    /// Mesh event bounds on the full (torque) grid.
    torque_bounds: MeshEventBounds,
    synthesis_len: usize,
    amplitude: AmplitudeModel,
    noise: AmplitudeModel,
    torque_scale: ScaleModel,
}

impl ToothMeshSynthesizer {
    pub fn new(
        rotational_frequency: f64,
        config: &GearConfig,
        window: &SampleWindow,
    ) -> Result<Self, SignalError> {
        let no_teeth = config.no_teeth;
        let mesh_period = 1.0 / rotational_frequency / f64::from(no_teeth);
        let mesh_frequency = rotational_frequency * f64::from(no_teeth);

        let time = window.synthesis_time();
        let prototype = config.signal.gauss_pulse().prototype(time, mesh_frequency);
        let shifter = SignalShifter::new(mesh_period);
        let centers = shifter.centers(time);
        let torque_bounds = shifter.event_bounds(window.full_time())?;

        let weights = config.harmonic_weights();
        let count = config.harmonics.len().max(1) as f64;
        let harmonic_gains = config
            .harmonics
            .iter()
            .zip(&weights)
            .map(|(&h, &fac)| harmonic_sign(h) * fac / count)
            .collect();

        Ok(Self {
            no_teeth,
            rotational_frequency,
            harmonics: config.harmonics.clone(),
            harmonic_gains,
            prototype,
            centers,
            torque_bounds,
            synthesis_len: time.len(),
            amplitude: config.amplitude.clone(),
            noise: config.noise.clone(),
            torque_scale: config.torque_scale.clone(),
        })
    }

    pub fn no_teeth(&self) -> u32 {
        self.no_teeth
    }

    pub fn rotational_frequency(&self) -> f64 {
        self.rotational_frequency
    }

    /// Tooth mesh frequency (Hz).
    pub fn mesh_frequency(&self) -> f64 {
        self.rotational_frequency * f64::from(self.no_teeth)
    }

    pub fn torque_scale(&self) -> &ScaleModel {
        &self.torque_scale
    }

    /// Number of mesh events on the synthesis grid.
    pub fn event_count(&self) -> usize {
        self.centers.len()
    }

    pub fn centers(&self) -> &[usize] {
        &self.centers
    }

    /// Tooth (1-based) meshing at event `event`.
    pub fn tooth_of_event(&self, event: usize) -> u32 {
        (event % self.no_teeth as usize) as u32 + 1
    }

    /// Per-event bounds on the synthesis grid.
    pub fn event_bounds(&self) -> MeshEventBounds {
        self.torque_bounds.truncated(self.centers.len())
    }

    pub fn torque_bounds(&self) -> &MeshEventBounds {
        &self.torque_bounds
    }

    /// Weighted pulse train: one pulse per event, scaled by `amplitudes[event]`.
    fn pulse_train(&self, amplitudes: &[f64]) -> Vec<f64> {
        let mut train = vec![0.0; self.synthesis_len];
        for (&center, &amp) in self.centers.iter().zip(amplitudes) {
            if amp != 0.0 {
                self.prototype.add_centered(&mut train, center, amp);
            }
        }
        train
    }

    fn superpose_harmonics(&self, train: &[f64]) -> Vec<f64> {
        let n = train.len();
        let mut out = vec![0.0; n];
        if n == 0 {
            return out;
        }
        for (&h, &gain) in self.harmonics.iter().zip(&self.harmonic_gains) {
            let h = h as usize % n;
            let mut src = 0usize;
            for slot in &mut out {
                *slot += gain * train[src];
                src += h;
                if src >= n {
                    src -= n;
                }
            }
        }
        out
    }

    /// Signal with unit amplitude and no torque or noise influence.
    pub fn base_signal(&self) -> Vec<f64> {
        let train = self.pulse_train(&vec![1.0; self.centers.len()]);
        self.superpose_harmonics(&train)
    }

    /// One realisation of the gear signal under `torque`.
    ///
    /// Draws one amplitude per tooth (tiled over events for the repeat
    /// methods) and then the additive noise, in that order.
    pub fn raw_signal<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        torque: &[f64],
    ) -> Result<Vec<f64>, SignalError> {
        let amplitudes =
            self.amplitude
                .generate(rng, self.no_teeth as usize, self.centers.len())?;
        let train = self.pulse_train(&amplitudes);
        let mut signal = self.superpose_harmonics(&train);

        let scale = self
            .torque_scale
            .apply_truncated(torque, self.synthesis_len, ScaleBase::Ones)?;
        for (s, k) in signal.iter_mut().zip(&scale) {
            *s *= k;
        }

        let noise = self.noise.noise(rng, self.synthesis_len)?;
        crate::signal::add_into(&mut signal, &noise);
        Ok(signal)
    }

    /// Mean torque per mesh event over the full grid, bucketed by tooth.
    ///
    /// `torque` must already be tiled to the full-grid length; event
    /// bounds are clipped to it and empty slices are skipped.
    pub fn load_per_tooth(&self, torque: &[f64]) -> LoadCollective {
        let mut collective = LoadCollective::with_teeth(self.no_teeth);
        for event in 0..self.torque_bounds.len() {
            if let Some(range) = self.torque_bounds.clipped(event, torque.len()) {
                collective.push(self.tooth_of_event(event), torque[range].iter().mean());
            }
        }
        collective
    }
}

/// Odd harmonic orders add, even orders subtract.
fn harmonic_sign(order: u32) -> f64 {
    if order % 2 == 0 {
        -1.0
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GearboxConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_setup() -> (GearConfig, SampleWindow) {
        let mut gear = GearboxConfig::reference().gear_in;
        gear.no_teeth = 10;
        gear.harmonics = vec![1, 2];
        gear.harmonics_fac = None;
        gear.amplitude = AmplitudeModel::Constant { constant: 1.0 };
        gear.noise = AmplitudeModel::None;
        let window = SampleWindow::new(10.0, 10, 10, 0.2, 5000.0, true).unwrap();
        (gear, window)
    }

    #[test]
    fn test_harmonic_sign_convention() {
        assert_eq!(harmonic_sign(1), 1.0);
        assert_eq!(harmonic_sign(2), -1.0);
        assert_eq!(harmonic_sign(7), 1.0);
    }

    #[test]
    fn test_event_count_matches_mesh_frequency() {
        let (gear, window) = small_setup();
        let synth = ToothMeshSynthesizer::new(10.0, &gear, &window).unwrap();
        // 0.2 s at 100 Hz mesh frequency: 20 events plus one clamped to the last sample
        assert!((synth.mesh_frequency() - 100.0).abs() < 1e-12);
        assert_eq!(synth.event_count(), 21);
        assert_eq!(synth.centers()[20], 999);
        assert_eq!(synth.centers()[1], 50);
        assert_eq!(synth.tooth_of_event(0), 1);
        assert_eq!(synth.tooth_of_event(10), 1);
        assert_eq!(synth.tooth_of_event(13), 4);
    }

    #[test]
    fn test_base_signal_superposes_signed_harmonics() {
        let (mut gear, window) = small_setup();
        let combined = ToothMeshSynthesizer::new(10.0, &gear, &window).unwrap().base_signal();
        gear.harmonics = vec![1];
        let train = ToothMeshSynthesizer::new(10.0, &gear, &window).unwrap().base_signal();

        let n = train.len();
        for i in [0, 25, 333, n - 1] {
            let expected = 0.5 * (train[i] - train[(2 * i) % n]);
            assert!((combined[i] - expected).abs() < 1e-12, "Sample {i}: {} vs {expected}", combined[i]);
        }
        assert!(combined[0].abs() < 1e-12, "Odd and even orders cancel at sample zero");
    }

    #[test]
    fn test_constant_amplitude_scales_linearly() {
        let (mut gear, window) = small_setup();
        let unit = ToothMeshSynthesizer::new(10.0, &gear, &window).unwrap();
        gear.amplitude = AmplitudeModel::Constant { constant: 2.0 };
        let doubled = ToothMeshSynthesizer::new(10.0, &gear, &window).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let torque = vec![100.0; window.full_len()];
        let a = unit.raw_signal(&mut rng, &torque).unwrap();
        let b = doubled.raw_signal(&mut rng, &torque).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert!((2.0 * x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_load_per_tooth_buckets_means() {
        let (gear, window) = small_setup();
        let synth = ToothMeshSynthesizer::new(10.0, &gear, &window).unwrap();
        let torque = vec![50.0; window.full_len()];
        let loads = synth.load_per_tooth(&torque);
        assert_eq!(loads.no_teeth(), 10);
        assert!(loads.tooth(1).iter().all(|l| (l - 50.0).abs() < 1e-12));
        assert!(loads.event_count() > 0);
        assert!(loads.tooth(11).is_empty());
    }

    #[test]
    fn test_load_per_tooth_follows_torque_profile() {
        let (gear, window) = small_setup();
        let synth = ToothMeshSynthesizer::new(10.0, &gear, &window).unwrap();
        // torque ramps, so later events see more load
        let torque: Vec<f64> = (0..window.full_len()).map(|i| i as f64).collect();
        let loads = synth.load_per_tooth(&torque);
        let tooth1 = loads.tooth(1);
        assert!(tooth1.len() >= 2);
        assert!(tooth1[1] > tooth1[0]);
    }
}

//! Vibration Engine
//!
//! Builds the signal models of both gears and all bearings from static
//! geometry and produces one acceleration waveform per run:
//!
//! - **gear**: tooth mesh pulse trains and per-tooth load bucketing
//! - **bearing**: inner ring, rolling element and outer ring sines
//! - **degradation_signal**: impulse bursts for pitted teeth
//!
//! ## Runs
//!
//! Each run draws a sub-seed from the engine's own generator, so two runs
//! differ but a whole sequence is reproducible from the engine seed. Within
//! a run the draw order is fixed: gears, bearings, degradation bursts, and
//! finally the trim window.
//!
//! ## Torque
//!
//! The supplied torque profile is tiled to the full grid. Gears use the
//! input torque for loads and vibration; bearings on the output shaft see
//! the input torque times the gear ratio.

pub mod bearing;
pub mod degradation_signal;
pub mod gear;

pub use bearing::{BearingFaultSynthesizer, BearingFrequencies, BearingSignal, FaultKind};
pub use degradation_signal::{DegradationBurst, DegradationSignalInjector};
pub use gear::{LoadCollective, ToothMeshSynthesizer};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::defaults::VIBRATION_RUN_SEED_MAX;
use crate::config::{GearboxConfig, Shaft};
use crate::signal::{add_into, repeat_to_len, SampleWindow, SignalError, TrimWindow};

/// Per-tooth load collectives of both gears for one torque profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GearboxLoads {
    pub gear_in: LoadCollective,
    pub gear_out: LoadCollective,
}

/// One element's contribution to a run, trimmed to the real grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VibrationComponent {
    pub element: String,
    pub labels: Vec<String>,
    pub signal: Vec<f64>,
}

/// Result of one vibration run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VibrationRun {
    pub run_seed: u64,
    pub trim: TrimWindow,
    pub components: Vec<VibrationComponent>,
    /// Sum of all components.
    pub waveform: Vec<f64>,
}

/// Gear pitting sizes handed to a run (index 0 is tooth 1).
#[derive(Debug, Clone, Copy, Default)]
pub struct PittingInput<'a> {
    pub gear_in: &'a [Option<f64>],
    pub gear_out: &'a [Option<f64>],
}

struct GearModel {
    name: &'static str,
    mesh: ToothMeshSynthesizer,
    injector: DegradationSignalInjector,
}

/// Signal models of the whole gearbox plus the current torque.
pub struct VibrationEngine {
    window: SampleWindow,
    gear_ratio: f64,
    rotational_frequency_in: f64,
    rotational_frequency_out: f64,
    gear_in: GearModel,
    gear_out: GearModel,
    bearings: Vec<BearingFaultSynthesizer>,
    torque_in: Vec<f64>,
    torque_out: Vec<f64>,
    rng: StdRng,
    runs: usize,
    last_run: Option<VibrationRun>,
}

impl std::fmt::Debug for VibrationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VibrationEngine")
            .field("full_len", &self.window.full_len())
            .field("real_len", &self.window.real_len())
            .field("bearings", &self.bearings.len())
            .field("runs", &self.runs)
            .finish_non_exhaustive()
    }
}

impl VibrationEngine {
    /// Build every element model for `config` under the initial `torque`.
    pub fn new(config: &GearboxConfig, seed: u64, torque: &[f64]) -> Result<Self, SignalError> {
        let sim = &config.simulation;
        let window = SampleWindow::new(
            sim.rotational_frequency_in,
            config.gear_in.no_teeth,
            config.gear_out.no_teeth,
            sim.sample_interval,
            sim.sample_rate,
            sim.fixed_start,
        )?;
        let gear_ratio = config.gear_ratio();
        let rotational_frequency_in = sim.rotational_frequency_in;
        let rotational_frequency_out = config.rotational_frequency_out();
        let mut rng = StdRng::seed_from_u64(seed);

        let gear_in = build_gear("GearIn", &mut rng, rotational_frequency_in, &config.gear_in, &window)?;
        let gear_out = build_gear("GearOut", &mut rng, rotational_frequency_out, &config.gear_out, &window)?;

        let bearings = config
            .bearings
            .iter()
            .map(|b| {
                let freq = match b.shaft {
                    Shaft::Input => rotational_frequency_in,
                    Shaft::Output => rotational_frequency_out,
                };
                BearingFaultSynthesizer::new(freq, b)
            })
            .collect();

        info!(
            seed,
            full_len = window.full_len(),
            real_len = window.real_len(),
            coverage_multiple = window.coverage_multiple(),
            mesh_events_in = gear_in.mesh.event_count(),
            mesh_events_out = gear_out.mesh.event_count(),
            "Vibration engine initialized"
        );

        let mut engine = Self {
            window,
            gear_ratio,
            rotational_frequency_in,
            rotational_frequency_out,
            gear_in,
            gear_out,
            bearings,
            torque_in: Vec::new(),
            torque_out: Vec::new(),
            rng,
            runs: 0,
            last_run: None,
        };
        engine.set_torque(torque);
        Ok(engine)
    }

    /// Replace the torque profile; tiled to the full grid.
    pub fn set_torque(&mut self, torque: &[f64]) {
        self.torque_in = repeat_to_len(torque, self.window.full_len());
        self.torque_out = self.torque_in.iter().map(|t| t * self.gear_ratio).collect();
    }

    /// Per-tooth load collectives under the current torque.
    pub fn loads(&self) -> GearboxLoads {
        GearboxLoads {
            gear_in: self.gear_in.mesh.load_per_tooth(&self.torque_in),
            gear_out: self.gear_out.mesh.load_per_tooth(&self.torque_in),
        }
    }

    /// Synthesize one waveform for the given pitting sizes.
    pub fn run(&mut self, pitting: PittingInput<'_>) -> Result<&VibrationRun, SignalError> {
        let run_seed = self.rng.gen_range(1..VIBRATION_RUN_SEED_MAX);
        let mut rng = StdRng::seed_from_u64(run_seed);
        let time = self.window.synthesis_time();
        let len = time.len();

        let mut raw: Vec<(String, Vec<String>, Vec<f64>)> = Vec::with_capacity(4 + self.bearings.len());
        for gear in [&self.gear_in, &self.gear_out] {
            let signal = gear.mesh.raw_signal(&mut rng, &self.torque_in)?;
            raw.push((gear.name.to_string(), vec![gear.name.to_string()], signal));
        }

        for bearing in &self.bearings {
            let torque = match bearing.shaft() {
                Shaft::Input => &self.torque_in,
                Shaft::Output => &self.torque_out,
            };
            let signal = bearing.raw_signal(&mut rng, time, torque)?;
            raw.push((bearing.name().to_string(), signal.labels.clone(), signal.total(len)));
        }

        for (gear, pitting) in [(&self.gear_in, pitting.gear_in), (&self.gear_out, pitting.gear_out)] {
            let burst = gear.injector.inject(&mut rng, pitting, &self.torque_in)?;
            let labels = burst.labels.iter().map(|l| format!("{} {l}", gear.name)).collect();
            raw.push((format!("{} Degradation", gear.name), labels, burst.signal));
        }

        let trim = self.window.draw_trim(&mut rng);
        let mut waveform = vec![0.0; self.window.real_len()];
        let components = raw
            .into_iter()
            .map(|(element, labels, signal)| {
                let signal = trim.apply(&signal).to_vec();
                add_into(&mut waveform, &signal);
                VibrationComponent { element, labels, signal }
            })
            .collect();

        self.runs += 1;
        debug!(run = self.runs, run_seed, start = trim.start, "Vibration run complete");
        Ok(self.last_run.insert(VibrationRun {
            run_seed,
            trim,
            components,
            waveform,
        }))
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn gear_ratio(&self) -> f64 {
        self.gear_ratio
    }

    pub fn rotational_frequency_in(&self) -> f64 {
        self.rotational_frequency_in
    }

    pub fn rotational_frequency_out(&self) -> f64 {
        self.rotational_frequency_out
    }

    pub fn gear_in(&self) -> &ToothMeshSynthesizer {
        &self.gear_in.mesh
    }

    pub fn gear_out(&self) -> &ToothMeshSynthesizer {
        &self.gear_out.mesh
    }

    pub fn bearings(&self) -> &[BearingFaultSynthesizer] {
        &self.bearings
    }

    pub fn torque_in(&self) -> &[f64] {
        &self.torque_in
    }

    pub fn torque_out(&self) -> &[f64] {
        &self.torque_out
    }

    pub fn last_run(&self) -> Option<&VibrationRun> {
        self.last_run.as_ref()
    }

    pub fn runs(&self) -> usize {
        self.runs
    }
}

fn build_gear(
    name: &'static str,
    rng: &mut StdRng,
    rotational_frequency: f64,
    config: &crate::config::GearConfig,
    window: &SampleWindow,
) -> Result<GearModel, SignalError> {
    let mesh = ToothMeshSynthesizer::new(rotational_frequency, config, window)?;
    let injector = DegradationSignalInjector::new(
        rng,
        config.no_teeth,
        &mesh.event_bounds(),
        window.synthesis_len(),
        &config.degradation_signal,
        mesh.torque_scale(),
    )?;
    Ok(GearModel { name, mesh, injector })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::small_config;

    #[test]
    fn test_run_is_real_length_sum_of_components() {
        let config = small_config();
        let mut engine = VibrationEngine::new(&config, 5, &[200.0]).unwrap();
        let no_pitting_in = vec![None; config.gear_in.no_teeth as usize];
        let no_pitting_out = vec![None; config.gear_out.no_teeth as usize];
        let real_len = engine.window().real_len();
        let run = engine
            .run(PittingInput { gear_in: &no_pitting_in, gear_out: &no_pitting_out })
            .unwrap();
        assert_eq!(run.waveform.len(), real_len);
        assert_eq!(run.components.len(), 4 + config.bearings.len());
        for i in [0, real_len / 2, real_len - 1] {
            let sum: f64 = run.components.iter().map(|c| c.signal[i]).sum();
            assert!((sum - run.waveform[i]).abs() < 1e-9);
        }
        assert_eq!(run.components[2].element, "Bearing 1");
    }

    #[test]
    fn test_same_seed_same_waveforms() {
        let config = small_config();
        let pitting_in = vec![None; config.gear_in.no_teeth as usize];
        let pitting_out = vec![None; config.gear_out.no_teeth as usize];
        let input = PittingInput { gear_in: &pitting_in, gear_out: &pitting_out };

        let mut a = VibrationEngine::new(&config, 9, &[200.0]).unwrap();
        let mut b = VibrationEngine::new(&config, 9, &[200.0]).unwrap();
        let first_a = a.run(input).unwrap().waveform.clone();
        let first_b = b.run(input).unwrap().waveform.clone();
        assert_eq!(first_a, first_b);
        let second_a = a.run(input).unwrap().waveform.clone();
        assert_ne!(first_a, second_a, "Consecutive runs draw fresh noise");
    }

    #[test]
    fn test_output_torque_follows_gear_ratio() {
        let config = small_config();
        let mut engine = VibrationEngine::new(&config, 1, &[10.0, 20.0]).unwrap();
        assert_eq!(engine.torque_in().len(), engine.window().full_len());
        assert!((engine.torque_in()[3] - 20.0).abs() < f64::EPSILON);
        assert!((engine.torque_out()[2] - 10.0 * engine.gear_ratio()).abs() < 1e-12);
        engine.set_torque(&[5.0]);
        assert!(engine.loads().gear_in.iter().all(|(_, l)| l.iter().all(|v| (v - 5.0).abs() < 1e-12)));
    }

    #[test]
    fn test_pitted_tooth_adds_labelled_burst() {
        let config = small_config();
        let mut engine = VibrationEngine::new(&config, 2, &[200.0]).unwrap();
        let mut pitting_in = vec![None; config.gear_in.no_teeth as usize];
        pitting_in[2] = Some(1.5);
        let pitting_out = vec![None; config.gear_out.no_teeth as usize];
        let run = engine
            .run(PittingInput { gear_in: &pitting_in, gear_out: &pitting_out })
            .unwrap();
        let burst = run.components.iter().find(|c| c.element == "GearIn Degradation").unwrap();
        assert_eq!(burst.labels, vec!["GearIn Tooth 3 (a = 1.500)".to_string()]);
        let silent = run.components.iter().find(|c| c.element == "GearOut Degradation").unwrap();
        assert_eq!(silent.labels, vec!["GearOut None".to_string()]);
        assert!(silent.signal.iter().all(|v| *v == 0.0));
    }
}

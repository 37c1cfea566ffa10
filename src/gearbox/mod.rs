//! Gearbox Orchestrator
//!
//! Load-cycle stepping state machine over the degradation and vibration
//! engines:
//!
//! ```text
//! Uninitialized --initialize--> Initialized --run--> AwaitingTorqueChange
//!                                    |                    |        ^
//!                                    +--set--> Running <--set      |
//!                                                 |                |
//!                                                 +------run-------+
//! ```
//!
//! `run(nolc)` advances degradation with the loads of the last torque, then
//! synthesizes a waveform under that torque. `set(nolc, torque)` pins a
//! torque change to the checkpoint just reached.

mod history;
mod summary;

pub use history::SimulationHistory;
pub use summary::{BearingSummary, GearSummary, GearboxSummary};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, GearboxConfig};
use crate::degradation::{DegradationEngine, DegradationError, DegradationSnapshot};
use crate::rng::resolve_seed;
use crate::signal::SignalError;
use crate::vibration::{PittingInput, VibrationEngine, VibrationRun};

#[derive(Debug, Error)]
pub enum GearboxError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("signal synthesis failed: {0}")]
    Signal(#[from] SignalError),

    #[error("degradation failed: {0}")]
    Degradation(#[from] DegradationError),

    #[error("gearbox is already initialized, use reinitialize")]
    AlreadyInitialized,

    #[error("gearbox is not initialized")]
    NotInitialized,

    #[error("load cycle {requested} must be greater than the last checkpoint {last}")]
    LoadCycleOrder { requested: f64, last: f64 },

    #[error("torque change at load cycle {requested} must match the last checkpoint {last}")]
    LoadCycleMismatch { requested: f64, last: f64 },

    #[error("load cycle must be a non-negative number, got {0}")]
    NegativeLoadCycle(f64),

    #[error("torque profile is empty")]
    EmptyTorque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GearboxState {
    Uninitialized,
    Initialized,
    /// Torque was set; the next call is `run`.
    Running,
    /// A checkpoint was reached; torque may change at it.
    AwaitingTorqueChange,
}

struct Engines {
    vibration: VibrationEngine,
    degradation: DegradationEngine,
    history: SimulationHistory,
}

pub struct GearboxOrchestrator {
    config: GearboxConfig,
    seed: u64,
    state: GearboxState,
    engines: Option<Engines>,
}

impl std::fmt::Debug for GearboxOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GearboxOrchestrator")
            .field("seed", &self.seed)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl GearboxOrchestrator {
    /// Validate `config` and fix the seed; no engine is built yet.
    pub fn new(config: GearboxConfig) -> Result<Self, GearboxError> {
        config.validate()?;
        let seed = resolve_seed(config.simulation.seed);
        Ok(Self {
            config,
            seed,
            state: GearboxState::Uninitialized,
            engines: None,
        })
    }

    pub fn config(&self) -> &GearboxConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn state(&self) -> GearboxState {
        self.state
    }

    /// Build both engines and record the initial checkpoint.
    pub fn initialize(&mut self, torque: &[f64]) -> Result<(), GearboxError> {
        if self.state != GearboxState::Uninitialized {
            return Err(GearboxError::AlreadyInitialized);
        }
        check_torque(torque)?;

        let degradation = DegradationEngine::new(&self.config, self.seed)?;
        let vibration = VibrationEngine::new(&self.config, self.seed, torque)?;
        let history = SimulationHistory::new(torque, vibration.loads(), degradation.snapshot());
        self.engines = Some(Engines { vibration, degradation, history });
        self.state = GearboxState::Initialized;
        info!(
            seed = self.seed,
            teeth_in = self.config.gear_in.no_teeth,
            teeth_out = self.config.gear_out.no_teeth,
            bearings = self.config.bearings.len(),
            "Gearbox initialized"
        );
        Ok(())
    }

    /// Rebuild degradation and reset history under the kept vibration model.
    ///
    /// Without `seed` a new one is drawn from entropy.
    pub fn reinitialize(&mut self, torque: &[f64], seed: Option<u64>) -> Result<(), GearboxError> {
        check_torque(torque)?;
        let engines = self.engines.as_mut().ok_or(GearboxError::NotInitialized)?;
        let seed = resolve_seed(seed);

        let degradation = DegradationEngine::new(&self.config, seed)?;
        engines.vibration.set_torque(torque);
        engines.history = SimulationHistory::new(torque, engines.vibration.loads(), degradation.snapshot());
        engines.degradation = degradation;
        self.seed = seed;
        self.state = GearboxState::Initialized;
        info!(seed, "Gearbox reinitialized");
        Ok(())
    }

    /// Advance to load cycle `nolc` and synthesize its waveform.
    pub fn run(&mut self, nolc: f64) -> Result<&[f64], GearboxError> {
        check_load_cycle(nolc)?;
        let engines = self.engines.as_mut().ok_or(GearboxError::NotInitialized)?;
        if let Some(last) = engines.history.last_load_cycle() {
            if nolc <= last {
                return Err(GearboxError::LoadCycleOrder { requested: nolc, last });
            }
        }

        let loads = engines
            .history
            .current_loads()
            .ok_or(GearboxError::NotInitialized)?;
        let snapshot = engines.degradation.run(nolc, loads)?;
        let pitting_in = snapshot.gear_in.pitting();
        let pitting_out = snapshot.gear_out.pitting();
        let run = engines.vibration.run(PittingInput {
            gear_in: &pitting_in,
            gear_out: &pitting_out,
        })?;
        info!(nolc, window_start = run.trim.start, "Load cycle done");

        engines.history.record_run(nolc, snapshot);
        self.state = GearboxState::AwaitingTorqueChange;
        self.last_run()
            .map(|run| run.waveform.as_slice())
            .ok_or(GearboxError::NotInitialized)
    }

    /// Change torque at the checkpoint `nolc` just reached.
    pub fn set(&mut self, nolc: f64, torque: &[f64]) -> Result<(), GearboxError> {
        check_load_cycle(nolc)?;
        check_torque(torque)?;
        let engines = self.engines.as_mut().ok_or(GearboxError::NotInitialized)?;
        if let Some(last) = engines.history.last_load_cycle() {
            if nolc != last {
                return Err(GearboxError::LoadCycleMismatch { requested: nolc, last });
            }
        }

        engines.vibration.set_torque(torque);
        let loads = engines.vibration.loads();
        engines.history.record_torque(nolc, torque, loads);
        self.state = GearboxState::Running;
        info!(nolc, torque_samples = torque.len(), "Torque changed");
        Ok(())
    }

    pub fn history(&self) -> Option<&SimulationHistory> {
        self.engines.as_ref().map(|e| &e.history)
    }

    pub fn degradation(&self) -> Option<&DegradationEngine> {
        self.engines.as_ref().map(|e| &e.degradation)
    }

    pub fn vibration(&self) -> Option<&VibrationEngine> {
        self.engines.as_ref().map(|e| &e.vibration)
    }

    /// Components and waveform of the latest run.
    pub fn last_run(&self) -> Option<&VibrationRun> {
        self.vibration().and_then(VibrationEngine::last_run)
    }

    pub fn latest_state(&self) -> Option<&DegradationSnapshot> {
        self.history().and_then(SimulationHistory::latest_state)
    }

    /// Snapshot for reporting; also logged at info level.
    pub fn summary(&self) -> Result<GearboxSummary, GearboxError> {
        let engines = self.engines.as_ref().ok_or(GearboxError::NotInitialized)?;
        let vib = &engines.vibration;
        let deg = &engines.degradation;
        let snapshot = deg.snapshot();

        let gears = vec![
            GearSummary {
                name: "GearIn".to_string(),
                no_teeth: vib.gear_in().no_teeth(),
                rotational_frequency: vib.rotational_frequency_in(),
                mesh_frequency: vib.gear_in().mesh_frequency(),
                attempts: deg.gear_in().attempts(),
                state0: deg.gear_in().state0().to_vec(),
                latest: snapshot.gear_in,
            },
            GearSummary {
                name: "GearOut".to_string(),
                no_teeth: vib.gear_out().no_teeth(),
                rotational_frequency: vib.rotational_frequency_out(),
                mesh_frequency: vib.gear_out().mesh_frequency(),
                attempts: deg.gear_out().attempts(),
                state0: deg.gear_out().state0().to_vec(),
                latest: snapshot.gear_out,
            },
        ];
        let bearings = vib
            .bearings()
            .iter()
            .map(|b| BearingSummary {
                name: b.name().to_string(),
                shaft: b.shaft(),
                frequencies: b.frequencies(),
            })
            .collect();

        let summary = GearboxSummary {
            generated_at: Utc::now(),
            seed: self.seed,
            state: self.state,
            gear_ratio: vib.gear_ratio(),
            gears,
            bearings,
            latest_load_cycle: engines.history.last_load_cycle(),
            history_len: engines.history.len(),
            vibration_runs: vib.runs(),
        };
        summary.log();
        Ok(summary)
    }
}

fn check_torque(torque: &[f64]) -> Result<(), GearboxError> {
    if torque.is_empty() {
        Err(GearboxError::EmptyTorque)
    } else {
        Ok(())
    }
}

fn check_load_cycle(nolc: f64) -> Result<(), GearboxError> {
    if nolc.is_nan() || nolc < 0.0 {
        Err(GearboxError::NegativeLoadCycle(nolc))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::small_config;

    fn initialized() -> GearboxOrchestrator {
        let mut gearbox = GearboxOrchestrator::new(small_config()).unwrap();
        gearbox.initialize(&[200.0]).unwrap();
        gearbox
    }

    #[test]
    fn test_state_transitions() {
        let mut gearbox = GearboxOrchestrator::new(small_config()).unwrap();
        assert_eq!(gearbox.state(), GearboxState::Uninitialized);
        assert!(matches!(gearbox.run(0.0), Err(GearboxError::NotInitialized)));

        gearbox.initialize(&[200.0]).unwrap();
        assert_eq!(gearbox.state(), GearboxState::Initialized);
        assert!(matches!(gearbox.initialize(&[200.0]), Err(GearboxError::AlreadyInitialized)));

        gearbox.run(1000.0).unwrap();
        assert_eq!(gearbox.state(), GearboxState::AwaitingTorqueChange);
        gearbox.set(1000.0, &[150.0]).unwrap();
        assert_eq!(gearbox.state(), GearboxState::Running);
    }

    #[test]
    fn test_set_twice_at_checkpoint_and_mismatch() {
        let mut gearbox = initialized();
        gearbox.run(10.0).unwrap();
        gearbox.set(10.0, &[50.0]).unwrap();
        gearbox.set(10.0, &[50.0]).unwrap();
        assert_eq!(gearbox.history().unwrap().torque().len(), 3);
        assert!(matches!(
            gearbox.set(11.0, &[50.0]),
            Err(GearboxError::LoadCycleMismatch { .. })
        ));
    }

    #[test]
    fn test_set_before_first_run_is_allowed() {
        let mut gearbox = initialized();
        gearbox.set(0.0, &[120.0]).unwrap();
        let history = gearbox.history().unwrap();
        assert_eq!(history.torque_change_load_cycles(), &[None, Some(0.0)]);
        assert_eq!(history.current_torque(), &[120.0]);
    }

    #[test]
    fn test_run_requires_increasing_load_cycles() {
        let mut gearbox = initialized();
        gearbox.run(100.0).unwrap();
        assert!(matches!(gearbox.run(100.0), Err(GearboxError::LoadCycleOrder { .. })));
        assert!(matches!(gearbox.run(50.0), Err(GearboxError::LoadCycleOrder { .. })));
        assert!(matches!(gearbox.run(-1.0), Err(GearboxError::NegativeLoadCycle(_))));
        gearbox.run(200.0).unwrap();
        assert_eq!(gearbox.history().unwrap().load_cycles(), &[None, Some(100.0), Some(200.0)]);
    }

    #[test]
    fn test_empty_torque_is_rejected() {
        let mut gearbox = GearboxOrchestrator::new(small_config()).unwrap();
        assert!(matches!(gearbox.initialize(&[]), Err(GearboxError::EmptyTorque)));
        assert_eq!(gearbox.state(), GearboxState::Uninitialized);
    }

    #[test]
    fn test_reinitialize_resets_history_and_keeps_vibration() {
        let mut gearbox = initialized();
        gearbox.run(100.0).unwrap();
        let full_len = gearbox.vibration().unwrap().window().full_len();
        gearbox.reinitialize(&[180.0], Some(99)).unwrap();
        assert_eq!(gearbox.seed(), 99);
        assert_eq!(gearbox.state(), GearboxState::Initialized);
        let history = gearbox.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.last_load_cycle(), None);
        assert_eq!(gearbox.vibration().unwrap().runs(), 1);
        assert_eq!(gearbox.vibration().unwrap().window().full_len(), full_len);
        gearbox.run(50.0).unwrap();
    }

    #[test]
    fn test_summary_reports_both_gears() {
        let mut gearbox = initialized();
        gearbox.run(500.0).unwrap();
        let summary = gearbox.summary().unwrap();
        assert_eq!(summary.gears.len(), 2);
        assert_eq!(summary.gears[0].state0.len(), 2);
        assert_eq!(summary.bearings.len(), 4);
        assert_eq!(summary.latest_load_cycle, Some(500.0));
        assert_eq!(summary.history_len, 2);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"GearOut\""));
    }
}

//! Fatigue Degradation Engine
//!
//! Stochastic pitting initiation and growth for both gears:
//!
//! - **initializer**: which teeth fail, in which order, with which initiation
//!   and end-of-life points (retried until valid)
//! - **curve_fit**: grid search of the exponential growth curve per tooth
//! - **damage**: Palmgren-Miner accumulation under the measured mesh loads
//! - **state**: the initial tooth state table and the growth curve
//!
//! All draws come from a [`SeedStepper`](crate::rng::SeedStepper) owned by
//! each gear, so a run is reproducible from the top-level seed. The output
//! gear works on its own load-cycle axis (`nolc / ratio`) but reports the
//! input-shaft load cycle alongside.

pub mod curve_fit;
pub mod damage;
pub mod initializer;
pub mod state;

pub use curve_fit::{CurveFit, DegradationCurveFitter};
pub use damage::DamageAccumulator;
pub use initializer::{State0Draw, TeethFailureInitializer};
pub use state::{CurveParams, ToothState0};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::defaults::{GEAR_OUT_SEED_OFFSET, OUTPUT_LOAD_CYCLE_DECIMALS};
use crate::config::{DegradationConfig, GearboxConfig};
use crate::rng::SeedStepper;
use crate::vibration::{GearboxLoads, LoadCollective};

#[derive(Debug, Error)]
pub enum DegradationError {
    #[error("grid search found no valid curve among {candidates} candidates, check the theta ranges")]
    GridSearchExhausted { candidates: usize },

    #[error("no valid initial tooth states after {attempts} attempts")]
    State0Exhausted { attempts: u32 },

    #[error("{failing} failing teeth requested on a gear with {no_teeth} teeth")]
    TooManyFailingTeeth { failing: u32, no_teeth: u32 },

    #[error("invalid state distribution: {0}")]
    Distribution(String),

    #[error("chance draw matched no tooth after {retries} retries, check the chance factors")]
    ChanceDraw { retries: u32 },

    #[error("load cycle {requested} lies before the last checkpoint {last}")]
    LoadCycleRegression { requested: f64, last: f64 },
}

// ============================================================================
// Snapshots
// ============================================================================

/// Condition of one tooth at a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToothCondition {
    pub tooth: u32,
    pub failing: bool,
    /// Undefined for teeth that never fail.
    pub damage: Option<f64>,
    /// Undefined before initiation and for teeth that never fail.
    pub pitting: Option<f64>,
}

/// Per-tooth condition of one gear, ordered by tooth number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GearState {
    pub nolc: f64,
    /// Input-shaft load cycle of this checkpoint.
    pub nolc_ref: f64,
    pub teeth: Vec<ToothCondition>,
}

impl GearState {
    /// Pitting per tooth, index 0 is tooth 1.
    pub fn pitting(&self) -> Vec<Option<f64>> {
        self.teeth.iter().map(|t| t.pitting).collect()
    }

    pub fn tooth(&self, tooth: u32) -> Option<&ToothCondition> {
        self.teeth.iter().find(|t| t.tooth == tooth)
    }
}

/// Both gears at one checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegradationSnapshot {
    pub nolc: f64,
    pub gear_in: GearState,
    pub gear_out: GearState,
}

// ============================================================================
// Gear
// ============================================================================

/// Degradation model of one gear.
#[derive(Debug, Clone)]
pub struct GearDegradation {
    no_teeth: u32,
    seed: u64,
    attempts: u32,
    accumulator: DamageAccumulator,
}

impl GearDegradation {
    /// Draw the initial tooth states and the damage at load cycle zero.
    pub fn initialize(
        no_teeth: u32,
        config: &DegradationConfig,
        seed: u64,
        max_attempts: u32,
    ) -> Result<Self, DegradationError> {
        let mut stepper = SeedStepper::new(seed);
        let draw = TeethFailureInitializer::new(no_teeth, config, max_attempts)?.draw(&mut stepper)?;
        Ok(Self {
            no_teeth,
            seed,
            attempts: draw.attempts,
            accumulator: DamageAccumulator::new(draw.rows, &config.woehler),
        })
    }

    pub fn no_teeth(&self) -> u32 {
        self.no_teeth
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draw-and-fit attempts needed for the initial states; zero if disabled.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_enabled(&self) -> bool {
        !self.accumulator.rows().is_empty()
    }

    pub fn state0(&self) -> &[ToothState0] {
        self.accumulator.rows()
    }

    pub fn accumulator(&self) -> &DamageAccumulator {
        &self.accumulator
    }

    pub fn step(&mut self, nolc: f64, nolc_ref: f64, loads: &LoadCollective) -> Result<GearState, DegradationError> {
        self.accumulator.step(nolc, nolc_ref, loads)?;
        Ok(self.current_state())
    }

    /// Latest checkpoint for every tooth.
    pub fn current_state(&self) -> GearState {
        let acc = &self.accumulator;
        let teeth = (1..=self.no_teeth)
            .map(|tooth| {
                let row = acc.rows().iter().position(|r| r.tooth == tooth);
                ToothCondition {
                    tooth,
                    failing: row.is_some(),
                    damage: row.and_then(|i| acc.damage().get(i).copied()),
                    pitting: row.and_then(|i| acc.pitting().get(i).copied().flatten()),
                }
            })
            .collect();
        GearState {
            nolc: acc.last_nolc(),
            nolc_ref: acc.nolc_ref_history().last().copied().unwrap_or(0.0),
            teeth,
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Degradation of both gears on the input-shaft load-cycle axis.
#[derive(Debug, Clone)]
pub struct DegradationEngine {
    gear_ratio: f64,
    gear_in: GearDegradation,
    gear_out: GearDegradation,
    last: Option<DegradationSnapshot>,
}

impl DegradationEngine {
    /// The output gear draws from `seed + GEAR_OUT_SEED_OFFSET`.
    pub fn new(config: &GearboxConfig, seed: u64) -> Result<Self, DegradationError> {
        let attempts = config.simulation.max_state0_attempts;
        let gear_in = GearDegradation::initialize(
            config.gear_in.no_teeth,
            &config.gear_in.degradation,
            seed,
            attempts,
        )?;
        let gear_out = GearDegradation::initialize(
            config.gear_out.no_teeth,
            &config.gear_out.degradation,
            seed.wrapping_add(GEAR_OUT_SEED_OFFSET),
            attempts,
        )?;
        info!(
            seed,
            failing_in = gear_in.state0().len(),
            failing_out = gear_out.state0().len(),
            "Degradation engine initialized"
        );
        Ok(Self {
            gear_ratio: config.gear_ratio(),
            gear_in,
            gear_out,
            last: None,
        })
    }

    /// Advance both gears to input-shaft load cycle `nolc`.
    ///
    /// Repeating the last load cycle returns the cached snapshot.
    pub fn run(&mut self, nolc: f64, loads: &GearboxLoads) -> Result<DegradationSnapshot, DegradationError> {
        if let Some(last) = self.last.as_ref().filter(|s| s.nolc == nolc) {
            return Ok(last.clone());
        }
        let nolc_out = output_load_cycle(nolc, self.gear_ratio);
        let gear_in = self.gear_in.step(nolc, nolc, &loads.gear_in)?;
        let gear_out = self.gear_out.step(nolc_out, nolc, &loads.gear_out)?;
        let snapshot = DegradationSnapshot { nolc, gear_in, gear_out };
        self.last = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Latest checkpoint; load cycle zero before the first run.
    pub fn snapshot(&self) -> DegradationSnapshot {
        self.last.clone().unwrap_or_else(|| DegradationSnapshot {
            nolc: 0.0,
            gear_in: self.gear_in.current_state(),
            gear_out: self.gear_out.current_state(),
        })
    }

    pub fn gear_in(&self) -> &GearDegradation {
        &self.gear_in
    }

    pub fn gear_out(&self) -> &GearDegradation {
        &self.gear_out
    }

    pub fn gear_ratio(&self) -> f64 {
        self.gear_ratio
    }
}

/// Output gear load cycle, rounded to a fixed number of decimals.
pub fn output_load_cycle(nolc: f64, gear_ratio: f64) -> f64 {
    let factor = 10f64.powi(OUTPUT_LOAD_CYCLE_DECIMALS);
    (nolc / gear_ratio * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::small_config;

    #[test]
    fn test_output_load_cycle_rounding() {
        assert!((output_load_cycle(1000.0, 41.0 / 21.0) - 512.195).abs() < 1e-9);
        assert_eq!(output_load_cycle(0.0, 2.0), 0.0);
    }

    #[test]
    fn test_non_failing_teeth_stay_undefined() {
        let config = small_config();
        let engine = DegradationEngine::new(&config, 4).unwrap();
        let state = engine.snapshot().gear_in;
        assert_eq!(state.teeth.len(), config.gear_in.no_teeth as usize);
        let failing: Vec<_> = state.teeth.iter().filter(|t| t.failing).collect();
        assert_eq!(failing.len(), config.gear_in.degradation.failing_teeth as usize);
        for t in state.teeth.iter().filter(|t| !t.failing) {
            assert_eq!(t.damage, None);
            assert_eq!(t.pitting, None);
        }
    }

    #[test]
    fn test_same_load_cycle_is_cached() {
        let config = small_config();
        let mut engine = DegradationEngine::new(&config, 4).unwrap();
        let loads = GearboxLoads {
            gear_in: LoadCollective::with_teeth(config.gear_in.no_teeth),
            gear_out: LoadCollective::with_teeth(config.gear_out.no_teeth),
        };
        let first = engine.run(100.0, &loads).unwrap();
        let again = engine.run(100.0, &loads).unwrap();
        assert_eq!(first, again);
        assert_eq!(engine.gear_in().accumulator().damage_history().len(), 2);
        assert_eq!(first.gear_out.nolc_ref, 100.0);
        assert!((first.gear_out.nolc - output_load_cycle(100.0, config.gear_ratio())).abs() < 1e-12);
    }

    #[test]
    fn test_disabled_gear_has_no_state() {
        let mut config = small_config();
        config.gear_out.degradation.failing_teeth = 0;
        let engine = DegradationEngine::new(&config, 4).unwrap();
        assert!(!engine.gear_out().is_enabled());
        assert_eq!(engine.gear_out().attempts(), 0);
        assert!(engine.snapshot().gear_out.pitting().iter().all(Option::is_none));
    }
}

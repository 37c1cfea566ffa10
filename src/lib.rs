//! Gearbox Twin: digital-twin simulator of a two-stage gearbox
//!
//! Synthetic vibration waveforms that evolve as gear teeth accumulate
//! fatigue damage over load cycles.
//!
//! ## Architecture
//!
//! - **Degradation Engine**: failing-tooth draw, growth curve fit, Palmgren-Miner damage
//! - **Vibration Engine**: tooth mesh pulse trains, bearing fault sines, pitting bursts
//! - **Gearbox Orchestrator**: load-cycle stepping state machine over both engines
//! - **Signal**: amplitude/scale models, carriers and sample grids shared by the engines

pub mod config;
pub mod degradation;
pub mod gearbox;
pub mod rng;
pub mod signal;
pub mod vibration;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export configuration
pub use config::{ConfigError, GearboxConfig};

// Re-export the orchestrator surface
pub use gearbox::{
    GearboxError, GearboxOrchestrator, GearboxState, GearboxSummary, SimulationHistory,
};

// Re-export engine types
pub use degradation::{
    DegradationEngine, DegradationError, DegradationSnapshot, GearState, ToothCondition,
    ToothState0,
};
pub use signal::SignalError;
pub use vibration::{GearboxLoads, LoadCollective, VibrationComponent, VibrationEngine, VibrationRun};

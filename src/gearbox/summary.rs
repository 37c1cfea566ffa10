//! Read-only reporting snapshot of a gearbox simulation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::Shaft;
use crate::degradation::{GearState, ToothState0};
use crate::vibration::BearingFrequencies;

use super::GearboxState;

#[derive(Debug, Clone, Serialize)]
pub struct GearSummary {
    pub name: String,
    pub no_teeth: u32,
    pub rotational_frequency: f64,
    pub mesh_frequency: f64,
    /// Draw-and-fit attempts of the initial states.
    pub attempts: u32,
    pub state0: Vec<ToothState0>,
    pub latest: GearState,
}

#[derive(Debug, Clone, Serialize)]
pub struct BearingSummary {
    pub name: String,
    pub shaft: Shaft,
    pub frequencies: BearingFrequencies,
}

/// Everything an external reporter needs about the current run.
#[derive(Debug, Clone, Serialize)]
pub struct GearboxSummary {
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    pub state: GearboxState,
    pub gear_ratio: f64,
    pub gears: Vec<GearSummary>,
    pub bearings: Vec<BearingSummary>,
    pub latest_load_cycle: Option<f64>,
    pub history_len: usize,
    pub vibration_runs: usize,
}

impl GearboxSummary {
    pub fn log(&self) {
        info!(
            seed = self.seed,
            state = ?self.state,
            gear_ratio = self.gear_ratio,
            latest_load_cycle = ?self.latest_load_cycle,
            history_len = self.history_len,
            vibration_runs = self.vibration_runs,
            "Gearbox summary"
        );
        for gear in &self.gears {
            let pitting: Vec<String> = gear
                .latest
                .teeth
                .iter()
                .filter(|t| t.failing)
                .map(|t| match t.pitting {
                    Some(a) => format!("{}: {a:.3}", t.tooth),
                    None => format!("{}: -", t.tooth),
                })
                .collect();
            info!(
                gear = %gear.name,
                no_teeth = gear.no_teeth,
                mesh_frequency = gear.mesh_frequency,
                failing = gear.state0.len(),
                pitting = %pitting.join(", "),
                "Gear degradation"
            );
        }
        for bearing in &self.bearings {
            info!(
                bearing = %bearing.name,
                shaft = ?bearing.shaft,
                inner_ring = bearing.frequencies.inner_ring,
                rolling_element = bearing.frequencies.rolling_element,
                outer_ring = bearing.frequencies.outer_ring,
                "Bearing fault frequencies"
            );
        }
    }
}

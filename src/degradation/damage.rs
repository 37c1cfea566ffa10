//! Palmgren-Miner damage accumulation over a Woehler curve.
//!
//! Each mesh load `L` of a failing tooth contributes `1/N2` with
//! `N2 = (neol - n0)·(L/T_ref)^(-k)`. Between two checkpoints the tooth's
//! load collective is tiled to the number of whole load cycles elapsed.

use serde::Serialize;

use super::state::ToothState0;
use super::DegradationError;
use crate::config::WoehlerConfig;
use crate::vibration::LoadCollective;

/// Damage and pitting history of the failing teeth of one gear.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamageAccumulator {
    rows: Vec<ToothState0>,
    k: f64,
    torque_ref: f64,
    /// Load cycles of this gear, starting at zero.
    nolc: Vec<f64>,
    /// Input-shaft load cycle of each entry.
    nolc_ref: Vec<f64>,
    /// One entry per checkpoint, one value per row.
    damage: Vec<Vec<f64>>,
    pitting: Vec<Vec<Option<f64>>>,
}

impl DamageAccumulator {
    /// History with the load cycle zero entry.
    pub fn new(rows: Vec<ToothState0>, woehler: &WoehlerConfig) -> Self {
        let damage0: Vec<f64> = rows.iter().map(ToothState0::initial_damage).collect();
        let pitting0 = pitting_of(&rows, &damage0);
        Self {
            rows,
            k: woehler.k,
            torque_ref: woehler.torque_ref,
            nolc: vec![0.0],
            nolc_ref: vec![0.0],
            damage: vec![damage0],
            pitting: vec![pitting0],
        }
    }

    pub fn rows(&self) -> &[ToothState0] {
        &self.rows
    }

    pub fn last_nolc(&self) -> f64 {
        self.nolc.last().copied().unwrap_or(0.0)
    }

    pub fn nolc_history(&self) -> &[f64] {
        &self.nolc
    }

    pub fn nolc_ref_history(&self) -> &[f64] {
        &self.nolc_ref
    }

    pub fn damage_history(&self) -> &[Vec<f64>] {
        &self.damage
    }

    pub fn pitting_history(&self) -> &[Vec<Option<f64>>] {
        &self.pitting
    }

    /// Latest damage per row.
    pub fn damage(&self) -> &[f64] {
        self.damage.last().map_or(&[], Vec::as_slice)
    }

    /// Latest pitting per row.
    pub fn pitting(&self) -> &[Option<f64>] {
        self.pitting.last().map_or(&[], Vec::as_slice)
    }

    /// Advance to `nolc` under `loads`; appends one history entry.
    pub fn step(&mut self, nolc: f64, nolc_ref: f64, loads: &LoadCollective) -> Result<(), DegradationError> {
        let last = self.last_nolc();
        if nolc < last {
            return Err(DegradationError::LoadCycleRegression { requested: nolc, last });
        }
        let cycles = (nolc - last).floor() as usize;

        let damage: Vec<f64> = self
            .rows
            .iter()
            .zip(self.damage())
            .map(|(row, d)| {
                d + self.increment(loads.tooth(row.tooth), cycles, row.life_span())
            })
            .collect();
        let pitting = pitting_of(&self.rows, &damage);

        self.nolc.push(nolc);
        self.nolc_ref.push(nolc_ref);
        self.damage.push(damage);
        self.pitting.push(pitting);
        Ok(())
    }

    /// Damage of `loads` tiled to `cycles` values.
    ///
    /// Negative loads count as zero. `1/N2` is written as
    /// `(L/T_ref)^k / (neol - n0)` so a zero load adds nothing.
    pub fn increment(&self, loads: &[f64], cycles: usize, life_span: f64) -> f64 {
        if loads.is_empty() || cycles == 0 {
            return 0.0;
        }
        let per_load: Vec<f64> = loads
            .iter()
            .map(|l| (l.max(0.0) / self.torque_ref).powf(self.k) / life_span)
            .collect();
        let full = cycles / per_load.len();
        let partial = cycles % per_load.len();
        let block: f64 = per_load.iter().sum();
        full as f64 * block + per_load[..partial].iter().sum::<f64>()
    }
}

fn pitting_of(rows: &[ToothState0], damage: &[f64]) -> Vec<Option<f64>> {
    rows.iter()
        .zip(damage)
        .map(|(row, &d)| row.pitting_for_damage(d))
        .collect()
}

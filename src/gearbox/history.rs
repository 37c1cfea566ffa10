//! Append-only record of torque changes and load-cycle checkpoints.

use serde::Serialize;

use crate::degradation::DegradationSnapshot;
use crate::vibration::GearboxLoads;

/// Parallel histories, indexed by call order.
///
/// Torque entries grow with `set`, load-cycle entries with `run`. The first
/// entry of each is recorded at initialization with an undefined load cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationHistory {
    torque: Vec<Vec<f64>>,
    torque_change_load_cycle: Vec<Option<f64>>,
    loads: Vec<GearboxLoads>,
    load_cycle: Vec<Option<f64>>,
    states: Vec<DegradationSnapshot>,
}

impl SimulationHistory {
    pub fn new(torque: &[f64], loads: GearboxLoads, state: DegradationSnapshot) -> Self {
        Self {
            torque: vec![torque.to_vec()],
            torque_change_load_cycle: vec![None],
            loads: vec![loads],
            load_cycle: vec![None],
            states: vec![state],
        }
    }

    pub fn record_torque(&mut self, nolc: f64, torque: &[f64], loads: GearboxLoads) {
        self.torque.push(torque.to_vec());
        self.torque_change_load_cycle.push(Some(nolc));
        self.loads.push(loads);
    }

    pub fn record_run(&mut self, nolc: f64, state: DegradationSnapshot) {
        self.load_cycle.push(Some(nolc));
        self.states.push(state);
    }

    /// Last checkpoint; `None` until the first run.
    pub fn last_load_cycle(&self) -> Option<f64> {
        self.load_cycle.last().copied().flatten()
    }

    pub fn current_torque(&self) -> &[f64] {
        self.torque.last().map_or(&[], Vec::as_slice)
    }

    pub fn current_loads(&self) -> Option<&GearboxLoads> {
        self.loads.last()
    }

    pub fn latest_state(&self) -> Option<&DegradationSnapshot> {
        self.states.last()
    }

    pub fn torque(&self) -> &[Vec<f64>] {
        &self.torque
    }

    pub fn torque_change_load_cycles(&self) -> &[Option<f64>] {
        &self.torque_change_load_cycle
    }

    pub fn loads(&self) -> &[GearboxLoads] {
        &self.loads
    }

    pub fn load_cycles(&self) -> &[Option<f64>] {
        &self.load_cycle
    }

    pub fn states(&self) -> &[DegradationSnapshot] {
        &self.states
    }

    /// Number of checkpoints including the initial one.
    pub fn len(&self) -> usize {
        self.load_cycle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.load_cycle.is_empty()
    }
}

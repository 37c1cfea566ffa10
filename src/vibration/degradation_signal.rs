//! Pitting burst injection.
//!
//! Each tooth owns an impulse carrier: for every mesh event of that tooth,
//! one sample inside the event bounds is set to one. The sample is drawn
//! with weights `1/|x|` over sorted standard normal draws `x`, which
//! concentrates impulses near the middle of the event. Carriers are drawn
//! once when the gear is built and reused for every run.

use rand::distributions::WeightedIndex;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::config::DegradationSignalConfig;
use crate::signal::scale::ScaleBase;
use crate::signal::{add_into, MeshEventBounds, ScaleModel, SignalError};

/// Burst of one run with one label per contributing tooth.
#[derive(Debug, Clone, PartialEq)]
pub struct DegradationBurst {
    pub signal: Vec<f64>,
    pub labels: Vec<String>,
}

impl DegradationBurst {
    fn silent(len: usize) -> Self {
        Self {
            signal: vec![0.0; len],
            labels: vec!["None".to_string()],
        }
    }

    pub fn is_silent(&self) -> bool {
        self.labels.len() == 1 && self.labels[0] == "None"
    }
}

#[derive(Debug, Clone)]
pub struct DegradationSignalInjector {
    /// Impulse sample indices per tooth (index 0 is tooth 1).
    carriers: Vec<Vec<usize>>,
    len: usize,
    config: DegradationSignalConfig,
    /// The gear's own torque scale, used when `torque_influence` is set.
    torque_scale: ScaleModel,
}

impl DegradationSignalInjector {
    pub fn new<R: Rng + ?Sized>(
        rng: &mut R,
        no_teeth: u32,
        bounds: &MeshEventBounds,
        len: usize,
        config: &DegradationSignalConfig,
        torque_scale: &ScaleModel,
    ) -> Result<Self, SignalError> {
        let teeth = no_teeth.max(1) as usize;
        let mut carriers = vec![Vec::new(); teeth];

        for (event, (low, up)) in bounds.iter().enumerate() {
            let width = (up - low).max(0) as usize;
            if width == 0 {
                continue;
            }
            let mut draws: Vec<f64> = (0..width).map(|_| StandardNormal.sample(rng)).collect();
            draws.sort_by(f64::total_cmp);
            let weights = draws.iter().map(|x| 1.0 / x.abs());
            let pick = WeightedIndex::new(weights)
                .map_err(|e| SignalError::Distribution(e.to_string()))?
                .sample(rng);

            let idx = low + pick as i64;
            if (0..len as i64).contains(&idx) {
                carriers[event % teeth].push(idx as usize);
            }
        }

        Ok(Self {
            carriers,
            len,
            config: config.clone(),
            torque_scale: torque_scale.clone(),
        })
    }

    /// Impulse positions of `tooth` (1-based).
    pub fn carrier(&self, tooth: u32) -> &[usize] {
        tooth
            .checked_sub(1)
            .and_then(|i| self.carriers.get(i as usize))
            .map_or(&[], Vec::as_slice)
    }

    /// Burst for the per-tooth pitting sizes (index 0 is tooth 1).
    ///
    /// Teeth without a defined pitting size do not contribute. If none
    /// contribute, no noise is drawn and the burst is silent.
    pub fn inject<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        pitting: &[Option<f64>],
        torque: &[f64],
    ) -> Result<DegradationBurst, SignalError> {
        let defined: Vec<(u32, f64)> = pitting
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|a| (i as u32 + 1, a)))
            .collect();
        if defined.is_empty() {
            return Ok(DegradationBurst::silent(self.len));
        }

        let sizes: Vec<f64> = defined.iter().map(|(_, a)| *a).collect();
        let amplitudes = self.config.scale.apply(&sizes, ScaleBase::Zeros)?;

        let mut signal = vec![0.0; self.len];
        for (&(tooth, _), amp) in defined.iter().zip(&amplitudes) {
            for &idx in self.carrier(tooth) {
                signal[idx] += amp;
            }
        }

        if self.config.torque_influence {
            let scale = self
                .torque_scale
                .apply_truncated(torque, self.len, ScaleBase::Ones)?;
            for (s, k) in signal.iter_mut().zip(&scale) {
                *s *= k / 2.0;
            }
        }

        let noise = self.config.noise.noise(rng, self.len)?;
        add_into(&mut signal, &noise);

        let labels = defined
            .iter()
            .map(|(tooth, a)| format!("Tooth {tooth} (a = {a:.3})"))
            .collect();
        Ok(DegradationBurst { signal, labels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{AmplitudeModel, ScaleBounds};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quiet_config(torque_influence: bool) -> DegradationSignalConfig {
        DegradationSignalConfig {
            scale: ScaleModel::Linear(ScaleBounds::new(0.0, 1.0, 0.0, 4.0)),
            torque_influence,
            noise: AmplitudeModel::None,
        }
    }

    fn bounds() -> MeshEventBounds {
        MeshEventBounds::from_centers(&[0, 10, 20, 30, 40, 50]).unwrap()
    }

    #[test]
    fn test_one_impulse_per_event_inside_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let injector =
            DegradationSignalInjector::new(&mut rng, 3, &bounds(), 55, &quiet_config(false), &ScaleModel::None)
                .unwrap();
        // tooth 1 meshes at events 0 and 3
        let carrier = injector.carrier(1);
        assert!(carrier.len() <= 2 && !carrier.is_empty());
        for &idx in carrier {
            assert!(idx < 5 || (25..35).contains(&idx), "Impulse {idx} outside tooth 1 events");
        }
        assert_eq!(injector.carrier(2).len(), 2);
        assert!(injector.carrier(4).is_empty());
    }

    #[test]
    fn test_no_pitting_is_silent() {
        let mut rng = StdRng::seed_from_u64(11);
        let injector =
            DegradationSignalInjector::new(&mut rng, 3, &bounds(), 55, &quiet_config(true), &ScaleModel::None)
                .unwrap();
        let burst = injector.inject(&mut rng, &[None, None, None], &[100.0; 55]).unwrap();
        assert!(burst.is_silent());
        assert!(burst.signal.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_burst_scales_with_pitting() {
        let mut rng = StdRng::seed_from_u64(11);
        let injector =
            DegradationSignalInjector::new(&mut rng, 3, &bounds(), 55, &quiet_config(false), &ScaleModel::None)
                .unwrap();
        let burst = injector.inject(&mut rng, &[None, Some(2.0), None], &[100.0; 55]).unwrap();
        assert_eq!(burst.labels, vec!["Tooth 2 (a = 2.000)".to_string()]);
        for &idx in injector.carrier(2) {
            assert!((burst.signal[idx] - 0.5).abs() < 1e-12);
        }
        let total: f64 = burst.signal.iter().sum();
        assert!((total - 0.5 * injector.carrier(2).len() as f64).abs() < 1e-12);
    }

    #[test]
    fn test_torque_influence_halves_unit_scale() {
        let mut rng = StdRng::seed_from_u64(11);
        let injector =
            DegradationSignalInjector::new(&mut rng, 3, &bounds(), 55, &quiet_config(true), &ScaleModel::None)
                .unwrap();
        let burst = injector.inject(&mut rng, &[Some(4.0), None, None], &[100.0; 55]).unwrap();
        for &idx in injector.carrier(1) {
            assert!((burst.signal[idx] - 0.5).abs() < 1e-12);
        }
    }
}

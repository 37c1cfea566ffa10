//! Brute-force grid search for the pitting growth curve.
//!
//! Every `(θ1, θ2, θ3)` triple of the configured grid is scored by the
//! mean squared error against the initiation and end-of-life points.
//! Triples whose curve is not positive at cycle zero are rejected. The grid
//! is scored in parallel; the winner is the lowest error with ties going to
//! the first triple in `θ1`-outer, `θ3`-inner order, so the result does not
//! depend on thread scheduling.

use rayon::prelude::*;
use tracing::debug;

use super::state::CurveParams;
use super::DegradationError;
use crate::config::CurveFitGrid;

/// Best triple of one fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveFit {
    pub params: CurveParams,
    pub mse: f64,
}

#[derive(Debug, Clone)]
pub struct DegradationCurveFitter {
    theta1: Vec<f64>,
    theta2: Vec<f64>,
    theta3: Vec<f64>,
}

impl DegradationCurveFitter {
    pub fn new(grid: &CurveFitGrid) -> Self {
        Self {
            theta1: CurveFitGrid::axis(grid.theta1),
            theta2: CurveFitGrid::axis(grid.theta2),
            theta3: CurveFitGrid::axis(grid.theta3),
        }
    }

    /// Number of candidate triples.
    pub fn grid_size(&self) -> usize {
        self.theta1.len() * self.theta2.len() * self.theta3.len()
    }

    fn candidate(&self, flat: usize) -> CurveParams {
        let n3 = self.theta3.len();
        let n2 = self.theta2.len();
        CurveParams::new(
            self.theta1[flat / (n2 * n3)],
            self.theta2[(flat / n3) % n2],
            self.theta3[flat % n3],
        )
    }

    /// Fit the curve through `(n0, a0)` and `(neol, aeol)`.
    pub fn fit(&self, n0: f64, a0: f64, neol: f64, aeol: f64) -> Result<CurveFit, DegradationError> {
        let best = (0..self.grid_size())
            .into_par_iter()
            .filter_map(|flat| {
                let params = self.candidate(flat);
                if !params.is_valid_at_origin() {
                    return None;
                }
                let e0 = params.evaluate(n0) - a0;
                let e1 = params.evaluate(neol) - aeol;
                let mse = (e0 * e0 + e1 * e1) / 2.0;
                mse.is_finite().then_some((mse, flat))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let (mse, flat) = best.ok_or(DegradationError::GridSearchExhausted {
            candidates: self.grid_size(),
        })?;
        let params = self.candidate(flat);
        debug!(
            n0,
            a0,
            neol,
            aeol,
            theta1 = params.theta1,
            theta2 = params.theta2,
            theta3 = params.theta3,
            mse,
            "Curve fit"
        );
        Ok(CurveFit { params, mse })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GearboxConfig;

    #[test]
    fn test_reference_grid_size() {
        let grid = GearboxConfig::reference().gear_in.degradation.grid;
        let fitter = DegradationCurveFitter::new(&grid);
        assert_eq!(fitter.grid_size(), 10 * 282 * 50);
    }

    #[test]
    fn test_fit_passes_near_both_points() {
        let grid = GearboxConfig::reference().gear_in.degradation.grid;
        let fitter = DegradationCurveFitter::new(&grid);
        let fit = fitter.fit(1e6, 0.3, 5e6, 4.0).unwrap();
        let p = fit.params;
        assert!(p.evaluate(0.0) > 0.0);
        assert!((p.evaluate(1e6) - 0.3).abs() < 0.01, "a(n0) = {}", p.evaluate(1e6));
        assert!((p.evaluate(5e6) - 4.0).abs() < 0.01, "a(neol) = {}", p.evaluate(5e6));
        assert!(fit.mse.sqrt() < 0.01);
    }

    #[test]
    fn test_ties_resolve_to_first_candidate() {
        // theta2 = 0 flattens the curve; every theta1 with the same sum ties
        let grid = CurveFitGrid {
            theta1: [1.0, 3.0, 1.0],
            theta2: [0.0, 0.5, 1.0],
            theta3: [0.0, 2.0, 1.0],
        };
        let fitter = DegradationCurveFitter::new(&grid);
        let fit = fitter.fit(1.0, 2.0, 2.0, 2.0).unwrap();
        // (1, 0, 1) and (2, 0, 0) both give a = 2; the first wins
        assert_eq!(fit.params, CurveParams::new(1.0, 0.0, 1.0));
        assert!(fit.mse.abs() < 1e-12);
    }

    #[test]
    fn test_all_candidates_rejected() {
        let grid = CurveFitGrid {
            theta1: [0.1, 0.2, 0.1],
            theta2: [1e-6, 2e-6, 1e-6],
            theta3: [-1.0, -0.5, 0.5],
        };
        let fitter = DegradationCurveFitter::new(&grid);
        assert!(matches!(
            fitter.fit(1e6, 0.3, 5e6, 4.0),
            Err(DegradationError::GridSearchExhausted { candidates: 1 })
        ));
    }
}

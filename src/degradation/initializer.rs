//! Draw-and-fit of the initial tooth state table.
//!
//! One attempt draws initiation and end-of-life points for every tooth,
//! decides which teeth fail first, keeps the configured number of failing
//! teeth and fits a growth curve to each. Attempts repeat until the table
//! passes its invariants or the attempt limit is reached.

use rand::rngs::StdRng;
use tracing::{debug, info};

use super::curve_fit::DegradationCurveFitter;
use super::state::ToothState0;
use super::DegradationError;
use crate::config::defaults::MAX_CHANCE_DRAW_RETRIES;
use crate::config::{ChanceFactors, DegradationConfig, SampleDistribution};
use crate::rng::SeedStepper;

/// Accepted state table and the attempt that produced it (1-based).
#[derive(Debug, Clone, PartialEq)]
pub struct State0Draw {
    pub rows: Vec<ToothState0>,
    pub attempts: u32,
}

#[derive(Debug, Clone)]
pub struct TeethFailureInitializer {
    no_teeth: u32,
    failing_teeth: u32,
    chances: ChanceFactors,
    n0: SampleDistribution,
    a0: SampleDistribution,
    neol: SampleDistribution,
    aeol: SampleDistribution,
    fitter: DegradationCurveFitter,
    max_attempts: u32,
}

impl TeethFailureInitializer {
    pub fn new(no_teeth: u32, config: &DegradationConfig, max_attempts: u32) -> Result<Self, DegradationError> {
        if config.failing_teeth > no_teeth {
            return Err(DegradationError::TooManyFailingTeeth {
                failing: config.failing_teeth,
                no_teeth,
            });
        }
        Ok(Self {
            no_teeth,
            failing_teeth: config.failing_teeth,
            chances: config.chances,
            n0: config.n0,
            a0: config.a0,
            neol: config.neol,
            aeol: config.aeol,
            fitter: DegradationCurveFitter::new(&config.grid),
            max_attempts,
        })
    }

    pub fn no_teeth(&self) -> u32 {
        self.no_teeth
    }

    pub fn failing_teeth(&self) -> u32 {
        self.failing_teeth
    }

    /// Repeat draw-and-fit until the table is valid.
    pub fn draw(&self, stepper: &mut SeedStepper) -> Result<State0Draw, DegradationError> {
        if self.failing_teeth == 0 {
            return Ok(State0Draw { rows: Vec::new(), attempts: 0 });
        }
        for attempt in 1..=self.max_attempts {
            if let Some(rows) = self.attempt(stepper)? {
                info!(
                    attempts = attempt,
                    failing_teeth = rows.len(),
                    teeth = ?rows.iter().map(|r| r.tooth).collect::<Vec<_>>(),
                    "Initial tooth states accepted"
                );
                return Ok(State0Draw { rows, attempts: attempt });
            }
            debug!(attempt, "Initial tooth states rejected, redrawing");
        }
        Err(DegradationError::State0Exhausted { attempts: self.max_attempts })
    }

    /// One draw-and-fit. `Ok(None)` means the table broke an invariant.
    fn attempt(&self, stepper: &mut SeedStepper) -> Result<Option<Vec<ToothState0>>, DegradationError> {
        let z = self.no_teeth as usize;
        let mut rng = stepper.next_rng();

        let a0 = sample(&self.a0, &mut rng, z)?;
        let n0 = sample(&self.n0, &mut rng, z)?;
        let mut by_n0: Vec<usize> = (0..z).collect();
        by_n0.sort_by(|&i, &j| n0[i].total_cmp(&n0[j]));

        let init_order = self.draw_initiation_order(stepper)?;
        let teeth: Vec<u32> = init_order.iter().map(|&t| t as u32 + 1).collect();

        let mut neol_sorted = sample(&self.neol, &mut rng, z)?;
        neol_sorted.sort_by(f64::total_cmp);
        let eol_order = self.draw_eol_order(stepper, &teeth)?;
        let aeol = sample(&self.aeol, &mut rng, z)?;

        let mut rows: Vec<ToothState0> = by_n0
            .iter()
            .zip(&teeth)
            .zip(&aeol)
            .map(|((&src, &tooth), &aeol)| {
                let k = eol_order.iter().position(|&t| t == tooth).unwrap_or(0);
                ToothState0 {
                    tooth,
                    a0: a0[src],
                    n0: n0[src],
                    aeol,
                    neol: neol_sorted[k],
                    curve: Default::default(),
                }
            })
            .collect();
        rows.sort_by(|a, b| a.neol.total_cmp(&b.neol));
        rows.truncate(self.failing_teeth as usize);

        if !rows.iter().all(points_are_ordered) {
            return Ok(None);
        }
        for row in &mut rows {
            row.curve = self.fitter.fit(row.n0, row.a0, row.neol, row.aeol)?.params;
        }
        if !rows.iter().all(ToothState0::is_valid) {
            return Ok(None);
        }

        // Inversion can move the points enough to break the ordering again
        let matched: Option<Vec<ToothState0>> = rows.iter().map(ToothState0::matched_to_curve).collect();
        Ok(matched.filter(|rows| rows.iter().all(ToothState0::is_valid)))
    }

    /// Initiation order of all teeth (0-based), drawn without replacement.
    pub fn draw_initiation_order(&self, stepper: &mut SeedStepper) -> Result<Vec<usize>, DegradationError> {
        let z = self.no_teeth as usize;
        let mut drawn = Vec::with_capacity(z);
        for _ in 0..z {
            let weights = initiation_chances(z, &drawn, &self.chances);
            drawn.push(draw_given_chances(stepper, &weights)?);
        }
        Ok(drawn)
    }

    /// End-of-life order over the initiation-ordered `teeth`.
    ///
    /// The position matching the number of teeth already drawn gets the
    /// keep-order factor, so the initiation order tends to survive.
    pub fn draw_eol_order(&self, stepper: &mut SeedStepper, teeth: &[u32]) -> Result<Vec<u32>, DegradationError> {
        let mut drawn = Vec::with_capacity(teeth.len());
        for _ in 0..teeth.len() {
            let mut weights: Vec<f64> = teeth
                .iter()
                .map(|t| if drawn.contains(t) { 0.0 } else { 1.0 })
                .collect();
            if let Some(w) = weights.get_mut(drawn.len()) {
                *w *= self.chances.keep_order;
            }
            let pos = draw_given_chances(stepper, &weights)?;
            drawn.push(teeth[pos]);
        }
        Ok(drawn)
    }
}

fn sample(dist: &SampleDistribution, rng: &mut StdRng, count: usize) -> Result<Vec<f64>, DegradationError> {
    dist.sample_n(rng, count).map_err(DegradationError::Distribution)
}

fn points_are_ordered(row: &ToothState0) -> bool {
    row.a0 > 0.0 && row.n0 > 0.0 && row.a0 < row.aeol && row.n0 < row.neol
}

/// Teeth diametrically opposite `tooth` (0-based); one for even counts.
pub fn opposite_teeth(tooth: usize, no_teeth: usize) -> [usize; 2] {
    let z = no_teeth as i64;
    let t = tooth as i64;
    let lower = (t - z / 2).rem_euclid(z) as usize;
    let upper = (t - (z + 1) / 2).rem_euclid(z) as usize;
    [lower, upper]
}

/// Draw weights for the next initiating tooth.
fn initiation_chances(no_teeth: usize, drawn: &[usize], chances: &ChanceFactors) -> Vec<f64> {
    (0..no_teeth)
        .map(|i| {
            if drawn.contains(&i) {
                return 0.0;
            }
            let mut w = 1.0;
            let below = (i + no_teeth - 1) % no_teeth;
            let above = (i + 1) % no_teeth;
            if drawn.contains(&below) || drawn.contains(&above) {
                w *= chances.neighbouring;
            }
            if opposite_teeth(i, no_teeth).iter().any(|o| drawn.contains(o)) {
                w *= chances.opposite;
            }
            w
        })
        .collect()
}

/// Inverse-CDF draw of one index with probability proportional to `weights`.
///
/// A uniform draw that lands in no bucket (exactly zero, or above the
/// rounded total) is repeated with a fresh generator.
pub fn draw_given_chances(stepper: &mut SeedStepper, weights: &[f64]) -> Result<usize, DegradationError> {
    let total: f64 = weights.iter().sum();
    let mut acc = 0.0;
    let cdf: Vec<f64> = weights
        .iter()
        .map(|w| {
            acc += w / total;
            acc
        })
        .collect();

    for _ in 0..MAX_CHANCE_DRAW_RETRIES {
        let u = stepper.uniform();
        let mut prev = 0.0;
        for (k, &c) in cdf.iter().enumerate() {
            if prev < u && u <= c {
                return Ok(k);
            }
            prev = c;
        }
    }
    Err(DegradationError::ChanceDraw {
        retries: MAX_CHANCE_DRAW_RETRIES,
    })
}

//! Initial tooth state table and the pitting growth curve.

use serde::Serialize;

/// Parameters of `a(n) = θ1·exp(θ2·n) + θ3`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CurveParams {
    pub theta1: f64,
    pub theta2: f64,
    pub theta3: f64,
}

impl CurveParams {
    pub fn new(theta1: f64, theta2: f64, theta3: f64) -> Self {
        Self { theta1, theta2, theta3 }
    }

    /// Pitting size at load cycle `n`.
    pub fn evaluate(&self, n: f64) -> f64 {
        self.theta1 * (self.theta2 * n).exp() + self.theta3
    }

    /// Load cycle at which the curve reaches `a`.
    ///
    /// `None` when the logarithm argument is not positive or the result is
    /// not finite.
    pub fn invert(&self, a: f64) -> Option<f64> {
        let arg = (a - self.theta3) / self.theta1;
        if !(arg > 0.0) {
            return None;
        }
        let n = arg.ln() / self.theta2;
        n.is_finite().then_some(n)
    }

    pub fn is_finite(&self) -> bool {
        self.theta1.is_finite() && self.theta2.is_finite() && self.theta3.is_finite()
    }

    /// Curve value at cycle zero is positive.
    pub fn is_valid_at_origin(&self) -> bool {
        self.theta1 + self.theta3 > 0.0
    }
}

/// One failing tooth: initiation and end-of-life points plus its curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToothState0 {
    /// 1-based tooth number.
    pub tooth: u32,
    pub a0: f64,
    pub n0: f64,
    pub aeol: f64,
    pub neol: f64,
    pub curve: CurveParams,
}

impl ToothState0 {
    /// Initiation and end-of-life points are ordered and positive, and the
    /// curve is usable.
    pub fn is_valid(&self) -> bool {
        self.a0 > 0.0
            && self.n0 > 0.0
            && self.a0 < self.aeol
            && self.n0 < self.neol
            && self.curve.is_finite()
            && self.curve.is_valid_at_origin()
    }

    /// Load cycles between initiation and end of life.
    pub fn life_span(&self) -> f64 {
        self.neol - self.n0
    }

    /// Damage at load cycle zero; negative until initiation.
    pub fn initial_damage(&self) -> f64 {
        (0.0 - self.neol) / self.life_span() + 1.0
    }

    /// Pitting size for damage `d`; undefined before initiation.
    pub fn pitting_for_damage(&self, d: f64) -> Option<f64> {
        if d.is_nan() || d < 0.0 {
            return None;
        }
        let ref_nolc = d * self.life_span() + self.n0;
        Some(self.curve.evaluate(ref_nolc))
    }

    /// Move `n0` and `neol` onto the fitted curve.
    ///
    /// `None` if either point cannot be inverted.
    pub fn matched_to_curve(&self) -> Option<Self> {
        Some(Self {
            n0: self.curve.invert(self.a0)?,
            neol: self.curve.invert(self.aeol)?,
            ..*self
        })
    }
}

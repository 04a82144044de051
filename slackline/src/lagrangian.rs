//! Closed-form Euler-Lagrange kernels for the slackline Lagrangian
//!
//!   L = m g y n' + (K/2)(1+y'^2)/n' - K sqrt(1+y'^2) + (K/2) n'
//!
//! The two Euler-Lagrange equations are solved once, offline, for `y''` and
//! `n''` in terms of the first-order state `(y, n, a, b)` with `a = y'`,
//! `b = n'`. That closed form is hard-coded here rather than re-derived at
//! runtime (Design Notes §9, option (b)): each evaluation costs a handful of
//! arithmetic operations.
//!
//! Point-mass jump conditions are solved per-call by a bounded 2x2 Newton
//! iteration, grounded on the teacher's `NewtonNonlinearSolver` shape.

use nalgebra::{Matrix2, Vector2};

use crate::errors::{Result, SlacklineError};
use crate::material::WebbingMaterial;

/// The four-variable first-order state `(y, n, a, b)` threaded through the
/// shooting integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State4 {
    pub y: f64,
    pub n: f64,
    pub a: f64,
    pub b: f64,
}

impl State4 {
    pub fn new(y: f64, n: f64, a: f64, b: f64) -> Self {
        Self { y, n, a, b }
    }

    pub fn is_finite(&self) -> bool {
        self.y.is_finite() && self.n.is_finite() && self.a.is_finite() && self.b.is_finite()
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.y, self.n, self.a, self.b]
    }

    pub fn from_array(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl std::ops::Add for State4 {
    type Output = State4;
    fn add(self, rhs: State4) -> State4 {
        State4::new(self.y + rhs.y, self.n + rhs.n, self.a + rhs.a, self.b + rhs.b)
    }
}

impl std::ops::Mul<f64> for State4 {
    type Output = State4;
    fn mul(self, rhs: f64) -> State4 {
        State4::new(self.y * rhs, self.n * rhs, self.a * rhs, self.b * rhs)
    }
}

/// Initial state at the left anchor (`x = 0`) for a given anchor tension and
/// angle below horizontal.
pub fn initial_state(material: &WebbingMaterial, anchor_tension: f64, anchor_angle: f64) -> State4 {
    let a0 = (-anchor_angle).tan();
    let s0 = (1.0 + a0 * a0).sqrt();
    let b0 = s0 / (anchor_tension / material.k + 1.0);
    State4::new(0.0, 0.0, a0, b0)
}

/// `d/dx (y, n, a, b)` at the given state, per the closed-form EL solution.
///
/// Returns `None` if the state is in a non-physical regime (`s - b <= 0`,
/// i.e. the natural length is not strictly nondecreasing relative to the
/// slope), which the caller should treat as `IntegratorDiverged`.
pub fn rhs(state: State4, material: &WebbingMaterial) -> Option<State4> {
    let State4 { a, b, .. } = state;
    if b <= 0.0 {
        return None;
    }
    let s = (1.0 + a * a).sqrt();
    let denom = s - b;
    if denom <= 0.0 || !denom.is_finite() {
        return None;
    }
    let k = material.k;
    let mg = material.m * material.g;
    let da = mg * b * b * s / (k * denom);
    let db = mg * a * b.powi(4) / (k * s * s * denom);
    if !da.is_finite() || !db.is_finite() {
        return None;
    }
    Some(State4::new(a, b, da, db))
}

/// Tension at a point given `y' = a` and `n' = b`, per `T = K(sqrt(1+a^2)/b - 1)`.
pub fn tension(a: f64, b: f64, material: &WebbingMaterial) -> f64 {
    material.k * ((1.0 + a * a).sqrt() / b - 1.0)
}

/// Absolute angle from horizontal in degrees, given `y' = a`.
pub fn angle_degrees(a: f64) -> f64 {
    a.atan().abs().to_degrees()
}

const NEWTON_MAX_ITERS: usize = 50;
const NEWTON_TOL: f64 = 1e-10;

/// Solves the point-mass jump conditions:
///
///   dL/da |_R - dL/da |_L = M g
///   dL/db |_R - dL/db |_L = 0
///
/// for `(a_R, b_R)` given the left-hand state `(a_L, b_L)`, via Newton
/// iteration seeded at `(a_L, b_L)`. The physical root satisfies `b_R > 0`;
/// [`SlacklineError::JumpUnsolvable`] is returned if no such root is found.
pub fn jump_conditions(
    a_l: f64,
    b_l: f64,
    mass: f64,
    x: f64,
    material: &WebbingMaterial,
) -> Result<(f64, f64)> {
    let k = material.k;
    let mg = material.m * material.g;
    let s_l = (1.0 + a_l * a_l).sqrt();

    let c1 = k * a_l * (1.0 / b_l - 1.0 / s_l) + mass * material.g;
    let c2 = (1.0 + a_l * a_l) / (b_l * b_l);

    let residual = |a: f64, b: f64| -> Vector2<f64> {
        let s = (1.0 + a * a).sqrt();
        let f1 = k * a * (1.0 / b - 1.0 / s) - c1;
        let f2 = (1.0 + a * a) / (b * b) - c2;
        Vector2::new(f1, f2)
    };

    let jacobian = |a: f64, b: f64| -> Matrix2<f64> {
        let s = (1.0 + a * a).sqrt();
        let df1_da = k * ((1.0 / b - 1.0 / s) + a * a / s.powi(3));
        let df1_db = -k * a / (b * b);
        let df2_da = 2.0 * a / (b * b);
        let df2_db = -2.0 * (1.0 + a * a) / b.powi(3);
        Matrix2::new(df1_da, df1_db, df2_da, df2_db)
    };

    let mut x_n = Vector2::new(a_l, b_l);
    let mut converged = false;
    for _ in 0..NEWTON_MAX_ITERS {
        let f = residual(x_n[0], x_n[1]);
        if f.norm() < NEWTON_TOL {
            converged = true;
            break;
        }
        let j = jacobian(x_n[0], x_n[1]);
        let Some(j_inv) = j.try_inverse() else {
            break;
        };
        let delta = j_inv * f;
        x_n -= delta;
        if x_n[1] <= 0.0 || !x_n[0].is_finite() || !x_n[1].is_finite() {
            break;
        }
    }

    if !converged || x_n[1] <= 0.0 || !x_n[0].is_finite() || !x_n[1].is_finite() {
        return Err(SlacklineError::JumpUnsolvable { x, mass });
    }
    Ok((x_n[0], x_n[1]))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn curvature_is_always_positive_in_the_physical_regime() {
        // da/dx = mg b^2 s / (K (s-b)) has a sign fixed by mg, b^2, s, and
        // the (physical) positivity of s - b, independent of the sign of a.
        let material = WebbingMaterial::dyneemite_pro();
        for a in [-0.3, -0.05, 0.0, 0.05, 0.3] {
            let state = State4::new(0.0, 0.0, a, 0.999);
            let d = rhs(state, &material).unwrap();
            assert!(d.a > 0.0);
        }
    }

    #[test]
    fn rhs_rejects_non_physical_state() {
        let material = WebbingMaterial::dyneemite_pro();
        // b > s is non-physical (implies negative tension beyond slack).
        let state = State4::new(0.0, 0.0, 0.0, 1.5);
        assert!(rhs(state, &material).is_none());
    }

    #[test]
    fn jump_conditions_satisfy_their_own_residuals() {
        let material = WebbingMaterial::dyneemite_pro();
        let a_l = -0.05;
        let b_l = 0.9999;
        let (a_r, b_r) = jump_conditions(a_l, b_l, 80.0, 12.5, &material).unwrap();
        assert!(b_r > 0.0);

        let s_l = (1.0 + a_l * a_l).sqrt();
        let s_r = (1.0 + a_r * a_r).sqrt();
        let lhs1 = material.k * a_r * (1.0 / b_r - 1.0 / s_r);
        let rhs1 = material.k * a_l * (1.0 / b_l - 1.0 / s_l) + 80.0 * material.g;
        assert_relative_eq!(lhs1, rhs1, epsilon = 1e-6);

        let lhs2 = (1.0 + a_r * a_r) / (b_r * b_r);
        let rhs2 = (1.0 + a_l * a_l) / (b_l * b_l);
        assert_relative_eq!(lhs2, rhs2, epsilon = 1e-6);
    }
}

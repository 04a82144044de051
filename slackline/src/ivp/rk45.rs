//! Adaptive embedded Runge-Kutta (Dormand-Prince 5(4)) stepper.
//!
//! Shared by the segmented shooting integrator ([MODULE C]) and the
//! time-domain dynamics integrator ([MODULE G]), parameterized only by the
//! state dimension and the right-hand-side closure. Grounded on the
//! teacher's `OdeSolverMethod` step/statistics shape
//! (`ode_solver::mod::tests::test_ode_solver`, which drives `step()` and
//! reads `get_statistics()`), adapted to an explicit adaptive method since
//! the closed-form RHS here needs no Newton correction per step.

use crate::errors::{Result, SlacklineError};

/// Running counters for a single adaptive integration, exposed to callers
/// who want to detect repeated step-size rejection or (in dynamics) strain
/// clipping without the solver silently absorbing it (Design Notes §9).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Statistics {
    pub number_of_steps: usize,
    pub number_of_rhs_evals: usize,
    pub number_of_rejected_steps: usize,
    pub initial_step_size: f64,
    pub final_step_size: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Tolerances {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-8,
        }
    }
}

// Dormand-Prince 5(4) Butcher tableau.
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;
const C6: f64 = 1.0;
const C7: f64 = 1.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;
const A71: f64 = 35.0 / 384.0;
const A73: f64 = 500.0 / 1113.0;
const A74: f64 = 125.0 / 192.0;
const A75: f64 = -2187.0 / 6784.0;
const A76: f64 = 11.0 / 84.0;

// 5th order solution weights (b1..b7 = A7*).
const B1: f64 = A71;
const B3: f64 = A73;
const B4: f64 = A74;
const B5: f64 = A75;
const B6: f64 = A76;
const B7: f64 = 0.0;

// 4th order (embedded) solution weights.
const E1: f64 = 5179.0 / 57600.0;
const E3: f64 = 7571.0 / 16695.0;
const E4: f64 = 393.0 / 640.0;
const E5: f64 = -92097.0 / 339200.0;
const E6: f64 = 187.0 / 2100.0;
const E7: f64 = 1.0 / 40.0;

fn axpy(out: &mut [f64], coeffs: &[(f64, &[f64])], base: &[f64]) {
    out.copy_from_slice(base);
    for (c, v) in coeffs {
        if *c == 0.0 {
            continue;
        }
        for i in 0..out.len() {
            out[i] += c * v[i];
        }
    }
}

/// A single adaptive Dormand-Prince step attempt from `(t, y)` with
/// requested step `h`. Returns `(y_next, error_norm, used_h)` on success;
/// `rhs` returning `None` at any stage is treated as a divergence.
#[allow(clippy::too_many_arguments)]
fn try_step(
    rhs: &mut dyn FnMut(f64, &[f64]) -> Option<Vec<f64>>,
    t: f64,
    y: &[f64],
    h: f64,
    stats: &mut Statistics,
) -> Option<(Vec<f64>, Vec<f64>)> {
    let n = y.len();
    let mut k1 = rhs(t, y)?;
    stats.number_of_rhs_evals += 1;
    for v in k1.iter_mut() {
        *v *= h;
    }

    let mut tmp = vec![0.0; n];
    axpy(&mut tmp, &[(A21, &k1)], y);
    let mut k2 = rhs(t + C2 * h, &tmp)?;
    stats.number_of_rhs_evals += 1;
    for v in k2.iter_mut() {
        *v *= h;
    }

    axpy(&mut tmp, &[(A31, &k1), (A32, &k2)], y);
    let mut k3 = rhs(t + C3 * h, &tmp)?;
    stats.number_of_rhs_evals += 1;
    for v in k3.iter_mut() {
        *v *= h;
    }

    axpy(&mut tmp, &[(A41, &k1), (A42, &k2), (A43, &k3)], y);
    let mut k4 = rhs(t + C4 * h, &tmp)?;
    stats.number_of_rhs_evals += 1;
    for v in k4.iter_mut() {
        *v *= h;
    }

    axpy(
        &mut tmp,
        &[(A51, &k1), (A52, &k2), (A53, &k3), (A54, &k4)],
        y,
    );
    let mut k5 = rhs(t + C5 * h, &tmp)?;
    stats.number_of_rhs_evals += 1;
    for v in k5.iter_mut() {
        *v *= h;
    }

    axpy(
        &mut tmp,
        &[(A61, &k1), (A62, &k2), (A63, &k3), (A64, &k4), (A65, &k5)],
        y,
    );
    let mut k6 = rhs(t + C6 * h, &tmp)?;
    stats.number_of_rhs_evals += 1;
    for v in k6.iter_mut() {
        *v *= h;
    }

    axpy(
        &mut tmp,
        &[
            (A71, &k1),
            (A73, &k3),
            (A74, &k4),
            (A75, &k5),
            (A76, &k6),
        ],
        y,
    );
    let mut k7 = rhs(t + C7 * h, &tmp)?;
    stats.number_of_rhs_evals += 1;
    for v in k7.iter_mut() {
        *v *= h;
    }

    let mut y_next = vec![0.0; n];
    axpy(
        &mut y_next,
        &[(B1, &k1), (B3, &k3), (B4, &k4), (B5, &k5), (B6, &k6), (B7, &k7)],
        y,
    );

    let mut error = vec![0.0; n];
    for i in 0..n {
        error[i] = (E1 - B1) * k1[i]
            + (E3 - B3) * k3[i]
            + (E4 - B4) * k4[i]
            + (E5 - B5) * k5[i]
            + (E6 - B6) * k6[i]
            + (E7 - B7) * k7[i];
    }

    Some((y_next, error))
}

/// Integrates forward from `(t0, y0)` to `t_end` (`t_end` must be `>= t0`),
/// stopping early (returning the partial trace, including the stopping
/// state) as soon as `stop_condition` returns `true` on a freshly accepted
/// state. Returns the accepted `(ts, ys, stats)`; `ys[i]` corresponds to
/// `ts[i]`.
pub fn integrate(
    mut rhs: impl FnMut(f64, &[f64]) -> Option<Vec<f64>>,
    t0: f64,
    y0: &[f64],
    t_end: f64,
    tol: Tolerances,
    mut stop_condition: impl FnMut(f64, &[f64]) -> bool,
    max_steps: usize,
) -> Result<(Vec<f64>, Vec<Vec<f64>>, Statistics)> {
    assert!(t_end >= t0, "rk45::integrate only integrates forward");
    let mut stats = Statistics::default();
    let n = y0.len();
    let span = (t_end - t0).max(1e-12);
    let mut h = (span / 100.0).min(span).max(1e-8);
    stats.initial_step_size = h;

    let mut t = t0;
    let mut y = y0.to_vec();
    let mut ts = vec![t];
    let mut ys = vec![y.clone()];

    if stop_condition(t, &y) {
        stats.final_step_size = h;
        return Ok((ts, ys, stats));
    }

    let mut steps = 0usize;
    while t < t_end {
        steps += 1;
        if steps > max_steps {
            return Err(SlacklineError::IntegratorDiverged {
                x: t,
                reason: format!("exceeded max_steps = {max_steps}"),
            });
        }
        let h_try = h.min(t_end - t);

        let Some((y_next, err)) = try_step(&mut rhs, t, &y, h_try, &mut stats) else {
            return Err(SlacklineError::IntegratorDiverged {
                x: t,
                reason: "right-hand side became non-finite or left the physical domain".into(),
            });
        };

        let mut err_ratio = 0.0f64;
        for i in 0..n {
            let sc = tol.atol + tol.rtol * y[i].abs().max(y_next[i].abs());
            err_ratio = err_ratio.max(err[i].abs() / sc.max(1e-300));
        }

        if err_ratio <= 1.0 {
            t += h_try;
            y = y_next;
            stats.number_of_steps += 1;
            ts.push(t);
            ys.push(y.clone());
            if stop_condition(t, &y) {
                break;
            }
        } else {
            stats.number_of_rejected_steps += 1;
        }

        let safety = 0.9;
        let factor = (safety * err_ratio.max(1e-12).powf(-0.2)).clamp(0.2, 5.0);
        h = (h_try * factor).max(1e-10);
        if !h.is_finite() {
            return Err(SlacklineError::IntegratorDiverged {
                x: t,
                reason: "adaptive step size became non-finite".into(),
            });
        }
    }

    stats.final_step_size = h;
    Ok((ts, ys, stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrates_exponential_decay() {
        let (ts, ys, stats) = integrate(
            |_t, y| Some(vec![-y[0]]),
            0.0,
            &[1.0],
            5.0,
            Tolerances::default(),
            |_t, _y| false,
            10_000,
        )
        .unwrap();
        let last_t = *ts.last().unwrap();
        let last_y = ys.last().unwrap()[0];
        assert!((last_t - 5.0).abs() < 1e-9);
        assert!((last_y - (-5.0f64).exp()).abs() < 1e-5);
        assert!(stats.number_of_steps > 0);
    }

    #[test]
    fn stop_condition_truncates_trace() {
        let (ts, ys, _) = integrate(
            |_t, y| Some(vec![1.0, y[0]]),
            0.0,
            &[0.0, 0.0],
            10.0,
            Tolerances::default(),
            |_t, y| y[0] >= 2.0,
            10_000,
        )
        .unwrap();
        let last = ys.last().unwrap();
        assert!((last[0] - 2.0).abs() < 0.2);
        assert!(*ts.last().unwrap() < 10.0);
    }

    #[test]
    fn diverges_on_non_finite_rhs() {
        let result = integrate(
            |_t, _y| None,
            0.0,
            &[1.0],
            1.0,
            Tolerances::default(),
            |_t, _y| false,
            10_000,
        );
        assert!(matches!(
            result,
            Err(SlacklineError::IntegratorDiverged { .. })
        ));
    }
}

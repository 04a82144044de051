//! Anchor-angle and anchor-tension binary search ([MODULE D]).
//!
//! Both searches wrap [`crate::ivp::shoot`] and bisect a scalar boundary
//! condition until the resulting trajectory lands the right anchor at the
//! target gap length (or the natural, unloaded profile reaches the target
//! natural length). Grounded on
//! `original_source/src/integrator.py::integrate_length_tension` and
//! `::integrate_natural_length`.

use crate::errors::{Result, SlacklineError};
use crate::ivp::{self, Trajectory};
use crate::material::{PointLoad, WebbingMaterial};
use crate::options::SolverOptions;

const MIN_ANCHOR_ANGLE: f64 = 0.001;
const MAX_ANCHOR_ANGLE: f64 = std::f64::consts::FRAC_PI_4;
const MAX_ANCHOR_TENSION: f64 = 50_000.0;

/// Bisects the anchor angle so the shot trajectory's right-anchor crossing
/// lands within `gap_length_tolerance` of `gap_length`, for a fixed anchor
/// tension.
///
/// Steeper anchor angles (larger `theta`) make the line leave the left
/// anchor at a steeper slope and so travel *farther* before curving back
/// down to `y = 0`: the crossing length is a monotonically increasing
/// function of `theta` on `(0, pi/4]`, per §4.D ("if the trajectory exceeds
/// `L` before anchor crossing, decrease the upper bound; if it crosses at
/// `x < L`, increase the lower bound"). The search is a plain bisection,
/// bounded by `options.max_bisection_iters` per the Open Question decision
/// in DESIGN.md.
pub fn integrate_length_tension(
    material: &WebbingMaterial,
    anchor_tension: f64,
    gap_length: f64,
    loads: &[PointLoad],
    options: &SolverOptions,
) -> Result<(f64, Trajectory)> {
    let mut lo = MIN_ANCHOR_ANGLE;
    let mut hi = MAX_ANCHOR_ANGLE;

    // A flat-enough angle legitimately shoots past `length_cutoff` before
    // ever turning back to y = 0 (`SlacklineTooLong`); that is just a very
    // large span for bisection purposes, not a hard failure. Any other
    // error (divergence, an unsolvable jump condition) is real and
    // propagates.
    let span_at = |theta: f64| -> Result<(f64, Option<Trajectory>)> {
        match ivp::shoot(material, anchor_tension, theta, loads, options) {
            Ok(traj) => {
                let span = *traj.xs.last().expect("trajectory has at least one sample");
                Ok((span, Some(traj)))
            }
            Err(SlacklineError::SlacklineTooLong { .. }) => Ok((f64::INFINITY, None)),
            Err(e) => Err(e),
        }
    };

    let (span_lo, _) = span_at(lo)?;
    let (span_hi, _) = span_at(hi)?;
    if !(span_lo <= gap_length && gap_length <= span_hi) {
        log::warn!(
            "anchor-angle bracket [{lo}, {hi}] gives spans [{span_lo}, {span_hi}] which do not \
             bracket target gap_length {gap_length}; proceeding with bisection anyway"
        );
    }

    let mut last = None;
    for _ in 0..options.max_bisection_iters {
        let mid = 0.5 * (lo + hi);
        let (span_mid, traj) = span_at(mid)?;
        let residual = span_mid - gap_length;
        log::debug!(
            "anchor-angle bisection: theta = {mid}, span = {span_mid}, residual = {residual}, bracket = [{lo}, {hi}]"
        );
        if let Some(traj) = traj {
            if residual.abs() <= options.gap_length_tolerance {
                return Ok((mid, traj));
            }
        }
        if span_mid > gap_length {
            hi = mid;
        } else {
            lo = mid;
        }
        last = Some(residual);
    }
    Err(SlacklineError::SearchUnconverged {
        max_iters: options.max_bisection_iters,
        residual: last.unwrap_or(f64::NAN),
    })
}

/// Bisects the anchor tension so the trajectory's total natural length
/// consumed (`n` at the right anchor), *with `loads` applied*, matches
/// `natural_length` — the webbing's invariant as-built length, which does
/// not change once the line is loaded. Bracket is
/// `[natural_length * m * g, 50_000 N]` per §4.D.
///
/// Higher anchor tension stretches the webbing less for the same span, so
/// the consumed natural length is monotonically decreasing in tension: also
/// a bounded bisection.
/// Returns `(anchor_tension, anchor_angle, trajectory)`.
pub fn integrate_natural_length(
    material: &WebbingMaterial,
    gap_length: f64,
    natural_length: f64,
    loads: &[PointLoad],
    options: &SolverOptions,
) -> Result<(f64, f64, Trajectory)> {
    let mut lo = natural_length * material.g * material.m;
    let mut hi = MAX_ANCHOR_TENSION;
    if lo >= hi {
        lo = hi * 0.5;
    }

    let natural_length_at = |tension: f64| -> Result<(f64, f64, Trajectory)> {
        let (theta, traj) =
            integrate_length_tension(material, tension, gap_length, loads, options)?;
        let n = traj.states.last().expect("trajectory has at least one sample").n;
        Ok((n, theta, traj))
    };

    let mut last = None;
    for _ in 0..options.max_bisection_iters {
        let mid = 0.5 * (lo + hi);
        let (n_mid, theta, traj) = natural_length_at(mid)?;
        let residual = n_mid - natural_length;
        log::debug!(
            "anchor-tension bisection: tension = {mid}, natural_length = {n_mid}, residual = {residual}, bracket = [{lo}, {hi}]"
        );
        if residual.abs() <= options.natural_length_tolerance {
            return Ok((mid, theta, traj));
        }
        if n_mid > natural_length {
            lo = mid;
        } else {
            hi = mid;
        }
        last = Some(residual);
    }
    Err(SlacklineError::SearchUnconverged {
        max_iters: options.max_bisection_iters,
        residual: last.unwrap_or(f64::NAN),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_an_anchor_angle_matching_the_gap() {
        let material = WebbingMaterial::dyneemite_pro();
        let options = SolverOptions {
            length_cutoff: 60.0,
            ..SolverOptions::default()
        };
        let (theta, traj) =
            integrate_length_tension(&material, 2000.0, 25.0, &[], &options).unwrap();
        assert!(theta > MIN_ANCHOR_ANGLE && theta < MAX_ANCHOR_ANGLE);
        let span = *traj.xs.last().unwrap();
        assert!((span - 25.0).abs() < options.gap_length_tolerance * 2.0);
    }

    #[test]
    fn finds_an_anchor_tension_matching_natural_length() {
        let material = WebbingMaterial::dyneemite_pro();
        let options = SolverOptions {
            length_cutoff: 60.0,
            ..SolverOptions::default()
        };
        let (tension, theta, traj) =
            integrate_natural_length(&material, 25.0, 25.3, &[], &options).unwrap();
        assert!(tension > 0.0);
        assert!(theta > 0.0);
        let n_last = traj.states.last().unwrap().n;
        assert!((n_last - 25.3).abs() < options.natural_length_tolerance * 2.0);
    }
}

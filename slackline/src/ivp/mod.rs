//! Segmented IVP integrator ([MODULE C]): shoots a single trajectory across
//! the segments separated by point masses, jumping the state across each
//! mass via [`crate::lagrangian::jump_conditions`].
//!
//! Grounded on `original_source/src/integrator.py::integrate`.

pub mod rk45;

use crate::errors::{Result, SlacklineError};
use crate::lagrangian::{self, State4};
use crate::material::{PointLoad, WebbingMaterial};
use crate::options::SolverOptions;

/// A single shot: the sampled trajectory and its integrator statistics.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub xs: Vec<f64>,
    pub states: Vec<State4>,
    pub stats: rk45::Statistics,
}

/// Samples emitted per sub-attempt, per §4.C: each segment's raw adaptive
/// trace is resampled onto a uniform grid of this many points before it is
/// exposed, rather than exposing the adaptive stepper's own step points.
const SAMPLES_PER_SUB_ATTEMPT: usize = 1000;

/// Linearly interpolates the state trace `(xs, states)` at `x`, clamping to
/// the endpoints. `xs` must be sorted ascending and nonempty.
fn interp_state(xs: &[f64], states: &[State4], x: f64) -> State4 {
    if x <= xs[0] {
        return states[0];
    }
    let last = xs.len() - 1;
    if x >= xs[last] {
        return states[last];
    }
    let idx = xs.partition_point(|&v| v <= x).saturating_sub(1).min(last - 1);
    let (x0, x1) = (xs[idx], xs[idx + 1]);
    let t = (x - x0) / (x1 - x0);
    states[idx] * (1.0 - t) + states[idx + 1] * t
}

/// Resamples a raw adaptive sub-attempt trace onto `n` uniformly spaced
/// points spanning its own endpoints, per §4.C's "emitting samples on a
/// uniform grid of 1000 per sub-attempt."
fn resample_uniform(xs: &[f64], states: &[State4], n: usize) -> (Vec<f64>, Vec<State4>) {
    if n < 2 || xs.len() < 2 {
        return (xs.to_vec(), states.to_vec());
    }
    let (x0, x1) = (xs[0], *xs.last().unwrap());
    let out_x: Vec<f64> = (0..n)
        .map(|i| x0 + (x1 - x0) * i as f64 / (n - 1) as f64)
        .collect();
    let out_s: Vec<State4> = out_x.iter().map(|&x| interp_state(xs, states, x)).collect();
    (out_x, out_s)
}

fn to_vec(s: State4) -> Vec<f64> {
    s.as_array().to_vec()
}

fn from_slice(v: &[f64]) -> State4 {
    State4::from_array([v[0], v[1], v[2], v[3]])
}

fn rhs_closure<'a>(
    material: &'a WebbingMaterial,
) -> impl FnMut(f64, &[f64]) -> Option<Vec<f64>> + 'a {
    move |_x, v| lagrangian::rhs(from_slice(v), material).map(|d| d.as_array().to_vec())
}

/// Integrates one segment from `(x_start, state)` to exactly `x_end`.
fn integrate_segment(
    material: &WebbingMaterial,
    x_start: f64,
    state: State4,
    x_end: f64,
    options: &SolverOptions,
) -> Result<(Vec<f64>, Vec<State4>, rk45::Statistics)> {
    let (xs, ys, stats) = rk45::integrate(
        rhs_closure(material),
        x_start,
        &to_vec(state),
        x_end,
        options.tolerances,
        |_x, _y| false,
        options.max_steps_per_segment,
    )?;
    let states = ys.iter().map(|v| from_slice(v)).collect();
    Ok((xs, states, stats))
}

/// Grows the terminal segment's target length until the trajectory either
/// crosses `y = 0` from below (reaching the right anchor) or the
/// `length_cutoff` is exhausted.
fn shoot_terminal_segment(
    material: &WebbingMaterial,
    x_start: f64,
    state: State4,
    options: &SolverOptions,
) -> Result<(Vec<f64>, Vec<State4>, rk45::Statistics)> {
    let mut guess = options.initial_guess_length;
    loop {
        let capped = x_start + guess >= options.length_cutoff;
        let x_end = if capped {
            options.length_cutoff
        } else {
            x_start + guess
        };

        let (xs, ys, stats) = rk45::integrate(
            rhs_closure(material),
            x_start,
            &to_vec(state),
            x_end,
            options.tolerances,
            |_x, y| y[0] >= 0.0,
            options.max_steps_per_segment,
        )?;
        let states: Vec<State4> = ys.iter().map(|v| from_slice(v)).collect();

        if states.last().is_some_and(|s| s.y >= 0.0) {
            return Ok((xs, states, stats));
        }
        if capped {
            return Err(SlacklineError::SlacklineTooLong {
                cutoff: options.length_cutoff,
            });
        }
        guess *= 2.0;
    }
}

/// Shoots a full trajectory from the left anchor at the given anchor
/// tension and angle, jumping across each point load in turn, and
/// terminates at the right anchor (`y` crossing zero).
///
/// Loads exactly at `x = 0` are never passed in (filtered already by
/// [`crate::material::Constraints::add_load`]); any load whose position
/// falls beyond where the trajectory actually crosses the right anchor
/// (possible only if the gap length was shortened after loads were added)
/// is skipped with a `log::warn!` diagnostic.
pub fn shoot(
    material: &WebbingMaterial,
    anchor_tension: f64,
    anchor_angle: f64,
    loads: &[PointLoad],
    options: &SolverOptions,
) -> Result<Trajectory> {
    let mut xs = Vec::new();
    let mut states = Vec::new();
    let mut stats = rk45::Statistics::default();

    let mut x_cur = 0.0f64;
    let mut state = lagrangian::initial_state(material, anchor_tension, anchor_angle);
    xs.push(x_cur);
    states.push(state);

    for (i, load) in loads.iter().enumerate() {
        if load.position <= x_cur {
            log::warn!(
                "skipping load #{i} at x = {} which lies at or before the current shooting front x = {x_cur}",
                load.position
            );
            continue;
        }
        let (seg_xs, seg_states, seg_stats) =
            integrate_segment(material, x_cur, state, load.position, options)?;
        let last = *seg_states.last().expect("segment has at least one state");
        let (seg_xs, seg_states) = resample_uniform(&seg_xs, &seg_states, SAMPLES_PER_SUB_ATTEMPT);
        extend_trace(&mut xs, &mut states, &seg_xs, &seg_states);
        accumulate(&mut stats, &seg_stats);
        let (a_r, b_r) =
            lagrangian::jump_conditions(last.a, last.b, load.mass, load.position, material)?;
        x_cur = load.position;
        state = State4::new(last.y, last.n, a_r, b_r);
        // Record the post-jump state at the same x so downstream consumers
        // see the discontinuity explicitly.
        xs.push(x_cur);
        states.push(state);
    }

    let (seg_xs, seg_states, seg_stats) =
        shoot_terminal_segment(material, x_cur, state, options)?;
    let (seg_xs, seg_states) = resample_uniform(&seg_xs, &seg_states, SAMPLES_PER_SUB_ATTEMPT);
    extend_trace(&mut xs, &mut states, &seg_xs, &seg_states);
    accumulate(&mut stats, &seg_stats);

    let last = *states.last().expect("terminal segment has at least one state");
    let x_last = *xs.last().unwrap();
    let (x_star, terminal) = if last.y.abs() < 1e-12 {
        (x_last, last)
    } else {
        // Linear interpolation using the local slope, per §4.C.
        let dx = -last.y / last.a;
        let x_star = x_last + dx;
        let n_star = last.n + dx * last.b;
        (x_star, State4::new(0.0, n_star, last.a, last.b))
    };
    xs.pop();
    states.pop();
    xs.push(x_star);
    states.push(terminal);

    Ok(Trajectory { xs, states, stats })
}

fn extend_trace(xs: &mut Vec<f64>, states: &mut Vec<State4>, seg_xs: &[f64], seg_states: &[State4]) {
    // Skip the first sample of the segment: it duplicates the last sample
    // already recorded (the segment starts exactly where the previous one,
    // or the post-jump state, left off).
    xs.extend_from_slice(&seg_xs[1..]);
    states.extend_from_slice(&seg_states[1..]);
}

fn accumulate(total: &mut rk45::Statistics, seg: &rk45::Statistics) {
    total.number_of_steps += seg.number_of_steps;
    total.number_of_rhs_evals += seg.number_of_rhs_evals;
    total.number_of_rejected_steps += seg.number_of_rejected_steps;
    if total.initial_step_size == 0.0 {
        total.initial_step_size = seg.initial_step_size;
    }
    total.final_step_size = seg.final_step_size;
}

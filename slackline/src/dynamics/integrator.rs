//! Time-domain integrator ([MODULE G]).
//!
//! Reuses the adaptive Dormand-Prince stepper from [`crate::ivp::rk45`] with
//! a state vector `z = (y[0..N-1], v[0..N-1])`. Grounded on
//! `original_source/src/core/dynamics.py::equations_of_motion`, `.simulate`.

use crate::dynamics::discretize::NodeGrid;
use crate::errors::Result;
use crate::forcing::{Forcing, Perturbation};
use crate::ivp::rk45;
use crate::material::WebbingMaterial;
use crate::options::SolverOptions;

const STRAIN_MIN: f64 = -0.5;
const STRAIN_MAX: f64 = 2.0;

/// Sampled node positions over time, plus the equilibrium the simulation
/// perturbed away from.
#[derive(Debug, Clone)]
pub struct DynamicProfile {
    pub t: Vec<f64>,
    pub x: Vec<f64>,
    /// `y[frame][node]`.
    pub y: Vec<Vec<f64>>,
    /// `v[frame][node]`.
    pub v: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicStatistics {
    pub stepper: rk45::Statistics,
    /// Number of individual strain evaluations that fell outside
    /// `[-0.5, 2.0]` and were clipped, across the whole simulation.
    pub clip_events: usize,
}

pub struct SimulationRequest<'a, P: Perturbation, F: Forcing> {
    pub grid: &'a NodeGrid,
    pub material: &'a WebbingMaterial,
    pub t_start: f64,
    pub t_end: f64,
    pub n_frames: usize,
    pub perturbation: &'a P,
    pub forcing: &'a F,
}

fn strain(dl: f64, dn: f64, clip_events: &mut usize) -> f64 {
    let raw = (dl - dn) / dn;
    if raw < STRAIN_MIN || raw > STRAIN_MAX {
        *clip_events += 1;
        log::debug!("strain {raw} clipped to [{STRAIN_MIN}, {STRAIN_MAX}] (dl = {dl}, dn = {dn})");
    }
    raw.clamp(STRAIN_MIN, STRAIN_MAX)
}

/// Computes `dz/dt` for the node-grid state `z = (y, v)`.
fn rhs(
    grid: &NodeGrid,
    material: &WebbingMaterial,
    t: f64,
    z: &[f64],
    forcing: &impl Forcing,
    clip_events: &mut usize,
) -> Option<Vec<f64>> {
    let n = grid.node_count();
    let y = &z[0..n];
    let v = &z[n..2 * n];
    let mut dz = vec![0.0; 2 * n];

    for i in 1..n - 1 {
        let dx_l = grid.x[i] - grid.x[i - 1];
        let dy_l = y[i] - y[i - 1];
        let dl_l = (dx_l * dx_l + dy_l * dy_l).sqrt();
        let eps_l = strain(dl_l, grid.dn_eq[i - 1], clip_events);
        let t_l = material.k * eps_l;

        let dx_r = grid.x[i + 1] - grid.x[i];
        let dy_r = y[i + 1] - y[i];
        let dl_r = (dx_r * dx_r + dy_r * dy_r).sqrt();
        let eps_r = strain(dl_r, grid.dn_eq[i], clip_events);
        let t_r = material.k * eps_r;

        let f_ext = forcing.force(t, grid.x[i], y[i]);
        let force = t_l * (dy_l / dl_l) - t_r * (dy_r / dl_r)
            - grid.mass[i] * material.g
            - grid.damping[i] * v[i]
            + f_ext;
        if !force.is_finite() {
            return None;
        }

        dz[i] = v[i];
        dz[n + i] = force / grid.mass[i];
    }

    Some(dz)
}

/// Runs one dynamic simulation, returning the sampled profile and the
/// equilibrium `y` it was perturbed away from.
pub fn simulate(
    request: &SimulationRequest<impl Perturbation, impl Forcing>,
    options: &SolverOptions,
) -> Result<(DynamicProfile, Vec<f64>, DynamicStatistics)> {
    let grid = request.grid;
    let n = grid.node_count();

    let mut y0 = grid.y_eq.clone();
    for i in 1..n - 1 {
        y0[i] += request.perturbation.displacement(grid.x[i]);
    }
    // Boundary nodes are pinned at equilibrium regardless of perturbation.
    y0[0] = grid.y_eq[0];
    y0[n - 1] = grid.y_eq[n - 1];
    let v0 = vec![0.0; n];
    let mut z = [y0.clone(), v0].concat();

    let frame_times: Vec<f64> = (0..request.n_frames)
        .map(|i| {
            request.t_start
                + (request.t_end - request.t_start) * i as f64 / (request.n_frames - 1).max(1) as f64
        })
        .collect();

    let mut profile = DynamicProfile {
        t: Vec::with_capacity(request.n_frames),
        x: grid.x.clone(),
        y: Vec::with_capacity(request.n_frames),
        v: Vec::with_capacity(request.n_frames),
    };
    let mut stats = DynamicStatistics::default();

    profile.t.push(frame_times[0]);
    profile.y.push(z[0..n].to_vec());
    profile.v.push(z[n..2 * n].to_vec());

    let mut t_cur = frame_times[0];
    for &t_next in &frame_times[1..] {
        let mut clip_events = 0usize;
        let (_ts, zs, step_stats) = rk45::integrate(
            |t, state| rhs(grid, request.material, t, state, request.forcing, &mut clip_events),
            t_cur,
            &z,
            t_next,
            options.tolerances,
            |_t, _y| false,
            options.max_steps_per_segment,
        )?;
        z = zs.last().expect("segment has at least one state").clone();
        stats.clip_events += clip_events;
        stats.stepper.number_of_steps += step_stats.number_of_steps;
        stats.stepper.number_of_rhs_evals += step_stats.number_of_rhs_evals;
        stats.stepper.number_of_rejected_steps += step_stats.number_of_rejected_steps;
        stats.stepper.final_step_size = step_stats.final_step_size;

        t_cur = t_next;
        profile.t.push(t_cur);
        profile.y.push(z[0..n].to_vec());
        profile.v.push(z[n..2 * n].to_vec());
    }

    Ok((profile, grid.y_eq.clone(), stats))
}

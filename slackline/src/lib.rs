//! Static and dynamic equilibrium solver for a tensioned, elastic
//! one-dimensional webbing (a slackline) under gravity and point loads.
//!
//! The public surface mirrors the shape of a rigging session: build
//! [`Constraints`], optionally add point loads, solve the static
//! equilibrium with [`Constraints::rig`], and optionally hand the result to
//! [`DynamicConstraints`] for a time-domain simulation.

pub mod bvp;
pub mod dynamics;
pub mod errors;
pub mod forcing;
pub mod ivp;
pub mod lagrangian;
pub mod material;
pub mod options;
pub mod rig;

pub use dynamics::{discretize, DynamicProfile, DynamicStatistics, NodeGrid};
pub use errors::{Result, SlacklineError};
pub use forcing::{Forcing, GaussianPluck, Impulse, NoForcing, NoPerturbation, Oscillation, Perturbation};
pub use material::{Constraints, PointLoad, WebbingMaterial};
pub use options::SolverOptions;
pub use rig::StaticProfile;

use dynamics::integrator::SimulationRequest;

/// Validates arguments and returns an empty [`Constraints`].
pub fn build_constraints(
    material: WebbingMaterial,
    gap_length: f64,
    anchor_tension: f64,
) -> Result<Constraints> {
    Constraints::new(material, gap_length, anchor_tension)
}

impl Constraints {
    /// Solves the static equilibrium for this rig, using default solver
    /// tolerances and search budgets. See [`rig::rig`] to pass custom
    /// [`SolverOptions`].
    pub fn rig(&self) -> Result<StaticProfile> {
        rig::rig(self, &SolverOptions::default())
    }

    /// As [`Constraints::rig`], with caller-supplied numeric options.
    pub fn rig_with_options(&self, options: &SolverOptions) -> Result<StaticProfile> {
        rig::rig(self, options)
    }

    /// Discretizes this rig's static equilibrium into a node/spring grid
    /// suitable for time-domain simulation.
    pub fn with_dynamics(&self, n_nodes: usize, damping_ratio: f64) -> Result<DynamicConstraints> {
        self.with_dynamics_options(n_nodes, damping_ratio, &SolverOptions::default())
    }

    pub fn with_dynamics_options(
        &self,
        n_nodes: usize,
        damping_ratio: f64,
        options: &SolverOptions,
    ) -> Result<DynamicConstraints> {
        let profile = rig::rig(self, options)?;
        let grid = discretize(&profile, n_nodes, self.material.k, self.material.m, damping_ratio);
        Ok(DynamicConstraints {
            material: self.material,
            grid,
        })
    }
}

/// A rig whose static equilibrium has already been discretized, ready for
/// one or more time-domain simulations.
#[derive(Debug, Clone)]
pub struct DynamicConstraints {
    material: WebbingMaterial,
    grid: NodeGrid,
}

impl DynamicConstraints {
    /// Runs one simulation over `[t_start, t_end]`, sampling `n_frames`
    /// evenly spaced frames, with the given perturbation and forcing
    /// (use [`NoPerturbation`]/[`NoForcing`] for neither).
    #[allow(clippy::too_many_arguments)]
    pub fn simulate(
        &self,
        t_start: f64,
        t_end: f64,
        n_frames: usize,
        perturbation: &impl Perturbation,
        forcing: &impl Forcing,
    ) -> Result<(DynamicProfile, Vec<f64>)> {
        let request = SimulationRequest {
            grid: &self.grid,
            material: &self.material,
            t_start,
            t_end,
            n_frames,
            perturbation,
            forcing,
        };
        let (profile, equilibrium_y, _stats) =
            dynamics::integrator::simulate(&request, &SolverOptions::default())?;
        Ok((profile, equilibrium_y))
    }

    /// Convenience wrapper: a Gaussian pluck released from rest, no
    /// external forcing.
    pub fn simulate_pluck(
        &self,
        t_start: f64,
        t_end: f64,
        n_frames: usize,
        center: f64,
        amplitude: f64,
        width: f64,
    ) -> Result<(DynamicProfile, Vec<f64>)> {
        let pluck = GaussianPluck {
            center,
            amplitude,
            width,
        };
        self.simulate(t_start, t_end, n_frames, &pluck, &NoForcing)
    }

    /// Convenience wrapper: an oscillating point force ("bounce"), no
    /// initial perturbation.
    #[allow(clippy::too_many_arguments)]
    pub fn simulate_bounce(
        &self,
        t_start: f64,
        t_end: f64,
        n_frames: usize,
        center: f64,
        frequency: f64,
        amplitude: f64,
        phase: f64,
    ) -> Result<(DynamicProfile, Vec<f64>)> {
        let nearest = forcing::nearest_node_position(&self.grid.x, center);
        let oscillation = Oscillation {
            center,
            frequency,
            amplitude,
            phase,
            nearest_node_x: nearest,
        };
        self.simulate(t_start, t_end, n_frames, &NoPerturbation, &oscillation)
    }

    /// Convenience wrapper: a single decaying impulse, no initial
    /// perturbation.
    pub fn simulate_impulse(
        &self,
        t_start: f64,
        t_end: f64,
        n_frames: usize,
        center: f64,
        magnitude: f64,
        duration: f64,
    ) -> Result<(DynamicProfile, Vec<f64>)> {
        let nearest = forcing::nearest_node_position(&self.grid.x, center);
        let impulse = Impulse {
            center,
            magnitude,
            duration,
            nearest_node_x: nearest,
        };
        self.simulate(t_start, t_end, n_frames, &NoPerturbation, &impulse)
    }
}

//! Node/spring discretization of a [`StaticProfile`] ([MODULE F]).
//!
//! Grounded on `original_source/src/core/dynamics.py::DynamicSlackline.__init__`.

use crate::rig::StaticProfile;

/// Linear interpolation of `(xs, ys)` at `x`, clamping to the endpoints.
/// `xs` must be sorted ascending and nonempty.
fn interp(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    if x <= xs[0] {
        return ys[0];
    }
    let last = xs.len() - 1;
    if x >= xs[last] {
        return ys[last];
    }
    let idx = xs.partition_point(|&v| v <= x).saturating_sub(1).min(last - 1);
    let (x0, x1) = (xs[idx], xs[idx + 1]);
    let (y0, y1) = (ys[idx], ys[idx + 1]);
    let t = (x - x0) / (x1 - x0);
    y0 + t * (y1 - y0)
}

/// The discretized lumped-mass, lumped-damping node grid a
/// [`super::integrator`] time-marches.
#[derive(Debug, Clone)]
pub struct NodeGrid {
    pub x: Vec<f64>,
    pub y_eq: Vec<f64>,
    /// Natural length of the segment between node `i` and `i+1`; length
    /// `x.len() - 1`.
    pub dn_eq: Vec<f64>,
    /// Lumped mass at each node; boundary nodes are massless (pinned).
    pub mass: Vec<f64>,
    /// Linear damping coefficient at each node.
    pub damping: Vec<f64>,
}

impl NodeGrid {
    pub fn node_count(&self) -> usize {
        self.x.len()
    }
}

/// Builds a [`NodeGrid`] with `n_nodes` uniformly spaced nodes over
/// `[0, profile.x.last()]`, with lumped masses and damping derived from the
/// given `stiffness` (the material's `K`) and `damping_ratio` (fraction of
/// critical).
pub fn discretize(profile: &StaticProfile, n_nodes: usize, stiffness: f64, linear_density: f64, damping_ratio: f64) -> NodeGrid {
    assert!(n_nodes >= 2, "a node grid needs at least the two anchors");
    let span = *profile.x.last().expect("profile has at least one sample");

    let x: Vec<f64> = (0..n_nodes)
        .map(|i| span * i as f64 / (n_nodes - 1) as f64)
        .collect();
    let y_eq: Vec<f64> = x.iter().map(|&xi| interp(&profile.x, &profile.y, xi)).collect();
    let n_node: Vec<f64> = x.iter().map(|&xi| interp(&profile.x, &profile.n, xi)).collect();
    let l_node: Vec<f64> = x.iter().map(|&xi| interp(&profile.x, &profile.l, xi)).collect();

    let dn_eq: Vec<f64> = n_node.windows(2).map(|w| w[1] - w[0]).collect();
    let dl_eq: Vec<f64> = l_node.windows(2).map(|w| w[1] - w[0]).collect();

    let mut mass = vec![0.0; n_nodes];
    for i in 1..n_nodes - 1 {
        mass[i] = linear_density * (dl_eq[i - 1] * 0.5 + dl_eq[i] * 0.5);
    }

    let mut damping = vec![0.0; n_nodes];
    for i in 1..n_nodes - 1 {
        let dn_local = 0.5 * (dn_eq[i - 1] + dn_eq[i]);
        damping[i] = damping_ratio * 2.0 * (stiffness * mass[i] / dn_local).sqrt();
    }

    NodeGrid {
        x,
        y_eq,
        dn_eq,
        mass,
        damping,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Constraints, WebbingMaterial};
    use crate::options::SolverOptions;
    use crate::rig;

    fn sample_profile() -> StaticProfile {
        let material = WebbingMaterial::dyneemite_pro();
        let constraints = Constraints::new(material, 25.0, 2000.0).unwrap();
        let options = SolverOptions {
            length_cutoff: 60.0,
            ..SolverOptions::default()
        };
        rig::rig(&constraints, &options).unwrap()
    }

    #[test]
    fn boundary_nodes_are_massless_and_pinned_at_zero_sag() {
        let profile = sample_profile();
        let grid = discretize(&profile, 21, 2500.0 * 100.0, 0.088, 0.02);
        assert_eq!(grid.mass[0], 0.0);
        assert_eq!(grid.mass[grid.node_count() - 1], 0.0);
        assert!(grid.y_eq[0].abs() < 1e-6);
    }

    #[test]
    fn interior_nodes_carry_positive_mass_and_damping() {
        let profile = sample_profile();
        let grid = discretize(&profile, 11, 2500.0 * 100.0, 0.088, 0.02);
        for i in 1..grid.node_count() - 1 {
            assert!(grid.mass[i] > 0.0);
            assert!(grid.damping[i] > 0.0);
        }
    }
}

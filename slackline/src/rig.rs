//! Static rig assembly ([MODULE E]): turns a solved trajectory into the
//! public [`StaticProfile`], applying the sign convention fix recorded in
//! `DESIGN.md` and deriving per-sample tension, angle, and stretched
//! arclength.
//!
//! Grounded on `original_source/src/api.py::Constraints.rig`.

use serde::{Deserialize, Deserializer, Serialize};

use crate::bvp;
use crate::errors::Result;
use crate::ivp::Trajectory;
use crate::lagrangian;
use crate::material::Constraints;
use crate::options::SolverOptions;

/// Rejects NaN/Infinity on deserialize, per §6's JSON schema.
fn finite_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = f64::deserialize(deserializer)?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(serde::de::Error::custom(format!(
            "expected a finite number, got {v}"
        )))
    }
}

/// Rejects any NaN/Infinity element on deserialize, per §6's JSON schema.
fn finite_f64_vec<'de, D>(deserializer: D) -> std::result::Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Vec::<f64>::deserialize(deserializer)?;
    if v.iter().all(|x| x.is_finite()) {
        Ok(v)
    } else {
        Err(serde::de::Error::custom(
            "expected every element to be a finite number",
        ))
    }
}

/// The solved static equilibrium profile, sampled at every point the
/// adaptive stepper visited plus each point-load location.
///
/// Matches the §6 JSON schema: `x` positions, `y` vertical sag (positive is
/// down), `n` natural-length coordinate, `l` stretched arclength from the
/// left anchor, `T` tension, `A` angle from horizontal in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticProfile {
    #[serde(deserialize_with = "finite_f64_vec")]
    pub x: Vec<f64>,
    #[serde(deserialize_with = "finite_f64_vec")]
    pub y: Vec<f64>,
    #[serde(deserialize_with = "finite_f64_vec")]
    pub n: Vec<f64>,
    #[serde(deserialize_with = "finite_f64_vec")]
    pub l: Vec<f64>,
    #[serde(rename = "T", deserialize_with = "finite_f64_vec")]
    pub tension: Vec<f64>,
    #[serde(rename = "A", deserialize_with = "finite_f64_vec")]
    pub angle: Vec<f64>,
    #[serde(deserialize_with = "finite_f64")]
    pub anchor_tension: f64,
    #[serde(deserialize_with = "finite_f64")]
    pub anchor_angle_degrees: f64,
}

fn assemble(anchor_tension: f64, anchor_angle: f64, material: &crate::material::WebbingMaterial, traj: Trajectory) -> StaticProfile {
    let count = traj.xs.len();
    let mut x = Vec::with_capacity(count);
    let mut y = Vec::with_capacity(count);
    let mut n = Vec::with_capacity(count);
    let mut l = Vec::with_capacity(count);
    let mut tension = Vec::with_capacity(count);
    let mut angle = Vec::with_capacity(count);

    let mut arclength = 0.0;
    for (i, state) in traj.states.iter().enumerate() {
        x.push(traj.xs[i]);
        // Internal `y` is concave up (dips negative); the public profile is
        // "positive = downward sag" (see DESIGN.md, Sign convention decision).
        y.push(-state.y);
        n.push(state.n);
        tension.push(lagrangian::tension(state.a, state.b, material));
        angle.push(lagrangian::angle_degrees(state.a));

        if i > 0 {
            let dx = traj.xs[i] - traj.xs[i - 1];
            let s_prev = (1.0 + traj.states[i - 1].a.powi(2)).sqrt();
            let s_cur = (1.0 + state.a.powi(2)).sqrt();
            arclength += 0.5 * (s_prev + s_cur) * dx;
        }
        l.push(arclength);
    }

    StaticProfile {
        x,
        y,
        n,
        l,
        tension,
        angle,
        anchor_tension,
        anchor_angle_degrees: anchor_angle.to_degrees(),
    }
}

/// Solves the static equilibrium for the given constraints, per §4.E:
///
/// 1. Rig unloaded at `constraints.anchor_tension` (the standing tension) to
///    find the webbing's natural length `N` as rigged.
/// 2. If loads are present, the natural length is invariant once the line is
///    stepped on: find the loaded anchor tension whose trajectory consumes
///    exactly `N` of natural length ([`bvp::integrate_natural_length`]), and
///    use that equilibrium instead.
/// 3. Derive arclength, tension, and angle pointwise and assemble the
///    profile.
pub fn rig(constraints: &Constraints, options: &SolverOptions) -> Result<StaticProfile> {
    let material = &constraints.material;

    let (standing_theta, standing_traj) = bvp::integrate_length_tension(
        material,
        constraints.anchor_tension,
        constraints.gap_length,
        &[],
        options,
    )?;

    if constraints.loads.is_empty() {
        return Ok(assemble(
            constraints.anchor_tension,
            standing_theta,
            material,
            standing_traj,
        ));
    }

    let natural_length = standing_traj
        .states
        .last()
        .expect("trajectory has at least one sample")
        .n;
    let (loaded_tension, loaded_theta, traj) = bvp::integrate_natural_length(
        material,
        constraints.gap_length,
        natural_length,
        &constraints.loads,
        options,
    )?;
    Ok(assemble(loaded_tension, loaded_theta, material, traj))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::WebbingMaterial;

    #[test]
    fn unloaded_profile_sags_downward_at_midspan() {
        let material = WebbingMaterial::dyneemite_pro();
        let constraints = Constraints::new(material, 25.0, 2000.0).unwrap();
        let options = SolverOptions {
            length_cutoff: 60.0,
            ..SolverOptions::default()
        };
        let profile = rig(&constraints, &options).unwrap();
        assert!(profile.y.first().copied().unwrap().abs() < 1e-6);
        assert!(profile.y.last().copied().unwrap().abs() < 1e-3);
        let mid = profile.y.len() / 2;
        assert!(profile.y[mid] > 0.0, "midspan sag should be positive (downward)");
    }

    #[test]
    fn static_profile_rejects_non_finite_elements_on_deserialize() {
        use serde::de::IntoDeserializer;
        use serde::de::value::{Error as ValueError, F64Deserializer};

        let nan: F64Deserializer<ValueError> = f64::NAN.into_deserializer();
        assert!(finite_f64(nan).is_err());

        let json = serde_json::json!({
            "x": [0.0, 1.0], "y": [0.0, null], "n": [0.0, 1.0], "l": [0.0, 1.0],
            "T": [100.0, 100.0], "A": [0.0, 0.0],
            "anchor_tension": 2000.0, "anchor_angle_degrees": 1.0,
        });
        let result: std::result::Result<StaticProfile, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn loaded_profile_increases_tension_near_the_load() {
        let material = WebbingMaterial::dyneemite_pro();
        let mut constraints = Constraints::new(material, 25.0, 3000.0).unwrap();
        constraints.add_load(12.5, 80.0).unwrap();
        let options = SolverOptions {
            length_cutoff: 60.0,
            ..SolverOptions::default()
        };
        let profile = rig(&constraints, &options).unwrap();
        assert!(profile.tension.iter().all(|t| t.is_finite()));
    }
}

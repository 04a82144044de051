use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{Result, SlacklineError};

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

/// Immutable webbing parameters.
///
/// `K` is the elastic constant in newtons per 100% strain: tension at
/// strain `eps` equals `K * eps`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WebbingMaterial {
    pub name: String,
    #[serde(deserialize_with = "finite_f64")]
    pub m: f64,
    #[serde(deserialize_with = "finite_f64")]
    pub g: f64,
    #[serde(rename = "K", deserialize_with = "finite_f64")]
    pub k: f64,
}

impl WebbingMaterial {
    pub fn new(name: impl Into<String>, m: f64, g: f64, k: f64) -> Result<Self> {
        if m <= 0.0 {
            return Err(SlacklineError::InvalidInput {
                reason: format!("linear mass density m must be positive, got {m}"),
            });
        }
        if g <= 0.0 {
            return Err(SlacklineError::InvalidInput {
                reason: format!("gravitational acceleration g must be positive, got {g}"),
            });
        }
        if k <= 0.0 {
            return Err(SlacklineError::InvalidInput {
                reason: format!("elastic constant K must be positive, got {k}"),
            });
        }
        Ok(Self {
            name: name.into(),
            m,
            g,
            k,
        })
    }

    /// Leighton's spec sheet for the Dyneemite Pro webbing.
    pub fn dyneemite_pro() -> Self {
        Self::new("Dyneemite Pro", 0.088, 9.81, 2500.0 * 100.0)
            .expect("builtin material constants are valid")
    }
}

/// A point mass applied at a fixed horizontal position along the line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLoad {
    #[serde(deserialize_with = "finite_f64")]
    pub position: f64,
    #[serde(deserialize_with = "finite_f64")]
    pub mass: f64,
}

/// Physical parameters and point loads for a single rigging request.
///
/// Cheaply `Clone`-able: the BVP solver in [`crate::bvp`] evaluates many
/// trajectories from the same `Constraints`, never mutating loads mid-search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub material: WebbingMaterial,
    #[serde(deserialize_with = "finite_f64")]
    pub gap_length: f64,
    #[serde(deserialize_with = "finite_f64")]
    pub anchor_tension: f64,
    pub loads: Vec<PointLoad>,
}

impl Constraints {
    pub fn new(material: WebbingMaterial, gap_length: f64, anchor_tension: f64) -> Result<Self> {
        if gap_length <= 0.0 {
            return Err(SlacklineError::InvalidInput {
                reason: format!("gap_length must be positive, got {gap_length}"),
            });
        }
        if anchor_tension <= 0.0 {
            return Err(SlacklineError::InvalidInput {
                reason: format!("anchor_tension must be positive, got {anchor_tension}"),
            });
        }
        Ok(Self {
            material,
            gap_length,
            anchor_tension,
            loads: Vec::new(),
        })
    }

    /// Adds a point load. Loads exactly at either anchor (`x = 0` or
    /// `x = gap_length`) are filtered with a `log::warn!` diagnostic rather
    /// than rejected, per §3's invariant and §7's propagation policy.
    pub fn add_load(&mut self, position: f64, mass: f64) -> Result<()> {
        if mass <= 0.0 {
            return Err(SlacklineError::InvalidInput {
                reason: format!("load mass must be positive, got {mass}"),
            });
        }
        if position < 0.0 || position > self.gap_length {
            return Err(SlacklineError::InvalidInput {
                reason: format!(
                    "load position {position} lies outside [0, {}]",
                    self.gap_length
                ),
            });
        }
        if position == 0.0 || position == self.gap_length {
            log::warn!(
                "dropping load of {mass} kg at x = {position}: anchor points cannot carry a slackliner"
            );
            return Ok(());
        }
        if self.loads.iter().any(|l| l.position == position) {
            return Err(SlacklineError::InvalidInput {
                reason: format!("duplicate load position {position}"),
            });
        }
        self.loads.push(PointLoad { position, mass });
        self.loads
            .sort_by(|a, b| a.position.partial_cmp(&b.position).unwrap());
        Ok(())
    }
}

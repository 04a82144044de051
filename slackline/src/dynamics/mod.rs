//! Node/spring discretization and time-domain simulation of the slackline
//! about its static equilibrium ([MODULE F] and [MODULE G]).

pub mod discretize;
pub mod integrator;

pub use discretize::{discretize, NodeGrid};
pub use integrator::{simulate, DynamicProfile, DynamicStatistics, SimulationRequest};

use thiserror::Error;

/// Error taxonomy for the slackline solver, per the §7 propagation policy:
/// callers only ever see these variants, never raw numeric failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlacklineError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("integrator diverged at x = {x}: {reason}")]
    IntegratorDiverged { x: f64, reason: String },

    #[error("no physical root satisfying b_r > 0 at point load x = {x}, mass = {mass} kg")]
    JumpUnsolvable { x: f64, mass: f64 },

    #[error("slackline exceeded length cutoff of {cutoff} m without reaching the right anchor")]
    SlacklineTooLong { cutoff: f64 },

    #[error("binary search did not converge within {max_iters} iterations (residual = {residual})")]
    SearchUnconverged { max_iters: usize, residual: f64 },

    #[error("operation cancelled after {steps} steps (budget = {budget})")]
    Cancelled { steps: usize, budget: usize },
}

pub type Result<T> = std::result::Result<T, SlacklineError>;

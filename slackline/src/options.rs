use crate::ivp::rk45::Tolerances;

/// Numeric knobs for a solve. Every tunable named in spec.md lives here
/// rather than in a global or a config file — per §5's "no suspension
/// points visible to the caller other than the single top-level call",
/// callers configure a request by constructing one of these, the same way
/// the teacher scopes tolerances to a `SolverProblem`.
#[derive(Debug, Clone, Copy)]
pub struct SolverOptions {
    pub tolerances: Tolerances,
    /// Maximum length a shooting trajectory may reach before giving up
    /// with [`crate::errors::SlacklineError::SlacklineTooLong`].
    pub length_cutoff: f64,
    /// Initial guess for the terminal segment's grow-and-search length.
    pub initial_guess_length: f64,
    /// Upper bound on bisection iterations in [MODULE D] before returning
    /// `SearchUnconverged`.
    pub max_bisection_iters: usize,
    /// Upper bound on adaptive-stepper steps per shot, serving as the
    /// cooperative cancellation budget from §5.
    pub max_steps_per_segment: usize,
    /// Tolerance (m) for the anchor-crossing bisection in [MODULE D].
    pub gap_length_tolerance: f64,
    /// Tolerance (m) for the natural-length bisection in [MODULE D].
    pub natural_length_tolerance: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            tolerances: Tolerances::default(),
            length_cutoff: 10_000.0,
            initial_guess_length: 1_000.0,
            max_bisection_iters: 100,
            max_steps_per_segment: 200_000,
            gap_length_tolerance: 0.1,
            natural_length_tolerance: 0.1,
        }
    }
}

//! Numerical constants shared by the simulation.

/// Tolerances used when comparing amplitudes and probabilities.
pub mod tolerance {
    /// Crate-wide equality tolerance. Two amplitudes are equal when the
    /// Euclidean distance between their rectangular forms is below this value.
    /// The same value is the cut-off for rendering and for separability tests.
    pub const EPSILON: f64 = 1e-16;

    /// Squared form of [`EPSILON`], compared against squared distances.
    pub const EPSILON_SQUARED: f64 = EPSILON * EPSILON;

    /// Allowed deviation of Σ|a|² from one before a state is reported as drifted.
    pub const NORM_TOLERANCE: f64 = 1e-9;
}

/// Used for phase angles (`e^(iθ)`)
pub const PI: f64 = std::f64::consts::PI;

/// A full turn, the period of every phase.
pub const TAU: f64 = std::f64::consts::TAU;

/// Widest register whose values are enumerated one by one when displayed
/// or validated. Wider registers are handled per qubit or per group.
pub const ENUMERATION_LIMIT: usize = 20;

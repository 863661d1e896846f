// src/validation/mod.rs

//! Consistency checks for amplitude vectors.
//!
//! Gates are assumed unitary, so a group's total probability should stay at
//! one. The engine runs [`check_normalization`] after every gate and logs
//! drift instead of failing; callers can run the same checks on a
//! [`GroupSnapshot`] or a register.

use crate::core::constants::tolerance::NORM_TOLERANCE;
use crate::core::constants::ENUMERATION_LIMIT;
use crate::core::{Amplitude, QStateError, QStateResult};
use crate::qubits::Register;
use crate::simulation::GroupSnapshot;

/// Σ|a|² over `amplitudes`.
pub fn total_probability(amplitudes: &[Amplitude]) -> f64 {
    amplitudes.iter().map(Amplitude::absolute_square).sum()
}

/// Checks that the amplitudes' squared magnitudes sum to one.
///
/// # Arguments
/// * `amplitudes` - The vector to check.
/// * `tolerance` - Allowed deviation from 1.0; defaults to `NORM_TOLERANCE`.
///
/// # Returns
/// * `Ok(())` if normalized within tolerance.
/// * `Err(QStateError::Denormalized)` carrying the observed sum otherwise.
pub fn check_normalization(amplitudes: &[Amplitude], tolerance: Option<f64>) -> QStateResult<()> {
    let tolerance = tolerance.unwrap_or(NORM_TOLERANCE);
    let norm = total_probability(amplitudes);
    if (norm - 1.0).abs() > tolerance {
        Err(QStateError::Denormalized { norm })
    } else {
        Ok(())
    }
}

/// Normalization check on a snapshot taken with [`Qubit::snapshot`](crate::Qubit::snapshot).
pub fn validate_snapshot(snapshot: &GroupSnapshot, tolerance: Option<f64>) -> QStateResult<()> {
    check_normalization(snapshot.amplitudes(), tolerance)
}

/// Checks that the register's outcome distribution sums to one.
///
/// Registers up to [`ENUMERATION_LIMIT`] qubits are checked by summing over
/// every register value. Wider ones check the group of each member instead.
pub fn validate_register(register: &Register, tolerance: Option<f64>) -> QStateResult<()> {
    if register.len() > ENUMERATION_LIMIT {
        return register
            .iter()
            .try_for_each(|qubit| validate_snapshot(&qubit.snapshot(), tolerance));
    }
    let tolerance = tolerance.unwrap_or(NORM_TOLERANCE);
    let norm: f64 = (0..1u64 << register.len())
        .map(|value| register.probability_of(value))
        .sum();
    if (norm - 1.0).abs() > tolerance {
        Err(QStateError::Denormalized { norm })
    } else {
        Ok(())
    }
}

//! Error handling logic

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

static NEXT_QUBIT_ID: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a qubit handle.
/// Identifiers are handed out from a process-wide counter and never reused,
/// so two handles compare equal exactly when they name the same qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QubitId(pub u64);

impl QubitId {
    pub(crate) fn fresh() -> Self {
        QubitId(NEXT_QUBIT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Qubit({})", self.0)
    }
}

/// Errors raised by gate construction and application.
///
/// All of them are usage errors: they are reported synchronously to the caller
/// and leave every amplitude vector untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QStateError {
    /// The gate matrix is not square, is empty, or its side is not a power of two.
    #[error("Invalid gate dimension {rows}x{cols}: matrix must be square with a power-of-two side")]
    InvalidDimension {
        /// Number of rows supplied
        rows: usize,
        /// Length of the first row supplied
        cols: usize,
    },

    /// A gate was applied to a vector whose length differs from the matrix side.
    #[error("Vector length {actual} does not match gate side length {expected}")]
    LengthMismatch {
        /// Side length of the gate matrix
        expected: usize,
        /// Length of the vector that was supplied
        actual: usize,
    },

    /// A gate was applied to the wrong number of qubits.
    #[error("Gate acts on {expected} qubit(s) but {actual} operand(s) were supplied")]
    OperandCountMismatch {
        /// Gate size in qubits
        expected: usize,
        /// Operands supplied
        actual: usize,
    },

    /// The same qubit appears more than once among a gate's operands.
    #[error("{qubit} appears more than once in the operand list")]
    DuplicateOperand {
        /// The repeated qubit
        qubit: QubitId,
    },

    /// Merging two groups would produce a state vector larger than configured.
    #[error("Entangling would create a group of {qubits} qubits (maximum {max})")]
    CapacityExceeded {
        /// Size the merged group would have
        qubits: usize,
        /// Configured ceiling
        max: usize,
    },

    /// Engine configuration could not be parsed or holds an unusable value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An amplitude vector's total probability drifted away from one.
    #[error("State vector is not normalized: sum of |a|^2 = {norm}")]
    Denormalized {
        /// The observed sum of squared magnitudes
        norm: f64,
    },
}

/// Result type alias for fallible crate operations.
pub type QStateResult<T> = Result<T, QStateError>;

impl From<serde_json::Error> for QStateError {
    fn from(err: serde_json::Error) -> Self {
        QStateError::InvalidConfig(err.to_string())
    }
}

impl QStateError {
    /// True for errors caused by handing a gate the wrong operands.
    pub fn is_operand_error(&self) -> bool {
        matches!(
            self,
            QStateError::LengthMismatch { .. }
                | QStateError::OperandCountMismatch { .. }
                | QStateError::DuplicateOperand { .. }
        )
    }
}

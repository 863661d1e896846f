// src/operations/mod.rs

//! Unitary gates and their composition algebra.
//!
//! A [`Gate`] is an immutable `2^k × 2^k` matrix of [`Amplitude`]s acting on
//! `k` qubits. Gates are composed with [`Gate::controlled`] and
//! [`Gate::inverse`], applied to a bare amplitude vector with
//! [`Gate::transform`], and applied to live qubits with [`Gate::apply_to`] or
//! [`Gate::apply_to_register`]. The standard gates live in [`catalog`].

pub mod catalog;

use crate::core::{Amplitude, QStateError, QStateResult};
use crate::core::constants::TAU;
use crate::qubits::{Qubit, Register};
use crate::simulation::engine;
use std::collections::HashSet;
use std::fmt;

/// An immutable unitary operator on `size()` qubits.
///
/// Unitarity is a caller obligation and is not checked; gates produced by
/// [`Gate::controlled`] and [`Gate::inverse`] stay unitary when their input is.
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    matrix: Vec<Vec<Amplitude>>,
    size: usize,
}

impl Gate {
    /// Creates a gate from its rows.
    ///
    /// # Errors
    /// [`QStateError::InvalidDimension`] unless the matrix is non-empty, square,
    /// and its side length is a power of two.
    pub fn new(matrix: Vec<Vec<Amplitude>>) -> QStateResult<Self> {
        let rows = matrix.len();
        if rows == 0 || !rows.is_power_of_two() {
            return Err(QStateError::InvalidDimension {
                rows,
                cols: matrix.first().map_or(0, Vec::len),
            });
        }
        if let Some(row) = matrix.iter().find(|row| row.len() != rows) {
            return Err(QStateError::InvalidDimension { rows, cols: row.len() });
        }
        Ok(Self::from_square(matrix))
    }

    /// Builds a gate whose shape is already known to be valid.
    pub(crate) fn from_square(matrix: Vec<Vec<Amplitude>>) -> Self {
        debug_assert!(matrix.len().is_power_of_two());
        let size = matrix.len().trailing_zeros() as usize;
        Self { matrix, size }
    }

    /// Number of qubits the gate acts on (`k` for a `2^k`-sided matrix).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Side length of the matrix, `2^size`.
    pub fn dimension(&self) -> usize {
        self.matrix.len()
    }

    /// The matrix rows.
    pub fn matrix(&self) -> &[Vec<Amplitude>] {
        &self.matrix
    }

    /// Multiplies the matrix with `input`.
    ///
    /// Each output component is accumulated with [`Amplitude::sum`].
    ///
    /// # Errors
    /// [`QStateError::LengthMismatch`] if `input` is not `dimension()` long.
    pub fn transform(&self, input: &[Amplitude]) -> QStateResult<Vec<Amplitude>> {
        if input.len() != self.dimension() {
            return Err(QStateError::LengthMismatch {
                expected: self.dimension(),
                actual: input.len(),
            });
        }
        let mut terms = Vec::with_capacity(input.len());
        let output = self
            .matrix
            .iter()
            .map(|row| {
                terms.clear();
                terms.extend(row.iter().zip(input).map(|(m, v)| *m * *v));
                Amplitude::sum(&terms)
            })
            .collect();
        Ok(output)
    }

    /// Single-qubit phase gate `diag(1, e^{iθ})`.
    pub fn phase(theta: f64) -> Gate {
        Gate::from_square(vec![
            vec![Amplitude::ONE, Amplitude::ZERO],
            vec![Amplitude::ZERO, Amplitude::new(1.0, theta)],
        ])
    }

    /// Phase gate of order `k`: a shift of `2π / 2^k`. `r(1)` is Pauli-Z.
    pub fn r(k: u32) -> Gate {
        Gate::phase(TAU / 2f64.powf(f64::from(k)))
    }

    /// Controlled version of this gate.
    ///
    /// The result is block-diagonal: identity on the first half, `self` on the
    /// second. When applied, the *last* operand is the control and the
    /// preceding operands are handed to `self` in order.
    pub fn controlled(&self) -> Gate {
        let half = self.dimension();
        let side = half * 2;
        let matrix = (0..side)
            .map(|row| {
                (0..side)
                    .map(|col| {
                        if row >= half && col >= half {
                            self.matrix[row - half][col - half]
                        } else if row == col {
                            Amplitude::ONE
                        } else {
                            Amplitude::ZERO
                        }
                    })
                    .collect()
            })
            .collect();
        Gate::from_square(matrix)
    }

    /// Conjugate transpose, the inverse of a unitary gate.
    pub fn inverse(&self) -> Gate {
        let side = self.dimension();
        let matrix = (0..side)
            .map(|row| (0..side).map(|col| self.matrix[col][row].conjugate()).collect())
            .collect();
        Gate::from_square(matrix)
    }

    /// Applies the gate to `qubits`, entangling their groups first.
    ///
    /// Operand `i` drives bit `i` of the gate's local index space.
    ///
    /// # Errors
    /// * [`QStateError::OperandCountMismatch`] if `qubits.len() != self.size()`.
    /// * [`QStateError::DuplicateOperand`] if a qubit is named twice.
    /// * [`QStateError::CapacityExceeded`] if the merged group would be too large.
    pub fn apply_to(&self, qubits: &[&Qubit]) -> QStateResult<()> {
        if qubits.len() != self.size {
            return Err(QStateError::OperandCountMismatch {
                expected: self.size,
                actual: qubits.len(),
            });
        }
        let mut seen = HashSet::with_capacity(qubits.len());
        if let Some(repeated) = qubits.iter().find(|q| !seen.insert(q.id())) {
            return Err(QStateError::DuplicateOperand { qubit: repeated.id() });
        }
        let operands: Vec<_> = qubits.iter().map(|q| q.core().clone()).collect();
        engine::apply_gate(self, &operands)
    }

    /// Applies the gate to every qubit of `register`, lowest position first.
    ///
    /// # Errors
    /// Same as [`Gate::apply_to`].
    pub fn apply_to_register(&self, register: &Register) -> QStateResult<()> {
        let qubits: Vec<&Qubit> = register.qubits().iter().collect();
        self.apply_to(&qubits)
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.matrix {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            writeln!(f, "[{}]", cells.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI};

    fn assert_vec_close(actual: &[Amplitude], expected: &[Amplitude]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            let diff = a.to_rectangular() - e.to_rectangular();
            assert!(diff.norm_sqr() < 1e-20, "{} != {}", a, e);
        }
    }

    #[test]
    fn test_rejects_invalid_dimensions() {
        let one = Amplitude::ONE;
        assert_eq!(
            Gate::new(vec![]),
            Err(QStateError::InvalidDimension { rows: 0, cols: 0 })
        );
        assert!(Gate::new(vec![vec![one; 3]; 3]).is_err());
        assert!(Gate::new(vec![vec![one, one], vec![one]]).is_err());
        assert_eq!(Gate::new(vec![vec![one]]).map(|g| g.size()), Ok(0));
        assert_eq!(Gate::new(vec![vec![one; 4]; 4]).map(|g| g.size()), Ok(2));
    }

    #[test]
    fn test_transform_length_mismatch() {
        let gate = catalog::X.clone();
        assert_eq!(
            gate.transform(&[Amplitude::ONE; 4]),
            Err(QStateError::LengthMismatch { expected: 2, actual: 4 })
        );
    }

    #[test]
    fn test_hadamard_transform() -> QStateResult<()> {
        let out = catalog::H.transform(&[Amplitude::ONE, Amplitude::ZERO])?;
        let h = Amplitude::real(FRAC_1_SQRT_2);
        assert_vec_close(&out, &[h, h]);

        let out = catalog::H.transform(&[h, Amplitude::real(-FRAC_1_SQRT_2)])?;
        assert_vec_close(&out, &[Amplitude::ZERO, Amplitude::ONE]);
        Ok(())
    }

    #[test]
    fn test_high_order_rotations_approach_identity() {
        for k in [63, 1 << 31, u32::MAX] {
            let shift = Gate::r(k).matrix()[1][1];
            assert!(shift.phase().is_finite(), "r({}) phase is {}", k, shift.phase());
            assert_relative_eq!(shift.magnitude(), 1.0, epsilon = 1e-12);
            assert!(shift.phase().abs() < 1e-15, "r({}) phase is {}", k, shift.phase());
        }
    }

    #[test]
    fn test_r1_is_pauli_z() {
        let r1 = Gate::r(1);
        assert_relative_eq!(r1.matrix()[1][1].phase(), PI, epsilon = 1e-12);
        let r2 = Gate::r(2);
        assert_relative_eq!(r2.matrix()[1][1].phase(), FRAC_PI_2, epsilon = 1e-12);
        assert_eq!(r1.matrix()[0][0], 1.0);
    }

    #[test]
    fn test_controlled_layout() {
        let cx = catalog::X.controlled();
        assert_eq!(cx.size(), 2);
        // |control=1, target=0> (index 2) maps to |control=1, target=1> (index 3)
        assert_eq!(cx.matrix()[3][2], 1.0);
        assert_eq!(cx.matrix()[2][2], 0.0);
        assert_eq!(cx.matrix()[1][1], 1.0);
        assert_eq!(&cx, &*catalog::CNOT);
    }

    #[test]
    fn test_inverse_is_conjugate_transpose() -> QStateResult<()> {
        let s = Gate::r(2);
        let sdg = s.inverse();
        assert_relative_eq!(sdg.matrix()[1][1].phase(), 3.0 * FRAC_PI_2, epsilon = 1e-12);

        let input = [Amplitude::real(0.6), Amplitude::new(0.8, 1.0)];
        let forward = catalog::SQRT_NOT.transform(&input)?;
        let back = catalog::SQRT_NOT.inverse().transform(&forward)?;
        assert_vec_close(&back, &input);
        Ok(())
    }

    #[test]
    fn test_display_rows() {
        let text = catalog::X.to_string();
        assert_eq!(text, "[(0.000, 0.000), (1.000, 0.000)]\n[(1.000, 0.000), (0.000, 0.000)]\n");
    }
}

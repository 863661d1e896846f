// src/lib.rs

//! `qstate` - state-vector simulation of small quantum systems
//!
//! Qubits are grouped by entanglement: each group holds the joint state of
//! its own members only, so independent qubits never pay for each other's
//! state vectors. Gates merge the groups they touch and the engine splits
//! groups again once their members become independent.
//!
//! The public surface is small: [`Qubit`] and [`Register`] handles, the
//! [`Gate`] algebra with its [`catalog`](operations::catalog) of standard
//! gates, and [`SimulatorConfig`] for engine settings.

pub mod core;
pub mod operations;
pub mod qubits;
pub mod simulation;
pub mod validation;

// Re-export the most common types for easier top-level use
pub use self::core::{Amplitude, QStateError, QStateResult, QubitId};
pub use operations::{catalog, Gate};
pub use qubits::{Qubit, Register};
pub use simulation::{configure, config, GroupSnapshot, MeasurementOutcome, SimulatorConfig};
pub use validation::{check_normalization, total_probability};

// Example 1: Bell pair
// Entangles two qubits and checks that their measurements agree.
/// ```
/// use qstate::{catalog, Qubit, QStateError};
///
/// # fn main() -> Result<(), QStateError> {
/// let target = Qubit::new();
/// let control = Qubit::new();
///
/// catalog::H.apply_to(&[&control])?;
/// // The control is the last operand.
/// catalog::CNOT.apply_to(&[&target, &control])?;
///
/// assert!(target.is_entangled_with(&control));
/// assert!((target.probability_of(true) - 0.5).abs() < 1e-9);
///
/// let first = control.measure();
/// assert_eq!(target.measure(), first);
/// assert!(!target.is_entangled_with(&control));
/// # Ok(())
/// # }
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item

// Example 2: Register arithmetic
// Loads a value into a register, flips one bit, and reads it back.
/// ```
/// use qstate::{catalog, Register, QStateError};
///
/// # fn main() -> Result<(), QStateError> {
/// let register = Register::from_value(0b0101, 4);
/// catalog::X.apply_to(&[&register[1]])?;
/// assert_eq!(register.sample(), 0b0111);
/// assert_eq!(register.measure(), 0b0111);
/// println!("{}", register);
/// # Ok(())
/// # }
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item

// Example 3: Custom gates
// Builds a gate from its matrix and composes it.
/// ```
/// use qstate::{Amplitude, Gate, Qubit, QStateError};
/// use std::f64::consts::FRAC_PI_2;
///
/// # fn main() -> Result<(), QStateError> {
/// let o = Amplitude::ZERO;
/// let i = Amplitude::ONE;
/// let s = Gate::new(vec![vec![i, o], vec![o, Amplitude::new(1.0, FRAC_PI_2)]])?;
/// assert_eq!(s, Gate::r(2));
///
/// let controlled_s = s.controlled();
/// assert_eq!(controlled_s.size(), 2);
///
/// let q = Qubit::with_value(true);
/// s.apply_to(&[&q])?;
/// s.inverse().apply_to(&[&q])?;
/// assert!(q.measure());
///
/// assert!(Gate::new(vec![vec![i, o, o]; 3]).is_err());
/// # Ok(())
/// # }
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item

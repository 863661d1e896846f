// src/qubits/register.rs
use super::Qubit;
use crate::core::bits::{build_int, to_bit_string};
use crate::core::constants::tolerance::EPSILON;
use crate::core::constants::ENUMERATION_LIMIT;
use crate::simulation::engine;
use std::fmt;
use std::ops::Index;

/// An ordered list of qubits read as an unsigned integer.
///
/// Position 0 is the least significant bit. Values wider than 64 bits are
/// truncated when read back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Register {
    qubits: Vec<Qubit>,
}

impl Register {
    /// `length` fresh qubits, all `|0⟩`.
    pub fn new(length: usize) -> Self {
        Self::from_value(0, length)
    }

    /// `length` fresh qubits prepared in the basis state `|value⟩`.
    pub fn from_value(value: u64, length: usize) -> Self {
        let qubits = (0..length)
            .map(|i| Qubit::with_value(i < u64::BITS as usize && (value >> i) & 1 == 1))
            .collect();
        Self { qubits }
    }

    /// Wraps existing handles; `qubits[0]` becomes the least significant bit.
    pub fn from_qubits(qubits: Vec<Qubit>) -> Self {
        Self { qubits }
    }

    /// Number of qubits.
    pub fn len(&self) -> usize {
        self.qubits.len()
    }

    /// True for a register without qubits.
    pub fn is_empty(&self) -> bool {
        self.qubits.is_empty()
    }

    /// The qubit at `position`, if any.
    pub fn get(&self, position: usize) -> Option<&Qubit> {
        self.qubits.get(position)
    }

    /// All qubits, least significant first.
    pub fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    /// Iterates over the qubits, least significant first.
    pub fn iter(&self) -> std::slice::Iter<'_, Qubit> {
        self.qubits.iter()
    }

    /// Reverses the bit order of the register. Only handles move; no qubit
    /// state changes.
    pub fn reverse(&mut self) {
        self.qubits.reverse();
    }

    /// Measures every qubit jointly and returns the value read.
    ///
    /// Qubits sharing a group are resolved by a single draw, so correlated
    /// qubits always read consistently.
    pub fn measure(&self) -> u64 {
        let cores: Vec<_> = self.qubits.iter().map(Qubit::core).collect();
        let outcome = engine::measure(&cores);
        build_int(self.len(), |i| outcome.get(self.qubits[i].id()).unwrap_or_default())
    }

    /// Like [`Register::measure`] but leaves the state untouched.
    pub fn sample(&self) -> u64 {
        let cores: Vec<_> = self.qubits.iter().map(Qubit::core).collect();
        let outcome = engine::sample(&cores);
        build_int(self.len(), |i| outcome.get(self.qubits[i].id()).unwrap_or_default())
    }

    /// Probability that measuring the register now yields `value`.
    pub fn probability_of(&self, value: u64) -> f64 {
        let assignment: Vec<_> = self
            .qubits
            .iter()
            .enumerate()
            .map(|(i, q)| (q.core(), i < u64::BITS as usize && (value >> i) & 1 == 1))
            .collect();
        engine::probability(&assignment)
    }

    /// True if `other` shares a group with any qubit of this register.
    pub fn is_entangled_with(&self, other: &Qubit) -> bool {
        self.qubits.iter().any(|q| q.is_entangled_with(other))
    }
}

impl Index<usize> for Register {
    type Output = Qubit;

    fn index(&self, position: usize) -> &Qubit {
        &self.qubits[position]
    }
}

impl<'a> IntoIterator for &'a Register {
    type Item = &'a Qubit;
    type IntoIter = std::slice::Iter<'a, Qubit>;

    fn into_iter(self) -> Self::IntoIter {
        self.qubits.iter()
    }
}

impl From<Vec<Qubit>> for Register {
    fn from(qubits: Vec<Qubit>) -> Self {
        Self::from_qubits(qubits)
    }
}

impl fmt::Display for Register {
    /// The distribution over register values, one line per possible value,
    /// e.g. `0.500|011⟩`. Registers wider than [`ENUMERATION_LIMIT`] list
    /// each qubit's chance of reading one instead, e.g. `[3] 0.500`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.len();
        if width > ENUMERATION_LIMIT {
            for (i, qubit) in self.iter().enumerate() {
                writeln!(f, "[{}] {:.3}", i, qubit.probability_of(true))?;
            }
            return Ok(());
        }
        for value in 0..1usize << width {
            let probability = self.probability_of(value as u64);
            if probability > EPSILON {
                writeln!(f, "{:.3}|{}⟩", probability, to_bit_string(value, width))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::catalog;
    use crate::QStateResult;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_value_round_trip() {
        let register = Register::from_value(0b1011, 4);
        assert_eq!(register.len(), 4);
        assert_relative_eq!(register.probability_of(0b1011), 1.0);
        assert_eq!(register.sample(), 0b1011);
        assert_eq!(register.measure(), 0b1011);
    }

    #[test]
    fn test_reverse_reorders_bits() {
        let mut register = Register::from_value(0b001, 3);
        register.reverse();
        assert_eq!(register.measure(), 0b100);
    }

    #[test]
    fn test_wide_register_displays_per_qubit() {
        let register = Register::from_value(0b10, 64);
        let text = register.to_string();
        assert_eq!(text.lines().count(), 64);
        assert!(text.starts_with("[0] 0.000\n[1] 1.000\n"));
        assert!(text.ends_with("[63] 0.000\n"));
    }

    #[test]
    fn test_empty_register() {
        let register = Register::new(0);
        assert!(register.is_empty());
        assert_eq!(register.measure(), 0);
        assert_relative_eq!(register.probability_of(0), 1.0);
    }

    #[test]
    fn test_is_entangled_with() -> QStateResult<()> {
        let register = Register::new(2);
        let outsider = Qubit::new();
        assert!(!register.is_entangled_with(&outsider));
        catalog::H.apply_to(&[&register[1]])?;
        catalog::CNOT.apply_to(&[&outsider, &register[1]])?;
        assert!(register.is_entangled_with(&outsider));
        Ok(())
    }

    #[test]
    fn test_display_distribution() -> QStateResult<()> {
        let register = Register::new(2);
        catalog::H.apply_to(&[&register[0]])?;
        assert_eq!(register.to_string(), "0.500|00⟩\n0.500|01⟩\n");
        Ok(())
    }
}

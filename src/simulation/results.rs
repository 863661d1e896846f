// src/simulation/results.rs
use crate::core::bits::to_bit_string;
use crate::core::{Amplitude, QubitId};
use std::collections::HashMap;
use std::fmt;

/// Outcomes of a joint measurement or sample, keyed by qubit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementOutcome {
    outcomes: HashMap<QubitId, bool>,
}

impl MeasurementOutcome {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, qubit: QubitId, value: bool) {
        self.outcomes.insert(qubit, value);
    }

    /// The outcome drawn for `qubit`, if it took part.
    pub fn get(&self, qubit: QubitId) -> Option<bool> {
        self.outcomes.get(&qubit).copied()
    }

    /// True if `qubit` already has an outcome.
    pub fn contains(&self, qubit: QubitId) -> bool {
        self.outcomes.contains_key(&qubit)
    }

    /// Number of qubits with an outcome.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// True when no qubit was measured.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// All recorded outcomes.
    pub fn all(&self) -> &HashMap<QubitId, bool> {
        &self.outcomes
    }
}

impl fmt::Display for MeasurementOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sorted: Vec<_> = self.outcomes.iter().collect();
        sorted.sort_by_key(|(id, _)| **id);
        for (id, value) in sorted {
            writeln!(f, "{}: {}", id, u8::from(*value))?;
        }
        Ok(())
    }
}

/// A copy of one entanglement group's state taken under its lock.
///
/// `members[i]` is the qubit at local position `i`, which is bit `i` of every
/// amplitude index.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSnapshot {
    members: Vec<QubitId>,
    amplitudes: Vec<Amplitude>,
}

impl GroupSnapshot {
    pub(crate) fn new(members: Vec<QubitId>, amplitudes: Vec<Amplitude>) -> Self {
        Self { members, amplitudes }
    }

    /// Qubits of the group, by position. Includes qubits whose handles have
    /// been dropped, so the length always equals [`GroupSnapshot::qubit_count`].
    pub fn members(&self) -> &[QubitId] {
        &self.members
    }

    /// The `2^n` amplitudes.
    pub fn amplitudes(&self) -> &[Amplitude] {
        &self.amplitudes
    }

    /// Number of qubits the amplitude vector spans.
    pub fn qubit_count(&self) -> usize {
        self.amplitudes.len().trailing_zeros() as usize
    }

    /// Local position of `qubit` in this group.
    pub fn position_of(&self, qubit: QubitId) -> Option<usize> {
        self.members.iter().position(|id| *id == qubit)
    }
}

impl fmt::Display for GroupSnapshot {
    /// One line per non-negligible amplitude, e.g. `(0.707, 0.000)|01⟩`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.qubit_count();
        for (index, amplitude) in self.amplitudes.iter().enumerate() {
            if !amplitude.is_negligible() {
                writeln!(f, "{}|{}⟩", amplitude, to_bit_string(index, width))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_1_SQRT_2;

    #[test]
    fn test_outcome_map() {
        let mut outcome = MeasurementOutcome::new();
        assert!(outcome.is_empty());
        outcome.record(QubitId(3), true);
        outcome.record(QubitId(1), false);
        assert_eq!(outcome.get(QubitId(3)), Some(true));
        assert_eq!(outcome.get(QubitId(2)), None);
        assert!(outcome.contains(QubitId(1)));
        assert_eq!(outcome.len(), 2);
        assert_eq!(outcome.to_string(), "Qubit(1): 0\nQubit(3): 1\n");
    }

    #[test]
    fn test_snapshot_display_skips_negligible() {
        let h = Amplitude::real(FRAC_1_SQRT_2);
        let snapshot = GroupSnapshot::new(
            vec![QubitId(0), QubitId(1)],
            vec![h, Amplitude::ZERO, Amplitude::ZERO, h],
        );
        assert_eq!(snapshot.qubit_count(), 2);
        assert_eq!(snapshot.position_of(QubitId(1)), Some(1));
        assert_eq!(
            snapshot.to_string(),
            "(0.707, 0.000)|00⟩\n(0.707, 0.000)|11⟩\n"
        );
    }
}

// src/qubits/qubit.rs
use crate::core::constants::tolerance::EPSILON;
use crate::core::{Amplitude, QubitId};
use crate::simulation::engine::{self, QubitCore};
use crate::simulation::GroupSnapshot;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Handle to a single qubit.
///
/// The qubit's state lives in the entanglement group it currently belongs
/// to; the handle only follows it. Handles are `Send + Sync` and may be used
/// from several threads at once.
#[derive(Clone)]
pub struct Qubit {
    core: Arc<QubitCore>,
}

impl Qubit {
    /// A new qubit in `|0⟩`, alone in its group.
    pub fn new() -> Self {
        Self::with_value(false)
    }

    /// A new qubit in `|1⟩` if `value`, else `|0⟩`.
    pub fn with_value(value: bool) -> Self {
        Self { core: QubitCore::new(value) }
    }

    /// Process-unique identifier of this qubit.
    pub fn id(&self) -> QubitId {
        self.core.id()
    }

    /// Measures the qubit in the computational basis.
    ///
    /// The group collapses to the drawn outcome and the qubit moves into a
    /// single-qubit group holding that basis state.
    pub fn measure(&self) -> bool {
        engine::measure(&[&self.core]).get(self.id()).unwrap_or_default()
    }

    /// Draws an outcome with the Born-rule distribution without disturbing
    /// the state.
    pub fn sample(&self) -> bool {
        engine::sample(&[&self.core]).get(self.id()).unwrap_or_default()
    }

    /// Probability that measuring now yields `value`.
    pub fn probability_of(&self, value: bool) -> f64 {
        engine::probability(&[(&self.core, value)])
    }

    /// True if both qubits currently share an entanglement group.
    ///
    /// Shared membership is necessary but not sufficient for physical
    /// entanglement: a group is only split after a gate runs.
    pub fn is_entangled_with(&self, other: &Qubit) -> bool {
        engine::same_group(&self.core, &other.core)
    }

    /// Number of qubits in this qubit's group.
    pub fn group_size(&self) -> usize {
        engine::group_size(&self.core)
    }

    /// This qubit's bit position within its group.
    pub fn position(&self) -> usize {
        engine::position(&self.core)
    }

    /// The amplitude vector of this qubit's group and the qubit's bit
    /// position in it.
    pub fn amplitudes(&self) -> (Vec<Amplitude>, usize) {
        let snapshot = self.snapshot();
        let position = snapshot.position_of(self.id()).unwrap_or_default();
        (snapshot.amplitudes().to_vec(), position)
    }

    /// Copy of the group state this qubit belongs to.
    pub fn snapshot(&self) -> GroupSnapshot {
        engine::snapshot(&self.core)
    }

    pub(crate) fn core(&self) -> &Arc<QubitCore> {
        &self.core
    }
}

impl Default for Qubit {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Qubit {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Qubit {}

impl Hash for Qubit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Qubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Qubit").field("id", &self.id()).finish()
    }
}

impl fmt::Display for Qubit {
    /// Outcome probabilities, e.g. `0.500|0⟩ + 0.500|1⟩`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = [false, true]
            .into_iter()
            .map(|value| (value, self.probability_of(value)))
            .filter(|(_, probability)| *probability > EPSILON)
            .map(|(value, probability)| format!("{:.3}|{}⟩", probability, u8::from(value)))
            .collect();
        write!(f, "{}", terms.join(" + "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::catalog;
    use crate::QStateResult;
    use approx::assert_relative_eq;

    #[test]
    fn test_basis_preparation() {
        let zero = Qubit::new();
        let one = Qubit::with_value(true);
        assert_relative_eq!(zero.probability_of(false), 1.0);
        assert_relative_eq!(one.probability_of(true), 1.0);
        assert!(!zero.measure());
        assert!(one.measure());
        assert_ne!(zero.id(), one.id());
    }

    #[test]
    fn test_clones_share_state() -> QStateResult<()> {
        let q = Qubit::new();
        let alias = q.clone();
        catalog::X.apply_to(&[&q])?;
        assert_eq!(q, alias);
        assert!(alias.sample());
        Ok(())
    }

    #[test]
    fn test_superposition_probabilities() -> QStateResult<()> {
        let q = Qubit::new();
        catalog::H.apply_to(&[&q])?;
        assert_relative_eq!(q.probability_of(false), 0.5, epsilon = 1e-12);
        assert_relative_eq!(q.probability_of(true), 0.5, epsilon = 1e-12);
        let outcome = q.measure();
        assert_relative_eq!(q.probability_of(outcome), 1.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_display_outcome_probabilities() -> QStateResult<()> {
        let q = Qubit::with_value(true);
        assert_eq!(q.to_string(), "1.000|1⟩");
        catalog::H.apply_to(&[&q])?;
        assert_eq!(q.to_string(), "0.500|0⟩ + 0.500|1⟩");
        Ok(())
    }

    #[test]
    fn test_amplitudes_report_position() -> QStateResult<()> {
        let target = Qubit::new();
        let control = Qubit::with_value(true);
        catalog::CNOT.apply_to(&[&target, &control])?;
        // |11⟩ is a product state, so the group splits again.
        let (amplitudes, position) = target.amplitudes();
        assert_eq!(position, 0);
        assert_eq!(amplitudes.len(), 2);
        assert_relative_eq!(amplitudes[1].magnitude(), 1.0, epsilon = 1e-12);
        assert_eq!(target.group_size(), 1);
        assert_eq!(target.snapshot().members(), &[target.id()]);
        Ok(())
    }
}

// src/simulation/config.rs

//! Engine configuration.
//!
//! A [`SimulatorConfig`] is plain data: build it with the `with_*` methods or
//! load it from JSON, then install it process-wide with
//! [`configure`](super::configure).

use crate::core::{QStateError, QStateResult};
use serde::{Deserialize, Serialize};

/// Largest group size accepted by [`SimulatorConfig::validate`].
/// A group of `n` qubits stores `2^n` amplitudes.
pub const MAX_SUPPORTED_QUBITS: usize = 30;

/// Default ceiling on the number of qubits a single group may hold.
pub const DEFAULT_MAX_GROUP_QUBITS: usize = 24;

/// Tunables for the entanglement-group engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Seed for the measurement random source. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Try to factor a group into independent groups after each gate.
    pub auto_split: bool,
    /// Merges that would exceed this many qubits fail with
    /// [`QStateError::CapacityExceeded`].
    pub max_group_qubits: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            auto_split: true,
            max_group_qubits: DEFAULT_MAX_GROUP_QUBITS,
        }
    }
}

impl SimulatorConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixes the measurement seed, making outcome sequences reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables or disables splitting after gate application.
    pub fn with_auto_split(mut self, auto_split: bool) -> Self {
        self.auto_split = auto_split;
        self
    }

    /// Sets the group size ceiling.
    pub fn with_max_group_qubits(mut self, max_group_qubits: usize) -> Self {
        self.max_group_qubits = max_group_qubits;
        self
    }

    /// Checks that every field holds a usable value.
    ///
    /// # Errors
    /// [`QStateError::InvalidConfig`] if `max_group_qubits` is zero or above
    /// [`MAX_SUPPORTED_QUBITS`].
    pub fn validate(&self) -> QStateResult<()> {
        if self.max_group_qubits == 0 || self.max_group_qubits > MAX_SUPPORTED_QUBITS {
            return Err(QStateError::InvalidConfig(format!(
                "max_group_qubits must be in 1..={}, got {}",
                MAX_SUPPORTED_QUBITS, self.max_group_qubits
            )));
        }
        Ok(())
    }

    /// Parses and validates a configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> QStateResult<Self> {
        let config: SimulatorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> QStateResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulatorConfig::default();
        assert_eq!(config.seed, None);
        assert!(config.auto_split);
        assert_eq!(config.max_group_qubits, DEFAULT_MAX_GROUP_QUBITS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = SimulatorConfig::new()
            .with_seed(7)
            .with_auto_split(false)
            .with_max_group_qubits(4);
        assert_eq!(config.seed, Some(7));
        assert!(!config.auto_split);
        assert_eq!(config.max_group_qubits, 4);
    }

    #[test]
    fn test_json_partial_fields() -> QStateResult<()> {
        let config = SimulatorConfig::from_json(r#"{ "seed": 42 }"#)?;
        assert_eq!(config.seed, Some(42));
        assert!(config.auto_split);

        let text = config.to_json()?;
        assert_eq!(SimulatorConfig::from_json(&text)?, config);
        Ok(())
    }

    #[test]
    fn test_json_rejects_bad_values() {
        assert!(matches!(
            SimulatorConfig::from_json(r#"{ "max_group_qubits": 0 }"#),
            Err(QStateError::InvalidConfig(_))
        ));
        assert!(matches!(
            SimulatorConfig::from_json("not json"),
            Err(QStateError::InvalidConfig(_))
        ));
    }
}

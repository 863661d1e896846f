// src/simulation/mod.rs

//! The entanglement-group engine and its process-wide settings.
//!
//! Qubits are not simulated in one global state vector. Each qubit belongs to
//! an entanglement group holding the joint state of its members only; groups
//! merge when a gate spans them and split again once their members become
//! independent. The engine itself is internal: users drive it through
//! [`Qubit`](crate::Qubit), [`Register`](crate::Register) and
//! [`Gate`](crate::Gate).
//!
//! Settings live in one [`SimulatorConfig`] installed with [`configure`].
//! Measurement randomness comes from a single shared generator that
//! [`configure`] reseeds.

mod config;
pub(crate) mod engine;
mod results;

pub use config::{SimulatorConfig, DEFAULT_MAX_GROUP_QUBITS, MAX_SUPPORTED_QUBITS};
pub use results::{GroupSnapshot, MeasurementOutcome};

use crate::core::QStateResult;
use parking_lot::{Mutex, RwLock};
use rand::distr::{Distribution, StandardUniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::LazyLock;
use tracing::info;

static ACTIVE_CONFIG: LazyLock<RwLock<SimulatorConfig>> =
    LazyLock::new(|| RwLock::new(SimulatorConfig::default()));

static RNG: LazyLock<Mutex<StdRng>> = LazyLock::new(|| Mutex::new(seeded(config().seed)));

fn seeded(seed: Option<u64>) -> StdRng {
    StdRng::seed_from_u64(seed.unwrap_or_else(rand::random))
}

/// Installs `settings` for every subsequent operation and reseeds the
/// measurement generator.
///
/// # Errors
/// [`QStateError::InvalidConfig`](crate::QStateError::InvalidConfig) if the
/// settings fail [`SimulatorConfig::validate`]; the active settings are then
/// left unchanged.
pub fn configure(settings: SimulatorConfig) -> QStateResult<()> {
    settings.validate()?;
    info!(
        seed = ?settings.seed,
        auto_split = settings.auto_split,
        max_group_qubits = settings.max_group_qubits,
        "configuring simulator"
    );
    *RNG.lock() = seeded(settings.seed);
    *ACTIVE_CONFIG.write() = settings;
    Ok(())
}

/// The settings currently in effect.
pub fn config() -> SimulatorConfig {
    ACTIVE_CONFIG.read().clone()
}

/// A uniform draw from `[0, 1)` off the shared generator.
pub(crate) fn random_unit() -> f64 {
    StandardUniform.sample(&mut *RNG.lock())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_unit_range() {
        for _ in 0..1000 {
            let u = random_unit();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn test_configure_rejects_invalid_settings() {
        let before = config();
        let bad = SimulatorConfig::default().with_max_group_qubits(0);
        assert!(configure(bad).is_err());
        assert_eq!(config(), before);
    }
}

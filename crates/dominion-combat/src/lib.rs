//! # Dominion Combat
//!
//! Pure combat rules for the Dominion strategy game: who may attack whom, how a
//! battle between two armies plays out, and what it costs each side.
//!
//! Everything in this crate is side-effect free. Randomness is always passed in
//! by the caller, so a battle resolved twice from the same seeded rng produces
//! the same [`CombatResult`]. Persistence and concurrency live in
//! `dominion-core`.
//!
//! - [`validate`]: precondition checks, returning typed [`Denial`] reasons
//! - [`multiplier_for`]: reachability to attacker power factor
//! - [`resolve`]: the phase engine (space, orbital, ground; or a single raid)
//! - [`estimate_odds`]: Monte Carlo preview of a battle
//! - [`fingerprint`]: replay hash of a result
//!
//! ## Quick Start
//!
//! ```
//! use dominion_combat::{
//!     multiplier_for, resolve, AttackType, BattleSetup, CombatConfig, Forces,
//!     ReachabilityClass, UnitKind,
//! };
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let config = CombatConfig::default();
//! let setup = BattleSetup {
//!     attacker: Forces::new()
//!         .with(UnitKind::Soldiers, 500)
//!         .with(UnitKind::Carriers, 5)
//!         .with(UnitKind::Fighters, 100),
//!     defender: Forces::new().with(UnitKind::Soldiers, 150),
//!     attacker_effectiveness: 75.0,
//!     defender_effectiveness: 60.0,
//!     attack_type: AttackType::Invasion,
//!     attacker_multiplier: multiplier_for(ReachabilityClass::Extended, &config),
//!     defender_sectors: 12,
//! };
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let result = resolve(&setup, &config, &mut rng);
//! assert_eq!(result.phases.len(), 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod attack;
pub mod config;
pub mod engine;
pub mod forces;
pub mod hash;
pub mod multiplier;
pub mod odds;
pub mod result;
pub mod units;
pub mod validate;

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-exports for convenience
pub use attack::{AttackType, ReachabilityClass, TreatyFlags};
pub use config::{CombatConfig, ConfigError};
pub use engine::{resolve, BattleSetup};
pub use forces::Forces;
pub use hash::fingerprint;
pub use multiplier::multiplier_for;
pub use odds::{estimate_odds, OddsEstimate};
pub use result::{BattleOutcome, CombatResult, PhaseKind, PhaseResult, PhaseWinner};
pub use units::{UnitKind, UnitStats};
pub use validate::{
    check_declaration, validate, AttackContext, Denial, EmpireView, InputError, Validation,
};

/// Unique identifier of an empire.
///
/// Empire ids are ordered by their numeric value, which the store relies on
/// for deterministic iteration.
///
/// # Example
///
/// ```
/// use dominion_combat::EmpireId;
///
/// let a = EmpireId::new(1);
/// let b = EmpireId::from(2);
/// assert!(a < b);
/// assert_eq!(b.as_u64(), 2);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EmpireId(u64);

impl EmpireId {
    /// Creates an id from its raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EmpireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EmpireId({})", self.0)
    }
}

impl fmt::Display for EmpireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EmpireId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<EmpireId> for u64 {
    fn from(id: EmpireId) -> Self {
        id.0
    }
}

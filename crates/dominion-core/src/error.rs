//! Error types for the store and the attack service.
//!
//! Denials are not errors: a refused attack is a normal
//! [`AttackOutcome::Denied`](crate::service::AttackOutcome::Denied) value.

use thiserror::Error;

use dominion_combat::{EmpireId, InputError};

use crate::empire::{GameId, SectorId};

/// Failures of the transactional store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A row read by the transaction was changed by another commit.
    #[error("empire {empire} was modified concurrently (read version {read}, now {current})")]
    Conflict {
        /// The contested empire.
        empire: EmpireId,
        /// Version the transaction read.
        read: u64,
        /// Version found at commit.
        current: u64,
    },

    /// Every commit attempt conflicted.
    #[error("transaction still conflicting after {attempts} attempts")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
    },

    /// No empire with this id exists.
    #[error("empire {0} not found")]
    EmpireNotFound(EmpireId),

    /// No sector with this id exists.
    #[error("sector {0} not found")]
    SectorNotFound(SectorId),

    /// The attacker no longer holds the forces it committed. Another
    /// attack by the same empire was committed first.
    #[error("empire {0} no longer holds the committed forces")]
    ForcesUnavailable(EmpireId),
}

impl StoreError {
    /// Whether retrying the whole operation later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::RetriesExhausted { .. })
    }
}

/// Failures of [`CombatService::submit_attack`](crate::service::CombatService::submit_attack).
#[derive(Debug, Error)]
pub enum AttackError {
    /// The declaration itself is malformed.
    #[error(transparent)]
    Input(#[from] InputError),

    /// The request named no game.
    #[error("game id must not be empty")]
    EmptyGameId,

    /// The request targets a different game than this service runs.
    #[error("unknown game {0}")]
    UnknownGame(GameId),

    /// The attacker or defender does not exist.
    #[error("unknown empire {0}")]
    UnknownEmpire(EmpireId),

    /// The named target sector is not held by the defender.
    #[error("sector {sector} is not owned by defender {defender}")]
    TargetSectorNotOwned {
        /// The requested sector.
        sector: SectorId,
        /// The defender.
        defender: EmpireId,
    },

    /// The outcome could not be committed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AttackError {
    /// Whether the caller may resubmit the same request later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(err) => err.is_retryable(),
            _ => false,
        }
    }
}

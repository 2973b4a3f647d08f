//! # Dominion Core
//!
//! Persistent side of combat for the Dominion strategy game.
//!
//! This crate owns the game rows that combat reads and writes and commits
//! battle outcomes atomically against concurrently changing empires. The
//! rules themselves live in [`dominion_combat`].
//!
//! ## Architecture
//!
//! - **State**: empires, sectors and the audit trail ([`state::GameState`])
//! - **Store**: optimistic-concurrency transactions over the state
//!   ([`store::Store`])
//! - **Applier**: commits one battle outcome ([`applier::OutcomeApplier`])
//! - **Service**: validate, resolve, apply, report
//!   ([`service::CombatService`])
//! - **Feed**: recent battles and narration ([`feed::BattleFeed`])
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dominion_core::service::{CombatService, ServiceConfig};
//!
//! let service = CombatService::new(store, CombatConfig::default(), ServiceConfig::default())?;
//! match service.submit_attack(&request)? {
//!     AttackOutcome::Denied(reason) => show(reason.message()),
//!     AttackOutcome::Resolved(report) => publish(&report.narration),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export the rules crate
pub use dominion_combat;

pub mod applier;
pub mod empire;
pub mod error;
pub mod feed;
pub mod records;
pub mod service;
pub mod state;
pub mod store;

#[cfg(test)]
mod tests;

pub use applier::{AppliedAttack, OutcomeApplier};
pub use empire::{Empire, GameId, Sector, SectorId};
pub use error::{AttackError, StoreError};
pub use feed::{BattleFeed, BattleSummary};
pub use records::{AttackId, AttackRecord, PhaseLogRow};
pub use service::{
    AttackOutcome, AttackRequest, BattleReport, CombatService, Preview, ServiceConfig,
};
pub use state::GameState;
pub use store::{Store, Transaction};

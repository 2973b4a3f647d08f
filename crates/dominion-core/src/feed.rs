//! Battle feed for the news ticker and battle reports.
//!
//! The [`BattleFeed`] keeps a bounded list of recently committed battles and
//! turns combat results into narration lines. It never touches game state.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use dominion_combat::{AttackType, BattleOutcome, CombatResult, EmpireId};

use crate::empire::GameId;
use crate::records::AttackId;

/// Default number of battles retained.
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// One entry of the battle feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSummary {
    /// Committed attack id.
    pub attack: AttackId,
    /// Game the battle belongs to.
    pub game: GameId,
    /// Turn of the battle.
    pub turn: u32,
    /// Attacking empire.
    pub attacker: EmpireId,
    /// Defending empire.
    pub defender: EmpireId,
    /// Invasion or raid.
    pub attack_type: AttackType,
    /// Overall outcome.
    pub outcome: BattleOutcome,
    /// Sectors transferred.
    pub sectors_captured: u64,
    /// One-line headline.
    pub headline: String,
}

impl BattleSummary {
    /// Whether `empire` fought in this battle.
    #[must_use]
    pub fn involves(&self, empire: EmpireId) -> bool {
        self.attacker == empire || self.defender == empire
    }
}

/// Bounded, thread-safe list of recent battles, newest last.
#[derive(Debug)]
pub struct BattleFeed {
    capacity: usize,
    entries: Mutex<VecDeque<BattleSummary>>,
}

impl Default for BattleFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl BattleFeed {
    /// Creates a feed retaining at most `capacity` battles.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Adds a battle, evicting the oldest if full.
    pub fn record(&self, summary: BattleSummary) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(summary);
    }

    /// Up to `limit` most recent battles, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<BattleSummary> {
        self.filtered(limit, |_| true)
    }

    /// Up to `limit` most recent battles of one game, newest first.
    #[must_use]
    pub fn recent_in_game(&self, game: &GameId, limit: usize) -> Vec<BattleSummary> {
        self.filtered(limit, |s| &s.game == game)
    }

    /// Up to `limit` most recent battles involving `empire`, newest first.
    #[must_use]
    pub fn recent_for_empire(&self, empire: EmpireId, limit: usize) -> Vec<BattleSummary> {
        self.filtered(limit, |s| s.involves(empire))
    }

    /// Number of battles held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no battle has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn filtered(&self, limit: usize, keep: impl Fn(&BattleSummary) -> bool) -> Vec<BattleSummary> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .filter(|s| keep(s))
            .take(limit)
            .cloned()
            .collect()
    }
}

/// One-line headline for a battle.
#[must_use]
pub fn headline(attacker: &str, defender: &str, result: &CombatResult) -> String {
    let action = match result.attack_type {
        AttackType::Invasion => "invaded",
        AttackType::Raid => "raided",
    };
    match result.outcome {
        BattleOutcome::AttackerVictory if result.territory_captured() => format!(
            "{attacker} {action} {defender} and seized {} sector{}",
            result.sectors_captured,
            if result.sectors_captured == 1 { "" } else { "s" }
        ),
        BattleOutcome::AttackerVictory => format!("{attacker} {action} {defender} successfully"),
        BattleOutcome::DefenderVictory => format!("{defender} repelled {attacker}"),
        BattleOutcome::Draw => format!("{attacker} and {defender} fought to a standstill"),
    }
}

/// Headline followed by one line per fought phase and a casualty summary.
#[must_use]
pub fn narrate(attacker: &str, defender: &str, result: &CombatResult) -> Vec<String> {
    let mut lines = vec![headline(attacker, defender, result)];
    lines.extend(
        result
            .storable_phases()
            .map(|phase| format!("Phase {}: {}", phase.number, phase.description)),
    );
    lines.push(format!(
        "{attacker} lost {}; {defender} lost {}.",
        result.attacker_casualties, result.defender_casualties
    ));
    lines
}

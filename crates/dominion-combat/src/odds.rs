//! Battle odds estimation.
//!
//! Runs the phase engine many times on the same setup and summarizes how the
//! battle tends to go. Bot planners and the attack preview screen use it;
//! the result of a real attack never depends on it.
//!
//! Each iteration gets its own `ChaCha8Rng` seeded with `seed + i`, so the
//! estimate is reproducible regardless of how rayon schedules the work.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::CombatConfig;
use crate::engine::{resolve, BattleSetup};
use crate::result::BattleOutcome;

/// Summary of repeated battle resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OddsEstimate {
    /// Number of battles simulated.
    pub iterations: u32,
    /// Share of battles ending in attacker victory.
    pub win_rate: f64,
    /// Share of battles ending in a draw.
    pub draw_rate: f64,
    /// Share of battles ending in defender victory.
    pub loss_rate: f64,
    /// Mean total units lost by the attacker.
    pub mean_attacker_casualties: f64,
    /// Mean total units lost by the defender.
    pub mean_defender_casualties: f64,
    /// Mean sectors captured.
    pub mean_sectors_captured: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    wins: u64,
    draws: u64,
    losses: u64,
    attacker_casualties: u64,
    defender_casualties: u64,
    sectors: u64,
}

impl Tally {
    fn merge(self, other: Self) -> Self {
        Self {
            wins: self.wins + other.wins,
            draws: self.draws + other.draws,
            losses: self.losses + other.losses,
            attacker_casualties: self
                .attacker_casualties
                .saturating_add(other.attacker_casualties),
            defender_casualties: self
                .defender_casualties
                .saturating_add(other.defender_casualties),
            sectors: self.sectors.saturating_add(other.sectors),
        }
    }
}

/// Estimates the outcome distribution of a battle.
///
/// Returns an all-zero estimate when `iterations` is zero.
///
/// # Example
///
/// ```
/// use dominion_combat::{estimate_odds, AttackType, BattleSetup, CombatConfig, Forces, UnitKind};
///
/// let setup = BattleSetup {
///     attacker: Forces::new().with(UnitKind::Soldiers, 900),
///     defender: Forces::new().with(UnitKind::Soldiers, 100),
///     attacker_effectiveness: 100.0,
///     defender_effectiveness: 100.0,
///     attack_type: AttackType::Raid,
///     attacker_multiplier: 1.0,
///     defender_sectors: 5,
/// };
///
/// let odds = estimate_odds(&setup, &CombatConfig::default(), 200, 1);
/// assert!(odds.win_rate > 0.9);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn estimate_odds(
    setup: &BattleSetup,
    config: &CombatConfig,
    iterations: u32,
    seed: u64,
) -> OddsEstimate {
    if iterations == 0 {
        return OddsEstimate::default();
    }

    let tally = (0..iterations)
        .into_par_iter()
        .map(|i| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(u64::from(i)));
            let result = resolve(setup, config, &mut rng);
            let mut tally = Tally {
                attacker_casualties: result.attacker_casualties.total(),
                defender_casualties: result.defender_casualties.total(),
                sectors: result.sectors_captured,
                ..Tally::default()
            };
            match result.outcome {
                BattleOutcome::AttackerVictory => tally.wins = 1,
                BattleOutcome::Draw => tally.draws = 1,
                BattleOutcome::DefenderVictory => tally.losses = 1,
            }
            tally
        })
        .reduce(Tally::default, Tally::merge);

    let n = f64::from(iterations);
    OddsEstimate {
        iterations,
        win_rate: tally.wins as f64 / n,
        draw_rate: tally.draws as f64 / n,
        loss_rate: tally.losses as f64 / n,
        mean_attacker_casualties: tally.attacker_casualties as f64 / n,
        mean_defender_casualties: tally.defender_casualties as f64 / n,
        mean_sectors_captured: tally.sectors as f64 / n,
    }
}

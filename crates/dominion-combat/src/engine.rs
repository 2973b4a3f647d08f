//! Phase Resolution Engine.
//!
//! [`resolve`] simulates one battle between the attacker's committed forces
//! and the defender's full standing army. It is a total, side-effect-free
//! function: given the same [`BattleSetup`], [`CombatConfig`] and random
//! stream it always produces the same [`CombatResult`].
//!
//! # Invasion
//!
//! Three phases run in order: space, orbital, ground. Losses carry over from
//! phase to phase. Carriers fly in the space phase as targets; soldiers that
//! no longer fit in the surviving carriers are lost with them. Each space or
//! orbital phase won (lost) shifts ground power up (down) by
//! `momentum_step`. Once the attacker has no soldiers left, the remaining
//! phases are skipped and the attacker is treated as defeated there. The
//! ground phase decides the outcome.
//!
//! # Raid
//!
//! A single synthetic phase of soldiers against soldiers, with reduced
//! casualties and no territory capture.
//!
//! # Randomness
//!
//! The random source settles near-ties and spreads casualty rates within
//! `casualty_variance` of their expectation. Nothing else is random.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::attack::AttackType;
use crate::config::CombatConfig;
use crate::forces::Forces;
use crate::result::{BattleOutcome, CombatResult, PhaseKind, PhaseResult, PhaseWinner};
use crate::units::UnitKind;

/// Inputs to one battle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BattleSetup {
    /// Forces the attacker committed (already validated).
    pub attacker: Forces,
    /// The defender's full standing army.
    pub defender: Forces,
    /// Attacker army effectiveness in [0, 100].
    pub attacker_effectiveness: f64,
    /// Defender army effectiveness in [0, 100].
    pub defender_effectiveness: f64,
    /// Invasion or raid.
    pub attack_type: AttackType,
    /// Reachability multiplier applied to attacker power.
    pub attacker_multiplier: f64,
    /// Sectors the defender owns before the battle.
    pub defender_sectors: u64,
}

/// Resolves a battle.
///
/// # Example
///
/// ```
/// use dominion_combat::{resolve, AttackType, BattleSetup, CombatConfig, Forces, UnitKind};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let setup = BattleSetup {
///     attacker: Forces::new().with(UnitKind::Soldiers, 50),
///     defender: Forces::new().with(UnitKind::Soldiers, 20),
///     attacker_effectiveness: 80.0,
///     defender_effectiveness: 80.0,
///     attack_type: AttackType::Raid,
///     attacker_multiplier: 1.0,
///     defender_sectors: 10,
/// };
///
/// let mut rng = ChaCha8Rng::seed_from_u64(7);
/// let result = resolve(&setup, &CombatConfig::default(), &mut rng);
/// assert_eq!(result.phases.len(), 1);
/// assert_eq!(result.sectors_captured, 0);
/// ```
pub fn resolve<R: Rng + ?Sized>(
    setup: &BattleSetup,
    config: &CombatConfig,
    rng: &mut R,
) -> CombatResult {
    let mut battle = Battle::new(setup, config);
    match setup.attack_type {
        AttackType::Invasion => battle.run_invasion(rng),
        AttackType::Raid => battle.run_raid(rng),
    }
    let result = battle.finish();
    debug!(
        attack_type = %result.attack_type,
        outcome = %result.outcome,
        phases = result.phases.len(),
        sectors_captured = result.sectors_captured,
        "battle resolved"
    );
    result
}

/// Mutable state of a battle in progress.
struct Battle<'a> {
    setup: &'a BattleSetup,
    config: &'a CombatConfig,
    /// Attacker's committed forces still in the fight.
    attacker: Forces,
    /// Defender's forces still in the fight.
    defender: Forces,
    phases: Vec<PhaseResult>,
    attacker_casualties: Forces,
    defender_casualties: Forces,
    /// Phases won minus phases lost by the attacker before the ground phase.
    momentum: i32,
}

impl<'a> Battle<'a> {
    fn new(setup: &'a BattleSetup, config: &'a CombatConfig) -> Self {
        Self {
            setup,
            config,
            attacker: setup.attacker,
            defender: setup.defender,
            phases: Vec::with_capacity(PhaseKind::INVASION.len()),
            attacker_casualties: Forces::new(),
            defender_casualties: Forces::new(),
            momentum: 0,
        }
    }

    fn run_invasion<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for kind in PhaseKind::INVASION {
            if self.attacker.soldiers == 0 && !self.phases.is_empty() {
                self.skip(
                    kind,
                    PhaseWinner::Defender,
                    "The attacker has no soldiers left to land; the phase was forfeited."
                        .to_string(),
                );
                continue;
            }
            if kind == PhaseKind::Ground && self.attacker.soldiers == 0 {
                self.skip(
                    kind,
                    PhaseWinner::Defender,
                    "The attacker brought no soldiers; the ground assault never began."
                        .to_string(),
                );
                continue;
            }
            match self.fight(kind, rng) {
                PhaseWinner::Attacker => self.momentum += 1,
                PhaseWinner::Defender => self.momentum -= 1,
                PhaseWinner::Draw => {}
            }
        }
    }

    fn run_raid<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.attacker.soldiers == 0 {
            self.skip(
                PhaseKind::Raid,
                PhaseWinner::Defender,
                "The raiding party had no soldiers.".to_string(),
            );
            return;
        }
        self.fight(PhaseKind::Raid, rng);
    }

    /// Runs one contested phase and records it. Returns the phase winner.
    ///
    /// Uncontested phases are recorded as skipped and count as a draw.
    fn fight<R: Rng + ?Sized>(&mut self, kind: PhaseKind, rng: &mut R) -> PhaseWinner {
        let attacker_start = self.attacker;
        let defender_start = self.defender;
        let attacker_power = self.attacker_power(kind);
        let defender_power = self.defender_power(kind);

        if attacker_power <= 0.0 && defender_power <= 0.0 {
            self.skip(
                kind,
                PhaseWinner::Draw,
                format!("{}: neither side fielded any forces.", title(kind)),
            );
            return PhaseWinner::Draw;
        }

        let winner = decide_winner(attacker_power, defender_power, self.config, rng);
        let ratio = power_ratio(attacker_power, defender_power, self.config);
        let scale = if kind == PhaseKind::Raid {
            self.config.raid_casualty_factor
        } else {
            1.0
        };
        let (mut attacker_rate, mut defender_rate) =
            casualty_rates(winner, ratio, scale, self.config, rng);
        // Nobody takes fire from a side with no power.
        if defender_power <= 0.0 {
            attacker_rate = 0.0;
        }
        if attacker_power <= 0.0 {
            defender_rate = 0.0;
        }

        let mut attacker_losses = losses(&self.attacker, kind.attacker_units(), attacker_rate)
            + losses(&self.attacker, kind.attacker_exposed(), attacker_rate);
        let defender_losses = losses(&self.defender, kind.defender_units(), defender_rate);
        self.attacker = self.attacker.saturating_sub(&attacker_losses);
        self.defender = self.defender.saturating_sub(&defender_losses);

        let stranded = if kind == PhaseKind::Space {
            self.strand_troops()
        } else {
            0
        };
        attacker_losses.soldiers += stranded;

        self.attacker_casualties += attacker_losses;
        self.defender_casualties += defender_losses;

        trace!(
            phase = %kind,
            attacker_power,
            defender_power,
            ?winner,
            attacker_rate,
            defender_rate,
            stranded,
            "phase resolved"
        );

        let description = narrate(
            kind,
            attacker_power,
            defender_power,
            winner,
            &attacker_losses,
            &defender_losses,
            stranded,
        );
        self.phases.push(PhaseResult {
            number: self.next_number(),
            kind,
            attacker_start,
            defender_start,
            attacker_power,
            defender_power,
            winner,
            attacker_casualties: attacker_losses,
            defender_casualties: defender_losses,
            description,
            skipped: false,
        });
        winner
    }

    fn skip(&mut self, kind: PhaseKind, winner: PhaseWinner, description: String) {
        trace!(phase = %kind, ?winner, "phase skipped");
        self.phases.push(PhaseResult {
            number: self.next_number(),
            kind,
            attacker_start: self.attacker,
            defender_start: self.defender,
            attacker_power: 0.0,
            defender_power: 0.0,
            winner,
            attacker_casualties: Forces::new(),
            defender_casualties: Forces::new(),
            description,
            skipped: true,
        });
    }

    #[allow(clippy::cast_possible_truncation)]
    fn next_number(&self) -> u32 {
        // A battle has at most three phases.
        self.phases.len() as u32 + 1
    }

    /// Drops soldiers that no longer fit in the surviving carriers.
    fn strand_troops(&mut self) -> u64 {
        let capacity = self
            .attacker
            .carriers
            .saturating_mul(self.config.carrier_capacity);
        let stranded = self.attacker.soldiers.saturating_sub(capacity);
        self.attacker.soldiers -= stranded;
        stranded
    }

    fn attacker_power(&self, kind: PhaseKind) -> f64 {
        let base: f64 = kind
            .attacker_units()
            .iter()
            .map(|&unit| as_f64(self.attacker.get(unit)) * unit.attack())
            .sum();
        let momentum = if kind == PhaseKind::Ground {
            self.momentum_factor()
        } else {
            1.0
        };
        base * non_negative(self.setup.attacker_multiplier)
            * self
                .config
                .effectiveness_factor(self.setup.attacker_effectiveness)
            * momentum
    }

    fn defender_power(&self, kind: PhaseKind) -> f64 {
        let base: f64 = kind
            .defender_units()
            .iter()
            .map(|&unit| {
                let bonus = if kind == PhaseKind::Orbital && unit == UnitKind::Stations {
                    self.config.station_fortification
                } else {
                    1.0
                };
                as_f64(self.defender.get(unit)) * unit.defense() * bonus
            })
            .sum();
        base * self
            .config
            .effectiveness_factor(self.setup.defender_effectiveness)
    }

    fn momentum_factor(&self) -> f64 {
        (1.0 + self.config.momentum_step * f64::from(self.momentum)).max(self.config.momentum_floor)
    }

    fn outcome(&self) -> BattleOutcome {
        let Some(decisive) = self.phases.last() else {
            return BattleOutcome::Draw;
        };
        match self.setup.attack_type {
            AttackType::Invasion => match decisive.winner {
                PhaseWinner::Attacker => BattleOutcome::AttackerVictory,
                PhaseWinner::Defender => BattleOutcome::DefenderVictory,
                PhaseWinner::Draw => BattleOutcome::Draw,
            },
            AttackType::Raid => {
                let inflicted = decisive.defender_casualties.soldiers > 0
                    || decisive.defender_start.soldiers == 0;
                if decisive.winner == PhaseWinner::Defender || self.attacker.soldiers == 0 {
                    BattleOutcome::DefenderVictory
                } else if decisive.winner == PhaseWinner::Attacker && inflicted {
                    BattleOutcome::AttackerVictory
                } else {
                    BattleOutcome::Draw
                }
            }
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn sectors_captured(&self, outcome: BattleOutcome) -> u64 {
        let sectors = self.setup.defender_sectors;
        if !self.setup.attack_type.can_capture()
            || outcome != BattleOutcome::AttackerVictory
            || sectors <= 1
        {
            return 0;
        }
        let Some(ground) = self.phases.last() else {
            return 0;
        };
        let ratio = power_ratio(ground.attacker_power, ground.defender_power, self.config);
        let rate = self.config.capture_base_rate
            + self.config.capture_rate_per_ratio * (ratio - 1.0).min(self.config.capture_ratio_cap);
        let share = (sectors as f64 * rate).floor() as u64;
        share.max(1).min(sectors - 1)
    }

    fn effectiveness_deltas(&self, outcome: BattleOutcome) -> (f64, f64) {
        let c = self.config;
        match (outcome, self.setup.attack_type) {
            (BattleOutcome::AttackerVictory, AttackType::Invasion) => {
                (c.invasion_victory_delta, -c.invasion_victory_delta)
            }
            (BattleOutcome::AttackerVictory, AttackType::Raid) => {
                (c.raid_victory_delta, -c.raid_victory_delta)
            }
            (BattleOutcome::DefenderVictory, _) => {
                (-c.repelled_attacker_delta, c.repelled_defender_delta)
            }
            (BattleOutcome::Draw, _) => (-c.draw_delta, -c.draw_delta),
        }
    }

    fn finish(self) -> CombatResult {
        let outcome = self.outcome();
        let sectors_captured = self.sectors_captured(outcome);
        let (attacker_effectiveness_delta, defender_effectiveness_delta) =
            self.effectiveness_deltas(outcome);
        CombatResult {
            attack_type: self.setup.attack_type,
            phases: self.phases,
            attacker_casualties: self.attacker_casualties,
            defender_casualties: self.defender_casualties,
            outcome,
            sectors_captured,
            attacker_effectiveness_delta,
            defender_effectiveness_delta,
        }
    }
}

/// Picks the phase winner. Strictly greater power wins; exact ties draw;
/// near-ties are settled by the random source.
#[allow(clippy::float_cmp)]
fn decide_winner<R: Rng + ?Sized>(
    attacker: f64,
    defender: f64,
    config: &CombatConfig,
    rng: &mut R,
) -> PhaseWinner {
    if attacker == defender {
        return PhaseWinner::Draw;
    }
    let gap = (attacker - defender).abs() / attacker.max(defender);
    if gap < config.near_tie_band {
        if rng.gen::<f64>() < config.near_tie_draw_chance {
            return PhaseWinner::Draw;
        }
        return if rng.gen::<f64>() * (attacker + defender) < attacker {
            PhaseWinner::Attacker
        } else {
            PhaseWinner::Defender
        };
    }
    if attacker > defender {
        PhaseWinner::Attacker
    } else {
        PhaseWinner::Defender
    }
}

/// Stronger-to-weaker power ratio, in `[1, max_power_ratio]`.
fn power_ratio(attacker: f64, defender: f64, config: &CombatConfig) -> f64 {
    let high = attacker.max(defender);
    let low = attacker.min(defender);
    if low <= 0.0 {
        return config.max_power_ratio;
    }
    (high / low).clamp(1.0, config.max_power_ratio)
}

/// Returns `(attacker_rate, defender_rate)` for a phase.
///
/// The loser's rate grows with the square root of the power ratio up to the
/// cap; the winner's rate shrinks with the ratio and never exceeds the
/// loser's.
fn casualty_rates<R: Rng + ?Sized>(
    winner: PhaseWinner,
    ratio: f64,
    scale: f64,
    config: &CombatConfig,
    rng: &mut R,
) -> (f64, f64) {
    let (attacker_rate, defender_rate) = match winner {
        PhaseWinner::Draw => (
            config.draw_attrition_rate * variance(config, rng),
            config.draw_attrition_rate * variance(config, rng),
        ),
        PhaseWinner::Attacker | PhaseWinner::Defender => {
            let loser = (config.loser_base_rate * ratio.sqrt() * variance(config, rng))
                .min(config.loser_rate_cap);
            let victor = (config.winner_base_rate / ratio * variance(config, rng)).min(loser);
            if winner == PhaseWinner::Attacker {
                (victor, loser)
            } else {
                (loser, victor)
            }
        }
    };
    (
        (attacker_rate * scale).clamp(0.0, 1.0),
        (defender_rate * scale).clamp(0.0, 1.0),
    )
}

/// Uniform factor in `[1 - casualty_variance, 1 + casualty_variance]`.
fn variance<R: Rng + ?Sized>(config: &CombatConfig, rng: &mut R) -> f64 {
    let spread = config.casualty_variance;
    if spread <= 0.0 {
        return 1.0;
    }
    1.0 + rng.gen_range(-spread..=spread)
}

/// Applies a casualty rate to the given kinds, never exceeding their counts.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn losses(forces: &Forces, kinds: &[UnitKind], rate: f64) -> Forces {
    kinds.iter().fold(Forces::new(), |acc, &kind| {
        let count = forces.get(kind);
        let lost = (as_f64(count) * rate).round() as u64;
        acc.with(kind, lost.min(count))
    })
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(count: u64) -> f64 {
    count as f64
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn title(kind: PhaseKind) -> &'static str {
    match kind {
        PhaseKind::Space => "Space battle",
        PhaseKind::Orbital => "Orbital assault",
        PhaseKind::Ground => "Ground assault",
        PhaseKind::Raid => "Raid",
    }
}

fn narrate(
    kind: PhaseKind,
    attacker_power: f64,
    defender_power: f64,
    winner: PhaseWinner,
    attacker_losses: &Forces,
    defender_losses: &Forces,
    stranded: u64,
) -> String {
    let verdict = match winner {
        PhaseWinner::Attacker => "the attacker prevailed",
        PhaseWinner::Defender => "the defender held",
        PhaseWinner::Draw => "neither side gained the upper hand",
    };
    let mut text = format!(
        "{}: attacker power {attacker_power:.1} against defender power {defender_power:.1}; \
         {verdict}. Attacker lost {attacker_losses}; defender lost {defender_losses}.",
        title(kind)
    );
    if stranded > 0 {
        text.push_str(&format!(
            " {stranded} soldiers went down with their carriers."
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn setup(attacker: Forces, defender: Forces, attack_type: AttackType) -> BattleSetup {
        BattleSetup {
            attacker,
            defender,
            attacker_effectiveness: 100.0,
            defender_effectiveness: 100.0,
            attack_type,
            attacker_multiplier: 1.0,
            defender_sectors: 20,
        }
    }

    fn run(setup: &BattleSetup, seed: u64) -> CombatResult {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        resolve(setup, &CombatConfig::default(), &mut rng)
    }

    fn soldiers(n: u64) -> Forces {
        Forces::new().with(UnitKind::Soldiers, n)
    }

    fn armada() -> Forces {
        Forces::new()
            .with(UnitKind::Soldiers, 2_000)
            .with(UnitKind::Carriers, 20)
            .with(UnitKind::Fighters, 300)
            .with(UnitKind::LightCruisers, 80)
            .with(UnitKind::HeavyCruisers, 60)
    }

    fn garrison() -> Forces {
        Forces::new()
            .with(UnitKind::Soldiers, 400)
            .with(UnitKind::Fighters, 40)
            .with(UnitKind::Stations, 10)
            .with(UnitKind::HeavyCruisers, 5)
    }

    mod invasion_tests {
        use super::*;

        #[test]
        fn invasion_runs_three_phases_in_order() {
            let result = run(&setup(armada(), garrison(), AttackType::Invasion), 1);
            let kinds: Vec<_> = result.phases.iter().map(|p| p.kind).collect();
            assert_eq!(kinds, PhaseKind::INVASION.to_vec());
            let numbers: Vec<_> = result.phases.iter().map(|p| p.number).collect();
            assert_eq!(numbers, vec![1, 2, 3]);
        }

        #[test]
        fn overwhelming_invasion_captures_territory() {
            let result = run(&setup(armada(), garrison(), AttackType::Invasion), 2);
            assert_eq!(result.outcome, BattleOutcome::AttackerVictory);
            assert!(result.sectors_captured >= 1);
            assert!(result.sectors_captured < 20);
            assert!(result.attacker_effectiveness_delta > 0.0);
            assert!(result.defender_effectiveness_delta < 0.0);
        }

        #[test]
        fn hopeless_invasion_is_repelled() {
            let attacker = soldiers(100).with(UnitKind::Carriers, 1);
            let defender = soldiers(5_000);
            let result = run(&setup(attacker, defender, AttackType::Invasion), 3);
            assert_eq!(result.outcome, BattleOutcome::DefenderVictory);
            assert_eq!(result.sectors_captured, 0);
            assert!(result.attacker_effectiveness_delta < 0.0);
        }

        #[test]
        fn empty_space_and_orbit_are_skipped() {
            let attacker = soldiers(200).with(UnitKind::Carriers, 2);
            let result = run(&setup(attacker, soldiers(10), AttackType::Invasion), 4);
            assert!(result.phases[0].skipped);
            assert!(result.phases[1].skipped);
            assert!(!result.phases[2].skipped);
            assert_eq!(result.storable_phases().count(), 1);
        }

        #[test]
        fn fleet_only_invasion_forfeits_ground() {
            let attacker = Forces::new().with(UnitKind::Fighters, 500);
            let defender = garrison();
            let result = run(&setup(attacker, defender, AttackType::Invasion), 5);
            assert!(!result.phases[0].skipped);
            assert!(result.phases[1].skipped);
            assert!(result.phases[2].skipped);
            assert_eq!(result.phases[2].winner, PhaseWinner::Defender);
            assert_eq!(result.outcome, BattleOutcome::DefenderVictory);
            assert_eq!(result.sectors_captured, 0);
        }

        #[test]
        fn unescorted_carriers_strand_soldiers() {
            let attacker = soldiers(1_000).with(UnitKind::Carriers, 10);
            let defender = Forces::new().with(UnitKind::Fighters, 200);
            let result = run(&setup(attacker, defender, AttackType::Invasion), 6);
            let space = &result.phases[0];
            assert_eq!(space.winner, PhaseWinner::Defender);
            assert!(space.attacker_casualties.carriers > 0);
            let surviving_carriers = 10 - space.attacker_casualties.carriers;
            let surviving_soldiers = 1_000 - space.attacker_casualties.soldiers;
            assert!(surviving_soldiers <= surviving_carriers * 100);
            assert_eq!(space.defender_casualties, Forces::new());
        }

        #[test]
        fn unopposed_ground_assault_costs_nothing() {
            let attacker = soldiers(100).with(UnitKind::Carriers, 1);
            let result = run(&setup(attacker, Forces::new(), AttackType::Invasion), 7);
            let ground = &result.phases[2];
            assert_eq!(ground.winner, PhaseWinner::Attacker);
            assert_eq!(ground.attacker_casualties, Forces::new());
            assert_eq!(result.outcome, BattleOutcome::AttackerVictory);
        }

        #[test]
        fn defender_keeps_last_sector() {
            let mut s = setup(armada(), soldiers(1), AttackType::Invasion);
            s.defender_sectors = 2;
            let result = run(&s, 8);
            assert_eq!(result.outcome, BattleOutcome::AttackerVictory);
            assert_eq!(result.sectors_captured, 1);

            s.defender_sectors = 1;
            let result = run(&s, 8);
            assert_eq!(result.sectors_captured, 0);
        }

        #[test]
        fn stations_are_fortified_in_orbit() {
            let attacker = Forces::new().with(UnitKind::HeavyCruisers, 10);
            let defender = Forces::new().with(UnitKind::Stations, 10);
            let s = setup(attacker, defender, AttackType::Invasion);
            let config = CombatConfig::default();
            let battle = Battle::new(&s, &config);
            // 10 stations * 5 defense * 2 fortification
            assert!((battle.defender_power(PhaseKind::Orbital) - 100.0).abs() < 1e-9);
            assert!((battle.attacker_power(PhaseKind::Orbital) - 80.0).abs() < 1e-9);
        }
    }

    mod raid_tests {
        use super::*;

        #[test]
        fn raid_is_single_phase_without_capture() {
            for seed in 0..20 {
                let result = run(&setup(soldiers(50), soldiers(30), AttackType::Raid), seed);
                assert_eq!(result.phases.len(), 1);
                assert_eq!(result.phases[0].kind, PhaseKind::Raid);
                assert_eq!(result.sectors_captured, 0);
            }
        }

        #[test]
        fn strong_raid_is_attacker_victory() {
            let result = run(&setup(soldiers(1_000), soldiers(100), AttackType::Raid), 9);
            assert_eq!(result.outcome, BattleOutcome::AttackerVictory);
            assert!(result.defender_casualties.soldiers > 0);
        }

        #[test]
        fn raid_against_empty_garrison_succeeds() {
            let result = run(&setup(soldiers(10), Forces::new(), AttackType::Raid), 10);
            assert_eq!(result.outcome, BattleOutcome::AttackerVictory);
            assert_eq!(result.attacker_casualties, Forces::new());
        }

        #[test]
        fn raid_casualties_are_reduced() {
            let config = CombatConfig {
                casualty_variance: 0.0,
                ..CombatConfig::default()
            };
            let raid = setup(soldiers(1_600), soldiers(100), AttackType::Raid);
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            let result = resolve(&raid, &config, &mut rng);
            // ratio 16 -> loser rate 0.6, halved for raids
            assert_eq!(result.defender_casualties.soldiers, 30);
        }
    }

    mod modifier_tests {
        use super::*;

        #[test]
        fn extended_reach_weakens_attacker_only() {
            let config = CombatConfig::default();
            let mut s = setup(soldiers(100), soldiers(100), AttackType::Raid);
            let direct = Battle::new(&s, &config).attacker_power(PhaseKind::Raid);
            s.attacker_multiplier = config.extended_multiplier;
            let battle = Battle::new(&s, &config);
            assert!((battle.attacker_power(PhaseKind::Raid) - direct * 0.75).abs() < 1e-9);
            assert!((battle.defender_power(PhaseKind::Raid) - 100.0).abs() < 1e-9);
        }

        #[test]
        fn low_effectiveness_halves_power() {
            let config = CombatConfig::default();
            let mut s = setup(soldiers(100), soldiers(100), AttackType::Raid);
            s.attacker_effectiveness = 0.0;
            let battle = Battle::new(&s, &config);
            assert!((battle.attacker_power(PhaseKind::Raid) - 50.0).abs() < 1e-9);
        }

        #[test]
        fn momentum_scales_ground_power() {
            let config = CombatConfig::default();
            let s = setup(soldiers(100), soldiers(100), AttackType::Invasion);
            let mut battle = Battle::new(&s, &config);
            battle.momentum = 2;
            assert!((battle.attacker_power(PhaseKind::Ground) - 120.0).abs() < 1e-9);
            battle.momentum = -20;
            assert!((battle.attacker_power(PhaseKind::Ground) - 50.0).abs() < 1e-9);
        }
    }

    mod rule_tests {
        use super::*;

        #[test]
        fn exact_tie_is_draw() {
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            let winner = decide_winner(10.0, 10.0, &CombatConfig::default(), &mut rng);
            assert_eq!(winner, PhaseWinner::Draw);
        }

        #[test]
        fn clear_gap_is_deterministic() {
            let config = CombatConfig::default();
            for seed in 0..50 {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                assert_eq!(decide_winner(11.0, 10.0, &config, &mut rng), PhaseWinner::Attacker);
                assert_eq!(decide_winner(10.0, 11.0, &config, &mut rng), PhaseWinner::Defender);
            }
        }

        #[test]
        fn near_tie_can_go_either_way() {
            let config = CombatConfig::default();
            let mut seen = std::collections::HashSet::new();
            for seed in 0..200 {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                seen.insert(decide_winner(100.0, 99.0, &config, &mut rng));
            }
            assert!(seen.contains(&PhaseWinner::Attacker));
            assert!(seen.contains(&PhaseWinner::Defender));
            assert!(seen.contains(&PhaseWinner::Draw));
        }

        #[test]
        fn winner_never_loses_more_than_loser() {
            let config = CombatConfig::default();
            for seed in 0..100 {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let (a, d) = casualty_rates(PhaseWinner::Attacker, 1.0, 1.0, &config, &mut rng);
                assert!(a <= d);
            }
        }

        #[test]
        fn loser_rate_respects_cap() {
            let config = CombatConfig::default();
            let mut rng = ChaCha8Rng::seed_from_u64(3);
            let (a, _) = casualty_rates(PhaseWinner::Defender, 1_000.0, 1.0, &config, &mut rng);
            assert!(a <= config.loser_rate_cap);
        }

        #[test]
        fn same_seed_same_result() {
            let s = setup(armada(), garrison(), AttackType::Invasion);
            assert_eq!(run(&s, 99), run(&s, 99));
        }
    }

    fn arb_forces(max: u64) -> impl Strategy<Value = Forces> {
        proptest::array::uniform6(0..=max).prop_map(|counts| {
            UnitKind::ALL
                .iter()
                .zip(counts)
                .fold(Forces::new(), |acc, (&kind, n)| acc.with(kind, n))
        })
    }

    fn arb_attack_type() -> impl Strategy<Value = AttackType> {
        prop_oneof![Just(AttackType::Invasion), Just(AttackType::Raid)]
    }

    proptest! {
        #[test]
        fn prop_casualties_bounded_by_phase_start(
            attacker in arb_forces(3_000),
            defender in arb_forces(3_000),
            attack_type in arb_attack_type(),
            attacker_eff in 0.0f64..=100.0,
            defender_eff in 0.0f64..=100.0,
            sectors in 0u64..200,
            seed in any::<u64>(),
        ) {
            let s = BattleSetup {
                attacker,
                defender,
                attacker_effectiveness: attacker_eff,
                defender_effectiveness: defender_eff,
                attack_type,
                attacker_multiplier: 1.0,
                defender_sectors: sectors,
            };
            let result = run(&s, seed);

            for phase in &result.phases {
                prop_assert!(phase.attacker_casualties.fits_within(&phase.attacker_start));
                prop_assert!(phase.defender_casualties.fits_within(&phase.defender_start));
            }
            prop_assert!(result.attacker_casualties.fits_within(&attacker));
            prop_assert!(result.defender_casualties.fits_within(&defender));

            if attack_type == AttackType::Raid || result.outcome != BattleOutcome::AttackerVictory {
                prop_assert_eq!(result.sectors_captured, 0);
            }
            if sectors > 0 {
                prop_assert!(result.sectors_captured < sectors);
            }
        }

        #[test]
        fn prop_phase_sums_match_totals(
            attacker in arb_forces(2_000),
            defender in arb_forces(2_000),
            seed in any::<u64>(),
        ) {
            let s = setup(attacker, defender, AttackType::Invasion);
            let result = run(&s, seed);
            let attacker_sum = result
                .phases
                .iter()
                .fold(Forces::new(), |acc, p| acc + p.attacker_casualties);
            let defender_sum = result
                .phases
                .iter()
                .fold(Forces::new(), |acc, p| acc + p.defender_casualties);
            prop_assert_eq!(attacker_sum, result.attacker_casualties);
            prop_assert_eq!(defender_sum, result.defender_casualties);
        }
    }
}

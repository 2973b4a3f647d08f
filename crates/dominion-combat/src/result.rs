//! Combat result types produced by the phase engine.
//!
//! A [`CombatResult`] is built once per attack and never mutated afterwards.
//! It is handed to the outcome applier for persistence and to the news feed
//! for narration.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::attack::AttackType;
use crate::forces::Forces;
use crate::units::UnitKind;

/// Combat phase classification.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    /// Fighters and light cruisers contest space superiority.
    Space,
    /// Capital ships engage stations and heavy cruisers in orbit.
    Orbital,
    /// Soldiers fight for the surface.
    Ground,
    /// The single synthetic phase of a raid.
    Raid,
}

impl PhaseKind {
    /// Phase sequence of an invasion, in order.
    pub const INVASION: [PhaseKind; 3] = [Self::Space, Self::Orbital, Self::Ground];

    /// Attacker unit kinds whose power counts in this phase.
    #[must_use]
    pub const fn attacker_units(self) -> &'static [UnitKind] {
        match self {
            Self::Space => &[UnitKind::Fighters, UnitKind::LightCruisers],
            Self::Orbital => &[UnitKind::HeavyCruisers, UnitKind::LightCruisers],
            Self::Ground | Self::Raid => &[UnitKind::Soldiers],
        }
    }

    /// Attacker unit kinds that are exposed to fire without contributing power.
    #[must_use]
    pub const fn attacker_exposed(self) -> &'static [UnitKind] {
        match self {
            Self::Space => &[UnitKind::Carriers],
            Self::Orbital | Self::Ground | Self::Raid => &[],
        }
    }

    /// Defender unit kinds taking part in this phase.
    #[must_use]
    pub const fn defender_units(self) -> &'static [UnitKind] {
        match self {
            Self::Space => &[UnitKind::Fighters, UnitKind::LightCruisers],
            Self::Orbital => &[UnitKind::Stations, UnitKind::HeavyCruisers],
            Self::Ground | Self::Raid => &[UnitKind::Soldiers],
        }
    }

    /// Display label used in narration.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Space => "space",
            Self::Orbital => "orbital",
            Self::Ground => "ground",
            Self::Raid => "raid",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The side that won a phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseWinner {
    /// The attacking empire.
    Attacker,
    /// The defending empire.
    Defender,
    /// Neither side; both take attrition.
    Draw,
}

/// Outcome of one combat phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    /// 1-based ordinal within the battle.
    pub number: u32,
    /// Which phase this was.
    pub kind: PhaseKind,
    /// Attacker forces at the start of the phase.
    pub attacker_start: Forces,
    /// Defender forces at the start of the phase.
    pub defender_start: Forces,
    /// Attacker power after all multipliers.
    pub attacker_power: f64,
    /// Defender power after all multipliers.
    pub defender_power: f64,
    /// Declared winner of the phase.
    pub winner: PhaseWinner,
    /// Units the attacker lost in this phase.
    pub attacker_casualties: Forces,
    /// Units the defender lost in this phase.
    pub defender_casualties: Forces,
    /// Human-readable narration.
    pub description: String,
    /// True if no fighting took place.
    pub skipped: bool,
}

impl PhaseResult {
    /// Whether this phase gets a row in the persistent phase log.
    #[must_use]
    pub const fn is_storable(&self) -> bool {
        !self.skipped
    }
}

/// Overall battle outcome.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    /// The attacker achieved its objective.
    AttackerVictory,
    /// The defender repelled the attack.
    DefenderVictory,
    /// Neither side prevailed.
    Draw,
}

impl fmt::Display for BattleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttackerVictory => write!(f, "attacker victory"),
            Self::DefenderVictory => write!(f, "defender victory"),
            Self::Draw => write!(f, "draw"),
        }
    }
}

/// Aggregate result of one attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatResult {
    /// Invasion or raid.
    pub attack_type: AttackType,
    /// Phases in the order they were resolved, skipped ones included.
    pub phases: Vec<PhaseResult>,
    /// Attacker losses summed over all phases.
    pub attacker_casualties: Forces,
    /// Defender losses summed over all phases.
    pub defender_casualties: Forces,
    /// Overall classification.
    pub outcome: BattleOutcome,
    /// Sectors transferred from defender to attacker.
    pub sectors_captured: u64,
    /// Signed change to the attacker's army effectiveness.
    pub attacker_effectiveness_delta: f64,
    /// Signed change to the defender's army effectiveness.
    pub defender_effectiveness_delta: f64,
}

impl CombatResult {
    /// Phases that get a row in the persistent phase log.
    pub fn storable_phases(&self) -> impl Iterator<Item = &PhaseResult> + '_ {
        self.phases.iter().filter(|p| p.is_storable())
    }

    /// Whether any sector changed hands.
    #[must_use]
    pub const fn territory_captured(&self) -> bool {
        self.sectors_captured > 0
    }

    /// Attacker power summed over fought phases.
    #[must_use]
    pub fn total_attacker_power(&self) -> f64 {
        self.storable_phases().map(|p| p.attacker_power).sum()
    }

    /// Defender power summed over fought phases.
    #[must_use]
    pub fn total_defender_power(&self) -> f64 {
        self.storable_phases().map(|p| p.defender_power).sum()
    }
}

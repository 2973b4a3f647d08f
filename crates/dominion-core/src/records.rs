//! Append-only audit trail of resolved attacks.
//!
//! Every committed attack leaves one [`AttackRecord`] and one [`PhaseLogRow`]
//! per phase that was actually fought. Rows are never updated.

use serde::{Deserialize, Serialize};
use std::fmt;

use dominion_combat::{
    AttackType, BattleOutcome, EmpireId, Forces, PhaseKind, PhaseResult, PhaseWinner,
};

use crate::empire::{GameId, SectorId};

/// Identifier of a persisted attack.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttackId(u64);

impl AttackId {
    /// Creates an attack id from its raw value.
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

impl fmt::Debug for AttackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttackId({})", self.0)
    }
}

impl fmt::Display for AttackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Persisted summary of one attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackRecord {
    /// Attack identifier.
    pub id: AttackId,
    /// Game the attack belongs to.
    pub game: GameId,
    /// Turn the attack was launched.
    pub turn: u32,
    /// Attacking empire.
    pub attacker: EmpireId,
    /// Defending empire.
    pub defender: EmpireId,
    /// Invasion or raid.
    pub attack_type: AttackType,
    /// Forces the attacker committed.
    pub attacker_forces: Forces,
    /// Defender's standing army when the battle was resolved.
    pub defender_forces: Forces,
    /// Attacker power summed over fought phases.
    pub attacker_power: f64,
    /// Defender power summed over fought phases.
    pub defender_power: f64,
    /// Overall outcome.
    pub outcome: BattleOutcome,
    /// Whether any sector changed hands.
    pub territory_captured: bool,
    /// Sectors actually transferred.
    pub sectors_captured: u64,
    /// Ids of the transferred sectors, in transfer order.
    pub captured_sectors: Vec<SectorId>,
    /// Attacker losses.
    pub attacker_casualties: Forces,
    /// Defender losses.
    pub defender_casualties: Forces,
    /// Signed change to attacker effectiveness.
    pub attacker_effectiveness_delta: f64,
    /// Signed change to defender effectiveness.
    pub defender_effectiveness_delta: f64,
    /// Seed the battle was resolved with.
    pub seed: u64,
    /// Replay fingerprint of the combat result.
    pub fingerprint: u64,
}

impl AttackRecord {
    /// Serializes the record for export.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; records contain only plain data, so this
    /// does not happen in practice.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Persisted detail of one fought phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseLogRow {
    /// Attack this phase belongs to.
    pub attack: AttackId,
    /// 1-based phase number.
    pub number: u32,
    /// Phase kind.
    pub kind: PhaseKind,
    /// Attacker forces at phase start.
    pub attacker_start: Forces,
    /// Defender forces at phase start.
    pub defender_start: Forces,
    /// Attacker power.
    pub attacker_power: f64,
    /// Defender power.
    pub defender_power: f64,
    /// Phase winner.
    pub winner: PhaseWinner,
    /// Attacker losses in this phase.
    pub attacker_casualties: Forces,
    /// Defender losses in this phase.
    pub defender_casualties: Forces,
    /// Narration.
    pub description: String,
}

impl PhaseLogRow {
    /// Builds the log row for a phase of the given attack.
    #[must_use]
    pub fn from_phase(attack: AttackId, phase: &PhaseResult) -> Self {
        Self {
            attack,
            number: phase.number,
            kind: phase.kind,
            attacker_start: phase.attacker_start,
            defender_start: phase.defender_start,
            attacker_power: phase.attacker_power,
            defender_power: phase.defender_power,
            winner: phase.winner,
            attacker_casualties: phase.attacker_casualties,
            defender_casualties: phase.defender_casualties,
            description: phase.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dominion_combat::UnitKind;

    #[test]
    fn phase_row_copies_phase() {
        let phase = PhaseResult {
            number: 2,
            kind: PhaseKind::Orbital,
            attacker_start: Forces::new().with(UnitKind::HeavyCruisers, 5),
            defender_start: Forces::new().with(UnitKind::Stations, 3),
            attacker_power: 40.0,
            defender_power: 30.0,
            winner: PhaseWinner::Attacker,
            attacker_casualties: Forces::new(),
            defender_casualties: Forces::new().with(UnitKind::Stations, 1),
            description: "Orbital assault".to_string(),
            skipped: false,
        };
        let row = PhaseLogRow::from_phase(AttackId::new(9), &phase);
        assert_eq!(row.attack, AttackId::new(9));
        assert_eq!(row.number, 2);
        assert_eq!(row.defender_casualties.stations, 1);
        assert_eq!(row.description, "Orbital assault");
    }

    #[test]
    fn attack_id_display() {
        assert_eq!(AttackId::new(12).to_string(), "#12");
    }
}

//! Committed game state.
//!
//! [`GameState`] holds every row the combat engine touches: empires, sectors
//! and the audit trail. Empires and sectors live in `BTreeMap`s keyed by id,
//! so iteration order (and therefore random sector selection) is the same on
//! every run.
//!
//! # Example
//!
//! ```
//! use dominion_core::empire::{Empire, GameId};
//! use dominion_core::state::GameState;
//! use dominion_core::dominion_combat::EmpireId;
//!
//! let mut state = GameState::new(GameId::new("alpha"));
//! let vega = EmpireId::new(1);
//! state.add_empire(Empire::new(vega, "Vega"));
//! state.grant_sectors(vega, 3);
//!
//! assert_eq!(state.sectors_owned_by(vega).len(), 3);
//! assert_eq!(state.empire(vega).map(|e| e.sector_count), Some(3));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use dominion_combat::{EmpireId, Forces};

use crate::empire::{Empire, GameId, Sector, SectorId};
use crate::records::{AttackId, AttackRecord, PhaseLogRow};

/// All persistent rows of one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    game: GameId,
    empires: BTreeMap<EmpireId, Empire>,
    sectors: BTreeMap<SectorId, Sector>,
    attacks: Vec<AttackRecord>,
    phase_log: Vec<PhaseLogRow>,
    next_sector_id: u64,
}

impl GameState {
    /// Creates an empty game.
    #[must_use]
    pub fn new(game: GameId) -> Self {
        Self {
            game,
            empires: BTreeMap::new(),
            sectors: BTreeMap::new(),
            attacks: Vec::new(),
            phase_log: Vec::new(),
            next_sector_id: 1,
        }
    }

    /// The game these rows belong to.
    #[must_use]
    pub fn game(&self) -> &GameId {
        &self.game
    }

    /// Inserts or replaces an empire row.
    pub fn add_empire(&mut self, empire: Empire) {
        self.empires.insert(empire.id, empire);
    }

    /// Creates `count` new sectors owned by `owner` and returns their ids.
    ///
    /// The owner's `sector_count` is updated if the empire exists.
    pub fn grant_sectors(&mut self, owner: EmpireId, count: u64) -> Vec<SectorId> {
        let ids: Vec<SectorId> = (0..count)
            .map(|offset| SectorId::new(self.next_sector_id + offset))
            .collect();
        self.next_sector_id += count;
        for &id in &ids {
            self.sectors.insert(id, Sector { id, owner });
        }
        if let Some(empire) = self.empires.get_mut(&owner) {
            empire.sector_count += count;
        }
        ids
    }

    /// Looks up an empire.
    #[must_use]
    pub fn empire(&self, id: EmpireId) -> Option<&Empire> {
        self.empires.get(&id)
    }

    /// All empires in id order.
    pub fn empires(&self) -> impl Iterator<Item = &Empire> + '_ {
        self.empires.values()
    }

    /// Looks up a sector.
    #[must_use]
    pub fn sector(&self, id: SectorId) -> Option<&Sector> {
        self.sectors.get(&id)
    }

    /// Replaces a sector row.
    pub(crate) fn put_sector(&mut self, sector: Sector) {
        self.sectors.insert(sector.id, sector);
    }

    /// Ids of the sectors owned by `owner`, ascending.
    #[must_use]
    pub fn sectors_owned_by(&self, owner: EmpireId) -> Vec<SectorId> {
        self.sectors
            .values()
            .filter(|s| s.owner == owner)
            .map(|s| s.id)
            .collect()
    }

    /// Attack records in commit order.
    #[must_use]
    pub fn attacks(&self) -> &[AttackRecord] {
        &self.attacks
    }

    /// Looks up an attack record.
    #[must_use]
    pub fn attack(&self, id: AttackId) -> Option<&AttackRecord> {
        self.attacks.iter().find(|a| a.id == id)
    }

    /// Phase log rows in commit order.
    #[must_use]
    pub fn phase_log(&self) -> &[PhaseLogRow] {
        &self.phase_log
    }

    /// Phase log rows of one attack.
    pub fn phases_of(&self, attack: AttackId) -> impl Iterator<Item = &PhaseLogRow> + '_ {
        self.phase_log.iter().filter(move |row| row.attack == attack)
    }

    pub(crate) fn append_attack(&mut self, record: AttackRecord, phases: Vec<PhaseLogRow>) {
        self.attacks.push(record);
        self.phase_log.extend(phases);
    }

    /// Deterministic hash of every row.
    ///
    /// Two states built by the same operations from the same seeds have the
    /// same fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.game.hash(&mut hasher);

        for empire in self.empires.values() {
            empire.id.hash(&mut hasher);
            empire.name.hash(&mut hasher);
            hash_forces(&empire.forces, &mut hasher);
            empire.army_effectiveness().to_bits().hash(&mut hasher);
            empire.sector_count.hash(&mut hasher);
            empire.eliminated.hash(&mut hasher);
        }

        for sector in self.sectors.values() {
            sector.hash(&mut hasher);
        }

        self.attacks.len().hash(&mut hasher);
        for record in &self.attacks {
            record.id.hash(&mut hasher);
            record.fingerprint.hash(&mut hasher);
            record.captured_sectors.hash(&mut hasher);
        }
        self.phase_log.len().hash(&mut hasher);

        hasher.finish()
    }
}

fn hash_forces<H: Hasher>(forces: &Forces, hasher: &mut H) {
    for (_, count) in forces.iter() {
        count.hash(hasher);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_empires() -> GameState {
        let mut state = GameState::new(GameId::new("g"));
        state.add_empire(Empire::new(EmpireId::new(1), "Vega"));
        state.add_empire(Empire::new(EmpireId::new(2), "Lyra"));
        state
    }

    #[test]
    fn grant_sectors_assigns_fresh_ids() {
        let mut state = two_empires();
        let a = state.grant_sectors(EmpireId::new(1), 2);
        let b = state.grant_sectors(EmpireId::new(2), 3);
        assert_eq!(a, vec![SectorId::new(1), SectorId::new(2)]);
        assert_eq!(b.first(), Some(&SectorId::new(3)));
        assert_eq!(state.empire(EmpireId::new(2)).map(|e| e.sector_count), Some(3));
    }

    #[test]
    fn empires_iterate_in_id_order() {
        let mut state = GameState::new(GameId::new("g"));
        state.add_empire(Empire::new(EmpireId::new(9), "Late"));
        state.add_empire(Empire::new(EmpireId::new(3), "Early"));
        let ids: Vec<_> = state.empires().map(|e| e.id.as_u64()).collect();
        assert_eq!(ids, vec![3, 9]);
    }

    #[test]
    fn fingerprint_tracks_ownership() {
        let mut state = two_empires();
        let ids = state.grant_sectors(EmpireId::new(1), 2);
        let before = state.fingerprint();
        assert_eq!(before, state.clone().fingerprint());

        state.put_sector(Sector {
            id: ids[0],
            owner: EmpireId::new(2),
        });
        assert_ne!(before, state.fingerprint());
    }
}

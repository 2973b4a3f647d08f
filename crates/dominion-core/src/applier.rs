//! Outcome Applier.
//!
//! Commits a resolved battle to the store in one transaction:
//!
//! 1. Re-read both empires inside the transaction; the attacker must still
//!    hold every unit it committed
//! 2. Subtract casualties, flooring each count at zero
//! 3. Apply effectiveness deltas, clamped to [0, 100]
//! 4. Re-cap captured sectors against the defender's live territory (the
//!    defender always keeps one), pick that many at random and transfer them
//! 5. Append the attack record and one phase row per fought phase
//!
//! The battle itself was computed against a snapshot read earlier. Step 1 is
//! what keeps concurrent attacks on the same empire from overwriting each
//! other: a conflicting commit is retried on top of the newer rows.
//!
//! Sector picks draw from [`sector_rng`], a separate stream of the battle
//! seed. Every attempt starts it afresh, so the transferred sectors depend
//! only on the seed and the defender's territory at commit.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use dominion_combat::{fingerprint, CombatResult, EmpireId, Forces};

use crate::empire::{GameId, SectorId};
use crate::error::StoreError;
use crate::records::{AttackId, AttackRecord, PhaseLogRow};
use crate::store::{Store, Transaction};

/// Default number of commit attempts before giving up.
pub const DEFAULT_MAX_COMMIT_RETRIES: u32 = 5;

/// ChaCha stream used for sector selection. The engine uses stream 0.
const SECTOR_STREAM: u64 = 1;

/// Random source that picks captured sectors for the battle with `seed`.
#[must_use]
pub fn sector_rng(seed: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(SECTOR_STREAM);
    rng
}

/// A resolved battle ready to be committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedAttack {
    /// Game the attack belongs to.
    pub game: GameId,
    /// Turn the attack was launched.
    pub turn: u32,
    /// Attacking empire.
    pub attacker: EmpireId,
    /// Defending empire.
    pub defender: EmpireId,
    /// Forces the attacker committed.
    pub committed: Forces,
    /// Defender's standing army the battle was fought against.
    pub defender_forces: Forces,
    /// Sector to transfer first if any territory is captured.
    pub target_sector: Option<SectorId>,
    /// Seed the battle was resolved with.
    pub seed: u64,
    /// Engine output.
    pub result: CombatResult,
}

/// Applies battle outcomes to the store.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeApplier {
    max_attempts: u32,
}

impl Default for OutcomeApplier {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_COMMIT_RETRIES)
    }
}

impl OutcomeApplier {
    /// Creates an applier that tries to commit at most `max_attempts` times.
    #[must_use]
    pub const fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Commits `attack` and returns the id of its audit record.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EmpireNotFound`] if either empire no longer exists
    /// - [`StoreError::ForcesUnavailable`] if the attacker no longer holds
    ///   the committed forces
    /// - [`StoreError::RetriesExhausted`] if every attempt conflicted
    #[instrument(
        skip_all,
        fields(attacker = %attack.attacker, defender = %attack.defender, outcome = %attack.result.outcome)
    )]
    pub fn apply(&self, store: &Store, attack: &AppliedAttack) -> Result<AttackId, StoreError> {
        let replay = fingerprint(&attack.result);
        store.transaction(self.max_attempts, |tx| {
            apply_once(tx, attack, replay, &mut sector_rng(attack.seed))
        })
    }
}

fn apply_once<R: Rng + ?Sized>(
    tx: &mut Transaction<'_>,
    attack: &AppliedAttack,
    replay: u64,
    rng: &mut R,
) -> Result<AttackId, StoreError> {
    let result = &attack.result;

    // Transactional re-read.
    let mut attacker = tx.empire(attack.attacker)?;
    let mut defender = tx.empire(attack.defender)?;
    if !attack.committed.fits_within(&attacker.forces) {
        return Err(StoreError::ForcesUnavailable(attacker.id));
    }

    attacker.forces = attacker.forces.saturating_sub(&result.attacker_casualties);
    defender.forces = defender.forces.saturating_sub(&result.defender_casualties);

    attacker.adjust_effectiveness(result.attacker_effectiveness_delta);
    defender.adjust_effectiveness(result.defender_effectiveness_delta);

    let captured = if result.sectors_captured > 0 {
        let owned = tx.sectors_owned_by(defender.id)?;
        let picked = pick_sectors(&owned, result.sectors_captured, attack.target_sector, rng);
        for &sector in &picked {
            tx.transfer_sector(sector, attacker.id)?;
        }
        let moved = picked.len() as u64;
        defender.sector_count = (owned.len() as u64).saturating_sub(moved);
        attacker.sector_count += moved;
        picked
    } else {
        Vec::new()
    };

    debug!(
        attacker_soldiers = attacker.forces.soldiers,
        defender_soldiers = defender.forces.soldiers,
        sectors = captured.len(),
        "outcome staged"
    );

    tx.put_empire(attacker);
    tx.put_empire(defender);

    let id = tx.append_attack(|id| {
        let record = AttackRecord {
            id,
            game: attack.game.clone(),
            turn: attack.turn,
            attacker: attack.attacker,
            defender: attack.defender,
            attack_type: result.attack_type,
            attacker_forces: attack.committed,
            defender_forces: attack.defender_forces,
            attacker_power: result.total_attacker_power(),
            defender_power: result.total_defender_power(),
            outcome: result.outcome,
            territory_captured: !captured.is_empty(),
            sectors_captured: captured.len() as u64,
            captured_sectors: captured,
            attacker_casualties: result.attacker_casualties,
            defender_casualties: result.defender_casualties,
            attacker_effectiveness_delta: result.attacker_effectiveness_delta,
            defender_effectiveness_delta: result.defender_effectiveness_delta,
            seed: attack.seed,
            fingerprint: replay,
        };
        let phases = result
            .storable_phases()
            .map(|phase| PhaseLogRow::from_phase(id, phase))
            .collect();
        (record, phases)
    });
    Ok(id)
}

/// Picks up to `wanted` sectors from `owned`, leaving at least one behind.
///
/// `target` goes first when it is among `owned`; the rest are drawn
/// uniformly at random.
fn pick_sectors<R: Rng + ?Sized>(
    owned: &[SectorId],
    wanted: u64,
    target: Option<SectorId>,
    rng: &mut R,
) -> Vec<SectorId> {
    let available = owned.len().saturating_sub(1);
    let count = usize::try_from(wanted).map_or(available, |w| w.min(available));
    if count == 0 {
        return Vec::new();
    }

    let mut picked = Vec::with_capacity(count);
    let target = target.filter(|t| owned.contains(t));
    if let Some(target) = target {
        picked.push(target);
    }
    let pool: Vec<SectorId> = owned
        .iter()
        .copied()
        .filter(|id| Some(*id) != target)
        .collect();
    picked.extend(pool.choose_multiple(rng, count - picked.len()).copied());
    picked
}

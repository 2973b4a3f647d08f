//! Replay fingerprints.
//!
//! A fingerprint is a deterministic hash of a [`CombatResult`]. It is stored
//! with every attack record so a battle can be replayed from its seed and
//! checked against what was committed.
//!
//! The encoding is fixed: enum tags are explicit bytes, integers and float
//! bit patterns are little-endian, and the digest is SHA-256. Fingerprints
//! stay comparable across builds, platforms and toolchain upgrades.

use sha2::{Digest, Sha256};

use crate::attack::AttackType;
use crate::forces::Forces;
use crate::result::{BattleOutcome, CombatResult, PhaseKind, PhaseResult, PhaseWinner};

/// Version prefix of the encoding. Bump when the encoding changes.
const ENCODING: &[u8] = b"dominion-combat/fingerprint/v1";

/// Computes the replay fingerprint of a battle result.
///
/// Two results that compare equal always have the same fingerprint.
///
/// # Example
///
/// ```
/// use dominion_combat::{fingerprint, resolve, AttackType, BattleSetup, CombatConfig, Forces, UnitKind};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let setup = BattleSetup {
///     attacker: Forces::new().with(UnitKind::Soldiers, 40),
///     defender: Forces::new().with(UnitKind::Soldiers, 40),
///     attacker_effectiveness: 50.0,
///     defender_effectiveness: 50.0,
///     attack_type: AttackType::Raid,
///     attacker_multiplier: 1.0,
///     defender_sectors: 3,
/// };
/// let config = CombatConfig::default();
///
/// let first = resolve(&setup, &config, &mut ChaCha8Rng::seed_from_u64(5));
/// let replay = resolve(&setup, &config, &mut ChaCha8Rng::seed_from_u64(5));
/// assert_eq!(fingerprint(&first), fingerprint(&replay));
/// ```
#[must_use]
pub fn fingerprint(result: &CombatResult) -> u64 {
    let mut enc = Encoder::new();

    enc.byte(attack_type_tag(result.attack_type));
    enc.byte(outcome_tag(result.outcome));
    enc.u64(result.sectors_captured);
    enc.f64(result.attacker_effectiveness_delta);
    enc.f64(result.defender_effectiveness_delta);
    enc.forces(&result.attacker_casualties);
    enc.forces(&result.defender_casualties);

    enc.u64(result.phases.len() as u64);
    for phase in &result.phases {
        enc.phase(phase);
    }

    enc.finish()
}

struct Encoder(Sha256);

impl Encoder {
    fn new() -> Self {
        let mut digest = Sha256::new();
        digest.update(ENCODING);
        Self(digest)
    }

    fn byte(&mut self, value: u8) {
        self.0.update([value]);
    }

    fn u32(&mut self, value: u32) {
        self.0.update(value.to_le_bytes());
    }

    fn u64(&mut self, value: u64) {
        self.0.update(value.to_le_bytes());
    }

    fn f64(&mut self, value: f64) {
        self.u64(value.to_bits());
    }

    fn forces(&mut self, forces: &Forces) {
        for (_, count) in forces.iter() {
            self.u64(count);
        }
    }

    fn phase(&mut self, phase: &PhaseResult) {
        self.u32(phase.number);
        self.byte(phase_kind_tag(phase.kind));
        self.byte(u8::from(phase.skipped));
        self.byte(winner_tag(phase.winner));
        self.f64(phase.attacker_power);
        self.f64(phase.defender_power);
        self.forces(&phase.attacker_start);
        self.forces(&phase.defender_start);
        self.forces(&phase.attacker_casualties);
        self.forces(&phase.defender_casualties);
        // Narration is derived from the fields above.
    }

    fn finish(self) -> u64 {
        let digest = self.0.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(head)
    }
}

fn attack_type_tag(attack_type: AttackType) -> u8 {
    match attack_type {
        AttackType::Invasion => 0,
        AttackType::Raid => 1,
    }
}

fn outcome_tag(outcome: BattleOutcome) -> u8 {
    match outcome {
        BattleOutcome::AttackerVictory => 0,
        BattleOutcome::DefenderVictory => 1,
        BattleOutcome::Draw => 2,
    }
}

fn phase_kind_tag(kind: PhaseKind) -> u8 {
    match kind {
        PhaseKind::Space => 0,
        PhaseKind::Orbital => 1,
        PhaseKind::Ground => 2,
        PhaseKind::Raid => 3,
    }
}

fn winner_tag(winner: PhaseWinner) -> u8 {
    match winner {
        PhaseWinner::Attacker => 0,
        PhaseWinner::Defender => 1,
        PhaseWinner::Draw => 2,
    }
}

//! Attack service: the single entry point for launching attacks.
//!
//! [`CombatService::submit_attack`] runs the whole pipeline:
//!
//! 1. **CHECK**: reject malformed requests ([`AttackError`])
//! 2. **VALIDATE**: read a snapshot of both empires and run the precondition
//!    checks; a refusal is returned as [`AttackOutcome::Denied`]
//! 3. **RESOLVE**: run the phase engine with a per-attack seeded rng, outside
//!    any lock
//! 4. **APPLY**: commit the outcome through the [`OutcomeApplier`], which
//!    re-reads both empires transactionally
//! 5. **REPORT**: record the battle in the feed and return the report
//!
//! # Determinism
//!
//! The rng of each attack is seeded from a hash of the service seed, game,
//! turn, attacker, defender and how many battles that pair has already
//! fought this turn. Replaying the same requests against the same starting
//! state yields identical results and state fingerprints.
//!
//! Previews draw from a separate seed domain, so no number of preview
//! iterations reveals the stream a committed battle will use.
//!
//! # Example
//!
//! ```
//! use dominion_core::dominion_combat::{
//!     AttackType, CombatConfig, EmpireId, Forces, ReachabilityClass, TreatyFlags, UnitKind,
//! };
//! use dominion_core::empire::{Empire, GameId};
//! use dominion_core::service::{AttackOutcome, AttackRequest, CombatService, ServiceConfig};
//! use dominion_core::state::GameState;
//! use dominion_core::store::Store;
//!
//! let raiders = Forces::new().with(UnitKind::Soldiers, 400);
//! let mut state = GameState::new(GameId::new("alpha"));
//! state.add_empire(Empire::new(EmpireId::new(1), "Vega").with_forces(raiders));
//! state.add_empire(Empire::new(EmpireId::new(2), "Lyra"));
//! state.grant_sectors(EmpireId::new(2), 4);
//!
//! let service = CombatService::new(
//!     Store::new(state),
//!     CombatConfig::default(),
//!     ServiceConfig::default(),
//! )
//! .unwrap();
//!
//! let request = AttackRequest {
//!     game: GameId::new("alpha"),
//!     attacker: EmpireId::new(1),
//!     defender: EmpireId::new(2),
//!     target_sector: None,
//!     turn: 25,
//!     attack_type: AttackType::Raid,
//!     forces: raiders,
//!     treaties: TreatyFlags::empty(),
//!     reachability: ReachabilityClass::Direct,
//! };
//!
//! match service.submit_attack(&request).unwrap() {
//!     AttackOutcome::Resolved(report) => assert_eq!(report.result.phases.len(), 1),
//!     AttackOutcome::Denied(reason) => panic!("unexpected denial: {reason}"),
//! }
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, PoisonError};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use dominion_combat::{
    check_declaration, estimate_odds, multiplier_for, resolve, validate, AttackContext,
    AttackType, BattleSetup, CombatConfig, CombatResult, ConfigError, Denial, EmpireId, Forces,
    OddsEstimate, ReachabilityClass, TreatyFlags, Validation,
};

use crate::applier::{AppliedAttack, OutcomeApplier, DEFAULT_MAX_COMMIT_RETRIES};
use crate::empire::{GameId, SectorId};
use crate::error::{AttackError, StoreError};
use crate::feed::{self, BattleFeed, BattleSummary, DEFAULT_FEED_CAPACITY};
use crate::records::AttackId;
use crate::store::Store;

/// Service-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Master seed mixed into every per-attack seed.
    pub seed: u64,
    /// Commit attempts before an attack fails with a retryable error.
    pub max_commit_retries: u32,
    /// Battles retained by the feed.
    pub feed_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_commit_retries: DEFAULT_MAX_COMMIT_RETRIES,
            feed_capacity: DEFAULT_FEED_CAPACITY,
        }
    }
}

/// A request to attack another empire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackRequest {
    /// Game the attack belongs to.
    pub game: GameId,
    /// Attacking empire.
    pub attacker: EmpireId,
    /// Defending empire.
    pub defender: EmpireId,
    /// Sector to capture first, if the invasion takes territory.
    pub target_sector: Option<SectorId>,
    /// Current turn (1-based).
    pub turn: u32,
    /// Invasion or raid.
    pub attack_type: AttackType,
    /// Forces the attacker commits.
    pub forces: Forces,
    /// Treaties active between the two empires.
    pub treaties: TreatyFlags,
    /// Reachability from attacker to defender.
    pub reachability: ReachabilityClass,
}

/// What happened to an attack request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum AttackOutcome {
    /// A precondition failed; nothing was resolved or written.
    Denied(Denial),
    /// The battle was fought and committed.
    Resolved(Box<BattleReport>),
}

/// Report of a committed battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleReport {
    /// Id of the audit record.
    pub attack_id: AttackId,
    /// Seed the battle was resolved with.
    pub seed: u64,
    /// Engine output.
    pub result: CombatResult,
    /// Sectors actually transferred, in transfer order.
    pub captured_sectors: Vec<SectorId>,
    /// Headline and phase-by-phase narration.
    pub narration: Vec<String>,
}

/// Outcome of an odds preview.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Preview {
    /// The attack would be refused.
    Denied(Denial),
    /// Estimated outcome distribution.
    Odds(OddsEstimate),
}

/// Seed domains, mixed into the seed hash.
const BATTLE_DOMAIN: &str = "battle";
const PREVIEW_DOMAIN: &str = "preview";

/// Battles fought per (game, turn, attacker, defender).
type PairKey = (GameId, u32, EmpireId, EmpireId);

/// Validated inputs for one battle.
struct Prepared {
    verdict: Validation,
    setup: BattleSetup,
    attacker_name: String,
    defender_name: String,
}

/// Validates, resolves and commits attacks against a [`Store`].
#[derive(Debug)]
pub struct CombatService {
    store: Store,
    combat: CombatConfig,
    config: ServiceConfig,
    applier: OutcomeApplier,
    feed: BattleFeed,
    fought: Mutex<BTreeMap<PairKey, u64>>,
}

impl CombatService {
    /// Creates a service.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] if `combat` fails validation.
    pub fn new(
        store: Store,
        combat: CombatConfig,
        config: ServiceConfig,
    ) -> Result<Self, ConfigError> {
        combat.validate()?;
        Ok(Self {
            store,
            combat,
            applier: OutcomeApplier::new(config.max_commit_retries),
            feed: BattleFeed::new(config.feed_capacity),
            fought: Mutex::new(BTreeMap::new()),
            config,
        })
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Recent battles.
    #[must_use]
    pub fn feed(&self) -> &BattleFeed {
        &self.feed
    }

    /// Balance configuration in use.
    #[must_use]
    pub fn combat_config(&self) -> &CombatConfig {
        &self.combat
    }

    /// Service settings in use.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Validates, resolves and commits one attack.
    ///
    /// # Errors
    ///
    /// - [`AttackError::Input`], [`AttackError::EmptyGameId`],
    ///   [`AttackError::UnknownGame`], [`AttackError::UnknownEmpire`] and
    ///   [`AttackError::TargetSectorNotOwned`] for malformed requests
    /// - [`AttackError::Store`] if the outcome could not be committed; check
    ///   [`AttackError::is_retryable`]
    #[instrument(
        skip(self, request),
        fields(
            game = %request.game,
            attacker = %request.attacker,
            defender = %request.defender,
            turn = request.turn,
            attack_type = %request.attack_type,
        )
    )]
    pub fn submit_attack(&self, request: &AttackRequest) -> Result<AttackOutcome, AttackError> {
        let prepared = self.prepare(request)?;
        if let Validation::Deny(reason) = prepared.verdict {
            info!(%reason, "attack denied");
            return Ok(AttackOutcome::Denied(reason));
        }

        let seed = self.attack_seed(request, self.next_nonce(request));
        let result = resolve(
            &prepared.setup,
            &self.combat,
            &mut ChaCha8Rng::seed_from_u64(seed),
        );
        debug!(outcome = %result.outcome, phases = result.phases.len(), "battle resolved");

        let applied = AppliedAttack {
            game: request.game.clone(),
            turn: request.turn,
            attacker: request.attacker,
            defender: request.defender,
            committed: request.forces,
            defender_forces: prepared.setup.defender,
            target_sector: request.target_sector,
            seed,
            result,
        };
        let attack_id = match self.applier.apply(&self.store, &applied) {
            Ok(id) => id,
            Err(StoreError::ForcesUnavailable(_)) => {
                // Another attack by the same empire committed these units first.
                let reason = Denial::ForcesExceedAvailable;
                info!(%reason, "attack denied at commit");
                return Ok(AttackOutcome::Denied(reason));
            }
            Err(err) => return Err(err.into()),
        };
        let captured_sectors = self.store.read(|state| {
            state
                .attack(attack_id)
                .map(|record| record.captured_sectors.clone())
                .unwrap_or_default()
        });

        // Narrate what was committed, which may be fewer sectors than the
        // engine proposed.
        let mut committed = applied.result.clone();
        committed.sectors_captured = captured_sectors.len() as u64;
        let narration = feed::narrate(&prepared.attacker_name, &prepared.defender_name, &committed);

        self.feed.record(BattleSummary {
            attack: attack_id,
            game: request.game.clone(),
            turn: request.turn,
            attacker: request.attacker,
            defender: request.defender,
            attack_type: request.attack_type,
            outcome: committed.outcome,
            sectors_captured: committed.sectors_captured,
            headline: narration.first().cloned().unwrap_or_default(),
        });

        info!(
            %attack_id,
            outcome = %committed.outcome,
            sectors = committed.sectors_captured,
            "attack committed"
        );

        Ok(AttackOutcome::Resolved(Box::new(BattleReport {
            attack_id,
            seed,
            result: applied.result,
            captured_sectors,
            narration,
        })))
    }

    /// Estimates the odds of an attack without committing anything.
    ///
    /// # Errors
    ///
    /// Same input errors as [`Self::submit_attack`].
    pub fn preview(&self, request: &AttackRequest, iterations: u32) -> Result<Preview, AttackError> {
        let prepared = self.prepare(request)?;
        if let Validation::Deny(reason) = prepared.verdict {
            return Ok(Preview::Denied(reason));
        }
        let odds = estimate_odds(
            &prepared.setup,
            &self.combat,
            iterations,
            self.seed_in(PREVIEW_DOMAIN, request, 0),
        );
        Ok(Preview::Odds(odds))
    }

    fn prepare(&self, request: &AttackRequest) -> Result<Prepared, AttackError> {
        if request.game.is_empty() {
            return Err(AttackError::EmptyGameId);
        }
        check_declaration(request.attack_type, &request.forces, request.turn)?;

        self.store.read(|state| {
            if state.game() != &request.game {
                return Err(AttackError::UnknownGame(request.game.clone()));
            }
            let attacker = state
                .empire(request.attacker)
                .ok_or(AttackError::UnknownEmpire(request.attacker))?;
            let defender = state
                .empire(request.defender)
                .ok_or(AttackError::UnknownEmpire(request.defender))?;

            if let Some(sector) = request.target_sector {
                let owner = state
                    .sector(sector)
                    .map(|s| s.owner)
                    .ok_or(StoreError::SectorNotFound(sector))?;
                if owner != defender.id {
                    return Err(AttackError::TargetSectorNotOwned {
                        sector,
                        defender: defender.id,
                    });
                }
            }

            let ctx = AttackContext {
                attacker: attacker.view(),
                defender: defender.view(),
                declared: request.forces,
                attack_type: request.attack_type,
                current_turn: request.turn,
                treaties: request.treaties,
                reachability: request.reachability,
            };

            Ok(Prepared {
                verdict: validate(&ctx, &self.combat),
                setup: BattleSetup {
                    attacker: request.forces,
                    defender: defender.forces,
                    attacker_effectiveness: attacker.army_effectiveness(),
                    defender_effectiveness: defender.army_effectiveness(),
                    attack_type: request.attack_type,
                    attacker_multiplier: multiplier_for(request.reachability, &self.combat),
                    defender_sectors: defender.sector_count,
                },
                attacker_name: attacker.name.clone(),
                defender_name: defender.name.clone(),
            })
        })
    }

    /// Derives the rng seed of the `nonce`-th battle between the request's
    /// pair this turn.
    fn attack_seed(&self, request: &AttackRequest, nonce: u64) -> u64 {
        self.seed_in(BATTLE_DOMAIN, request, nonce)
    }

    fn seed_in(&self, domain: &str, request: &AttackRequest, nonce: u64) -> u64 {
        let mut hasher = DefaultHasher::new();
        domain.hash(&mut hasher);
        self.config.seed.hash(&mut hasher);
        request.game.hash(&mut hasher);
        request.turn.hash(&mut hasher);
        request.attacker.hash(&mut hasher);
        request.defender.hash(&mut hasher);
        nonce.hash(&mut hasher);
        hasher.finish()
    }

    /// Counts a battle for the request's pair and returns its index.
    fn next_nonce(&self, request: &AttackRequest) -> u64 {
        let mut fought = self.fought.lock().unwrap_or_else(PoisonError::into_inner);
        // Counters of turns before the previous one are no longer needed.
        fought.retain(|(_, turn, _, _), _| turn.saturating_add(1) >= request.turn);
        let count = fought
            .entry((
                request.game.clone(),
                request.turn,
                request.attacker,
                request.defender,
            ))
            .or_insert(0);
        let nonce = *count;
        *count += 1;
        nonce
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::empire::Empire;
    use crate::state::GameState;
    use dominion_combat::UnitKind;

    fn service() -> CombatService {
        let mut state = GameState::new(GameId::new("g"));
        state.add_empire(
            Empire::new(EmpireId::new(1), "Vega")
                .with_forces(Forces::new().with(UnitKind::Soldiers, 500)),
        );
        state.add_empire(Empire::new(EmpireId::new(2), "Lyra"));
        state.grant_sectors(EmpireId::new(2), 3);
        CombatService::new(
            Store::new(state),
            CombatConfig::default(),
            ServiceConfig::default(),
        )
        .unwrap()
    }

    fn raid() -> AttackRequest {
        AttackRequest {
            game: GameId::new("g"),
            attacker: EmpireId::new(1),
            defender: EmpireId::new(2),
            target_sector: None,
            turn: 25,
            attack_type: AttackType::Raid,
            forces: Forces::new().with(UnitKind::Soldiers, 100),
            treaties: TreatyFlags::empty(),
            reachability: ReachabilityClass::Direct,
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = CombatConfig {
            carrier_capacity: 0,
            ..CombatConfig::default()
        };
        let result = CombatService::new(
            Store::new(GameState::new(GameId::new("g"))),
            config,
            ServiceConfig::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn seed_depends_on_request() {
        let service = service();
        let a = raid();
        let mut b = raid();
        b.turn = 26;
        assert_eq!(service.attack_seed(&a, 0), service.attack_seed(&a, 0));
        assert_ne!(service.attack_seed(&a, 0), service.attack_seed(&b, 0));
        assert_ne!(service.attack_seed(&a, 0), service.attack_seed(&a, 1));
    }

    #[test]
    fn preview_seeds_are_separate_from_battle_seeds() {
        let service = service();
        let request = raid();
        assert_ne!(
            service.seed_in(PREVIEW_DOMAIN, &request, 0),
            service.attack_seed(&request, 0)
        );
    }

    #[test]
    fn repeated_attacks_get_fresh_seeds() {
        let service = service();
        let seeds: Vec<u64> = (0..3)
            .map(|_| match service.submit_attack(&raid()).unwrap() {
                AttackOutcome::Resolved(report) => report.seed,
                AttackOutcome::Denied(reason) => panic!("unexpected denial: {reason}"),
            })
            .collect();
        assert_ne!(seeds[0], seeds[1]);
        assert_ne!(seeds[1], seeds[2]);
        assert_ne!(seeds[0], seeds[2]);
    }

    #[test]
    fn battle_counters_are_pruned_by_turn() {
        let service = service();
        let mut request = raid();
        assert_eq!(service.next_nonce(&request), 0);
        assert_eq!(service.next_nonce(&request), 1);
        request.turn = 40;
        assert_eq!(service.next_nonce(&request), 0);
        let fought = service.fought.lock().unwrap();
        assert_eq!(fought.len(), 1);
    }

    #[test]
    fn empty_game_id_is_input_error() {
        let service = service();
        let mut request = raid();
        request.game = GameId::new("");
        assert!(matches!(
            service.submit_attack(&request),
            Err(AttackError::EmptyGameId)
        ));
    }

    #[test]
    fn preview_does_not_commit() {
        let service = service();
        let before = service.store().snapshot();
        let preview = service.preview(&raid(), 50).unwrap();
        assert!(matches!(preview, Preview::Odds(odds) if odds.iterations == 50));
        assert_eq!(service.store().snapshot(), before);
        assert!(service.feed().is_empty());
    }

    #[test]
    fn preview_reports_denial() {
        let service = service();
        let mut request = raid();
        request.turn = 3;
        assert_eq!(
            service.preview(&request, 10).unwrap(),
            Preview::Denied(Denial::ProtectedPeriod)
        );
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_string(&AttackOutcome::Denied(Denial::SelfTarget)).unwrap();
        assert!(json.contains("\"status\":\"denied\""));
    }
}

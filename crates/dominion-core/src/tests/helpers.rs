//! Test helpers for building games, services and attack requests.

use dominion_combat::{
    AttackType, CombatConfig, EmpireId, Forces, ReachabilityClass, TreatyFlags, UnitKind,
};

use crate::empire::{Empire, GameId};
use crate::service::{AttackOutcome, AttackRequest, BattleReport, CombatService, ServiceConfig};
use crate::state::GameState;
use crate::store::Store;

// =============================================================================
// Standard Scenario
// =============================================================================

/// Game id of the standard scenario.
pub const GAME: &str = "test-game";

/// Strong attacker with a full fleet.
pub const VEGA: EmpireId = EmpireId::new(1);
/// Defender with a mixed garrison.
pub const LYRA: EmpireId = EmpireId::new(2);
/// Second attacker, used for concurrent attacks on Lyra.
pub const ORION: EmpireId = EmpireId::new(3);
/// Lightly defended empire.
pub const DRACO: EmpireId = EmpireId::new(4);

/// Sectors Lyra starts with.
pub const LYRA_SECTORS: u64 = 20;

/// Routes test logs through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Vega's standing army.
pub fn vega_army() -> Forces {
    Forces::new()
        .with(UnitKind::Soldiers, 3_000)
        .with(UnitKind::Carriers, 30)
        .with(UnitKind::Fighters, 400)
        .with(UnitKind::LightCruisers, 100)
        .with(UnitKind::HeavyCruisers, 80)
}

/// Lyra's standing army.
pub fn lyra_army() -> Forces {
    Forces::new()
        .with(UnitKind::Soldiers, 800)
        .with(UnitKind::Fighters, 100)
        .with(UnitKind::Stations, 20)
        .with(UnitKind::HeavyCruisers, 10)
}

/// Orion's standing army.
pub fn orion_army() -> Forces {
    Forces::new()
        .with(UnitKind::Soldiers, 2_000)
        .with(UnitKind::Carriers, 20)
        .with(UnitKind::Fighters, 300)
}

/// Builds the standard four-empire game.
pub fn standard_state() -> GameState {
    let mut state = GameState::new(GameId::new(GAME));
    state.add_empire(Empire::new(VEGA, "Vega").with_forces(vega_army()));
    state.add_empire(Empire::new(LYRA, "Lyra").with_forces(lyra_army()));
    state.add_empire(Empire::new(ORION, "Orion").with_forces(orion_army()));
    state.add_empire(
        Empire::new(DRACO, "Draco").with_forces(Forces::new().with(UnitKind::Soldiers, 50)),
    );
    state.grant_sectors(VEGA, 12);
    state.grant_sectors(LYRA, LYRA_SECTORS);
    state.grant_sectors(ORION, 8);
    state.grant_sectors(DRACO, 6);
    state
}

/// Service over the standard game with the given master seed.
pub fn service_with_seed(seed: u64) -> CombatService {
    CombatService::new(
        Store::new(standard_state()),
        CombatConfig::default(),
        ServiceConfig {
            seed,
            ..ServiceConfig::default()
        },
    )
    .expect("default config is valid")
}

/// Service over the standard game with seed 42.
pub fn standard_service() -> CombatService {
    service_with_seed(42)
}

// =============================================================================
// Requests
// =============================================================================

/// Invasion request at turn 25 with direct reach and no treaties.
pub fn invasion(attacker: EmpireId, defender: EmpireId, forces: Forces) -> AttackRequest {
    AttackRequest {
        game: GameId::new(GAME),
        attacker,
        defender,
        target_sector: None,
        turn: 25,
        attack_type: AttackType::Invasion,
        forces,
        treaties: TreatyFlags::empty(),
        reachability: ReachabilityClass::Direct,
    }
}

/// Raid request at turn 25 with direct reach and no treaties.
pub fn raid(attacker: EmpireId, defender: EmpireId, soldiers: u64) -> AttackRequest {
    AttackRequest {
        attack_type: AttackType::Raid,
        ..invasion(
            attacker,
            defender,
            Forces::new().with(UnitKind::Soldiers, soldiers),
        )
    }
}

// =============================================================================
// Assertions
// =============================================================================

/// Unwraps a resolved outcome.
///
/// # Panics
///
/// Panics if the attack was denied.
pub fn expect_resolved(outcome: AttackOutcome) -> BattleReport {
    match outcome {
        AttackOutcome::Resolved(report) => *report,
        AttackOutcome::Denied(reason) => panic!("attack unexpectedly denied: {reason}"),
    }
}

/// Current standing army of an empire.
///
/// # Panics
///
/// Panics if the empire does not exist.
pub fn forces_of(service: &CombatService, id: EmpireId) -> Forces {
    service
        .store()
        .read(|state| state.empire(id).map(|e| e.forces))
        .expect("empire exists")
}

/// Checks that every empire's sector count matches the sector table and its
/// effectiveness is in range.
///
/// # Panics
///
/// Panics on the first inconsistency.
pub fn assert_consistent(state: &GameState) {
    for empire in state.empires() {
        assert_eq!(
            empire.sector_count,
            state.sectors_owned_by(empire.id).len() as u64,
            "sector count of {} out of sync",
            empire.name
        );
        assert!((0.0..=100.0).contains(&empire.army_effectiveness()));
    }
}

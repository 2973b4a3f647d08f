//! Attack classification inputs: attack type, reachability and treaty state.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::units::UnitKind;

/// The kind of attack being launched.
///
/// # Variants
///
/// - `Invasion`: full multi-phase assault that can seize sectors
/// - `Raid`: single-phase, soldiers-only harassment that never captures
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    /// Space, orbital and ground phases; may capture sectors.
    Invasion,
    /// Soldiers only; no transport needed, no capture possible.
    Raid,
}

impl AttackType {
    /// Unit kinds an attack of this type may commit.
    ///
    /// Stations are static defenses and never leave home.
    #[must_use]
    pub const fn allowed_units(self) -> &'static [UnitKind] {
        match self {
            Self::Invasion => &[
                UnitKind::Soldiers,
                UnitKind::Fighters,
                UnitKind::LightCruisers,
                UnitKind::HeavyCruisers,
                UnitKind::Carriers,
            ],
            Self::Raid => &[UnitKind::Soldiers],
        }
    }

    /// Whether this attack type can transfer sector ownership.
    #[must_use]
    pub const fn can_capture(self) -> bool {
        matches!(self, Self::Invasion)
    }

    /// Whether ground troops need carriers for this attack type.
    #[must_use]
    pub const fn requires_transport(self) -> bool {
        matches!(self, Self::Invasion)
    }
}

impl fmt::Display for AttackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invasion => write!(f, "invasion"),
            Self::Raid => write!(f, "raid"),
        }
    }
}

/// How connected the attacker is to the defender on the influence map.
///
/// Supplied by the map collaborator; the engine only consumes it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReachabilityClass {
    /// Within the attacker's direct sphere of influence.
    Direct,
    /// Reachable over stretched supply lines; attacker power is attenuated.
    Extended,
    /// Not reachable at all; attacks are denied.
    Unreachable,
}

impl fmt::Display for ReachabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Extended => write!(f, "extended"),
            Self::Unreachable => write!(f, "unreachable"),
        }
    }
}

bitflags! {
    /// Treaties currently active between two empires.
    ///
    /// Supplied read-only by the diplomacy collaborator.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TreatyFlags: u8 {
        /// Mutual non-aggression pact.
        const NON_AGGRESSION = 0b0000_0001;
        /// Full alliance.
        const ALLIANCE       = 0b0000_0010;
        /// Trade agreement. Does not restrict combat.
        const TRADE          = 0b0000_0100;
    }
}

impl TreatyFlags {
    /// Treaties that forbid either party from attacking the other.
    pub const BLOCKING: Self = Self::NON_AGGRESSION.union(Self::ALLIANCE);

    /// Returns true if any active treaty forbids combat.
    #[must_use]
    pub const fn blocks_attack(self) -> bool {
        self.intersects(Self::BLOCKING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raid_only_allows_soldiers() {
        assert_eq!(AttackType::Raid.allowed_units(), &[UnitKind::Soldiers]);
    }

    #[test]
    fn stations_never_attack() {
        let invasion = AttackType::Invasion.allowed_units();
        assert_eq!(invasion.len(), UnitKind::COUNT - 1);
        assert!(!invasion.contains(&UnitKind::Stations));
    }

    #[test]
    fn only_invasions_capture_and_need_transport() {
        assert!(AttackType::Invasion.can_capture());
        assert!(AttackType::Invasion.requires_transport());
        assert!(!AttackType::Raid.can_capture());
        assert!(!AttackType::Raid.requires_transport());
    }

    #[test]
    fn trade_treaty_does_not_block() {
        assert!(!TreatyFlags::TRADE.blocks_attack());
        assert!(!TreatyFlags::empty().blocks_attack());
        assert!(TreatyFlags::ALLIANCE.blocks_attack());
        assert!((TreatyFlags::TRADE | TreatyFlags::NON_AGGRESSION).blocks_attack());
    }

    #[test]
    fn attack_type_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&AttackType::Raid).unwrap(), "\"raid\"");
        assert_eq!(
            serde_json::to_string(&ReachabilityClass::Extended).unwrap(),
            "\"extended\""
        );
    }
}

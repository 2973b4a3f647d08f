//! Force & Capability Model: static unit statistics.
//!
//! Every military unit belongs to one of six [`UnitKind`]s. Each kind has a
//! fixed attack and defense coefficient and takes part in a fixed set of
//! combat phases. The table is pure lookup data; balance tuning that varies
//! per game lives in [`CombatConfig`](crate::CombatConfig) instead.
//!
//! | kind | attack | defense | fights in |
//! |---|---|---|---|
//! | soldiers | 1 | 1 | ground, raid |
//! | fighters | 3 | 2 | space |
//! | stations | 0 | 5 | orbital (defender only) |
//! | light cruisers | 5 | 4 | space, orbital (attacker) |
//! | heavy cruisers | 8 | 6 | orbital |
//! | carriers | 0 | 1 | space (as targets) |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of military units.
///
/// The declaration order is the canonical order used for iteration, hashing
/// and display.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Ground troops. The only unit that can take and hold sectors.
    Soldiers,
    /// Light air units contesting the space phase.
    Fighters,
    /// Static defense platforms. Fortified in the orbital phase.
    Stations,
    /// Light capital ships.
    LightCruisers,
    /// Heavy capital ships.
    HeavyCruisers,
    /// Transport carriers. Carry soldiers during invasions.
    Carriers,
}

impl UnitKind {
    /// Number of unit kinds.
    pub const COUNT: usize = 6;

    /// All unit kinds in canonical order.
    pub const ALL: [UnitKind; Self::COUNT] = [
        Self::Soldiers,
        Self::Fighters,
        Self::Stations,
        Self::LightCruisers,
        Self::HeavyCruisers,
        Self::Carriers,
    ];

    /// Returns the canonical index of this kind (0..6).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the static capability record for this kind.
    #[must_use]
    pub const fn stats(self) -> UnitStats {
        UNIT_TABLE[self.index()]
    }

    /// Offensive coefficient per unit.
    #[must_use]
    pub const fn attack(self) -> f64 {
        self.stats().attack
    }

    /// Defensive coefficient per unit.
    #[must_use]
    pub const fn defense(self) -> f64 {
        self.stats().defense
    }

    /// Returns the display label used in phase narration.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Soldiers => "soldiers",
            Self::Fighters => "fighters",
            Self::Stations => "stations",
            Self::LightCruisers => "light cruisers",
            Self::HeavyCruisers => "heavy cruisers",
            Self::Carriers => "carriers",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Static combat coefficients for a unit kind.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Power contributed per unit when attacking.
    pub attack: f64,
    /// Power contributed per unit when defending.
    pub defense: f64,
}

const UNIT_TABLE: [UnitStats; UnitKind::COUNT] = [
    UnitStats { attack: 1.0, defense: 1.0 },
    UnitStats { attack: 3.0, defense: 2.0 },
    UnitStats { attack: 0.0, defense: 5.0 },
    UnitStats { attack: 5.0, defense: 4.0 },
    UnitStats { attack: 8.0, defense: 6.0 },
    UnitStats { attack: 0.0, defense: 1.0 },
];

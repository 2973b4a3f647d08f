//! Empire and sector records.
//!
//! These are the persistent rows the combat engine reads and writes:
//! - [`GameId`]: identifier of a game instance
//! - [`SectorId`]: identifier of a sector of territory
//! - [`Empire`]: forces, army effectiveness and territory of one player
//! - [`Sector`]: one unit of territory and its owner
//!
//! # Example
//!
//! ```
//! use dominion_core::empire::Empire;
//! use dominion_core::dominion_combat::{EmpireId, Forces, UnitKind};
//!
//! let mut empire = Empire::new(EmpireId::new(1), "Vega")
//!     .with_forces(Forces::new().with(UnitKind::Soldiers, 500));
//!
//! empire.adjust_effectiveness(40.0);
//! assert_eq!(empire.army_effectiveness(), 100.0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use dominion_combat::{EmpireId, EmpireView, Forces};

/// Army effectiveness of a newly founded empire.
pub const STARTING_EFFECTIVENESS: f64 = 75.0;

/// Identifier of a game instance.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameId(String);

impl GameId {
    /// Creates a game id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the empty id, which is never valid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GameId({:?})", self.0)
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a sector.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SectorId(u64);

impl SectorId {
    /// Creates a sector id from its raw value.
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

impl fmt::Debug for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SectorId({})", self.0)
    }
}

impl fmt::Display for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One player's empire.
///
/// `army_effectiveness` is kept within [0, 100] by every setter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Empire {
    /// Empire identifier.
    pub id: EmpireId,
    /// Display name.
    pub name: String,
    /// Standing army.
    pub forces: Forces,
    army_effectiveness: f64,
    /// Number of sectors owned. Kept in step with the sector table.
    pub sector_count: u64,
    /// Eliminated empires can neither attack nor be attacked.
    pub eliminated: bool,
}

impl Empire {
    /// Creates an empire with no forces and no territory.
    #[must_use]
    pub fn new(id: EmpireId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            forces: Forces::new(),
            army_effectiveness: STARTING_EFFECTIVENESS,
            sector_count: 0,
            eliminated: false,
        }
    }

    /// Returns a copy with the given standing army.
    #[must_use]
    pub fn with_forces(mut self, forces: Forces) -> Self {
        self.forces = forces;
        self
    }

    /// Returns a copy with the given army effectiveness (clamped).
    #[must_use]
    pub fn with_effectiveness(mut self, effectiveness: f64) -> Self {
        self.set_army_effectiveness(effectiveness);
        self
    }

    /// Army effectiveness in [0, 100].
    #[must_use]
    pub fn army_effectiveness(&self) -> f64 {
        self.army_effectiveness
    }

    /// Sets army effectiveness, clamping into [0, 100]. NaN is treated as 0.
    pub fn set_army_effectiveness(&mut self, value: f64) {
        self.army_effectiveness = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 100.0)
        };
    }

    /// Adds a signed delta to army effectiveness and returns the clamped result.
    pub fn adjust_effectiveness(&mut self, delta: f64) -> f64 {
        self.set_army_effectiveness(self.army_effectiveness + delta);
        self.army_effectiveness
    }

    /// The validator's view of this empire.
    #[must_use]
    pub fn view(&self) -> EmpireView {
        EmpireView {
            id: self.id,
            available: self.forces,
            eliminated: self.eliminated,
        }
    }
}

/// One sector of territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sector {
    /// Sector identifier.
    pub id: SectorId,
    /// Owning empire.
    pub owner: EmpireId,
}

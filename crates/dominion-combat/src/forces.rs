//! Unit count records.
//!
//! [`Forces`] holds one non-negative count per [`UnitKind`]. It is used both
//! for an empire's standing army and for the subset declared for an attack.
//! Counts are unsigned, so the "all fields finite and non-negative" invariant
//! holds by construction; subtraction saturates at zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

use crate::units::UnitKind;

/// Six unit counts, one per [`UnitKind`].
///
/// # Example
///
/// ```
/// use dominion_combat::{Forces, UnitKind};
///
/// let forces = Forces::new().with(UnitKind::Soldiers, 100).with(UnitKind::Carriers, 1);
/// assert_eq!(forces.total(), 101);
/// assert_eq!(forces.get(UnitKind::Soldiers), 100);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Forces {
    /// Ground troops.
    pub soldiers: u64,
    /// Light air units.
    pub fighters: u64,
    /// Static defense platforms.
    pub stations: u64,
    /// Light capital ships.
    pub light_cruisers: u64,
    /// Heavy capital ships.
    pub heavy_cruisers: u64,
    /// Transport carriers.
    pub carriers: u64,
}

impl Forces {
    /// Creates an empty force record.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            soldiers: 0,
            fighters: 0,
            stations: 0,
            light_cruisers: 0,
            heavy_cruisers: 0,
            carriers: 0,
        }
    }

    /// Returns a copy with `kind` set to `count`.
    #[must_use]
    pub fn with(mut self, kind: UnitKind, count: u64) -> Self {
        self.set(kind, count);
        self
    }

    /// Returns the count for a unit kind.
    #[must_use]
    pub const fn get(&self, kind: UnitKind) -> u64 {
        match kind {
            UnitKind::Soldiers => self.soldiers,
            UnitKind::Fighters => self.fighters,
            UnitKind::Stations => self.stations,
            UnitKind::LightCruisers => self.light_cruisers,
            UnitKind::HeavyCruisers => self.heavy_cruisers,
            UnitKind::Carriers => self.carriers,
        }
    }

    /// Sets the count for a unit kind.
    pub fn set(&mut self, kind: UnitKind, count: u64) {
        *self.slot_mut(kind) = count;
    }

    fn slot_mut(&mut self, kind: UnitKind) -> &mut u64 {
        match kind {
            UnitKind::Soldiers => &mut self.soldiers,
            UnitKind::Fighters => &mut self.fighters,
            UnitKind::Stations => &mut self.stations,
            UnitKind::LightCruisers => &mut self.light_cruisers,
            UnitKind::HeavyCruisers => &mut self.heavy_cruisers,
            UnitKind::Carriers => &mut self.carriers,
        }
    }

    /// Iterates `(kind, count)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (UnitKind, u64)> + '_ {
        UnitKind::ALL.iter().map(move |&kind| (kind, self.get(kind)))
    }

    /// Total number of units across all kinds.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.iter().fold(0u64, |acc, (_, n)| acc.saturating_add(n))
    }

    /// Returns true if every count is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, n)| n == 0)
    }

    /// Returns a copy keeping only the given kinds; all others are zeroed.
    #[must_use]
    pub fn only(&self, kinds: &[UnitKind]) -> Self {
        kinds
            .iter()
            .fold(Self::new(), |acc, &kind| acc.with(kind, self.get(kind)))
    }

    /// Subtracts `other` per kind, flooring each count at zero.
    #[must_use]
    pub fn saturating_sub(&self, other: &Self) -> Self {
        let mut out = *self;
        for kind in UnitKind::ALL {
            out.set(kind, self.get(kind).saturating_sub(other.get(kind)));
        }
        out
    }

    /// Returns the first kind (canonical order) where `self` exceeds
    /// `available`, or `None` if every count fits.
    #[must_use]
    pub fn first_excess(&self, available: &Self) -> Option<UnitKind> {
        UnitKind::ALL
            .into_iter()
            .find(|&kind| self.get(kind) > available.get(kind))
    }

    /// Returns true if every count is at most the matching count in `other`.
    #[must_use]
    pub fn fits_within(&self, other: &Self) -> bool {
        self.first_excess(other).is_none()
    }
}

impl Add for Forces {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for Forces {
    fn add_assign(&mut self, rhs: Self) {
        for kind in UnitKind::ALL {
            let slot = self.slot_mut(kind);
            *slot = slot.saturating_add(rhs.get(kind));
        }
    }
}

impl fmt::Display for Forces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (kind, count) in self.iter().filter(|(_, n)| *n > 0) {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{count} {kind}")?;
            first = false;
        }
        if first {
            f.write_str("no units")?;
        }
        Ok(())
    }
}

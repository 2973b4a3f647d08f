//! Precondition Validator.
//!
//! Decides whether a declared attack may proceed. Validation is a pure
//! function of its inputs: it never mutates state and never fails. A refusal
//! is an ordinary [`Validation::Deny`] carrying a typed [`Denial`] so that
//! the caller (UI or bot planner) can react to the specific cause.
//!
//! Malformed requests are a different matter: [`check_declaration`] rejects
//! them with an [`InputError`] before validation runs.
//!
//! # Check Order
//!
//! The first failing check wins:
//!
//! 1. attacker and defender differ
//! 2. defender is not eliminated
//! 3. the protection window has passed
//! 4. no blocking treaty
//! 5. defender is reachable
//! 6. forces are committed and available
//! 7. invasion troops fit in the carriers (raids are exempt)

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::attack::{AttackType, ReachabilityClass, TreatyFlags};
use crate::config::CombatConfig;
use crate::forces::Forces;
use crate::units::UnitKind;
use crate::EmpireId;

/// Reason an attack was refused.
///
/// Serialized codes match the display strings the UI keys its messages on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Denial {
    /// The attacker targeted itself.
    SelfTarget,
    /// The defender has already been eliminated.
    TargetEliminated,
    /// The game is still inside the opening protection window.
    ProtectedPeriod,
    /// A non-aggression pact or alliance is in force.
    TreatyBlocksAttack,
    /// The defender is outside the attacker's reach.
    Unreachable,
    /// The declared forces are empty.
    NoForcesCommitted,
    /// The declared forces exceed what the attacker has.
    ForcesExceedAvailable,
    /// The carriers cannot transport all declared soldiers.
    InsufficientTransportCapacity,
}

impl Denial {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::SelfTarget => "self_target",
            Self::TargetEliminated => "target_eliminated",
            Self::ProtectedPeriod => "protected_period",
            Self::TreatyBlocksAttack => "treaty_blocks_attack",
            Self::Unreachable => "unreachable",
            Self::NoForcesCommitted => "no_forces_committed",
            Self::ForcesExceedAvailable => "forces_exceed_available",
            Self::InsufficientTransportCapacity => "insufficient_transport_capacity",
        }
    }

    /// User-facing explanation shown on a disabled attack control.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::SelfTarget => "You cannot attack your own empire.",
            Self::TargetEliminated => "This empire has already been eliminated.",
            Self::ProtectedPeriod => "Empires are under protection during the opening turns.",
            Self::TreatyBlocksAttack => "An active treaty forbids attacking this empire.",
            Self::Unreachable => "This empire is beyond your sphere of influence.",
            Self::NoForcesCommitted => "Select at least one unit to attack with.",
            Self::ForcesExceedAvailable => "You do not have that many units available.",
            Self::InsufficientTransportCapacity => {
                "Not enough carriers to transport your soldiers."
            }
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of precondition validation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "result", content = "reason")]
pub enum Validation {
    /// The attack may proceed.
    Allow,
    /// The attack is refused for the given reason.
    Deny(Denial),
}

impl Validation {
    /// Returns true for [`Validation::Allow`].
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Returns the denial reason, if any.
    #[must_use]
    pub const fn denial(self) -> Option<Denial> {
        match self {
            Self::Allow => None,
            Self::Deny(reason) => Some(reason),
        }
    }
}

/// Read-only view of one empire as the validator needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmpireView {
    /// Empire identifier.
    pub id: EmpireId,
    /// Units currently available to the empire.
    pub available: Forces,
    /// Whether the empire has been eliminated from the game.
    pub eliminated: bool,
}

/// Everything the validator looks at for one attack attempt.
#[derive(Debug, Clone, Copy)]
pub struct AttackContext {
    /// The attacking empire.
    pub attacker: EmpireView,
    /// The defending empire.
    pub defender: EmpireView,
    /// Units the attacker declared for this attack.
    pub declared: Forces,
    /// Invasion or raid.
    pub attack_type: AttackType,
    /// The current game turn (1-based).
    pub current_turn: u32,
    /// Treaties active between the two empires.
    pub treaties: TreatyFlags,
    /// Map reachability from attacker to defender.
    pub reachability: ReachabilityClass,
}

/// Runs the precondition checks in order and returns the first failure.
///
/// # Example
///
/// ```
/// use dominion_combat::{
///     validate, AttackContext, AttackType, CombatConfig, Denial, EmpireId, EmpireView,
///     Forces, ReachabilityClass, TreatyFlags, UnitKind, Validation,
/// };
///
/// let troops = Forces::new().with(UnitKind::Soldiers, 100);
/// let ctx = AttackContext {
///     attacker: EmpireView { id: EmpireId::new(1), available: troops, eliminated: false },
///     defender: EmpireView { id: EmpireId::new(2), available: Forces::new(), eliminated: false },
///     declared: troops,
///     attack_type: AttackType::Invasion,
///     current_turn: 5,
///     treaties: TreatyFlags::empty(),
///     reachability: ReachabilityClass::Direct,
/// };
///
/// let verdict = validate(&ctx, &CombatConfig::default());
/// assert_eq!(verdict, Validation::Deny(Denial::ProtectedPeriod));
/// ```
#[must_use]
pub fn validate(ctx: &AttackContext, config: &CombatConfig) -> Validation {
    match first_denial(ctx, config) {
        Some(reason) => Validation::Deny(reason),
        None => Validation::Allow,
    }
}

fn first_denial(ctx: &AttackContext, config: &CombatConfig) -> Option<Denial> {
    if ctx.attacker.id == ctx.defender.id {
        return Some(Denial::SelfTarget);
    }
    if ctx.defender.eliminated {
        return Some(Denial::TargetEliminated);
    }
    if ctx.current_turn <= config.protection_turns {
        return Some(Denial::ProtectedPeriod);
    }
    if ctx.treaties.blocks_attack() {
        return Some(Denial::TreatyBlocksAttack);
    }
    if ctx.reachability == ReachabilityClass::Unreachable {
        return Some(Denial::Unreachable);
    }
    if ctx.declared.is_empty() {
        return Some(Denial::NoForcesCommitted);
    }
    if !ctx.declared.fits_within(&ctx.attacker.available) {
        return Some(Denial::ForcesExceedAvailable);
    }
    if ctx.attack_type.requires_transport() && ctx.declared.soldiers > 0 {
        let capacity = ctx.declared.carriers.saturating_mul(config.carrier_capacity);
        if ctx.declared.soldiers > capacity {
            return Some(Denial::InsufficientTransportCapacity);
        }
    }
    None
}

/// A request that is malformed rather than merely refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Turn numbers start at 1.
    #[error("turn number must be positive")]
    ZeroTurn,

    /// The declared forces include a unit kind this attack type cannot
    /// commit: anything but soldiers for a raid, stations for an invasion.
    #[error("{kind} may not be sent on {attack_type} attacks")]
    UnitNotAllowed {
        /// Attack type of the declaration.
        attack_type: AttackType,
        /// First offending unit kind.
        kind: UnitKind,
    },
}

/// Rejects malformed attack declarations before any validation or
/// computation takes place.
///
/// # Errors
///
/// - [`InputError::ZeroTurn`] if `turn` is 0
/// - [`InputError::UnitNotAllowed`] if a unit kind outside
///   [`AttackType::allowed_units`] is declared
pub fn check_declaration(
    attack_type: AttackType,
    declared: &Forces,
    turn: u32,
) -> Result<(), InputError> {
    if turn == 0 {
        return Err(InputError::ZeroTurn);
    }
    let allowed = attack_type.allowed_units();
    if let Some((kind, _)) = declared
        .iter()
        .find(|(kind, n)| *n > 0 && !allowed.contains(kind))
    {
        return Err(InputError::UnitNotAllowed { attack_type, kind });
    }
    Ok(())
}

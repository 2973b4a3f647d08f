//! Force Multiplier Resolver.
//!
//! Maps a [`ReachabilityClass`] to the factor applied once to the attacker's
//! computed power before phase resolution. Defender power is never scaled.

use crate::attack::ReachabilityClass;
use crate::config::CombatConfig;

/// Returns the attacker power multiplier for a reachability class.
///
/// - `Direct` → 1.0
/// - `Extended` → `config.extended_multiplier` (supply-line attenuation)
/// - `Unreachable` → 0.0; such attacks are denied by validation first
///
/// # Example
///
/// ```
/// use dominion_combat::{multiplier_for, CombatConfig, ReachabilityClass};
///
/// let config = CombatConfig::default();
/// assert_eq!(multiplier_for(ReachabilityClass::Direct, &config), 1.0);
/// assert!(multiplier_for(ReachabilityClass::Extended, &config) < 1.0);
/// ```
#[must_use]
pub fn multiplier_for(reachability: ReachabilityClass, config: &CombatConfig) -> f64 {
    match reachability {
        ReachabilityClass::Direct => 1.0,
        ReachabilityClass::Extended => config.extended_multiplier,
        ReachabilityClass::Unreachable => 0.0,
    }
}

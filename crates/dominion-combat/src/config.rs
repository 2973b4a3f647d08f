//! Combat balance configuration.
//!
//! All tunable constants of the validator, multiplier resolver and phase
//! engine are collected in [`CombatConfig`]. Defaults reproduce the live game
//! balance; a game may override any subset from JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when a configuration is malformed or out of range.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("failed to parse combat config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field is outside its permitted range.
    #[error("combat config field `{field}` out of range: {reason}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// What the field must satisfy.
        reason: &'static str,
    },
}

/// Balance constants for combat resolution.
///
/// # Example
///
/// ```
/// use dominion_combat::CombatConfig;
///
/// let config = CombatConfig::from_json_str(r#"{ "protection_turns": 10 }"#).unwrap();
/// assert_eq!(config.protection_turns, 10);
/// assert_eq!(config.carrier_capacity, CombatConfig::default().carrier_capacity);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    // === PRECONDITIONS ===
    /// Number of opening turns during which nobody may attack or be attacked.
    ///
    /// Turns `1..=protection_turns` are protected.
    pub protection_turns: u32,

    /// Soldiers transported by one carrier during an invasion.
    pub carrier_capacity: u64,

    // === FORCE MULTIPLIERS ===
    /// Attacker power factor over extended supply lines (must be in (0, 1)).
    pub extended_multiplier: f64,

    /// Lowest effectiveness factor, reached at 0 army effectiveness.
    ///
    /// The factor rises linearly to 1.0 at 100 effectiveness.
    pub effectiveness_floor: f64,

    /// Defensive bonus applied to stations in the orbital phase.
    pub station_fortification: f64,

    /// Ground power bonus per net phase won before the ground phase.
    pub momentum_step: f64,

    /// Lowest ground momentum multiplier after lost phases.
    pub momentum_floor: f64,

    // === PHASE WINNERS ===
    /// Relative power gap under which a phase counts as a near-tie.
    ///
    /// Near-ties are settled by the random source.
    pub near_tie_band: f64,

    /// Probability that a near-tie ends as a draw.
    pub near_tie_draw_chance: f64,

    // === CASUALTIES ===
    /// Loser casualty rate at a 1:1 power ratio.
    pub loser_base_rate: f64,

    /// Upper bound on the loser casualty rate per phase.
    pub loser_rate_cap: f64,

    /// Winner casualty rate at a 1:1 power ratio; shrinks as the gap grows.
    pub winner_base_rate: f64,

    /// Casualty rate for both sides of a drawn phase.
    pub draw_attrition_rate: f64,

    /// Half-width of the uniform variance band applied to casualty rates.
    pub casualty_variance: f64,

    /// Power ratios beyond this value are treated as this value.
    pub max_power_ratio: f64,

    /// Scale applied to casualty rates of raids.
    pub raid_casualty_factor: f64,

    // === TERRITORY ===
    /// Share of the defender's sectors captured by a narrow invasion win.
    pub capture_base_rate: f64,

    /// Additional capture share per unit of ground power ratio above 1.
    pub capture_rate_per_ratio: f64,

    /// Ratio excess above which capture share stops growing.
    pub capture_ratio_cap: f64,

    // === EFFECTIVENESS ===
    /// Effectiveness gained by a victorious invader (and lost by its target).
    pub invasion_victory_delta: f64,

    /// Effectiveness gained by a victorious raider (and lost by its target).
    pub raid_victory_delta: f64,

    /// Effectiveness lost by an attacker who was repelled.
    pub repelled_attacker_delta: f64,

    /// Effectiveness gained by a defender who repelled an attack.
    pub repelled_defender_delta: f64,

    /// Effectiveness lost by both sides of a drawn battle.
    pub draw_delta: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            protection_turns: 20,
            carrier_capacity: 100,
            extended_multiplier: 0.75,
            effectiveness_floor: 0.5,
            station_fortification: 2.0,
            momentum_step: 0.1,
            momentum_floor: 0.5,
            near_tie_band: 0.05,
            near_tie_draw_chance: 0.25,
            loser_base_rate: 0.15,
            loser_rate_cap: 0.8,
            winner_base_rate: 0.12,
            draw_attrition_rate: 0.1,
            casualty_variance: 0.2,
            max_power_ratio: 16.0,
            raid_casualty_factor: 0.5,
            capture_base_rate: 0.05,
            capture_rate_per_ratio: 0.05,
            capture_ratio_cap: 2.0,
            invasion_victory_delta: 5.0,
            raid_victory_delta: 2.0,
            repelled_attacker_delta: 5.0,
            repelled_defender_delta: 3.0,
            draw_delta: 1.0,
        }
    }
}

impl CombatConfig {
    /// Parses a (possibly partial) JSON config and validates it.
    ///
    /// Missing fields keep their default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::OutOfRange`] for values that fail [`Self::validate`].
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field against its permitted range.
    ///
    /// # Errors
    ///
    /// Returns the first field found out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
            if value.is_finite() && (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::OutOfRange {
                    field,
                    reason: "must be within [0, 1]",
                })
            }
        }

        fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::OutOfRange {
                    field,
                    reason: "must be finite and non-negative",
                })
            }
        }

        if self.carrier_capacity == 0 {
            return Err(ConfigError::OutOfRange {
                field: "carrier_capacity",
                reason: "must be at least 1",
            });
        }
        if !(self.extended_multiplier > 0.0 && self.extended_multiplier < 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "extended_multiplier",
                reason: "must be within (0, 1)",
            });
        }
        if !(self.max_power_ratio.is_finite() && self.max_power_ratio >= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "max_power_ratio",
                reason: "must be finite and at least 1",
            });
        }

        unit_interval("effectiveness_floor", self.effectiveness_floor)?;
        unit_interval("momentum_floor", self.momentum_floor)?;
        unit_interval("near_tie_band", self.near_tie_band)?;
        unit_interval("near_tie_draw_chance", self.near_tie_draw_chance)?;
        unit_interval("loser_base_rate", self.loser_base_rate)?;
        unit_interval("loser_rate_cap", self.loser_rate_cap)?;
        unit_interval("winner_base_rate", self.winner_base_rate)?;
        unit_interval("draw_attrition_rate", self.draw_attrition_rate)?;
        unit_interval("casualty_variance", self.casualty_variance)?;
        unit_interval("raid_casualty_factor", self.raid_casualty_factor)?;
        unit_interval("capture_base_rate", self.capture_base_rate)?;
        unit_interval("capture_rate_per_ratio", self.capture_rate_per_ratio)?;

        non_negative("station_fortification", self.station_fortification)?;
        non_negative("momentum_step", self.momentum_step)?;
        non_negative("capture_ratio_cap", self.capture_ratio_cap)?;
        non_negative("invasion_victory_delta", self.invasion_victory_delta)?;
        non_negative("raid_victory_delta", self.raid_victory_delta)?;
        non_negative("repelled_attacker_delta", self.repelled_attacker_delta)?;
        non_negative("repelled_defender_delta", self.repelled_defender_delta)?;
        non_negative("draw_delta", self.draw_delta)?;

        Ok(())
    }

    /// Maps army effectiveness in [0, 100] to a power factor.
    ///
    /// Values outside the range are clamped first.
    #[must_use]
    pub fn effectiveness_factor(&self, effectiveness: f64) -> f64 {
        let e = if effectiveness.is_finite() {
            effectiveness.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.effectiveness_floor + (1.0 - self.effectiveness_floor) * e / 100.0
    }
}

//! Tunable constants of the battle formulas.
//!
//! Every field has a default matching the classic rules, so a RON file only
//! needs to name the values it overrides:
//!
//! ```ron
//! (crit_multiplier: 1.5, weather_turns: 8)
//! ```

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_stage: i8,
    pub max_stage: i8,

    /// Crit denominators for stage 0, 1, 2 and 3+ (1 means guaranteed).
    pub crit_tiers: [u32; 4],
    pub crit_multiplier: f64,
    pub stab_multiplier: f64,
    pub adaptability_multiplier: f64,
    pub weather_boost: f64,
    pub weather_nerf: f64,
    /// Lowest damage roll percentage; the roll is uniform in `[min, 100]`.
    pub damage_roll_min: u8,

    pub paralysis_speed_factor: f64,
    pub full_paralysis_chance: u8,
    pub thaw_chance: u8,
    pub confusion_self_hit_chance: u8,
    pub confusion_self_hit_power: u16,
    pub confusion_turns: (u8, u8),
    pub sleep_turns: (u8, u8),
    pub infatuation_chance: u8,
    pub quick_claw_chance: u8,

    pub struggle_power: u16,
    /// Struggle recoil is max HP divided by this.
    pub struggle_recoil_divisor: u16,

    pub burn_divisor: u16,
    pub poison_divisor: u16,
    /// Toxic deals `counter / toxic_divisor` of max HP.
    pub toxic_divisor: u16,
    pub leech_seed_divisor: u16,
    pub bind_divisor: u16,
    pub weather_damage_divisor: u16,
    pub leftovers_divisor: u16,
    pub ingrain_divisor: u16,

    pub weather_turns: u8,
    pub screen_turns: u8,
    pub mist_turns: u8,
    pub safeguard_turns: u8,
    pub room_turns: u8,
    pub sport_turns: u8,
    pub taunt_turns: u8,
    pub encore_turns: u8,
    pub disable_turns: u8,
    pub heal_block_turns: u8,
    pub bind_turns: (u8, u8),
    pub perish_count: u8,
    pub max_spikes_layers: u8,
    pub max_stockpile: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_stage: -6,
            max_stage: 6,
            crit_tiers: [16, 8, 2, 1],
            crit_multiplier: 2.0,
            stab_multiplier: 1.5,
            adaptability_multiplier: 2.0,
            weather_boost: 1.5,
            weather_nerf: 0.5,
            damage_roll_min: 85,
            paralysis_speed_factor: 0.5,
            full_paralysis_chance: 25,
            thaw_chance: 20,
            confusion_self_hit_chance: 33,
            confusion_self_hit_power: 40,
            confusion_turns: (2, 5),
            sleep_turns: (2, 5),
            infatuation_chance: 50,
            quick_claw_chance: 20,
            struggle_power: 50,
            struggle_recoil_divisor: 4,
            burn_divisor: 16,
            poison_divisor: 8,
            toxic_divisor: 16,
            leech_seed_divisor: 8,
            bind_divisor: 16,
            weather_damage_divisor: 16,
            leftovers_divisor: 16,
            ingrain_divisor: 16,
            weather_turns: 5,
            screen_turns: 5,
            mist_turns: 5,
            safeguard_turns: 5,
            room_turns: 5,
            sport_turns: 5,
            taunt_turns: 3,
            encore_turns: 3,
            disable_turns: 4,
            heal_block_turns: 5,
            bind_turns: (2, 5),
            perish_count: 3,
            max_spikes_layers: 3,
            max_stockpile: 3,
        }
    }
}

impl EngineConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            ron::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_stage >= 0 || self.max_stage <= 0 {
            return Err(ConfigError::Invalid(format!(
                "stage bounds must straddle zero, got {}..={}",
                self.min_stage, self.max_stage
            )));
        }
        if self.crit_tiers.iter().any(|&tier| tier == 0) {
            return Err(ConfigError::Invalid("crit tiers must be non-zero".to_string()));
        }
        if self.damage_roll_min == 0 || self.damage_roll_min > 100 {
            return Err(ConfigError::Invalid(format!(
                "damage roll floor must be in 1..=100, got {}",
                self.damage_roll_min
            )));
        }
        let divisors = [
            self.struggle_recoil_divisor,
            self.burn_divisor,
            self.poison_divisor,
            self.toxic_divisor,
            self.leech_seed_divisor,
            self.bind_divisor,
            self.weather_damage_divisor,
            self.leftovers_divisor,
            self.ingrain_divisor,
        ];
        if divisors.contains(&0) {
            return Err(ConfigError::Invalid("HP divisors must be non-zero".to_string()));
        }
        for (name, (lo, hi)) in [
            ("confusion_turns", self.confusion_turns),
            ("sleep_turns", self.sleep_turns),
            ("bind_turns", self.bind_turns),
        ] {
            if lo > hi {
                return Err(ConfigError::Invalid(format!("{} range is empty", name)));
            }
        }
        Ok(())
    }

    /// Crit denominator for an accumulated crit stage.
    pub fn crit_denominator(&self, stage: u8) -> u32 {
        self.crit_tiers[usize::from(stage).min(self.crit_tiers.len() - 1)]
    }
}

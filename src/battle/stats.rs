use crate::battle::combatant::BattlePokemon;
use crate::battle::field::{Field, FieldEffect};
use crate::battle::state::{RollKind, TurnRng};
use crate::config::EngineConfig;
use crate::pokemon::StatusCondition;
use schema::{Ability, DamageKind, HeldItem, MoveCategory, MoveData, StatType, Vanish, WeatherKind};

/// Calculate effective attack stat including stat stages, burn, abilities and items.
///
/// On a critical hit a negative stage is ignored.
pub fn effective_attack(pokemon: &BattlePokemon, category: MoveCategory, critical: bool) -> u16 {
    let (base_attack, stat) = match category {
        MoveCategory::Physical => (pokemon.stats.atk, StatType::Atk),
        MoveCategory::Special => (pokemon.stats.sp_atk, StatType::SpAtk),
        MoveCategory::Status => return 0,
    };

    let mut stage = pokemon.stage(stat);
    if critical && stage < 0 {
        stage = 0;
    }
    let mut attack = apply_stat_stage_multiplier(base_attack, stage) as u32;

    if category == MoveCategory::Physical {
        if pokemon.ability == Ability::HugePower {
            attack *= 2;
        }
        if pokemon.item == Some(HeldItem::ChoiceBand) {
            attack = attack * 3 / 2;
        }
        match (pokemon.ability, pokemon.status) {
            (Ability::Guts, Some(_)) => attack = attack * 3 / 2,
            (_, Some(StatusCondition::Burn)) => attack /= 2,
            _ => {}
        }
    }

    attack.clamp(1, u16::MAX as u32) as u16
}

/// Calculate effective defense stat including stat stages.
///
/// On a critical hit a positive stage is ignored.
pub fn effective_defense(pokemon: &BattlePokemon, category: MoveCategory, critical: bool) -> u16 {
    let (base_defense, stat) = match category {
        MoveCategory::Physical => (pokemon.stats.def, StatType::Def),
        MoveCategory::Special => (pokemon.stats.sp_def, StatType::SpDef),
        MoveCategory::Status => return 1,
    };

    let mut stage = pokemon.stage(stat);
    if critical && stage > 0 {
        stage = 0;
    }
    apply_stat_stage_multiplier(base_defense, stage).max(1)
}

/// Calculate effective speed including stat stages, paralysis and weather abilities.
pub fn effective_speed(pokemon: &BattlePokemon, field: &Field, config: &EngineConfig) -> u16 {
    let mut speed = apply_stat_stage_multiplier(pokemon.stats.speed, pokemon.stage(StatType::Spe)) as f64;

    if matches!(pokemon.status, Some(StatusCondition::Paralysis)) {
        speed *= config.paralysis_speed_factor;
    }

    match (pokemon.ability, field.weather_kind()) {
        (Ability::SwiftSwim, WeatherKind::Rain) | (Ability::Chlorophyll, WeatherKind::Sun) => speed *= 2.0,
        _ => {}
    }

    speed.floor().clamp(0.0, u16::MAX as f64) as u16
}

/// Whether a move can reach a target hidden by Fly, Dig, Dive or Bounce.
pub fn hits_vanished(move_id: &str, vanish: Vanish) -> bool {
    match vanish {
        Vanish::Sky => matches!(move_id, "gust" | "twister" | "thunder" | "sky-uppercut"),
        Vanish::Underground => matches!(move_id, "earthquake" | "magnitude"),
        Vanish::Underwater => matches!(move_id, "surf" | "whirlpool"),
    }
}

/// Calculate if a move hits based on accuracy, evasion, and move accuracy.
/// Returns true if the move hits, false if it misses.
pub fn move_hits(
    attacker: &BattlePokemon,
    defender: &BattlePokemon,
    move_data: &MoveData,
    locked_on: bool,
    field: &Field,
    rng: &mut TurnRng,
) -> bool {
    let metadata = &move_data.metadata;

    if move_data.effect.damage_kind == DamageKind::Ohko {
        if defender.level > attacker.level {
            return false;
        }
        let chance = 30 + (attacker.level - defender.level) as u32;
        return rng.next_outcome(RollKind::Accuracy) as u32 <= chance.min(100);
    }

    // If move has no accuracy value, it never misses (like Swift)
    let Some(base_accuracy) = metadata.accuracy else {
        return true;
    };
    if locked_on {
        return true;
    }

    // Foresight and Miracle Eye strip positive evasion
    let mut evasion_stage = defender.stage(StatType::Eva);
    if (defender.volatile.foresight || defender.volatile.miracle_eye) && evasion_stage > 0 {
        evasion_stage = 0;
    }
    let adjusted_stage = (attacker.stage(StatType::Acc) - evasion_stage).clamp(-6, 6);

    let mut accuracy = base_accuracy as f64 * apply_accuracy_stage_multiplier(adjusted_stage);
    if field.is_active(FieldEffect::Gravity) {
        accuracy = accuracy * 5.0 / 3.0;
    }
    let threshold = (accuracy.floor() as u32).clamp(1, 100);

    rng.next_outcome(RollKind::Accuracy) as u32 <= threshold
}

/// Apply accuracy/evasion stage multipliers according to Pokemon formula.
/// Uses different multipliers than regular stats.
/// Stages range from -6 to +6.
pub fn apply_accuracy_stage_multiplier(stage: i8) -> f64 {
    let stage = stage.clamp(-6, 6) as f64;
    if stage >= 0.0 {
        (3.0 + stage) / 3.0
    } else {
        3.0 / (3.0 - stage)
    }
}

/// Apply stat stage multipliers according to Pokemon formula.
/// Negative stages: (2 / (2 + |stage|))
/// Positive stages: ((2 + stage) / 2)
pub fn apply_stat_stage_multiplier(base_stat: u16, stage: i8) -> u16 {
    let clamped_stage = stage.clamp(-6, 6);

    if clamped_stage == 0 {
        return base_stat;
    }

    let (numerator, denominator) = if clamped_stage < 0 {
        (2u32, 2 + (-clamped_stage) as u32)
    } else {
        (2 + clamped_stage as u32, 2u32)
    };

    (base_stat as u32 * numerator / denominator) as u16
}

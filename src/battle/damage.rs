use crate::battle::combatant::BattlePokemon;
use crate::battle::conditions::SideConditions;
use crate::battle::field::{Field, FieldEffect};
use crate::battle::state::{RollKind, TurnRng};
use crate::battle::stats::{effective_attack, effective_defense, hits_vanished};
use crate::config::EngineConfig;
use crate::pokemon::StatusCondition;
use schema::{Ability, DamageKind, MoveCategory, MoveData, MoveFlag, PokemonType, WeatherKind};

/// Everything the damage formula reads. Nothing in here is mutated.
#[derive(Debug, Clone, Copy)]
pub struct DamageContext<'a> {
    pub attacker: &'a BattlePokemon,
    pub defender: &'a BattlePokemon,
    pub move_data: &'a MoveData,
    pub field: &'a Field,
    /// Screens protecting the defender.
    pub defender_side: &'a SideConditions,
    pub config: &'a EngineConfig,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageResult {
    pub damage: u16,
    pub type_multiplier: f32,
    pub critical: bool,
}

impl DamageResult {
    pub const NONE: DamageResult = DamageResult {
        damage: 0,
        type_multiplier: 1.0,
        critical: false,
    };

    const IMMUNE: DamageResult = DamageResult {
        damage: 0,
        type_multiplier: 0.0,
        critical: false,
    };

    pub fn is_immune(&self) -> bool {
        self.type_multiplier == 0.0
    }
}

/// `floor(((2L/5 + 2) * power * atk / def) / 50) + 2`, defense clamped to 1.
pub fn base_damage(level: u8, power: u32, attack: u16, defense: u16) -> u32 {
    let level_factor = 2 * level as u32 / 5 + 2;
    level_factor * power * attack as u32 / defense.max(1) as u32 / 50 + 2
}

/// Compute the damage one hit of `move_data` would deal. Draws crit and roll from `rng`.
pub fn calculate_damage(ctx: &DamageContext, rng: &mut TurnRng) -> DamageResult {
    let effect = &ctx.move_data.effect;
    if !effect.damage {
        return DamageResult::NONE;
    }

    let type_multiplier = type_multiplier(ctx);

    if let Some(fixed) = special_damage(ctx, type_multiplier, rng) {
        return fixed;
    }

    let power = modified_power(ctx);
    if power == 0 {
        return DamageResult::NONE;
    }
    if type_multiplier == 0.0 {
        return DamageResult::IMMUNE;
    }

    let critical = roll_critical(ctx.attacker, ctx.defender, ctx.move_data, ctx.config, rng);
    let category = ctx.move_data.metadata.category;
    let attack = effective_attack(ctx.attacker, category, critical);
    let defense = effective_defense(ctx.defender, category, critical);
    let base = base_damage(ctx.attacker.level, power, attack, defense);

    let stab = stab_multiplier(ctx);
    let weather = weather_multiplier(ctx);
    let other = other_multiplier(ctx, critical, type_multiplier);
    let roll = rng.next_in_range(RollKind::DamageRoll, ctx.config.damage_roll_min as u32, 100);
    let crit = if critical { ctx.config.crit_multiplier } else { 1.0 };

    let raw = base as f64 * stab * type_multiplier as f64 * weather * other * (roll as f64 / 100.0) * crit;
    let damage = (raw.floor() as u32).clamp(1, u16::MAX as u32) as u16;

    DamageResult {
        damage,
        type_multiplier,
        critical,
    }
}

/// Type chart product with Foresight, Miracle Eye, Levitate and Gravity applied.
pub fn type_multiplier(ctx: &DamageContext) -> f32 {
    let move_type = ctx.move_data.metadata.move_type;
    if move_type == PokemonType::Typeless {
        return 1.0;
    }
    let defender = ctx.defender;
    let grounded = ctx.field.is_active(FieldEffect::Gravity);

    if move_type == PokemonType::Ground && defender.ability == Ability::Levitate && !grounded {
        return 0.0;
    }

    defender
        .effective_types()
        .iter()
        .map(|&defending| {
            let multiplier = PokemonType::type_effectiveness(move_type, defending);
            if multiplier != 0.0 {
                return multiplier;
            }
            let revealed = match (move_type, defending) {
                (PokemonType::Normal | PokemonType::Fighting, PokemonType::Ghost) => {
                    defender.volatile.foresight
                }
                (PokemonType::Psychic, PokemonType::Dark) => defender.volatile.miracle_eye,
                (PokemonType::Ground, PokemonType::Flying) => grounded,
                _ => false,
            };
            if revealed {
                1.0
            } else {
                0.0
            }
        })
        .product()
}

/// Damage kinds that skip the generic formula. Type immunity still applies.
fn special_damage(ctx: &DamageContext, type_multiplier: f32, rng: &mut TurnRng) -> Option<DamageResult> {
    let attacker = ctx.attacker;
    let defender = ctx.defender;
    let damage = match ctx.move_data.effect.damage_kind {
        DamageKind::Standard | DamageKind::SpitUp => return None,
        DamageKind::Fixed(amount) => amount,
        DamageKind::LevelBased => attacker.level as u16,
        DamageKind::Ohko => defender.current_hp(),
        DamageKind::PercentCurrentHp(percent) => {
            (defender.current_hp() as u32 * percent as u32 / 100).max(1) as u16
        }
        DamageKind::VariableLevel => {
            let factor = rng.next_in_range(RollKind::Psywave, 50, 150);
            (attacker.level as u32 * factor / 100).max(1) as u16
        }
    };

    if type_multiplier == 0.0 {
        return Some(DamageResult::IMMUNE);
    }
    Some(DamageResult {
        damage,
        type_multiplier: 1.0,
        critical: false,
    })
}

/// Roll for a critical hit. Tier comes from move bonus, Focus Energy, Super Luck and items.
pub fn roll_critical(
    attacker: &BattlePokemon,
    defender: &BattlePokemon,
    move_data: &MoveData,
    config: &EngineConfig,
    rng: &mut TurnRng,
) -> bool {
    if defender.ability.blocks_critical_hits() {
        return false;
    }
    let mut stage = move_data.effect.crit_stage_bonus;
    if attacker.volatile.focus_energy {
        stage += 2;
    }
    if attacker.ability == Ability::SuperLuck {
        stage += 1;
    }
    if attacker.item.is_some_and(|item| item.raises_crit_stage()) {
        stage += 1;
    }
    let denominator = config.crit_denominator(stage).max(1);
    rng.next_in_range(RollKind::CriticalHit, 1, denominator) == 1
}

fn stab_multiplier(ctx: &DamageContext) -> f64 {
    let move_type = ctx.move_data.metadata.move_type;
    if move_type == PokemonType::Typeless || !ctx.attacker.has_type(move_type) {
        return 1.0;
    }
    if ctx.attacker.ability == Ability::Adaptability {
        ctx.config.adaptability_multiplier
    } else {
        ctx.config.stab_multiplier
    }
}

fn weather_multiplier(ctx: &DamageContext) -> f64 {
    let config = ctx.config;
    match (ctx.field.weather_kind(), ctx.move_data.metadata.move_type) {
        (WeatherKind::Sun, PokemonType::Fire) | (WeatherKind::Rain, PokemonType::Water) => config.weather_boost,
        (WeatherKind::Sun, PokemonType::Water) | (WeatherKind::Rain, PokemonType::Fire) => config.weather_nerf,
        _ => 1.0,
    }
}

/// Screens, sandstorm Sp. Def bonus, then defender and attacker abilities, in that order.
fn other_multiplier(ctx: &DamageContext, critical: bool, type_multiplier: f32) -> f64 {
    let category = ctx.move_data.metadata.category;
    let move_type = ctx.move_data.metadata.move_type;
    let defender = ctx.defender;
    let mut multiplier = 1.0;

    if !critical {
        let screened = match category {
            MoveCategory::Physical => ctx.defender_side.reflect_turns > 0,
            MoveCategory::Special => ctx.defender_side.light_screen_turns > 0,
            MoveCategory::Status => false,
        };
        if screened {
            multiplier *= 0.5;
        }
    }

    if ctx.field.weather_kind() == WeatherKind::Sandstorm
        && category == MoveCategory::Special
        && defender.has_type(PokemonType::Rock)
    {
        multiplier *= 2.0 / 3.0;
    }

    if defender.ability == Ability::ThickFat && matches!(move_type, PokemonType::Fire | PokemonType::Ice) {
        multiplier *= 0.5;
    }
    if matches!(defender.ability, Ability::Filter | Ability::SolidRock) && type_multiplier > 1.0 {
        multiplier *= 0.75;
    }
    if ctx.attacker.ability == Ability::TintedLens && type_multiplier < 1.0 {
        multiplier *= 2.0;
    }

    multiplier
}

// --- Power modifier chain ---
// Applied in order. New modifiers go at the end.

type PowerModifier = fn(u32, &DamageContext) -> u32;

const POWER_MODIFIERS: &[PowerModifier] = &[
    stockpile_power,
    facade_power,
    momentum_power,
    weather_move_power,
    vanished_target_power,
    charge_power,
    helping_hand_power,
    sport_power,
    technician_power,
    iron_fist_power,
    pinch_ability_power,
];

/// Base power after every modifier in the chain.
pub fn modified_power(ctx: &DamageContext) -> u32 {
    POWER_MODIFIERS
        .iter()
        .fold(ctx.move_data.metadata.power as u32, |power, modifier| modifier(power, ctx))
}

fn move_id<'a>(ctx: &'a DamageContext) -> &'a str {
    ctx.move_data.metadata.id.as_str()
}

fn stockpile_power(power: u32, ctx: &DamageContext) -> u32 {
    if ctx.move_data.effect.damage_kind == DamageKind::SpitUp {
        100 * ctx.attacker.volatile.stockpile as u32
    } else {
        power
    }
}

fn facade_power(power: u32, ctx: &DamageContext) -> u32 {
    let statused = matches!(
        ctx.attacker.status,
        Some(StatusCondition::Burn | StatusCondition::Poison | StatusCondition::Toxic(_) | StatusCondition::Paralysis)
    );
    if move_id(ctx) == "facade" && statused {
        power * 2
    } else {
        power
    }
}

fn momentum_power(power: u32, ctx: &DamageContext) -> u32 {
    let volatile = &ctx.attacker.volatile;
    match move_id(ctx) {
        "rollout" | "ice-ball" => {
            let doubled = power << volatile.rollout_count.min(4);
            if volatile.defense_curl {
                doubled * 2
            } else {
                doubled
            }
        }
        "fury-cutter" => power << volatile.fury_cutter_count.min(4),
        _ => power,
    }
}

fn weather_move_power(power: u32, ctx: &DamageContext) -> u32 {
    let weather = ctx.field.weather_kind();
    match move_id(ctx) {
        "solar-beam" if matches!(weather, WeatherKind::Rain | WeatherKind::Sandstorm | WeatherKind::Hail) => {
            power / 2
        }
        "weather-ball" if weather != WeatherKind::None => power * 2,
        _ => power,
    }
}

fn vanished_target_power(power: u32, ctx: &DamageContext) -> u32 {
    match ctx.defender.volatile.vanished {
        Some(vanish) if hits_vanished(move_id(ctx), vanish) => power * 2,
        _ => power,
    }
}

fn charge_power(power: u32, ctx: &DamageContext) -> u32 {
    if ctx.attacker.volatile.charged && ctx.move_data.metadata.move_type == PokemonType::Electric {
        power * 2
    } else {
        power
    }
}

fn helping_hand_power(power: u32, ctx: &DamageContext) -> u32 {
    if ctx.attacker.volatile.helping_hand {
        power * 3 / 2
    } else {
        power
    }
}

fn sport_power(power: u32, ctx: &DamageContext) -> u32 {
    match ctx.move_data.metadata.move_type {
        PokemonType::Electric if ctx.field.is_active(FieldEffect::MudSport) => power / 2,
        PokemonType::Fire if ctx.field.is_active(FieldEffect::WaterSport) => power / 2,
        _ => power,
    }
}

fn technician_power(power: u32, ctx: &DamageContext) -> u32 {
    if ctx.attacker.ability == Ability::Technician && power <= 60 {
        power * 3 / 2
    } else {
        power
    }
}

fn iron_fist_power(power: u32, ctx: &DamageContext) -> u32 {
    if ctx.attacker.ability == Ability::IronFist && ctx.move_data.metadata.has_flag(MoveFlag::Punch) {
        power * 6 / 5
    } else {
        power
    }
}

fn pinch_ability_power(power: u32, ctx: &DamageContext) -> u32 {
    let boosted_type = match ctx.attacker.ability {
        Ability::Blaze => PokemonType::Fire,
        Ability::Torrent => PokemonType::Water,
        Ability::Overgrow => PokemonType::Grass,
        Ability::Swarm => PokemonType::Bug,
        _ => return power,
    };
    let attacker = ctx.attacker;
    let in_pinch = attacker.current_hp() as u32 * 3 <= attacker.max_hp() as u32;
    if in_pinch && ctx.move_data.metadata.move_type == boosted_type {
        power * 3 / 2
    } else {
        power
    }
}

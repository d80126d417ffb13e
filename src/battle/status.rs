use crate::battle::conditions::VolatileKind;
use crate::battle::damage::base_damage;
use crate::battle::items;
use crate::battle::state::{
    ActionFailureReason, BattleEvent, BattleState, CombatantRef, DamageCause, RollKind, StatusFailure, TurnRng,
};
use crate::battle::stats::{effective_attack, effective_defense};
use crate::pokemon::StatusCondition;
use schema::{Ability, MoveCategory, PokemonType, StatusType, Vanish, WeatherKind};
use tracing::debug;

/// Gate an actor before it moves: sleep, freeze, recharge, flinch, paralysis,
/// infatuation, then Bide's storing turns.
///
/// Returns true when the action is blocked. Confusion is checked separately.
pub fn check_pre_action(
    state: &mut BattleState,
    who: CombatantRef,
    rng: &mut TurnRng,
) -> (bool, Vec<BattleEvent>) {
    let mut events = Vec::new();
    let config = state.config.clone();
    let infatuation_source_alive = state
        .pokemon(who)
        .and_then(|p| p.volatile.infatuated_with)
        .map(|source| state.is_alive(source));

    let Some(pokemon) = state.pokemon_mut(who) else {
        return (true, events);
    };
    if pokemon.is_fainted() {
        return (true, events);
    }
    let name = pokemon.name.clone();
    let blocked = |reason| BattleEvent::ActionPrevented {
        pokemon: name.clone(),
        reason,
    };

    match pokemon.status {
        Some(StatusCondition::Sleep(turns)) => {
            let remaining = turns.saturating_sub(1);
            if remaining == 0 {
                pokemon.cure_status();
                pokemon.volatile.nightmare = false;
                events.push(BattleEvent::StatusCured {
                    target: name.clone(),
                    status: StatusType::Sleep,
                });
            } else {
                pokemon.status = Some(StatusCondition::Sleep(remaining));
                events.push(blocked(ActionFailureReason::IsAsleep));
                return (true, events);
            }
        }
        Some(StatusCondition::Freeze) => {
            if rng.chance(RollKind::Thaw, config.thaw_chance) {
                pokemon.cure_status();
                events.push(BattleEvent::StatusCured {
                    target: name.clone(),
                    status: StatusType::Freeze,
                });
            } else {
                events.push(blocked(ActionFailureReason::IsFrozen));
                return (true, events);
            }
        }
        _ => {}
    }

    if pokemon.volatile.must_recharge {
        pokemon.volatile.must_recharge = false;
        events.push(blocked(ActionFailureReason::MustRecharge));
        return (true, events);
    }

    if pokemon.volatile.flinched {
        pokemon.volatile.flinched = false;
        events.push(blocked(ActionFailureReason::Flinched));
        return (true, events);
    }

    if matches!(pokemon.status, Some(StatusCondition::Paralysis))
        && rng.chance(RollKind::FullParalysis, config.full_paralysis_chance)
    {
        events.push(blocked(ActionFailureReason::IsParalyzed));
        return (true, events);
    }

    match infatuation_source_alive {
        Some(true) => {
            if rng.chance(RollKind::Infatuation, config.infatuation_chance) {
                events.push(blocked(ActionFailureReason::Infatuated));
                return (true, events);
            }
        }
        Some(false) => {
            pokemon.volatile.infatuated_with = None;
            events.push(BattleEvent::VolatileEnded {
                target: name.clone(),
                condition: VolatileKind::Infatuation,
            });
        }
        None => {}
    }

    if let Some(bide) = pokemon.volatile.bide.as_mut() {
        if bide.turns_remaining > 0 {
            bide.turns_remaining -= 1;
            events.push(blocked(ActionFailureReason::StoringEnergy));
            return (true, events);
        }
    }

    (false, events)
}

/// Count confusion down and roll for a self-hit.
///
/// A self-hit is a typeless 40-power physical attack against the user's own
/// Defense, with no random roll and no critical hit. Returns true when the
/// action is replaced by the self-hit.
pub fn check_confusion(state: &mut BattleState, who: CombatantRef, rng: &mut TurnRng) -> (bool, Vec<BattleEvent>) {
    let mut events = Vec::new();
    let config = state.config.clone();
    let Some(pokemon) = state.pokemon_mut(who) else {
        return (false, events);
    };
    if pokemon.is_fainted() || pokemon.volatile.confusion_turns == 0 {
        return (false, events);
    }

    pokemon.volatile.confusion_turns -= 1;
    if pokemon.volatile.confusion_turns == 0 {
        events.push(BattleEvent::VolatileEnded {
            target: pokemon.name.clone(),
            condition: VolatileKind::Confusion,
        });
        return (false, events);
    }

    if !rng.chance(RollKind::ConfusionSelfHit, config.confusion_self_hit_chance) {
        return (false, events);
    }

    let attack = effective_attack(pokemon, MoveCategory::Physical, false);
    let defense = effective_defense(pokemon, MoveCategory::Physical, false);
    let damage = base_damage(pokemon.level, config.confusion_self_hit_power as u32, attack, defense);
    events.push(BattleEvent::ActionPrevented {
        pokemon: pokemon.name.clone(),
        reason: ActionFailureReason::HurtItselfInConfusion,
    });
    let damage = damage.min(u16::MAX as u32) as u16;
    state.damage(who, damage, DamageCause::Confusion, &mut events);
    items::after_damage(state, who, &mut events);
    (true, events)
}

/// Why a major status cannot land on `target`, if it cannot.
pub fn status_failure(state: &BattleState, target: CombatantRef, status: StatusType) -> Option<StatusFailure> {
    let pokemon = state.pokemon(target)?;

    if let Some(current) = pokemon.status {
        let same = current.kind() == status
            || matches!(
                (current.kind(), status),
                (StatusType::Poison, StatusType::Toxic) | (StatusType::Toxic, StatusType::Poison)
            );
        return Some(if same {
            StatusFailure::AlreadyAfflicted
        } else {
            StatusFailure::HasOtherStatus
        });
    }

    let type_immune = match status {
        StatusType::Burn => pokemon.has_type(PokemonType::Fire),
        StatusType::Poison | StatusType::Toxic => {
            pokemon.has_type(PokemonType::Poison) || pokemon.has_type(PokemonType::Steel)
        }
        StatusType::Freeze => pokemon.has_type(PokemonType::Ice),
        StatusType::Paralysis | StatusType::Sleep => false,
    };
    if type_immune {
        return Some(StatusFailure::TypeImmune);
    }

    let ability_immune = matches!(
        (pokemon.ability, status),
        (Ability::Insomnia, StatusType::Sleep)
            | (Ability::Limber, StatusType::Paralysis)
            | (Ability::WaterVeil, StatusType::Burn)
            | (Ability::Immunity, StatusType::Poison | StatusType::Toxic)
            | (Ability::MagmaArmor, StatusType::Freeze)
    );
    if ability_immune {
        return Some(StatusFailure::AbilityImmune);
    }

    if state.sides[target.side].conditions.safeguard_turns > 0 {
        return Some(StatusFailure::Safeguard);
    }

    None
}

/// Inflict a major status, enforcing immunities and "already afflicted".
pub fn apply_status_effect(
    state: &mut BattleState,
    target: CombatantRef,
    status: StatusType,
    rng: &mut TurnRng,
) -> Vec<BattleEvent> {
    let mut events = Vec::new();
    if !state.is_alive(target) {
        return events;
    }

    if let Some(reason) = status_failure(state, target, status) {
        events.push(BattleEvent::StatusFailed {
            target: state.name_of(target),
            status,
            reason,
        });
        return events;
    }

    let (min_sleep, max_sleep) = state.config.sleep_turns;
    let condition = match status {
        StatusType::Burn => StatusCondition::Burn,
        StatusType::Poison => StatusCondition::Poison,
        StatusType::Toxic => StatusCondition::Toxic(1),
        StatusType::Paralysis => StatusCondition::Paralysis,
        StatusType::Freeze => StatusCondition::Freeze,
        StatusType::Sleep => {
            let turns = rng.next_in_range(RollKind::SleepDuration, min_sleep as u32, max_sleep as u32);
            StatusCondition::Sleep(turns as u8)
        }
    };

    if let Some(pokemon) = state.pokemon_mut(target) {
        pokemon.set_status(condition);
        debug!(pokemon = %pokemon.name, ?condition, "status applied");
        events.push(BattleEvent::StatusApplied {
            target: pokemon.name.clone(),
            status,
        });
    }
    items::after_status(state, target, &mut events);
    events
}

/// The end-of-turn phase: weather damage, then per combatant wish, yawn,
/// perish count, ingrain, leech seed, status damage, bind, curse, nightmare
/// and Leftovers, then every timer.
pub fn end_of_turn_effects(state: &mut BattleState, rng: &mut TurnRng) -> Vec<BattleEvent> {
    let mut events = Vec::new();

    apply_weather_damage(state, &mut events);

    for who in all_positions(state) {
        resolve_wish(state, who, &mut events);
        if !state.is_alive(who) {
            continue;
        }
        resolve_yawn(state, who, rng, &mut events);
        resolve_perish_count(state, who, &mut events);
        resolve_ingrain(state, who, &mut events);
        resolve_leech_seed(state, who, &mut events);
        apply_status_damage(state, who, &mut events);
        resolve_bind(state, who, &mut events);
        resolve_curse_and_nightmare(state, who, &mut events);
        items::end_of_turn(state, who, &mut events);
        items::after_damage(state, who, &mut events);
    }

    tick_timers(state, &mut events);
    events
}

fn all_positions(state: &BattleState) -> Vec<CombatantRef> {
    (0..2)
        .flat_map(|side| (0..state.sides[side].active.len()).map(move |slot| CombatantRef::new(side, slot)))
        .collect()
}

fn apply_weather_damage(state: &mut BattleState, events: &mut Vec<BattleEvent>) {
    let weather = state.field.weather_kind();
    if !matches!(weather, WeatherKind::Sandstorm | WeatherKind::Hail) {
        return;
    }
    let divisor = state.config.weather_damage_divisor;
    for who in state.all_active_refs() {
        let Some(pokemon) = state.pokemon(who) else {
            continue;
        };
        let immune = match weather {
            WeatherKind::Sandstorm => [PokemonType::Rock, PokemonType::Ground, PokemonType::Steel]
                .iter()
                .any(|t| pokemon.has_type(*t)),
            _ => pokemon.has_type(PokemonType::Ice),
        };
        let hidden = matches!(
            pokemon.volatile.vanished,
            Some(Vanish::Underground | Vanish::Underwater)
        );
        if immune || hidden {
            continue;
        }
        let amount = pokemon.fraction_of_max(divisor);
        state.damage(who, amount, DamageCause::Weather(weather), events);
    }
}

fn resolve_wish(state: &mut BattleState, who: CombatantRef, events: &mut Vec<BattleEvent>) {
    let wishes = &mut state.sides[who.side].conditions.wishes;
    let mut granted = None;
    wishes.retain_mut(|wish| {
        if wish.slot != who.slot {
            return true;
        }
        wish.turns_remaining = wish.turns_remaining.saturating_sub(1);
        if wish.turns_remaining == 0 {
            granted = Some(wish.amount);
            false
        } else {
            true
        }
    });
    if let Some(amount) = granted {
        if state.is_alive(who) {
            state.heal(who, amount, events);
        }
    }
}

fn resolve_yawn(state: &mut BattleState, who: CombatantRef, rng: &mut TurnRng, events: &mut Vec<BattleEvent>) {
    let Some(pokemon) = state.pokemon_mut(who) else {
        return;
    };
    if pokemon.volatile.yawn_turns == 0 {
        return;
    }
    pokemon.volatile.yawn_turns -= 1;
    if pokemon.volatile.yawn_turns == 0 && pokemon.status.is_none() {
        events.extend(apply_status_effect(state, who, StatusType::Sleep, rng));
    }
}

fn resolve_perish_count(state: &mut BattleState, who: CombatantRef, events: &mut Vec<BattleEvent>) {
    let Some(pokemon) = state.pokemon_mut(who) else {
        return;
    };
    let Some(count) = pokemon.volatile.perish_count else {
        return;
    };
    let count = count.saturating_sub(1);
    pokemon.volatile.perish_count = Some(count);
    events.push(BattleEvent::PerishCount {
        target: pokemon.name.clone(),
        count,
    });
    if count == 0 {
        state.faint(who, events);
    }
}

fn resolve_ingrain(state: &mut BattleState, who: CombatantRef, events: &mut Vec<BattleEvent>) {
    let divisor = state.config.ingrain_divisor;
    let Some(pokemon) = state.pokemon(who) else {
        return;
    };
    if pokemon.volatile.ingrained && !pokemon.is_full_hp() {
        let amount = pokemon.fraction_of_max(divisor);
        state.heal(who, amount, events);
    }
}

fn resolve_leech_seed(state: &mut BattleState, who: CombatantRef, events: &mut Vec<BattleEvent>) {
    let divisor = state.config.leech_seed_divisor;
    let Some(pokemon) = state.pokemon(who) else {
        return;
    };
    let Some(source) = pokemon.volatile.leech_seed_source else {
        return;
    };
    let amount = pokemon.fraction_of_max(divisor);
    let drained = state.damage(who, amount, DamageCause::Condition(VolatileKind::LeechSeed), events);
    if drained > 0 && state.is_alive(source) {
        state.heal(source, drained, events);
    }
}

fn apply_status_damage(state: &mut BattleState, who: CombatantRef, events: &mut Vec<BattleEvent>) {
    let config = state.config.clone();
    let Some(pokemon) = state.pokemon_mut(who) else {
        return;
    };
    let (amount, kind) = match pokemon.status {
        Some(StatusCondition::Burn) => (pokemon.fraction_of_max(config.burn_divisor), StatusType::Burn),
        Some(StatusCondition::Poison) => (pokemon.fraction_of_max(config.poison_divisor), StatusType::Poison),
        Some(StatusCondition::Toxic(counter)) => {
            let amount = (pokemon.max_hp() as u32 * counter.max(1) as u32 / config.toxic_divisor.max(1) as u32)
                .max(1) as u16;
            pokemon.status = Some(StatusCondition::Toxic(counter.saturating_add(1)));
            (amount, StatusType::Toxic)
        }
        _ => return,
    };
    state.damage(who, amount, DamageCause::Status(kind), events);
}

fn resolve_bind(state: &mut BattleState, who: CombatantRef, events: &mut Vec<BattleEvent>) {
    let divisor = state.config.bind_divisor;
    let Some(pokemon) = state.pokemon(who) else {
        return;
    };
    let Some(bind) = pokemon.volatile.bind.as_ref() else {
        return;
    };
    if !state.is_alive(bind.source) {
        let name = pokemon.name.clone();
        if let Some(pokemon) = state.pokemon_mut(who) {
            pokemon.volatile.bind = None;
        }
        events.push(BattleEvent::VolatileEnded {
            target: name,
            condition: VolatileKind::Bind,
        });
        return;
    }
    let amount = pokemon.fraction_of_max(divisor);
    state.damage(who, amount, DamageCause::Condition(VolatileKind::Bind), events);
}

fn resolve_curse_and_nightmare(state: &mut BattleState, who: CombatantRef, events: &mut Vec<BattleEvent>) {
    let Some(pokemon) = state.pokemon(who) else {
        return;
    };
    let quarter = pokemon.fraction_of_max(4);
    let cursed = pokemon.volatile.cursed;
    let nightmare = pokemon.volatile.nightmare && pokemon.is_asleep();

    if cursed {
        state.damage(who, quarter, DamageCause::Condition(VolatileKind::Curse), events);
    }
    if nightmare && state.is_alive(who) {
        state.damage(who, quarter, DamageCause::Condition(VolatileKind::Nightmare), events);
    }
}

/// Volatile timers, side conditions, weather and rooms.
fn tick_timers(state: &mut BattleState, events: &mut Vec<BattleEvent>) {
    for who in state.all_active_refs() {
        if let Some(pokemon) = state.pokemon_mut(who) {
            let name = pokemon.name.clone();
            for condition in pokemon.volatile.tick_timers() {
                events.push(BattleEvent::VolatileEnded {
                    target: name.clone(),
                    condition,
                });
            }
            pokemon.volatile.clear_turn_flags();
        }
    }

    for side in 0..2 {
        for condition in state.sides[side].conditions.tick() {
            events.push(BattleEvent::SideConditionEnded { side, condition });
        }
    }

    if let Some(weather) = state.field.tick_weather() {
        events.push(BattleEvent::WeatherEnded { weather });
    }
    for effect in state.field.tick_effects() {
        events.push(BattleEvent::FieldEffectEnded { effect });
    }
}

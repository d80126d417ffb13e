// --- IMPORTS ---
use super::{failed, EffectContext};
use crate::battle::combatant::StageChange;
use crate::battle::conditions::{SideCondition, VolatileKind};
use crate::battle::state::{BattleEvent, BattleState, CombatantRef, DamageCause};
use schema::StatType;
use tracing::debug;

// --- STANDALONE HELPER FUNCTIONS ---

/// Move one stat stage of `who` by `stages`, clamped to the configured range.
pub fn change_stat_stage(state: &mut BattleState, who: CombatantRef, stat: StatType, stages: i8) -> Vec<BattleEvent> {
    let (min, max) = (state.config.min_stage, state.config.max_stage);
    let Some(pokemon) = state.pokemon_mut(who) else {
        return Vec::new();
    };
    let event = match pokemon.change_stage(stat, stages, min, max) {
        StageChange::Changed { old, new } => {
            debug!(pokemon = %pokemon.name, ?stat, old, new, "stat stage changed");
            BattleEvent::StatStageChanged {
                target: pokemon.name.clone(),
                stat,
                old_stage: old,
                new_stage: new,
            }
        }
        StageChange::AtLimit => BattleEvent::StatChangeAtLimit {
            target: pokemon.name.clone(),
            stat,
            rising: stages > 0,
        },
    };
    vec![event]
}

/// Mist keeps an opponent from lowering its side's stats.
pub(super) fn apply_stat_change_effect(
    state: &mut BattleState,
    ctx: &EffectContext,
    target: CombatantRef,
    stat: StatType,
    stages: i8,
) -> Vec<BattleEvent> {
    let misted = state.sides[target.side].conditions.has(SideCondition::Mist);
    if stages < 0 && ctx.against_opponent(target) && misted {
        if ctx.secondary {
            return Vec::new();
        }
        return vec![BattleEvent::StatChangeBlocked {
            target: state.name_of(target),
            stat,
            reason: "Mist prevented stat reduction".to_string(),
        }];
    }
    change_stat_stage(state, target, stat, stages)
}

pub(super) fn apply_haze_effect(state: &mut BattleState) -> Vec<BattleEvent> {
    for who in state.all_active_refs() {
        if let Some(pokemon) = state.pokemon_mut(who) {
            pokemon.reset_stages();
        }
    }
    vec![BattleEvent::StatsReset]
}

pub(super) fn apply_psych_up_effect(
    state: &mut BattleState,
    ctx: &EffectContext,
    target: CombatantRef,
) -> Vec<BattleEvent> {
    let (min, max) = (state.config.min_stage, state.config.max_stage);
    let Some(stages) = state.pokemon(target).map(|p| p.stages()) else {
        return Vec::new();
    };
    if let Some(user) = state.pokemon_mut(ctx.attacker) {
        user.set_stages(stages, min, max);
    }
    vec![BattleEvent::StatsCopied {
        user: state.name_of(ctx.attacker),
        target: state.name_of(target),
    }]
}

/// Cut HP in half to max out Attack.
pub(super) fn apply_belly_drum_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let max_stage = state.config.max_stage;
    let Some(pokemon) = state.pokemon(target) else {
        return Vec::new();
    };
    let cost = pokemon.fraction_of_max(2);
    let stage = pokemon.stage(StatType::Atk);
    if pokemon.current_hp() <= cost || stage >= max_stage {
        return failed(state, target);
    }

    let mut events = Vec::new();
    state.damage(target, cost, DamageCause::Cost, &mut events);
    events.extend(change_stat_stage(state, target, StatType::Atk, max_stage - stage));
    events
}

/// The user faints and the target's attacking stats drop sharply.
pub(super) fn apply_memento_effect(
    state: &mut BattleState,
    ctx: &EffectContext,
    target: CombatantRef,
) -> Vec<BattleEvent> {
    let mut events = apply_stat_change_effect(state, ctx, target, StatType::Atk, -2);
    events.extend(apply_stat_change_effect(state, ctx, target, StatType::SpAtk, -2));
    state.faint(ctx.attacker, &mut events);
    events
}

pub(super) fn apply_stockpile_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let max = state.config.max_stockpile;
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    if pokemon.volatile.stockpile >= max {
        return failed(state, target);
    }
    pokemon.volatile.stockpile += 1;
    let mut events = vec![BattleEvent::VolatileStarted {
        target: pokemon.name.clone(),
        condition: VolatileKind::Stockpile,
    }];
    let def_gain = raise_and_measure(state, target, StatType::Def, &mut events);
    let sp_def_gain = raise_and_measure(state, target, StatType::SpDef, &mut events);
    if let Some(pokemon) = state.pokemon_mut(target) {
        let (def, sp_def) = &mut pokemon.volatile.stockpile_boosts;
        *def += def_gain;
        *sp_def += sp_def_gain;
    }
    events
}

/// Raise a stat by one stage and return how far it actually moved.
fn raise_and_measure(state: &mut BattleState, target: CombatantRef, stat: StatType, events: &mut Vec<BattleEvent>) -> u8 {
    let before = state.pokemon(target).map_or(0, |p| p.stage(stat));
    events.extend(change_stat_stage(state, target, stat, 1));
    let after = state.pokemon(target).map_or(0, |p| p.stage(stat));
    (after - before).max(0) as u8
}

/// Heal by a quarter, half or all of max HP for one, two or three stockpiles.
pub(super) fn apply_swallow_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let Some(count) = state.pokemon(target).map(|p| p.volatile.stockpile) else {
        return Vec::new();
    };
    if count == 0 {
        return failed(state, target);
    }
    let Some(max_hp) = state.pokemon(target).map(|p| p.max_hp()) else {
        return Vec::new();
    };
    let amount = match count {
        1 => max_hp / 4,
        2 => max_hp / 2,
        _ => max_hp,
    };

    let mut events = Vec::new();
    state.heal(target, amount.max(1), &mut events);
    events.extend(release_stockpile(state, target));
    events
}

/// Spit Up's power comes from the stockpile count; this only spends it.
pub(super) fn apply_spit_up_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let count = state.pokemon(target).map_or(0, |p| p.volatile.stockpile);
    if count == 0 {
        return Vec::new();
    }
    release_stockpile(state, target)
}

/// Drop the stockpile and only the defensive boosts it actually granted.
fn release_stockpile(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    pokemon.volatile.stockpile = 0;
    let (def, sp_def) = std::mem::take(&mut pokemon.volatile.stockpile_boosts);
    let mut events = vec![BattleEvent::VolatileEnded {
        target: pokemon.name.clone(),
        condition: VolatileKind::Stockpile,
    }];
    if def > 0 {
        events.extend(change_stat_stage(state, target, StatType::Def, -(def as i8)));
    }
    if sp_def > 0 {
        events.extend(change_stat_stage(state, target, StatType::SpDef, -(sp_def as i8)));
    }
    events
}

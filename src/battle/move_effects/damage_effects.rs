// --- IMPORTS ---
use super::{failed, EffectContext};
use crate::battle::conditions::PendingWish;
use crate::battle::state::{BattleEvent, BattleState, CombatantRef, DamageCause};
use crate::pokemon::StatusCondition;
use schema::{Ability, StatusType};

// --- STANDALONE HELPER FUNCTIONS ---

/// Recoil as a percentage of the damage just dealt. At least 1 HP when
/// anything was dealt.
pub fn apply_recoil(state: &mut BattleState, attacker: CombatantRef, damage_dealt: u16, percent: u8) -> Vec<BattleEvent> {
    let mut events = Vec::new();
    if damage_dealt == 0 || percent == 0 {
        return events;
    }
    let amount = (damage_dealt as u32 * percent as u32 / 100).max(1) as u16;
    state.damage(attacker, amount, DamageCause::Recoil, &mut events);
    events
}

/// Restore a percentage of the damage just dealt to the attacker.
pub fn apply_drain(state: &mut BattleState, attacker: CombatantRef, damage_dealt: u16, percent: u8) -> Vec<BattleEvent> {
    let mut events = Vec::new();
    if damage_dealt == 0 || percent == 0 {
        return events;
    }
    let amount = (damage_dealt as u32 * percent as u32 / 100).max(1) as u16;
    state.heal(attacker, amount, &mut events);
    events
}

pub(super) fn apply_heal_effect(state: &mut BattleState, target: CombatantRef, percent: u8) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon(target) else {
        return Vec::new();
    };
    if pokemon.is_full_hp() {
        return failed(state, target);
    }
    let amount = (pokemon.max_hp() as u32 * percent as u32 / 100).max(1) as u16;
    let mut events = Vec::new();
    state.heal(target, amount, &mut events);
    events
}

/// Full heal, then sleep for two turns. Replaces any other major status.
pub(super) fn apply_rest_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon(target) else {
        return Vec::new();
    };
    let blocked = matches!(pokemon.ability, Ability::Insomnia);
    if pokemon.is_full_hp() || pokemon.is_asleep() || blocked {
        return failed(state, target);
    }
    let max_hp = pokemon.max_hp();

    let mut events = Vec::new();
    if let Some(pokemon) = state.pokemon_mut(target) {
        if let Some(previous) = pokemon.cure_status() {
            events.push(BattleEvent::StatusCured {
                target: pokemon.name.clone(),
                status: previous.kind(),
            });
        }
        // The wake-up check happens before acting, so two blocked turns need three
        pokemon.set_status(StatusCondition::Sleep(3));
        events.push(BattleEvent::StatusApplied {
            target: pokemon.name.clone(),
            status: StatusType::Sleep,
        });
    }
    state.heal(target, max_hp, &mut events);
    events
}

/// Both combatants end up with the average of their HP.
pub(super) fn apply_pain_split_effect(
    state: &mut BattleState,
    ctx: &EffectContext,
    target: CombatantRef,
) -> Vec<BattleEvent> {
    let (Some(user_hp), Some(target_hp)) = (
        state.pokemon(ctx.attacker).map(|p| p.current_hp()),
        state.pokemon(target).map(|p| p.current_hp()),
    ) else {
        return Vec::new();
    };
    let average = ((user_hp as u32 + target_hp as u32) / 2) as u16;

    let mut events = Vec::new();
    for (who, hp) in [(ctx.attacker, user_hp), (target, target_hp)] {
        if hp > average {
            state.damage(who, hp - average, DamageCause::Cost, &mut events);
        } else if hp < average {
            // Pain Split ignores Heal Block
            if let Some(pokemon) = state.pokemon_mut(who) {
                pokemon.set_hp(average);
                events.push(BattleEvent::PokemonHealed {
                    target: pokemon.name.clone(),
                    amount: average - hp,
                    new_hp: average,
                });
            }
        }
    }
    events
}

/// Cut the target down to the user's HP.
pub(super) fn apply_endeavor_effect(
    state: &mut BattleState,
    ctx: &EffectContext,
    target: CombatantRef,
) -> Vec<BattleEvent> {
    let user_hp = state.pokemon(ctx.attacker).map_or(0, |p| p.current_hp());
    let target_hp = state.pokemon(target).map_or(0, |p| p.current_hp());
    if target_hp <= user_hp {
        return failed(state, ctx.attacker);
    }
    let mut events = Vec::new();
    state.damage(target, target_hp - user_hp, DamageCause::Attack, &mut events);
    events
}

/// Half of the user's max HP arrives at its position at the end of next turn.
pub(super) fn apply_wish_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let Some(max_hp) = state.pokemon(target).map(|p| p.max_hp()) else {
        return Vec::new();
    };
    let side = &mut state.sides[target.side].conditions;
    if side.wishes.iter().any(|wish| wish.slot == target.slot) {
        return failed(state, target);
    }
    side.wishes.push(PendingWish {
        turns_remaining: 2,
        amount: (max_hp / 2).max(1),
        slot: target.slot,
    });
    Vec::new()
}

pub(super) fn apply_self_destruct_effect(state: &mut BattleState, ctx: &EffectContext) -> Vec<BattleEvent> {
    let mut events = Vec::new();
    state.faint(ctx.attacker, &mut events);
    events
}

/// Scatter coins worth five times the user's level. The winner picks them up.
pub(super) fn apply_pay_day_effect(state: &mut BattleState, ctx: &EffectContext) -> Vec<BattleEvent> {
    let Some(level) = state.pokemon(ctx.attacker).map(|p| p.level) else {
        return Vec::new();
    };
    let amount = level as u32 * 5;
    state.sides[ctx.attacker.side].conditions.pay_day_total += amount;
    vec![BattleEvent::CoinsScattered { amount }]
}

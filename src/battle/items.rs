use crate::battle::state::{BattleEvent, BattleState, CombatantRef, RollKind, TurnRng};
use crate::battle::combatant::BattlePokemon;
use schema::HeldItem;

/// Sitrus Berry: restore a quarter of max HP once HP drops to half or less.
pub fn after_damage(state: &mut BattleState, who: CombatantRef, events: &mut Vec<BattleEvent>) {
    let Some(pokemon) = state.pokemon(who) else {
        return;
    };
    if pokemon.is_fainted()
        || pokemon.item != Some(HeldItem::SitrusBerry)
        || pokemon.current_hp() as u32 * 2 > pokemon.max_hp() as u32
    {
        return;
    }
    let amount = pokemon.fraction_of_max(4);
    consume(state, who, events);
    state.heal(who, amount, events);
}

/// Lum Berry: cure a freshly applied major status.
pub fn after_status(state: &mut BattleState, who: CombatantRef, events: &mut Vec<BattleEvent>) {
    let Some(pokemon) = state.pokemon(who) else {
        return;
    };
    if pokemon.item != Some(HeldItem::LumBerry) || pokemon.status.is_none() {
        return;
    }
    consume(state, who, events);
    if let Some(pokemon) = state.pokemon_mut(who) {
        if let Some(status) = pokemon.cure_status() {
            events.push(BattleEvent::StatusCured {
                target: pokemon.name.clone(),
                status: status.kind(),
            });
        }
    }
}

/// Leftovers: restore 1/16 max HP at the end of every turn.
pub fn end_of_turn(state: &mut BattleState, who: CombatantRef, events: &mut Vec<BattleEvent>) {
    let divisor = state.config.leftovers_divisor;
    let Some(pokemon) = state.pokemon(who) else {
        return;
    };
    if pokemon.is_fainted() || pokemon.item != Some(HeldItem::Leftovers) || pokemon.is_full_hp() {
        return;
    }
    let amount = pokemon.fraction_of_max(divisor);
    state.heal(who, amount, events);
}

/// Quick Claw: flat chance to move first within the same priority bracket.
pub fn quick_claw_activates(pokemon: &BattlePokemon, chance: u8, rng: &mut TurnRng) -> bool {
    pokemon.item == Some(HeldItem::QuickClaw) && rng.chance(RollKind::QuickClaw, chance)
}

fn consume(state: &mut BattleState, who: CombatantRef, events: &mut Vec<BattleEvent>) {
    if let Some(pokemon) = state.pokemon_mut(who) {
        if let Some(item) = pokemon.consume_item() {
            events.push(BattleEvent::ItemConsumed {
                pokemon: pokemon.name.clone(),
                item,
            });
        }
    }
}

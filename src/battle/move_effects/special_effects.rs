// --- IMPORTS ---
use super::{failed, EffectContext};
use crate::battle::action_stack::BattleAction;
use crate::battle::state::{BattleEvent, BattleState, CombatantRef, RollKind, TurnRng};
use crate::pokemon::StatusCondition;
use schema::{Ability, MoveId, PokemonType};
use tracing::debug;

/// Moves Assist will never pick.
const UNCALLABLE_BY_ASSIST: &[&str] = &[
    "assist",
    "protect",
    "detect",
    "endure",
    "follow-me",
    "snatch",
    "trick",
    "thief",
    "covet",
    "counter",
    "mirror-coat",
    "destiny-bond",
    "struggle",
];

// --- STANDALONE HELPER FUNCTIONS ---

/// Swap held items. Fails when neither side holds anything.
pub(super) fn apply_trick_effect(state: &mut BattleState, ctx: &EffectContext, target: CombatantRef) -> Vec<BattleEvent> {
    let user_item = state.pokemon(ctx.attacker).and_then(|p| p.item);
    let target_item = state.pokemon(target).and_then(|p| p.item);
    if user_item.is_none() && target_item.is_none() {
        return failed(state, ctx.attacker);
    }
    if let Some(user) = state.pokemon_mut(ctx.attacker) {
        user.item = target_item;
    }
    if let Some(other) = state.pokemon_mut(target) {
        other.item = user_item;
    }
    vec![BattleEvent::ItemsSwapped {
        user: state.name_of(ctx.attacker),
        target: state.name_of(target),
    }]
}

/// The item is gone for the rest of the battle; Recycle cannot bring it back.
pub(super) fn apply_knock_off_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    match pokemon.item.take() {
        Some(item) => vec![BattleEvent::ItemKnockedOff {
            target: pokemon.name.clone(),
            item,
        }],
        None => Vec::new(),
    }
}

pub(super) fn apply_recycle_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    let restorable = pokemon.item.is_none().then_some(pokemon.consumed_item).flatten();
    let Some(item) = restorable else {
        return failed(state, target);
    };
    pokemon.item = Some(item);
    pokemon.consumed_item = None;
    vec![BattleEvent::ItemRestored {
        pokemon: pokemon.name.clone(),
        item,
    }]
}

/// Copy the target's ability onto the user.
pub(super) fn apply_role_play_effect(
    state: &mut BattleState,
    ctx: &EffectContext,
    target: CombatantRef,
) -> Vec<BattleEvent> {
    let Some(ability) = state.pokemon(target).map(|p| p.ability) else {
        return Vec::new();
    };
    let Some(user) = state.pokemon_mut(ctx.attacker) else {
        return Vec::new();
    };
    if ability == Ability::None || user.ability == ability {
        return failed(state, ctx.attacker);
    }
    user.ability = ability;
    vec![BattleEvent::AbilityChanged {
        pokemon: user.name.clone(),
        ability,
    }]
}

pub(super) fn apply_skill_swap_effect(
    state: &mut BattleState,
    ctx: &EffectContext,
    target: CombatantRef,
) -> Vec<BattleEvent> {
    let (Some(mine), Some(theirs)) = (
        state.pokemon(ctx.attacker).map(|p| p.ability),
        state.pokemon(target).map(|p| p.ability),
    ) else {
        return Vec::new();
    };
    if mine == Ability::None && theirs == Ability::None {
        return failed(state, ctx.attacker);
    }

    let mut events = Vec::new();
    for (who, ability) in [(ctx.attacker, theirs), (target, mine)] {
        if let Some(pokemon) = state.pokemon_mut(who) {
            pokemon.ability = ability;
            events.push(BattleEvent::AbilityChanged {
                pokemon: pokemon.name.clone(),
                ability,
            });
        }
    }
    events
}

fn change_types(state: &mut BattleState, who: CombatantRef, new_types: Vec<PokemonType>) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon_mut(who) else {
        return Vec::new();
    };
    debug!(pokemon = %pokemon.name, ?new_types, "type changed");
    pokemon.volatile.type_override = Some(new_types.clone());
    vec![BattleEvent::TypeChanged {
        pokemon: pokemon.name.clone(),
        new_types,
    }]
}

pub(super) fn apply_camouflage_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    if state
        .pokemon(target)
        .is_some_and(|p| p.effective_types() == [PokemonType::Normal])
    {
        return failed(state, target);
    }
    change_types(state, target, vec![PokemonType::Normal])
}

/// Become the type of one of the user's own moves.
pub(super) fn apply_conversion_effect(
    state: &mut BattleState,
    target: CombatantRef,
    rng: &mut TurnRng,
) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon(target) else {
        return Vec::new();
    };
    let mut candidates: Vec<PokemonType> = pokemon
        .moves
        .iter()
        .map(|slot| slot.move_type)
        .filter(|t| *t != PokemonType::Typeless && !pokemon.has_type(*t))
        .collect();
    candidates.dedup();
    if candidates.is_empty() {
        return failed(state, target);
    }
    let chosen = candidates[rng.pick_index(RollKind::TypeSelection, candidates.len())];
    change_types(state, target, vec![chosen])
}

/// Become a type that resists whatever last hit the user.
pub(super) fn apply_conversion2_effect(
    state: &mut BattleState,
    target: CombatantRef,
    rng: &mut TurnRng,
) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon(target) else {
        return Vec::new();
    };
    let Some(attacking) = pokemon.volatile.last_hit_by_type else {
        return failed(state, target);
    };
    let candidates: Vec<PokemonType> = PokemonType::ALL
        .into_iter()
        .filter(|t| PokemonType::type_effectiveness(attacking, *t) < 1.0 && !pokemon.has_type(*t))
        .collect();
    if candidates.is_empty() {
        return failed(state, target);
    }
    let chosen = candidates[rng.pick_index(RollKind::TypeSelection, candidates.len())];
    change_types(state, target, vec![chosen])
}

/// Cure burn, poison and paralysis on the user.
pub(super) fn apply_refresh_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    let curable = matches!(
        pokemon.status,
        Some(StatusCondition::Burn | StatusCondition::Poison | StatusCondition::Toxic(_) | StatusCondition::Paralysis)
    );
    if !curable {
        return failed(state, target);
    }
    match pokemon.cure_status() {
        Some(status) => vec![BattleEvent::StatusCured {
            target: pokemon.name.clone(),
            status: status.kind(),
        }],
        None => Vec::new(),
    }
}

/// Cure every member of the user's team, benched ones included.
pub(super) fn apply_heal_bell_effect(state: &mut BattleState, ctx: &EffectContext) -> Vec<BattleEvent> {
    let mut events = Vec::new();
    for pokemon in state.sides[ctx.attacker.side].team.iter_mut() {
        if pokemon.is_fainted() {
            continue;
        }
        if let Some(status) = pokemon.cure_status() {
            pokemon.volatile.nightmare = false;
            events.push(BattleEvent::StatusCured {
                target: pokemon.name.clone(),
                status: status.kind(),
            });
        }
    }
    events
}

/// Drag a random healthy backup into the target's position.
pub(super) fn apply_force_switch_effect(
    state: &mut BattleState,
    ctx: &EffectContext,
    target: CombatantRef,
    rng: &mut TurnRng,
) -> Vec<BattleEvent> {
    let ingrained = state.pokemon(target).is_some_and(|p| p.volatile.ingrained);
    let backups = state.sides[target.side].available_backups();
    if ingrained || backups.is_empty() {
        return failed(state, ctx.attacker);
    }
    let chosen = backups[rng.pick_index(RollKind::ForceSwitchTarget, backups.len())];
    debug!(?target, team_index = chosen, "forced switch");

    let mut events = Vec::new();
    state.switch_in(target, chosen, true, &mut events);
    events
}

/// Call a random move known by one of the user's teammates.
pub(super) fn apply_assist_effect(state: &mut BattleState, ctx: &EffectContext, rng: &mut TurnRng) -> Vec<BattleEvent> {
    let own_index = state.team_index(ctx.attacker);
    let candidates: Vec<MoveId> = state.sides[ctx.attacker.side]
        .team
        .iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != own_index)
        .flat_map(|(_, pokemon)| pokemon.moves.iter().map(|slot| slot.id.clone()))
        .filter(|id| !UNCALLABLE_BY_ASSIST.contains(&id.as_str()))
        .collect();
    if candidates.is_empty() {
        return failed(state, ctx.attacker);
    }
    let move_id = candidates[rng.pick_index(RollKind::MoveSelection, candidates.len())].clone();
    state.follow_ups.push_back(BattleAction::CalledMove {
        actor: ctx.attacker,
        move_id,
        target: None,
    });
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::super::{apply_effect, EffectContext};
    use crate::battle::action_stack::BattleAction;
    use crate::battle::state::{BattleEvent, BattleState, CombatantRef, RollKind, TurnRng};
    use crate::battle::tests::common::{create_team_battle, create_test_battle, TestPokemonBuilder};
    use crate::pokemon::StatusCondition;
    use pretty_assertions::assert_eq;
    use schema::{Ability, Effect, EffectKind, EffectTarget, HeldItem, MoveId, PokemonType};

    const P1: CombatantRef = CombatantRef::new(0, 0);
    const P2: CombatantRef = CombatantRef::new(1, 0);

    fn run(state: &mut BattleState, kind: EffectKind, target: EffectTarget, rng: &mut TurnRng) -> Vec<BattleEvent> {
        let ctx = EffectContext::new(P1, P2, MoveId::new("test-move"));
        apply_effect(state, &ctx, &Effect::new(kind, target, 100), rng)
    }

    #[test]
    fn test_trick_swaps_items() {
        let mut state = create_test_battle(
            TestPokemonBuilder::new("pikachu", 50).with_item(HeldItem::ChoiceBand).build(),
            TestPokemonBuilder::new("rattata", 50).build(),
        );
        run(&mut state, EffectKind::Trick, EffectTarget::Target, &mut TurnRng::scripted());
        assert_eq!(state.pokemon(P1).unwrap().item, None);
        assert_eq!(state.pokemon(P2).unwrap().item, Some(HeldItem::ChoiceBand));
    }

    #[test]
    fn test_knocked_off_items_cannot_be_recycled() {
        let mut state = create_test_battle(
            TestPokemonBuilder::new("pikachu", 50).build(),
            TestPokemonBuilder::new("rattata", 50).with_item(HeldItem::Leftovers).build(),
        );
        run(&mut state, EffectKind::KnockOff, EffectTarget::Target, &mut TurnRng::scripted());
        assert_eq!(state.pokemon(P2).unwrap().item, None);

        let ctx = EffectContext::new(P2, P1, MoveId::new("recycle"));
        let events = apply_effect(
            &mut state,
            &ctx,
            &Effect::new(EffectKind::Recycle, EffectTarget::User, 100),
            &mut TurnRng::scripted(),
        );
        assert!(matches!(events[0], BattleEvent::ActionFailed { .. }));
    }

    #[test]
    fn test_recycle_restores_consumed_berry() {
        let mut state = create_test_battle(
            TestPokemonBuilder::new("pikachu", 50).with_item(HeldItem::SitrusBerry).build(),
            TestPokemonBuilder::new("rattata", 50).build(),
        );
        state.pokemon_mut(P1).unwrap().consume_item();
        run(&mut state, EffectKind::Recycle, EffectTarget::User, &mut TurnRng::scripted());
        assert_eq!(state.pokemon(P1).unwrap().item, Some(HeldItem::SitrusBerry));
    }

    #[test]
    fn test_skill_swap_and_role_play() {
        let mut state = create_test_battle(
            TestPokemonBuilder::new("pikachu", 50).with_ability(Ability::Guts).build(),
            TestPokemonBuilder::new("rattata", 50).with_ability(Ability::Levitate).build(),
        );
        run(&mut state, EffectKind::SkillSwap, EffectTarget::Target, &mut TurnRng::scripted());
        assert_eq!(state.pokemon(P1).unwrap().ability, Ability::Levitate);
        assert_eq!(state.pokemon(P2).unwrap().ability, Ability::Guts);

        run(&mut state, EffectKind::RolePlay, EffectTarget::Target, &mut TurnRng::scripted());
        assert_eq!(state.pokemon(P1).unwrap().ability, Ability::Guts);
    }

    #[test]
    fn test_conversion2_picks_a_resisting_type() {
        let mut state = create_test_battle(
            TestPokemonBuilder::new("pikachu", 50).build(),
            TestPokemonBuilder::new("rattata", 50).build(),
        );
        let events = run(&mut state, EffectKind::Conversion2, EffectTarget::User, &mut TurnRng::scripted());
        assert!(matches!(events[0], BattleEvent::ActionFailed { .. }));

        state.pokemon_mut(P1).unwrap().volatile.last_hit_by_type = Some(PokemonType::Normal);
        run(&mut state, EffectKind::Conversion2, EffectTarget::User, &mut TurnRng::scripted());
        let types = state.pokemon(P1).unwrap().effective_types().to_vec();
        // Rock is the first type in chart order that resists Normal
        assert_eq!(types, vec![PokemonType::Rock]);
    }

    #[test]
    fn test_camouflage_turns_normal() {
        let mut state = create_test_battle(
            TestPokemonBuilder::new("pikachu", 50).build(),
            TestPokemonBuilder::new("rattata", 50).build(),
        );
        run(&mut state, EffectKind::Camouflage, EffectTarget::User, &mut TurnRng::scripted());
        assert!(state.pokemon(P1).unwrap().has_type(PokemonType::Normal));
        assert!(!state.pokemon(P1).unwrap().has_type(PokemonType::Electric));
    }

    #[test]
    fn test_heal_bell_cures_bench() {
        let mut state = create_team_battle(
            vec![
                TestPokemonBuilder::new("pikachu", 50).with_status(StatusCondition::Burn).build(),
                TestPokemonBuilder::new("squirtle", 50).with_status(StatusCondition::Poison).build(),
            ],
            vec![TestPokemonBuilder::new("rattata", 50).build()],
        );
        let events = run(&mut state, EffectKind::HealBell, EffectTarget::User, &mut TurnRng::scripted());
        assert_eq!(events.len(), 2);
        assert!(state.sides[0].team.iter().all(|p| p.status.is_none()));
    }

    #[test]
    fn test_refresh_ignores_sleep() {
        let mut state = create_test_battle(
            TestPokemonBuilder::new("pikachu", 50).with_status(StatusCondition::Sleep(2)).build(),
            TestPokemonBuilder::new("rattata", 50).build(),
        );
        let events = run(&mut state, EffectKind::Refresh, EffectTarget::User, &mut TurnRng::scripted());
        assert!(matches!(events[0], BattleEvent::ActionFailed { .. }));
    }

    #[test]
    fn test_force_switch_drags_out_backup() {
        let mut state = create_team_battle(
            vec![TestPokemonBuilder::new("pikachu", 50).build()],
            vec![
                TestPokemonBuilder::new("rattata", 50).build(),
                TestPokemonBuilder::new("squirtle", 50).build(),
                TestPokemonBuilder::new("charmander", 50).build(),
            ],
        );
        let mut rng = TurnRng::new_for_test(vec![(RollKind::ForceSwitchTarget, 1)]);
        let events = run(&mut state, EffectKind::ForceSwitch, EffectTarget::Target, &mut rng);
        assert!(matches!(events[0], BattleEvent::PokemonDraggedOut { .. }));
        assert_eq!(state.team_index(P2), Some(2));
    }

    #[test]
    fn test_force_switch_fails_when_ingrained() {
        let mut state = create_team_battle(
            vec![TestPokemonBuilder::new("pikachu", 50).build()],
            vec![
                TestPokemonBuilder::new("rattata", 50).build(),
                TestPokemonBuilder::new("squirtle", 50).build(),
            ],
        );
        state.pokemon_mut(P2).unwrap().volatile.ingrained = true;
        let events = run(&mut state, EffectKind::ForceSwitch, EffectTarget::Target, &mut TurnRng::scripted());
        assert!(matches!(events[0], BattleEvent::ActionFailed { .. }));
        assert_eq!(state.team_index(P2), Some(0));
    }

    #[test]
    fn test_assist_queues_teammate_move() {
        let mut state = create_team_battle(
            vec![
                TestPokemonBuilder::new("pikachu", 50).with_moves(vec!["assist"]).build(),
                TestPokemonBuilder::new("squirtle", 50).with_moves(vec!["protect", "tackle"]).build(),
            ],
            vec![TestPokemonBuilder::new("rattata", 50).build()],
        );
        run(&mut state, EffectKind::Assist, EffectTarget::User, &mut TurnRng::scripted());
        assert_eq!(
            state.follow_ups.pop_front(),
            Some(BattleAction::CalledMove {
                actor: P1,
                move_id: MoveId::new("tackle"),
                target: None,
            })
        );
    }
}

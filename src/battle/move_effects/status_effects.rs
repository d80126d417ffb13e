// --- IMPORTS ---
use super::{failed, EffectContext};
use crate::battle::conditions::{BideState, BindState, TimedMove, VolatileKind};
use crate::battle::state::{BattleEvent, BattleState, CombatantRef, DamageCause, RollKind, TurnRng};
use crate::battle::status::apply_status_effect;
use schema::{Ability, PokemonType, StatType, StatusType};

use super::stat_effects::change_stat_stage;

// --- STANDALONE HELPER FUNCTIONS ---

fn started(state: &BattleState, who: CombatantRef, condition: VolatileKind) -> Vec<BattleEvent> {
    vec![BattleEvent::VolatileStarted {
        target: state.name_of(who),
        condition,
    }]
}

fn already(state: &BattleState, who: CombatantRef, condition: VolatileKind) -> Vec<BattleEvent> {
    vec![BattleEvent::VolatileFailed {
        target: state.name_of(who),
        condition,
    }]
}

/// Set a flag-style volatile, failing when it is already set.
fn set_flag(
    state: &mut BattleState,
    who: CombatantRef,
    condition: VolatileKind,
    flag: impl FnOnce(&mut crate::battle::conditions::Volatile) -> &mut bool,
) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon_mut(who) else {
        return Vec::new();
    };
    let was_set = std::mem::replace(flag(&mut pokemon.volatile), true);
    if was_set {
        return already(state, who, condition);
    }
    started(state, who, condition)
}

pub(super) fn apply_major_status_effect(
    state: &mut BattleState,
    ctx: &EffectContext,
    target: CombatantRef,
    status: StatusType,
    rng: &mut TurnRng,
) -> Vec<BattleEvent> {
    let events = apply_status_effect(state, target, status, rng);
    if ctx.secondary {
        // Riders on damaging moves fail without comment
        return events
            .into_iter()
            .filter(|event| !matches!(event, BattleEvent::StatusFailed { .. }))
            .collect();
    }
    events
}

pub(super) fn apply_confuse_effect(
    state: &mut BattleState,
    ctx: &EffectContext,
    target: CombatantRef,
    rng: &mut TurnRng,
) -> Vec<BattleEvent> {
    let (lo, hi) = state.config.confusion_turns;
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    if pokemon.ability == Ability::OwnTempo || pokemon.volatile.confusion_turns > 0 {
        if ctx.secondary {
            return Vec::new();
        }
        return already(state, target, VolatileKind::Confusion);
    }
    // The first check after infliction only counts down
    let turns = rng.next_in_range(RollKind::ConfusionDuration, lo as u32, hi as u32) as u8 + 1;
    pokemon.volatile.confusion_turns = turns;
    started(state, target, VolatileKind::Confusion)
}

/// Flinch only matters if the target has not moved yet this turn.
pub(super) fn apply_flinch_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    if let Some(pokemon) = state.pokemon_mut(target) {
        if pokemon.ability != Ability::InnerFocus && !pokemon.volatile.acted_this_turn {
            pokemon.volatile.flinched = true;
        }
    }
    Vec::new()
}

pub(super) fn apply_leech_seed_effect(
    state: &mut BattleState,
    ctx: &EffectContext,
    target: CombatantRef,
) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    if pokemon.has_type(PokemonType::Grass) || pokemon.volatile.leech_seed_source.is_some() {
        return already(state, target, VolatileKind::LeechSeed);
    }
    pokemon.volatile.leech_seed_source = Some(ctx.attacker);
    started(state, target, VolatileKind::LeechSeed)
}

pub(super) fn apply_ingrain_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    set_flag(state, target, VolatileKind::Ingrain, |v| &mut v.ingrained)
}

/// Pay a quarter of max HP to put up a decoy with that much HP.
pub(super) fn apply_substitute_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon(target) else {
        return Vec::new();
    };
    if pokemon.volatile.substitute_hp > 0 {
        return already(state, target, VolatileKind::Substitute);
    }
    let cost = pokemon.fraction_of_max(4);
    if pokemon.current_hp() <= cost {
        return failed(state, target);
    }

    let mut events = Vec::new();
    state.damage(target, cost, DamageCause::Cost, &mut events);
    if let Some(pokemon) = state.pokemon_mut(target) {
        pokemon.volatile.substitute_hp = cost;
    }
    events.extend(started(state, target, VolatileKind::Substitute));
    events
}

/// Protect and Endure. Each consecutive success halves the next chance.
pub(super) fn apply_protect_effect(
    state: &mut BattleState,
    target: CombatantRef,
    endure: bool,
    rng: &mut TurnRng,
) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    let streak = pokemon.volatile.protect_streak.min(7);
    let chance = (100u32 >> streak) as u8;
    if !rng.chance(RollKind::ProtectSuccess, chance) {
        pokemon.volatile.protect_streak = 0;
        return failed(state, target);
    }
    pokemon.volatile.protect_streak += 1;
    let condition = if endure {
        pokemon.volatile.enduring = true;
        VolatileKind::Endure
    } else {
        pokemon.volatile.protected = true;
        VolatileKind::Protect
    };
    started(state, target, condition)
}

pub(super) fn apply_focus_energy_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    set_flag(state, target, VolatileKind::FocusEnergy, |v| &mut v.focus_energy)
}

/// The target falls asleep at the end of the next turn.
pub(super) fn apply_yawn_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    if pokemon.status.is_some() || pokemon.volatile.yawn_turns > 0 {
        return failed(state, target);
    }
    pokemon.volatile.yawn_turns = 2;
    started(state, target, VolatileKind::Yawn)
}

pub(super) fn apply_destiny_bond_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    if let Some(pokemon) = state.pokemon_mut(target) {
        pokemon.volatile.destiny_bond = true;
    }
    started(state, target, VolatileKind::DestinyBond)
}

/// Everyone on the field without a count starts one.
pub(super) fn apply_perish_song_effect(state: &mut BattleState) -> Vec<BattleEvent> {
    let count = state.config.perish_count;
    let mut events = Vec::new();
    for who in state.all_active_refs() {
        if let Some(pokemon) = state.pokemon_mut(who) {
            if pokemon.volatile.perish_count.is_none() {
                pokemon.volatile.perish_count = Some(count);
                events.push(BattleEvent::PerishCount {
                    target: pokemon.name.clone(),
                    count,
                });
            }
        }
    }
    events
}

pub(super) fn apply_bind_effect(
    state: &mut BattleState,
    ctx: &EffectContext,
    target: CombatantRef,
    rng: &mut TurnRng,
) -> Vec<BattleEvent> {
    let (lo, hi) = state.config.bind_turns;
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    if pokemon.volatile.bind.is_some() {
        return Vec::new();
    }
    let turns = rng.next_in_range(RollKind::BindDuration, lo as u32, hi as u32) as u8;
    pokemon.volatile.bind = Some(BindState {
        source: ctx.attacker,
        turns_remaining: turns,
    });
    started(state, target, VolatileKind::Bind)
}

/// Disable the target's last used move.
pub(super) fn apply_disable_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let turns = state.config.disable_turns;
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    let last = pokemon.volatile.last_move.clone().filter(|id| pokemon.knows_move(id));
    let Some(move_id) = last.filter(|_| pokemon.volatile.disable.is_none()) else {
        return failed(state, target);
    };
    pokemon.volatile.disable = Some(TimedMove {
        move_id,
        turns_remaining: turns,
    });
    started(state, target, VolatileKind::Disable)
}

pub(super) fn apply_trap_effect(state: &mut BattleState, ctx: &EffectContext, target: CombatantRef) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    if pokemon.volatile.trapped_by.is_some() {
        return already(state, target, VolatileKind::Trapped);
    }
    pokemon.volatile.trapped_by = Some(ctx.attacker);
    started(state, target, VolatileKind::Trapped)
}

/// Lock the target into repeating its last move.
pub(super) fn apply_encore_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let turns = state.config.encore_turns;
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    let last = pokemon
        .volatile
        .last_move
        .clone()
        .filter(|id| !id.is_struggle() && pokemon.knows_move(id));
    let Some(move_id) = last.filter(|_| pokemon.volatile.encore.is_none()) else {
        return failed(state, target);
    };
    pokemon.volatile.encore = Some(TimedMove {
        move_id,
        turns_remaining: turns,
    });
    started(state, target, VolatileKind::Encore)
}

pub(super) fn apply_taunt_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let turns = state.config.taunt_turns;
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    if pokemon.volatile.taunt_turns > 0 {
        return already(state, target, VolatileKind::Taunt);
    }
    pokemon.volatile.taunt_turns = turns;
    started(state, target, VolatileKind::Taunt)
}

pub(super) fn apply_torment_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    set_flag(state, target, VolatileKind::Torment, |v| &mut v.tormented)
}

pub(super) fn apply_charge_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    if let Some(pokemon) = state.pokemon_mut(target) {
        pokemon.volatile.charged = true;
    }
    started(state, target, VolatileKind::Charge)
}

/// Boosts an ally's move this turn. Fails without a partner.
pub(super) fn apply_helping_hand_effect(
    state: &mut BattleState,
    ctx: &EffectContext,
    target: CombatantRef,
) -> Vec<BattleEvent> {
    if target == ctx.attacker || target.side != ctx.attacker.side {
        return failed(state, ctx.attacker);
    }
    set_flag(state, target, VolatileKind::HelpingHand, |v| &mut v.helping_hand)
}

pub(super) fn apply_imprison_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    set_flag(state, target, VolatileKind::Imprison, |v| &mut v.imprisoning)
}

pub(super) fn apply_grudge_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    set_flag(state, target, VolatileKind::Grudge, |v| &mut v.grudge)
}

pub(super) fn apply_snatch_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    set_flag(state, target, VolatileKind::Snatch, |v| &mut v.snatching)
}

pub(super) fn apply_foresight_effect(
    state: &mut BattleState,
    target: CombatantRef,
    miracle_eye: bool,
) -> Vec<BattleEvent> {
    if miracle_eye {
        set_flag(state, target, VolatileKind::MiracleEye, |v| &mut v.miracle_eye)
    } else {
        set_flag(state, target, VolatileKind::Foresight, |v| &mut v.foresight)
    }
}

pub(super) fn apply_heal_block_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let turns = state.config.heal_block_turns;
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    if pokemon.volatile.heal_block_turns > 0 {
        return already(state, target, VolatileKind::HealBlock);
    }
    pokemon.volatile.heal_block_turns = turns;
    started(state, target, VolatileKind::HealBlock)
}

/// Follow Me and Rage Powder draw single-target moves to the user.
pub(super) fn apply_redirection_effect(
    state: &mut BattleState,
    target: CombatantRef,
    rage_powder: bool,
) -> Vec<BattleEvent> {
    if rage_powder {
        set_flag(state, target, VolatileKind::RagePowder, |v| &mut v.rage_powder)
    } else {
        set_flag(state, target, VolatileKind::FollowMe, |v| &mut v.follow_me)
    }
}

pub(super) fn apply_spotlight_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    set_flag(state, target, VolatileKind::Spotlight, |v| &mut v.spotlight)
}

pub(super) fn apply_attract_effect(
    state: &mut BattleState,
    ctx: &EffectContext,
    target: CombatantRef,
) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    if pokemon.volatile.infatuated_with.is_some() {
        return already(state, target, VolatileKind::Infatuation);
    }
    pokemon.volatile.infatuated_with = Some(ctx.attacker);
    started(state, target, VolatileKind::Infatuation)
}

/// Ghost users pay half their HP to curse the target; everyone else trades
/// Speed for Attack and Defense.
pub(super) fn apply_curse_effect(state: &mut BattleState, ctx: &EffectContext, target: CombatantRef) -> Vec<BattleEvent> {
    let user = ctx.attacker;
    let Some((is_ghost, cost)) = state
        .pokemon(user)
        .map(|p| (p.has_type(PokemonType::Ghost), p.fraction_of_max(2)))
    else {
        return Vec::new();
    };

    if !is_ghost {
        let mut events = change_stat_stage(state, user, StatType::Spe, -1);
        events.extend(change_stat_stage(state, user, StatType::Atk, 1));
        events.extend(change_stat_stage(state, user, StatType::Def, 1));
        return events;
    }

    if target == user || state.pokemon(target).is_some_and(|p| p.volatile.cursed) {
        return failed(state, user);
    }
    let mut events = Vec::new();
    state.damage(user, cost, DamageCause::Cost, &mut events);
    if let Some(pokemon) = state.pokemon_mut(target) {
        pokemon.volatile.cursed = true;
    }
    events.extend(started(state, target, VolatileKind::Curse));
    events
}

pub(super) fn apply_nightmare_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    if !pokemon.is_asleep() || pokemon.volatile.nightmare {
        return failed(state, target);
    }
    pokemon.volatile.nightmare = true;
    started(state, target, VolatileKind::Nightmare)
}

pub(super) fn apply_minimize_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    if let Some(pokemon) = state.pokemon_mut(target) {
        pokemon.volatile.minimized = true;
    }
    change_stat_stage(state, target, StatType::Eva, 2)
}

pub(super) fn apply_defense_curl_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    if let Some(pokemon) = state.pokemon_mut(target) {
        pokemon.volatile.defense_curl = true;
    }
    change_stat_stage(state, target, StatType::Def, 1)
}

/// The user's next move against the target cannot miss.
pub(super) fn apply_lock_on_effect(
    state: &mut BattleState,
    ctx: &EffectContext,
    target: CombatantRef,
) -> Vec<BattleEvent> {
    if let Some(pokemon) = state.pokemon_mut(ctx.attacker) {
        pokemon.volatile.lock_on = Some(target);
    }
    started(state, ctx.attacker, VolatileKind::LockOn)
}

/// Start storing energy. The engine releases it once the counter runs out.
pub(super) fn apply_bide_effect(state: &mut BattleState, target: CombatantRef) -> Vec<BattleEvent> {
    let Some(pokemon) = state.pokemon_mut(target) else {
        return Vec::new();
    };
    if pokemon.volatile.bide.is_some() {
        return Vec::new();
    }
    pokemon.volatile.bide = Some(BideState {
        turns_remaining: 1,
        damage: 0,
        last_attacker: None,
    });
    started(state, target, VolatileKind::Bide)
}

#[cfg(test)]
mod tests {
    use super::super::{apply_effect, EffectContext};
    use crate::battle::conditions::VolatileKind;
    use crate::battle::state::{BattleEvent, BattleState, CombatantRef, RollKind, TurnRng};
    use crate::battle::tests::common::{create_test_battle, TestPokemonBuilder};
    use pretty_assertions::assert_eq;
    use schema::{Effect, EffectKind, EffectTarget, MoveId, PokemonType};

    const P1: CombatantRef = CombatantRef::new(0, 0);
    const P2: CombatantRef = CombatantRef::new(1, 0);

    fn duel() -> BattleState {
        create_test_battle(
            TestPokemonBuilder::new("pikachu", 50).with_hp_stat(100).build(),
            TestPokemonBuilder::new("rattata", 50).with_hp_stat(100).build(),
        )
    }

    fn run(state: &mut BattleState, kind: EffectKind, target: EffectTarget, rng: &mut TurnRng) -> Vec<BattleEvent> {
        let ctx = EffectContext::new(P1, P2, MoveId::new("test-move"));
        apply_effect(state, &ctx, &Effect::new(kind, target, 100), rng)
    }

    #[test]
    fn test_confusion_is_not_stacked() {
        let mut state = duel();
        let mut rng = TurnRng::new_for_test(vec![(RollKind::ConfusionDuration, 3)]);
        run(&mut state, EffectKind::Confuse, EffectTarget::Target, &mut rng);
        assert_eq!(state.pokemon(P2).unwrap().volatile.confusion_turns, 4);

        let events = run(&mut state, EffectKind::Confuse, EffectTarget::Target, &mut rng);
        assert!(matches!(
            events[0],
            BattleEvent::VolatileFailed {
                condition: VolatileKind::Confusion,
                ..
            }
        ));
        assert_eq!(state.pokemon(P2).unwrap().volatile.confusion_turns, 4);
    }

    #[test]
    fn test_leech_seed_spares_grass_types() {
        let mut state = duel();
        state.pokemon_mut(P2).unwrap().types = vec![PokemonType::Grass];
        let events = run(&mut state, EffectKind::LeechSeed, EffectTarget::Target, &mut TurnRng::scripted());
        assert!(matches!(events[0], BattleEvent::VolatileFailed { .. }));
        assert_eq!(state.pokemon(P2).unwrap().volatile.leech_seed_source, None);
    }

    #[test]
    fn test_substitute_costs_a_quarter() {
        let mut state = duel();
        run(&mut state, EffectKind::Substitute, EffectTarget::User, &mut TurnRng::scripted());
        let pokemon = state.pokemon(P1).unwrap();
        assert_eq!(pokemon.current_hp(), 75);
        assert_eq!(pokemon.volatile.substitute_hp, 25);

        state.pokemon_mut(P1).unwrap().volatile.substitute_hp = 0;
        state.pokemon_mut(P1).unwrap().set_hp(25);
        let events = run(&mut state, EffectKind::Substitute, EffectTarget::User, &mut TurnRng::scripted());
        assert!(matches!(events[0], BattleEvent::ActionFailed { .. }));
    }

    #[test]
    fn test_protect_streak_halves_chance() {
        let mut state = duel();
        run(&mut state, EffectKind::Protect, EffectTarget::User, &mut TurnRng::scripted());
        assert!(state.pokemon(P1).unwrap().volatile.protected);

        // Second in a row needs a roll of 50 or less; the quiet roll is 100
        state.pokemon_mut(P1).unwrap().volatile.protected = false;
        let events = run(&mut state, EffectKind::Protect, EffectTarget::User, &mut TurnRng::scripted());
        assert!(matches!(events[0], BattleEvent::ActionFailed { .. }));
        assert_eq!(state.pokemon(P1).unwrap().volatile.protect_streak, 0);
    }

    #[test]
    fn test_disable_needs_a_last_move() {
        let mut state = create_test_battle(
            TestPokemonBuilder::new("pikachu", 50).build(),
            TestPokemonBuilder::new("rattata", 50).with_moves(vec!["tackle"]).build(),
        );
        let events = run(&mut state, EffectKind::Disable, EffectTarget::Target, &mut TurnRng::scripted());
        assert!(matches!(events[0], BattleEvent::ActionFailed { .. }));

        state.pokemon_mut(P2).unwrap().volatile.last_move = Some(MoveId::new("tackle"));
        run(&mut state, EffectKind::Disable, EffectTarget::Target, &mut TurnRng::scripted());
        let disable = state.pokemon(P2).unwrap().volatile.disable.clone().unwrap();
        assert_eq!(disable.move_id, MoveId::new("tackle"));
        assert_eq!(disable.turns_remaining, 4);
    }

    #[test]
    fn test_perish_song_hits_everyone_once() {
        let mut state = duel();
        let events = run(&mut state, EffectKind::PerishSong, EffectTarget::Field, &mut TurnRng::scripted());
        assert_eq!(events.len(), 2);
        assert_eq!(state.pokemon(P1).unwrap().volatile.perish_count, Some(3));
        assert_eq!(state.pokemon(P2).unwrap().volatile.perish_count, Some(3));
        assert!(run(&mut state, EffectKind::PerishSong, EffectTarget::Field, &mut TurnRng::scripted()).is_empty());
    }

    #[test]
    fn test_ghost_curse_costs_half() {
        let mut state = duel();
        state.pokemon_mut(P1).unwrap().types = vec![PokemonType::Ghost];
        run(&mut state, EffectKind::Curse, EffectTarget::Target, &mut TurnRng::scripted());
        assert_eq!(state.pokemon(P1).unwrap().current_hp(), 50);
        assert!(state.pokemon(P2).unwrap().volatile.cursed);
    }

    #[test]
    fn test_flinch_after_acting_is_ignored() {
        let mut state = duel();
        state.pokemon_mut(P2).unwrap().volatile.acted_this_turn = true;
        run(&mut state, EffectKind::Flinch, EffectTarget::Target, &mut TurnRng::scripted());
        assert!(!state.pokemon(P2).unwrap().volatile.flinched);
    }
}

use crate::battle::conditions::Volatile;
use crate::battle::state::{BattleState, CombatantRef, RollKind, TurnRng};
use schema::{MoveId, MoveTarget};

/// Spread moves whose data predates target classes.
const MULTI_TARGET_MOVES: &[&str] = &[
    "earthquake",
    "magnitude",
    "surf",
    "explosion",
    "self-destruct",
    "rock-slide",
    "blizzard",
    "heat-wave",
    "hyper-voice",
    "icy-wind",
    "razor-leaf",
];

/// True when a move hits more than one combatant.
pub fn is_multi_target(target: MoveTarget, move_id: &MoveId) -> bool {
    matches!(
        target,
        MoveTarget::AllOpponents
            | MoveTarget::AllAllies
            | MoveTarget::AllAdjacent
            | MoveTarget::AllAdjacentFoes
            | MoveTarget::All
    ) || MULTI_TARGET_MOVES.contains(&move_id.as_str())
}

/// Listed spread moves that also strike the user's partner.
const HITS_ALLIES: &[&str] = &["earthquake", "magnitude", "surf", "explosion", "self-destruct"];

/// The target class a move is resolved with. Listed spread moves whose data
/// still names a single target are widened to hit every adjacent foe, or every
/// adjacent combatant for the moves that also catch allies.
pub fn effective_target(target: MoveTarget, move_id: &MoveId) -> MoveTarget {
    if !is_multi_target(target, move_id) || !matches!(target, MoveTarget::Selected | MoveTarget::RandomOpponent) {
        return target;
    }
    if HITS_ALLIES.contains(&move_id.as_str()) {
        MoveTarget::AllAdjacent
    } else {
        MoveTarget::AllAdjacentFoes
    }
}

/// Pull a single-target move onto a Spotlight, Rage Powder or Follow Me user
/// on the targeted side, in that order of precedence.
pub fn redirect(state: &BattleState, user: CombatantRef, original: CombatantRef) -> CombatantRef {
    if original.side == user.side {
        return original;
    }
    let defenders = state.active_refs(original.side);
    let find = |pred: fn(&Volatile) -> bool| {
        defenders
            .iter()
            .copied()
            .find(|who| state.pokemon(*who).is_some_and(|p| pred(&p.volatile)))
    };
    find(|v| v.spotlight)
        .or_else(|| find(|v| v.rage_powder))
        .or_else(|| find(|v| v.follow_me))
        .unwrap_or(original)
}

/// Concrete targets for a move, in slot order.
///
/// A single target that has fainted is replaced by a random living opponent.
/// Returns an empty list when nobody is left to hit.
pub fn resolve_targets(
    state: &BattleState,
    user: CombatantRef,
    target: MoveTarget,
    selected: Option<CombatantRef>,
    rng: &mut TurnRng,
) -> Vec<CombatantRef> {
    let opponents = state.opponents_of(user);
    match target {
        MoveTarget::User | MoveTarget::Field => vec![user],
        MoveTarget::Selected => {
            let chosen = match selected {
                Some(who) if who != user && state.is_alive(who) => Some(who),
                _ => random_pick(&opponents, rng),
            };
            chosen
                .map(|who| vec![redirect(state, user, who)])
                .unwrap_or_default()
        }
        MoveTarget::AllOpponents | MoveTarget::AllAdjacentFoes => opponents,
        MoveTarget::AllAllies => state.allies_of(user),
        MoveTarget::AllAdjacent => {
            let mut targets = state.allies_of(user);
            targets.extend(opponents);
            targets.sort();
            targets
        }
        MoveTarget::All => state.all_active_refs(),
        MoveTarget::RandomOpponent => random_pick(&opponents, rng).into_iter().collect(),
        MoveTarget::UserOrAlly => match selected {
            Some(who) if who.side == user.side && state.is_alive(who) => vec![who],
            _ => vec![user],
        },
    }
}

fn random_pick(candidates: &[CombatantRef], rng: &mut TurnRng) -> Option<CombatantRef> {
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.pick_index(RollKind::RandomTarget, candidates.len())])
}

//! Decision making for combatants no player controls.

use crate::battle::action_stack::PlayerAction;
use crate::battle::state::{BattleState, CombatantRef, RollKind, TurnRng};

/// A trait for any system that can decide on a battle action.
pub trait Behavior {
    /// Inspects the battle state and decides on the next action for `actor`.
    fn decide_action(&self, actor: CombatantRef, battle_state: &BattleState, rng: &mut TurnRng) -> PlayerAction;
}

/// Wild Pokemon pick uniformly among the moves they still have PP for, and
/// struggle once everything is spent.
#[derive(Debug, Clone, Copy, Default)]
pub struct WildAi;

impl WildAi {
    pub fn new() -> Self {
        Self
    }
}

impl Behavior for WildAi {
    fn decide_action(&self, actor: CombatantRef, battle_state: &BattleState, rng: &mut TurnRng) -> PlayerAction {
        let usable: Vec<usize> = battle_state
            .pokemon(actor)
            .map(|pokemon| {
                pokemon
                    .moves
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.pp > 0)
                    .map(|(index, _)| index)
                    .collect()
            })
            .unwrap_or_default();

        if usable.is_empty() {
            return PlayerAction::Struggle;
        }
        let pick = rng.pick_index(RollKind::MoveSelection, usable.len());
        PlayerAction::UseMove {
            move_index: usable[pick],
            target: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::{create_wild_battle, TestPokemonBuilder};
    use pretty_assertions::assert_eq;

    const WILD: CombatantRef = CombatantRef::new(1, 0);

    fn battle() -> BattleState {
        create_wild_battle(
            vec![TestPokemonBuilder::new("pikachu", 10).build()],
            TestPokemonBuilder::new("rattata", 10)
                .with_moves(vec!["tackle", "tail-whip", "quick-attack"])
                .build(),
        )
    }

    #[test]
    fn test_skips_moves_without_pp() {
        let mut state = battle();
        state.pokemon_mut(WILD).unwrap().moves[1].pp = 0;

        let mut rng = TurnRng::new_for_test(vec![(RollKind::MoveSelection, 1)]);
        assert_eq!(
            WildAi::new().decide_action(WILD, &state, &mut rng),
            PlayerAction::UseMove {
                move_index: 2,
                target: None
            }
        );
    }

    #[test]
    fn test_struggles_when_out_of_pp() {
        let mut state = battle();
        for slot in state.pokemon_mut(WILD).unwrap().moves.iter_mut() {
            slot.pp = 0;
        }
        assert_eq!(
            WildAi.decide_action(WILD, &state, &mut TurnRng::scripted()),
            PlayerAction::Struggle
        );
    }
}

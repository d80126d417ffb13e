#[cfg(test)]
mod tests {
    use crate::battle::action_stack::PlayerAction;
    use crate::battle::state::{ActionFailureReason, BattleEvent, CombatantRef, DamageCause};
    use crate::battle::tests::common::{
        create_test_battle, engine_for, predictable_rng, run_turn, use_move, TestPokemonBuilder,
    };
    use crate::errors::{ActionError, BattleEngineError};
    use crate::pokemon::StatusCondition;
    use pretty_assertions::assert_eq;
    use schema::MoveId;

    const P1: CombatantRef = CombatantRef::new(0, 0);
    const P2: CombatantRef = CombatantRef::new(1, 0);

    fn battle() -> crate::battle::engine::Battle {
        engine_for(create_test_battle(
            TestPokemonBuilder::new("pikachu", 50)
                .with_moves(vec!["thunderbolt", "tackle"])
                .with_stats(200, 100, 100, 100, 100, 200)
                .build(),
            TestPokemonBuilder::new("rattata", 50)
                .with_moves(vec!["splash"])
                .with_stats(300, 50, 100, 50, 100, 10)
                .build(),
        ))
    }

    #[test]
    fn test_each_use_costs_one_pp() {
        let mut battle = battle();
        let mut rng = predictable_rng();

        run_turn(&mut battle, use_move(0), use_move(0), &mut rng);
        run_turn(&mut battle, use_move(0), use_move(0), &mut rng);

        let pikachu = battle.state().pokemon(P1).unwrap();
        assert_eq!(pikachu.moves[0].pp, 13);
        assert_eq!(pikachu.moves[1].pp, 35);
        assert_eq!(battle.state().pokemon(P2).unwrap().moves[0].pp, 38);
    }

    #[test]
    fn test_empty_move_is_rejected() {
        let mut battle = battle();
        battle.state_mut().pokemon_mut(P1).unwrap().moves[1].pp = 0;

        assert_eq!(
            battle.submit_action(P1, use_move(1)),
            Err(BattleEngineError::Action(ActionError::NoPpRemaining {
                pokemon: "Pikachu".to_string(),
                move_id: MoveId::new("tackle"),
            }))
        );
        assert_eq!(battle.pending_actors(), vec![P1, P2]);
        assert_eq!(battle.submit_action(P1, use_move(0)), Ok(()));
    }

    #[test]
    fn test_unknown_move_slot_is_rejected() {
        let mut battle = battle();
        assert_eq!(
            battle.submit_action(P1, use_move(3)),
            Err(BattleEngineError::Action(ActionError::MoveNotKnown {
                pokemon: "Pikachu".to_string(),
                move_index: 3,
            }))
        );
    }

    #[test]
    fn test_struggle_is_refused_while_any_move_has_pp() {
        let mut battle = battle();
        battle.state_mut().pokemon_mut(P1).unwrap().moves[0].pp = 0;

        assert_eq!(
            battle.submit_action(P1, PlayerAction::Struggle),
            Err(BattleEngineError::Action(ActionError::StruggleNotAllowed(
                "Pikachu".to_string()
            )))
        );
        assert_eq!(battle.pending_actors(), vec![P1, P2]);

        battle.state_mut().pokemon_mut(P1).unwrap().moves[1].pp = 0;
        assert_eq!(battle.submit_action(P1, PlayerAction::Struggle), Ok(()));
    }

    #[test]
    fn test_struggle_costs_a_quarter_of_max_hp() {
        let mut battle = battle();
        for slot in battle.state_mut().pokemon_mut(P1).unwrap().moves.iter_mut() {
            slot.pp = 0;
        }

        let report = run_turn(&mut battle, PlayerAction::Struggle, use_move(0), &mut predictable_rng());

        assert_eq!(battle.state().pokemon(P2).unwrap().current_hp(), 300 - 24);
        assert_eq!(battle.state().pokemon(P1).unwrap().current_hp(), 150);
        assert!(report.events.iter().any(|event| matches!(
            event,
            BattleEvent::DamageDealt {
                cause: DamageCause::Struggle,
                damage: 50,
                ..
            }
        )));
        assert!(report
            .log
            .contains(&"Pikachu is damaged by recoil! (50 damage)".to_string()));
    }

    #[test]
    fn test_sleeping_pokemon_keeps_its_pp() {
        let mut battle = engine_for(create_test_battle(
            TestPokemonBuilder::new("pikachu", 50)
                .with_moves(vec!["thunderbolt"])
                .with_status(StatusCondition::Sleep(3))
                .build(),
            TestPokemonBuilder::new("rattata", 50).with_moves(vec!["splash"]).build(),
        ));

        let report = run_turn(&mut battle, use_move(0), use_move(0), &mut predictable_rng());

        assert!(report.events.contains(&BattleEvent::ActionPrevented {
            pokemon: "Pikachu".to_string(),
            reason: ActionFailureReason::IsAsleep,
        }));
        let pikachu = battle.state().pokemon(P1).unwrap();
        assert_eq!(pikachu.moves[0].pp, 15);
        assert_eq!(pikachu.status, Some(StatusCondition::Sleep(2)));
    }
}

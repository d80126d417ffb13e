#[cfg(test)]
mod tests {
    use crate::battle::engine::BattleOutcome;
    use crate::battle::state::{BattleEvent, CombatantRef, GameState};
    use crate::battle::tests::common::{
        create_team_battle, create_test_battle, engine_for, predictable_rng, run_turn, use_move, TestPokemonBuilder,
    };
    use crate::errors::{BattleEngineError, BattleStateError};
    use pretty_assertions::assert_eq;

    const P1: CombatantRef = CombatantRef::new(0, 0);
    const P2: CombatantRef = CombatantRef::new(1, 0);

    fn bonded_gastly() -> crate::battle::combatant::BattlePokemon {
        TestPokemonBuilder::new("gastly", 50)
            .with_moves(vec!["destiny-bond"])
            .with_stats(100, 50, 50, 50, 50, 200)
            .with_hp(1)
            .build()
    }

    fn thunderbolt_pikachu() -> crate::battle::combatant::BattlePokemon {
        TestPokemonBuilder::new("pikachu", 50)
            .with_moves(vec!["thunderbolt"])
            .with_stats(100, 50, 50, 100, 50, 100)
            .build()
    }

    #[test]
    fn test_destiny_bond_takes_the_attacker_down() {
        let mut battle = engine_for(create_test_battle(thunderbolt_pikachu(), bonded_gastly()));

        let report = run_turn(&mut battle, use_move(0), use_move(0), &mut predictable_rng());

        for line in &report.log {
            println!("{}", line);
        }
        assert!(battle.state().pokemon(P1).unwrap().is_fainted());
        assert!(battle.state().pokemon(P2).unwrap().is_fainted());
        assert_eq!(report.game_state, GameState::BothFaintedNoBackup);
        assert_eq!(report.outcome, BattleOutcome::Draw);
        assert!(report.log.contains(&"Pikachu fainted!".to_string()));
        assert!(report.log.contains(&"Gastly fainted!".to_string()));
    }

    #[test]
    fn test_double_knockout_waits_for_both_replacements() {
        let mut battle = engine_for(create_team_battle(
            vec![
                thunderbolt_pikachu(),
                TestPokemonBuilder::new("squirtle", 50).with_moves(vec!["tackle"]).build(),
            ],
            vec![
                bonded_gastly(),
                TestPokemonBuilder::new("rattata", 50).with_moves(vec!["tackle"]).build(),
            ],
        ));

        let report = run_turn(&mut battle, use_move(0), use_move(0), &mut predictable_rng());
        assert_eq!(report.game_state, GameState::BothFaintedWithBackup);
        assert!(report
            .events
            .contains(&BattleEvent::ReplacementRequired { side: 0, slot: 0 }));
        assert!(report
            .events
            .contains(&BattleEvent::ReplacementRequired { side: 1, slot: 0 }));

        assert_eq!(
            battle.resolve_turn(&mut predictable_rng()).unwrap_err(),
            BattleEngineError::BattleState(BattleStateError::AwaitingForcedSwitch { side: 0 })
        );
        assert_eq!(
            battle.submit_forced_switch(P2, 0).unwrap_err(),
            BattleEngineError::Action(crate::errors::ActionError::InvalidSwitchTarget(0))
        );

        let report = battle.submit_forced_switch(P1, 1).unwrap();
        assert_eq!(report.game_state, GameState::AwaitingForcedSwitch);
        assert_eq!(
            battle.submit_forced_switch(P1, 1).unwrap_err(),
            BattleEngineError::BattleState(BattleStateError::NoForcedSwitchPending(P1))
        );

        let report = battle.submit_forced_switch(P2, 1).unwrap();
        assert_eq!(report.game_state, GameState::Ongoing);
        assert_eq!(battle.state().pokemon(P1).unwrap().name, "Squirtle");
        assert_eq!(battle.state().pokemon(P2).unwrap().name, "Rattata");
        assert_eq!(battle.pending_actors(), vec![P1, P2]);
    }

    #[test]
    fn test_faint_clears_status_and_stages() {
        let mut battle = engine_for(create_test_battle(
            TestPokemonBuilder::new("pikachu", 50)
                .with_moves(vec!["tackle"])
                .with_stats(100, 200, 100, 50, 50, 200)
                .build(),
            TestPokemonBuilder::new("rattata", 50)
                .with_moves(vec!["splash"])
                .with_stats(10, 50, 50, 50, 50, 10)
                .with_status(crate::pokemon::StatusCondition::Poison)
                .build(),
        ));

        run_turn(&mut battle, use_move(0), use_move(0), &mut predictable_rng());

        let fainted = battle.state().pokemon(P2).unwrap();
        assert!(fainted.is_fainted());
        assert_eq!(fainted.status, None);
        assert!(fainted.stages().is_neutral());
        assert_eq!(battle.outcome(), BattleOutcome::Victory);
    }
}

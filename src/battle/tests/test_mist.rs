#[cfg(test)]
mod tests {
    use crate::battle::conditions::SideCondition;
    use crate::battle::state::{BattleEvent, CombatantRef};
    use crate::battle::tests::common::{
        create_test_battle, engine_for, predictable_rng, run_turn, use_move, TestPokemonBuilder,
    };
    use pretty_assertions::assert_eq;
    use schema::StatType;

    const P1: CombatantRef = CombatantRef::new(0, 0);
    const P2: CombatantRef = CombatantRef::new(1, 0);

    fn battle() -> crate::battle::engine::Battle {
        engine_for(create_test_battle(
            TestPokemonBuilder::new("pikachu", 50)
                .with_moves(vec!["growl", "tail-whip"])
                .with_stats(300, 50, 50, 50, 50, 50)
                .build(),
            TestPokemonBuilder::new("squirtle", 50)
                .with_moves(vec!["mist", "close-combat"])
                .with_stats(300, 50, 50, 50, 50, 200)
                .build(),
        ))
    }

    #[test]
    fn test_mist_blocks_opponent_stat_drops() {
        let mut battle = battle();

        let report = run_turn(&mut battle, use_move(0), use_move(0), &mut predictable_rng());

        for event in &report.events {
            println!("  {:?}", event);
        }
        assert!(report.events.contains(&BattleEvent::SideConditionStarted {
            side: 1,
            condition: SideCondition::Mist,
        }));
        let blocked = report
            .events
            .iter()
            .filter(|event| matches!(event, BattleEvent::StatChangeBlocked { reason, .. } if reason.contains("Mist")))
            .count();
        assert_eq!(blocked, 1, "Should have StatChangeBlocked event for Mist protection");
        assert_eq!(battle.state().pokemon(P2).unwrap().stage(StatType::Atk), 0);
    }

    #[test]
    fn test_mist_does_not_stop_self_inflicted_drops() {
        let mut battle = battle();
        let mut rng = predictable_rng();
        run_turn(&mut battle, use_move(0), use_move(0), &mut rng);

        let report = run_turn(&mut battle, use_move(1), use_move(1), &mut rng);

        // Tail Whip is still turned away; Close Combat's own drops are not.
        let blocked = report
            .events
            .iter()
            .filter(|event| matches!(event, BattleEvent::StatChangeBlocked { .. }))
            .count();
        assert_eq!(blocked, 1);
        let squirtle = battle.state().pokemon(P2).unwrap();
        assert_eq!(squirtle.stage(StatType::Def), -1);
        assert_eq!(squirtle.stage(StatType::SpDef), -1);
    }

    #[test]
    fn test_unprotected_side_takes_the_drop() {
        let mut battle = battle();

        run_turn(&mut battle, use_move(1), use_move(1), &mut predictable_rng());

        assert!(!battle.state().sides[1].conditions.has(SideCondition::Mist));
        assert_eq!(battle.state().pokemon(P2).unwrap().stage(StatType::Def), -2);
        assert_eq!(battle.state().pokemon(P1).unwrap().stage(StatType::Def), 0);
    }
}

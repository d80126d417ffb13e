#[cfg(test)]
mod tests {
    use crate::battle::conditions::TimedMove;
    use crate::battle::engine::Battle;
    use crate::battle::state::{BattleEvent, CombatantRef, Restriction};
    use crate::battle::tests::common::{
        create_test_battle, custom_move, engine_for, predictable_rng, run_turn, teach_move, use_move,
        TestPokemonBuilder,
    };
    use pretty_assertions::assert_eq;
    use schema::{Effect, EffectKind, EffectTarget, MoveCategory, MoveId, PokemonType};

    const P1: CombatantRef = CombatantRef::new(0, 0);
    const P2: CombatantRef = CombatantRef::new(1, 0);

    /// A fast Pikachu against a slow Rattata that always tackles.
    fn duel(moves: Vec<&str>) -> Battle {
        engine_for(create_test_battle(
            TestPokemonBuilder::new("pikachu", 50)
                .with_moves(moves)
                .with_stats(300, 100, 100, 100, 100, 200)
                .build(),
            TestPokemonBuilder::new("rattata", 50)
                .with_moves(vec!["tackle"])
                .with_stats(300, 50, 100, 50, 100, 10)
                .build(),
        ))
    }

    fn restricted(name: &str, restriction: Restriction) -> BattleEvent {
        BattleEvent::MoveRestricted {
            pokemon: "Pikachu".to_string(),
            move_name: name.to_string(),
            restriction,
        }
    }

    fn used(events: &[BattleEvent], who: &str) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                BattleEvent::MoveUsed { pokemon, move_name } if pokemon == who => Some(move_name.clone()),
                _ => None,
            })
            .collect()
    }

    /// The blocked move keeps its PP and the foe's tackle still lands.
    fn assert_blocked(battle: &Battle, events: &[BattleEvent], expected: BattleEvent, slot: usize, full_pp: u8) {
        assert!(events.contains(&expected), "missing {:?} in {:?}", expected, events);
        assert!(used(events, "Pikachu").is_empty());
        assert_eq!(used(events, "Rattata"), vec!["Tackle".to_string()]);
        assert!(battle.state().pokemon(P1).unwrap().current_hp() < 300);
        assert_eq!(battle.state().pokemon(P1).unwrap().moves[slot].pp, full_pp);
    }

    #[test]
    fn test_disabled_move_cannot_be_used() {
        let mut battle = duel(vec!["tackle", "growl"]);
        battle.state_mut().pokemon_mut(P1).unwrap().volatile.disable = Some(TimedMove {
            move_id: MoveId::new("tackle"),
            turns_remaining: 4,
        });

        let report = run_turn(&mut battle, use_move(0), use_move(0), &mut predictable_rng());

        assert_blocked(&battle, &report.events, restricted("Tackle", Restriction::Disabled), 0, 35);
        assert!(report.log.contains(&"Pikachu's Tackle is disabled!".to_string()));
    }

    #[test]
    fn test_disable_leaves_other_moves_alone() {
        let mut battle = duel(vec!["tackle", "growl"]);
        battle.state_mut().pokemon_mut(P1).unwrap().volatile.disable = Some(TimedMove {
            move_id: MoveId::new("tackle"),
            turns_remaining: 4,
        });

        let report = run_turn(&mut battle, use_move(1), use_move(0), &mut predictable_rng());

        assert_eq!(used(&report.events, "Pikachu"), vec!["Growl".to_string()]);
        assert!(!report
            .events
            .iter()
            .any(|event| matches!(event, BattleEvent::MoveRestricted { .. })));
    }

    #[test]
    fn test_encore_applied_mid_turn_blocks_a_different_move() {
        // Here Rattata is the faster side and encores Pikachu's last Tackle.
        let mut battle = engine_for(create_test_battle(
            TestPokemonBuilder::new("pikachu", 50)
                .with_moves(vec!["tackle", "growl"])
                .with_stats(300, 100, 100, 100, 100, 10)
                .build(),
            TestPokemonBuilder::new("rattata", 50)
                .with_moves(vec!["splash"])
                .with_stats(300, 50, 100, 50, 100, 200)
                .build(),
        ));
        let mut encore = custom_move("encore", PokemonType::Normal, MoveCategory::Status, 0);
        encore.effect.effects = vec![Effect::new(EffectKind::Encore, EffectTarget::Target, 100)];
        teach_move(&mut battle, P2, 0, encore);
        battle.state_mut().pokemon_mut(P1).unwrap().volatile.last_move = Some(MoveId::new("tackle"));

        let report = run_turn(&mut battle, use_move(1), use_move(0), &mut predictable_rng());

        assert_eq!(used(&report.events, "Rattata"), vec!["Encore".to_string()]);
        assert!(report.events.contains(&restricted("Growl", Restriction::Encored)));
        assert!(used(&report.events, "Pikachu").is_empty());
        let pikachu = battle.state().pokemon(P1).unwrap();
        assert_eq!(pikachu.moves[1].pp, 40);
        assert_eq!(
            pikachu.volatile.encore.as_ref().map(|encore| encore.move_id.clone()),
            Some(MoveId::new("tackle"))
        );
    }

    #[test]
    fn test_taunt_blocks_status_moves() {
        let mut battle = duel(vec!["growl"]);
        battle.state_mut().pokemon_mut(P1).unwrap().volatile.taunt_turns = 3;

        let report = run_turn(&mut battle, use_move(0), use_move(0), &mut predictable_rng());

        assert_blocked(&battle, &report.events, restricted("Growl", Restriction::Taunted), 0, 40);
    }

    #[test]
    fn test_torment_blocks_repeating_the_last_move() {
        let mut battle = duel(vec!["tackle"]);
        {
            let volatile = &mut battle.state_mut().pokemon_mut(P1).unwrap().volatile;
            volatile.tormented = true;
            volatile.last_move = Some(MoveId::new("tackle"));
        }

        let report = run_turn(&mut battle, use_move(0), use_move(0), &mut predictable_rng());

        assert_blocked(&battle, &report.events, restricted("Tackle", Restriction::Tormented), 0, 35);
    }

    #[test]
    fn test_heal_block_stops_recovery() {
        let mut battle = duel(vec!["recover"]);
        battle.state_mut().pokemon_mut(P1).unwrap().volatile.heal_block_turns = 5;

        let report = run_turn(&mut battle, use_move(0), use_move(0), &mut predictable_rng());

        assert_blocked(&battle, &report.events, restricted("Recover", Restriction::HealBlocked), 0, 10);
    }

    #[test]
    fn test_imprison_seals_moves_the_foe_knows() {
        let mut battle = duel(vec!["tackle"]);
        battle.state_mut().pokemon_mut(P2).unwrap().volatile.imprisoning = true;

        let report = run_turn(&mut battle, use_move(0), use_move(0), &mut predictable_rng());

        assert_blocked(&battle, &report.events, restricted("Tackle", Restriction::Imprisoned), 0, 35);
    }
}

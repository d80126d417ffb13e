#[cfg(test)]
mod tests {
    use crate::battle::state::{ActionFailureReason, BattleEvent, CombatantRef, DamageCause, RollKind, TurnRng};
    use crate::battle::tests::common::{
        create_test_battle, custom_move, engine_for, predictable_rng, run_turn, teach_move, use_move,
        TestPokemonBuilder,
    };
    use crate::pokemon::StatusCondition;
    use pretty_assertions::assert_eq;
    use schema::{DamageKind, Effect, EffectKind, EffectTarget, MoveCategory, PokemonType};

    const P1: CombatantRef = CombatantRef::new(0, 0);
    const P2: CombatantRef = CombatantRef::new(1, 0);

    fn hp(battle: &crate::battle::engine::Battle, who: CombatantRef) -> u16 {
        battle.state().pokemon(who).unwrap().current_hp()
    }

    /// Pidgey with a 40-power fire move that burns 30% of the time against
    /// a Rattata that never attacks. Each hit deals exactly 40.
    fn scorch_battle() -> crate::battle::engine::Battle {
        let state = create_test_battle(
            TestPokemonBuilder::new("pidgey", 50)
                .with_moves(vec!["splash"])
                .with_stats(100, 50, 50, 216, 50, 200)
                .build(),
            TestPokemonBuilder::new("rattata", 50)
                .with_moves(vec!["splash"])
                .with_stats(100, 50, 50, 50, 100, 10)
                .build(),
        );
        let mut battle = engine_for(state);
        let mut scorch = custom_move("scorch", PokemonType::Fire, MoveCategory::Special, 40);
        scorch.effect.effects = vec![Effect::new(EffectKind::Burn, EffectTarget::Target, 30)];
        teach_move(&mut battle, P1, 0, scorch);
        battle
    }

    #[test]
    fn test_secondary_burn_lands_on_a_low_roll() {
        let mut battle = scorch_battle();
        let mut rng = TurnRng::new_for_test(vec![(RollKind::EffectChance, 30)]);

        let report = run_turn(&mut battle, use_move(0), use_move(0), &mut rng);

        assert_eq!(hp(&battle, P2), 60);
        assert_eq!(battle.state().pokemon(P2).unwrap().status, Some(StatusCondition::Burn));
        assert!(report
            .events
            .iter()
            .any(|event| matches!(event, BattleEvent::StatusApplied { .. })));
    }

    #[test]
    fn test_secondary_burn_misses_on_a_high_roll() {
        let mut battle = scorch_battle();
        let mut rng = TurnRng::new_for_test(vec![(RollKind::EffectChance, 31)]);

        let report = run_turn(&mut battle, use_move(0), use_move(0), &mut rng);

        assert_eq!(hp(&battle, P2), 60);
        assert_eq!(battle.state().pokemon(P2).unwrap().status, None);
        assert!(!report
            .events
            .iter()
            .any(|event| matches!(event, BattleEvent::StatusApplied { .. })));
        assert!(report.log.contains(&"Rattata took 40 damage!".to_string()));
    }

    #[test]
    fn test_recoil_is_a_share_of_damage_dealt() {
        let state = create_test_battle(
            TestPokemonBuilder::new("pikachu", 50)
                .with_moves(vec!["double-edge"])
                .with_stats(200, 100, 100, 50, 50, 200)
                .build(),
            TestPokemonBuilder::new("rattata", 50)
                .with_moves(vec!["splash"])
                .with_stats(300, 50, 100, 50, 50, 10)
                .build(),
        );
        let mut battle = engine_for(state);

        let report = run_turn(&mut battle, use_move(0), use_move(0), &mut predictable_rng());

        // 120 power: 22 * 120 * 100 / 100 / 50 + 2 = 54, then a third of it back.
        assert_eq!(hp(&battle, P2), 300 - 54);
        assert_eq!(hp(&battle, P1), 200 - 17);
        assert!(report.events.iter().any(|event| matches!(
            event,
            BattleEvent::DamageDealt {
                cause: DamageCause::Recoil,
                damage: 17,
                ..
            }
        )));
    }

    #[test]
    fn test_drain_heals_half_the_damage() {
        let state = create_test_battle(
            TestPokemonBuilder::new("pikachu", 50)
                .with_moves(vec!["giga-drain"])
                .with_stats(200, 50, 50, 100, 100, 200)
                .with_hp(100)
                .build(),
            TestPokemonBuilder::new("rattata", 50)
                .with_moves(vec!["splash"])
                .with_stats(300, 50, 50, 50, 100, 10)
                .build(),
        );
        let mut battle = engine_for(state);

        let report = run_turn(&mut battle, use_move(0), use_move(0), &mut predictable_rng());

        assert_eq!(hp(&battle, P2), 300 - 35);
        assert_eq!(hp(&battle, P1), 100 + 17);
        assert!(report
            .events
            .iter()
            .any(|event| matches!(event, BattleEvent::PokemonHealed { amount: 17, .. })));
    }

    #[test]
    fn test_secondary_effects_skip_a_substitute() {
        let state = create_test_battle(
            TestPokemonBuilder::new("pikachu", 50)
                .with_moves(vec!["thunder-shock"])
                .with_stats(200, 50, 50, 100, 100, 200)
                .build(),
            TestPokemonBuilder::new("rattata", 50)
                .with_moves(vec!["splash"])
                .with_stats(300, 50, 50, 50, 100, 10)
                .build(),
        );
        let mut battle = engine_for(state);
        battle.state_mut().pokemon_mut(P2).unwrap().volatile.substitute_hp = 75;
        let mut rng = TurnRng::new_for_test(vec![(RollKind::EffectChance, 1)]);

        let report = run_turn(&mut battle, use_move(0), use_move(0), &mut rng);

        assert_eq!(hp(&battle, P2), 300);
        assert_eq!(battle.state().pokemon(P2).unwrap().status, None);
        assert!(report
            .events
            .iter()
            .any(|event| matches!(event, BattleEvent::SubstituteDamaged { .. })));
    }

    fn spit_up_battle(stockpile: u8) -> crate::battle::engine::Battle {
        let mut battle = engine_for(create_test_battle(
            TestPokemonBuilder::new("pikachu", 50)
                .with_moves(vec!["splash"])
                .with_stats(200, 50, 100, 100, 100, 200)
                .build(),
            TestPokemonBuilder::new("rattata", 50)
                .with_moves(vec!["splash"])
                .with_stats(300, 50, 100, 50, 100, 10)
                .build(),
        ));
        let mut spit_up = custom_move("spit-up", PokemonType::Normal, MoveCategory::Special, 0);
        spit_up.effect.damage_kind = DamageKind::SpitUp;
        spit_up.effect.effects = vec![Effect::new(EffectKind::SpitUp, EffectTarget::User, 100)];
        teach_move(&mut battle, P1, 0, spit_up);
        battle.state_mut().pokemon_mut(P1).unwrap().volatile.stockpile = stockpile;
        battle
    }

    #[test]
    fn test_spit_up_fails_with_nothing_stockpiled() {
        let mut battle = spit_up_battle(0);

        let report = run_turn(&mut battle, use_move(0), use_move(0), &mut predictable_rng());

        assert!(report.events.contains(&BattleEvent::ActionFailed {
            pokemon: "Pikachu".to_string(),
            reason: ActionFailureReason::Failed,
        }));
        assert!(!report
            .events
            .iter()
            .any(|event| matches!(event, BattleEvent::MoveHit { .. })));
        assert_eq!(hp(&battle, P2), 300);
        assert_eq!(battle.state().pokemon(P1).unwrap().moves[0].pp, 9);
    }

    #[test]
    fn test_spit_up_spends_the_stockpile() {
        let mut battle = spit_up_battle(2);

        run_turn(&mut battle, use_move(0), use_move(0), &mut predictable_rng());

        assert!(hp(&battle, P2) < 300);
        assert_eq!(battle.state().pokemon(P1).unwrap().volatile.stockpile, 0);
    }
}

// --- IMPORTS ---
use super::{failed, EffectContext};
use crate::battle::conditions::SideCondition;
use crate::battle::field::FieldEffect;
use crate::battle::state::{BattleEvent, BattleState};
use schema::WeatherKind;

// --- STANDALONE HELPER FUNCTIONS ---

/// Screens, Mist and Safeguard go up on the user's own side.
pub(super) fn apply_side_condition_effect(
    state: &mut BattleState,
    ctx: &EffectContext,
    condition: SideCondition,
) -> Vec<BattleEvent> {
    let side = ctx.attacker.side;
    let turns = match condition {
        SideCondition::Reflect | SideCondition::LightScreen => state.config.screen_turns,
        SideCondition::Mist => state.config.mist_turns,
        SideCondition::Safeguard => state.config.safeguard_turns,
        SideCondition::Spikes => return apply_spikes_effect(state, ctx),
    };
    if !state.sides[side].conditions.start(condition, turns) {
        return failed(state, ctx.attacker);
    }
    vec![BattleEvent::SideConditionStarted { side, condition }]
}

/// Spikes are laid on the opposing side, up to the layer cap.
pub(super) fn apply_spikes_effect(state: &mut BattleState, ctx: &EffectContext) -> Vec<BattleEvent> {
    let side = ctx.attacker.opposing_side();
    let max = state.config.max_spikes_layers;
    match state.field.add_spikes(side, max) {
        Some(layers) => vec![BattleEvent::SpikesLaid { side, layers }],
        None => failed(state, ctx.attacker),
    }
}

pub(super) fn apply_weather_effect(state: &mut BattleState, ctx: &EffectContext, weather: WeatherKind) -> Vec<BattleEvent> {
    let turns = state.config.weather_turns;
    if !state.field.set_weather(weather, turns) {
        return failed(state, ctx.attacker);
    }
    vec![BattleEvent::WeatherStarted { weather }]
}

/// Using Trick Room while it is up ends it early.
pub(super) fn apply_trick_room_effect(state: &mut BattleState) -> Vec<BattleEvent> {
    let effect = FieldEffect::TrickRoom;
    if state.field.is_active(effect) {
        state.field.end(effect);
        return vec![BattleEvent::FieldEffectEnded { effect }];
    }
    state.field.start(effect, state.config.room_turns);
    vec![BattleEvent::FieldEffectStarted { effect }]
}

pub(super) fn apply_field_effect(state: &mut BattleState, ctx: &EffectContext, effect: FieldEffect) -> Vec<BattleEvent> {
    let turns = match effect {
        FieldEffect::TrickRoom | FieldEffect::Gravity => state.config.room_turns,
        FieldEffect::MudSport | FieldEffect::WaterSport => state.config.sport_turns,
    };
    if !state.field.start(effect, turns) {
        return failed(state, ctx.attacker);
    }
    vec![BattleEvent::FieldEffectStarted { effect }]
}

#[cfg(test)]
mod tests {
    use super::super::{apply_effect, EffectContext};
    use crate::battle::conditions::SideCondition;
    use crate::battle::field::FieldEffect;
    use crate::battle::state::{BattleEvent, BattleState, CombatantRef, TurnRng};
    use crate::battle::tests::common::{create_test_battle, TestPokemonBuilder};
    use pretty_assertions::assert_eq;
    use schema::{Effect, EffectKind, EffectTarget, MoveId, WeatherKind};

    const P1: CombatantRef = CombatantRef::new(0, 0);
    const P2: CombatantRef = CombatantRef::new(1, 0);

    fn duel() -> BattleState {
        create_test_battle(
            TestPokemonBuilder::new("pikachu", 50).build(),
            TestPokemonBuilder::new("rattata", 50).build(),
        )
    }

    fn run(state: &mut BattleState, kind: EffectKind) -> Vec<BattleEvent> {
        let ctx = EffectContext::new(P1, P2, MoveId::new("test-move"));
        apply_effect(state, &ctx, &Effect::new(kind, EffectTarget::Field, 100), &mut TurnRng::scripted())
    }

    #[test]
    fn test_reflect_goes_up_on_own_side_once() {
        let mut state = duel();
        let events = run(&mut state, EffectKind::Reflect);
        assert_eq!(
            events,
            vec![BattleEvent::SideConditionStarted {
                side: 0,
                condition: SideCondition::Reflect,
            }]
        );
        assert_eq!(state.sides[0].conditions.reflect_turns, 5);

        let events = run(&mut state, EffectKind::Reflect);
        assert!(matches!(events[0], BattleEvent::ActionFailed { .. }));
    }

    #[test]
    fn test_spikes_stack_to_three_on_foe_side() {
        let mut state = duel();
        for expected in 1..=3 {
            let events = run(&mut state, EffectKind::Spikes);
            assert_eq!(events, vec![BattleEvent::SpikesLaid { side: 1, layers: expected }]);
        }
        let events = run(&mut state, EffectKind::Spikes);
        assert!(matches!(events[0], BattleEvent::ActionFailed { .. }));
        assert_eq!(state.field.spikes_layers, [0, 3]);
    }

    #[test]
    fn test_same_weather_fails() {
        let mut state = duel();
        run(&mut state, EffectKind::Weather(WeatherKind::Rain));
        assert_eq!(state.field.weather_kind(), WeatherKind::Rain);
        let events = run(&mut state, EffectKind::Weather(WeatherKind::Rain));
        assert!(matches!(events[0], BattleEvent::ActionFailed { .. }));

        run(&mut state, EffectKind::Weather(WeatherKind::Sun));
        assert_eq!(state.field.weather_kind(), WeatherKind::Sun);
    }

    #[test]
    fn test_trick_room_toggles() {
        let mut state = duel();
        run(&mut state, EffectKind::TrickRoom);
        assert!(state.field.is_active(FieldEffect::TrickRoom));
        let events = run(&mut state, EffectKind::TrickRoom);
        assert_eq!(
            events,
            vec![BattleEvent::FieldEffectEnded {
                effect: FieldEffect::TrickRoom
            }]
        );
        assert!(!state.field.is_active(FieldEffect::TrickRoom));
    }
}

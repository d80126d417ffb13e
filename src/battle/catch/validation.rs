use crate::battle::state::{BattleKind, BattleState, CombatantRef};
use crate::errors::ActionError;

/// Balls can only be thrown in wild battles.
pub fn is_catch_allowed(kind: BattleKind) -> bool {
    matches!(kind, BattleKind::Wild)
}

/// Check a throw from `thrower` and return the combatant it would target.
///
/// Only the player's side may throw. The target is the first standing
/// combatant on the other side.
pub fn capture_target(state: &BattleState, thrower: CombatantRef) -> Result<CombatantRef, ActionError> {
    if !is_catch_allowed(state.kind) {
        return Err(ActionError::NotAllowedInBattleKind(state.kind.to_string()));
    }
    if thrower.side != BattleKind::PLAYER_SIDE {
        return Err(ActionError::NotPlayerSide(thrower));
    }
    state
        .opponents_of(thrower)
        .into_iter()
        .next()
        .ok_or(ActionError::NotActive(CombatantRef::new(thrower.opposing_side(), 0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::{create_test_battle, create_wild_battle, TestPokemonBuilder};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_catch_only_in_wild_battles() {
        let trainer = create_test_battle(
            TestPokemonBuilder::new("pikachu", 20).build(),
            TestPokemonBuilder::new("rattata", 20).build(),
        );
        assert_eq!(
            capture_target(&trainer, CombatantRef::new(0, 0)),
            Err(ActionError::NotAllowedInBattleKind("trainer".to_string()))
        );

        let wild = create_wild_battle(
            vec![TestPokemonBuilder::new("pikachu", 20).build()],
            TestPokemonBuilder::new("rattata", 20).build(),
        );
        assert_eq!(
            capture_target(&wild, CombatantRef::new(0, 0)),
            Ok(CombatantRef::new(1, 0))
        );
    }

    #[test]
    fn test_wild_side_cannot_throw() {
        let wild = create_wild_battle(
            vec![TestPokemonBuilder::new("pikachu", 20).build()],
            TestPokemonBuilder::new("rattata", 20).build(),
        );
        assert_eq!(
            capture_target(&wild, CombatantRef::new(1, 0)),
            Err(ActionError::NotPlayerSide(CombatantRef::new(1, 0)))
        );
    }

    #[test]
    fn test_fainted_target_cannot_be_caught() {
        let wild = create_wild_battle(
            vec![TestPokemonBuilder::new("pikachu", 20).build()],
            TestPokemonBuilder::new("rattata", 20).with_hp(0).build(),
        );
        assert!(capture_target(&wild, CombatantRef::new(0, 0)).is_err());
    }
}

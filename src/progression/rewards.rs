use super::participation::BattleParticipationTracker;
use crate::battle::state::{BattleEvent, BattleState};
use crate::pokemon::add_evs;
use tracing::debug;

// Constants for reward calculations
const EXP_DIVISOR: u32 = 7;

/// What one participant earns from a single knockout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardShare {
    pub team_index: usize,
    pub experience: u32,
    /// EVs actually gained after the caps.
    pub evs: [u8; 6],
}

/// Experience and effort yields for knockouts.
///
/// One policy covers wild, trainer and raid battles: the experience is split
/// evenly among the standing participants and each of them gets the full EV
/// yield.
pub struct RewardCalculator;

impl RewardCalculator {
    /// `floor(base_exp * level / 7 / participants)`, with the count floored at 1.
    pub fn experience_share(base_exp: u16, level: u8, participants: usize) -> u32 {
        let participants = participants.max(1) as u32;
        base_exp as u32 * level as u32 / EXP_DIVISOR / participants
    }

    /// Hand out rewards for the knocked-out team member `fainted_index` of
    /// `fainted_side`. Returns the shares and the matching events.
    pub fn award_for_faint(
        state: &mut BattleState,
        tracker: &BattleParticipationTracker,
        fainted_side: usize,
        fainted_index: usize,
    ) -> (Vec<RewardShare>, Vec<BattleEvent>) {
        let mut shares = Vec::new();
        let mut events = Vec::new();
        let Some(fainted) = state.sides[fainted_side].team.get(fainted_index) else {
            return (shares, events);
        };
        let (base_exp, level, ev_yield) = (fainted.base_exp, fainted.level, fainted.ev_yield);

        let winner_side = 1 - fainted_side;
        if !state.kind.side_earns_rewards(winner_side) {
            return (shares, events);
        }
        let eligible: Vec<usize> = tracker
            .get_participants_against(fainted_side, fainted_index)
            .into_iter()
            .filter(|&index| {
                state.sides[winner_side]
                    .team
                    .get(index)
                    .is_some_and(|p| !p.is_fainted())
            })
            .collect();
        if eligible.is_empty() {
            return (shares, events);
        }

        let experience = Self::experience_share(base_exp, level, eligible.len());
        for team_index in eligible {
            let pokemon = &mut state.sides[winner_side].team[team_index];
            pokemon.experience = pokemon.experience.saturating_add(experience);
            let gained = add_evs(&mut pokemon.evs, &ev_yield);
            debug!(pokemon = %pokemon.name, experience, evs = ?gained, "rewards granted");

            events.push(BattleEvent::ExperienceGained {
                pokemon: pokemon.name.clone(),
                amount: experience,
            });
            if gained.iter().any(|&ev| ev > 0) {
                events.push(BattleEvent::EffortGained {
                    pokemon: pokemon.name.clone(),
                    evs: gained,
                });
            }
            shares.push(RewardShare {
                team_index,
                experience,
                evs: gained,
            });
        }
        (shares, events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::{create_team_battle, create_wild_battle, TestPokemonBuilder};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(64, 10, 1, 91)]
    #[case(64, 10, 2, 45)]
    #[case(64, 10, 0, 91)]
    #[case(50, 3, 3, 7)]
    fn test_experience_share(
        #[case] base_exp: u16,
        #[case] level: u8,
        #[case] participants: usize,
        #[case] expected: u32,
    ) {
        assert_eq!(RewardCalculator::experience_share(base_exp, level, participants), expected);
    }

    #[test]
    fn test_wild_pokemon_earn_nothing() {
        let mut state = create_wild_battle(
            vec![TestPokemonBuilder::new("pikachu", 20).build()],
            TestPokemonBuilder::new("rattata", 10).build(),
        );
        state.sides[0].team[0].base_exp = 112;
        state.sides[0].team[0].ev_yield = [0, 0, 0, 0, 0, 2];
        let mut tracker = BattleParticipationTracker::new();
        tracker.record_participation(&[0], &[0]);

        let (shares, events) = RewardCalculator::award_for_faint(&mut state, &tracker, 0, 0);

        assert!(shares.is_empty());
        assert!(events.is_empty());
        assert_eq!(state.sides[1].team[0].experience, 0);
        assert_eq!(state.sides[1].team[0].evs, [0; 6]);
    }

    #[test]
    fn test_only_standing_participants_are_paid() {
        let mut state = create_team_battle(
            vec![
                TestPokemonBuilder::new("pikachu", 20).build(),
                TestPokemonBuilder::new("squirtle", 20).build(),
                TestPokemonBuilder::new("charmander", 20).with_hp(0).build(),
            ],
            vec![TestPokemonBuilder::new("rattata", 10).build()],
        );
        state.sides[1].team[0].base_exp = 70;
        state.sides[1].team[0].ev_yield = [0, 0, 0, 0, 0, 1];

        let mut tracker = BattleParticipationTracker::new();
        tracker.record_participation(&[0], &[0]);
        tracker.record_participation(&[1], &[0]);
        tracker.record_participation(&[2], &[0]);

        let (shares, events) = RewardCalculator::award_for_faint(&mut state, &tracker, 1, 0);
        // 70 * 10 / 7 / 2
        assert_eq!(shares.iter().map(|s| s.experience).collect::<Vec<_>>(), vec![50, 50]);
        assert_eq!(state.sides[0].team[0].experience, 50);
        assert_eq!(state.sides[0].team[1].evs, [0, 0, 0, 0, 0, 1]);
        assert_eq!(state.sides[0].team[2].experience, 0);
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_capped_evs_report_nothing() {
        let mut state = create_team_battle(
            vec![TestPokemonBuilder::new("pikachu", 20).build()],
            vec![TestPokemonBuilder::new("rattata", 10).build()],
        );
        state.sides[0].team[0].evs = [255, 255, 0, 0, 0, 0];
        state.sides[1].team[0].ev_yield = [1, 0, 0, 0, 0, 0];
        let mut tracker = BattleParticipationTracker::new();
        tracker.record_participation(&[0], &[0]);

        let (shares, events) = RewardCalculator::award_for_faint(&mut state, &tracker, 1, 0);
        assert_eq!(shares[0].evs, [0; 6]);
        assert!(events
            .iter()
            .all(|event| !matches!(event, BattleEvent::EffortGained { .. })));
    }
}

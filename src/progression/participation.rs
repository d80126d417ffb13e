use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Tracks which team members have faced each other during a battle.
///
/// Keyed by `(side, team_index)` of the opponent; the value is the set of
/// team indices on the other side that were active at the same time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleParticipationTracker {
    faced_by: BTreeMap<(usize, usize), BTreeSet<usize>>,
}

impl BattleParticipationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that every listed side-0 member faced every listed side-1 member.
    pub fn record_participation(&mut self, side0_active: &[usize], side1_active: &[usize]) {
        for &left in side0_active {
            for &right in side1_active {
                self.faced_by.entry((1, right)).or_default().insert(left);
                self.faced_by.entry((0, left)).or_default().insert(right);
            }
        }
    }

    /// Team indices on the other side that faced `opponent_index` of `opponent_side`.
    pub fn get_participants_against(&self, opponent_side: usize, opponent_index: usize) -> Vec<usize> {
        self.faced_by
            .get(&(opponent_side, opponent_index))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_participation_tracking() {
        let mut tracker = BattleParticipationTracker::new();

        // Side 0's first member faced side 1's second member
        tracker.record_participation(&[0], &[1]);

        assert_eq!(tracker.get_participants_against(1, 1), vec![0]);
        assert_eq!(tracker.get_participants_against(0, 0), vec![1]);
        assert!(tracker.get_participants_against(1, 0).is_empty());
    }

    #[test]
    fn test_raid_records_every_pair() {
        let mut tracker = BattleParticipationTracker::new();
        tracker.record_participation(&[0, 1, 2], &[0]);
        tracker.record_participation(&[0, 1, 2], &[0]);
        tracker.record_participation(&[3], &[0]);

        assert_eq!(tracker.get_participants_against(1, 0), vec![0, 1, 2, 3]);
        assert_eq!(tracker.get_participants_against(0, 3), vec![0]);
    }
}

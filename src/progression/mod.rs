pub mod participation;
pub mod rewards;

pub use participation::BattleParticipationTracker;
pub use rewards::{RewardCalculator, RewardShare};

use crate::battle::combatant::BattlePokemon;
use crate::battle::state::{RollKind, TurnRng};
use crate::pokemon::StatusCondition;
use schema::{BallType, PokemonType};
use serde::{Deserialize, Serialize};

/// Ball modifiers at or above this value catch unconditionally.
pub const GUARANTEED_BALL_MODIFIER: f64 = 255.0;

/// Circumstances of a throw that the caller knows and the engine does not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CaptureConditions {
    /// Turns elapsed in this battle, starting at 1 for the first turn.
    pub turn_count: u32,
    /// The thrower already owns this species.
    pub already_caught: bool,
    /// Surfing, diving or fishing.
    pub underwater: bool,
    /// Night time or inside a cave.
    pub dark_location: bool,
}

/// Multiplier for a ball against a particular target.
pub fn ball_modifier(ball: BallType, conditions: &CaptureConditions, target: &BattlePokemon) -> f64 {
    match ball {
        BallType::PokeBall | BallType::LuxuryBall | BallType::PremierBall => 1.0,
        BallType::GreatBall | BallType::SafariBall => 1.5,
        BallType::UltraBall => 2.0,
        BallType::MasterBall => GUARANTEED_BALL_MODIFIER,
        BallType::NetBall => {
            if target.has_type(PokemonType::Water) || target.has_type(PokemonType::Bug) {
                3.0
            } else {
                1.0
            }
        }
        BallType::DiveBall => {
            if conditions.underwater {
                3.5
            } else {
                1.0
            }
        }
        BallType::NestBall => (40.0 - target.level as f64).div_euclid(10.0).max(1.0),
        BallType::RepeatBall => {
            if conditions.already_caught {
                3.0
            } else {
                1.0
            }
        }
        BallType::TimerBall => ((conditions.turn_count as f64 + 10.0) / 10.0).floor().min(4.0),
        BallType::QuickBall => {
            if conditions.turn_count <= 1 {
                4.0
            } else {
                1.0
            }
        }
        BallType::DuskBall => {
            if conditions.dark_location {
                3.5
            } else {
                1.0
            }
        }
    }
}

/// Sleep and freeze make a catch 2.5x likelier, other major status 1.5x.
pub fn status_bonus(status: Option<StatusCondition>) -> f64 {
    match status {
        Some(StatusCondition::Sleep(_) | StatusCondition::Freeze) => 2.5,
        Some(_) => 1.5,
        None => 1.0,
    }
}

/// The modified catch rate `a`.
pub fn capture_value(max_hp: u16, current_hp: u16, capture_rate: u8, ball_modifier: f64, status_bonus: f64) -> u32 {
    let max_hp = max_hp.max(1) as f64;
    let current_hp = current_hp as f64;
    let numerator = (3.0 * max_hp - 2.0 * current_hp) * capture_rate as f64 * ball_modifier * status_bonus;
    (numerator / (3.0 * max_hp)).floor().max(0.0) as u32
}

/// Probability out of 65536 that a single shake check passes.
pub fn shake_probability(a: u32) -> u32 {
    if a == 0 {
        return 0;
    }
    let ratio = 16_711_680.0 / a as f64;
    (1_048_560.0 / ratio.sqrt().sqrt()).floor() as u32
}

/// Throw a ball. Returns whether the target was caught and how many shakes passed.
pub fn attempt_capture(
    target: &BattlePokemon,
    ball_modifier: f64,
    status_bonus: f64,
    rng: &mut TurnRng,
) -> (bool, u8) {
    if ball_modifier >= GUARANTEED_BALL_MODIFIER && target.capture_rate > 0 {
        return (true, 4);
    }
    let a = capture_value(
        target.max_hp(),
        target.current_hp(),
        target.capture_rate,
        ball_modifier,
        status_bonus,
    );
    if a >= 255 {
        return (true, 4);
    }
    if a == 0 {
        return (false, 0);
    }

    let threshold = shake_probability(a);
    let mut shakes = 0;
    for _ in 0..4 {
        if rng.next_in_range(RollKind::CaptureShake, 0, 65_535) >= threshold {
            break;
        }
        shakes += 1;
    }
    (shakes == 4, shakes)
}

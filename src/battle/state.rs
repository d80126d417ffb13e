use crate::battle::action_stack::{BattleAction, PlayerAction};
use crate::battle::combatant::BattlePokemon;
use crate::battle::conditions::{SideCondition, SideConditions, VolatileKind};
use crate::battle::field::{Field, FieldEffect};
use crate::config::EngineConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use schema::{Ability, BallType, HeldItem, PokemonType, StatType, StatusType, WeatherKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use strum::{Display, EnumString};

/// Addresses one active battle position: a side and a slot on that side.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CombatantRef {
    pub side: usize,
    pub slot: usize,
}

impl CombatantRef {
    pub const fn new(side: usize, slot: usize) -> Self {
        Self { side, slot }
    }

    pub fn opposing_side(&self) -> usize {
        1 - self.side
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Copy, Eq)]
pub enum GameState {
    Ongoing,
    /// One side must send out a replacement before the next turn.
    AwaitingForcedSwitch,
    /// Both sides lost their active Pokemon and both have backups.
    BothFaintedWithBackup,
    Side1Win,
    Side2Win,
    BothFaintedNoBackup,
    Captured,
    Fled,
    ForceEnded,
}

impl GameState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GameState::Side1Win
                | GameState::Side2Win
                | GameState::BothFaintedNoBackup
                | GameState::Captured
                | GameState::Fled
                | GameState::ForceEnded
        )
    }

    pub fn awaits_replacement(&self) -> bool {
        matches!(
            self,
            GameState::AwaitingForcedSwitch | GameState::BothFaintedWithBackup
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum BattleKind {
    Wild,
    Trainer,
    /// Several participants on side 0 against one boss on side 1.
    Raid,
}

impl BattleKind {
    /// The trainer's side in wild and raid battles. The wild Pokemon or raid
    /// boss is always on the other one.
    pub const PLAYER_SIDE: usize = 0;

    /// Whether members of `side` earn experience for knockouts. Only trainer
    /// battles reward both sides.
    pub fn side_earns_rewards(self, side: usize) -> bool {
        match self {
            BattleKind::Trainer => true,
            BattleKind::Wild | BattleKind::Raid => side == Self::PLAYER_SIDE,
        }
    }
}

/// What hurt a Pokemon. Drives the log wording.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum DamageCause {
    Attack,
    Recoil,
    Struggle,
    Confusion,
    Status(StatusType),
    Weather(WeatherKind),
    Condition(VolatileKind),
    Spikes,
    /// Paid by the user itself (Substitute, Belly Drum, Curse).
    Cost,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionFailureReason {
    IsAsleep,
    IsFrozen,
    IsParalyzed,
    Flinched,
    MustRecharge,
    Infatuated,
    StoringEnergy,
    HurtItselfInConfusion,
    Protected,
    NoTarget,
    Failed,
}

/// Why a selected move could not be used this turn.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restriction {
    Disabled,
    Encored,
    Taunted,
    Tormented,
    Imprisoned,
    HealBlocked,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFailure {
    AlreadyAfflicted,
    HasOtherStatus,
    TypeImmune,
    AbilityImmune,
    Safeguard,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Turn Management
    TurnStarted {
        turn_number: u32,
    },
    TurnEnded,

    // Switching
    PokemonSwitched {
        side: usize,
        old_pokemon: Option<String>,
        new_pokemon: String,
    },
    PokemonDraggedOut {
        side: usize,
        pokemon: String,
    },
    ReplacementRequired {
        side: usize,
        slot: usize,
    },

    // Moves
    MoveUsed {
        pokemon: String,
        move_name: String,
    },
    MoveCalled {
        pokemon: String,
        move_name: String,
    },
    MoveSnatched {
        snatcher: String,
        move_name: String,
    },
    ChargingTurn {
        pokemon: String,
        move_name: String,
    },
    MoveMissed {
        attacker: String,
        defender: String,
    },
    MoveHit {
        attacker: String,
        defender: String,
    },
    CriticalHit,
    AttackTypeEffectiveness {
        multiplier: f32,
    },
    HitCount {
        hits: u8,
    },
    MoveRestricted {
        pokemon: String,
        move_name: String,
        restriction: Restriction,
    },
    ActionPrevented {
        pokemon: String,
        reason: ActionFailureReason,
    },
    ActionFailed {
        pokemon: String,
        reason: ActionFailureReason,
    },

    // HP
    DamageDealt {
        target: String,
        damage: u16,
        remaining_hp: u16,
        cause: DamageCause,
    },
    SubstituteDamaged {
        target: String,
        damage: u16,
    },
    SubstituteBroke {
        target: String,
    },
    PokemonHealed {
        target: String,
        amount: u16,
        new_hp: u16,
    },
    Endured {
        pokemon: String,
    },
    PokemonFainted {
        side: usize,
        pokemon: String,
    },

    // Major status
    StatusApplied {
        target: String,
        status: StatusType,
    },
    StatusCured {
        target: String,
        status: StatusType,
    },
    StatusFailed {
        target: String,
        status: StatusType,
        reason: StatusFailure,
    },

    // Volatile conditions
    VolatileStarted {
        target: String,
        condition: VolatileKind,
    },
    VolatileEnded {
        target: String,
        condition: VolatileKind,
    },
    VolatileFailed {
        target: String,
        condition: VolatileKind,
    },
    PerishCount {
        target: String,
        count: u8,
    },

    // Stat Changes
    StatStageChanged {
        target: String,
        stat: StatType,
        old_stage: i8,
        new_stage: i8,
    },
    StatChangeAtLimit {
        target: String,
        stat: StatType,
        rising: bool,
    },
    StatChangeBlocked {
        target: String,
        stat: StatType,
        reason: String,
    },
    StatsReset,
    StatsCopied {
        user: String,
        target: String,
    },

    // Sides and field
    SideConditionStarted {
        side: usize,
        condition: SideCondition,
    },
    SideConditionEnded {
        side: usize,
        condition: SideCondition,
    },
    SpikesLaid {
        side: usize,
        layers: u8,
    },
    WeatherStarted {
        weather: WeatherKind,
    },
    WeatherEnded {
        weather: WeatherKind,
    },
    FieldEffectStarted {
        effect: FieldEffect,
    },
    FieldEffectEnded {
        effect: FieldEffect,
    },

    // Items, abilities, types
    ItemConsumed {
        pokemon: String,
        item: HeldItem,
    },
    ItemsSwapped {
        user: String,
        target: String,
    },
    ItemKnockedOff {
        target: String,
        item: HeldItem,
    },
    ItemRestored {
        pokemon: String,
        item: HeldItem,
    },
    AbilityChanged {
        pokemon: String,
        ability: Ability,
    },
    TypeChanged {
        pokemon: String,
        new_types: Vec<PokemonType>,
    },
    CoinsScattered {
        amount: u32,
    },

    // Capture and escape
    BallThrown {
        ball: BallType,
    },
    BallShook {
        shakes: u8,
    },
    PokemonCaptured {
        pokemon: String,
    },
    CaptureFailed {
        pokemon: String,
    },
    FleeSucceeded {
        side: usize,
    },
    FleeFailed {
        side: usize,
    },
    Forfeited {
        side: usize,
    },

    // Rewards
    ExperienceGained {
        pokemon: String,
        amount: u32,
    },
    EffortGained {
        pokemon: String,
        evs: [u8; 6],
    },

    // Battle End
    BattleEnded {
        outcome: GameState,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable string using battle context.
    /// Returns None for silent events that should not produce user-visible text.
    pub fn format(&self, battle_state: &BattleState) -> Option<String> {
        match self {
            // === Turn Management Events ===
            BattleEvent::TurnStarted { turn_number } => Some(format!("=== Turn {} ===", turn_number)),
            BattleEvent::TurnEnded => None,

            // === Switching Events ===
            BattleEvent::PokemonSwitched {
                side,
                old_pokemon,
                new_pokemon,
            } => {
                let side_name = battle_state.side_name(*side);
                Some(match old_pokemon {
                    Some(old) => format!("{} withdrew {} and sent out {}!", side_name, old, new_pokemon),
                    None => format!("{} sent out {}!", side_name, new_pokemon),
                })
            }
            BattleEvent::PokemonDraggedOut { pokemon, .. } => Some(format!("{} was dragged out!", pokemon)),
            BattleEvent::ReplacementRequired { side, .. } => Some(format!(
                "{} must choose a Pokemon to send out.",
                battle_state.side_name(*side)
            )),

            // === Move Events ===
            BattleEvent::MoveUsed { pokemon, move_name } => Some(format!("{} used {}!", pokemon, move_name)),
            BattleEvent::MoveCalled { pokemon, move_name } => {
                Some(format!("{} called {}!", pokemon, move_name))
            }
            BattleEvent::MoveSnatched { snatcher, move_name } => {
                Some(format!("{} snatched {}!", snatcher, move_name))
            }
            BattleEvent::ChargingTurn { pokemon, move_name } => {
                Some(format!("{} is preparing {}!", pokemon, move_name))
            }
            BattleEvent::MoveMissed { attacker, .. } => Some(format!("{}'s attack missed!", attacker)),
            BattleEvent::MoveHit { .. } => None,
            BattleEvent::CriticalHit => Some("A critical hit!".to_string()),
            BattleEvent::AttackTypeEffectiveness { multiplier } => match *multiplier {
                m if m > 1.0 => Some("It's super effective!".to_string()),
                m if m < 1.0 && m > 0.0 => Some("It's not very effective...".to_string()),
                m if m == 0.0 => Some("It had no effect!".to_string()),
                _ => None,
            },
            BattleEvent::HitCount { hits } => Some(format!("Hit {} time(s)!", hits)),
            BattleEvent::MoveRestricted {
                pokemon,
                move_name,
                restriction,
            } => Some(Self::format_restriction(pokemon, move_name, restriction)),
            BattleEvent::ActionPrevented { pokemon, reason } | BattleEvent::ActionFailed { pokemon, reason } => {
                Some(Self::format_action_failure_reason(pokemon, reason))
            }

            // === HP Events ===
            BattleEvent::DamageDealt {
                target, damage, cause, ..
            } => Some(Self::format_damage(target, *damage, cause)),
            BattleEvent::SubstituteDamaged { target, .. } => {
                Some(format!("The substitute took damage for {}!", target))
            }
            BattleEvent::SubstituteBroke { target } => Some(format!("{}'s substitute faded!", target)),
            BattleEvent::PokemonHealed { target, amount, .. } => {
                Some(format!("{} recovered {} HP!", target, amount))
            }
            BattleEvent::Endured { pokemon } => Some(format!("{} endured the hit!", pokemon)),
            BattleEvent::PokemonFainted { pokemon, .. } => Some(format!("{} fainted!", pokemon)),

            // === Status Events ===
            BattleEvent::StatusApplied { target, status } => {
                Some(format!("{} {}", target, Self::format_status_applied(status)))
            }
            BattleEvent::StatusCured { target, status } => {
                Some(format!("{} {}", target, Self::format_status_removed(status)))
            }
            BattleEvent::StatusFailed { target, status, reason } => Some(match reason {
                StatusFailure::AlreadyAfflicted => {
                    format!("{} is already affected by {}!", target, status)
                }
                StatusFailure::TypeImmune | StatusFailure::AbilityImmune => {
                    format!("It doesn't affect {}...", target)
                }
                StatusFailure::Safeguard => format!("{} is protected by Safeguard!", target),
                StatusFailure::HasOtherStatus => "But it failed!".to_string(),
            }),

            // === Volatile Events ===
            BattleEvent::VolatileStarted { target, condition } => {
                Some(Self::format_volatile_started(target, condition))
            }
            BattleEvent::VolatileEnded { target, condition } => Some(match condition {
                VolatileKind::Confusion => format!("{} snapped out of its confusion!", target),
                VolatileKind::Bind => format!("{} was freed!", target),
                VolatileKind::Substitute => format!("{}'s substitute faded!", target),
                other => format!("{}'s {} wore off.", target, other),
            }),
            BattleEvent::VolatileFailed { .. } => Some("But it failed!".to_string()),
            BattleEvent::PerishCount { target, count } => {
                Some(format!("{}'s perish count fell to {}.", target, count))
            }

            // === Stat Change Events ===
            BattleEvent::StatStageChanged {
                target,
                stat,
                old_stage,
                new_stage,
            } => {
                let delta = new_stage - old_stage;
                let wording = match delta {
                    d if d >= 3 => "rose drastically!",
                    2 => "rose sharply!",
                    1 => "rose!",
                    -1 => "fell!",
                    -2 => "harshly fell!",
                    _ => "severely fell!",
                };
                Some(format!("{}'s {} {}", target, stat, wording))
            }
            BattleEvent::StatChangeAtLimit { target, stat, rising } => Some(if *rising {
                format!("{}'s {} won't go any higher!", target, stat)
            } else {
                format!("{}'s {} won't go any lower!", target, stat)
            }),
            BattleEvent::StatChangeBlocked { target, reason, .. } => {
                Some(format!("{} is protected! ({})", target, reason))
            }
            BattleEvent::StatsReset => Some("All stat changes were eliminated!".to_string()),
            BattleEvent::StatsCopied { user, target } => {
                Some(format!("{} copied {}'s stat changes!", user, target))
            }

            // === Side and Field Events ===
            BattleEvent::SideConditionStarted { side, condition } => Some(format!(
                "{}'s team is protected by {}!",
                battle_state.side_name(*side),
                condition
            )),
            BattleEvent::SideConditionEnded { side, condition } => Some(format!(
                "{}'s {} wore off.",
                battle_state.side_name(*side),
                condition
            )),
            BattleEvent::SpikesLaid { side, .. } => Some(format!(
                "Spikes were scattered around {}'s team!",
                battle_state.side_name(*side)
            )),
            BattleEvent::WeatherStarted { weather } => Some(format!("The {} set in!", weather)),
            BattleEvent::WeatherEnded { weather } => Some(format!("The {} subsided.", weather)),
            BattleEvent::FieldEffectStarted { effect } => Some(format!("{} took effect!", effect)),
            BattleEvent::FieldEffectEnded { effect } => Some(format!("{} wore off.", effect)),

            // === Item / Ability / Type Events ===
            BattleEvent::ItemConsumed { pokemon, item } => Some(format!("{} used its {}!", pokemon, item)),
            BattleEvent::ItemsSwapped { user, target } => {
                Some(format!("{} switched items with {}!", user, target))
            }
            BattleEvent::ItemKnockedOff { target, item } => {
                Some(format!("{}'s {} was knocked off!", target, item))
            }
            BattleEvent::ItemRestored { pokemon, item } => Some(format!("{} found one {}!", pokemon, item)),
            BattleEvent::AbilityChanged { pokemon, ability } => {
                Some(format!("{} acquired {}!", pokemon, ability))
            }
            BattleEvent::TypeChanged { pokemon, new_types } => {
                let names: Vec<String> = new_types.iter().map(|t| t.to_string()).collect();
                Some(format!("{} transformed into the {} type!", pokemon, names.join("/")))
            }
            BattleEvent::CoinsScattered { .. } => Some("Coins scattered everywhere!".to_string()),

            // === Capture / Escape Events ===
            BattleEvent::BallThrown { ball } => Some(format!("Threw a {}!", ball)),
            BattleEvent::BallShook { shakes } => Some(format!("The ball shook {} time(s)...", shakes)),
            BattleEvent::PokemonCaptured { pokemon } => Some(format!("Gotcha! {} was caught!", pokemon)),
            BattleEvent::CaptureFailed { pokemon } => Some(format!("Oh no! {} broke free!", pokemon)),
            BattleEvent::FleeSucceeded { .. } => Some("Got away safely!".to_string()),
            BattleEvent::FleeFailed { .. } => Some("Can't escape!".to_string()),
            BattleEvent::Forfeited { side } => {
                Some(format!("{} forfeited the battle!", battle_state.side_name(*side)))
            }

            // === Reward Events ===
            BattleEvent::ExperienceGained { pokemon, amount } => {
                Some(format!("{} gained {} Exp. Points!", pokemon, amount))
            }
            BattleEvent::EffortGained { .. } => None,

            // === Battle End Events ===
            BattleEvent::BattleEnded { outcome } => Some(match outcome {
                GameState::Side1Win => format!("{} won the battle!", battle_state.side_name(0)),
                GameState::Side2Win => format!("{} won the battle!", battle_state.side_name(1)),
                GameState::BothFaintedNoBackup => "The battle ended in a draw!".to_string(),
                GameState::Captured => "The battle is over.".to_string(),
                GameState::Fled => "The battle is over.".to_string(),
                GameState::ForceEnded => "The battle was called off.".to_string(),
                _ => "The battle is over.".to_string(),
            }),
        }
    }

    // --- Private Helper Functions ---

    fn format_damage(target: &str, damage: u16, cause: &DamageCause) -> String {
        match cause {
            DamageCause::Attack => format!("{} took {} damage!", target, damage),
            DamageCause::Recoil | DamageCause::Struggle => {
                format!("{} is damaged by recoil! ({} damage)", target, damage)
            }
            DamageCause::Confusion => format!("It hurt itself in its confusion! ({} damage)", damage),
            DamageCause::Status(status) => {
                format!("{} is hurt by its {}! ({} damage)", target, status, damage)
            }
            DamageCause::Weather(weather) => {
                format!("{} is buffeted by the {}! ({} damage)", target, weather, damage)
            }
            DamageCause::Condition(VolatileKind::LeechSeed) => {
                format!("{}'s health is sapped by Leech Seed! ({} damage)", target, damage)
            }
            DamageCause::Condition(condition) => {
                format!("{} is hurt by {}! ({} damage)", target, condition, damage)
            }
            DamageCause::Spikes => format!("{} is hurt by spikes! ({} damage)", target, damage),
            DamageCause::Cost => format!("{} paid {} HP!", target, damage),
        }
    }

    fn format_status_applied(status: &StatusType) -> &'static str {
        match status {
            StatusType::Sleep => "fell asleep!",
            StatusType::Poison => "was poisoned!",
            StatusType::Toxic => "was badly poisoned!",
            StatusType::Burn => "was burned!",
            StatusType::Freeze => "was frozen solid!",
            StatusType::Paralysis => "is paralyzed! It may be unable to move!",
        }
    }

    fn format_status_removed(status: &StatusType) -> String {
        match status {
            StatusType::Sleep => "woke up!".to_string(),
            StatusType::Freeze => "thawed out!".to_string(),
            _ => format!("was cured of its {}!", status),
        }
    }

    fn format_volatile_started(target: &str, condition: &VolatileKind) -> String {
        match condition {
            VolatileKind::Confusion => format!("{} became confused!", target),
            VolatileKind::Flinch => format!("{} flinched!", target),
            VolatileKind::LeechSeed => format!("{} was seeded!", target),
            VolatileKind::Ingrain => format!("{} planted its roots!", target),
            VolatileKind::Substitute => format!("{} put in a substitute!", target),
            VolatileKind::Protect => format!("{} protected itself!", target),
            VolatileKind::Endure => format!("{} braced itself!", target),
            VolatileKind::FocusEnergy => format!("{} is getting pumped!", target),
            VolatileKind::Yawn => format!("{} grew drowsy!", target),
            VolatileKind::Bind => format!("{} was squeezed!", target),
            VolatileKind::Trapped => format!("{} can no longer escape!", target),
            VolatileKind::Infatuation => format!("{} fell in love!", target),
            VolatileKind::Recharge => format!("{} must recharge!", target),
            VolatileKind::Stockpile => format!("{} stockpiled!", target),
            other => format!("{} is affected by {}!", target, other),
        }
    }

    fn format_restriction(pokemon: &str, move_name: &str, restriction: &Restriction) -> String {
        match restriction {
            Restriction::Disabled => format!("{}'s {} is disabled!", pokemon, move_name),
            Restriction::Encored => format!("{} must keep using its encored move!", pokemon),
            Restriction::Taunted => format!("{} can't use {} after the taunt!", pokemon, move_name),
            Restriction::Tormented => format!("{} can't use the same move twice in a row!", pokemon),
            Restriction::Imprisoned => format!("{} can't use the sealed {}!", pokemon, move_name),
            Restriction::HealBlocked => format!("{} can't use {} because of Heal Block!", pokemon, move_name),
        }
    }

    fn format_action_failure_reason(pokemon: &str, reason: &ActionFailureReason) -> String {
        match reason {
            ActionFailureReason::IsAsleep => format!("{} is fast asleep.", pokemon),
            ActionFailureReason::IsFrozen => format!("{} is frozen solid!", pokemon),
            ActionFailureReason::IsParalyzed => format!("{} is fully paralyzed!", pokemon),
            ActionFailureReason::Flinched => format!("{} flinched and couldn't move!", pokemon),
            ActionFailureReason::MustRecharge => format!("{} must recharge!", pokemon),
            ActionFailureReason::Infatuated => format!("{} is immobilized by love!", pokemon),
            ActionFailureReason::StoringEnergy => format!("{} is storing energy!", pokemon),
            ActionFailureReason::HurtItselfInConfusion => format!("{} is confused!", pokemon),
            ActionFailureReason::Protected => format!("{} protected itself!", pokemon),
            ActionFailureReason::NoTarget => "But there was no target...".to_string(),
            ActionFailureReason::Failed => "But it failed!".to_string(),
        }
    }
}

/// Event bus for collecting and managing battle events.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = BattleEvent>) {
        self.events.extend(events);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<BattleEvent> {
        self.events
    }

    /// The ordered human-readable log. Silent events are skipped.
    pub fn log_lines(&self, battle_state: &BattleState) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| event.format(battle_state))
            .collect()
    }

    /// Print all events in debug format with indentation.
    pub fn print_debug(&self) {
        for event in &self.events {
            println!("  {:?}", event);
        }
    }

    /// Return true if the event bus contains no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Return the number of events in the bus.
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl fmt::Display for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}

/// Every random decision the engine makes, by purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RollKind {
    Accuracy,
    CriticalHit,
    DamageRoll,
    EffectChance,
    SleepDuration,
    ConfusionDuration,
    BindDuration,
    Thaw,
    FullParalysis,
    ConfusionSelfHit,
    Infatuation,
    MultiHitCount,
    SpeedTie,
    QuickClaw,
    ProtectSuccess,
    Psywave,
    CaptureShake,
    Flee,
    RandomTarget,
    MoveSelection,
    ForceSwitchTarget,
    TypeSelection,
}

impl RollKind {
    /// Value a scripted rng returns when nothing is queued for this kind.
    /// Picks the uneventful outcome: hits land, nothing random happens.
    fn quiet_value(&self, lo: u32, hi: u32) -> u32 {
        match self {
            RollKind::Accuracy
            | RollKind::SpeedTie
            | RollKind::RandomTarget
            | RollKind::MoveSelection
            | RollKind::ForceSwitchTarget
            | RollKind::TypeSelection => lo,
            _ => hi,
        }
    }
}

#[derive(Debug, Clone)]
enum RngSource {
    Seeded(StdRng),
    Scripted(HashMap<RollKind, VecDeque<u32>>),
}

/// Source of every random outcome in a battle.
///
/// Seeded mode draws from a `StdRng`. Scripted mode replays queued values per
/// [`RollKind`] and falls back to a quiet value when a queue is empty.
#[derive(Debug, Clone)]
pub struct TurnRng {
    source: RngSource,
}

impl TurnRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            source: RngSource::Seeded(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn new_random() -> Self {
        Self {
            source: RngSource::Seeded(StdRng::from_rng(&mut rand::rng())),
        }
    }

    /// Scripted rng with nothing queued: every roll takes its quiet value.
    pub fn scripted() -> Self {
        Self {
            source: RngSource::Scripted(HashMap::new()),
        }
    }

    pub fn new_for_test(script: Vec<(RollKind, u32)>) -> Self {
        let mut rng = Self::scripted();
        for (kind, value) in script {
            rng.push(kind, value);
        }
        rng
    }

    /// Queue values for one roll kind (scripted mode only).
    pub fn with(mut self, kind: RollKind, values: impl IntoIterator<Item = u32>) -> Self {
        for value in values {
            self.push(kind, value);
        }
        self
    }

    pub fn push(&mut self, kind: RollKind, value: u32) {
        if let RngSource::Scripted(queues) = &mut self.source {
            queues.entry(kind).or_default().push_back(value);
        }
    }

    /// Uniform draw in `lo..=hi`. Scripted values are clamped into the range.
    pub fn next_in_range(&mut self, kind: RollKind, lo: u32, hi: u32) -> u32 {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let value = match &mut self.source {
            RngSource::Seeded(rng) => rng.random_range(lo..=hi),
            RngSource::Scripted(queues) => queues
                .get_mut(&kind)
                .and_then(|queue| queue.pop_front())
                .map(|value| value.clamp(lo, hi))
                .unwrap_or_else(|| kind.quiet_value(lo, hi)),
        };
        tracing::trace!(?kind, value, "rng roll");
        value
    }

    /// A 1..=100 percentage roll.
    pub fn next_outcome(&mut self, kind: RollKind) -> u8 {
        self.next_in_range(kind, 1, 100) as u8
    }

    /// Percent chance check. 0 and 100+ are decided without rolling.
    pub fn chance(&mut self, kind: RollKind, percent: u8) -> bool {
        if percent == 0 {
            return false;
        }
        if percent >= 100 {
            return true;
        }
        self.next_outcome(kind) <= percent
    }

    /// Uniform index into a collection of `len` items. `len` must be non-zero.
    pub fn pick_index(&mut self, kind: RollKind, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.next_in_range(kind, 0, (len - 1) as u32) as usize
    }
}

/// One side of a battle: its roster, the positions it fills and its side conditions.
#[derive(Debug, Clone)]
pub struct BattleSide {
    pub name: String,
    pub team: Vec<BattlePokemon>,
    /// Team index occupying each active slot.
    pub active: Vec<Option<usize>>,
    pub conditions: SideConditions,
    pub pending_actions: Vec<Option<PlayerAction>>,
    pub replacements_needed: Vec<usize>,
    pub flee_attempts: u8,
}

impl BattleSide {
    /// Fills up to `active_slots` positions with the first healthy team members.
    pub fn new(name: impl Into<String>, team: Vec<BattlePokemon>, active_slots: usize) -> Self {
        let mut active = Vec::with_capacity(active_slots);
        for (index, pokemon) in team.iter().enumerate() {
            if active.len() == active_slots {
                break;
            }
            if !pokemon.is_fainted() {
                active.push(Some(index));
            }
        }
        while active.len() < active_slots {
            active.push(None);
        }
        Self {
            name: name.into(),
            team,
            pending_actions: vec![None; active.len()],
            active,
            conditions: SideConditions::default(),
            replacements_needed: Vec::new(),
            flee_attempts: 0,
        }
    }

    pub fn active_pokemon(&self, slot: usize) -> Option<&BattlePokemon> {
        let index = (*self.active.get(slot)?)?;
        self.team.get(index)
    }

    pub fn is_active_index(&self, team_index: usize) -> bool {
        self.active.iter().any(|slot| *slot == Some(team_index))
    }

    /// Healthy team members that are not on the field.
    pub fn available_backups(&self) -> Vec<usize> {
        self.team
            .iter()
            .enumerate()
            .filter(|(index, pokemon)| !pokemon.is_fainted() && !self.is_active_index(*index))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn all_fainted(&self) -> bool {
        self.team.iter().all(|pokemon| pokemon.is_fainted())
    }
}

#[derive(Debug, Clone)]
pub struct BattleState {
    pub battle_id: String,
    pub kind: BattleKind,
    pub sides: [BattleSide; 2],
    pub field: Field,
    pub turn_number: u32,
    pub game_state: GameState,
    pub config: Arc<EngineConfig>,
    /// Actions produced while resolving other actions (forced switches, called moves).
    pub follow_ups: VecDeque<BattleAction>,
    /// Combatants that fainted since the engine last looked.
    pub newly_fainted: Vec<(CombatantRef, usize)>,
}

impl BattleState {
    pub fn new(
        id: impl Into<String>,
        kind: BattleKind,
        side_a: BattleSide,
        side_b: BattleSide,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            battle_id: id.into(),
            kind,
            sides: [side_a, side_b],
            field: Field::default(),
            turn_number: 0,
            game_state: GameState::Ongoing,
            config,
            follow_ups: VecDeque::new(),
            newly_fainted: Vec::new(),
        }
    }

    pub fn side_name(&self, side: usize) -> &str {
        self.sides.get(side).map(|s| s.name.as_str()).unwrap_or("???")
    }

    pub fn team_index(&self, who: CombatantRef) -> Option<usize> {
        *self.sides.get(who.side)?.active.get(who.slot)?
    }

    pub fn pokemon(&self, who: CombatantRef) -> Option<&BattlePokemon> {
        let index = self.team_index(who)?;
        self.sides[who.side].team.get(index)
    }

    pub fn pokemon_mut(&mut self, who: CombatantRef) -> Option<&mut BattlePokemon> {
        let index = self.team_index(who)?;
        self.sides[who.side].team.get_mut(index)
    }

    /// An active, non-fainted combatant.
    pub fn is_alive(&self, who: CombatantRef) -> bool {
        self.pokemon(who).is_some_and(|p| !p.is_fainted())
    }

    pub fn name_of(&self, who: CombatantRef) -> String {
        self.pokemon(who)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "???".to_string())
    }

    /// Non-fainted active combatants of one side, in slot order.
    pub fn active_refs(&self, side: usize) -> Vec<CombatantRef> {
        (0..self.sides[side].active.len())
            .map(|slot| CombatantRef::new(side, slot))
            .filter(|who| self.is_alive(*who))
            .collect()
    }

    pub fn all_active_refs(&self) -> Vec<CombatantRef> {
        let mut refs = self.active_refs(0);
        refs.extend(self.active_refs(1));
        refs
    }

    pub fn opponents_of(&self, who: CombatantRef) -> Vec<CombatantRef> {
        self.active_refs(who.opposing_side())
    }

    /// Active teammates, excluding `who` itself.
    pub fn allies_of(&self, who: CombatantRef) -> Vec<CombatantRef> {
        self.active_refs(who.side)
            .into_iter()
            .filter(|other| *other != who)
            .collect()
    }

    /// Remove HP from `target`, emitting the damage line and, on a knockout,
    /// the single faint line. Returns the HP actually lost.
    pub fn damage(
        &mut self,
        target: CombatantRef,
        amount: u16,
        cause: DamageCause,
        events: &mut Vec<BattleEvent>,
    ) -> u16 {
        let Some(team_index) = self.team_index(target) else {
            return 0;
        };
        let pokemon = &mut self.sides[target.side].team[team_index];
        if pokemon.is_fainted() || amount == 0 {
            return 0;
        }
        let dealt = pokemon.take_damage(amount);
        events.push(BattleEvent::DamageDealt {
            target: pokemon.name.clone(),
            damage: dealt,
            remaining_hp: pokemon.current_hp(),
            cause,
        });
        if pokemon.is_fainted() {
            let name = pokemon.name.clone();
            self.record_faint(target, team_index, name, events);
        }
        dealt
    }

    /// Knock `target` out directly (Self-Destruct, Perish Song, Destiny Bond).
    pub fn faint(&mut self, target: CombatantRef, events: &mut Vec<BattleEvent>) {
        let Some(team_index) = self.team_index(target) else {
            return;
        };
        let pokemon = &mut self.sides[target.side].team[team_index];
        if pokemon.is_fainted() {
            return;
        }
        pokemon.faint();
        let name = pokemon.name.clone();
        self.record_faint(target, team_index, name, events);
    }

    fn record_faint(
        &mut self,
        target: CombatantRef,
        team_index: usize,
        name: String,
        events: &mut Vec<BattleEvent>,
    ) {
        events.push(BattleEvent::PokemonFainted {
            side: target.side,
            pokemon: name,
        });
        self.newly_fainted.push((target, team_index));
    }

    /// Restore HP unless Heal Block is up. Emits a heal line when anything was restored.
    pub fn heal(&mut self, target: CombatantRef, amount: u16, events: &mut Vec<BattleEvent>) -> u16 {
        let Some(pokemon) = self.pokemon_mut(target) else {
            return 0;
        };
        if pokemon.volatile.heal_block_turns > 0 {
            return 0;
        }
        let healed = pokemon.heal(amount);
        if healed > 0 {
            events.push(BattleEvent::PokemonHealed {
                target: pokemon.name.clone(),
                amount: healed,
                new_hp: pokemon.current_hp(),
            });
        }
        healed
    }

    /// Send `team_index` into `who`'s position and apply entry hazards.
    ///
    /// The previous occupant loses its volatiles and stages, and anything it
    /// was holding on the other combatants (bind, trap, infatuation) lets go.
    pub fn switch_in(&mut self, who: CombatantRef, team_index: usize, dragged: bool, events: &mut Vec<BattleEvent>) {
        let previous = self.team_index(who);
        let old_name = previous.and_then(|index| {
            let pokemon = &mut self.sides[who.side].team[index];
            pokemon.switch_out();
            (!pokemon.is_fainted()).then(|| pokemon.name.clone())
        });
        for other in self.all_active_refs() {
            if let Some(pokemon) = self.pokemon_mut(other) {
                let volatile = &mut pokemon.volatile;
                if volatile.bind.as_ref().is_some_and(|bind| bind.source == who) {
                    volatile.bind = None;
                }
                if volatile.trapped_by == Some(who) {
                    volatile.trapped_by = None;
                }
                if volatile.infatuated_with == Some(who) {
                    volatile.infatuated_with = None;
                }
            }
        }

        let Some(slot) = self.sides[who.side].active.get_mut(who.slot) else {
            return;
        };
        *slot = Some(team_index);
        let new_name = self.name_of(who);
        events.push(if dragged {
            BattleEvent::PokemonDraggedOut {
                side: who.side,
                pokemon: new_name,
            }
        } else {
            BattleEvent::PokemonSwitched {
                side: who.side,
                old_pokemon: old_name,
                new_pokemon: new_name,
            }
        });
        self.apply_spikes(who, events);
    }

    /// One layer costs 1/8 of max HP, two 1/6, three 1/4. Airborne
    /// combatants are spared unless Gravity is up.
    fn apply_spikes(&mut self, who: CombatantRef, events: &mut Vec<BattleEvent>) {
        let layers = self.field.spikes_layers[who.side];
        let Some(pokemon) = self.pokemon(who) else {
            return;
        };
        let airborne = pokemon.has_type(PokemonType::Flying) || pokemon.ability == Ability::Levitate;
        if layers == 0 || (airborne && !self.field.is_active(FieldEffect::Gravity)) {
            return;
        }
        let divisor = match layers {
            1 => 8,
            2 => 6,
            _ => 4,
        };
        let amount = pokemon.fraction_of_max(divisor);
        self.damage(who, amount, DamageCause::Spikes, events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::{create_team_battle, create_test_battle, TestPokemonBuilder};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_silent_events_return_none() {
        let battle_state = create_test_battle(
            TestPokemonBuilder::new("pikachu", 25).build(),
            TestPokemonBuilder::new("charmander", 25).build(),
        );
        let silent_events = vec![
            BattleEvent::TurnEnded,
            BattleEvent::MoveHit {
                attacker: "Pikachu".to_string(),
                defender: "Charmander".to_string(),
            },
            BattleEvent::AttackTypeEffectiveness { multiplier: 1.0 },
            BattleEvent::EffortGained {
                pokemon: "Pikachu".to_string(),
                evs: [0, 0, 0, 0, 0, 1],
            },
        ];
        for event in silent_events {
            assert!(
                event.format(&battle_state).is_none(),
                "Event {:?} should be silent but returned text",
                event
            );
        }
    }

    #[test]
    fn test_event_text_samples() {
        let battle_state = create_test_battle(
            TestPokemonBuilder::new("pikachu", 25).build(),
            TestPokemonBuilder::new("charmander", 25).build(),
        );
        assert_eq!(
            BattleEvent::TurnStarted { turn_number: 5 }.format(&battle_state),
            Some("=== Turn 5 ===".to_string())
        );
        assert_eq!(
            BattleEvent::AttackTypeEffectiveness { multiplier: 0.0 }.format(&battle_state),
            Some("It had no effect!".to_string())
        );
        assert_eq!(
            BattleEvent::StatStageChanged {
                target: "Pikachu".to_string(),
                stat: StatType::Atk,
                old_stage: 0,
                new_stage: 2,
            }
            .format(&battle_state),
            Some("Pikachu's Attack rose sharply!".to_string())
        );
        assert_eq!(
            BattleEvent::StatusCured {
                target: "Pikachu".to_string(),
                status: StatusType::Sleep,
            }
            .format(&battle_state),
            Some("Pikachu woke up!".to_string())
        );
    }

    #[test]
    fn test_scripted_rng_quiet_values() {
        let mut rng = TurnRng::scripted().with(RollKind::DamageRoll, [90]);
        assert_eq!(rng.next_in_range(RollKind::DamageRoll, 85, 100), 90);
        assert_eq!(rng.next_in_range(RollKind::DamageRoll, 85, 100), 100);
        assert_eq!(rng.next_outcome(RollKind::Accuracy), 1);
        assert!(!rng.chance(RollKind::EffectChance, 30));
        assert!(rng.chance(RollKind::EffectChance, 100));
        assert_eq!(rng.pick_index(RollKind::RandomTarget, 3), 0);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = TurnRng::seeded(42);
        let mut b = TurnRng::seeded(42);
        let rolls_a: Vec<u8> = (0..20).map(|_| a.next_outcome(RollKind::EffectChance)).collect();
        let rolls_b: Vec<u8> = (0..20).map(|_| b.next_outcome(RollKind::EffectChance)).collect();
        assert_eq!(rolls_a, rolls_b);
        assert!(rolls_a.iter().all(|&r| (1..=100).contains(&r)));
    }

    #[test]
    fn test_damage_emits_faint_once() {
        let mut state = create_test_battle(
            TestPokemonBuilder::new("pikachu", 25).build(),
            TestPokemonBuilder::new("charmander", 25).with_hp(10).build(),
        );
        let target = CombatantRef::new(1, 0);
        let mut events = Vec::new();
        assert_eq!(state.damage(target, 25, DamageCause::Attack, &mut events), 10);
        assert_eq!(state.damage(target, 25, DamageCause::Attack, &mut events), 0);
        state.faint(target, &mut events);
        let faints = events
            .iter()
            .filter(|e| matches!(e, BattleEvent::PokemonFainted { .. }))
            .count();
        assert_eq!(faints, 1);
        assert_eq!(state.newly_fainted.len(), 1);
    }
    #[test]
    fn test_switch_in_takes_spikes_damage() {
        let mut state = create_team_battle(
            vec![
                TestPokemonBuilder::new("pikachu", 25).build(),
                TestPokemonBuilder::new("rattata", 25).with_hp_stat(80).build(),
                TestPokemonBuilder::new("pidgey", 25).build(),
            ],
            vec![TestPokemonBuilder::new("charmander", 25).build()],
        );
        let who = CombatantRef::new(0, 0);
        state.field.spikes_layers[0] = 1;
        state.pokemon_mut(CombatantRef::new(1, 0)).unwrap().volatile.trapped_by = Some(who);

        let mut events = Vec::new();
        state.switch_in(who, 1, false, &mut events);
        assert_eq!(state.pokemon(who).unwrap().current_hp(), 70);
        assert!(matches!(
            &events[0],
            BattleEvent::PokemonSwitched { old_pokemon: Some(old), .. } if old.as_str() == "Pikachu"
        ));
        assert_eq!(state.pokemon(CombatantRef::new(1, 0)).unwrap().volatile.trapped_by, None);

        // Flying types float over the spikes
        let mut events = Vec::new();
        state.switch_in(who, 2, true, &mut events);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], BattleEvent::PokemonDraggedOut { .. }));
    }
}

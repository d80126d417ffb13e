use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

/// Stats that carry a stage in battle. HP never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, PartialOrd, Ord)]
pub enum StatType {
    Atk,
    Def,
    SpAtk,
    SpDef,
    Spe,
    Acc,
    Eva,
}

impl StatType {
    pub const ALL: [StatType; 7] = [
        StatType::Atk,
        StatType::Def,
        StatType::SpAtk,
        StatType::SpDef,
        StatType::Spe,
        StatType::Acc,
        StatType::Eva,
    ];

    /// The five stats a nature or Psych Up style effect can touch.
    pub const BATTLE_STATS: [StatType; 5] = [
        StatType::Atk,
        StatType::Def,
        StatType::SpAtk,
        StatType::SpDef,
        StatType::Spe,
    ];
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatType::Atk => "Attack",
            StatType::Def => "Defense",
            StatType::SpAtk => "Sp. Atk",
            StatType::SpDef => "Sp. Def",
            StatType::Spe => "Speed",
            StatType::Acc => "accuracy",
            StatType::Eva => "evasiveness",
        };
        write!(f, "{}", name)
    }
}

/// The exclusive ("major") status kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum StatusType {
    Burn,
    Poison,
    Toxic,
    Paralysis,
    Sleep,
    Freeze,
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusType::Burn => "burn",
            StatusType::Poison | StatusType::Toxic => "poison",
            StatusType::Paralysis => "paralysis",
            StatusType::Sleep => "sleep",
            StatusType::Freeze => "freeze",
        };
        write!(f, "{}", name)
    }
}

/// Who a move aims at when it is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, Default)]
pub enum MoveTarget {
    User,
    #[default]
    Selected,
    AllOpponents,
    AllAllies,
    AllAdjacent,
    AllAdjacentFoes,
    All,
    RandomOpponent,
    UserOrAlly,
    Field,
}

/// Who a single effect entry applies to, relative to the move's user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, Default)]
pub enum EffectTarget {
    User,
    #[default]
    Target,
    Field,
    Ally,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum MoveFlag {
    Contact,
    Punch,
    Sound,
    /// Can be stolen by Snatch.
    Snatchable,
}

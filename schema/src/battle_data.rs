use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Abilities the damage, priority and status formulas branch on.
/// Anything else a data source names maps to `None`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Ability {
    #[default]
    None,
    // Power
    Technician,
    IronFist,
    Blaze,
    Torrent,
    Overgrow,
    Swarm,
    // Attack
    HugePower,
    Guts,
    // STAB
    Adaptability,
    // Priority
    Prankster,
    GaleWings,
    // Critical hits
    SuperLuck,
    BattleArmor,
    ShellArmor,
    // Damage taken / dealt
    ThickFat,
    Filter,
    SolidRock,
    TintedLens,
    // Immunities
    Levitate,
    Insomnia,
    Limber,
    WaterVeil,
    Immunity,
    MagmaArmor,
    OwnTempo,
    InnerFocus,
    // Speed
    SwiftSwim,
    Chlorophyll,
}

impl Ability {
    pub fn blocks_critical_hits(&self) -> bool {
        matches!(self, Ability::BattleArmor | Ability::ShellArmor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum HeldItem {
    QuickClaw,
    ScopeLens,
    RazorClaw,
    Leftovers,
    SitrusBerry,
    LumBerry,
    ChoiceBand,
}

impl HeldItem {
    pub fn is_berry(&self) -> bool {
        matches!(self, HeldItem::SitrusBerry | HeldItem::LumBerry)
    }

    pub fn raises_crit_stage(&self) -> bool {
        matches!(self, HeldItem::ScopeLens | HeldItem::RazorClaw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum BallType {
    PokeBall,
    GreatBall,
    UltraBall,
    MasterBall,
    SafariBall,
    NetBall,
    DiveBall,
    NestBall,
    RepeatBall,
    TimerBall,
    LuxuryBall,
    PremierBall,
    QuickBall,
    DuskBall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WeatherKind {
    #[default]
    None,
    Sun,
    Rain,
    Sandstorm,
    Hail,
}

impl std::fmt::Display for WeatherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WeatherKind::None => "clear skies",
            WeatherKind::Sun => "harsh sunlight",
            WeatherKind::Rain => "rain",
            WeatherKind::Sandstorm => "sandstorm",
            WeatherKind::Hail => "hail",
        };
        write!(f, "{}", name)
    }
}

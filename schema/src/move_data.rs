use crate::battle_data::WeatherKind;
use crate::move_types::{EffectTarget, MoveCategory, MoveFlag, MoveTarget, StatType};
use crate::pokemon_types::PokemonType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized move identifier ("Double-Edge", "double_edge" and "double edge"
/// all become `double-edge`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct MoveId(String);

const STRUGGLE_ID: &str = "__struggle__";

impl MoveId {
    pub fn new(raw: &str) -> Self {
        if raw == STRUGGLE_ID {
            return Self(STRUGGLE_ID.to_string());
        }
        let slug = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, '\'' | '.' | ','))
            .map(|c| match c {
                ' ' | '_' => '-',
                other => other.to_ascii_lowercase(),
            })
            .collect();
        Self(slug)
    }

    /// The reserved pseudo-move used when nothing else can be selected.
    pub fn struggle() -> Self {
        Self(STRUGGLE_ID.to_string())
    }

    pub fn is_struggle(&self) -> bool {
        self.0 == STRUGGLE_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Title-cased display name derived from the slug, used when no metadata name exists.
    pub fn display_name(&self) -> String {
        if self.is_struggle() {
            return "Struggle".to_string();
        }
        self.0
            .split('-')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<String> for MoveId {
    fn from(raw: String) -> Self {
        MoveId::new(&raw)
    }
}

impl From<&str> for MoveId {
    fn from(raw: &str) -> Self {
        MoveId::new(raw)
    }
}

impl From<MoveId> for String {
    fn from(id: MoveId) -> Self {
        id.0
    }
}

impl fmt::Display for MoveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable per-move metadata as served by the data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveMetadata {
    pub id: MoveId,
    pub name: String,
    /// `None` never misses.
    #[serde(default)]
    pub accuracy: Option<u8>,
    #[serde(default)]
    pub power: u16,
    #[serde(default)]
    pub priority: i8,
    pub category: MoveCategory,
    pub move_type: PokemonType,
    pub pp: u8,
    #[serde(default)]
    pub min_hits: Option<u8>,
    #[serde(default)]
    pub max_hits: Option<u8>,
    #[serde(default)]
    pub ailment_chance: u8,
    /// Raw (stat, stages) tuples as listed by the provider.
    #[serde(default)]
    pub stat_changes: Vec<(StatType, i8)>,
    #[serde(default)]
    pub target: MoveTarget,
    #[serde(default)]
    pub flags: Vec<MoveFlag>,
}

impl MoveMetadata {
    pub fn has_flag(&self, flag: MoveFlag) -> bool {
        self.flags.contains(&flag)
    }
}

/// How a damaging move computes its damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DamageKind {
    #[default]
    Standard,
    /// Always this many HP (Sonic Boom, Dragon Rage).
    Fixed(u16),
    /// Damage equals the user's level (Seismic Toss, Night Shade).
    LevelBased,
    /// Removes all of the target's remaining HP.
    Ohko,
    /// A percentage of the target's current HP (Super Fang).
    PercentCurrentHp(u8),
    /// Level scaled by a random 50..=150% factor (Psywave).
    VariableLevel,
    /// Power scales with the user's stockpile count.
    SpitUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitRange {
    pub min: u8,
    pub max: u8,
}

/// Where a two-turn move hides during its charge turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum Vanish {
    Sky,
    Underground,
    Underwater,
}

/// Structured description of everything a move does beyond its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    #[serde(default)]
    pub damage: bool,
    #[serde(default)]
    pub damage_kind: DamageKind,
    #[serde(default)]
    pub heal_percent: Option<u8>,
    #[serde(default)]
    pub multi_hit: Option<HitRange>,
    /// Percentage of damage dealt taken back as recoil.
    #[serde(default)]
    pub recoil: Option<u8>,
    /// Percentage of damage dealt restored to the user.
    #[serde(default)]
    pub drain: Option<u8>,
    #[serde(default)]
    pub charge_turn: bool,
    #[serde(default)]
    pub recharge_turn: bool,
    #[serde(default)]
    pub crit_stage_bonus: u8,
    #[serde(default)]
    pub semi_invulnerable: Option<Vanish>,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl Default for EffectSpec {
    fn default() -> Self {
        Self {
            damage: false,
            damage_kind: DamageKind::Standard,
            heal_percent: None,
            multi_hit: None,
            recoil: None,
            drain: None,
            charge_turn: false,
            recharge_turn: false,
            crit_stage_bonus: 0,
            semi_invulnerable: None,
            effects: Vec::new(),
        }
    }
}

impl EffectSpec {
    /// True when this move restores HP in some way (blocked by Heal Block).
    pub fn heals(&self) -> bool {
        self.heal_percent.is_some()
            || self.drain.is_some()
            || self.effects.iter().any(|effect| {
                matches!(
                    effect.kind,
                    EffectKind::Heal { .. } | EffectKind::Rest | EffectKind::Wish | EffectKind::Swallow
                )
            })
    }
}

/// One entry of a move's ordered effect list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    #[serde(default)]
    pub target: EffectTarget,
    #[serde(default = "always")]
    pub chance: u8,
}

fn always() -> u8 {
    100
}

impl Effect {
    pub fn new(kind: EffectKind, target: EffectTarget, chance: u8) -> Self {
        Self { kind, target, chance }
    }
}

/// Closed set of effect tags a move can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectKind {
    // Major status
    Burn,
    Poison,
    BadlyPoison,
    Paralyze,
    Sleep,
    Freeze,

    // Volatile conditions
    Confuse,
    Flinch,
    LeechSeed,
    Ingrain,
    Substitute,
    Protect,
    Endure,
    FocusEnergy,
    Yawn,
    DestinyBond,
    PerishSong,
    Bind,
    Disable,
    Trap,
    Encore,
    Taunt,
    Torment,
    Charge,
    HelpingHand,
    Imprison,
    Grudge,
    Snatch,
    Foresight,
    MiracleEye,
    HealBlock,
    FollowMe,
    RagePowder,
    Spotlight,
    Attract,
    Curse,
    Nightmare,
    Minimize,
    DefenseCurl,
    LockOn,
    Bide,

    // Stats and HP
    StatChange { stat: StatType, stages: i8 },
    Heal { percent: u8 },
    Rest,
    BellyDrum,
    PainSplit,
    Endeavor,
    Wish,
    Stockpile,
    Swallow,
    SpitUp,
    Haze,
    PsychUp,
    Memento,
    SelfDestruct,

    // Side and field
    Mist,
    LightScreen,
    Reflect,
    Safeguard,
    Spikes,
    Weather(WeatherKind),
    TrickRoom,
    Gravity,
    MudSport,
    WaterSport,

    // Items, abilities, types, team
    Trick,
    KnockOff,
    Recycle,
    RolePlay,
    SkillSwap,
    Camouflage,
    Conversion,
    Conversion2,
    Refresh,
    HealBell,
    PayDay,
    ForceSwitch,
    Assist,

    /// Explicit no-op.
    Nothing,
    /// Tags this engine does not model; applying one does nothing.
    #[serde(other)]
    Unknown,
}

/// A move record as stored by a data provider: metadata plus effect description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveData {
    pub metadata: MoveMetadata,
    #[serde(default)]
    pub effect: EffectSpec,
}

impl MoveData {
    /// Status-type, zero-effect stand-in for ids the provider does not know.
    pub fn placeholder(id: &MoveId) -> Self {
        Self {
            metadata: MoveMetadata {
                id: id.clone(),
                name: id.display_name(),
                accuracy: None,
                power: 0,
                priority: 0,
                category: MoveCategory::Status,
                move_type: PokemonType::Typeless,
                pp: 1,
                min_hits: None,
                max_hits: None,
                ailment_chance: 0,
                stat_changes: Vec::new(),
                target: MoveTarget::User,
                flags: Vec::new(),
            },
            effect: EffectSpec::default(),
        }
    }

    /// The fixed typeless fallback attack.
    pub fn struggle(power: u16) -> Self {
        Self {
            metadata: MoveMetadata {
                id: MoveId::struggle(),
                name: "Struggle".to_string(),
                accuracy: None,
                power,
                priority: 0,
                category: MoveCategory::Physical,
                move_type: PokemonType::Typeless,
                pp: 1,
                min_hits: None,
                max_hits: None,
                ailment_chance: 0,
                stat_changes: Vec::new(),
                target: MoveTarget::RandomOpponent,
                flags: vec![MoveFlag::Contact],
            },
            effect: EffectSpec {
                damage: true,
                ..EffectSpec::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_move_id_normalization() {
        assert_eq!(MoveId::new("Double-Edge"), MoveId::new("double_edge"));
        assert_eq!(MoveId::new("King's Shield").as_str(), "kings-shield");
        assert_eq!(MoveId::new("Thunder Wave").display_name(), "Thunder Wave");
        assert!(MoveId::struggle().is_struggle());
        assert_eq!(MoveId::struggle().display_name(), "Struggle");
    }

    #[test]
    fn test_heal_detection() {
        let spec = EffectSpec {
            effects: vec![Effect::new(EffectKind::Wish, EffectTarget::User, 100)],
            ..EffectSpec::default()
        };
        assert!(spec.heals());
        assert!(!EffectSpec::default().heals());
    }
}

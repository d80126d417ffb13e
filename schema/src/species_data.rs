use crate::battle_data::Ability;
use crate::move_data::MoveId;
use crate::move_types::StatType;
use crate::pokemon_types::PokemonType;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BaseStats {
    pub hp: u8,
    pub attack: u8,
    pub defense: u8,
    pub sp_attack: u8,
    pub sp_defense: u8,
    pub speed: u8,
}

impl BaseStats {
    pub fn as_array(&self) -> [u8; 6] {
        [
            self.hp,
            self.attack,
            self.defense,
            self.sp_attack,
            self.sp_defense,
            self.speed,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Learnset {
    /// (level, move) pairs in the order they are learned.
    pub level_up: Vec<(u8, MoveId)>,
}

impl Learnset {
    /// The last four moves learned by level-up at or below `level`.
    pub fn moves_at_level(&self, level: u8) -> Vec<MoveId> {
        let mut known: Vec<MoveId> = Vec::new();
        for (learn_level, move_id) in &self.level_up {
            if *learn_level > level || known.contains(move_id) {
                continue;
            }
            known.push(move_id.clone());
        }
        let skip = known.len().saturating_sub(4);
        known.into_iter().skip(skip).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesData {
    pub id: String,
    pub name: String,
    pub types: Vec<PokemonType>,
    pub base_stats: BaseStats,
    pub capture_rate: u8,
    pub base_exp: u16,
    /// EV yield in stat order: hp, atk, def, sp_atk, sp_def, speed.
    #[serde(default)]
    pub ev_yield: [u8; 6],
    #[serde(default)]
    pub ability: Ability,
    #[serde(default)]
    pub learnset: Learnset,
}

/// The 25 natures. Neutral natures raise and lower the same stat.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Nature {
    #[default]
    Hardy,
    Lonely,
    Brave,
    Adamant,
    Naughty,
    Bold,
    Docile,
    Relaxed,
    Impish,
    Lax,
    Timid,
    Hasty,
    Serious,
    Jolly,
    Naive,
    Modest,
    Mild,
    Quiet,
    Bashful,
    Rash,
    Calm,
    Gentle,
    Sassy,
    Careful,
    Quirky,
}

impl Nature {
    /// (raised, lowered) stats, or `None` for the five neutral natures.
    pub fn modifiers(&self) -> Option<(StatType, StatType)> {
        use Nature::*;
        use StatType::*;
        let (up, down) = match self {
            Hardy | Docile | Serious | Bashful | Quirky => return None,
            Lonely => (Atk, Def),
            Brave => (Atk, Spe),
            Adamant => (Atk, SpAtk),
            Naughty => (Atk, SpDef),
            Bold => (Def, Atk),
            Relaxed => (Def, Spe),
            Impish => (Def, SpAtk),
            Lax => (Def, SpDef),
            Timid => (Spe, Atk),
            Hasty => (Spe, Def),
            Jolly => (Spe, SpAtk),
            Naive => (Spe, SpDef),
            Modest => (SpAtk, Atk),
            Mild => (SpAtk, Def),
            Quiet => (SpAtk, Spe),
            Rash => (SpAtk, SpDef),
            Calm => (SpDef, Atk),
            Gentle => (SpDef, Def),
            Sassy => (SpDef, Spe),
            Careful => (SpDef, SpAtk),
        };
        Some((up, down))
    }

    /// Percentage applied to `stat`: 110, 90 or 100.
    pub fn percent_for(&self, stat: StatType) -> u32 {
        match self.modifiers() {
            Some((up, _)) if up == stat => 110,
            Some((_, down)) if down == stat => 90,
            _ => 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_learnset_keeps_last_four() {
        let learnset = Learnset {
            level_up: vec![
                (1, MoveId::new("tackle")),
                (1, MoveId::new("growl")),
                (5, MoveId::new("ember")),
                (9, MoveId::new("smokescreen")),
                (15, MoveId::new("scratch")),
                (40, MoveId::new("flamethrower")),
            ],
        };
        let moves = learnset.moves_at_level(20);
        assert_eq!(
            moves,
            vec![
                MoveId::new("growl"),
                MoveId::new("ember"),
                MoveId::new("smokescreen"),
                MoveId::new("scratch"),
            ]
        );
    }

    #[test]
    fn test_nature_modifiers() {
        assert_eq!(Nature::Adamant.percent_for(StatType::Atk), 110);
        assert_eq!(Nature::Adamant.percent_for(StatType::SpAtk), 90);
        assert_eq!(Nature::Hardy.percent_for(StatType::Atk), 100);
        assert_eq!(Nature::from_str("modest").ok(), Some(Nature::Modest));
        let neutral = Nature::iter().filter(|n| n.modifiers().is_none()).count();
        assert_eq!(neutral, 5);
    }
}

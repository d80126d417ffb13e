use schema::{Ability, BaseStats, HeldItem, MoveId, Nature, SpeciesData, StatType, StatusType};
use serde::{Deserialize, Serialize};

/// Major status with its counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCondition {
    /// Turns left before waking.
    Sleep(u8),
    Poison,
    /// Badly poisoned; the counter grows every end of turn.
    Toxic(u8),
    Burn,
    Freeze,
    Paralysis,
}

impl StatusCondition {
    pub fn kind(&self) -> StatusType {
        match self {
            StatusCondition::Sleep(_) => StatusType::Sleep,
            StatusCondition::Poison => StatusType::Poison,
            StatusCondition::Toxic(_) => StatusType::Toxic,
            StatusCondition::Burn => StatusType::Burn,
            StatusCondition::Freeze => StatusType::Freeze,
            StatusCondition::Paralysis => StatusType::Paralysis,
        }
    }
}

/// Computed stats in the usual order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Stats {
    pub hp: u16,
    pub atk: u16,
    pub def: u16,
    pub sp_atk: u16,
    pub sp_def: u16,
    pub speed: u16,
}

impl Stats {
    /// The stat a stage applies to. Accuracy and evasion have no base value.
    pub fn get(&self, stat: StatType) -> u16 {
        match stat {
            StatType::Atk => self.atk,
            StatType::Def => self.def,
            StatType::SpAtk => self.sp_atk,
            StatType::SpDef => self.sp_def,
            StatType::Spe => self.speed,
            StatType::Acc | StatType::Eva => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveInstance {
    pub id: MoveId,
    pub pp: u8,
    #[serde(default)]
    pub pp_ups: u8,
}

impl MoveInstance {
    /// A fresh move at full PP for a move whose base PP is `base_pp`.
    pub fn new(id: MoveId, base_pp: u8) -> Self {
        Self {
            id,
            pp: base_pp,
            pp_ups: 0,
        }
    }

    /// Each PP Up adds a fifth of the base PP, up to three.
    pub fn max_pp(&self, base_pp: u8) -> u8 {
        let ups = u16::from(self.pp_ups.min(3));
        let base = u16::from(base_pp);
        (base + base * ups / 5).min(u16::from(u8::MAX)) as u8
    }
}

/// A persisted roster entry. Battles read it and hand back snapshots; they never write it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokemonInst {
    pub species: String,
    #[serde(default)]
    pub nickname: Option<String>,
    pub level: u8,
    #[serde(default)]
    pub ivs: [u8; 6], // HP, ATK, DEF, SP.ATK, SP.DEF, SPD
    #[serde(default)]
    pub evs: [u8; 6],
    #[serde(default)]
    pub nature: Nature,
    #[serde(default)]
    pub ability: Option<Ability>,
    #[serde(default)]
    pub held_item: Option<HeldItem>,
    pub moves: Vec<MoveInstance>,
    /// `None` means full HP.
    #[serde(default)]
    pub current_hp: Option<u16>,
    #[serde(default)]
    pub status: Option<StatusCondition>,
    #[serde(default)]
    pub experience: u32,
}

pub const MAX_EV_PER_STAT: u8 = 255;
pub const MAX_EV_TOTAL: u16 = 510;

impl PokemonInst {
    /// Create a roster entry at full health that knows its four latest level-up moves.
    /// `base_pp` looks up each move's base PP.
    pub fn new(
        species_data: &SpeciesData,
        level: u8,
        ivs: Option<[u8; 6]>,
        base_pp: impl Fn(&MoveId) -> u8,
    ) -> Self {
        let moves = species_data
            .learnset
            .moves_at_level(level)
            .into_iter()
            .map(|id| {
                let pp = base_pp(&id);
                MoveInstance::new(id, pp)
            })
            .collect();

        PokemonInst {
            species: species_data.id.clone(),
            nickname: None,
            level,
            ivs: ivs.unwrap_or([31; 6]),
            evs: [0; 6],
            nature: Nature::default(),
            ability: None,
            held_item: None,
            moves,
            current_hp: None,
            status: None,
            experience: 0,
        }
    }

    pub fn display_name<'a>(&'a self, species_data: &'a SpeciesData) -> &'a str {
        self.nickname.as_deref().unwrap_or(&species_data.name)
    }

    pub fn compute_stats(&self, base_stats: &BaseStats) -> Stats {
        calculate_stats(base_stats, self.level, &self.ivs, &self.evs, self.nature)
    }
}

/// Gen 3 stat formula, nature included.
///
/// HP = floor((2*B + IV + floor(EV/4)) * L / 100) + L + 10
/// X  = floor((floor((2*B + IV + floor(EV/4)) * L / 100) + 5) * nature / 100)
pub fn calculate_stats(
    base_stats: &BaseStats,
    level: u8,
    ivs: &[u8; 6],
    evs: &[u8; 6],
    nature: Nature,
) -> Stats {
    let base = base_stats.as_array();
    let level = u32::from(level);

    let core = |i: usize| -> u32 {
        let iv = u32::from(ivs[i].min(31));
        let ev = u32::from(evs[i]);
        (2 * u32::from(base[i]) + iv + ev / 4) * level / 100
    };
    let other = |i: usize, stat: StatType| -> u16 {
        let raw = (core(i) + 5) * nature.percent_for(stat) / 100;
        raw.min(u32::from(u16::MAX)) as u16
    };

    Stats {
        hp: (core(0) + level + 10).min(u32::from(u16::MAX)) as u16,
        atk: other(1, StatType::Atk),
        def: other(2, StatType::Def),
        sp_atk: other(3, StatType::SpAtk),
        sp_def: other(4, StatType::SpDef),
        speed: other(5, StatType::Spe),
    }
}

/// Adds an EV yield while honoring the per-stat and total caps.
/// Returns the amount actually gained per stat.
pub fn add_evs(evs: &mut [u8; 6], gained: &[u8; 6]) -> [u8; 6] {
    let mut applied = [0u8; 6];
    let mut total: u16 = evs.iter().map(|&ev| u16::from(ev)).sum();
    for i in 0..6 {
        let room_total = MAX_EV_TOTAL.saturating_sub(total);
        let room_stat = MAX_EV_PER_STAT - evs[i];
        let add = u16::from(gained[i]).min(room_total).min(u16::from(room_stat)) as u8;
        evs[i] += add;
        total += u16::from(add);
        applied[i] = add;
    }
    applied
}

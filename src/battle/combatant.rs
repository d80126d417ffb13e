use crate::battle::conditions::Volatile;
use crate::errors::SnapshotError;
use crate::moves::MoveCatalog;
use crate::pokemon::{MoveInstance, PokemonInst, Stats, StatusCondition};
use schema::{Ability, HeldItem, MoveCategory, MoveId, PokemonType, SpeciesData, StatType};
use serde::{Deserialize, Serialize};

/// Stage of every battle stat. Always within the configured bounds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatStages {
    pub atk: i8,
    pub def: i8,
    pub sp_atk: i8,
    pub sp_def: i8,
    pub speed: i8,
    pub accuracy: i8,
    pub evasion: i8,
}

impl StatStages {
    pub fn get(&self, stat: StatType) -> i8 {
        match stat {
            StatType::Atk => self.atk,
            StatType::Def => self.def,
            StatType::SpAtk => self.sp_atk,
            StatType::SpDef => self.sp_def,
            StatType::Spe => self.speed,
            StatType::Acc => self.accuracy,
            StatType::Eva => self.evasion,
        }
    }

    fn slot_mut(&mut self, stat: StatType) -> &mut i8 {
        match stat {
            StatType::Atk => &mut self.atk,
            StatType::Def => &mut self.def,
            StatType::SpAtk => &mut self.sp_atk,
            StatType::SpDef => &mut self.sp_def,
            StatType::Spe => &mut self.speed,
            StatType::Acc => &mut self.accuracy,
            StatType::Eva => &mut self.evasion,
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == StatStages::default()
    }
}

/// Result of trying to move a stat stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageChange {
    Changed { old: i8, new: i8 },
    /// Already at the bound in the requested direction.
    AtLimit,
}

/// One known move with its battle-time PP.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MoveSlot {
    pub id: MoveId,
    pub name: String,
    pub move_type: PokemonType,
    pub category: MoveCategory,
    pub pp: u8,
    pub pp_max: u8,
    pub pp_ups: u8,
}

/// Mutable per-battle wrapper around a roster entry.
///
/// HP and stat stages are private so every change goes through the
/// clamping accessors below.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattlePokemon {
    pub species: String,
    pub name: String,
    pub level: u8,
    pub types: Vec<PokemonType>,
    pub stats: Stats,
    current_hp: u16,
    stages: StatStages,
    pub status: Option<StatusCondition>,
    pub volatile: Volatile,
    pub moves: Vec<MoveSlot>,
    pub ability: Ability,
    pub item: Option<HeldItem>,
    /// Last item used up, for Recycle.
    pub consumed_item: Option<HeldItem>,
    pub capture_rate: u8,
    pub base_exp: u16,
    pub ev_yield: [u8; 6],
    pub evs: [u8; 6],
    pub experience: u32,
}

impl BattlePokemon {
    /// Build the battle view of a roster entry. Move data comes from the battle's catalog.
    pub fn from_roster(inst: &PokemonInst, species: &SpeciesData, catalog: &MoveCatalog) -> Self {
        let stats = inst.compute_stats(&species.base_stats);
        let moves = inst
            .moves
            .iter()
            .take(4)
            .map(|instance| Self::slot_from_instance(instance, catalog))
            .collect();

        let mut pokemon = Self {
            species: species.id.clone(),
            name: inst.display_name(species).to_string(),
            level: inst.level,
            types: species.types.clone(),
            stats,
            current_hp: stats.hp,
            stages: StatStages::default(),
            status: inst.status,
            volatile: Volatile::default(),
            moves,
            ability: inst.ability.unwrap_or(species.ability),
            item: inst.held_item,
            consumed_item: None,
            capture_rate: species.capture_rate,
            base_exp: species.base_exp,
            ev_yield: species.ev_yield,
            evs: inst.evs,
            experience: inst.experience,
        };
        if let Some(hp) = inst.current_hp {
            pokemon.set_hp(hp);
        }
        pokemon
    }

    fn slot_from_instance(instance: &MoveInstance, catalog: &MoveCatalog) -> MoveSlot {
        let data = catalog.get(&instance.id);
        let pp_max = instance.max_pp(data.metadata.pp);
        MoveSlot {
            id: instance.id.clone(),
            name: data.metadata.name.clone(),
            move_type: data.metadata.move_type,
            category: data.metadata.category,
            pp: instance.pp.min(pp_max),
            pp_max,
            pp_ups: instance.pp_ups,
        }
    }

    // --- HP ---

    pub fn current_hp(&self) -> u16 {
        self.current_hp
    }

    pub fn max_hp(&self) -> u16 {
        self.stats.hp
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    pub fn is_full_hp(&self) -> bool {
        self.current_hp == self.stats.hp
    }

    pub fn set_hp(&mut self, hp: u16) {
        self.current_hp = hp.min(self.stats.hp);
        if self.current_hp == 0 {
            self.on_faint();
        }
    }

    /// Subtract HP and return the amount actually lost.
    pub fn take_damage(&mut self, amount: u16) -> u16 {
        if self.is_fainted() {
            return 0;
        }
        let dealt = amount.min(self.current_hp);
        self.current_hp -= dealt;
        if self.current_hp == 0 {
            self.on_faint();
        }
        dealt
    }

    /// Restore HP and return the amount actually gained. Fainted Pokemon cannot heal.
    pub fn heal(&mut self, amount: u16) -> u16 {
        if self.is_fainted() {
            return 0;
        }
        let healed = amount.min(self.stats.hp - self.current_hp);
        self.current_hp += healed;
        healed
    }

    pub fn faint(&mut self) {
        self.current_hp = 0;
        self.on_faint();
    }

    fn on_faint(&mut self) {
        self.volatile = Volatile::default();
        self.status = None;
        self.stages = StatStages::default();
    }

    /// `max_hp / divisor`, at least 1.
    pub fn fraction_of_max(&self, divisor: u16) -> u16 {
        (self.stats.hp / divisor.max(1)).max(1)
    }

    // --- Stages ---

    pub fn stage(&self, stat: StatType) -> i8 {
        self.stages.get(stat)
    }

    pub fn stages(&self) -> StatStages {
        self.stages
    }

    pub fn change_stage(&mut self, stat: StatType, delta: i8, min: i8, max: i8) -> StageChange {
        let slot = self.stages.slot_mut(stat);
        let old = *slot;
        let new = old.saturating_add(delta).clamp(min, max);
        if new == old {
            return StageChange::AtLimit;
        }
        *slot = new;
        StageChange::Changed { old, new }
    }

    /// Overwrite every stage at once (Psych Up), clamped.
    pub fn set_stages(&mut self, stages: StatStages, min: i8, max: i8) {
        for stat in StatType::ALL {
            *self.stages.slot_mut(stat) = stages.get(stat).clamp(min, max);
        }
    }

    pub fn reset_stages(&mut self) {
        self.stages = StatStages::default();
    }

    // --- Types ---

    /// Types after Conversion, Camouflage and friends.
    pub fn effective_types(&self) -> &[PokemonType] {
        self.volatile.type_override.as_deref().unwrap_or(&self.types)
    }

    pub fn has_type(&self, pokemon_type: PokemonType) -> bool {
        self.effective_types().contains(&pokemon_type)
    }

    // --- Status ---

    pub fn set_status(&mut self, status: StatusCondition) {
        if !self.is_fainted() {
            self.status = Some(status);
        }
    }

    pub fn cure_status(&mut self) -> Option<StatusCondition> {
        self.status.take()
    }

    pub fn is_asleep(&self) -> bool {
        matches!(self.status, Some(StatusCondition::Sleep(_)))
    }

    // --- Moves ---

    pub fn move_index(&self, id: &MoveId) -> Option<usize> {
        self.moves.iter().position(|slot| &slot.id == id)
    }

    pub fn knows_move(&self, id: &MoveId) -> bool {
        self.move_index(id).is_some()
    }

    /// Spend one PP. Returns false if the slot is empty or out of PP.
    pub fn use_pp(&mut self, index: usize) -> bool {
        match self.moves.get_mut(index) {
            Some(slot) if slot.pp > 0 => {
                slot.pp -= 1;
                true
            }
            _ => false,
        }
    }

    /// Take the held item away, remembering it for Recycle.
    pub fn consume_item(&mut self) -> Option<HeldItem> {
        let item = self.item.take();
        if item.is_some() {
            self.consumed_item = item;
        }
        item
    }

    /// Reset everything that does not survive leaving the field.
    pub fn switch_out(&mut self) {
        self.volatile = Volatile::default();
        self.stages = StatStages::default();
        if let Some(StatusCondition::Toxic(_)) = self.status {
            self.status = Some(StatusCondition::Toxic(1));
        }
    }

    pub fn snapshot(&self) -> CombatantSnapshot {
        CombatantSnapshot {
            species: self.species.clone(),
            name: self.name.clone(),
            level: self.level,
            current_hp: self.current_hp,
            max_hp: self.stats.hp,
            status: self.status,
            stages: self.stages,
            moves: self
                .moves
                .iter()
                .map(|slot| SnapshotMove {
                    id: slot.id.clone(),
                    pp: slot.pp,
                    pp_max: slot.pp_max,
                    pp_ups: slot.pp_ups,
                })
                .collect(),
            held_item: self.item,
            evs: self.evs,
            experience: self.experience,
        }
    }

    /// Load persisted HP, status, PP and stages back into this combatant.
    pub fn restore(&mut self, snapshot: &CombatantSnapshot) {
        self.current_hp = snapshot.current_hp.min(self.stats.hp);
        self.status = snapshot.status;
        self.stages = snapshot.stages;
        for saved in &snapshot.moves {
            if let Some(slot) = self.moves.iter_mut().find(|slot| slot.id == saved.id) {
                slot.pp = saved.pp.min(slot.pp_max);
            }
        }
        self.item = snapshot.held_item;
        self.evs = snapshot.evs;
        self.experience = snapshot.experience;
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SnapshotMove {
    pub id: MoveId,
    pub pp: u8,
    pub pp_max: u8,
    pub pp_ups: u8,
}

/// What a battle hands back to the persistence layer for one combatant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CombatantSnapshot {
    pub species: String,
    pub name: String,
    pub level: u8,
    pub current_hp: u16,
    pub max_hp: u16,
    pub status: Option<StatusCondition>,
    pub stages: StatStages,
    pub moves: Vec<SnapshotMove>,
    pub held_item: Option<HeldItem>,
    pub evs: [u8; 6],
    pub experience: u32,
}

impl CombatantSnapshot {
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        postcard::to_allocvec(self).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        postcard::from_bytes(bytes).map_err(|e| SnapshotError::Decode(e.to_string()))
    }

    /// Write the battle's results into the roster entry it came from.
    pub fn apply_to(&self, inst: &mut PokemonInst) {
        inst.current_hp = Some(self.current_hp);
        inst.status = self.status;
        inst.held_item = self.held_item;
        inst.evs = self.evs;
        inst.experience = self.experience;
        for saved in &self.moves {
            if let Some(instance) = inst.moves.iter_mut().find(|m| m.id == saved.id) {
                instance.pp = saved.pp;
            }
        }
    }
}

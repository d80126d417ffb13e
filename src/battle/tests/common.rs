use crate::battle::action_stack::PlayerAction;
use crate::battle::combatant::{BattlePokemon, MoveSlot};
use crate::battle::engine::{Battle, TurnReport};
use crate::battle::state::{BattleKind, BattleSide, BattleState, CombatantRef, TurnRng};
use crate::config::EngineConfig;
use crate::data::{DataProvider, RonDataProvider};
use crate::moves::MoveCatalog;
use crate::pokemon::{MoveInstance, PokemonInst, Stats, StatusCondition};
use schema::{Ability, EffectSpec, HeldItem, MoveCategory, MoveData, MoveId, MoveMetadata, PokemonType};
use std::sync::{Arc, OnceLock};

const MOVES_RON: &str = include_str!("../../../data/moves.ron");
const SPECIES_RON: &str = include_str!("../../../data/species.ron");

/// The bundled test data, parsed once per test binary.
pub fn test_provider() -> &'static RonDataProvider {
    static PROVIDER: OnceLock<RonDataProvider> = OnceLock::new();
    PROVIDER.get_or_init(|| match RonDataProvider::from_ron_str(MOVES_RON, SPECIES_RON) {
        Ok(provider) => provider,
        Err(err) => panic!("bundled test data failed to parse: {}", err),
    })
}

/// A catalog holding every bundled move.
pub fn test_catalog() -> MoveCatalog {
    let provider = test_provider();
    MoveCatalog::preload(provider, provider.move_ids(), EngineConfig::default().struggle_power)
}

/// Look up one bundled move, panicking on typos.
pub fn move_data(id: &str) -> MoveData {
    match test_provider().move_data(&MoveId::new(id)) {
        Some(data) => data,
        None => panic!("no bundled move named {}", id),
    }
}

/// A plain damaging move, always accurate, with no extra effects.
pub fn custom_move(id: &str, move_type: PokemonType, category: MoveCategory, power: u16) -> MoveData {
    let id = MoveId::new(id);
    MoveData {
        metadata: MoveMetadata {
            name: id.display_name(),
            id,
            accuracy: None,
            power,
            priority: 0,
            category,
            move_type,
            pp: 10,
            min_hits: None,
            max_hits: None,
            ailment_chance: 0,
            stat_changes: Vec::new(),
            target: Default::default(),
            flags: Vec::new(),
        },
        effect: EffectSpec {
            damage: category != MoveCategory::Status,
            ..EffectSpec::default()
        },
    }
}

/// Register `data` with the battle's catalog and put it in move `slot` of
/// `who`, with full PP.
pub fn teach_move(battle: &mut Battle, who: CombatantRef, slot: usize, data: MoveData) {
    let move_slot = MoveSlot {
        id: data.metadata.id.clone(),
        name: data.metadata.name.clone(),
        move_type: data.metadata.move_type,
        category: data.metadata.category,
        pp: data.metadata.pp,
        pp_max: data.metadata.pp,
        pp_ups: 0,
    };
    battle.catalog_mut().insert(data);
    match battle.state_mut().pokemon_mut(who) {
        Some(pokemon) => pokemon.moves[slot] = move_slot,
        None => panic!("no active combatant at {:?}", who),
    }
}

/// A builder for creating test Pokemon instances with common defaults.
///
/// # Example
/// ```ignore
/// let pokemon = TestPokemonBuilder::new("pikachu", 25)
///     .with_moves(vec!["tackle"])
///     .with_status(StatusCondition::Paralysis)
///     .build();
/// ```
pub struct TestPokemonBuilder {
    species: String,
    level: u8,
    moves: Option<Vec<MoveId>>,
    status: Option<StatusCondition>,
    current_hp: Option<u16>,
    stats: Option<Stats>,
    hp_stat: Option<u16>,
    item: Option<HeldItem>,
    ability: Option<Ability>,
    types: Option<Vec<PokemonType>>,
}

impl TestPokemonBuilder {
    /// Creates a new builder for a given species and level.
    pub fn new(species: &str, level: u8) -> Self {
        Self {
            species: species.to_string(),
            level,
            moves: None,
            status: None,
            current_hp: None,
            stats: None,
            hp_stat: None,
            item: None,
            ability: None,
            types: None,
        }
    }

    /// Sets the moves for the test Pokemon. Defaults to the species learnset.
    pub fn with_moves(mut self, moves: Vec<&str>) -> Self {
        self.moves = Some(moves.into_iter().map(MoveId::new).collect());
        self
    }

    pub fn with_status(mut self, status: StatusCondition) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the current HP for the test Pokemon. If not set, HP will be max.
    pub fn with_hp(mut self, hp: u16) -> Self {
        self.current_hp = Some(hp);
        self
    }

    /// Overrides max HP only, leaving the other stats computed.
    pub fn with_hp_stat(mut self, hp: u16) -> Self {
        self.hp_stat = Some(hp);
        self
    }

    /// Overrides every computed stat.
    pub fn with_stats(mut self, hp: u16, atk: u16, def: u16, sp_atk: u16, sp_def: u16, speed: u16) -> Self {
        self.stats = Some(Stats {
            hp,
            atk,
            def,
            sp_atk,
            sp_def,
            speed,
        });
        self
    }

    pub fn with_item(mut self, item: HeldItem) -> Self {
        self.item = Some(item);
        self
    }

    pub fn with_ability(mut self, ability: Ability) -> Self {
        self.ability = Some(ability);
        self
    }

    pub fn with_types(mut self, types: Vec<PokemonType>) -> Self {
        self.types = Some(types);
        self
    }

    pub fn build(self) -> BattlePokemon {
        let provider = test_provider();
        let species = match provider.require_species(&self.species) {
            Ok(data) => data,
            Err(err) => panic!("Failed to load species data for {}: {}", self.species, err),
        };
        let base_pp = |id: &MoveId| provider.move_metadata(id).map(|m| m.pp).unwrap_or(1);

        let mut inst = PokemonInst::new(species, self.level, None, base_pp);
        if let Some(moves) = self.moves {
            inst.moves = moves
                .into_iter()
                .map(|id| {
                    let pp = base_pp(&id);
                    MoveInstance::new(id, pp)
                })
                .collect();
        }
        inst.ability = self.ability;
        inst.held_item = self.item;

        let mut pokemon = BattlePokemon::from_roster(&inst, species, &test_catalog());
        if let Some(stats) = self.stats {
            pokemon.stats = stats;
        }
        if let Some(hp) = self.hp_stat {
            pokemon.stats.hp = hp;
        }
        if let Some(types) = self.types {
            pokemon.types = types;
        }
        if let Some(status) = self.status {
            pokemon.status = Some(status);
        }
        pokemon.set_hp(self.current_hp.unwrap_or(pokemon.stats.hp));
        pokemon
    }
}

fn side(name: &str, team: Vec<BattlePokemon>, active_slots: usize) -> BattleSide {
    BattleSide::new(name, team, active_slots)
}

fn state(kind: BattleKind, side_a: BattleSide, side_b: BattleSide) -> BattleState {
    BattleState::new("test_battle", kind, side_a, side_b, Arc::new(EngineConfig::default()))
}

/// Creates a standard 1v1 trainer battle state for testing.
pub fn create_test_battle(p1_pokemon: BattlePokemon, p2_pokemon: BattlePokemon) -> BattleState {
    create_team_battle(vec![p1_pokemon], vec![p2_pokemon])
}

/// Single-slot trainer battle with full teams; the first member of each leads.
pub fn create_team_battle(p1_team: Vec<BattlePokemon>, p2_team: Vec<BattlePokemon>) -> BattleState {
    state(
        BattleKind::Trainer,
        side("Player 1", p1_team, 1),
        side("Player 2", p2_team, 1),
    )
}

/// Two active slots per side.
pub fn create_double_battle(p1_team: Vec<BattlePokemon>, p2_team: Vec<BattlePokemon>) -> BattleState {
    state(
        BattleKind::Trainer,
        side("Player 1", p1_team, 2),
        side("Player 2", p2_team, 2),
    )
}

pub fn create_wild_battle(player_team: Vec<BattlePokemon>, wild: BattlePokemon) -> BattleState {
    state(BattleKind::Wild, side("Player", player_team, 1), side("Wild", vec![wild], 1))
}

/// Wrap a prepared state in a full battle over the bundled catalog.
pub fn engine_for(state: BattleState) -> Battle {
    Battle::from_state(state, test_catalog())
}

/// A `TurnRng` with no scripted values: every roll takes its quiet outcome
/// (hits land, no crits, no secondary effects, top damage roll).
pub fn predictable_rng() -> TurnRng {
    TurnRng::scripted()
}

/// Choose the move in `move_index`, letting the engine pick the target.
pub fn use_move(move_index: usize) -> PlayerAction {
    PlayerAction::UseMove {
        move_index,
        target: None,
    }
}

/// Submit one action per side (skipping combatants locked into a move) and
/// resolve the turn. Singles only.
pub fn run_turn(battle: &mut Battle, p1: PlayerAction, p2: PlayerAction, rng: &mut TurnRng) -> TurnReport {
    let pending = battle.pending_actors();
    for (actor, action) in [(CombatantRef::new(0, 0), p1), (CombatantRef::new(1, 0), p2)] {
        if !pending.contains(&actor) {
            continue;
        }
        if let Err(err) = battle.submit_action(actor, action) {
            panic!("action for {:?} was rejected: {}", actor, err);
        }
    }
    match battle.resolve_turn(rng) {
        Ok(report) => report,
        Err(err) => panic!("turn failed to resolve: {}", err),
    }
}

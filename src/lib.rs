//! Pokemon Battle Simulation Core
//!
//! A turn-based battle engine: damage, status, field effects, capture and
//! rewards, driven by static data supplied through a [`DataProvider`].
//! Battles are advanced one turn at a time and report what happened as
//! [`BattleEvent`]s plus a ready-made text log.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod config;
pub mod data;
pub mod errors;
pub mod moves;
pub mod pokemon;
pub mod progression;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{
    Ability, BallType, BaseStats, DamageKind, Effect, EffectKind, EffectSpec, EffectTarget, HeldItem, MoveCategory,
    MoveData, MoveId, MoveMetadata, MoveTarget, Nature, PokemonType, SpeciesData, StatType, StatusType, WeatherKind,
};

// --- From this crate's modules (`src/`) ---

// Turn engine and its state.
pub use battle::action_stack::PlayerAction;
pub use battle::ai::{Behavior, WildAi};
pub use battle::catch::CaptureConditions;
pub use battle::combatant::{BattlePokemon, CombatantSnapshot};
pub use battle::engine::{Battle, BattleOutcome, TurnReport};
pub use battle::session::{BattleRegistry, BattleSession};
pub use battle::state::{BattleEvent, BattleKind, BattleSide, BattleState, CombatantRef, GameState, RollKind, TurnRng};

// Static data and configuration.
pub use config::EngineConfig;
pub use data::{DataProvider, RonDataProvider};
pub use moves::MoveCatalog;
pub use pokemon::{PokemonInst, StatusCondition};

// Crate-specific error and result types.
pub use errors::{
    ActionError, BattleEngineError, BattleResult, BattleStateError, ConfigError, MoveDataError, MoveDataResult,
    SnapshotError, SpeciesDataError, SpeciesDataResult,
};

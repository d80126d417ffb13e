use crate::battle::state::CombatantRef;
use schema::MoveId;
use thiserror::Error;

/// Main error type for the battle simulation core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleEngineError {
    /// Error related to move data lookup or processing
    #[error("Move data error: {0}")]
    MoveData(#[from] MoveDataError),
    /// Error related to species data lookup or processing
    #[error("Species data error: {0}")]
    SpeciesData(#[from] SpeciesDataError),
    /// Error related to invalid battle state
    #[error("Battle state error: {0}")]
    BattleState(#[from] BattleStateError),
    /// Error related to invalid player actions
    #[error("Action error: {0}")]
    Action(#[from] ActionError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Errors related to move data operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveDataError {
    /// The specified move was not found in the database
    #[error("Move not found: {0}")]
    MoveNotFound(MoveId),
    /// Move data is malformed or incomplete
    #[error("Malformed move data: {0}")]
    MalformedData(String),
}

/// Errors related to species data operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeciesDataError {
    /// The specified species was not found in the database
    #[error("Species not found: {0}")]
    SpeciesNotFound(String),
    /// Species data is malformed or incomplete
    #[error("Malformed species data: {0}")]
    MalformedData(String),
}

/// Errors related to battle state validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleStateError {
    #[error("The battle has already ended")]
    BattleAlreadyEnded,
    #[error("Side {side} must send out a replacement first")]
    AwaitingForcedSwitch { side: usize },
    #[error("No forced switch is pending for {0:?}")]
    NoForcedSwitchPending(CombatantRef),
    #[error("Participant {0} is already in a battle")]
    AlreadyInBattle(String),
    #[error("Waiting for actions from {0:?}")]
    ActionsPending(Vec<CombatantRef>),
    /// Invalid combatant reference
    #[error("Invalid combatant reference: {0:?}")]
    InvalidCombatant(CombatantRef),
    #[error("Invalid battle setup: {0}")]
    InvalidSetup(String),
}

/// Errors related to player actions. Raised before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{pokemon} does not know move slot {move_index}")]
    MoveNotKnown { pokemon: String, move_index: usize },
    #[error("{pokemon} has no PP left for {move_id}")]
    NoPpRemaining { pokemon: String, move_id: MoveId },
    #[error("{0} still has moves with PP and cannot struggle")]
    StruggleNotAllowed(String),
    #[error("{0} has fainted and cannot act")]
    ActorFainted(String),
    #[error("{0:?} is not an active combatant")]
    NotActive(CombatantRef),
    #[error("An action was already submitted for {0:?}")]
    AlreadySubmitted(CombatantRef),
    #[error("{0} is trapped and cannot leave the battle")]
    Trapped(String),
    #[error("Team slot {0} cannot be switched in")]
    InvalidSwitchTarget(usize),
    #[error("{0:?} is not on the player's side")]
    NotPlayerSide(CombatantRef),
    #[error("That action is not allowed in a {0} battle")]
    NotAllowedInBattleKind(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to parse engine config: {0}")]
    Parse(String),
    #[error("Invalid engine config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("Failed to encode snapshot: {0}")]
    Encode(String),
    #[error("Failed to decode snapshot: {0}")]
    Decode(String),
}

/// Type alias for Results using BattleEngineError
pub type BattleResult<T> = Result<T, BattleEngineError>;

/// Type alias for Results using MoveDataError
pub type MoveDataResult<T> = Result<T, MoveDataError>;

/// Type alias for Results using SpeciesDataError
pub type SpeciesDataResult<T> = Result<T, SpeciesDataError>;

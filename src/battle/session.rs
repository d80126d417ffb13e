//! Async ownership of running battles.
//!
//! A [`BattleSession`] is the only way callers touch a battle once it is
//! running: every operation takes the session's mutex, so a turn is always
//! resolved completely before the next submission is looked at. The
//! [`BattleRegistry`] only remembers which participant is busy; it has its
//! own lock and never holds a battle's lock.

use crate::battle::action_stack::PlayerAction;
use crate::battle::combatant::CombatantSnapshot;
use crate::battle::engine::{Battle, BattleOutcome, TurnReport};
use crate::battle::state::{CombatantRef, GameState, TurnRng};
use crate::errors::{BattleResult, BattleStateError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

struct SessionState {
    battle: Battle,
    rng: TurnRng,
}

/// Shared handle to one battle and the RNG that drives it.
#[derive(Clone)]
pub struct BattleSession {
    id: String,
    inner: Arc<Mutex<SessionState>>,
}

impl BattleSession {
    pub fn new(battle: Battle, rng: TurnRng) -> Self {
        Self {
            id: battle.id().to_string(),
            inner: Arc::new(Mutex::new(SessionState { battle, rng })),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queue an action. Once every active combatant has one, the turn is
    /// resolved before the lock is released and its report returned.
    pub async fn submit_action(&self, actor: CombatantRef, action: PlayerAction) -> BattleResult<Option<TurnReport>> {
        let mut guard = self.inner.lock().await;
        let SessionState { battle, rng } = &mut *guard;
        battle.submit_action(actor, action)?;
        if !battle.ready_for_turn_resolution() {
            return Ok(None);
        }
        debug!(battle = %self.id, turn = battle.state().turn_number + 1, "all actions in, resolving");
        battle.resolve_turn(rng).map(Some)
    }

    /// Resolve a turn in which nobody owes a choice (every combatant is
    /// locked into a move).
    pub async fn resolve_turn(&self) -> BattleResult<TurnReport> {
        let mut guard = self.inner.lock().await;
        let SessionState { battle, rng } = &mut *guard;
        battle.resolve_turn(rng)
    }

    pub async fn submit_forced_switch(&self, slot: CombatantRef, team_index: usize) -> BattleResult<TurnReport> {
        self.inner.lock().await.battle.submit_forced_switch(slot, team_index)
    }

    /// End an idle battle.
    pub async fn force_end(&self) -> TurnReport {
        info!(battle = %self.id, "battle force-ended");
        self.inner.lock().await.battle.force_end()
    }

    pub async fn pending_actors(&self) -> Vec<CombatantRef> {
        self.inner.lock().await.battle.pending_actors()
    }

    pub async fn game_state(&self) -> GameState {
        self.inner.lock().await.battle.game_state()
    }

    pub async fn outcome(&self) -> BattleOutcome {
        self.inner.lock().await.battle.outcome()
    }

    pub async fn snapshots(&self) -> Vec<CombatantSnapshot> {
        self.inner.lock().await.battle.snapshots()
    }

    /// Run a read-only closure against the battle under the session lock.
    pub async fn with_battle<R>(&self, f: impl FnOnce(&Battle) -> R) -> R {
        f(&self.inner.lock().await.battle)
    }
}

/// Which participant is currently busy in which battle.
#[derive(Default)]
pub struct BattleRegistry {
    participants: Mutex<HashMap<String, BattleSession>>,
}

impl BattleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a participant to a battle. Fails if they are already in one.
    pub async fn register(&self, participant_id: &str, session: BattleSession) -> BattleResult<()> {
        let mut participants = self.participants.lock().await;
        if participants.contains_key(participant_id) {
            return Err(BattleStateError::AlreadyInBattle(participant_id.to_string()).into());
        }
        debug!(participant = participant_id, battle = session.id(), "participant registered");
        participants.insert(participant_id.to_string(), session);
        Ok(())
    }

    /// Free a participant. Returns the battle they were bound to.
    pub async fn release(&self, participant_id: &str) -> Option<BattleSession> {
        let released = self.participants.lock().await.remove(participant_id);
        if let Some(session) = &released {
            debug!(participant = participant_id, battle = session.id(), "participant released");
        }
        released
    }

    /// Free every participant bound to `battle_id`.
    pub async fn release_battle(&self, battle_id: &str) -> usize {
        let mut participants = self.participants.lock().await;
        let before = participants.len();
        participants.retain(|_, session| session.id() != battle_id);
        before - participants.len()
    }

    pub async fn battle_of(&self, participant_id: &str) -> Option<BattleSession> {
        self.participants.lock().await.get(participant_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.participants.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.participants.lock().await.is_empty()
    }
}

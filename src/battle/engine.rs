use crate::battle::action_stack::{ActionStack, BattleAction, PlayerAction};
use crate::battle::catch::{attempt_capture, ball_modifier, capture_target, status_bonus, CaptureConditions};
use crate::battle::combatant::{BattlePokemon, CombatantSnapshot};
use crate::battle::conditions::ChargingMove;
use crate::battle::damage::{calculate_damage, DamageContext};
use crate::battle::items;
use crate::battle::move_effects::{apply_drain, apply_effect, apply_recoil, EffectContext};
use crate::battle::state::{
    ActionFailureReason, BattleEvent, BattleKind, BattleSide, BattleState, CombatantRef, DamageCause, EventBus,
    GameState, Restriction, RollKind, TurnRng,
};
use crate::battle::stats::{effective_speed, hits_vanished, move_hits};
use crate::battle::status::{check_confusion, check_pre_action, end_of_turn_effects};
use crate::battle::targeting::{effective_target, resolve_targets};
use crate::config::EngineConfig;
use crate::errors::{ActionError, BattleResult, BattleStateError};
use crate::moves::MoveCatalog;
use crate::progression::{BattleParticipationTracker, RewardCalculator};
use schema::{BallType, DamageKind, EffectKind, EffectTarget, MoveCategory, MoveData, MoveFlag, MoveId, MoveTarget, PokemonType, WeatherKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How the battle stands, from side 0's point of view.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    Ongoing,
    Victory,
    Defeat,
    Captured,
    Fled,
    Draw,
}

impl From<GameState> for BattleOutcome {
    fn from(game_state: GameState) -> Self {
        match game_state {
            GameState::Ongoing | GameState::AwaitingForcedSwitch | GameState::BothFaintedWithBackup => {
                BattleOutcome::Ongoing
            }
            GameState::Side1Win => BattleOutcome::Victory,
            GameState::Side2Win => BattleOutcome::Defeat,
            GameState::Captured => BattleOutcome::Captured,
            GameState::Fled => BattleOutcome::Fled,
            GameState::BothFaintedNoBackup | GameState::ForceEnded => BattleOutcome::Draw,
        }
    }
}

/// Everything a caller needs to present one resolved turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub events: Vec<BattleEvent>,
    /// Human-readable lines, in event order.
    pub log: Vec<String>,
    pub outcome: BattleOutcome,
    pub game_state: GameState,
}

/// A battle in progress: its state, the moves it can reference and who has
/// faced whom.
#[derive(Debug, Clone)]
pub struct Battle {
    state: BattleState,
    catalog: MoveCatalog,
    participation: BattleParticipationTracker,
}

impl Battle {
    pub fn new(
        id: impl Into<String>,
        kind: BattleKind,
        side_a: BattleSide,
        side_b: BattleSide,
        catalog: MoveCatalog,
        config: Arc<EngineConfig>,
    ) -> BattleResult<Self> {
        config.validate()?;
        for (index, side) in [&side_a, &side_b].into_iter().enumerate() {
            if side.active.iter().all(Option::is_none) {
                return Err(BattleStateError::InvalidSetup(format!("side {} has no Pokemon able to battle", index)).into());
            }
        }
        if kind == BattleKind::Wild && side_b.team.len() != 1 {
            return Err(BattleStateError::InvalidSetup("a wild battle has exactly one wild Pokemon".to_string()).into());
        }

        let state = BattleState::new(id, kind, side_a, side_b, config);
        info!(battle = %state.battle_id, kind = %state.kind, "battle created");
        Ok(Self::from_state(state, catalog))
    }

    /// Wrap an already assembled state, e.g. one rebuilt from storage.
    pub fn from_state(state: BattleState, catalog: MoveCatalog) -> Self {
        let mut battle = Self {
            state,
            catalog,
            participation: BattleParticipationTracker::new(),
        };
        record_participation(&mut battle.participation, &battle.state);
        battle
    }

    pub fn id(&self) -> &str {
        &self.state.battle_id
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut BattleState {
        &mut self.state
    }

    pub fn catalog(&self) -> &MoveCatalog {
        &self.catalog
    }

    #[cfg(test)]
    pub(crate) fn catalog_mut(&mut self) -> &mut MoveCatalog {
        &mut self.catalog
    }

    pub fn participation(&self) -> &BattleParticipationTracker {
        &self.participation
    }

    pub fn game_state(&self) -> GameState {
        self.state.game_state
    }

    pub fn outcome(&self) -> BattleOutcome {
        BattleOutcome::from(self.state.game_state)
    }

    /// Queue one combatant's choice for the coming turn.
    ///
    /// Illegal choices are rejected here and leave the battle untouched.
    pub fn submit_action(&mut self, actor: CombatantRef, action: PlayerAction) -> BattleResult<()> {
        let state = &self.state;
        if state.game_state.is_terminal() {
            return Err(BattleStateError::BattleAlreadyEnded.into());
        }
        let Some(side) = state.sides.get(actor.side).filter(|side| actor.slot < side.active.len()) else {
            return Err(BattleStateError::InvalidCombatant(actor).into());
        };
        if !side.replacements_needed.is_empty() {
            return Err(BattleStateError::AwaitingForcedSwitch { side: actor.side }.into());
        }
        let Some(pokemon) = state.pokemon(actor) else {
            return Err(ActionError::NotActive(actor).into());
        };
        if pokemon.is_fainted() {
            return Err(ActionError::ActorFainted(pokemon.name.clone()).into());
        }
        if side.pending_actions[actor.slot].is_some() {
            return Err(ActionError::AlreadySubmitted(actor).into());
        }
        if let Err(err) = validate_player_action(state, actor, &action) {
            warn!(battle = %state.battle_id, ?actor, %err, "action rejected");
            return Err(err.into());
        }

        debug!(battle = %state.battle_id, ?actor, ?action, "action submitted");
        self.state.sides[actor.side].pending_actions[actor.slot] = Some(action);
        Ok(())
    }

    /// Active combatants that still owe a choice this turn. Combatants locked
    /// into a move (charging, recharging, Bide) never do.
    pub fn pending_actors(&self) -> Vec<CombatantRef> {
        self.state
            .all_active_refs()
            .into_iter()
            .filter(|who| {
                self.state.sides[who.side].pending_actions[who.slot].is_none()
                    && ActionStack::forced_continuation(*who, &self.state).is_none()
            })
            .collect()
    }

    /// Check if the battle is ready for turn resolution (every active combatant has an action)
    pub fn ready_for_turn_resolution(&self) -> bool {
        self.state.game_state == GameState::Ongoing && self.pending_actors().is_empty()
    }

    /// Main entry point for turn resolution.
    ///
    /// Runs every queued action in order, then the end-of-turn phase if the
    /// battle is still going, then works out what the next turn waits on.
    pub fn resolve_turn(&mut self, rng: &mut TurnRng) -> BattleResult<TurnReport> {
        self.ensure_not_suspended()?;
        let pending = self.pending_actors();
        if !pending.is_empty() {
            return Err(BattleStateError::ActionsPending(pending).into());
        }

        let mut events = Vec::new();

        // 1. Initialization
        initialize_turn(&mut self.state, &mut events);

        // 2. Build initial action stack from the submitted actions
        let mut action_stack = ActionStack::build_initial(&self.state, &self.catalog, rng);

        // 3. Execute actions until the stack is empty or the battle is decided
        while let Some(action) = action_stack.pop_front() {
            execute_battle_action(action, &mut self.state, &self.catalog, &mut action_stack, &mut events, rng);
            record_participation(&mut self.participation, &self.state);
            self.handle_fainted(&mut events);
            check_win_conditions(&mut self.state, &mut events);
            if self.state.game_state.is_terminal() {
                break;
            }
        }

        // 4. End-of-Turn Phase (only if battle is still ongoing)
        if self.state.game_state == GameState::Ongoing {
            execute_end_turn_phase(&mut self.state, &mut events, rng);
            self.handle_fainted(&mut events);
        }

        // 5. Cleanup & Finalization
        finalize_turn(&mut self.state, &mut events);
        record_participation(&mut self.participation, &self.state);

        Ok(self.report(events))
    }

    /// Fill a position emptied by a faint. The battle resumes once every
    /// requested replacement has been sent out.
    pub fn submit_forced_switch(&mut self, slot: CombatantRef, team_index: usize) -> BattleResult<TurnReport> {
        if self.state.game_state.is_terminal() {
            return Err(BattleStateError::BattleAlreadyEnded.into());
        }
        let Some(side) = self.state.sides.get(slot.side) else {
            return Err(BattleStateError::InvalidCombatant(slot).into());
        };
        if !side.replacements_needed.contains(&slot.slot) {
            return Err(BattleStateError::NoForcedSwitchPending(slot).into());
        }
        let valid = side.team.get(team_index).is_some_and(|p| !p.is_fainted()) && !side.is_active_index(team_index);
        if !valid {
            return Err(ActionError::InvalidSwitchTarget(team_index).into());
        }

        let mut events = Vec::new();
        self.state.sides[slot.side].replacements_needed.retain(|&needed| needed != slot.slot);
        resolve_replacement_phase(&mut self.state, slot, team_index, &mut events);
        record_participation(&mut self.participation, &self.state);
        self.handle_fainted(&mut events);
        check_win_conditions(&mut self.state, &mut events);
        if !self.state.game_state.is_terminal() {
            check_for_pending_replacements(&mut self.state, &mut events);
        }
        Ok(self.report(events))
    }

    /// End an idle battle. Does nothing to a battle that is already over.
    pub fn force_end(&mut self) -> TurnReport {
        let mut events = Vec::new();
        if !self.state.game_state.is_terminal() {
            end_battle(&mut self.state, GameState::ForceEnded, &mut events);
        }
        self.report(events)
    }

    /// Persistence view of every team member, side 0 first.
    pub fn snapshots(&self) -> Vec<CombatantSnapshot> {
        self.state
            .sides
            .iter()
            .flat_map(|side| side.team.iter().map(BattlePokemon::snapshot))
            .collect()
    }

    fn ensure_not_suspended(&self) -> BattleResult<()> {
        if self.state.game_state.is_terminal() {
            return Err(BattleStateError::BattleAlreadyEnded.into());
        }
        if let Some(side) = (0..2).find(|&side| !self.state.sides[side].replacements_needed.is_empty()) {
            return Err(BattleStateError::AwaitingForcedSwitch { side }.into());
        }
        Ok(())
    }

    /// Pay out experience and effort for every knockout since the last call.
    fn handle_fainted(&mut self, events: &mut Vec<BattleEvent>) {
        for (who, team_index) in std::mem::take(&mut self.state.newly_fainted) {
            debug!(battle = %self.state.battle_id, ?who, team_index, "combatant fainted");
            let (_, reward_events) =
                RewardCalculator::award_for_faint(&mut self.state, &self.participation, who.side, team_index);
            events.extend(reward_events);
        }
    }

    fn report(&self, events: Vec<BattleEvent>) -> TurnReport {
        let mut bus = EventBus::new();
        bus.extend(events);
        let log = bus.log_lines(&self.state);
        TurnReport {
            events: bus.into_events(),
            log,
            outcome: self.outcome(),
            game_state: self.state.game_state,
        }
    }
}

/// Validates a player action for detailed correctness.
/// Checks move PP, bounds, switch targets and whether the battle kind allows it.
pub fn validate_player_action(
    battle_state: &BattleState,
    actor: CombatantRef,
    action: &PlayerAction,
) -> Result<(), ActionError> {
    let Some(pokemon) = battle_state.pokemon(actor) else {
        return Err(ActionError::NotActive(actor));
    };
    let side = &battle_state.sides[actor.side];

    match action {
        PlayerAction::UseMove { move_index, .. } => {
            let slot = pokemon.moves.get(*move_index).ok_or_else(|| ActionError::MoveNotKnown {
                pokemon: pokemon.name.clone(),
                move_index: *move_index,
            })?;
            if slot.pp == 0 {
                return Err(ActionError::NoPpRemaining {
                    pokemon: pokemon.name.clone(),
                    move_id: slot.id.clone(),
                });
            }
            Ok(())
        }
        PlayerAction::Struggle => {
            if pokemon.moves.iter().any(|slot| slot.pp > 0) {
                return Err(ActionError::StruggleNotAllowed(pokemon.name.clone()));
            }
            Ok(())
        }
        PlayerAction::SwitchPokemon { team_index } => {
            let claimed = side
                .pending_actions
                .iter()
                .flatten()
                .any(|other| matches!(other, PlayerAction::SwitchPokemon { team_index: t } if t == team_index));
            let available = side.team.get(*team_index).is_some_and(|p| !p.is_fainted());
            if !available || side.is_active_index(*team_index) || claimed {
                return Err(ActionError::InvalidSwitchTarget(*team_index));
            }
            if pokemon.volatile.is_trapped() {
                return Err(ActionError::Trapped(pokemon.name.clone()));
            }
            Ok(())
        }
        PlayerAction::UseBall { .. } => capture_target(battle_state, actor).map(|_| ()),
        PlayerAction::Flee => {
            if battle_state.kind != BattleKind::Wild {
                return Err(ActionError::NotAllowedInBattleKind(battle_state.kind.to_string()));
            }
            if pokemon.volatile.is_trapped() {
                return Err(ActionError::Trapped(pokemon.name.clone()));
            }
            Ok(())
        }
        PlayerAction::Forfeit => {
            if battle_state.kind == BattleKind::Wild {
                return Err(ActionError::NotAllowedInBattleKind(battle_state.kind.to_string()));
            }
            Ok(())
        }
    }
}

fn initialize_turn(battle_state: &mut BattleState, events: &mut Vec<BattleEvent>) {
    battle_state.turn_number += 1;
    for who in battle_state.all_active_refs() {
        if let Some(pokemon) = battle_state.pokemon_mut(who) {
            pokemon.volatile.acted_this_turn = false;
        }
    }
    debug!(battle = %battle_state.battle_id, turn = battle_state.turn_number, "turn started");
    events.push(BattleEvent::TurnStarted {
        turn_number: battle_state.turn_number,
    });
}

/// Execute a single battle action. Actions it spawns (a called move) are
/// pushed to the front of the stack.
pub fn execute_battle_action(
    action: BattleAction,
    battle_state: &mut BattleState,
    catalog: &MoveCatalog,
    action_stack: &mut ActionStack,
    events: &mut Vec<BattleEvent>,
    rng: &mut TurnRng,
) {
    match action {
        BattleAction::Forfeit { side } => execute_forfeit(side, battle_state, events),
        BattleAction::Flee { actor } => execute_flee(actor, battle_state, events, rng),
        BattleAction::ThrowBall {
            actor,
            ball,
            conditions,
        } => execute_throw_ball(actor, ball, conditions, battle_state, events, rng),
        BattleAction::Switch { actor, team_index } => execute_switch(actor, team_index, battle_state, events),
        BattleAction::UseMove {
            actor,
            move_id,
            move_index,
            target,
        } => {
            let usage = MoveUse {
                actor,
                move_id,
                move_index,
                target,
                origin: MoveOrigin::Chosen,
            };
            execute_move(battle_state, catalog, usage, events, rng);
        }
        BattleAction::CalledMove { actor, move_id, target } => {
            let usage = MoveUse {
                actor,
                move_id,
                move_index: None,
                target,
                origin: MoveOrigin::Called,
            };
            execute_move(battle_state, catalog, usage, events, rng);
        }
    }

    while let Some(follow_up) = battle_state.follow_ups.pop_back() {
        action_stack.push_front(follow_up);
    }
}

/// Execute forfeit action - the side loses immediately
fn execute_forfeit(side: usize, battle_state: &mut BattleState, events: &mut Vec<BattleEvent>) {
    events.push(BattleEvent::Forfeited { side });
    let outcome = if side == 0 { GameState::Side2Win } else { GameState::Side1Win };
    end_battle(battle_state, outcome, events);
}

/// Escape odds are `floor(Su * 128 / St) + 30 * attempts`; above 255 always works.
fn execute_flee(actor: CombatantRef, battle_state: &mut BattleState, events: &mut Vec<BattleEvent>, rng: &mut TurnRng) {
    let Some(runner) = battle_state.pokemon(actor).filter(|p| !p.is_fainted()) else {
        return;
    };
    let trapped = runner.volatile.is_trapped();
    let runner_speed = effective_speed(runner, &battle_state.field, &battle_state.config) as u32;
    let foe_speed = battle_state
        .opponents_of(actor)
        .first()
        .and_then(|who| battle_state.pokemon(*who))
        .map(|foe| effective_speed(foe, &battle_state.field, &battle_state.config) as u32)
        .unwrap_or(0);

    let side = actor.side;
    let attempts = {
        let flee_attempts = &mut battle_state.sides[side].flee_attempts;
        *flee_attempts = flee_attempts.saturating_add(1);
        *flee_attempts as u32
    };
    if trapped {
        events.push(BattleEvent::FleeFailed { side });
        return;
    }

    let odds = runner_speed * 128 / foe_speed.max(1) + 30 * attempts;
    let escaped = odds > 255 || rng.next_in_range(RollKind::Flee, 0, 255) < odds;
    debug!(?actor, odds, attempts, escaped, "flee attempt");
    if escaped {
        events.push(BattleEvent::FleeSucceeded { side });
        end_battle(battle_state, GameState::Fled, events);
    } else {
        events.push(BattleEvent::FleeFailed { side });
    }
}

fn execute_throw_ball(
    actor: CombatantRef,
    ball: BallType,
    mut conditions: CaptureConditions,
    battle_state: &mut BattleState,
    events: &mut Vec<BattleEvent>,
    rng: &mut TurnRng,
) {
    if !battle_state.is_alive(actor) {
        return;
    }
    events.push(BattleEvent::BallThrown { ball });
    let target = match capture_target(battle_state, actor) {
        Ok(target) => target,
        Err(err) => {
            warn!(?actor, %err, "ball had nothing to catch");
            events.push(BattleEvent::ActionFailed {
                pokemon: battle_state.name_of(actor),
                reason: ActionFailureReason::NoTarget,
            });
            return;
        }
    };
    if conditions.turn_count == 0 {
        conditions.turn_count = battle_state.turn_number;
    }
    let Some(wild) = battle_state.pokemon(target) else {
        return;
    };

    let modifier = ball_modifier(ball, &conditions, wild);
    let bonus = status_bonus(wild.status);
    let (caught, shakes) = attempt_capture(wild, modifier, bonus, rng);
    let name = wild.name.clone();
    debug!(?ball, modifier, bonus, shakes, caught, "capture attempt");

    if shakes > 0 {
        events.push(BattleEvent::BallShook { shakes });
    }
    if caught {
        events.push(BattleEvent::PokemonCaptured { pokemon: name });
        end_battle(battle_state, GameState::Captured, events);
    } else {
        events.push(BattleEvent::CaptureFailed { pokemon: name });
    }
}

/// Execute switch action - change the Pokemon in the actor's position
fn execute_switch(actor: CombatantRef, team_index: usize, battle_state: &mut BattleState, events: &mut Vec<BattleEvent>) {
    if !battle_state.is_alive(actor) {
        return;
    }
    let side = &battle_state.sides[actor.side];
    let available = side.team.get(team_index).is_some_and(|p| !p.is_fainted()) && !side.is_active_index(team_index);
    if !available {
        debug!(?actor, team_index, "switch target no longer available");
        return;
    }
    battle_state.switch_in(actor, team_index, false, events);
}

/// Send a replacement into a position whose occupant fainted.
fn resolve_replacement_phase(
    battle_state: &mut BattleState,
    slot: CombatantRef,
    team_index: usize,
    events: &mut Vec<BattleEvent>,
) {
    debug!(battle = %battle_state.battle_id, ?slot, team_index, "replacement sent out");
    battle_state.switch_in(slot, team_index, false, events);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveOrigin {
    /// Picked by the participant (or forced by a lock).
    Chosen,
    /// Invoked by another move.
    Called,
    /// Stolen by Snatch.
    Snatched,
}

/// One use of a move, as popped off the action stack.
#[derive(Debug, Clone)]
struct MoveUse {
    actor: CombatantRef,
    move_id: MoveId,
    /// PP slot to charge, if any.
    move_index: Option<usize>,
    target: Option<CombatantRef>,
    origin: MoveOrigin,
}

enum HitResult {
    Immune,
    Dealt(u16),
}

fn execute_move(
    battle_state: &mut BattleState,
    catalog: &MoveCatalog,
    usage: MoveUse,
    events: &mut Vec<BattleEvent>,
    rng: &mut TurnRng,
) {
    let MoveUse {
        actor,
        move_id,
        move_index,
        target: selected,
        origin,
    } = usage;
    if !battle_state.is_alive(actor) {
        return;
    }
    let data = catalog.get(&move_id);
    let continuing = battle_state
        .pokemon(actor)
        .is_some_and(|p| p.volatile.charging.is_some());

    if origin == MoveOrigin::Chosen {
        if check_action_preventing_conditions(battle_state, actor, events, rng) {
            return;
        }
        if release_bide(battle_state, actor, &data, events) {
            return;
        }
        if !continuing && !move_id.is_struggle() {
            if let Some(restriction) = check_move_restrictions(battle_state, actor, &move_id, &data) {
                mark_acted(battle_state, actor);
                events.push(BattleEvent::MoveRestricted {
                    pokemon: battle_state.name_of(actor),
                    move_name: data.metadata.name.clone(),
                    restriction,
                });
                return;
            }
        }
        if let Some(index) = move_index {
            let paid = battle_state.pokemon_mut(actor).is_some_and(|p| p.use_pp(index));
            if !paid {
                mark_acted(battle_state, actor);
                events.push(BattleEvent::ActionFailed {
                    pokemon: battle_state.name_of(actor),
                    reason: ActionFailureReason::Failed,
                });
                return;
            }
        }
        if data.metadata.has_flag(MoveFlag::Snatchable) {
            if let Some(snatcher) = find_snatcher(battle_state, actor) {
                mark_acted(battle_state, actor);
                if let Some(pokemon) = battle_state.pokemon_mut(snatcher) {
                    pokemon.volatile.snatching = false;
                }
                events.push(BattleEvent::MoveSnatched {
                    snatcher: battle_state.name_of(snatcher),
                    move_name: data.metadata.name.clone(),
                });
                let stolen = MoveUse {
                    actor: snatcher,
                    move_id,
                    move_index: None,
                    target: None,
                    origin: MoveOrigin::Snatched,
                };
                execute_move(battle_state, catalog, stolen, events, rng);
                return;
            }
        }
    }

    let user_name = battle_state.name_of(actor);
    let move_name = data.metadata.name.clone();
    events.push(match origin {
        MoveOrigin::Called => BattleEvent::MoveCalled {
            pokemon: user_name.clone(),
            move_name: move_name.clone(),
        },
        MoveOrigin::Chosen | MoveOrigin::Snatched => BattleEvent::MoveUsed {
            pokemon: user_name.clone(),
            move_name: move_name.clone(),
        },
    });
    debug!(?actor, move_id = %move_id, ?origin, "move used");

    if let Some(pokemon) = battle_state.pokemon_mut(actor) {
        let volatile = &mut pokemon.volatile;
        volatile.acted_this_turn = true;
        volatile.destiny_bond = false;
        volatile.grudge = false;
        if volatile.last_move.as_ref() != Some(&move_id) {
            volatile.rollout_count = 0;
            volatile.fury_cutter_count = 0;
        }
        if !is_protection_move(&data) {
            volatile.protect_streak = 0;
        }
        if origin != MoveOrigin::Called && !move_id.is_struggle() {
            volatile.last_move = Some(move_id.clone());
        }
    }

    // Two-turn moves spend the first turn charging
    if data.effect.charge_turn {
        if continuing {
            if let Some(pokemon) = battle_state.pokemon_mut(actor) {
                pokemon.volatile.charging = None;
                pokemon.volatile.vanished = None;
            }
        } else if !skips_charge_turn(battle_state, &move_id) {
            if let Some(pokemon) = battle_state.pokemon_mut(actor) {
                pokemon.volatile.charging = Some(ChargingMove {
                    move_id: move_id.clone(),
                    target: selected,
                });
                pokemon.volatile.vanished = data.effect.semi_invulnerable;
            }
            events.push(BattleEvent::ChargingTurn {
                pokemon: user_name,
                move_name,
            });
            return;
        }
    }

    // Spit Up with nothing stockpiled fails outright
    if data.effect.damage_kind == DamageKind::SpitUp
        && battle_state.pokemon(actor).is_some_and(|p| p.volatile.stockpile == 0)
    {
        events.push(BattleEvent::ActionFailed {
            pokemon: user_name,
            reason: ActionFailureReason::Failed,
        });
        return;
    }

    let locked_on = battle_state
        .pokemon_mut(actor)
        .and_then(|p| p.volatile.lock_on.take());

    let target_class = effective_target(data.metadata.target, &move_id);
    let targets = resolve_targets(battle_state, actor, target_class, selected, rng);
    if targets.is_empty() {
        events.push(BattleEvent::ActionFailed {
            pokemon: user_name,
            reason: ActionFailureReason::NoTarget,
        });
        return;
    }

    let mut landed = false;
    let mut total_damage: u16 = 0;
    let mut user_effects_applied = false;
    for target in targets {
        if target != actor {
            if !battle_state.is_alive(target) {
                continue;
            }
            if blocked_by_protect(battle_state, actor, target, &data) {
                events.push(BattleEvent::ActionFailed {
                    pokemon: battle_state.name_of(target),
                    reason: ActionFailureReason::Protected,
                });
                continue;
            }
            if !check_accuracy(battle_state, actor, target, &data, locked_on, rng) {
                events.push(BattleEvent::MoveMissed {
                    attacker: user_name.clone(),
                    defender: battle_state.name_of(target),
                });
                continue;
            }
        }

        let dealt = if data.effect.damage {
            match execute_attack_hit(battle_state, actor, target, &data, move_index, events, rng) {
                HitResult::Immune => continue,
                HitResult::Dealt(damage) => damage,
            }
        } else {
            0
        };
        landed = true;
        total_damage = total_damage.saturating_add(dealt);

        apply_move_effects(
            battle_state,
            actor,
            target,
            &move_id,
            &data,
            dealt,
            !user_effects_applied,
            events,
            rng,
        );
        user_effects_applied = true;
    }

    finish_move(battle_state, actor, &move_id, &data, landed, total_damage, events);
}

/// Check all conditions that can prevent a Pokemon from taking action.
/// Returns true when the turn is lost.
fn check_action_preventing_conditions(
    battle_state: &mut BattleState,
    actor: CombatantRef,
    events: &mut Vec<BattleEvent>,
    rng: &mut TurnRng,
) -> bool {
    let (mut prevented, pre_action_events) = check_pre_action(battle_state, actor, rng);
    events.extend(pre_action_events);
    if !prevented {
        let (hurt_itself, confusion_events) = check_confusion(battle_state, actor, rng);
        events.extend(confusion_events);
        prevented = hurt_itself;
    }

    if prevented {
        if let Some(pokemon) = battle_state.pokemon_mut(actor) {
            let volatile = &mut pokemon.volatile;
            volatile.acted_this_turn = true;
            volatile.charging = None;
            volatile.vanished = None;
            volatile.rollout_count = 0;
            volatile.fury_cutter_count = 0;
        }
    }
    prevented
}

/// Bide's final turn: hit the last attacker for twice the stored damage.
fn release_bide(battle_state: &mut BattleState, actor: CombatantRef, data: &MoveData, events: &mut Vec<BattleEvent>) -> bool {
    if data.metadata.id.as_str() != "bide" {
        return false;
    }
    let Some(pokemon) = battle_state.pokemon_mut(actor) else {
        return false;
    };
    let Some(bide) = pokemon.volatile.bide.filter(|bide| bide.turns_remaining == 0) else {
        return false;
    };
    pokemon.volatile.bide = None;
    pokemon.volatile.acted_this_turn = true;
    events.push(BattleEvent::MoveUsed {
        pokemon: pokemon.name.clone(),
        move_name: data.metadata.name.clone(),
    });

    match bide.last_attacker.filter(|who| battle_state.is_alive(*who)) {
        Some(target) if bide.damage > 0 => {
            battle_state.damage(target, bide.damage.saturating_mul(2), DamageCause::Attack, events);
            items::after_damage(battle_state, target, events);
        }
        _ => events.push(BattleEvent::ActionFailed {
            pokemon: battle_state.name_of(actor),
            reason: ActionFailureReason::Failed,
        }),
    }
    true
}

/// Disable, Encore, Taunt, Torment, Heal Block and Imprison, in that order.
fn check_move_restrictions(
    battle_state: &BattleState,
    actor: CombatantRef,
    move_id: &MoveId,
    data: &MoveData,
) -> Option<Restriction> {
    let pokemon = battle_state.pokemon(actor)?;
    let volatile = &pokemon.volatile;

    if volatile.disable.as_ref().is_some_and(|disable| &disable.move_id == move_id) {
        return Some(Restriction::Disabled);
    }
    if volatile.encore.as_ref().is_some_and(|encore| &encore.move_id != move_id) {
        return Some(Restriction::Encored);
    }
    if volatile.taunt_turns > 0 && data.metadata.category == MoveCategory::Status {
        return Some(Restriction::Taunted);
    }
    if volatile.tormented && volatile.last_move.as_ref() == Some(move_id) {
        return Some(Restriction::Tormented);
    }
    if volatile.heal_block_turns > 0 && data.effect.heals() {
        return Some(Restriction::HealBlocked);
    }
    let imprisoned = battle_state
        .opponents_of(actor)
        .into_iter()
        .filter_map(|who| battle_state.pokemon(who))
        .any(|foe| foe.volatile.imprisoning && foe.knows_move(move_id));
    if imprisoned {
        return Some(Restriction::Imprisoned);
    }
    None
}

fn find_snatcher(battle_state: &BattleState, actor: CombatantRef) -> Option<CombatantRef> {
    battle_state
        .all_active_refs()
        .into_iter()
        .filter(|who| *who != actor)
        .find(|who| battle_state.pokemon(*who).is_some_and(|p| p.volatile.snatching))
}

fn is_protection_move(data: &MoveData) -> bool {
    data.effect
        .effects
        .iter()
        .any(|effect| matches!(effect.kind, EffectKind::Protect | EffectKind::Endure))
}

/// Solar Beam fires at once in harsh sunlight.
fn skips_charge_turn(battle_state: &BattleState, move_id: &MoveId) -> bool {
    move_id.as_str() == "solar-beam" && battle_state.field.weather_kind() == WeatherKind::Sun
}

fn blocked_by_protect(battle_state: &BattleState, actor: CombatantRef, target: CombatantRef, data: &MoveData) -> bool {
    if target.side == actor.side || matches!(data.metadata.target, MoveTarget::User | MoveTarget::Field | MoveTarget::All) {
        return false;
    }
    battle_state.pokemon(target).is_some_and(|p| p.volatile.protected)
}

/// Semi-invulnerable targets dodge everything but their counters, then the
/// normal accuracy roll applies.
fn check_accuracy(
    battle_state: &BattleState,
    actor: CombatantRef,
    target: CombatantRef,
    data: &MoveData,
    locked_on: Option<CombatantRef>,
    rng: &mut TurnRng,
) -> bool {
    let (Some(attacker), Some(defender)) = (battle_state.pokemon(actor), battle_state.pokemon(target)) else {
        return false;
    };
    let locked = locked_on == Some(target);
    if let Some(vanish) = defender.volatile.vanished {
        if !locked && !hits_vanished(data.metadata.id.as_str(), vanish) {
            return false;
        }
    }
    move_hits(attacker, defender, data, locked, &battle_state.field, rng)
}

/// 2-5 hit moves use the 3:3:1:1 split; other ranges are uniform.
fn roll_hit_count(data: &MoveData, rng: &mut TurnRng) -> u8 {
    let Some(range) = data.effect.multi_hit else {
        return 1;
    };
    if range.min >= range.max {
        return range.min.max(1);
    }
    if range.min == 2 && range.max == 5 {
        return match rng.next_in_range(RollKind::MultiHitCount, 1, 8) {
            1..=3 => 2,
            4..=6 => 3,
            7 => 4,
            _ => 5,
        };
    }
    rng.next_in_range(RollKind::MultiHitCount, range.min as u32, range.max as u32) as u8
}

/// Execute every hit of an attack against one target. Stops as soon as
/// either side of the exchange faints.
fn execute_attack_hit(
    battle_state: &mut BattleState,
    actor: CombatantRef,
    target: CombatantRef,
    data: &MoveData,
    pp_slot: Option<usize>,
    events: &mut Vec<BattleEvent>,
    rng: &mut TurnRng,
) -> HitResult {
    let hits = roll_hit_count(data, rng);
    let (destiny_bond, grudge) = battle_state
        .pokemon(target)
        .map(|p| (p.volatile.destiny_bond, p.volatile.grudge))
        .unwrap_or_default();

    let mut total: u16 = 0;
    let mut hits_landed: u8 = 0;
    for _ in 0..hits {
        if !battle_state.is_alive(target) || !battle_state.is_alive(actor) {
            break;
        }
        let result = {
            let (Some(attacker), Some(defender)) = (battle_state.pokemon(actor), battle_state.pokemon(target)) else {
                break;
            };
            let ctx = DamageContext {
                attacker,
                defender,
                move_data: data,
                field: &battle_state.field,
                defender_side: &battle_state.sides[target.side].conditions,
                config: battle_state.config.as_ref(),
            };
            calculate_damage(&ctx, rng)
        };
        if result.is_immune() {
            events.push(BattleEvent::AttackTypeEffectiveness { multiplier: 0.0 });
            return HitResult::Immune;
        }
        if result.critical {
            events.push(BattleEvent::CriticalHit);
        }
        let dealt = deliver_damage(battle_state, actor, target, result.damage, data.metadata.move_type, events);
        events.push(BattleEvent::MoveHit {
            attacker: battle_state.name_of(actor),
            defender: battle_state.name_of(target),
        });
        if hits_landed == 0 {
            events.push(BattleEvent::AttackTypeEffectiveness {
                multiplier: result.type_multiplier,
            });
        }
        hits_landed += 1;
        total = total.saturating_add(dealt);
    }

    if data.effect.multi_hit.is_some() {
        events.push(BattleEvent::HitCount { hits: hits_landed });
    }

    if target != actor && !battle_state.is_alive(target) {
        if destiny_bond {
            debug!(?target, ?actor, "destiny bond triggered");
            battle_state.faint(actor, events);
        }
        if grudge {
            if let Some(slot) = pp_slot.and_then(|index| battle_state.pokemon_mut(actor)?.moves.get_mut(index)) {
                slot.pp = 0;
            }
        }
    }
    HitResult::Dealt(total)
}

/// Route one hit's damage through a substitute or Endure, then onto HP.
fn deliver_damage(
    battle_state: &mut BattleState,
    actor: CombatantRef,
    target: CombatantRef,
    amount: u16,
    move_type: PokemonType,
    events: &mut Vec<BattleEvent>,
) -> u16 {
    let Some(defender) = battle_state.pokemon_mut(target) else {
        return 0;
    };
    if target != actor && defender.volatile.substitute_hp > 0 {
        let absorbed = amount.min(defender.volatile.substitute_hp);
        defender.volatile.substitute_hp -= absorbed;
        events.push(BattleEvent::SubstituteDamaged {
            target: defender.name.clone(),
            damage: absorbed,
        });
        if defender.volatile.substitute_hp == 0 {
            events.push(BattleEvent::SubstituteBroke {
                target: defender.name.clone(),
            });
        }
        return absorbed;
    }

    let mut amount = amount;
    if defender.volatile.enduring && amount >= defender.current_hp() {
        amount = defender.current_hp().saturating_sub(1);
        events.push(BattleEvent::Endured {
            pokemon: defender.name.clone(),
        });
    }
    defender.volatile.last_hit_by_type = Some(move_type);

    let dealt = battle_state.damage(target, amount, DamageCause::Attack, events);
    if dealt > 0 {
        if let Some(bide) = battle_state
            .pokemon_mut(target)
            .and_then(|p| p.volatile.bide.as_mut())
        {
            bide.damage = bide.damage.saturating_add(dealt);
            bide.last_attacker = Some(actor);
        }
        items::after_damage(battle_state, target, events);
    }
    dealt
}

/// Run the move's effect list against one target. Entries aimed at the user
/// or the field only run for the first target.
#[allow(clippy::too_many_arguments)]
fn apply_move_effects(
    battle_state: &mut BattleState,
    actor: CombatantRef,
    target: CombatantRef,
    move_id: &MoveId,
    data: &MoveData,
    damage_dealt: u16,
    include_user_effects: bool,
    events: &mut Vec<BattleEvent>,
    rng: &mut TurnRng,
) {
    for effect in &data.effect.effects {
        if matches!(effect.target, EffectTarget::User | EffectTarget::Field) && !include_user_effects {
            continue;
        }
        let mut ctx = EffectContext::new(actor, target, move_id.clone());
        if data.effect.damage {
            ctx = ctx.with_damage(damage_dealt);
        }
        events.extend(apply_effect(battle_state, &ctx, effect, rng));
    }
}

/// Recoil, drain, recharge and the momentum counters.
fn finish_move(
    battle_state: &mut BattleState,
    actor: CombatantRef,
    move_id: &MoveId,
    data: &MoveData,
    landed: bool,
    total_damage: u16,
    events: &mut Vec<BattleEvent>,
) {
    if !landed {
        if let Some(pokemon) = battle_state.pokemon_mut(actor) {
            pokemon.volatile.rollout_count = 0;
            pokemon.volatile.fury_cutter_count = 0;
        }
        return;
    }

    if let Some(percent) = data.effect.recoil {
        events.extend(apply_recoil(battle_state, actor, total_damage, percent));
    }
    if let Some(percent) = data.effect.drain {
        events.extend(apply_drain(battle_state, actor, total_damage, percent));
    }
    if let Some(percent) = data.effect.heal_percent {
        if let Some(pokemon) = battle_state.pokemon(actor) {
            let amount = (pokemon.max_hp() as u32 * percent as u32 / 100).max(1) as u16;
            battle_state.heal(actor, amount, events);
        }
    }
    if move_id.is_struggle() {
        let divisor = battle_state.config.struggle_recoil_divisor;
        if let Some(amount) = battle_state.pokemon(actor).map(|p| p.fraction_of_max(divisor)) {
            battle_state.damage(actor, amount, DamageCause::Struggle, events);
        }
    }

    let Some(pokemon) = battle_state.pokemon_mut(actor) else {
        return;
    };
    let volatile = &mut pokemon.volatile;
    if data.effect.recharge_turn {
        volatile.must_recharge = true;
    }
    if data.effect.damage && data.metadata.move_type == PokemonType::Electric {
        volatile.charged = false;
    }
    match move_id.as_str() {
        "rollout" | "ice-ball" => volatile.rollout_count = (volatile.rollout_count + 1) % 5,
        "fury-cutter" => volatile.fury_cutter_count = (volatile.fury_cutter_count + 1).min(4),
        _ => {}
    }
}

fn mark_acted(battle_state: &mut BattleState, actor: CombatantRef) {
    if let Some(pokemon) = battle_state.pokemon_mut(actor) {
        pokemon.volatile.acted_this_turn = true;
    }
}

pub fn execute_end_turn_phase(battle_state: &mut BattleState, events: &mut Vec<BattleEvent>, rng: &mut TurnRng) {
    events.extend(end_of_turn_effects(battle_state, rng));
}

fn finalize_turn(battle_state: &mut BattleState, events: &mut Vec<BattleEvent>) {
    // 1. Clear the choices of the turn that just ended
    for side in battle_state.sides.iter_mut() {
        side.pending_actions.iter_mut().for_each(|action| *action = None);
    }

    // 2. Check for win conditions, which override everything else
    check_win_conditions(battle_state, events);

    // 3. Check if the next turn has to wait for replacements
    if !battle_state.game_state.is_terminal() {
        check_for_pending_replacements(battle_state, events);
    }

    // 4. Announce the end of the turn
    events.push(BattleEvent::TurnEnded);
}

/// Request a replacement for every emptied position that a healthy bench
/// member can fill, and suspend the battle until they arrive.
fn check_for_pending_replacements(battle_state: &mut BattleState, events: &mut Vec<BattleEvent>) {
    let mut sides_waiting = 0;
    for side in 0..2 {
        let mut spare = battle_state.sides[side]
            .available_backups()
            .len()
            .saturating_sub(battle_state.sides[side].replacements_needed.len());
        for slot in 0..battle_state.sides[side].active.len() {
            let who = CombatantRef::new(side, slot);
            if battle_state.is_alive(who) || battle_state.sides[side].replacements_needed.contains(&slot) {
                continue;
            }
            if spare == 0 {
                break;
            }
            spare -= 1;
            battle_state.sides[side].replacements_needed.push(slot);
            events.push(BattleEvent::ReplacementRequired { side, slot });
        }
        if !battle_state.sides[side].replacements_needed.is_empty() {
            sides_waiting += 1;
        }
    }

    battle_state.game_state = match sides_waiting {
        0 => GameState::Ongoing,
        1 => GameState::AwaitingForcedSwitch,
        _ => GameState::BothFaintedWithBackup,
    };
}

/// Check win conditions and update battle state accordingly
fn check_win_conditions(battle_state: &mut BattleState, events: &mut Vec<BattleEvent>) {
    if battle_state.game_state.is_terminal() {
        return;
    }
    let outcome = match (battle_state.sides[0].all_fainted(), battle_state.sides[1].all_fainted()) {
        (true, true) => GameState::BothFaintedNoBackup,
        (true, false) => GameState::Side2Win,
        (false, true) => GameState::Side1Win,
        (false, false) => return,
    };
    end_battle(battle_state, outcome, events);
}

fn end_battle(battle_state: &mut BattleState, outcome: GameState, events: &mut Vec<BattleEvent>) {
    battle_state.game_state = outcome;
    info!(
        battle = %battle_state.battle_id,
        ?outcome,
        turn = battle_state.turn_number,
        "battle ended"
    );
    events.push(BattleEvent::BattleEnded { outcome });
}

fn record_participation(tracker: &mut BattleParticipationTracker, battle_state: &BattleState) {
    let active = |side: usize| -> Vec<usize> {
        battle_state
            .active_refs(side)
            .into_iter()
            .filter_map(|who| battle_state.team_index(who))
            .collect()
    };
    tracker.record_participation(&active(0), &active(1));
}

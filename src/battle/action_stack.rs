use std::collections::VecDeque;

use crate::battle::catch::CaptureConditions;
use crate::battle::field::FieldEffect;
use crate::battle::items::quick_claw_activates;
use crate::battle::state::{BattleState, CombatantRef, RollKind, TurnRng};
use crate::battle::stats::effective_speed;
use crate::moves::MoveCatalog;
use schema::{Ability, BallType, MoveCategory, MoveId, PokemonType};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What a participant chose for one active combatant this turn.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum PlayerAction {
    UseMove {
        move_index: usize,
        target: Option<CombatantRef>,
    },
    /// The typeless fallback attack. Costs no PP.
    Struggle,
    SwitchPokemon {
        team_index: usize,
    },
    UseBall {
        ball: BallType,
        conditions: CaptureConditions,
    },
    Flee,
    Forfeit,
}

/// Internal action types for the action stack
/// These represent atomic actions that can be executed during battle resolution
#[derive(Debug, Clone, PartialEq)]
pub enum BattleAction {
    /// Side gives up the battle
    Forfeit { side: usize },

    Flee { actor: CombatantRef },

    ThrowBall {
        actor: CombatantRef,
        ball: BallType,
        conditions: CaptureConditions,
    },

    /// Swap the combatant in `actor`'s slot for a benched team member
    Switch { actor: CombatantRef, team_index: usize },

    /// Use a move. `move_index` is the PP slot to charge; `None` for Struggle
    /// and for the second turn of a charging move.
    UseMove {
        actor: CombatantRef,
        move_id: MoveId,
        move_index: Option<usize>,
        target: Option<CombatantRef>,
    },

    /// A move invoked by another move (Assist). Skips PP and restrictions.
    CalledMove {
        actor: CombatantRef,
        move_id: MoveId,
        target: Option<CombatantRef>,
    },
}

impl BattleAction {
    /// The combatant performing the action, if it is tied to one.
    pub fn actor(&self) -> Option<CombatantRef> {
        match self {
            BattleAction::Forfeit { .. } => None,
            BattleAction::Flee { actor }
            | BattleAction::ThrowBall { actor, .. }
            | BattleAction::Switch { actor, .. }
            | BattleAction::UseMove { actor, .. }
            | BattleAction::CalledMove { actor, .. } => Some(*actor),
        }
    }
}

pub struct ActionStack {
    actions: VecDeque<BattleAction>,
}

// A helper struct local to this implementation detail.
#[derive(Debug, Clone)]
struct ActionPriority {
    action_priority: i8, // Forfeit: 10, Flee: 8, Ball: 7, Switch: 6, Move: 0
    quick_claw: bool,
    move_priority: i8,
    speed: u16,
    tiebreak: u32,
}

impl ActionStack {
    /// Creates a new, empty ActionStack.
    pub fn new() -> Self {
        Self {
            actions: VecDeque::new(),
        }
    }

    /// Builds the ordered action list for a turn from the submitted actions.
    ///
    /// Forced continuations (a charged move, Bide's release, a recharge turn)
    /// replace whatever was submitted for that combatant, and run even when
    /// nothing was submitted. Encore replaces a submitted move.
    pub fn build_initial(battle_state: &BattleState, catalog: &MoveCatalog, rng: &mut TurnRng) -> Self {
        let mut submitted = Vec::new();
        for side in 0..2 {
            for (slot, action) in battle_state.sides[side].pending_actions.iter().enumerate() {
                let actor = CombatantRef::new(side, slot);
                if !battle_state.is_alive(actor) {
                    continue;
                }
                let battle_action = match action {
                    Some(action) => Some(Self::convert_player_action_to_battle_action(actor, action, battle_state)),
                    None => Self::forced_continuation(actor, battle_state),
                };
                submitted.extend(battle_action);
            }
        }

        let action_order = Self::determine_action_order(battle_state, catalog, submitted, rng);

        let mut new_stack = Self::new();
        for battle_action in action_order {
            new_stack.push_back(battle_action);
        }
        new_stack
    }

    /// Adds an action to the end of the execution queue.
    pub fn push_back(&mut self, action: BattleAction) {
        self.actions.push_back(action);
    }

    /// Adds an action to the front of the execution queue, to be executed next.
    pub fn push_front(&mut self, action: BattleAction) {
        self.actions.push_front(action);
    }

    /// Removes and returns the next action to be executed from the front of the queue.
    pub fn pop_front(&mut self) -> Option<BattleAction> {
        self.actions.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    // --- Private Helper Functions ---

    fn determine_action_order(
        battle_state: &BattleState,
        catalog: &MoveCatalog,
        actions: Vec<BattleAction>,
        rng: &mut TurnRng,
    ) -> Vec<BattleAction> {
        let trick_room = battle_state.field.is_active(FieldEffect::TrickRoom);

        let mut prioritized: Vec<(BattleAction, ActionPriority)> = actions
            .into_iter()
            .map(|action| {
                let priority = Self::calculate_action_priority(&action, battle_state, catalog, rng);
                (action, priority)
            })
            .collect();

        prioritized.sort_by(|(_, a), (_, b)| {
            b.action_priority
                .cmp(&a.action_priority)
                .then_with(|| b.quick_claw.cmp(&a.quick_claw))
                .then_with(|| b.move_priority.cmp(&a.move_priority))
                .then_with(|| {
                    if trick_room {
                        a.speed.cmp(&b.speed)
                    } else {
                        b.speed.cmp(&a.speed)
                    }
                })
                .then_with(|| b.tiebreak.cmp(&a.tiebreak))
        });

        debug!(
            order = ?prioritized.iter().map(|(action, _)| action.actor()).collect::<Vec<_>>(),
            trick_room,
            "turn order"
        );
        prioritized.into_iter().map(|(action, _)| action).collect()
    }

    fn calculate_action_priority(
        action: &BattleAction,
        battle_state: &BattleState,
        catalog: &MoveCatalog,
        rng: &mut TurnRng,
    ) -> ActionPriority {
        let fixed = |action_priority| ActionPriority {
            action_priority,
            quick_claw: false,
            move_priority: 0,
            speed: 0,
            tiebreak: 0,
        };

        match action {
            BattleAction::Forfeit { .. } => fixed(10),
            BattleAction::Flee { .. } => fixed(8),
            BattleAction::ThrowBall { .. } => fixed(7),
            BattleAction::Switch { .. } => fixed(6),
            BattleAction::UseMove { actor, move_id, .. } | BattleAction::CalledMove { actor, move_id, .. } => {
                let Some(pokemon) = battle_state.pokemon(*actor) else {
                    return fixed(0);
                };
                let data = catalog.get(move_id);
                let metadata = &data.metadata;

                let mut move_priority = metadata.priority;
                if pokemon.ability == Ability::Prankster && metadata.category == MoveCategory::Status {
                    move_priority += 1;
                }
                if pokemon.ability == Ability::GaleWings
                    && metadata.move_type == PokemonType::Flying
                    && pokemon.is_full_hp()
                {
                    move_priority += 1;
                }

                ActionPriority {
                    action_priority: 0,
                    quick_claw: quick_claw_activates(pokemon, battle_state.config.quick_claw_chance, rng),
                    move_priority,
                    speed: effective_speed(pokemon, &battle_state.field, &battle_state.config),
                    tiebreak: rng.next_in_range(RollKind::SpeedTie, 0, u16::MAX as u32),
                }
            }
        }
    }

    fn convert_player_action_to_battle_action(
        actor: CombatantRef,
        action: &PlayerAction,
        battle_state: &BattleState,
    ) -> BattleAction {
        if let Some(forced) = Self::forced_continuation(actor, battle_state) {
            return forced;
        }

        match action {
            PlayerAction::Forfeit => BattleAction::Forfeit { side: actor.side },
            PlayerAction::Flee => BattleAction::Flee { actor },
            PlayerAction::UseBall { ball, conditions } => BattleAction::ThrowBall {
                actor,
                ball: *ball,
                conditions: conditions.clone(),
            },
            PlayerAction::SwitchPokemon { team_index } => BattleAction::Switch {
                actor,
                team_index: *team_index,
            },
            PlayerAction::Struggle => BattleAction::UseMove {
                actor,
                move_id: MoveId::struggle(),
                move_index: None,
                target: None,
            },
            PlayerAction::UseMove { move_index, target } => {
                if let Some(encored) = Self::encored_move(actor, battle_state) {
                    return encored;
                }
                let move_id = battle_state
                    .pokemon(actor)
                    .and_then(|p| p.moves.get(*move_index))
                    .map(|slot| slot.id.clone())
                    .unwrap_or_else(MoveId::struggle);
                let move_index = (!move_id.is_struggle()).then_some(*move_index);
                BattleAction::UseMove {
                    actor,
                    move_id,
                    move_index,
                    target: *target,
                }
            }
        }
    }

    /// Moves the combatant is locked into regardless of the submitted choice.
    pub fn forced_continuation(actor: CombatantRef, battle_state: &BattleState) -> Option<BattleAction> {
        let pokemon = battle_state.pokemon(actor)?;
        let volatile = &pokemon.volatile;

        if volatile.must_recharge {
            // The pre-action check spends the turn; the move itself never runs.
            return Some(BattleAction::UseMove {
                actor,
                move_id: volatile.last_move.clone().unwrap_or_else(MoveId::struggle),
                move_index: None,
                target: None,
            });
        }

        if let Some(charging) = &volatile.charging {
            return Some(BattleAction::UseMove {
                actor,
                move_id: charging.move_id.clone(),
                move_index: None,
                target: charging.target,
            });
        }
        if volatile.bide.is_some() {
            return Some(BattleAction::UseMove {
                actor,
                move_id: MoveId::new("bide"),
                move_index: None,
                target: None,
            });
        }
        None
    }

    /// The move an Encore repeats, while it still has PP.
    fn encored_move(actor: CombatantRef, battle_state: &BattleState) -> Option<BattleAction> {
        let pokemon = battle_state.pokemon(actor)?;
        let encore = pokemon.volatile.encore.as_ref()?;
        let index = pokemon.move_index(&encore.move_id)?;
        if pokemon.moves[index].pp == 0 {
            return None;
        }
        Some(BattleAction::UseMove {
            actor,
            move_id: encore.move_id.clone(),
            move_index: Some(index),
            target: None,
        })
    }
}

impl Default for ActionStack {
    fn default() -> Self {
        Self::new()
    }
}

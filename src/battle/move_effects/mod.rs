// --- 1. DECLARE HELPER MODULES ---
mod damage_effects;
mod field_effects;
mod special_effects;
mod stat_effects;
mod status_effects;

// --- 2. IMPORTS ---
use crate::battle::conditions::SideCondition;
use crate::battle::field::FieldEffect;
use crate::battle::state::{ActionFailureReason, BattleEvent, BattleState, CombatantRef, RollKind, TurnRng};
use schema::{Effect, EffectKind, EffectTarget, MoveId, StatusType};
use tracing::trace;
// Bring the standalone helper functions from our private modules into scope.
use self::{damage_effects::*, field_effects::*, special_effects::*, stat_effects::*, status_effects::*};

pub use self::damage_effects::{apply_drain, apply_recoil};
pub use self::stat_effects::change_stat_stage;

// --- 3. BATTLE-SPECIFIC DATA STRUCTURES ---

/// Who used the move, who it landed on and how hard it hit.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectContext {
    pub attacker: CombatantRef,
    pub target: CombatantRef,
    pub move_id: MoveId,
    /// Damage the move dealt to `target` this use, 0 for status moves.
    pub damage_dealt: u16,
    /// True for secondary effects riding on a damaging move. Those fail silently.
    pub secondary: bool,
}

impl EffectContext {
    pub fn new(attacker: CombatantRef, target: CombatantRef, move_id: MoveId) -> Self {
        Self {
            attacker,
            target,
            move_id,
            damage_dealt: 0,
            secondary: false,
        }
    }

    pub fn with_damage(mut self, damage_dealt: u16) -> Self {
        self.damage_dealt = damage_dealt;
        self.secondary = true;
        self
    }

    pub fn target_ref(&self, target: EffectTarget) -> CombatantRef {
        match target {
            EffectTarget::User | EffectTarget::Field => self.attacker,
            EffectTarget::Target | EffectTarget::Ally => self.target,
        }
    }

    /// The attacker is acting on a combatant of the other side.
    pub fn against_opponent(&self, target: CombatantRef) -> bool {
        target.side != self.attacker.side
    }
}

// --- 4. THE DISPATCHER ---

/// Apply one entry of a move's effect list.
///
/// Rolls the entry's chance first; a failed roll produces nothing. Effects
/// aimed at an opponent behind a substitute are swallowed. Unknown tags are
/// no-ops.
pub fn apply_effect(state: &mut BattleState, ctx: &EffectContext, effect: &Effect, rng: &mut TurnRng) -> Vec<BattleEvent> {
    let target = ctx.target_ref(effect.target);

    if !state.is_alive(target) && !acts_on_field(&effect.kind) {
        return Vec::new();
    }
    if effect.chance < 100 && !rng.chance(RollKind::EffectChance, effect.chance) {
        return Vec::new();
    }
    if ctx.against_opponent(target) && is_blocked_by_substitute(&effect.kind) {
        let behind_substitute = state
            .pokemon(target)
            .is_some_and(|p| p.volatile.substitute_hp > 0);
        if behind_substitute {
            trace!(?target, kind = ?effect.kind, "effect blocked by substitute");
            return Vec::new();
        }
    }

    trace!(move_id = %ctx.move_id, kind = ?effect.kind, ?target, "applying effect");
    match &effect.kind {
        // Major status
        EffectKind::Burn => apply_major_status_effect(state, ctx, target, StatusType::Burn, rng),
        EffectKind::Poison => apply_major_status_effect(state, ctx, target, StatusType::Poison, rng),
        EffectKind::BadlyPoison => apply_major_status_effect(state, ctx, target, StatusType::Toxic, rng),
        EffectKind::Paralyze => apply_major_status_effect(state, ctx, target, StatusType::Paralysis, rng),
        EffectKind::Sleep => apply_major_status_effect(state, ctx, target, StatusType::Sleep, rng),
        EffectKind::Freeze => apply_major_status_effect(state, ctx, target, StatusType::Freeze, rng),

        // Volatile conditions
        EffectKind::Confuse => apply_confuse_effect(state, ctx, target, rng),
        EffectKind::Flinch => apply_flinch_effect(state, target),
        EffectKind::LeechSeed => apply_leech_seed_effect(state, ctx, target),
        EffectKind::Ingrain => apply_ingrain_effect(state, target),
        EffectKind::Substitute => apply_substitute_effect(state, target),
        EffectKind::Protect => apply_protect_effect(state, target, false, rng),
        EffectKind::Endure => apply_protect_effect(state, target, true, rng),
        EffectKind::FocusEnergy => apply_focus_energy_effect(state, target),
        EffectKind::Yawn => apply_yawn_effect(state, target),
        EffectKind::DestinyBond => apply_destiny_bond_effect(state, target),
        EffectKind::PerishSong => apply_perish_song_effect(state),
        EffectKind::Bind => apply_bind_effect(state, ctx, target, rng),
        EffectKind::Disable => apply_disable_effect(state, target),
        EffectKind::Trap => apply_trap_effect(state, ctx, target),
        EffectKind::Encore => apply_encore_effect(state, target),
        EffectKind::Taunt => apply_taunt_effect(state, target),
        EffectKind::Torment => apply_torment_effect(state, target),
        EffectKind::Charge => apply_charge_effect(state, target),
        EffectKind::HelpingHand => apply_helping_hand_effect(state, ctx, target),
        EffectKind::Imprison => apply_imprison_effect(state, target),
        EffectKind::Grudge => apply_grudge_effect(state, target),
        EffectKind::Snatch => apply_snatch_effect(state, target),
        EffectKind::Foresight => apply_foresight_effect(state, target, false),
        EffectKind::MiracleEye => apply_foresight_effect(state, target, true),
        EffectKind::HealBlock => apply_heal_block_effect(state, target),
        EffectKind::FollowMe => apply_redirection_effect(state, target, false),
        EffectKind::RagePowder => apply_redirection_effect(state, target, true),
        EffectKind::Spotlight => apply_spotlight_effect(state, target),
        EffectKind::Attract => apply_attract_effect(state, ctx, target),
        EffectKind::Curse => apply_curse_effect(state, ctx, target),
        EffectKind::Nightmare => apply_nightmare_effect(state, target),
        EffectKind::Minimize => apply_minimize_effect(state, target),
        EffectKind::DefenseCurl => apply_defense_curl_effect(state, target),
        EffectKind::LockOn => apply_lock_on_effect(state, ctx, target),
        EffectKind::Bide => apply_bide_effect(state, target),

        // Stats and HP
        EffectKind::StatChange { stat, stages } => apply_stat_change_effect(state, ctx, target, *stat, *stages),
        EffectKind::Heal { percent } => apply_heal_effect(state, target, *percent),
        EffectKind::Rest => apply_rest_effect(state, target),
        EffectKind::BellyDrum => apply_belly_drum_effect(state, target),
        EffectKind::PainSplit => apply_pain_split_effect(state, ctx, target),
        EffectKind::Endeavor => apply_endeavor_effect(state, ctx, target),
        EffectKind::Wish => apply_wish_effect(state, target),
        EffectKind::Stockpile => apply_stockpile_effect(state, target),
        EffectKind::Swallow => apply_swallow_effect(state, target),
        EffectKind::SpitUp => apply_spit_up_effect(state, target),
        EffectKind::Haze => apply_haze_effect(state),
        EffectKind::PsychUp => apply_psych_up_effect(state, ctx, target),
        EffectKind::Memento => apply_memento_effect(state, ctx, target),
        EffectKind::SelfDestruct => apply_self_destruct_effect(state, ctx),

        // Side and field
        EffectKind::Mist => apply_side_condition_effect(state, ctx, SideCondition::Mist),
        EffectKind::LightScreen => apply_side_condition_effect(state, ctx, SideCondition::LightScreen),
        EffectKind::Reflect => apply_side_condition_effect(state, ctx, SideCondition::Reflect),
        EffectKind::Safeguard => apply_side_condition_effect(state, ctx, SideCondition::Safeguard),
        EffectKind::Spikes => apply_spikes_effect(state, ctx),
        EffectKind::Weather(kind) => apply_weather_effect(state, ctx, *kind),
        EffectKind::TrickRoom => apply_trick_room_effect(state),
        EffectKind::Gravity => apply_field_effect(state, ctx, FieldEffect::Gravity),
        EffectKind::MudSport => apply_field_effect(state, ctx, FieldEffect::MudSport),
        EffectKind::WaterSport => apply_field_effect(state, ctx, FieldEffect::WaterSport),

        // Items, abilities, types, team
        EffectKind::Trick => apply_trick_effect(state, ctx, target),
        EffectKind::KnockOff => apply_knock_off_effect(state, target),
        EffectKind::Recycle => apply_recycle_effect(state, target),
        EffectKind::RolePlay => apply_role_play_effect(state, ctx, target),
        EffectKind::SkillSwap => apply_skill_swap_effect(state, ctx, target),
        EffectKind::Camouflage => apply_camouflage_effect(state, target),
        EffectKind::Conversion => apply_conversion_effect(state, target, rng),
        EffectKind::Conversion2 => apply_conversion2_effect(state, target, rng),
        EffectKind::Refresh => apply_refresh_effect(state, target),
        EffectKind::HealBell => apply_heal_bell_effect(state, ctx),
        EffectKind::PayDay => apply_pay_day_effect(state, ctx),
        EffectKind::ForceSwitch => apply_force_switch_effect(state, ctx, target, rng),
        EffectKind::Assist => apply_assist_effect(state, ctx, rng),

        EffectKind::Nothing | EffectKind::Unknown => Vec::new(),
    }
}

/// Effects that do not need a living target.
fn acts_on_field(kind: &EffectKind) -> bool {
    matches!(
        kind,
        EffectKind::Haze
            | EffectKind::PerishSong
            | EffectKind::Weather(_)
            | EffectKind::TrickRoom
            | EffectKind::Gravity
            | EffectKind::MudSport
            | EffectKind::WaterSport
            | EffectKind::Spikes
            | EffectKind::PayDay
    )
}

/// Effects a substitute keeps off its owner.
fn is_blocked_by_substitute(kind: &EffectKind) -> bool {
    !matches!(
        kind,
        EffectKind::Haze
            | EffectKind::PerishSong
            | EffectKind::Weather(_)
            | EffectKind::TrickRoom
            | EffectKind::Gravity
            | EffectKind::MudSport
            | EffectKind::WaterSport
            | EffectKind::Spikes
            | EffectKind::PayDay
            | EffectKind::Attract
            | EffectKind::Disable
            | EffectKind::Encore
            | EffectKind::Taunt
            | EffectKind::Torment
            | EffectKind::Foresight
            | EffectKind::MiracleEye
            | EffectKind::ForceSwitch
            | EffectKind::RolePlay
            | EffectKind::SkillSwap
            | EffectKind::PsychUp
            | EffectKind::Nothing
            | EffectKind::Unknown
    )
}

/// The "it failed" line shared by many handlers.
pub(crate) fn failed(state: &BattleState, who: CombatantRef) -> Vec<BattleEvent> {
    vec![BattleEvent::ActionFailed {
        pokemon: state.name_of(who),
        reason: ActionFailureReason::Failed,
    }]
}

use crate::battle::state::CombatantRef;
use schema::{MoveId, PokemonType, Vanish};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag for a volatile condition, used by events and "already affected" checks.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolatileKind {
    Confusion,
    Flinch,
    LeechSeed,
    Ingrain,
    Substitute,
    Protect,
    Endure,
    FocusEnergy,
    Yawn,
    PerishSong,
    DestinyBond,
    Bind,
    Disable,
    Trapped,
    Encore,
    Taunt,
    Torment,
    Charge,
    HelpingHand,
    Imprison,
    Grudge,
    Snatch,
    Foresight,
    MiracleEye,
    HealBlock,
    FollowMe,
    RagePowder,
    Spotlight,
    Infatuation,
    Curse,
    Nightmare,
    Minimize,
    DefenseCurl,
    LockOn,
    Stockpile,
    Bide,
    Recharge,
}

impl fmt::Display for VolatileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VolatileKind::Confusion => "confusion",
            VolatileKind::Flinch => "flinch",
            VolatileKind::LeechSeed => "Leech Seed",
            VolatileKind::Ingrain => "Ingrain",
            VolatileKind::Substitute => "substitute",
            VolatileKind::Protect => "Protect",
            VolatileKind::Endure => "Endure",
            VolatileKind::FocusEnergy => "Focus Energy",
            VolatileKind::Yawn => "drowsiness",
            VolatileKind::PerishSong => "Perish Song",
            VolatileKind::DestinyBond => "Destiny Bond",
            VolatileKind::Bind => "bind",
            VolatileKind::Disable => "Disable",
            VolatileKind::Trapped => "trap",
            VolatileKind::Encore => "Encore",
            VolatileKind::Taunt => "Taunt",
            VolatileKind::Torment => "Torment",
            VolatileKind::Charge => "Charge",
            VolatileKind::HelpingHand => "Helping Hand",
            VolatileKind::Imprison => "Imprison",
            VolatileKind::Grudge => "Grudge",
            VolatileKind::Snatch => "Snatch",
            VolatileKind::Foresight => "Foresight",
            VolatileKind::MiracleEye => "Miracle Eye",
            VolatileKind::HealBlock => "Heal Block",
            VolatileKind::FollowMe => "Follow Me",
            VolatileKind::RagePowder => "Rage Powder",
            VolatileKind::Spotlight => "Spotlight",
            VolatileKind::Infatuation => "infatuation",
            VolatileKind::Curse => "curse",
            VolatileKind::Nightmare => "nightmare",
            VolatileKind::Minimize => "Minimize",
            VolatileKind::DefenseCurl => "Defense Curl",
            VolatileKind::LockOn => "Lock-On",
            VolatileKind::Stockpile => "Stockpile",
            VolatileKind::Bide => "Bide",
            VolatileKind::Recharge => "recharge",
        };
        write!(f, "{}", name)
    }
}

/// A move-bound counter such as Disable or Encore.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TimedMove {
    pub move_id: MoveId,
    pub turns_remaining: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BindState {
    pub source: CombatantRef,
    pub turns_remaining: u8,
}

/// Turn one of a two-turn move; the stored move runs next turn.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChargingMove {
    pub move_id: MoveId,
    pub target: Option<CombatantRef>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BideState {
    pub turns_remaining: u8,
    pub damage: u16,
    pub last_attacker: Option<CombatantRef>,
}

/// Volatile conditions of one active combatant.
///
/// Conditions combine freely, so each one is its own field. Everything here
/// is dropped when the combatant switches out or faints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Volatile {
    pub confusion_turns: u8,
    pub flinched: bool,
    pub substitute_hp: u16,
    pub leech_seed_source: Option<CombatantRef>,
    pub ingrained: bool,
    pub bind: Option<BindState>,
    pub trapped_by: Option<CombatantRef>,
    pub disable: Option<TimedMove>,
    pub encore: Option<TimedMove>,
    pub taunt_turns: u8,
    pub tormented: bool,
    pub heal_block_turns: u8,
    pub yawn_turns: u8,
    pub perish_count: Option<u8>,

    pub protected: bool,
    /// Consecutive successful Protect/Endure uses.
    pub protect_streak: u8,
    pub enduring: bool,
    pub focus_energy: bool,
    pub destiny_bond: bool,
    pub grudge: bool,
    pub charged: bool,
    pub helping_hand: bool,
    pub imprisoning: bool,
    pub snatching: bool,
    pub foresight: bool,
    pub miracle_eye: bool,
    pub follow_me: bool,
    pub rage_powder: bool,
    pub spotlight: bool,
    pub infatuated_with: Option<CombatantRef>,
    pub cursed: bool,
    pub nightmare: bool,
    pub minimized: bool,
    pub defense_curl: bool,
    pub lock_on: Option<CombatantRef>,
    pub stockpile: u8,
    /// Def and SpDef stages actually gained from stockpiling.
    pub stockpile_boosts: (u8, u8),

    pub charging: Option<ChargingMove>,
    pub vanished: Option<Vanish>,
    pub must_recharge: bool,
    pub bide: Option<BideState>,
    pub rollout_count: u8,
    pub fury_cutter_count: u8,

    pub last_move: Option<MoveId>,
    pub last_hit_by_type: Option<PokemonType>,
    pub type_override: Option<Vec<PokemonType>>,
    pub acted_this_turn: bool,
}

impl Volatile {
    /// Whether the holder may not switch out or flee.
    pub fn is_trapped(&self) -> bool {
        self.bind.is_some() || self.trapped_by.is_some() || self.ingrained
    }

    /// Flags that only last for the turn they were set in.
    pub fn clear_turn_flags(&mut self) {
        self.flinched = false;
        self.protected = false;
        self.enduring = false;
        self.helping_hand = false;
        self.follow_me = false;
        self.rage_powder = false;
        self.spotlight = false;
        self.snatching = false;
        self.acted_this_turn = false;
    }

    /// True when the tagged condition is currently set.
    pub fn has(&self, kind: VolatileKind) -> bool {
        match kind {
            VolatileKind::Confusion => self.confusion_turns > 0,
            VolatileKind::Flinch => self.flinched,
            VolatileKind::LeechSeed => self.leech_seed_source.is_some(),
            VolatileKind::Ingrain => self.ingrained,
            VolatileKind::Substitute => self.substitute_hp > 0,
            VolatileKind::Protect => self.protected,
            VolatileKind::Endure => self.enduring,
            VolatileKind::FocusEnergy => self.focus_energy,
            VolatileKind::Yawn => self.yawn_turns > 0,
            VolatileKind::PerishSong => self.perish_count.is_some(),
            VolatileKind::DestinyBond => self.destiny_bond,
            VolatileKind::Bind => self.bind.is_some(),
            VolatileKind::Disable => self.disable.is_some(),
            VolatileKind::Trapped => self.trapped_by.is_some(),
            VolatileKind::Encore => self.encore.is_some(),
            VolatileKind::Taunt => self.taunt_turns > 0,
            VolatileKind::Torment => self.tormented,
            VolatileKind::Charge => self.charged,
            VolatileKind::HelpingHand => self.helping_hand,
            VolatileKind::Imprison => self.imprisoning,
            VolatileKind::Grudge => self.grudge,
            VolatileKind::Snatch => self.snatching,
            VolatileKind::Foresight => self.foresight,
            VolatileKind::MiracleEye => self.miracle_eye,
            VolatileKind::HealBlock => self.heal_block_turns > 0,
            VolatileKind::FollowMe => self.follow_me,
            VolatileKind::RagePowder => self.rage_powder,
            VolatileKind::Spotlight => self.spotlight,
            VolatileKind::Infatuation => self.infatuated_with.is_some(),
            VolatileKind::Curse => self.cursed,
            VolatileKind::Nightmare => self.nightmare,
            VolatileKind::Minimize => self.minimized,
            VolatileKind::DefenseCurl => self.defense_curl,
            VolatileKind::LockOn => self.lock_on.is_some(),
            VolatileKind::Stockpile => self.stockpile > 0,
            VolatileKind::Bide => self.bide.is_some(),
            VolatileKind::Recharge => self.must_recharge,
        }
    }

    /// Count down the timed volatiles and report which ones ran out.
    /// Confusion, sleep-inducing Yawn and Perish Song tick elsewhere.
    pub fn tick_timers(&mut self) -> Vec<VolatileKind> {
        let mut expired = Vec::new();

        if let Some(bind) = self.bind.as_mut() {
            bind.turns_remaining = bind.turns_remaining.saturating_sub(1);
            if bind.turns_remaining == 0 {
                self.bind = None;
                expired.push(VolatileKind::Bind);
            }
        }
        if let Some(disable) = self.disable.as_mut() {
            disable.turns_remaining = disable.turns_remaining.saturating_sub(1);
            if disable.turns_remaining == 0 {
                self.disable = None;
                expired.push(VolatileKind::Disable);
            }
        }
        if let Some(encore) = self.encore.as_mut() {
            encore.turns_remaining = encore.turns_remaining.saturating_sub(1);
            if encore.turns_remaining == 0 {
                self.encore = None;
                expired.push(VolatileKind::Encore);
            }
        }
        if self.taunt_turns > 0 {
            self.taunt_turns -= 1;
            if self.taunt_turns == 0 {
                expired.push(VolatileKind::Taunt);
            }
        }
        if self.heal_block_turns > 0 {
            self.heal_block_turns -= 1;
            if self.heal_block_turns == 0 {
                expired.push(VolatileKind::HealBlock);
            }
        }
        expired
    }
}

/// Conditions protecting or hindering a whole side.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SideCondition {
    Reflect,
    LightScreen,
    Mist,
    Safeguard,
    Spikes,
}

impl fmt::Display for SideCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SideCondition::Reflect => "Reflect",
            SideCondition::LightScreen => "Light Screen",
            SideCondition::Mist => "Mist",
            SideCondition::Safeguard => "Safeguard",
            SideCondition::Spikes => "Spikes",
        };
        write!(f, "{}", name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingWish {
    pub turns_remaining: u8,
    pub amount: u16,
    pub slot: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct SideConditions {
    pub reflect_turns: u8,
    pub light_screen_turns: u8,
    pub mist_turns: u8,
    pub safeguard_turns: u8,
    pub wishes: Vec<PendingWish>,
    /// Coins scattered by Pay Day, collected by the winner.
    pub pay_day_total: u32,
}

impl SideConditions {
    pub fn has(&self, condition: SideCondition) -> bool {
        match condition {
            SideCondition::Reflect => self.reflect_turns > 0,
            SideCondition::LightScreen => self.light_screen_turns > 0,
            SideCondition::Mist => self.mist_turns > 0,
            SideCondition::Safeguard => self.safeguard_turns > 0,
            SideCondition::Spikes => false,
        }
    }

    /// Start a timed condition. Returns false if it is already up.
    pub fn start(&mut self, condition: SideCondition, turns: u8) -> bool {
        if self.has(condition) {
            return false;
        }
        match condition {
            SideCondition::Reflect => self.reflect_turns = turns,
            SideCondition::LightScreen => self.light_screen_turns = turns,
            SideCondition::Mist => self.mist_turns = turns,
            SideCondition::Safeguard => self.safeguard_turns = turns,
            SideCondition::Spikes => return false,
        }
        true
    }

    /// Count down every timed condition and return those that ended.
    pub fn tick(&mut self) -> Vec<SideCondition> {
        let mut expired = Vec::new();
        for (counter, condition) in [
            (&mut self.reflect_turns, SideCondition::Reflect),
            (&mut self.light_screen_turns, SideCondition::LightScreen),
            (&mut self.mist_turns, SideCondition::Mist),
            (&mut self.safeguard_turns, SideCondition::Safeguard),
        ] {
            if *counter > 0 {
                *counter -= 1;
                if *counter == 0 {
                    expired.push(condition);
                }
            }
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_side_condition_expiry() {
        let mut side = SideConditions::default();
        assert!(side.start(SideCondition::Reflect, 2));
        assert!(!side.start(SideCondition::Reflect, 5), "already up");
        assert!(side.start(SideCondition::Mist, 1));

        assert_eq!(side.tick(), vec![SideCondition::Mist]);
        assert!(side.has(SideCondition::Reflect));
        assert_eq!(side.tick(), vec![SideCondition::Reflect]);
        assert!(side.tick().is_empty());
    }

    #[test]
    fn test_volatile_timers_and_turn_flags() {
        let mut volatile = Volatile {
            taunt_turns: 1,
            disable: Some(TimedMove {
                move_id: MoveId::new("tackle"),
                turns_remaining: 2,
            }),
            flinched: true,
            protected: true,
            ..Volatile::default()
        };

        assert_eq!(volatile.tick_timers(), vec![VolatileKind::Taunt]);
        assert!(volatile.has(VolatileKind::Disable));
        assert_eq!(volatile.tick_timers(), vec![VolatileKind::Disable]);

        volatile.clear_turn_flags();
        assert!(!volatile.has(VolatileKind::Flinch));
        assert!(!volatile.has(VolatileKind::Protect));
    }
}

pub mod action_stack;
pub mod ai;
pub mod catch;
pub mod combatant;
pub mod conditions;
pub mod damage;
pub mod engine;
pub mod field;
pub mod items;
pub mod move_effects;
pub mod session;
pub mod state;
pub mod stats;
pub mod status;
pub mod targeting;

#[cfg(test)]
pub(crate) mod tests;

// Battle schema - shared static-data definitions.
// This crate holds the enums and read-only data records that the engine
// consumes from its data provider: types and the type chart, move metadata,
// structured move effects, species data and the small closed sets
// (abilities, held items, balls, weather) the formulas branch on.

pub use battle_data::*;
pub use move_data::*;
pub use move_types::*;
pub use pokemon_types::*;
pub use species_data::*;

pub mod battle_data;
pub mod move_data;
pub mod move_types;
pub mod pokemon_types;
pub mod species_data;

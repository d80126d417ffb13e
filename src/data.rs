//! Read-only static data boundary.
//!
//! The engine never owns species or move tables. It asks a [`DataProvider`]
//! once per battle and caches what it gets (see [`crate::moves::MoveCatalog`]).

use crate::errors::{MoveDataError, MoveDataResult, SpeciesDataError, SpeciesDataResult};
use schema::{BaseStats, EffectSpec, MoveData, MoveId, MoveMetadata, SpeciesData};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub trait DataProvider {
    fn move_metadata(&self, id: &MoveId) -> Option<MoveMetadata>;
    fn effect_spec(&self, id: &MoveId) -> Option<EffectSpec>;
    fn species(&self, species_id: &str) -> Option<SpeciesData>;

    fn base_stats(&self, species_id: &str) -> Option<BaseStats> {
        self.species(species_id).map(|species| species.base_stats)
    }

    /// Moves the species knows at `level` (its four latest level-up moves).
    fn learnset(&self, species_id: &str, level: u8) -> Vec<MoveId> {
        self.species(species_id)
            .map(|species| species.learnset.moves_at_level(level))
            .unwrap_or_default()
    }

    fn move_data(&self, id: &MoveId) -> Option<MoveData> {
        let metadata = self.move_metadata(id)?;
        let effect = self.effect_spec(id).unwrap_or_default();
        Some(MoveData { metadata, effect })
    }
}

/// In-memory provider backed by RON move and species lists.
#[derive(Debug, Clone, Default)]
pub struct RonDataProvider {
    moves: HashMap<MoveId, MoveData>,
    species: HashMap<String, SpeciesData>,
}

impl RonDataProvider {
    pub fn from_ron_str(moves_ron: &str, species_ron: &str) -> Result<Self, crate::errors::BattleEngineError> {
        let moves = Self::parse_moves(moves_ron)?;
        let species = Self::parse_species(species_ron)?;
        Ok(Self::from_records(moves, species))
    }

    pub fn load_dir(data_path: &Path) -> Result<Self, crate::errors::BattleEngineError> {
        let moves_src = fs::read_to_string(data_path.join("moves.ron"))
            .map_err(|e| MoveDataError::MalformedData(format!("moves.ron: {}", e)))?;
        let species_src = fs::read_to_string(data_path.join("species.ron"))
            .map_err(|e| SpeciesDataError::MalformedData(format!("species.ron: {}", e)))?;
        Self::from_ron_str(&moves_src, &species_src)
    }

    pub fn from_records(moves: Vec<MoveData>, species: Vec<SpeciesData>) -> Self {
        Self {
            moves: moves
                .into_iter()
                .map(|data| (data.metadata.id.clone(), data))
                .collect(),
            species: species
                .into_iter()
                .map(|data| (data.id.clone(), data))
                .collect(),
        }
    }

    fn parse_moves(source: &str) -> MoveDataResult<Vec<MoveData>> {
        ron::from_str(source).map_err(|e| MoveDataError::MalformedData(e.to_string()))
    }

    fn parse_species(source: &str) -> SpeciesDataResult<Vec<SpeciesData>> {
        ron::from_str(source).map_err(|e| SpeciesDataError::MalformedData(e.to_string()))
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    pub fn move_ids(&self) -> impl Iterator<Item = &MoveId> {
        self.moves.keys()
    }

    pub fn require_species(&self, species_id: &str) -> SpeciesDataResult<&SpeciesData> {
        self.species
            .get(species_id)
            .ok_or_else(|| SpeciesDataError::SpeciesNotFound(species_id.to_string()))
    }
}

impl DataProvider for RonDataProvider {
    fn move_metadata(&self, id: &MoveId) -> Option<MoveMetadata> {
        self.moves.get(id).map(|data| data.metadata.clone())
    }

    fn effect_spec(&self, id: &MoveId) -> Option<EffectSpec> {
        self.moves.get(id).map(|data| data.effect.clone())
    }

    fn species(&self, species_id: &str) -> Option<SpeciesData> {
        self.species.get(species_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schema::{EffectKind, MoveCategory, PokemonType};

    const MOVES: &str = r#"[
        (
            metadata: (
                id: "Ember",
                name: "Ember",
                accuracy: Some(100),
                power: 40,
                category: Special,
                move_type: Fire,
                pp: 25,
            ),
            effect: (
                damage: true,
                effects: [(kind: Burn, target: Target, chance: 10)],
            ),
        ),
    ]"#;

    const SPECIES: &str = r#"[
        (
            id: "charmander",
            name: "Charmander",
            types: [Fire],
            base_stats: (hp: 39, attack: 52, defense: 43, sp_attack: 60, sp_defense: 50, speed: 65),
            capture_rate: 45,
            base_exp: 65,
            ev_yield: (0, 0, 0, 0, 0, 1),
            learnset: (level_up: [(1, "scratch"), (7, "ember")]),
        ),
    ]"#;

    #[test]
    fn test_ron_provider_round_trip() {
        let provider = RonDataProvider::from_ron_str(MOVES, SPECIES).unwrap();
        let ember = provider.move_metadata(&MoveId::new("ember")).unwrap();
        assert_eq!(ember.power, 40);
        assert_eq!(ember.category, MoveCategory::Special);
        assert_eq!(ember.move_type, PokemonType::Fire);

        let effect = provider.effect_spec(&MoveId::new("ember")).unwrap();
        assert_eq!(effect.effects[0].kind, EffectKind::Burn);
        assert_eq!(effect.effects[0].chance, 10);

        assert_eq!(provider.base_stats("charmander").unwrap().speed, 65);
        assert_eq!(
            provider.learnset("charmander", 10),
            vec![MoveId::new("scratch"), MoveId::new("ember")]
        );
        assert!(provider.species("missingno").is_none());
    }

    #[test]
    fn test_malformed_ron_is_reported() {
        let err = RonDataProvider::from_ron_str("[(", SPECIES).unwrap_err();
        assert!(matches!(
            err,
            crate::errors::BattleEngineError::MoveData(MoveDataError::MalformedData(_))
        ));
    }
}

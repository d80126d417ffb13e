//! Demo: a trainer's Pikachu against a wild Rattata, played to the end.
//!
//! `RUST_LOG=pokemon_battle_sim=debug` shows the engine's own diagnostics.

use anyhow::{bail, Context, Result};
use pokemon_battle_sim::{
    BallType, Battle, BattleKind, BattleOutcome, BattlePokemon, BattleSession, BattleSide, Behavior, CombatantRef, DataProvider,
    EngineConfig, MoveCatalog, PlayerAction, PokemonInst, RonDataProvider, TurnRng, WildAi,
};
use std::path::Path;
use std::sync::Arc;

const PLAYER: CombatantRef = CombatantRef::new(0, 0);
const WILD: CombatantRef = CombatantRef::new(1, 0);
const MAX_TURNS: u32 = 50;

fn combatant(provider: &RonDataProvider, catalog: &MoveCatalog, species: &str, level: u8) -> Result<BattlePokemon> {
    let data = provider
        .species(species)
        .with_context(|| format!("species `{}` missing from data/species.ron", species))?;
    let inst = PokemonInst::new(&data, level, None, |id| {
        provider.move_metadata(id).map(|m| m.pp).unwrap_or(1)
    });
    Ok(BattlePokemon::from_roster(&inst, &data, catalog))
}

/// The usable move with the highest base power, or Struggle.
fn strongest_move(battle: &Battle, actor: CombatantRef) -> PlayerAction {
    let best = battle.state().pokemon(actor).and_then(|pokemon| {
        pokemon
            .moves
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.pp > 0)
            .max_by_key(|(_, slot)| battle.catalog().get(&slot.id).metadata.power)
            .map(|(index, _)| index)
    });
    match best {
        Some(move_index) => PlayerAction::UseMove {
            move_index,
            target: None,
        },
        None => PlayerAction::Struggle,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let provider = RonDataProvider::load_dir(Path::new("data")).context("loading static data")?;
    let config = Arc::new(EngineConfig::default());
    let catalog = MoveCatalog::preload(&provider, provider.move_ids(), config.struggle_power);

    let player = combatant(&provider, &catalog, "pikachu", 12)?;
    let wild = combatant(&provider, &catalog, "rattata", 8)?;
    let battle = Battle::new(
        "demo",
        BattleKind::Wild,
        BattleSide::new("Player", vec![player], 1),
        BattleSide::new("Wild", vec![wild], 1),
        catalog,
        config,
    )?;

    let session = BattleSession::new(battle, TurnRng::seeded(2024));
    let mut ai_rng = TurnRng::seeded(7);
    let ai = WildAi::new();

    let mut outcome = BattleOutcome::Ongoing;
    for _ in 0..MAX_TURNS {
        if outcome != BattleOutcome::Ongoing {
            break;
        }
        let (player_action, wild_action) = session
            .with_battle(|battle| {
                let state = battle.state();
                let wounded = state
                    .pokemon(WILD)
                    .is_some_and(|wild| wild.current_hp() * 2 < wild.max_hp());
                let player_action = if wounded {
                    PlayerAction::UseBall {
                        ball: BallType::PokeBall,
                        conditions: Default::default(),
                    }
                } else {
                    strongest_move(battle, PLAYER)
                };
                (player_action, ai.decide_action(WILD, state, &mut ai_rng))
            })
            .await;

        let pending = session.pending_actors().await;
        let mut report = None;
        for (actor, action) in [(PLAYER, player_action), (WILD, wild_action)] {
            if pending.contains(&actor) {
                report = session.submit_action(actor, action).await?;
            }
        }
        let report = match report {
            Some(report) => report,
            None => session.resolve_turn().await?,
        };
        for line in &report.log {
            println!("{}", line);
        }
        outcome = report.outcome;
    }

    if outcome == BattleOutcome::Ongoing {
        let report = session.force_end().await;
        outcome = report.outcome;
    }
    println!("\nOutcome: {:?}", outcome);

    let snapshots = session.snapshots().await;
    if snapshots.is_empty() {
        bail!("battle reported no combatants");
    }
    println!("{}", serde_json::to_string_pretty(&snapshots)?);
    Ok(())
}

pub mod autopilot;
pub mod config;
pub mod constants;
pub mod report;
pub mod resources;
pub mod runner;
pub mod systems;

pub use config::{Args, init_tracing};
pub use runner::Runner;

use anyhow::Result;
use tracing::info;

use common::GameWorld;

// ============================================================================
// Main Run
// ============================================================================

pub async fn run(args: Args) -> Result<()> {
    let map = args.load_map()?;
    let seed = args.seed.unwrap_or_else(rand::random);
    let game = GameWorld::new(&map, args.world_config(seed))?;
    info!(
        seed,
        map = %map.name,
        monsters = game.monsters().len(),
        generators = game.required_generators(),
        "simulation ready"
    );

    let mut runner = Runner::new(game, args.hz, args.ticks);
    let outcome = if args.realtime {
        runner.run_realtime().await
    } else {
        runner.run()
    };
    info!(
        ?outcome,
        ticks = runner.ticks(),
        elapsed = %format!("{:.1}s", runner.game().elapsed()),
        "simulation finished"
    );

    if let Some(path) = &args.report {
        runner.report(seed).write(path)?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}

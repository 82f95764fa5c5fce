use anyhow::{Context, Result};
use clap::Parser;
use std::{fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

use crate::constants::{DEFAULT_MAX_TICKS, DEFAULT_TICK_FREQUENCY, LOG_FILTER};
use common::{
    WorldConfig, abilities::AbilityKind, constants::GENERATOR_COUNT, map::MapConfig, monsters::MonsterKind,
};

// ============================================================================
// CLI Argument Parsing
// ============================================================================

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless facility chase simulation", long_about = None)]
pub struct Args {
    /// Map JSON file, the built-in facility when omitted
    #[arg(short, long)]
    pub map: Option<PathBuf>,

    /// Monster to spawn (kraken, gazer, phantom, echo, mimic, fracture, sentinel)
    #[arg(long)]
    pub monster: Option<MonsterKind>,

    /// Survivor ability (dash, surge, pulse, barricade, decoy)
    #[arg(long)]
    pub ability: Option<AbilityKind>,

    /// Random seed, drawn from the OS when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Generators to place
    #[arg(long, default_value_t = GENERATOR_COUNT)]
    pub generators: usize,

    /// Stop after this many ticks
    #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
    pub ticks: u64,

    /// Simulation frequency
    #[arg(long, default_value_t = DEFAULT_TICK_FREQUENCY, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub hz: u32,

    /// Pace ticks against the wall clock
    #[arg(long, default_value_t = false)]
    pub realtime: bool,

    /// Mirror the map and the horizontal controls
    #[arg(long, default_value_t = false)]
    pub mirror: bool,

    /// Spawn one of every monster
    #[arg(long, default_value_t = false)]
    pub nightmare: bool,

    /// Write a JSON run report here
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Args {
    pub fn load_map(&self) -> Result<MapConfig> {
        let Some(path) = &self.map else {
            return Ok(MapConfig::facility());
        };
        let json = fs::read_to_string(path).with_context(|| format!("failed to read map {}", path.display()))?;
        MapConfig::from_json_str(&json).with_context(|| format!("invalid map {}", path.display()))
    }

    #[must_use]
    pub fn world_config(&self, seed: u64) -> WorldConfig {
        WorldConfig {
            seed,
            generator_count: self.generators,
            monster: self.monster,
            ability: self.ability,
            mirror: self.mirror,
            nightmare: self.nightmare,
        }
    }
}

// ============================================================================
// Logging
// ============================================================================

// RUST_LOG overrides the default filter
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

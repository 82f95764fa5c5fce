use anyhow::Result;
use clap::Parser;

use server::{Args, init_tracing, run};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    run(Args::parse()).await
}

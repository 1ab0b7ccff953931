use anyhow::Result;
use clap::Parser;
use seed::cli::SmokeCli;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = SmokeCli::parse();
    seed::init_tracing();

    info!("Running catalog smoke suite");
    let state = seed::load_state(cli.backend);

    let suite = seed::smoke::run(&state).await;
    suite.print_summary();

    if !suite.is_success() {
        anyhow::bail!("{} smoke step(s) failed", suite.failed());
    }
    info!("All {} smoke steps passed", suite.passed());
    Ok(())
}

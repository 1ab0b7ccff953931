use anyhow::Result;
use clap::Parser;
use seed::cli::SeedCli;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = SeedCli::parse();
    seed::init_tracing();

    info!("Seeding the catalog with demo data");
    let state = seed::load_state(cli.backend);

    match seed::seeding::seed(&state).await {
        Ok(report) => {
            info!(
                "Seed complete: {} movies, {} list entries for {}",
                report.movies,
                report.user_movies,
                seed::fixtures::DEMO_EMAIL
            );
            println!("\nDemo user:");
            println!("   Email: {}", seed::fixtures::DEMO_EMAIL);
            println!("   Password: {}", seed::fixtures::DEMO_PASSWORD);
            Ok(())
        }
        Err(e) => {
            error!("Error during seed: {:#}", e);
            Err(e)
        }
    }
}

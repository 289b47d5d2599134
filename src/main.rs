use nft_ownership_checker::{app, config::Config};
use std::time::Instant;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let start = Instant::now();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Per-address failures are recorded in the CSV and do not affect the exit code.
    let exit_code = match app::run(&config).await {
        Ok(summary) => {
            if summary.failed > 0 {
                tracing::warn!(
                    "{} of {} addresses could not be checked",
                    summary.failed,
                    summary.total
                );
            }
            0
        }
        Err(e) => {
            tracing::error!("Fatal error: {}", e);
            eprintln!("Fatal error: {}", e);
            1
        }
    };

    let elapsed = start.elapsed().as_secs_f64();
    tracing::info!("Completed in {:.2} seconds.", elapsed);
    println!("Done in {:.2} seconds.", elapsed);
    std::process::exit(exit_code);
}

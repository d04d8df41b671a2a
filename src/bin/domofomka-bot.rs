use domofomka::bot::runner;
use domofomka::config::BotSettings;
use domofomka::telemetry;
use dotenvy::dotenv;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    telemetry::init_logging().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?;

    info!("Starting domofomka bot...");

    let settings = match BotSettings::new() {
        Ok(settings) => {
            info!("Configuration loaded successfully.");
            settings
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = runner::run(settings).await {
        error!("Bot failed: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

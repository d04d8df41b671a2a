use domofomka::config::ApiSettings;
use domofomka::{api, telemetry};
use dotenvy::dotenv;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    telemetry::init_logging().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?;

    info!("Starting domofomka API...");

    let settings = match ApiSettings::new() {
        Ok(settings) => {
            info!("Configuration loaded successfully.");
            settings
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = api::serve(settings).await {
        error!("API server failed: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

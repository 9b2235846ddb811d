// Careline - Local Messaging Client

use tracing::{error, info};

use careline_common::config::Config;
use careline_messaging::MessagingConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    careline_app::init_tracing(config.log_format, &config.rust_log);

    info!("Starting Careline local messaging client");

    let messaging = MessagingConfig::from_env().map_err(|e| {
        error!("Failed to load messaging configuration: {}", e);
        e
    })?;
    let role = messaging.role;

    info!(provider = %messaging.provider, role = %role, "Configuration loaded successfully");

    let api = careline_app::create_messaging(messaging)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let outgoing = (!args.is_empty()).then(|| args.join(" "));

    let transcript = careline_app::run(api, role, &config, outgoing)
        .await
        .map_err(|e| {
            error!("Conversation failed: {:#}", e);
            e
        })?;

    for line in transcript {
        println!("{}", line);
    }

    info!("Session complete");
    Ok(())
}

mod bot;
mod config;
mod platform;
mod server;
mod webhook;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::BotContext;
use crate::config::Config;
use crate::platform::telegram::TelegramMessenger;
use crate::platform::Messenger;
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,tapmoney_relay=debug,reqwest=warn,hyper=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let webhook_target = config.webhook_target()?;
    let web_app_url = config.web_app_url()?;

    info!("Configuration loaded successfully");
    info!("  Listen address: {}", config.listen_addr());
    info!("  Webhook path: {}", config.webhook.path);
    info!(
        "  Webhook URL: {}",
        webhook_target
            .as_ref()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "(not configured)".to_string())
    );
    info!("  Web app: {}", web_app_url);

    let messenger: Arc<dyn Messenger> = Arc::new(TelegramMessenger::new(
        &config.telegram.bot_token,
        Duration::from_secs(config.telegram.request_timeout_secs),
    )?);

    if config.webhook.register_on_startup {
        webhook::register_on_startup(messenger.as_ref(), webhook_target.as_ref()).await;
    } else {
        info!("Webhook registration on startup is disabled");
    }

    let state = AppState::new(BotContext {
        messenger,
        web_app_url,
    });

    info!("Bot is starting...");
    server::run(state, &config.listen_addr(), &config.webhook.path).await?;

    Ok(())
}

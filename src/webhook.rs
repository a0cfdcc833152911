use anyhow::Result;
use reqwest::Url;
use tracing::{error, info, warn};

use crate::platform::Messenger;

/// What startup registration ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    AlreadySet,
    Updated,
}

/// Point the provider at `target` unless it already is.
pub async fn ensure_webhook(messenger: &dyn Messenger, target: &Url) -> Result<Registration> {
    let current = messenger.webhook_url().await?;
    if current.as_ref() == Some(target) {
        info!("Webhook already set to: {}", target);
        return Ok(Registration::AlreadySet);
    }

    match current {
        Some(old) => info!("Moving webhook from {} to {}", old, target),
        None => info!("Setting webhook to: {}", target),
    }
    messenger.set_webhook(target.clone()).await?;
    Ok(Registration::Updated)
}

/// Startup hook: registration failures are logged and the server starts anyway.
pub async fn register_on_startup(messenger: &dyn Messenger, target: Option<&Url>) {
    let target = match target {
        Some(url) => url,
        None => {
            warn!("No public webhook base URL configured, skipping webhook registration");
            return;
        }
    };

    if let Err(e) = ensure_webhook(messenger, target).await {
        error!("Failed to register webhook: {:#}", e);
    }
}

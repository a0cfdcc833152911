pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use teloxide::types::{ChatId, ParseMode};

/// A single-button inline keyboard that opens the companion web app
#[derive(Debug, Clone, PartialEq)]
pub struct WebAppButton {
    pub label: String,
    pub url: Url,
}

/// An outgoing message to one chat
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub chat_id: ChatId,
    pub text: String,
    pub parse_mode: Option<ParseMode>,
    pub button: Option<WebAppButton>,
}

impl Reply {
    pub fn text(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: None,
            button: None,
        }
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    pub fn button(mut self, button: WebAppButton) -> Self {
        self.button = Some(button);
        self
    }
}

/// Outbound side of the messaging provider
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_reply(&self, reply: Reply) -> Result<()>;

    /// Currently registered webhook URL, `None` when no webhook is set.
    async fn webhook_url(&self) -> Result<Option<Url>>;

    async fn set_webhook(&self, url: Url) -> Result<()>;
}

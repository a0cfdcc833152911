use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, WebAppInfo};
use tracing::debug;

use crate::platform::{Messenger, Reply};

/// Messenger backed by the Telegram Bot API
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(token: &str, request_timeout: Duration) -> Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(request_timeout)
            .build()
            .context("Failed to build Telegram HTTP client")?;

        Ok(Self {
            bot: Bot::with_client(token, client),
        })
    }
}

fn keyboard_for(reply: &Reply) -> Option<InlineKeyboardMarkup> {
    let button = reply.button.as_ref()?;
    Some(InlineKeyboardMarkup::new([[InlineKeyboardButton::web_app(
        button.label.clone(),
        WebAppInfo {
            url: button.url.clone(),
        },
    )]]))
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_reply(&self, reply: Reply) -> Result<()> {
        let keyboard = keyboard_for(&reply);
        let chat_id = reply.chat_id;

        let mut request = self.bot.send_message(chat_id, reply.text);
        if let Some(mode) = reply.parse_mode {
            request = request.parse_mode(mode);
        }
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(keyboard);
        }

        let sent = request
            .await
            .with_context(|| format!("sendMessage to chat {} failed", chat_id.0))?;
        debug!("Delivered message {} to chat {}", sent.id.0, chat_id.0);
        Ok(())
    }

    async fn webhook_url(&self) -> Result<Option<Url>> {
        let info = self
            .bot
            .get_webhook_info()
            .await
            .context("getWebhookInfo failed")?;
        Ok(info.url)
    }

    async fn set_webhook(&self, url: Url) -> Result<()> {
        self.bot
            .set_webhook(url.clone())
            .await
            .with_context(|| format!("setWebhook to {} failed", url))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::WebAppButton;
    use teloxide::types::{ChatId, InlineKeyboardButtonKind};

    #[test]
    fn test_plain_reply_has_no_keyboard() {
        let reply = Reply::text(ChatId(1), "hi");
        assert!(keyboard_for(&reply).is_none());
    }

    #[test]
    fn test_button_becomes_single_web_app_button() {
        let url = Url::parse("https://example.com/app/?startapp=42").unwrap();
        let reply = Reply::text(ChatId(1), "hi").button(WebAppButton {
            label: "Play".to_string(),
            url: url.clone(),
        });

        let keyboard = keyboard_for(&reply).unwrap();
        assert_eq!(keyboard.inline_keyboard.len(), 1);
        assert_eq!(keyboard.inline_keyboard[0].len(), 1);

        let button = &keyboard.inline_keyboard[0][0];
        assert_eq!(button.text, "Play");
        match &button.kind {
            InlineKeyboardButtonKind::WebApp(info) => assert_eq!(info.url, url),
            other => panic!("unexpected button kind: {:?}", other),
        }
    }
}

use std::sync::Arc;

use reqwest::Url;
use teloxide::types::{Message, ParseMode, Update, UpdateKind, User};
use teloxide::utils::html;
use tracing::{debug, error};

use crate::platform::{Messenger, Reply, WebAppButton};

const FALLBACK_USER_NAME: &str = "Игрок";
const PLAY_BUTTON_LABEL: &str = "Запустить игру";
const HELP_TEXT: &str = "Используйте команду /start для запуска игры.";

/// Commands the bot reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
}

impl Command {
    /// Parse the leading token of a message, accepting an optional `@botname` suffix.
    pub fn parse(text: &str) -> Option<Self> {
        let token = text.split_whitespace().next()?;
        let name = token.split('@').next().unwrap_or(token);
        match name {
            "/start" => Some(Command::Start),
            "/help" => Some(Command::Help),
            _ => None,
        }
    }
}

/// Text whose leading token is a slash command, known or not.
fn is_command(text: &str) -> bool {
    text.trim_start().starts_with('/')
}

/// Everything a handler needs besides the update itself
#[derive(Clone)]
pub struct BotContext {
    pub messenger: Arc<dyn Messenger>,
    pub web_app_url: Url,
}

/// Handle one update end to end. Send failures are logged, never propagated.
pub async fn handle_update(ctx: BotContext, update: Update) {
    let update_id = update.id.0;
    if let UpdateKind::Message(msg) = &update.kind {
        debug!(
            "Update {} in chat {} from {}: {:?}",
            update_id,
            msg.chat.id.0,
            msg.from.as_ref().map(|u| u.id.0).unwrap_or_default(),
            msg.text()
        );
    }

    let reply = match reply_for(&update, &ctx.web_app_url) {
        Some(reply) => reply,
        None => {
            debug!("Ignoring update {}: nothing to answer", update_id);
            return;
        }
    };

    if let Err(e) = ctx.messenger.send_reply(reply).await {
        error!("Failed to answer update {}: {:#}", update_id, e);
    }
}

/// Route an update to its handler and build the single reply it produces.
pub fn reply_for(update: &Update, web_app_url: &Url) -> Option<Reply> {
    let msg = match &update.kind {
        UpdateKind::Message(msg) => msg,
        _ => return None,
    };
    let text = msg.text()?;

    match Command::parse(text) {
        Some(Command::Start) => welcome(msg, web_app_url),
        Some(Command::Help) => Some(help(msg)),
        None if is_command(text) => None,
        None => Some(echo(msg, text)),
    }
}

/// Referral link for the web app: `<web app url>?startapp=<user id>`
pub fn referral_url(web_app_url: &Url, user_id: u64) -> Url {
    let mut url = web_app_url.clone();
    url.query_pairs_mut()
        .append_pair("startapp", &user_id.to_string());
    url
}

fn display_name(user: &User) -> &str {
    if user.first_name.trim().is_empty() {
        FALLBACK_USER_NAME
    } else {
        &user.first_name
    }
}

fn welcome(msg: &Message, web_app_url: &Url) -> Option<Reply> {
    let user = msg.from.as_ref()?;
    let user_id = user.id.0;
    let link = referral_url(web_app_url, user_id);

    let text = format!(
        "Добро пожаловать, {}! Нажми кнопку, чтобы начать играть в TapMoney.\n\n\
         Твой личный реферальный ID: <code>{}</code>\n\
         Поделись этим ID или ссылкой ниже с друзьями, чтобы получить бонусы!\n\n\
         Твоя реферальная ссылка для приглашения: <code>{}</code>",
        html::escape(display_name(user)),
        user_id,
        html::escape(link.as_str()),
    );

    Some(
        Reply::text(msg.chat.id, text)
            .parse_mode(ParseMode::Html)
            .button(WebAppButton {
                label: PLAY_BUTTON_LABEL.to_string(),
                url: link,
            }),
    )
}

fn help(msg: &Message) -> Reply {
    Reply::text(msg.chat.id, HELP_TEXT)
}

fn echo(msg: &Message, text: &str) -> Reply {
    Reply::text(msg.chat.id, format!("Ты написал: \"{}\"", text))
}

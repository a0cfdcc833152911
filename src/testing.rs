//! Shared fixtures for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};
use teloxide::types::Update;
use tokio::sync::mpsc;

use crate::platform::{Messenger, Reply};

/// Messenger that records every reply on a channel instead of calling Telegram
pub struct RecordingMessenger {
    replies: mpsc::UnboundedSender<Reply>,
    fail_sends: bool,
    registered: Mutex<Option<Url>>,
    set_webhook_calls: AtomicUsize,
}

impl RecordingMessenger {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Reply>) {
        Self::build(false, None)
    }

    /// Records replies, then reports every send as failed.
    pub fn failing() -> (Self, mpsc::UnboundedReceiver<Reply>) {
        Self::build(true, None)
    }

    pub fn with_webhook(url: Option<Url>) -> (Self, mpsc::UnboundedReceiver<Reply>) {
        Self::build(false, url)
    }

    fn build(fail_sends: bool, url: Option<Url>) -> (Self, mpsc::UnboundedReceiver<Reply>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let messenger = Self {
            replies: tx,
            fail_sends,
            registered: Mutex::new(url),
            set_webhook_calls: AtomicUsize::new(0),
        };
        (messenger, rx)
    }

    pub fn set_webhook_calls(&self) -> usize {
        self.set_webhook_calls.load(Ordering::SeqCst)
    }

    pub fn registered(&self) -> Option<Url> {
        self.registered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_reply(&self, reply: Reply) -> Result<()> {
        let _ = self.replies.send(reply);
        if self.fail_sends {
            return Err(anyhow!("simulated send failure"));
        }
        Ok(())
    }

    async fn webhook_url(&self) -> Result<Option<Url>> {
        Ok(self.registered())
    }

    async fn set_webhook(&self, url: Url) -> Result<()> {
        self.set_webhook_calls.fetch_add(1, Ordering::SeqCst);
        *self.registered.lock().unwrap() = Some(url);
        Ok(())
    }
}

/// A private-chat text message update as Telegram delivers it.
pub fn text_update(user_id: i64, first_name: &str, text: &str) -> Value {
    json!({
        "update_id": 10000,
        "message": {
            "message_id": 1365,
            "date": 1441645532,
            "chat": {
                "id": user_id,
                "type": "private",
                "first_name": first_name
            },
            "from": {
                "id": user_id,
                "is_bot": false,
                "first_name": first_name,
                "language_code": "ru"
            },
            "text": text
        }
    })
}

/// A private-chat photo message with no text or caption.
pub fn photo_update(user_id: i64, first_name: &str) -> Value {
    json!({
        "update_id": 10001,
        "message": {
            "message_id": 1366,
            "date": 1441645600,
            "chat": {
                "id": user_id,
                "type": "private",
                "first_name": first_name
            },
            "from": {
                "id": user_id,
                "is_bot": false,
                "first_name": first_name
            },
            "photo": [
                {
                    "file_id": "AgADBAADbqcxG-photo",
                    "file_unique_id": "AQADbqcxGw",
                    "width": 90,
                    "height": 51,
                    "file_size": 1101
                }
            ]
        }
    })
}

/// Parse from serialized text, the way the webhook endpoint does.
pub fn parse_update(value: Value) -> Update {
    serde_json::from_str(&value.to_string()).unwrap()
}

use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub web_app: WebAppConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    /// Externally reachable base URL of this service, e.g. `https://bot.example.com`
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_webhook_path")]
    pub path: String,
    #[serde(default = "default_register_on_startup")]
    pub register_on_startup: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebAppConfig {
    #[serde(default = "default_web_app_url")]
    pub url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            path: default_webhook_path(),
            register_on_startup: default_register_on_startup(),
        }
    }
}

impl Default for WebAppConfig {
    fn default() -> Self {
        Self {
            url: default_web_app_url(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

fn default_register_on_startup() -> bool {
    true
}

fn default_web_app_url() -> String {
    "https://tanya1232.github.io/TapMoney/".to_string()
}

/// The webhook path is mounted as a literal axum route: no captures, no wildcards.
fn validate_webhook_path(path: &str) -> Result<()> {
    if path == "/" {
        bail!("Webhook path must not be \"/\", that route serves the health check");
    }
    if path.chars().any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '?' | '#')) {
        bail!("Invalid webhook path {:?}: must be a plain literal path", path);
    }
    if path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        bail!(
            "Invalid webhook path {:?}: segments must not start with ':' or '*'",
            path
        );
    }
    Ok(())
}

impl Config {
    /// Load `path` if it exists, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let content = if path.exists() {
            Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?,
            )
        } else {
            None
        };

        Self::from_sources(content.as_deref(), |key| std::env::var(key).ok())
    }

    /// Build a config from optional TOML text and an environment lookup.
    pub fn from_sources<F>(toml_content: Option<&str>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Config = match toml_content {
            Some(content) => toml::from_str(content).context("Failed to parse config file")?,
            None => Config::default(),
        };

        config.apply_env(env)?;
        config.normalize();
        config.validate()?;

        Ok(config)
    }

    fn apply_env<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = env("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(host) = env("HOST") {
            self.server.host = host;
        }
        if let Some(port) = env("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", port))?;
        }
        if let Some(base_url) = env("WEBHOOK_BASE_URL") {
            self.webhook.base_url = Some(base_url);
        }
        if let Some(path) = env("WEBHOOK_PATH") {
            self.webhook.path = path;
        }
        if let Some(url) = env("WEB_APP_URL") {
            self.web_app.url = url;
        }
        Ok(())
    }

    fn normalize(&mut self) {
        self.telegram.bot_token = self.telegram.bot_token.trim().to_string();

        let path = self.webhook.path.trim();
        self.webhook.path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        self.webhook.base_url = self
            .webhook
            .base_url
            .take()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
    }

    fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            bail!("TELEGRAM_BOT_TOKEN is not set (env var or [telegram] bot_token)");
        }
        validate_webhook_path(&self.webhook.path)?;
        self.web_app_url()?;
        self.webhook_target()?;
        Ok(())
    }

    /// Full public webhook URL (`base_url` + `path`), if a base URL is configured.
    pub fn webhook_target(&self) -> Result<Option<Url>> {
        self.webhook
            .base_url
            .as_ref()
            .map(|base| {
                let full = format!("{}{}", base, self.webhook.path);
                Url::parse(&full).with_context(|| format!("Invalid webhook URL: {}", full))
            })
            .transpose()
    }

    pub fn web_app_url(&self) -> Result<Url> {
        Url::parse(&self.web_app.url)
            .with_context(|| format!("Invalid web app URL: {}", self.web_app.url))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

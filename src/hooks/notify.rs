use std::time::Duration;

use anyhow::{Context, Result};

use super::{Hook, HookContext};
use crate::config::NotifyConfig;
use crate::event::{HookInput, Outcome};

pub const TOKEN_ENV: &str = "CLAUDE_HOOK_BOT_TOKEN";
pub const CHAT_ENV: &str = "CLAUDE_HOOK_CHAT_ID";

const PREVIEW_CHARS: usize = 50;

/// Short chat message for a host event, `None` for events we stay quiet on.
pub fn message_for(input: &HookInput) -> Option<String> {
    match input.hook_event_name.as_str() {
        "Notification" => {
            let text = input.message.as_deref().unwrap_or_default();
            let lower = text.to_lowercase();
            if lower.contains("permission") {
                Some("🔐 Permission needed".into())
            } else if lower.contains("waiting") {
                Some("⏳ Waiting for input".into())
            } else {
                let preview: String = text.chars().take(PREVIEW_CHARS).collect();
                Some(format!("📢 {preview}"))
            }
        }
        "Stop" => Some("✅ Task completed".into()),
        "SubagentStop" => Some("🎯 Subtask done".into()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl Credentials {
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let bot_token = lookup(TOKEN_ENV).filter(|s| !s.is_empty())?;
        let chat_id = lookup(CHAT_ENV).filter(|s| !s.is_empty())?;
        Some(Self { bot_token, chat_id })
    }
}

pub trait Notifier {
    fn send(&self, text: &str) -> Result<()>;
}

/// Telegram Bot API `sendMessage`.
pub struct Telegram {
    client: reqwest::blocking::Client,
    api_base: String,
    credentials: Credentials,
}

impl Telegram {
    pub fn new(config: &NotifyConfig, credentials: Credentials) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.credentials.bot_token)
    }
}

impl Notifier for Telegram {
    fn send(&self, text: &str) -> Result<()> {
        let params = [
            ("chat_id", self.credentials.chat_id.as_str()),
            ("text", text),
            ("parse_mode", "HTML"),
        ];
        // The endpoint embeds the bot token; keep it out of error messages.
        self.client
            .post(self.endpoint())
            .form(&params)
            .send()
            .map_err(reqwest::Error::without_url)
            .context("request failed")?
            .error_for_status()
            .map_err(reqwest::Error::without_url)
            .context("Telegram rejected the message")?;
        Ok(())
    }
}

/// Send `text` and describe the result for stderr.
pub fn deliver(notifier: &dyn Notifier, text: &str) -> String {
    match notifier.send(text) {
        Ok(()) => {
            log::info!("sent notification: {text}");
            format!("✅ Sent: {text}")
        }
        Err(e) => {
            log::warn!("notification failed: {e:#}");
            format!("❌ Failed to send Telegram message: {e:#}")
        }
    }
}

pub struct NotifyHook;

impl Hook for NotifyHook {
    fn tag(&self) -> &'static str {
        "NOTIFY"
    }

    fn run(&self, input: &HookInput, ctx: &HookContext) -> Result<Outcome> {
        let Some(text) = message_for(input) else {
            return Ok(Outcome::silent());
        };
        let Some(credentials) = Credentials::from_env() else {
            return Ok(Outcome::silent().with_stderr("⚠️ Telegram credentials not set"));
        };
        let telegram = Telegram::new(&ctx.config.notify, credentials)?;
        Ok(Outcome::silent().with_stderr(deliver(&telegram, &text)))
    }
}

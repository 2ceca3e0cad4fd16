//! Telegram monitoring subsystem: outbound notifications, an alert layer
//! wired into tracing, and the inbound command listener.

mod commands;
mod format;

pub use commands::{spawn_command_listener, spawn_scheduled_health, MonitorContext};
pub use format::{escape_markdown, format_request_line, format_uptime, is_noise_path, truncate};

use crate::config::TelegramConfig;
use crate::error_buffer::MessageVisitor;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Queues messages for the monitoring chat. Cloning shares the queue.
/// Without a configured bot every send is a no-op.
#[derive(Clone)]
pub struct Notifier {
    sender: Option<mpsc::UnboundedSender<String>>,
}

impl Notifier {
    pub fn new(config: &TelegramConfig) -> Self {
        if !config.enabled() {
            info!("Telegram bot not configured, notifications disabled");
            return Self::disabled();
        }

        let token = config.bot_token.clone().unwrap_or_default();
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(send_worker(token, config.chat_id, receiver));

        Self {
            sender: Some(sender),
        }
    }

    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    pub fn notify(&self, text: impl Into<String>) {
        if let Some(sender) = &self.sender {
            if sender.send(text.into()).is_err() {
                warn!("Telegram notifier channel closed");
            }
        }
    }
}

/// Background worker draining the notification queue. MarkdownV2 first,
/// plain text retry when Telegram rejects the formatting.
async fn send_worker(token: String, chat_id: i64, mut receiver: mpsc::UnboundedReceiver<String>) {
    let bot = Bot::new(&token);
    let chat = ChatId(chat_id);

    info!(chat_id, "Telegram notifier started");

    while let Some(text) = receiver.recv().await {
        let markdown = bot
            .send_message(chat, &text)
            .parse_mode(ParseMode::MarkdownV2)
            .await;

        if markdown.is_err() {
            // warn, not error: an error here would feed back into the alert layer
            if let Err(e) = bot.send_message(chat, &text).await {
                warn!(error = %e, "Failed to send Telegram message");
            }
        }
    }

    warn!("Telegram notifier worker shutting down");
}

/// Tracing layer that forwards ERROR events to the monitoring chat.
pub struct AlertLayer {
    notifier: Notifier,
}

impl AlertLayer {
    pub fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }
}

impl<S> tracing_subscriber::Layer<S> for AlertLayer
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if *event.metadata().level() != tracing::Level::ERROR {
            return;
        }

        let mut message = String::new();
        event.record(&mut MessageVisitor(&mut message));

        self.notifier.notify(format!(
            "🚨 *Server error*\n{}",
            escape_markdown(&truncate(&message, 500))
        ));
    }
}

/// Request and error counters shared with the request-log middleware.
pub struct RuntimeStats {
    started_at: DateTime<Utc>,
    requests: AtomicU64,
    errors: AtomicU64,
}

impl RuntimeStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            requests: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    pub fn record(&self, status: u16) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if status >= 400 {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

impl Default for RuntimeStats {
    fn default() -> Self {
        Self::new()
    }
}

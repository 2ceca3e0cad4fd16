//! Inbound bot commands and the scheduled health sweep.

use super::format::{escape_markdown, format_uptime, truncate};
use super::{Notifier, RuntimeStats};
use crate::config::TelegramConfig;
use crate::db::Database;
use crate::error_buffer::ErrorBuffer;
use crate::health::HealthChecker;
use std::sync::Arc;
use std::time::{Duration, Instant};
use teloxide::prelude::*;
use teloxide::types::{BotCommand, ParseMode};
use tracing::{info, warn};

const HEALTH_SWEEP_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);
const ERRORS_SHOWN: usize = 10;

/// Everything the command handlers read from.
#[derive(Clone)]
pub struct MonitorContext {
    pub db: Arc<Database>,
    pub stats: Arc<RuntimeStats>,
    pub errors: ErrorBuffer,
    pub health: Arc<HealthChecker>,
    pub port: u16,
}

fn bot_commands() -> Vec<(&'static str, &'static str)> {
    vec![
        ("health", "Per-service status"),
        ("stats", "Request and content counters"),
        ("uptime", "Time since server start"),
        ("errors", "Recent warnings and errors"),
        ("dbstats", "Connection pool and table sizes"),
        ("ping", "Round-trip latency"),
        ("version", "Server version"),
        ("help", "List commands"),
    ]
}

/// Start the command listener. Does nothing when the bot is not configured.
pub fn spawn_command_listener(config: &TelegramConfig, ctx: MonitorContext) {
    if !config.enabled() {
        return;
    }

    let token = config.bot_token.clone().unwrap_or_default();
    let allowed_chat = ChatId(config.chat_id);

    tokio::spawn(async move {
        let bot = Bot::new(&token);

        let commands: Vec<BotCommand> = bot_commands()
            .into_iter()
            .map(|(cmd, desc)| BotCommand::new(cmd, desc))
            .collect();
        if let Err(e) = bot.set_my_commands(commands).await {
            warn!(error = %e, "Failed to register bot commands");
        }

        info!(chat_id = allowed_chat.0, "Telegram command listener started");

        teloxide::repl(bot, move |bot: Bot, msg: Message| {
            let ctx = ctx.clone();
            async move {
                let Some(text) = msg.text() else {
                    return respond(());
                };
                if msg.chat.id != allowed_chat || !text.starts_with('/') {
                    return respond(());
                }

                if let Err(e) = handle_command(&bot, &msg, &ctx, text).await {
                    warn!(error = %e, "Failed to answer bot command");
                }
                respond(())
            }
        })
        .await;
    });
}

/// Periodic health sweep; alerts only when something is down.
pub fn spawn_scheduled_health(health: Arc<HealthChecker>, notifier: Notifier) {
    if !notifier.is_enabled() {
        return;
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEALTH_SWEEP_INTERVAL);
        interval.tick().await; // first tick fires immediately

        loop {
            interval.tick().await;
            let report = health.check_all().await;
            if !report.healthy {
                let mut text = String::from("🚨 *Scheduled health check failed*\n");
                for service in report.down_services() {
                    text.push_str(&format!(
                        "❌ {}: {}\n",
                        escape_markdown(&service.name),
                        escape_markdown(&service.detail)
                    ));
                }
                notifier.notify(text);
            }
        }
    });
}

async fn handle_command(
    bot: &Bot,
    msg: &Message,
    ctx: &MonitorContext,
    text: &str,
) -> ResponseResult<()> {
    let command = text.split_whitespace().next().unwrap_or("");
    // strip the @BotName suffix used in groups
    let command = command.split('@').next().unwrap_or(command);

    if command == "/ping" {
        let start = Instant::now();
        let sent = bot.send_message(msg.chat.id, "🏓 Pong").await?;
        let latency = start.elapsed().as_millis();
        bot.edit_message_text(msg.chat.id, sent.id, format!("🏓 Pong – {latency}ms"))
            .await?;
        return Ok(());
    }

    let response = match command {
        "/health" => health_response(ctx).await,
        "/stats" => stats_response(ctx).await,
        "/uptime" => format!(
            "⏱ Uptime: {}",
            format_uptime(ctx.stats.started_at())
        ),
        "/errors" => errors_response(ctx).await,
        "/dbstats" => dbstats_response(ctx).await,
        "/version" => format!(
            "🤖 skinai\\-server v{}",
            escape_markdown(env!("CARGO_PKG_VERSION"))
        ),
        "/help" => help_response(),
        _ => "Unknown command\\. Try /help".to_string(),
    };

    send_formatted(bot, msg.chat.id, &response).await
}

/// MarkdownV2 first, plain text retry when the formatting is rejected.
async fn send_formatted(bot: &Bot, chat: ChatId, text: &str) -> ResponseResult<()> {
    if bot
        .send_message(chat, text)
        .parse_mode(ParseMode::MarkdownV2)
        .await
        .is_err()
    {
        bot.send_message(chat, text).await?;
    }
    Ok(())
}

async fn health_response(ctx: &MonitorContext) -> String {
    let report = ctx.health.check_all().await;
    let mut text = if report.healthy {
        String::from("🩺 *Health: ok*\n")
    } else {
        String::from("🩺 *Health: degraded*\n")
    };

    for service in &report.services {
        let emoji = match service.status.as_str() {
            "up" => "✅",
            "not_configured" => "➖",
            _ => "❌",
        };
        text.push_str(&format!(
            "{} {}: {} {}\n",
            emoji,
            escape_markdown(&service.name),
            escape_markdown(&service.status),
            escape_markdown(&service.detail)
        ));
    }
    text
}

async fn stats_response(ctx: &MonitorContext) -> String {
    let users = ctx.db.count_users().await.unwrap_or(-1);
    let messages = ctx.db.count_messages().await.unwrap_or(-1);
    let facts = ctx.db.count_facts().await.unwrap_or(-1);

    format!(
        "📊 *Stats*\nRequests: `{}` \\(errors: `{}`\\)\nUsers: `{}` \\| Messages: `{}` \\| Facts: `{}`\nUptime: {}\nPort: `{}`",
        ctx.stats.requests(),
        ctx.stats.errors(),
        users,
        messages,
        facts,
        format_uptime(ctx.stats.started_at()),
        ctx.port,
    )
}

async fn errors_response(ctx: &MonitorContext) -> String {
    let buffer = ctx.errors.read().await;
    if buffer.is_empty() {
        return "No recent errors 🎉".to_string();
    }

    let mut text = String::from("🧾 *Recent errors*\n");
    for entry in buffer.iter().take(ERRORS_SHOWN) {
        text.push_str(&format!(
            "`{}` \\[{}\\] {}\n",
            escape_markdown(&entry.timestamp.format("%H:%M:%S").to_string()),
            escape_markdown(&entry.level),
            escape_markdown(&truncate(&entry.message, 200))
        ));
    }
    text
}

async fn dbstats_response(ctx: &MonitorContext) -> String {
    let pool = ctx.db.pool();
    let users = ctx.db.count_users().await.unwrap_or(-1);
    let messages = ctx.db.count_messages().await.unwrap_or(-1);
    let facts = ctx.db.count_facts().await.unwrap_or(-1);

    format!(
        "🗄 *Database*\nPool: `{}` connections, `{}` idle\nusers: `{}`\nmessages: `{}`\nfacts: `{}`",
        pool.size(),
        pool.num_idle(),
        users,
        messages,
        facts,
    )
}

fn help_response() -> String {
    let mut text = String::from("🤖 *Commands*\n");
    for (cmd, desc) in bot_commands() {
        text.push_str(&format!("/{} – {}\n", cmd, escape_markdown(desc)));
    }
    text
}

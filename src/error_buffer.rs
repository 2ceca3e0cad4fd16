use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::Subscriber;
use tracing_subscriber::Layer;

const MAX_ERROR_ENTRIES: usize = 50;

/// A captured warning or error, kept for the bot's /errors command.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
    pub target: String,
}

/// Thread-safe bounded ring of recent warnings and errors, newest first.
pub type ErrorBuffer = Arc<RwLock<VecDeque<ErrorEntry>>>;

pub fn create_error_buffer() -> ErrorBuffer {
    Arc::new(RwLock::new(VecDeque::with_capacity(MAX_ERROR_ENTRIES)))
}

pub fn push_entry(buffer: &ErrorBuffer, entry: ErrorEntry) {
    // try_write: dropping an entry under contention beats blocking a log call
    if let Ok(mut buffer) = buffer.try_write() {
        buffer.push_front(entry);
        if buffer.len() > MAX_ERROR_ENTRIES {
            buffer.pop_back();
        }
    }
}

/// Tracing layer that captures WARN and ERROR events into the ring buffer.
pub struct ErrorBufferLayer {
    buffer: ErrorBuffer,
}

impl ErrorBufferLayer {
    pub fn new(buffer: ErrorBuffer) -> Self {
        Self { buffer }
    }
}

impl<S> Layer<S> for ErrorBufferLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > tracing::Level::WARN {
            return;
        }

        let mut message = String::new();
        let mut visitor = MessageVisitor(&mut message);
        event.record(&mut visitor);

        push_entry(
            &self.buffer,
            ErrorEntry {
                timestamp: Utc::now(),
                level: metadata.level().to_string(),
                message,
                target: metadata.target().to_string(),
            },
        );
    }
}

/// Extracts the event message and flattens remaining fields into it.
pub(crate) struct MessageVisitor<'a>(pub(crate) &'a mut String);

impl<'a> tracing::field::Visit for MessageVisitor<'a> {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0.push_str(value);
        } else {
            if !self.0.is_empty() {
                self.0.push(' ');
            }
            self.0.push_str(field.name());
            self.0.push('=');
            self.0.push_str(value);
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{:?}", value);
        if field.name() == "message" {
            self.0.push_str(rendered.trim_matches('"'));
        } else {
            if !self.0.is_empty() {
                self.0.push(' ');
            }
            self.0.push_str(field.name());
            self.0.push('=');
            self.0.push_str(&rendered);
        }
    }
}

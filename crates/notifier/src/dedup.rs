//! Error-to-notification sink with immediate-repeat suppression.
//!
//! Only the last forwarded message is remembered. A repeated failure is
//! reported once, and reported again as soon as any other error was
//! forwarded in between.

use std::sync::Arc;

use async_trait::async_trait;

use homework_common::types::{LogEvent, Severity};

use crate::log_sink::LogSink;
use crate::{DELIVERY_TARGET, Notifier};

/// Forwards error-level log events to a [`Notifier`].
pub struct DedupLogSink {
    notifier: Arc<dyn Notifier>,
    last_message: Option<String>,
}

impl DedupLogSink {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            last_message: None,
        }
    }

    /// The most recently forwarded message, if any.
    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }
}

#[async_trait]
impl LogSink for DedupLogSink {
    async fn handle(&mut self, event: &LogEvent) {
        if event.severity < Severity::Error {
            return;
        }
        // The notifier's own failure reports would loop back here
        if event.target.starts_with(DELIVERY_TARGET) {
            return;
        }
        // Telegram rejects empty texts
        if event.message.trim().is_empty() {
            return;
        }
        if self.last_message.as_deref() == Some(event.message.as_str()) {
            return;
        }

        // Remembered even if delivery failed so the same failure is not retried
        self.notifier.notify(&event.message).await;
        self.last_message = Some(event.message.clone());
    }
}

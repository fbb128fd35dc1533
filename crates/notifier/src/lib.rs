//! Notification delivery for the homework bot.
//!
//! - [`Notifier`]: one-shot text delivery that reports its outcome instead of failing
//! - [`TelegramNotifier`]: delivery through the Telegram Bot API
//! - [`LogEventLayer`] / [`LogDispatcher`]: explicit subscription of log sinks to
//!   the process's diagnostic stream
//! - [`DedupLogSink`]: forwards error-level log lines, skipping immediate repeats

pub mod dedup;
pub mod log_sink;
pub mod telegram;

use async_trait::async_trait;

pub use dedup::DedupLogSink;
pub use log_sink::{LogDispatcher, LogEventLayer, LogSink, log_channel};
pub use telegram::TelegramNotifier;

/// Target used for the notifier's own delivery diagnostics.
///
/// Log sinks that re-enter a [`Notifier`] must ignore events under this
/// target, otherwise a failing channel would report its failures to itself.
pub const DELIVERY_TARGET: &str = "homework_notifier::delivery";

/// Result of a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// Sends a text message to a single configured destination.
///
/// Implementations make exactly one attempt and never propagate transport
/// failures; they are converted into [`DeliveryOutcome::Failed`].
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> DeliveryOutcome;
}

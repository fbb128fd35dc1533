//! Explicit subscription of log sinks to the diagnostic stream.
//!
//! [`LogEventLayer`] is installed in the `tracing` subscriber stack and
//! publishes every event it sees as a [`LogEvent`] on a channel.
//! [`LogDispatcher`] drains that channel and hands each event to the sinks
//! registered with it, in registration order. Sinks run on the dispatcher's
//! task, never inside the code that emitted the event.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use homework_common::types::{LogEvent, Severity};

/// Consumer of published log events.
#[async_trait]
pub trait LogSink: Send {
    async fn handle(&mut self, event: &LogEvent);
}

/// Create a connected layer/dispatcher pair.
pub fn log_channel() -> (LogEventLayer, LogDispatcher) {
    let (tx, rx) = mpsc::unbounded_channel();
    (LogEventLayer::new(tx), LogDispatcher::new(rx))
}

/// `tracing` layer that republishes events as [`LogEvent`] values.
#[derive(Debug, Clone)]
pub struct LogEventLayer {
    tx: mpsc::UnboundedSender<LogEvent>,
}

impl LogEventLayer {
    pub fn new(tx: mpsc::UnboundedSender<LogEvent>) -> Self {
        Self { tx }
    }
}

impl<S: Subscriber> Layer<S> for LogEventLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        // Receiver gone means nobody is listening anymore
        let _ = self.tx.send(LogEvent::new(
            Severity::from(metadata.level()),
            metadata.target(),
            visitor.message,
        ));
    }
}

/// Extracts the formatted `message` field of an event.
#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

/// Fans published log events out to registered sinks.
pub struct LogDispatcher {
    rx: mpsc::UnboundedReceiver<LogEvent>,
    sinks: Vec<Box<dyn LogSink>>,
}

impl LogDispatcher {
    pub fn new(rx: mpsc::UnboundedReceiver<LogEvent>) -> Self {
        Self {
            rx,
            sinks: Vec::new(),
        }
    }

    /// Subscribe a sink to every subsequent event.
    pub fn register(&mut self, sink: impl LogSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Deliver one event to every sink, in registration order.
    pub async fn dispatch(&mut self, event: &LogEvent) {
        for sink in &mut self.sinks {
            sink.handle(event).await;
        }
    }

    /// Drain the channel until every [`LogEventLayer`] handle is dropped.
    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            self.dispatch(&event).await;
        }
    }
}

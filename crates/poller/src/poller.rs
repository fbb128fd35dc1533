use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use homework_common::error::BotError;
use homework_notifier::Notifier;

use crate::client::HomeworkSource;
use crate::status::parse_status;
use crate::validate::check_response;

/// Poller that periodically fetches homework status changes and notifies
/// about each one.
pub struct HomeworkPoller {
    source: Box<dyn HomeworkSource>,
    notifier: Arc<dyn Notifier>,
    retry_interval: Duration,
    /// Unix timestamp the next fetch starts from. Only advanced after a
    /// fully successful cycle.
    cursor: i64,
}

impl HomeworkPoller {
    /// The cursor starts one retry interval in the past.
    pub fn new(
        source: impl HomeworkSource + 'static,
        notifier: Arc<dyn Notifier>,
        retry_interval: Duration,
    ) -> Self {
        let lookback = i64::try_from(retry_interval.as_secs()).unwrap_or(i64::MAX);
        let cursor = Utc::now().timestamp().saturating_sub(lookback);
        Self {
            source: Box::new(source),
            notifier,
            retry_interval,
            cursor,
        }
    }

    /// Start from an explicit cursor instead of `now - retry_interval`.
    pub fn with_cursor(mut self, cursor: i64) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Start the polling loop. Runs indefinitely until the task is cancelled.
    pub async fn run(&mut self) {
        tracing::info!(
            from_date = self.cursor,
            retry_interval_secs = self.retry_interval.as_secs(),
            "Homework poller started"
        );

        loop {
            self.tick().await;
            // Full interval after failures too, so a broken API is not hammered
            tokio::time::sleep(self.retry_interval).await;
        }
    }

    /// Run one cycle and contain its failure. Never fails.
    pub async fn tick(&mut self) {
        match self.poll_once().await {
            Ok(sent) => {
                tracing::debug!(sent, from_date = self.cursor, "Cycle complete");
            }
            Err(e) => {
                tracing::error!(
                    error_kind = e.kind(),
                    remote = e.is_remote(),
                    from_date = self.cursor,
                    "Program failure: {e}"
                );
            }
        }
    }

    /// Fetch, validate and notify for every record, then advance the cursor.
    ///
    /// The first record that cannot be formatted aborts the cycle, leaving the
    /// cursor unchanged so the whole batch is fetched again next time.
    /// Returns the number of notifications attempted.
    pub async fn poll_once(&mut self) -> Result<usize, BotError> {
        let response = self.source.fetch(self.cursor).await?;
        let batch = check_response(&response)?;

        if batch.homeworks.is_empty() {
            tracing::info!(from_date = self.cursor, "No new homework statuses");
        }

        let mut delivered = 0usize;
        for homework in &batch.homeworks {
            let message = parse_status(homework)?;
            // Delivery failures are reported by the notifier and do not abort the cycle
            if self.notifier.notify(&message).await.is_delivered() {
                delivered += 1;
            }
        }

        if delivered < batch.homeworks.len() {
            tracing::warn!(
                delivered,
                total = batch.homeworks.len(),
                "Some status changes were not delivered"
            );
        }

        self.cursor = batch.current_date;
        Ok(batch.homeworks.len())
    }
}

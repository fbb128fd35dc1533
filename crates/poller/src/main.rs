use std::sync::Arc;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use homework_common::config::AppConfig;
use homework_notifier::{DedupLogSink, Notifier, TelegramNotifier, log_channel};
use homework_poller::client::PracticumClient;
use homework_poller::poller::HomeworkPoller;
use homework_poller::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing: console output plus the log sink channel
    let (log_layer, mut log_dispatcher) = log_channel();
    tracing_subscriber::registry()
        .with(
            telemetry::console_layer(std::io::stdout).with_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "homework_poller=info,homework_notifier=info".into()),
            ),
        )
        .with(log_layer.with_filter(LevelFilter::WARN))
        .init();

    tracing::info!("Homework bot starting...");

    // Load configuration
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Missing required configuration, the bot will not start");
            return Err(e.into());
        }
    };

    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(
        &config.telegram_api_url,
        &config.telegram_token,
        config.telegram_chat_id.clone(),
    )?);

    // Error-level log lines are forwarded to the same chat
    log_dispatcher.register(DedupLogSink::new(notifier.clone()));
    tokio::spawn(log_dispatcher.run());

    let client = PracticumClient::new(config.practicum_endpoint.clone(), &config.practicum_token)?;
    tracing::info!(
        endpoint = client.endpoint(),
        chat_id = %config.telegram_chat_id,
        "Polling homework statuses"
    );
    let mut poller = HomeworkPoller::new(client, notifier, config.retry_interval());

    // Run with graceful shutdown on Ctrl+C
    tokio::select! {
        _ = poller.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    tracing::info!("Homework bot stopped.");
    Ok(())
}

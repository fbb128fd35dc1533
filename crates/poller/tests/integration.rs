//! End-to-end tests for the poll cycle against mock Practicum and Telegram APIs.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use homework_common::error::BotError;
use homework_common::types::{LogEvent, Severity};
use homework_notifier::{DedupLogSink, LogEventLayer, LogSink, Notifier, TelegramNotifier};
use homework_poller::client::{ClientBuildError, HomeworkSource, PracticumClient};
use homework_poller::poller::HomeworkPoller;

const PRACTICUM_TOKEN: &str = "practicum-secret";
const TELEGRAM_TOKEN: &str = "123:bot-secret";
const CHAT_ID: &str = "777";

// ============================================================
// Shared helpers
// ============================================================

/// Start a Practicum mock that answers `from_date=<cursor>` with `template`.
async fn practicum(cursor: i64, template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user_api/homework_statuses/"))
        .and(header("Authorization", format!("OAuth {PRACTICUM_TOKEN}").as_str()))
        .and(query_param("from_date", cursor.to_string()))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

fn client_for(server: &MockServer) -> PracticumClient {
    PracticumClient::new(
        format!("{}/api/user_api/homework_statuses/", server.uri()),
        PRACTICUM_TOKEN,
    )
    .unwrap()
}

/// Start a Telegram mock that accepts every `sendMessage` call.
async fn telegram() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TELEGRAM_TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})))
        .mount(&server)
        .await;
    server
}

/// Poller starting from cursor 100.
fn poller_for(api: &MockServer, notifier: Arc<dyn Notifier>) -> HomeworkPoller {
    HomeworkPoller::new(client_for(api), notifier, Duration::from_secs(600)).with_cursor(100)
}

fn notifier_for(server: &MockServer) -> Arc<dyn Notifier> {
    Arc::new(TelegramNotifier::new(&server.uri(), TELEGRAM_TOKEN, CHAT_ID).unwrap())
}

async fn sent_texts(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|req| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
            body["text"].as_str().unwrap().to_string()
        })
        .collect()
}

fn drain(rx: &mut mpsc::UnboundedReceiver<LogEvent>) -> Vec<LogEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ============================================================
// PracticumClient
// ============================================================

#[tokio::test]
async fn test_client_returns_decoded_body() {
    let body = json!({"homeworks": [], "current_date": 10});
    let server = practicum(5, ResponseTemplate::new(200).set_body_json(body.clone())).await;

    let response = client_for(&server).fetch(5).await.unwrap();
    assert_eq!(response, body);
}

#[tokio::test]
async fn test_client_classifies_status_code() {
    let server = practicum(5, ResponseTemplate::new(500)).await;

    let err = client_for(&server).fetch(5).await.unwrap_err();
    assert!(matches!(err, BotError::StatusCode { code: 500, .. }), "{err:?}");
}

#[tokio::test]
async fn test_client_classifies_non_json_body() {
    let server = practicum(
        5,
        ResponseTemplate::new(200).set_body_raw("<html>maintenance</html>", "text/html"),
    )
    .await;

    let err = client_for(&server).fetch(5).await.unwrap_err();
    assert!(matches!(err, BotError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn test_client_classifies_transport_failure() {
    let client = PracticumClient::new("http://127.0.0.1:1/api/", PRACTICUM_TOKEN).unwrap();

    let err = client.fetch(5).await.unwrap_err();
    assert!(matches!(err, BotError::Transport { .. }), "{err:?}");
    assert!(!err.to_string().contains(PRACTICUM_TOKEN));
}

#[tokio::test]
async fn test_client_keeps_configured_endpoint() {
    let server = practicum(5, ResponseTemplate::new(200)).await;
    let client = client_for(&server);

    assert_eq!(
        client.endpoint(),
        format!("{}/api/user_api/homework_statuses/", server.uri())
    );
}

#[test]
fn test_client_rejects_token_unusable_as_header() {
    let err = PracticumClient::new("http://practicum.test/api/", "bad\ntoken").unwrap_err();

    assert!(matches!(err, ClientBuildError::InvalidToken(_)), "{err:?}");
    assert!(err.to_string().contains("PRACTICUM_TOKEN"));
}

// ============================================================
// Full cycle
// ============================================================

#[tokio::test]
async fn test_status_change_delivered_to_telegram() {
    let api = practicum(
        100,
        ResponseTemplate::new(200).set_body_json(json!({
            "homeworks": [{"homework_name": "hw1", "status": "approved"}],
            "current_date": 1000
        })),
    )
    .await;
    let bot = telegram().await;
    let mut poller = poller_for(&api, notifier_for(&bot));

    assert_eq!(poller.poll_once().await, Ok(1));

    assert_eq!(
        sent_texts(&bot).await,
        vec!["Status changed for \"hw1\": Работа проверена: ревьюеру всё понравилось. Ура!"]
    );
    assert_eq!(poller.cursor(), 1000);
}

#[tokio::test]
async fn test_empty_batch_logs_info_and_advances() {
    let api = practicum(
        100,
        ResponseTemplate::new(200).set_body_json(json!({"homeworks": [], "current_date": 2000})),
    )
    .await;
    let bot = telegram().await;
    let mut poller = poller_for(&api, notifier_for(&bot));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _guard = tracing::subscriber::set_default(
        tracing_subscriber::registry().with(LogEventLayer::new(tx)),
    );

    poller.tick().await;

    assert!(sent_texts(&bot).await.is_empty());
    assert_eq!(poller.cursor(), 2000);
    let events = drain(&mut rx);
    let quiet: Vec<_> = events
        .iter()
        .filter(|e| e.severity == Severity::Info && e.message == "No new homework statuses")
        .collect();
    assert_eq!(quiet.len(), 1);
    assert!(events.iter().all(|e| e.severity < Severity::Error));
}

#[tokio::test]
async fn test_server_error_logged_once_and_cursor_kept() {
    let api = practicum(100, ResponseTemplate::new(500)).await;
    let bot = telegram().await;
    let mut poller = poller_for(&api, notifier_for(&bot));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _guard = tracing::subscriber::set_default(
        tracing_subscriber::registry().with(LogEventLayer::new(tx)),
    );

    poller.tick().await;

    assert_eq!(poller.cursor(), 100);
    let errors: Vec<LogEvent> = drain(&mut rx)
        .into_iter()
        .filter(|e| e.severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("500"), "{:?}", errors[0]);
}

#[tokio::test]
async fn test_repeated_failures_notify_once() {
    let api = practicum(100, ResponseTemplate::new(503)).await;
    let bot = telegram().await;
    let notifier = notifier_for(&bot);
    let mut poller = poller_for(&api, notifier.clone());
    let mut sink = DedupLogSink::new(notifier);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _guard = tracing::subscriber::set_default(
        tracing_subscriber::registry().with(LogEventLayer::new(tx)),
    );

    for _ in 0..3 {
        poller.tick().await;
        for event in drain(&mut rx) {
            sink.handle(&event).await;
        }
    }

    let texts = sent_texts(&bot).await;
    assert_eq!(texts.len(), 1, "{texts:?}");
    assert!(texts[0].contains("503"));
    assert_eq!(poller.cursor(), 100);
}

#[tokio::test]
async fn test_delivery_failure_is_not_echoed_to_telegram() {
    let api = practicum(
        100,
        ResponseTemplate::new(200).set_body_json(json!({
            "homeworks": [{"homework_name": "hw1", "status": "rejected"}],
            "current_date": 1000
        })),
    )
    .await;
    let bot = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({
            "chat_id": CHAT_ID,
            "text": "Status changed for \"hw1\": Работа проверена: у ревьюера есть замечания."
        })))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&bot)
        .await;
    let notifier = notifier_for(&bot);
    let mut poller = poller_for(&api, notifier.clone());
    let mut sink = DedupLogSink::new(notifier);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _guard = tracing::subscriber::set_default(
        tracing_subscriber::registry().with(LogEventLayer::new(tx)),
    );

    poller.tick().await;
    for event in drain(&mut rx) {
        sink.handle(&event).await;
    }

    // Only the status message reached Telegram
    assert_eq!(sent_texts(&bot).await.len(), 1);
    assert_eq!(poller.cursor(), 1000);
    assert_eq!(sink.last_message(), None);
}

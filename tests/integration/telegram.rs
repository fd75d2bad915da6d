//! Telegram delivery against a mock Bot API

use goldfinch::services::{Notification, Notifier, NotifierError, TelegramNotifier};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn notifier(server: &MockServer) -> TelegramNotifier {
    TelegramNotifier::with_client(server.uri(), "TEST", "42", reqwest::Client::new())
}

#[tokio::test]
async fn posts_html_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTEST/sendMessage"))
        .and(body_partial_json(json!({
            "chat_id": "42",
            "parse_mode": "HTML",
            "text": "<b>Trading bot stopped</b>\nSymbol: XAUUSDm"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    notifier(&server)
        .await
        .send(&Notification::shutdown("XAUUSDm"))
        .await
        .expect("delivered");
}

#[tokio::test]
async fn retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTEST/sendMessage"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/botTEST/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    notifier(&server)
        .await
        .send(&Notification::shutdown("XAUUSDm"))
        .await
        .expect("delivered on retry");

    let requests = server.received_requests().await.expect("recorded requests");
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTEST/sendMessage"))
        .respond_with(ResponseTemplate::new(400).set_body_string("chat not found"))
        .expect(1)
        .mount(&server)
        .await;

    let err = notifier(&server)
        .await
        .send(&Notification::shutdown("XAUUSDm"))
        .await
        .unwrap_err();

    match err {
        NotifierError::Api { status, body } => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(body, "chat not found");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn notify_delivers_in_background() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTEST/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    notifier(&server).await.notify(Notification::error(None, "fetch failed"));

    let mut delivered = false;
    for _ in 0..50 {
        let requests = server.received_requests().await.expect("recorded requests");
        if !requests.is_empty() {
            delivered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(delivered, "notification never reached the Bot API");
}

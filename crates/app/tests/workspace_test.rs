//! End-to-end tests of the wired stack: file store, rewrite worker,
//! reqwest transport and curl codec behind one session.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use courier::{AppConfig, start, start_with_store};
use courier_application::KeyValueStore;
use courier_domain::{
    BodyType, FileAttachment, HttpMethod, KeyValue, LoggedRequest, StoreKey, StoredValues,
    TabStatus, WELCOME_TAB_ID,
};
use courier_infrastructure::{InMemoryStore, JsonFileStore, TransportConfig, WORKSPACE_FILE};
use pretty_assertions::assert_eq;
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn config(dir: &Path) -> AppConfig {
    AppConfig {
        data_dir: dir.to_path_buf(),
        log_filter: "info".to_string(),
        transport: TransportConfig::default(),
        send_active: false,
    }
}

/// Answers one request with its own head as the body.
async fn echo_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut buffer = [0_u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let read = stream.read(&mut buffer).await.unwrap();
            if read == 0 {
                break;
            }
            head.extend_from_slice(&buffer[..read]);
        }
        let reply = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            head.len()
        );
        stream.write_all(reply.as_bytes()).await.unwrap();
        stream.write_all(&head).await.unwrap();
    });
    format!("http://{address}/echo")
}

#[tokio::test]
async fn test_workspace_and_tabs_survive_restart() {
    let dir = tempdir().unwrap();

    let id = {
        let mut courier = start(&config(dir.path())).await.unwrap();
        let id = courier.session.create_request().await.unwrap();
        courier.session.rename_request(&id, "Health check").await.unwrap();
        courier.session.set_recording(true).await.unwrap();
        id
    };
    assert!(dir.path().join(WORKSPACE_FILE).is_file());

    let courier = start(&config(dir.path())).await.unwrap();
    let summary = courier.summary();

    assert_eq!(summary.requests, 1);
    assert!(summary.recording);
    assert_eq!(summary.active_tab, id);
    assert_eq!(summary.tabs.len(), 1);
    assert_eq!(summary.tabs[0].title, "Health check");
    assert_eq!(summary.tabs[0].status, TabStatus::Idle);
}

#[tokio::test]
async fn test_send_forces_protected_headers_and_clears_rules() {
    let dir = tempdir().unwrap();
    let url = echo_server().await;
    let mut courier = start(&config(dir.path())).await.unwrap();
    courier.session.create_request().await.unwrap();
    courier
        .session
        .edit_active(|request| {
            request.set_url(url.clone());
            request.headers = vec![
                KeyValue::new("Cookie", "sid=42"),
                KeyValue::new("X-Plain", "yes"),
                KeyValue::disabled("X-Off", "no"),
            ];
        })
        .await
        .unwrap();

    let tab = courier.session.send_active().await.unwrap().unwrap();

    assert_eq!(tab.status(), TabStatus::Success);
    let response = tab.response().unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("text/plain"));
    let seen = response.body.to_lowercase();
    assert!(seen.contains("cookie: sid=42"));
    assert!(seen.contains("x-plain: yes"));
    assert!(!seen.contains("x-off"));
    assert_eq!(response.size, response.body.len() as u64);
    assert!(courier.rules.is_empty());
}

#[tokio::test]
async fn test_multipart_send_ignores_manual_content_type() {
    let dir = tempdir().unwrap();
    let url = echo_server().await;
    let mut courier = start(&config(dir.path())).await.unwrap();
    courier.session.create_request().await.unwrap();
    courier
        .session
        .edit_active(|request| {
            request.set_url(url.clone());
            request.method = HttpMethod::Post;
            request.body_type = BodyType::FormData;
            request.headers = vec![KeyValue::new("Content-Type", "application/json")];
            request.body_form = vec![KeyValue::file(
                "f",
                FileAttachment::new("a.png", vec![0x89, b'P', b'N', b'G']),
            )];
        })
        .await
        .unwrap();

    let tab = courier.session.send_active().await.unwrap().unwrap();

    assert_eq!(tab.status(), TabStatus::Success);
    let seen = tab.response().unwrap().body.to_lowercase();
    let head = seen.split("\r\n\r\n").next().unwrap();
    let content_types: Vec<&str> = head
        .lines()
        .filter(|line| line.starts_with("content-type:"))
        .collect();
    assert_eq!(content_types.len(), 1, "{seen}");
    assert!(content_types[0].starts_with("content-type: multipart/form-data; boundary="));
    assert!(courier.rules.is_empty());
}

#[tokio::test]
async fn test_unreadable_saved_request_keeps_the_others_on_disk() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join(WORKSPACE_FILE),
        serde_json::to_vec(&serde_json::json!({
            "rootRequests": [
                {"id": "a", "name": "A", "method": "GET"},
                {"id": "b", "name": "B", "method": "GET"},
                {"id": "c", "name": "C", "method": "BREW"}
            ]
        }))
        .unwrap(),
    )
    .unwrap();

    let mut courier = start(&config(dir.path())).await.unwrap();
    assert_eq!(courier.summary().requests, 2);
    courier.session.create_request().await.unwrap();

    let text = std::fs::read_to_string(dir.path().join(WORKSPACE_FILE)).unwrap();
    let document: serde_json::Value = serde_json::from_str(&text).unwrap();
    let names: Vec<&str> = document["rootRequests"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["A", "B", "New Request"]);
}

#[tokio::test]
async fn test_connection_failure_lands_on_the_tab() {
    let dir = tempdir().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let mut courier = start(&config(dir.path())).await.unwrap();
    courier.session.create_request().await.unwrap();
    courier
        .session
        .edit_active(|request| request.set_url(format!("http://{address}/")))
        .await
        .unwrap();

    let tab = courier.session.send_active().await.unwrap().unwrap();

    assert_eq!(tab.status(), TabStatus::Failed);
    assert!(!tab.error().unwrap().is_empty());
    assert!(courier.rules.is_empty());
}

#[tokio::test]
async fn test_launch_context_opens_captured_request() {
    let dir = tempdir().unwrap();
    let log = LoggedRequest::new("cap-1", "GET", "https://api.example.com/v1/users?page=2");
    std::fs::write(
        dir.path().join(WORKSPACE_FILE),
        serde_json::to_vec(&serde_json::json!({ "logs": [log] })).unwrap(),
    )
    .unwrap();

    let mut courier = start(&config(dir.path())).await.unwrap();
    assert!(courier.session.handle_launch_context("?logId=cap-1").await.unwrap());

    let active = courier.session.active_request().unwrap();
    assert_eq!(active.id, "cap-1");
    assert_eq!(active.name, "/v1/users");
    assert_eq!(active.params.len(), 1);
    assert_eq!(courier.summary().tabs.len(), 1);
}

#[tokio::test]
async fn test_two_sessions_on_one_store_stay_in_step() {
    let store = Arc::new(InMemoryStore::new());
    let mut first = start_with_store(store.clone(), &TransportConfig::default())
        .await
        .unwrap();
    let mut second = start_with_store(store.clone(), &TransportConfig::default())
        .await
        .unwrap();
    let mut changes = second.session.subscribe();

    let collection = first.session.create_collection().await.unwrap();
    first
        .session
        .rename_collection(&collection, "Billing")
        .await
        .unwrap();

    for _ in 0..2 {
        let event = changes.next_event().await.unwrap();
        second.session.handle_sync_event(event).await.unwrap();
    }

    let names: Vec<_> = second
        .session
        .workspace()
        .collections
        .iter()
        .map(|c| c.name.clone())
        .collect();
    assert_eq!(names, vec!["Billing".to_string()]);
    // Tabs are not shared between sessions.
    assert_eq!(second.session.tabs().active_id(), WELCOME_TAB_ID);
    changes.stop();
}

#[tokio::test]
async fn test_curl_round_trip_through_the_session() {
    let dir = tempdir().unwrap();
    let mut courier = start(&config(dir.path())).await.unwrap();

    let id = courier
        .session
        .import_curl("curl -X PATCH 'https://api.example.com/items/7' -H 'Accept: application/json' -d '{\"done\":true}'")
        .await
        .unwrap();
    let exported = courier.session.export_curl(&id).unwrap();

    assert!(exported.starts_with("curl \\\n  -X PATCH \\\n  'https://api.example.com/items/7'"));
    assert!(exported.contains("-H 'Accept: application/json'"));
    assert!(exported.contains("--data-raw '{\"done\":true}'"));
    assert!(courier.session.import_curl("not curl at all").await.is_err());
    assert_eq!(courier.summary().requests, 1);
}

#[tokio::test]
async fn test_capture_written_by_another_process_reaches_the_session() {
    let dir = tempdir().unwrap();
    let mut courier = start(&config(dir.path())).await.unwrap();
    courier.session.create_request().await.unwrap();
    let mut changes = courier.session.subscribe();

    let capture = JsonFileStore::open(dir.path()).await.unwrap();
    let log = LoggedRequest::new("cap-9", "POST", "https://api.example.com/login");
    capture
        .set(StoredValues::from([(
            StoreKey::Logs,
            serde_json::to_value(vec![log]).unwrap(),
        )]))
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(10), async {
        while courier.session.workspace().logs.is_empty() {
            let event = changes.next_event().await.unwrap();
            courier.session.handle_sync_event(event).await.unwrap();
        }
    })
    .await
    .unwrap();

    assert_eq!(courier.session.workspace().logs[0].id, "cap-9");
    assert_eq!(courier.summary().requests, 1);
    let text = std::fs::read_to_string(dir.path().join(WORKSPACE_FILE)).unwrap();
    assert!(text.contains("cap-9"));
    assert!(text.contains("New Request"));
}

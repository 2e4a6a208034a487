use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use courier_api::coordinator::DualWriteCoordinator;
use courier_bus::{PublishError, Publisher};
use courier_db::models::MessageRecord;
use courier_db::{Store, StoreError};

struct RecordingPublisher {
    calls: AtomicUsize,
    payloads: Mutex<Vec<(String, Vec<u8>)>>,
    fail: bool,
}

impl RecordingPublisher {
    fn healthy() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            payloads: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            payloads: Mutex::new(Vec::new()),
            fail: true,
        })
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PublishError::Publish {
                channel: channel.to_string(),
                reason: "simulated outage".to_string(),
            });
        }
        self.payloads
            .lock()
            .unwrap()
            .push((channel.to_string(), payload.to_vec()));
        Ok(())
    }
}

struct RecordingStore {
    inserts: AtomicUsize,
    rows: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingStore {
    fn healthy() -> Arc<Self> {
        Arc::new(Self {
            inserts: AtomicUsize::new(0),
            rows: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            inserts: AtomicUsize::new(0),
            rows: Mutex::new(Vec::new()),
            fail: true,
        })
    }
}

#[async_trait]
impl Store for RecordingStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert(&self, content: &str) -> Result<MessageRecord, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StoreError::Query(sqlx::Error::PoolTimedOut));
        }
        let mut rows = self.rows.lock().unwrap();
        rows.push(content.to_string());
        Ok(MessageRecord {
            id: rows.len() as i32,
            content: content.to_string(),
            timestamp: Some(chrono::Utc::now()),
        })
    }
}

/// Spin up the HTTP server on an OS-assigned port, returning the base URL.
async fn spawn_test_server(
    publisher: Option<Arc<RecordingPublisher>>,
    store: Option<Arc<RecordingStore>>,
) -> String {
    let coordinator = Arc::new(DualWriteCoordinator::new(
        publisher.map(|p| p as Arc<dyn Publisher>),
        store.map(|s| s as Arc<dyn Store>),
        "messages",
    ));
    let app = courier_api::router(coordinator);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn health_returns_ok_without_touching_collaborators() {
    let publisher = RecordingPublisher::healthy();
    let store = RecordingStore::healthy();
    let base = spawn_test_server(Some(publisher.clone()), Some(store.clone())).await;

    let resp = reqwest::get(format!("{}/health", base)).await.unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok"}));
    assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn post_message_publishes_and_persists() {
    let publisher = RecordingPublisher::healthy();
    let store = RecordingStore::healthy();
    let base = spawn_test_server(Some(publisher.clone()), Some(store.clone())).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/message", base))
        .json(&json!({"message": "hello"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"status": "message processed"}));

    let payloads = publisher.payloads.lock().unwrap();
    assert_eq!(
        payloads.as_slice(),
        &[("messages".to_string(), b"hello".to_vec())]
    );
    assert_eq!(store.rows.lock().unwrap().as_slice(), &["hello".to_string()]);
}

#[tokio::test]
async fn post_without_message_field_is_rejected_before_any_write() {
    let publisher = RecordingPublisher::healthy();
    let store = RecordingStore::healthy();
    let base = spawn_test_server(Some(publisher.clone()), Some(store.clone())).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/message", base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({"error": "Invalid request. 'message' field required."})
    );
    assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn post_with_empty_message_is_rejected() {
    let store = RecordingStore::healthy();
    let base = spawn_test_server(None, Some(store.clone())).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/message", base))
        .json(&json!({"message": ""}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn post_with_non_string_message_is_rejected() {
    let store = RecordingStore::healthy();
    let base = spawn_test_server(None, Some(store.clone())).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/message", base))
        .json(&json!({"message": 42}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn post_with_malformed_body_is_rejected() {
    let store = RecordingStore::healthy();
    let base = spawn_test_server(None, Some(store.clone())).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/message", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({"error": "Invalid request. 'message' field required."})
    );
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn publish_failure_still_accepts_the_message() {
    let publisher = RecordingPublisher::failing();
    let store = RecordingStore::healthy();
    let base = spawn_test_server(Some(publisher.clone()), Some(store.clone())).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/message", base))
        .json(&json!({"message": "hello"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 201);
    assert_eq!(publisher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.rows.lock().unwrap().as_slice(), &["hello".to_string()]);
}

#[tokio::test]
async fn store_failure_returns_opaque_500() {
    let publisher = RecordingPublisher::healthy();
    let store = RecordingStore::failing();
    let base = spawn_test_server(Some(publisher), Some(store)).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/message", base))
        .json(&json!({"message": "hello"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"error": "Database operation failed."}));
}

#[tokio::test]
async fn unconfigured_store_returns_distinct_500() {
    let base = spawn_test_server(None, None).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/message", base))
        .json(&json!({"message": "hello"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"error": "Database not configured."}));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let base = spawn_test_server(None, None).await;

    let resp = reqwest::get(format!("{}/nonexistent", base)).await.unwrap();

    assert_eq!(resp.status(), 404);
}

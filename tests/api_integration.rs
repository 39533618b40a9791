#![cfg(feature = "api")]

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lecture_graph::api::{server, AppState};
use lecture_graph::config::ConfigBuilder;
use lecture_graph::graph::GraphData;
use lecture_graph::store::{LectureRecord, ProcessingResults};
use lecture_graph::upload::{RegisterLectureRequest, UploadTargetRequest};
use lecture_graph::{
    JsonLectureStore, LectureGraphClient, LectureGraphError, LectureStore, ObjectStorage,
    ProcessingNotifier, UploadPipeline, UploadProgress,
};

/// Signs URLs pointing at a mock bucket
struct MockBucket {
    base: String,
}

#[async_trait]
impl ObjectStorage for MockBucket {
    async fn presign_put(
        &self,
        key: &str,
        _content_type: &str,
        expires_in: Duration,
    ) -> lecture_graph::Result<String> {
        Ok(format!(
            "{}/lecture-graph/{}?X-Amz-Expires={}&X-Amz-Signature=test",
            self.base,
            key,
            expires_in.as_secs()
        ))
    }

    fn public_url(&self, key: &str) -> Option<String> {
        Some(format!("https://media.test/{}", key))
    }
}

/// Store whose writes always fail
struct BrokenStore;

#[async_trait]
impl LectureStore for BrokenStore {
    async fn create_lecture(&self, _record: LectureRecord) -> lecture_graph::Result<LectureRecord> {
        Err(LectureGraphError::Persistence("disk full".to_string()))
    }

    async fn get_lecture(&self, id: &str) -> lecture_graph::Result<LectureRecord> {
        Err(LectureGraphError::NotFound(id.to_string()))
    }

    async fn list_lectures(&self) -> lecture_graph::Result<Vec<LectureRecord>> {
        Ok(Vec::new())
    }

    async fn save_processing_results(
        &self,
        id: &str,
        _results: ProcessingResults,
    ) -> lecture_graph::Result<LectureRecord> {
        Err(LectureGraphError::NotFound(id.to_string()))
    }
}

async fn start_server(store: Arc<dyn LectureStore>, bucket_url: &str, backend_url: &str) -> String {
    let config = ConfigBuilder::new().with_backend_url(backend_url).build();
    let state = AppState {
        store,
        storage: Arc::new(MockBucket {
            base: bucket_url.to_string(),
        }),
        notifier: ProcessingNotifier::new(&config.backend).unwrap(),
        config: Arc::new(config),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, state));
    format!("http://{}", addr)
}

async fn json_store() -> (TempDir, Arc<JsonLectureStore>) {
    let dir = TempDir::new().unwrap();
    let store = JsonLectureStore::open(dir.path().to_path_buf()).await.unwrap();
    (dir, Arc::new(store))
}

fn client(base: &str) -> LectureGraphClient {
    LectureGraphClient::new(base, Duration::from_secs(5)).unwrap()
}

async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<wiremock::Request> {
    for _ in 0..50 {
        let received = server.received_requests().await.unwrap_or_default();
        if received.len() >= count {
            return received;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    server.received_requests().await.unwrap_or_default()
}

#[tokio::test]
async fn test_full_upload_pipeline() {
    let bucket = MockServer::start().await;
    let backend = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/lecture-graph/[0-9a-f-]{36}-lecture\.mp4$"))
        .and(header("content-type", "video/mp4"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&bucket)
        .await;
    Mock::given(method("POST"))
        .and(path("/process-lecture"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&backend)
        .await;

    let (_dir, store) = json_store().await;
    let base = start_server(store.clone(), &bucket.uri(), &backend.uri()).await;

    let files = TempDir::new().unwrap();
    let video = files.path().join("lecture.mp4");
    tokio::fs::write(&video, vec![7u8; 1000]).await.unwrap();

    let pipeline = UploadPipeline::with_client(client(&base), 64);
    let (progress_tx, progress_rx) = watch::channel(UploadProgress::default());

    let outcome = assert_ok!(
        pipeline
            .run(&video, Some("Signals and Systems".to_string()), progress_tx)
            .await
    );

    assert_eq!(outcome.bytes, 1000);
    assert_eq!(
        *progress_rx.borrow(),
        UploadProgress {
            bytes_sent: 1000,
            bytes_total: 1000
        }
    );

    let record = store.get_lecture(&outcome.record_id).await.unwrap();
    assert_eq!(record.title, "Signals and Systems");
    assert_eq!(record.storage_key, outcome.storage_key);
    assert_eq!(
        record.url.as_deref(),
        Some(format!("https://media.test/{}", outcome.storage_key).as_str())
    );

    let triggers = wait_for_requests(&backend, 1).await;
    assert_eq!(triggers.len(), 1);
    let query: Vec<(String, String)> = triggers[0].url.query_pairs().into_owned().collect();
    assert!(query.contains(&("video_id".to_string(), outcome.record_id.clone())));
    assert!(query.contains(&("file_path".to_string(), outcome.storage_key.clone())));
}

#[tokio::test]
async fn test_empty_filename_rejected_before_network() {
    let (_dir, store) = json_store().await;
    let base = start_server(store, "http://127.0.0.1:9", "http://127.0.0.1:9").await;

    let err = assert_err!(
        client(&base)
            .request_upload_target(&UploadTargetRequest::new("", "video/mp4"))
            .await
    );
    assert!(matches!(err, LectureGraphError::Validation(_)));
}

#[tokio::test]
async fn test_upload_endpoint_returns_400_for_missing_fields() {
    let (_dir, store) = json_store().await;
    let base = start_server(store, "http://127.0.0.1:9", "http://127.0.0.1:9").await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/upload", base))
        .json(&serde_json::json!({"filename": "talk.mp4"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Validation error: Filename and contentType are required");
}

#[tokio::test]
async fn test_upload_target_uses_configured_expiry() {
    let (_dir, store) = json_store().await;
    let base = start_server(store, "http://bucket.test", "http://127.0.0.1:9").await;

    let target = client(&base)
        .request_upload_target(&UploadTargetRequest::new("talk.mp4", "video/mp4"))
        .await
        .unwrap();

    assert!(target.key.ends_with("-talk.mp4"));
    assert!(target.url.contains("X-Amz-Expires=3600"));
}

#[tokio::test]
async fn test_notification_failure_still_reports_success() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process-lecture"))
        .and(query_param("file_path", "abc-talk.mp4"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&backend)
        .await;

    let (_dir, store) = json_store().await;
    let base = start_server(store.clone(), "http://127.0.0.1:9", &backend.uri()).await;

    let record_id = assert_ok!(
        client(&base)
            .register_lecture(&RegisterLectureRequest {
                title: "Thermodynamics".to_string(),
                storage_key: "abc-talk.mp4".to_string(),
            })
            .await
    );

    assert!(store.get_lecture(&record_id).await.is_ok());
    // the trigger was attempted even though nobody saw it fail
    assert_eq!(wait_for_requests(&backend, 1).await.len(), 1);
}

#[tokio::test]
async fn test_unreachable_backend_still_reports_success() {
    let (_dir, store) = json_store().await;
    let base = start_server(store, "http://127.0.0.1:9", "http://127.0.0.1:9").await;

    let result = client(&base)
        .register_lecture(&RegisterLectureRequest {
            title: "Optics".to_string(),
            storage_key: "k-optics.mp4".to_string(),
        })
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_transfer_failure_halts_pipeline() {
    let bucket = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403).set_body_string("SignatureDoesNotMatch"))
        .mount(&bucket)
        .await;

    let (_dir, store) = json_store().await;
    let base = start_server(store.clone(), &bucket.uri(), "http://127.0.0.1:9").await;

    let files = TempDir::new().unwrap();
    let video = files.path().join("lecture.mp4");
    tokio::fs::write(&video, b"not really a video").await.unwrap();

    let pipeline = UploadPipeline::with_client(client(&base), 1024);
    let (progress_tx, _progress_rx) = watch::channel(UploadProgress::default());
    let err = assert_err!(pipeline.run(&video, None, progress_tx).await);

    assert!(matches!(err, LectureGraphError::Transfer(_)));
    // registration never ran
    assert!(store.list_lectures().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_persistence_failure_surfaces_message() {
    let base = start_server(Arc::new(BrokenStore), "http://127.0.0.1:9", "http://127.0.0.1:9").await;

    let err = assert_err!(
        client(&base)
            .register_lecture(&RegisterLectureRequest {
                title: "Calculus".to_string(),
                storage_key: "k-calc.mp4".to_string(),
            })
            .await
    );

    match err {
        LectureGraphError::Persistence(msg) => assert_eq!(msg, "disk full"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_registration_requires_fields() {
    let (_dir, store) = json_store().await;
    let base = start_server(store, "http://127.0.0.1:9", "http://127.0.0.1:9").await;

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/api/lectures", base))
        .json(&serde_json::json!({"title": "No key"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("storageKey"));
}

#[tokio::test]
async fn test_missing_lecture_is_not_found() {
    let (_dir, store) = json_store().await;
    let base = start_server(store, "http://127.0.0.1:9", "http://127.0.0.1:9").await;

    let err = assert_err!(client(&base).get_lecture("no-such-lecture").await);
    assert!(matches!(err, LectureGraphError::NotFound(_)));

    let status = reqwest::get(format!("{}/api/lectures/no-such-lecture/graph", base))
        .await
        .unwrap()
        .status();
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_results_drive_graph_and_concept_views() {
    let (_dir, store) = json_store().await;
    let record = store
        .create_lecture(LectureRecord::new("ML 101".into(), "k-ml.mp4".into(), None))
        .await
        .unwrap();
    let base = start_server(store.clone(), "http://127.0.0.1:9", "http://127.0.0.1:9").await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{}/api/lectures/{}/results", base, record.id))
        .json(&serde_json::json!({
            "transcript": "today we cover perceptrons",
            "concepts": [
                {"id": "C", "name": "Backprop", "definition": "Chain rule", "timestamp": 90.0},
                {"id": "A", "name": "Perceptron", "definition": "Linear unit", "timestamp": 0.0},
                {"id": "B", "name": "Gradient", "timestamp": 30.0}
            ],
            "relationships": [
                {"sourceId": "A", "targetId": "B", "type": "precedes"},
                {"sourceId": "B", "targetId": "C"}
            ]
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let graph: GraphData = client(&base).lecture_graph(&record.id, 45.0).await.unwrap();
    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.links.len(), 2);
    assert_eq!(graph.active_node_id.as_ref().map(|id| id.as_str()), Some("B"));

    let before: GraphData = client(&base).lecture_graph(&record.id, -1.0).await.unwrap();
    assert!(before.active_node_id.is_none());

    let entries: serde_json::Value = http
        .get(format!("{}/api/lectures/{}/concepts?t=95&q=back", base, record.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["id"], "C");
    assert_eq!(entries[0]["active"], true);
    assert_eq!(entries[0]["displayTime"], "01:30");

    let listed: serde_json::Value = reqwest::get(format!("{}/api/lectures", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed[0]["conceptCount"], 3);
    assert_eq!(listed[0]["processed"], true);
}

#[tokio::test]
async fn test_results_reject_negative_timestamps() {
    let (_dir, store) = json_store().await;
    let record = store
        .create_lecture(LectureRecord::new("Bad".into(), "k-bad.mp4".into(), None))
        .await
        .unwrap();
    let base = start_server(store, "http://127.0.0.1:9", "http://127.0.0.1:9").await;

    let status = reqwest::Client::new()
        .post(format!("{}/api/lectures/{}/results", base, record.id))
        .json(&serde_json::json!({
            "concepts": [{"name": "Oops", "timestamp": -3.0}]
        }))
        .send()
        .await
        .unwrap()
        .status();

    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_results_reject_duplicate_concept_ids() {
    let (_dir, store) = json_store().await;
    let record = store
        .create_lecture(LectureRecord::new("Dup".into(), "k-dup.mp4".into(), None))
        .await
        .unwrap();
    let base = start_server(store.clone(), "http://127.0.0.1:9", "http://127.0.0.1:9").await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/lectures/{}/results", base, record.id))
        .json(&serde_json::json!({
            "concepts": [
                {"id": "dup", "name": "A", "timestamp": 10.0},
                {"id": "dup", "name": "B", "timestamp": 50.0}
            ]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("duplicate concept id 'dup'"));
    assert!(store.get_lecture(&record.id).await.unwrap().concepts.is_empty());
}

#[tokio::test]
async fn test_graph_and_list_agree_on_signed_zero() {
    let (_dir, store) = json_store().await;
    let record = store
        .create_lecture(LectureRecord::new("Zero".into(), "k-zero.mp4".into(), None))
        .await
        .unwrap();
    let base = start_server(store, "http://127.0.0.1:9", "http://127.0.0.1:9").await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{}/api/lectures/{}/results", base, record.id))
        .header("content-type", "application/json")
        .body(r#"{"concepts":[{"id":"x","name":"X","timestamp":0.0},{"id":"y","name":"Y","timestamp":-0.0}]}"#)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let graph: GraphData = client(&base).lecture_graph(&record.id, 0.0).await.unwrap();
    let entries: serde_json::Value = http
        .get(format!("{}/api/lectures/{}/concepts?t=0", base, record.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed_active = entries
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["active"] == true)
        .map(|e| e["id"].as_str().unwrap().to_string());

    assert_eq!(graph.active_node_id.as_ref().map(|id| id.as_str()), Some("y"));
    assert_eq!(listed_active.as_deref(), Some("y"));
}

#[tokio::test]
async fn test_malformed_bodies_get_json_errors() {
    let (_dir, store) = json_store().await;
    let record = store
        .create_lecture(LectureRecord::new("Body".into(), "k-body.mp4".into(), None))
        .await
        .unwrap();
    let base = start_server(store, "http://127.0.0.1:9", "http://127.0.0.1:9").await;
    let http = reqwest::Client::new();

    for url in [
        format!("{}/api/upload", base),
        format!("{}/api/lectures/{}/results", base, record.id),
    ] {
        let response = http
            .post(&url)
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST, "{}", url);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Validation error:"));
    }

    // no content type at all
    let response = http
        .post(format!("{}/api/upload", base))
        .body(r#"{"filename":"a.mp4","contentType":"video/mp4"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].is_string());

    let registered: serde_json::Value = http
        .post(format!("{}/api/lectures", base))
        .header("content-type", "application/json")
        .body("[1, 2")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(registered["success"], false);
    assert!(registered["error"].is_string());
}

#[tokio::test]
async fn test_health() {
    let (_dir, store) = json_store().await;
    let base = start_server(store, "http://127.0.0.1:9", "http://127.0.0.1:9").await;

    let body: serde_json::Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "lecture-graph");
}

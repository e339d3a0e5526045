#![allow(dead_code)]

use civitai_mirror::download::{DownloadEngine, EngineConfig, FailureLog};
use civitai_mirror::http::{create_http_client, HttpClientConfig};
use civitai_mirror::{MirrorBuilder, RetryPolicy};

use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Common test constants
pub const MODELS_PATH: &str = "/api/v1/models";
pub const TEST_TOKEN: &str = "test-token";
pub const TEST_DELAY: Duration = Duration::from_millis(10);

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Models endpoint of a mock server.
pub fn api_base(server: &MockServer) -> String {
    format!("{}{}", server.uri(), MODELS_PATH)
}

/// A hidden mirror builder writing below `root`, with fast retries.
pub fn test_builder(server: &MockServer, root: &Path) -> MirrorBuilder {
    MirrorBuilder::hidden()
        .directory(root.join("downloads"))
        .logs_directory(root.join("logs"))
        .api_base(api_base(server))
        .token(TEST_TOKEN)
        .retries(3)
        .retry_delay(TEST_DELAY)
}

/// An engine with fast retries and its failure log at `root/failed.txt`.
pub async fn test_engine(root: &Path, max_attempts: u32) -> (DownloadEngine, Arc<FailureLog>) {
    let client = create_http_client(HttpClientConfig::default()).expect("Failed to create client");
    let failures = Arc::new(
        FailureLog::create(root.join("failed.txt"), "alice")
            .await
            .expect("Failed to create failure log"),
    );
    let config = EngineConfig {
        retry: RetryPolicy::new(max_attempts, TEST_DELAY),
        min_weights_size: 1024,
        token: TEST_TOKEN.into(),
        nsfw: true,
    };
    (DownloadEngine::new(client, config, failures.clone()), failures)
}

// === Catalog fixtures ===

pub fn file_json(name: &str, url: &str) -> Value {
    json!({"name": name, "downloadUrl": url, "type": "Model"})
}

pub fn image_json(id: u64, url: &str) -> Value {
    json!({"id": id, "url": url, "type": "image"})
}

pub fn version_json(name: &str, files: Vec<Value>, images: Vec<Value>) -> Value {
    json!({
        "name": name,
        "baseModel": null,
        "trainedWords": ["trigger"],
        "files": files,
        "images": images,
    })
}

pub fn item_json(id: u64, name: &str, kind: &str, versions: Vec<Value>) -> Value {
    json!({
        "id": id,
        "name": name,
        "type": kind,
        "description": "<p>An <b>example</b> item</p>",
        "modelVersions": versions,
    })
}

pub fn page_json(items: Vec<Value>, next_page: Option<String>) -> Value {
    match next_page {
        Some(next) => json!({"items": items, "metadata": {"nextPage": next}}),
        None => json!({"items": items, "metadata": {"totalItems": 0}}),
    }
}

/// Serve `page` as the first catalog page of `creator`.
pub async fn mount_first_page(server: &MockServer, creator: &str, page: Value) {
    Mock::given(method("GET"))
        .and(path(MODELS_PATH))
        .and(query_param("username", creator))
        .respond_with(ResponseTemplate::new(200).set_body_json(page))
        .with_priority(5)
        .mount(server)
        .await;
}

/// Serve `page` for the continuation `cursor`.
pub async fn mount_cursor_page(server: &MockServer, cursor: &str, page: Value) {
    Mock::given(method("GET"))
        .and(path(MODELS_PATH))
        .and(query_param("cursor", cursor))
        .respond_with(ResponseTemplate::new(200).set_body_json(page))
        .with_priority(1)
        .mount(server)
        .await;
}

/// Continuation URL for `cursor`, the way the API announces it.
pub fn cursor_url(server: &MockServer, creator: &str, cursor: &str) -> String {
    format!("{}?username={creator}&cursor={cursor}", api_base(server))
}

/// Serve `body` at `route` as an image.
pub async fn mount_image(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_vec(), "image/png"))
        .mount(server)
        .await;
}

/// Serve `body` at `route` as an opaque file.
pub async fn mount_file(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.to_vec(), "application/octet-stream"),
        )
        .mount(server)
        .await;
}

/// Creates test file content of specified size
pub fn create_test_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// Asserts that a file exists at the given path
pub fn assert_file_exists(path: &Path) {
    assert!(path.exists(), "File should exist at path: {:?}", path);
}

//! End-to-end tests running whole request sequences against the full router.

use crate::Application;
use crate::api::models::files::UploadResponse;
use crate::storage::MemoryStore;
use crate::test_utils::{FixedClock, create_test_server_with, create_test_state};
use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use std::future::IntoFuture;
use std::sync::Arc;
use tempfile::TempDir;

fn server() -> (TestServer, TempDir) {
    create_test_server_with(Arc::new(MemoryStore::new()), Arc::new(FixedClock::epoch()))
}

async fn upload(server: &TestServer, name: &str, contents: Vec<u8>) -> UploadResponse {
    let form = MultipartForm::new().add_part("file", Part::bytes(contents).file_name(name));
    let response = server.post("/upload").multipart(form).await;
    response.assert_status(StatusCode::OK);
    response.json()
}

fn occurrences(html: &str, needle: &str) -> usize {
    html.matches(needle).count()
}

#[test_log::test(tokio::test)]
async fn test_uploaded_file_is_listed_once() {
    let (server, _scratch) = server();

    upload(&server, "a.txt", b"first".to_vec()).await;
    let html = server.get("/upload").await.text();
    assert_eq!(occurrences(&html, r#"href="/file/a.txt""#), 1);

    // Same name again overwrites rather than duplicating
    upload(&server, "a.txt", b"second".to_vec()).await;
    let html = server.get("/upload").await.text();
    assert_eq!(occurrences(&html, r#"href="/file/a.txt""#), 1);
}

#[test_log::test(tokio::test)]
async fn test_download_is_byte_identical_to_upload() {
    let (server, _scratch) = server();

    let contents: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
    let uploaded = upload(&server, "data.bin", contents.clone()).await;
    assert_eq!(uploaded.filename, "data.bin");

    let response = server.get("/file/data.bin").await;

    response.assert_status(StatusCode::OK);
    assert_eq!(response.as_bytes().as_ref(), contents.as_slice());
}

#[test_log::test(tokio::test)]
async fn test_overwritten_file_downloads_latest_contents() {
    let (server, _scratch) = server();

    upload(&server, "notes.md", b"draft".to_vec()).await;
    upload(&server, "notes.md", b"final".to_vec()).await;

    let response = server.get("/file/notes.md").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.text(), "final");
}

#[test_log::test(tokio::test)]
async fn test_name_with_spaces_round_trips_through_listing_link() {
    let (server, _scratch) = server();

    upload(&server, "my report.txt", b"quarterly".to_vec()).await;

    let html = server.get("/upload").await.text();
    assert!(html.contains(r#"href="/file/my%20report.txt""#));

    let response = server.get("/file/my%20report.txt").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.text(), "quarterly");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_downloads_of_one_file_are_all_complete() {
    let (server, _scratch) = server();

    let contents: Vec<u8> = (0..=255u8).cycle().take(4 * 1024 * 1024).collect();
    upload(&server, "large.bin", contents.clone()).await;

    for _ in 0..10 {
        let responses = tokio::join!(
            server.get("/file/large.bin").into_future(),
            server.get("/file/large.bin").into_future(),
            server.get("/file/large.bin").into_future(),
            server.get("/file/large.bin").into_future(),
        );

        for response in [responses.0, responses.1, responses.2, responses.3] {
            response.assert_status(StatusCode::OK);
            assert!(response.as_bytes().as_ref() == contents.as_slice(), "download body was corrupted");
        }
    }
}

#[test_log::test(tokio::test)]
async fn test_nonexistent_file_is_500_with_message() {
    let (server, _scratch) = server();

    let response = server.get("/file/never-uploaded.txt").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().starts_with("Failed to download file"));
}

#[test_log::test(tokio::test)]
async fn test_unknown_route_is_json_404() {
    let (server, _scratch) = server();

    let response = server.get("/does/not/exist").await;

    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&serde_json::json!({ "error": "Route /does/not/exist not found" }));
}

#[test_log::test(tokio::test)]
async fn test_docs_are_served() {
    let (server, _scratch) = server();

    let response = server.get("/docs").await;

    response.assert_status(StatusCode::OK);
    assert!(response.text().contains("<html"));
}

// The only test enabling metrics: the Prometheus recorder is process-global and can be installed once
#[test_log::test(tokio::test)]
async fn test_metrics_count_requests_when_enabled() {
    let scratch = tempfile::tempdir().unwrap();
    let mut state = create_test_state(
        Arc::new(MemoryStore::new()),
        Arc::new(FixedClock::epoch()),
        scratch.path(),
    );
    state.config.enable_metrics = true;
    let server = Application::from_state(state).into_test_server();

    server.get("/up").await.assert_status(StatusCode::OK);

    let response = server.get("/internal/metrics").await;
    response.assert_status(StatusCode::OK);
    assert!(response.text().contains("axum_http_requests_total"));
}

#[test_log::test(tokio::test)]
async fn test_metrics_route_absent_by_default() {
    let (server, _scratch) = server();

    server.get("/internal/metrics").await.assert_status(StatusCode::NOT_FOUND);
}

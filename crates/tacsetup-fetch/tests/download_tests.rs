//! Integration tests for the downloader
//!
//! Tests cover:
//! - Streamed download with progress terminating at 100
//! - The empty-body-with-200 failure rule
//! - Non-success HTTP statuses
//! - Transfer-log diagnostics
//! - Release lookup against a mocked API

use std::fs;

use tacsetup_fetch::{DownloadError, Downloader, ReleaseClient};
use tacsetup_ui::Progress;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Progress sink recording every event it receives.
#[derive(Default)]
struct RecordingProgress {
    events: Vec<(u8, String)>,
}

impl Progress for RecordingProgress {
    fn set(&mut self, percent: u8, message: &str) {
        self.events.push((percent, message.to_string()));
    }

    fn message(&mut self, message: &str) {
        self.events.push((0, message.to_string()));
    }

    fn finish(&mut self) {}
}

#[tokio::test]
async fn test_fetch_writes_artifact_and_completes_progress() {
    let server = MockServer::start().await;
    let body = vec![0xabu8; 64 * 1024];
    Mock::given(method("GET"))
        .and(path("/release/tac-writer_26.02.15_amd64.deb"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("tac-writer_26.02.15_amd64.deb");
    let mut progress = RecordingProgress::default();

    Downloader::new()
        .unwrap()
        .fetch(
            &format!("{}/release/tac-writer_26.02.15_amd64.deb", server.uri()),
            &dest,
            &mut progress,
        )
        .await
        .unwrap();

    assert_eq!(fs::read(&dest).unwrap(), body);
    let (last_percent, last_message) = progress.events.last().unwrap();
    assert_eq!(*last_percent, 100);
    assert_eq!(last_message, "Download complete");
}

#[tokio::test]
async fn test_fetch_percentages_are_monotonic() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/artifact"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 8192]))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("artifact");
    let mut progress = RecordingProgress::default();

    Downloader::new()
        .unwrap()
        .fetch(&format!("{}/artifact", server.uri()), &dest, &mut progress)
        .await
        .unwrap();

    let percents: Vec<u8> = progress.events.iter().map(|(p, _)| *p).collect();
    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(*percents.last().unwrap(), 100);
}

#[tokio::test]
async fn test_empty_body_with_200_is_a_download_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(Vec::new()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("empty.deb");
    let mut progress = RecordingProgress::default();

    let err = Downloader::new()
        .unwrap()
        .fetch(&format!("{}/empty", server.uri()), &dest, &mut progress)
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::EmptyArtifact { .. }));
}

#[tokio::test]
async fn test_http_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("missing.deb");
    let mut progress = RecordingProgress::default();

    let err = Downloader::new()
        .unwrap()
        .fetch(&format!("{}/missing", server.uri()), &dest, &mut progress)
        .await
        .unwrap_err();

    match err {
        DownloadError::Status { status } => assert_eq!(status.as_u16(), 404),
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transfer_log_records_request_and_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/logged"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 2048]))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("logged.deb");
    let log = dir.path().join("transfer.log");
    let mut progress = RecordingProgress::default();

    Downloader::new()
        .unwrap()
        .with_transfer_log(&log)
        .fetch(&format!("{}/logged", server.uri()), &dest, &mut progress)
        .await
        .unwrap();

    let content = fs::read_to_string(&log).unwrap();
    assert!(content.contains("GET "));
    assert!(content.contains("done: 2048 bytes"));
}

#[tokio::test]
async fn test_latest_release_lookup() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "tag_name": "v26.02.15",
        "name": "TAC Writer 26.02.15",
        "body": "Fixes",
        "prerelease": false,
        "draft": false,
        "assets": [
            {
                "name": "tac-writer_26.02.15_amd64.deb",
                "browser_download_url": "https://example.com/tac-writer_26.02.15_amd64.deb",
                "size": 4096
            }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/repos/narayanls/tac-writer/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let release = ReleaseClient::new()
        .unwrap()
        .with_api_base(server.uri())
        .latest()
        .await
        .unwrap();

    assert_eq!(release.version(), "26.02.15");
    assert!(release.find_asset(".deb").is_some());
}

#[tokio::test]
async fn test_latest_release_rejects_prerelease() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "tag_name": "v27.00.00",
        "prerelease": true,
        "draft": false,
        "assets": []
    });
    Mock::given(method("GET"))
        .and(path("/repos/narayanls/tac-writer/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let result = ReleaseClient::new()
        .unwrap()
        .with_api_base(server.uri())
        .latest()
        .await;

    assert!(result.is_err());
}

//! HTTP API tests
//!
//! Drives the router with `oneshot` requests; segment servers are wiremock.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{mount_stream, CopyRemuxer, TestHarness};
use hlsforged::state::JobStatus;
use hlsforged_common::JobId;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::MockServer;

/// Helper to get response body as JSON
async fn body_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn harness() -> TestHarness {
    TestHarness::new(Arc::new(CopyRemuxer::default()))
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let h = harness();
    let response = h.router().oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["jobs"], 0);
}

#[tokio::test]
async fn test_process_missing_reference_is_rejected() {
    let h = harness();
    let response = h
        .router()
        .oneshot(post_json(
            "/api/process",
            serde_json::json!({"audio_offset_centiseconds": 10}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["code"], "validation_error");
    assert!(json["error"].as_str().unwrap().contains("manifest_reference"));
    assert!(h.registry.is_empty());
}

#[tokio::test]
async fn test_process_rejects_unusable_references() {
    let h = harness();

    for reference in ["", "   ", "not a url", "ftp://example.com/index.m3u8"] {
        let response = h
            .router()
            .oneshot(post_json(
                "/api/process",
                serde_json::json!({"manifest_reference": reference}),
            ))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "reference {reference:?} should be rejected"
        );
    }

    assert!(h.registry.is_empty());
}

#[tokio::test]
async fn test_process_malformed_body() {
    let h = harness();
    let request = Request::builder()
        .method("POST")
        .uri("/api/process")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = h.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(h.registry.is_empty());
}

#[tokio::test]
async fn test_process_then_poll_until_complete() {
    let server = MockServer::start().await;
    let url = mount_stream(&server, "show", &[b"one", b"two"]).await;
    let h = harness();

    let response = h
        .router()
        .oneshot(post_json(
            "/api/process",
            serde_json::json!({"manifest_reference": url, "audio_offset_centiseconds": -25}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let json = body_json(response.into_body()).await;
    let id: JobId = json["job_id"].as_str().unwrap().parse().unwrap();
    assert_eq!(h.registry.get(id).unwrap().audio_offset_centiseconds, -25);

    h.wait_terminal(id).await;

    let response = h
        .router()
        .oneshot(get(&format!("/api/status/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["status"], "complete");
    assert_eq!(json["progress"], 100);
    assert_eq!(json["download_url"], format!("/download/{id}.mp4"));
    assert!(json.get("message").is_none());
}

#[tokio::test]
async fn test_unprefixed_aliases() {
    let server = MockServer::start().await;
    let url = mount_stream(&server, "show", &[b"x"]).await;
    let h = harness();

    let response = h
        .router()
        .oneshot(post_json(
            "/process",
            serde_json::json!({"url": url, "audio_offset": 40}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let json = body_json(response.into_body()).await;
    let id: JobId = json["job_id"].as_str().unwrap().parse().unwrap();
    assert_eq!(h.registry.get(id).unwrap().audio_offset_centiseconds, 40);

    let response = h
        .router()
        .oneshot(get(&format!("/status/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_status_unknown_job() {
    let h = harness();

    for id in [JobId::new().to_string(), "not-a-uuid".to_string()] {
        let response = h
            .router()
            .oneshot(get(&format!("/api/status/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["code"], "not_found");
    }
}

#[tokio::test]
async fn test_failed_job_reports_message() {
    let server = MockServer::start().await;
    let h = harness();

    let id = h
        .jobs
        .submit(&format!("{}/missing/index.m3u8", server.uri()), 0)
        .unwrap();
    h.wait_terminal(id).await;

    let response = h
        .router()
        .oneshot(get(&format!("/api/status/{id}")))
        .await
        .unwrap();
    let json = body_json(response.into_body()).await;
    assert_eq!(json["status"], "error");
    assert!(json["message"].as_str().unwrap().contains("Manifest error"));
    assert!(json.get("download_url").is_none());
}

#[tokio::test]
async fn test_list_jobs_with_filter() {
    let server = MockServer::start().await;
    let url = mount_stream(&server, "show", &[b"x"]).await;
    let h = harness();

    let done = h.jobs.submit(&url, 0).unwrap();
    h.wait_terminal(done).await;
    let failed = h
        .jobs
        .submit(&format!("{}/missing/index.m3u8", server.uri()), 0)
        .unwrap();
    h.wait_terminal(failed).await;

    let response = h.router().oneshot(get("/api/jobs")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json.as_array().unwrap().len(), 2);

    let response = h
        .router()
        .oneshot(get("/api/jobs?status=complete"))
        .await
        .unwrap();
    let json = body_json(response.into_body()).await;
    let jobs = json.as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["id"], done.to_string());
    assert_eq!(jobs[0]["status"], JobStatus::Complete.as_str());
}

#[tokio::test]
async fn test_list_jobs_bad_filter() {
    let h = harness();
    let response = h
        .router()
        .oneshot(get("/api/jobs?status=finished"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_rejects_traversal() {
    let h = harness();
    let response = h
        .router()
        .oneshot(get("/download/..%2Fsecret.mp4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_missing_file_explains_expiration() {
    let h = harness();
    let response = h
        .router()
        .oneshot(get(&format!("/download/{}", JobId::new().artifact_name())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["code"], "not_found");
    assert!(json["error"].as_str().unwrap().contains("30 minutes"));
}

#[tokio::test]
async fn test_download_completed_artifact() {
    let server = MockServer::start().await;
    let url = mount_stream(&server, "show", &[b"video-", b"bytes"]).await;
    let h = harness();

    let id = h.jobs.submit(&url, 0).unwrap();
    let job = h.wait_terminal(id).await;
    let download_url = job.download_url.unwrap();

    let response = h.router().oneshot(get(&download_url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "11");
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains(&id.artifact_name()));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"video-bytes");
}

#[tokio::test]
async fn test_events_stream_headers() {
    let h = harness();
    let response = h.router().oneshot(get("/api/events")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
}

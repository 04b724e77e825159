mod common;

use axum::body::{to_bytes, Body};
use common::TestApp;
use http::{header, Request, StatusCode};
use tower::ServiceExt;

const BOUNDARY: &str = "test-boundary-7f2a91";

fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(token: &str, field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/uploads")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(multipart_body(field, filename, content)))
        .expect("failed to build request")
}

async fn uploads_app() -> (TestApp, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let mut cfg = common::test_config();
    cfg.uploads_dir = dir.path().to_string_lossy().into_owned();
    (TestApp::with_config(cfg).await, dir)
}

#[tokio::test]
async fn accepted_image_lands_in_the_uploads_dir() {
    let (app, dir) = uploads_app().await;
    let token = app.admin_token();

    let response = app
        .router()
        .oneshot(upload_request(&token, "image", "donar.jpg", b"fake jpeg bytes"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let url = body["url"].as_str().expect("url missing");
    assert!(url.starts_with("/uploads/"), "got {url}");
    assert!(url.ends_with(".jpg"), "got {url}");

    let stored = dir.path().join(url.trim_start_matches("/uploads/"));
    let contents = std::fs::read(&stored).expect("stored file missing");
    assert_eq!(contents, b"fake jpeg bytes");
}

#[tokio::test]
async fn image_above_two_megabytes_but_under_the_cap_is_accepted() {
    let (app, dir) = uploads_app().await;
    let token = app.admin_token();

    // 3 MiB sits above axum's 2 MB default body limit and below the
    // configured 5 MiB cap
    let content = vec![0xABu8; 3 * 1024 * 1024];
    let response = app
        .router()
        .oneshot(upload_request(&token, "image", "banner.png", &content))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let url = body["url"].as_str().expect("url missing");
    let stored = dir.path().join(url.trim_start_matches("/uploads/"));
    let metadata = std::fs::metadata(&stored).expect("stored file missing");
    assert_eq!(metadata.len(), content.len() as u64);
}

#[tokio::test]
async fn image_over_the_configured_cap_is_rejected() {
    let (app, _dir) = uploads_app().await;
    let token = app.admin_token();

    let content = vec![0xABu8; 5 * 1024 * 1024 + 1];
    let response = app
        .router()
        .oneshot(upload_request(&token, "image", "huge.png", &content))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn disallowed_extension_is_rejected() {
    let (app, _dir) = uploads_app().await;
    let token = app.admin_token();

    let response = app
        .router()
        .oneshot(upload_request(&token, "image", "payload.exe", b"MZ"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_file_and_wrong_field_are_rejected() {
    let (app, _dir) = uploads_app().await;
    let token = app.admin_token();

    let empty = app
        .router()
        .oneshot(upload_request(&token, "image", "empty.png", b""))
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let wrong_field = app
        .router()
        .oneshot(upload_request(&token, "attachment", "donar.png", b"data"))
        .await
        .unwrap();
    assert_eq!(wrong_field.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_requires_admin_token() {
    let (app, _dir) = uploads_app().await;

    let mut request = upload_request("x", "image", "donar.jpg", b"data");
    request.headers_mut().remove(header::AUTHORIZATION);
    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

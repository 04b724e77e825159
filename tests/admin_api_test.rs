mod common;

use axum::body::{to_bytes, Body};
use common::TestApp;
use http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body was not JSON")
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

#[tokio::test]
async fn status_and_public_menu_need_no_auth() {
    let app = TestApp::new().await;
    let router = app.router();

    let status = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(status.status(), StatusCode::OK);
    let body = body_json(status).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "donar-api");

    let products = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/products")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(products.status(), StatusCode::OK);
    let body = body_json(products).await;
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn login_issues_token_and_rejects_bad_credentials() {
    let app = TestApp::new().await;

    let ok = app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/admin/login",
            json!({ "username": "admin", "password": "test-admin-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    let body = body_json(ok).await;
    assert_eq!(body["token_type"], "bearer");
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));

    let bad = app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/admin/login",
            json!({ "username": "admin", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_require_a_valid_bearer_token() {
    let app = TestApp::new().await;

    let missing = app
        .router()
        .oneshot(
            Request::builder()
                .uri("/api/v1/orders")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let garbage = app
        .router()
        .oneshot(
            Request::builder()
                .uri("/api/v1/orders")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

    let authed = app
        .router()
        .oneshot(
            Request::builder()
                .uri("/api/v1/orders")
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", app.admin_token()),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(authed.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_token_unlocks_catalog_writes_and_analytics() {
    let app = TestApp::new().await;
    let token = app.admin_token();

    let mut create = json_request(
        "POST",
        "/api/v1/products",
        json!({ "name": "Donar", "price": "28000", "category": "Donar" }),
    );
    create.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    let created = app.router().oneshot(create).await.unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = body_json(created).await;
    assert_eq!(body["name"], "Donar");
    assert!(body["is_available"].as_bool().unwrap());

    // The new product is publicly visible
    let listed = app
        .router()
        .oneshot(
            Request::builder()
                .uri("/api/v1/products?category=Donar")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(listed.status(), StatusCode::OK);
    let body = body_json(listed).await;
    assert_eq!(body["pagination"]["total"], 1);

    let analytics = app
        .router()
        .oneshot(
            Request::builder()
                .uri("/api/v1/admin/analytics?days=7")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(analytics.status(), StatusCode::OK);
    let body = body_json(analytics).await;
    assert_eq!(body["total_products"], 1);
    assert_eq!(body["daily_revenue"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn checkout_and_quote_over_http() {
    let app = TestApp::new().await;
    let token = app.admin_token();

    let mut create = json_request(
        "POST",
        "/api/v1/products",
        json!({ "name": "Donar", "price": "28000", "category": "Donar" }),
    );
    create.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    let created = body_json(app.router().oneshot(create).await.unwrap()).await;
    let product_id = created["id"].as_str().unwrap().to_string();

    let quote = app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/cart/quote",
            json!({ "items": [{ "product_id": product_id, "quantity": 1 }] }),
        ))
        .await
        .unwrap();
    assert_eq!(quote.status(), StatusCode::OK);
    let body = body_json(quote).await;
    assert_eq!(body["subtotal"], "28000");
    assert_eq!(body["delivery_fee"], "10000");
    assert_eq!(body["total"], "38000");

    let order = app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/orders",
            json!({
                "customer_name": "Aziz",
                "phone": "+998901234567",
                "address": "Chilonzor 12",
                "items": [{ "product_id": product_id, "quantity": 1 }]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(order.status(), StatusCode::CREATED);

    // Too far away: rejected with 422 before anything is stored
    let far = app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/orders",
            json!({
                "customer_name": "Aziz",
                "phone": "+998901234567",
                "address": "Samarqand",
                "items": [{ "product_id": product_id, "quantity": 1 }],
                "location": { "latitude": 39.6547, "longitude": 66.9758 }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(far.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(far).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Outside delivery zone"));
}

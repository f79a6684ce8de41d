//! Login, session handling and user administration

mod common;

use axum::http::{header, Method, Request, StatusCode};
use axum::body::Body;
use orderdesk_db::entities::user_group::Group;
use orderdesk_db::users;
use serde_json::json;
use tower::ServiceExt; // For oneshot()

#[tokio::test]
async fn test_health_is_public() {
    let app = common::setup().await;

    let (status, body) = app.call(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = common::setup().await;

    let (status, doc) = app
        .call(Method::GET, "/api/openapi.json", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/orders"].is_object());
}

#[tokio::test]
async fn test_login_and_use_session_cookie() {
    let app = common::setup().await;
    let hash = orderdesk_auth::hash_password("correct-horse").unwrap();
    users::create_user(&app.db, "alice", &hash, &[Group::Customer])
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "username": "alice", "password": "correct-horse" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session_token="));
    assert!(cookie.contains("HttpOnly"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let login: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(login["user"]["username"], "alice");
    assert_eq!(login["user"]["groups"], json!(["customer"]));

    // The cookie alone authenticates
    let session = cookie.split(';').next().unwrap().to_string();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, session)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = common::setup().await;
    let hash = orderdesk_auth::hash_password("correct-horse").unwrap();
    users::create_user(&app.db, "alice", &hash, &[Group::Customer])
        .await
        .unwrap();

    let (status, error) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong-horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error["code"], "INVALID_CREDENTIALS");

    // The reserved account can never log in
    let (status, _) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "deleted", "password": "anything" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_malformed_body_is_validation_error() {
    let app = common::setup().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"username\": \"alice\""))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["code"], "VALIDATION_ERROR");
    assert!(error["fields"]["body"].is_array());

    // Missing fields and a missing body are reported the same way
    let (status, error) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");

    let (status, error) = app.call(Method::POST, "/api/auth/login", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = common::setup().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookie = response.headers().get(header::SET_COOKIE).unwrap();
    assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn test_me_reports_groups() {
    let app = common::setup().await;
    let employee = app.employee("employee1").await;

    let (status, me) = app.get("/api/auth/me", &employee).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], json!(employee.id));
    assert_eq!(me["groups"], json!(["employee"]));
}

#[tokio::test]
async fn test_user_administration() {
    let app = common::setup().await;
    let employee = app.employee("employee1").await;

    let (status, created) = app
        .post(
            "/api/users",
            &employee,
            json!({ "username": "bob", "password": "long-enough", "groups": ["customer"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["groups"], json!(["customer"]));

    let (status, error) = app
        .post(
            "/api/users",
            &employee,
            json!({ "username": "bob", "password": "long-enough" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "USERNAME_EXISTS");

    let (status, error) = app
        .post(
            "/api/users",
            &employee,
            json!({ "username": "carol", "password": "short" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["fields"]["password"].is_array());

    // employee1, bob and the reserved account
    let (status, list) = app.get("/api/users", &employee).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 3);
}

#[tokio::test]
async fn test_deleting_user_reassigns_orders() {
    let app = common::setup().await;
    let employee = app.employee("employee1").await;
    let alice = app.customer("alice").await;

    let (_, order) = app.post("/api/orders", &alice, json!({})).await;

    let (status, _) = app
        .delete(&format!("/api/users/{}", alice.id), &employee)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let sentinel = users::find_sentinel(&app.db).await.unwrap();
    let (status, order) = app
        .get(&format!("/api/orders/{}", order["id"]), &employee)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["order"]["owner_id"], json!(sentinel.id));

    // Alice's token no longer works
    let (status, _) = app.get("/api/orders", &alice).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, error) = app
        .delete(&format!("/api/users/{}", sentinel.id), &employee)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "SENTINEL_USER");

    let (status, error) = app.delete("/api/users/4242", &employee).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn test_user_administration_requires_employee() {
    let app = common::setup().await;
    let alice = app.customer("alice").await;

    let (status, _) = app.get("/api/users", &alice).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

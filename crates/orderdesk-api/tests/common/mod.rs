//! Shared helpers for router-level tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use orderdesk_api::{ApiServer, ApiServerConfig};
use orderdesk_auth::{JwtClaims, JwtValidator};
use orderdesk_db::entities::user_group::Group;
use orderdesk_db::users;
use sea_orm::{Database, DatabaseConnection};
use serde_json::Value;
use tower::ServiceExt; // For oneshot()

pub const SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
}

pub struct TestUser {
    pub id: i32,
    pub token: String,
}

pub async fn setup() -> TestApp {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    orderdesk_db::migrate(&db)
        .await
        .expect("Failed to run migrations");

    let config = ApiServerConfig::new("127.0.0.1:0".parse().unwrap(), SECRET.to_string());
    let router = ApiServer::new(config, db.clone()).build_router();

    TestApp { router, db }
}

impl TestApp {
    pub async fn user(&self, username: &str, groups: &[Group]) -> TestUser {
        let account = users::create_user(&self.db, username, "unused-hash", groups)
            .await
            .expect("Failed to create user");
        let claims = JwtClaims::session(account.id, username, Duration::hours(1));
        let token = JwtValidator::encode(SECRET.as_bytes(), &claims).unwrap();

        TestUser {
            id: account.id,
            token,
        }
    }

    pub async fn customer(&self, username: &str) -> TestUser {
        self.user(username, &[Group::Customer]).await
    }

    pub async fn employee(&self, username: &str) -> TestUser {
        self.user(username, &[Group::Employee]).await
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("Authorization", format!("Bearer {}", user.token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(user), None).await
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(user), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, Some(user), None).await
    }

    /// Supplier plus product via the API, returning the product id
    pub async fn product(&self, employee: &TestUser, name: &str, price: &str) -> i64 {
        let supplier_name = format!("{} Supplier", name);
        let (status, supplier) = self
            .post(
                "/api/suppliers",
                employee,
                serde_json::json!({
                    "name": supplier_name,
                    "email": "sales@example.com",
                    "phone_number": "444555666",
                    "postal_code": "00-220",
                    "city": "Warsaw",
                    "address": "Wiejska 12"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", supplier);

        let (status, product) = self
            .post(
                "/api/products",
                employee,
                serde_json::json!({
                    "name": name,
                    "category": "pipes",
                    "price": price,
                    "supplier_id": supplier["id"]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", product);

        product["id"].as_i64().unwrap()
    }
}

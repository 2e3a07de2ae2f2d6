#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    middleware, Router,
};
use serde_json::{json, Value};
use store_order_api::{
    app_router,
    config::AppConfig,
    db::{self, DbConfig},
    middleware_helpers::request_id_middleware,
    AppState,
};
use tower::ServiceExt;

/// Helper harness for spinning up an application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let pool = db::establish_connection_with_config(&DbConfig::in_memory_sqlite())
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.cors_allow_any_origin = true;

        let state = AppState::new(Arc::new(pool), cfg);
        let router = app_router(state.clone()).layer(middleware::from_fn(request_id_middleware));

        Self { router, state }
    }

    /// Send a request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let request = match body {
            Some(payload) => {
                builder = builder.header("content-type", "application/json");
                builder
                    .body(Body::from(payload.to_string()))
                    .expect("failed to build request")
            }
            None => builder.body(Body::empty()).expect("failed to build request"),
        };

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        read(self.request(Method::GET, uri, None).await).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        read(self.request(Method::POST, uri, Some(body)).await).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        read(self.request(Method::PUT, uri, Some(body)).await).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        read(self.request(Method::PATCH, uri, Some(body)).await).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        read(self.request(Method::DELETE, uri, None).await).await
    }

    /// Creates an order through the API and returns its JSON body.
    pub async fn create_order(&self, body: Value) -> Value {
        let (status, order) = self.post("/api/orders", body).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {order}");
        order
    }
}

/// Decodes a response body as JSON; empty bodies become `Value::Null`.
pub async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is not JSON")
    };
    (status, value)
}

/// Minimal valid order payload with the given supplier and lines.
pub fn order_payload(supplier: &str, items: Vec<Value>) -> Value {
    json!({
        "supplierName": supplier,
        "supplierEmail": "buyer@example.com",
        "orderLineItems": items,
    })
}

pub fn line(name: &str, quantity: f64, unit_price: f64) -> Value {
    json!({
        "productName": name,
        "quantity": quantity,
        "unitPrice": unit_price,
    })
}

/// Decimals are serialized as strings; compares them numerically.
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}

//! Store Order API Library
//!
//! Purchase order management: orders placed with suppliers, their line items,
//! the status workflow and the totals derived from the lines.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod common;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone());
        Self {
            db,
            config,
            services,
        }
    }
}

/// Resource routes mounted under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/orders", handlers::orders::order_routes())
        .nest(
            "/orderlineitems",
            handlers::order_line_items::order_line_item_routes(),
        )
}

/// Full application router: banner, health, API and Swagger UI.
///
/// Transport layers (CORS, compression, tracing, request ids) are added by the binary.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "store-order-api up" }))
        .nest("/health", health::health_routes(state.db.clone()))
        .nest("/api", api_routes().with_state(state))
        .merge(openapi::swagger_ui())
}

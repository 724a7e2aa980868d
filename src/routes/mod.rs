//! HTTP route handlers
//!
//! Thin adapters over the service layer: resolve the tenant, map DTOs, and
//! translate service errors into status codes. No business rules live here.

pub mod accounts;
pub mod contacts;
pub mod journal_entries;
pub mod reports;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::health::health;
use crate::services::report_generator::ReportSettings;
use crate::tenant::TenantError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub settings: ReportSettings,
}

impl AppState {
    pub fn new(pool: sqlx::PgPool, config: &Config) -> Self {
        AppState {
            pool,
            settings: ReportSettings::from_config(config),
        }
    }
}

/// Build the application router
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/accounts", post(accounts::create_account))
        .route("/api/accounts", get(accounts::list_accounts))
        .route("/api/accounts/{code}", get(accounts::get_account))
        .route("/api/accounts/{code}", delete(accounts::deactivate_account))
        .route("/api/contacts", post(contacts::create_contact))
        .route("/api/contacts", get(contacts::list_contacts))
        .route("/api/ledger/entries", post(journal_entries::create_entry))
        .route("/api/ledger/entries/{id}", get(journal_entries::get_entry))
        .route(
            "/api/ledger/entries/{id}/post",
            post(journal_entries::post_entry),
        )
        .route(
            "/api/ledger/entries/{id}/void",
            post(journal_entries::void_entry),
        )
        .route("/api/reports", post(reports::create_report))
        .route("/api/reports/{id}", get(reports::get_report))
        .route("/api/reports/{id}/payload", get(reports::get_report_payload))
        .route(
            "/api/reports/{id}/regenerate",
            post(reports::regenerate_report),
        )
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error response wrapper for proper HTTP error handling
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<TenantError> for ApiError {
    fn from(e: TenantError) -> Self {
        ApiError::bad_request(e.to_string())
    }
}

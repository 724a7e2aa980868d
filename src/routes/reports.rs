//! Report API routes
//!
//! Generation is asynchronous: POST returns 202 with the report id and the
//! caller polls GET for status. The payload endpoint serves from the cache
//! when valid and recomputes on demand otherwise.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::contracts::report_request::ReportRequest;
use crate::repos::report_repo::{self, ReportStatus, ReportType};
use crate::routes::{ApiError, AppState};
use crate::services::report_generator::{self, GenerateError};
use crate::tenant::{resolve_tenant, TenantId};

/// Response for report creation: poll GET /api/reports/{id} for progress
#[derive(Debug, Serialize)]
pub struct ReportAcceptedResponse {
    pub report_id: Uuid,
    pub status: ReportStatus,
}

/// Report status response
#[derive(Debug, Serialize)]
pub struct ReportStatusResponse {
    pub report_id: Uuid,
    pub report_number: String,
    pub report_type: ReportType,
    pub status: ReportStatus,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub summary_totals: Option<Value>,
    pub version: i32,
    pub is_latest: bool,
    pub generation_error: Option<String>,
}

/// Handler for POST /api/reports
pub async fn create_report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ReportRequest>,
) -> Result<(StatusCode, Json<ReportAcceptedResponse>), ApiError> {
    let tenant = resolve_tenant(&headers)?;

    let params = report_generator::parse_params(&body).map_err(map_generate_error)?;
    let report_id = report_generator::start(&state.pool, &tenant, &params)
        .await
        .map_err(map_generate_error)?;

    spawn_generation(state, tenant, report_id);

    Ok((
        StatusCode::ACCEPTED,
        Json(ReportAcceptedResponse {
            report_id,
            status: ReportStatus::Generating,
        }),
    ))
}

/// Handler for POST /api/reports/{id}/regenerate
pub async fn regenerate_report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ReportAcceptedResponse>), ApiError> {
    let tenant = resolve_tenant(&headers)?;

    let report_id = report_generator::regenerate(&state.pool, &tenant, id)
        .await
        .map_err(map_generate_error)?;

    spawn_generation(state, tenant, report_id);

    Ok((
        StatusCode::ACCEPTED,
        Json(ReportAcceptedResponse {
            report_id,
            status: ReportStatus::Generating,
        }),
    ))
}

/// Handler for GET /api/reports/{id}
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportStatusResponse>, ApiError> {
    let tenant = resolve_tenant(&headers)?;

    let report = report_repo::find_by_id(&state.pool, &tenant, id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Report lookup failed");
            ApiError::internal("Report lookup failed")
        })?
        .ok_or_else(|| ApiError::not_found(format!("Report not found: {id}")))?;

    Ok(Json(ReportStatusResponse {
        report_id: report.id,
        report_number: report.report_number,
        report_type: report.report_type,
        status: report.status,
        period_start: report.period_start,
        period_end: report.period_end,
        summary_totals: report.summary_totals,
        version: report.version,
        is_latest: report.is_latest,
        generation_error: report.generation_error,
    }))
}

/// Handler for GET /api/reports/{id}/payload
pub async fn get_report_payload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let tenant = resolve_tenant(&headers)?;

    let payload = report_generator::get_payload(&state.pool, &tenant, id, &state.settings)
        .await
        .map_err(map_generate_error)?
        .ok_or_else(|| ApiError::not_found(format!("Report payload not available: {id}")))?;

    Ok(Json(payload))
}

/// Run report generation on a background task
fn spawn_generation(state: Arc<AppState>, tenant: TenantId, report_id: Uuid) {
    tokio::spawn(async move {
        if let Err(e) =
            report_generator::run(&state.pool, &tenant, report_id, &state.settings).await
        {
            tracing::error!(
                tenant_id = %tenant,
                report_id = %report_id,
                error = %e,
                "Report generation task failed"
            );
        }
    });
}

fn map_generate_error(e: GenerateError) -> ApiError {
    match e {
        GenerateError::InvalidDate(_) => ApiError::bad_request(e.to_string()),
        GenerateError::NotFound(_) => ApiError::not_found(e.to_string()),
        GenerateError::Query(_)
        | GenerateError::Repo(_)
        | GenerateError::Contact(_)
        | GenerateError::Serialization(_)
        | GenerateError::Database(_) => {
            tracing::error!(error = %e, "Report operation failed");
            ApiError::internal("Report operation failed")
        }
    }
}

// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the dashboard API.
//!
//! Successful responses wrap their payload as `{"data": ...}`; failures are
//! `{"error": "..."}` with a 4xx/5xx status.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pitstop_core::PitstopError;
use pitstop_core::records::{
    Customer, FollowUpItem, FollowUpStatus, FollowUpUpdate, MessageLog, NewCustomer,
    NewServiceVisit, PositiveRemark, ServiceVisit, Survey, SurveyFilter, SurveyStats,
};
use serde::{Deserialize, Serialize};

use crate::server::GatewayState;

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

fn ok<T: Serialize>(data: T) -> Json<DataResponse<T>> {
    Json(DataResponse { data })
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// A handler failure mapped to a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<PitstopError> for ApiError {
    fn from(e: PitstopError) -> Self {
        match e {
            PitstopError::NotFound { entity, id } => {
                Self::not_found(format!("{entity} {id} not found"))
            }
            other => {
                tracing::error!(error = %other, "dashboard request failed");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Server error".to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<DataResponse<T>>, ApiError>;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /health (no auth).
pub async fn get_public_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Response body for GET /api/admin/status.
#[derive(Debug, Serialize)]
pub struct AdminStatus {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// GET /api/admin/status
pub async fn get_admin_status() -> Json<AdminStatus> {
    Json(AdminStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /api/surveys
pub async fn list_surveys(
    State(state): State<GatewayState>,
    Query(filter): Query<SurveyFilter>,
) -> ApiResult<Vec<Survey>> {
    Ok(ok(state.storage().list_surveys(&filter).await?))
}

/// A survey with its follow-up items and positive remarks.
#[derive(Debug, Serialize)]
pub struct SurveyDetail {
    #[serde(flatten)]
    pub survey: Survey,
    pub follow_up_items: Vec<FollowUpItem>,
    pub positive_remarks: Vec<PositiveRemark>,
}

/// GET /api/surveys/{id}
pub async fn get_survey(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
) -> ApiResult<SurveyDetail> {
    let storage = state.storage();
    let survey = storage
        .get_survey(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Survey not found"))?;
    let follow_up_items = storage.follow_up_items_for_survey(id).await?;
    let positive_remarks = storage.positive_remarks_for_survey(id).await?;
    Ok(ok(SurveyDetail {
        survey,
        follow_up_items,
        positive_remarks,
    }))
}

/// Request body for PATCH /api/surveys/{id}/callback.
#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    #[serde(default)]
    pub callback_completed: Option<bool>,
    #[serde(default)]
    pub callback_notes: Option<String>,
}

/// PATCH /api/surveys/{id}/callback
pub async fn patch_survey_callback(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
    Json(body): Json<CallbackRequest>,
) -> ApiResult<Survey> {
    let completed = body
        .callback_completed
        .ok_or_else(|| ApiError::bad_request("callback_completed is required"))?;
    let storage = state.storage();
    if !storage
        .update_callback(id, completed, body.callback_notes.as_deref())
        .await?
    {
        return Err(ApiError::not_found("Survey not found"));
    }
    let survey = storage
        .get_survey(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Survey not found"))?;
    tracing::info!(survey_id = id, completed, "callback status updated");
    Ok(ok(survey))
}

/// GET /api/surveys/{id}/follow-up-items
pub async fn list_follow_up_items(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<FollowUpItem>> {
    let storage = state.storage();
    if storage.get_survey(id).await?.is_none() {
        return Err(ApiError::not_found("Survey not found"));
    }
    Ok(ok(storage.follow_up_items_for_survey(id).await?))
}

/// Request body for PATCH /api/surveys/follow-up-items/{id}.
#[derive(Debug, Deserialize)]
pub struct FollowUpRequest {
    #[serde(default)]
    pub status: Option<FollowUpStatus>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<String>,
}

impl FollowUpRequest {
    /// `resolved` without an explicit `resolved_at` is stamped with the current time.
    fn into_update(self, now: chrono::DateTime<chrono::Utc>) -> Result<FollowUpUpdate, ApiError> {
        let status = self
            .status
            .ok_or_else(|| ApiError::bad_request("status is required"))?;
        let resolved_at = match (status, self.resolved_at) {
            (_, Some(at)) => Some(at),
            (FollowUpStatus::Resolved, None) => {
                Some(now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
            }
            _ => None,
        };
        Ok(FollowUpUpdate {
            status,
            assigned_to: self.assigned_to,
            resolved_at,
        })
    }
}

/// PATCH /api/surveys/follow-up-items/{id}
pub async fn patch_follow_up_item(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
    Json(body): Json<FollowUpRequest>,
) -> ApiResult<FollowUpItem> {
    let update = body.into_update(chrono::Utc::now())?;
    let item = state
        .storage()
        .update_follow_up_item(id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("Follow-up item not found"))?;
    tracing::info!(item_id = id, status = %item.status, "follow-up item updated");
    Ok(ok(item))
}

/// GET /api/surveys/stats/summary
pub async fn get_survey_stats(State(state): State<GatewayState>) -> ApiResult<SurveyStats> {
    Ok(ok(state.storage().survey_stats().await?))
}

/// POST /api/customers
pub async fn post_customer(
    State(state): State<GatewayState>,
    Json(body): Json<NewCustomer>,
) -> Result<(StatusCode, Json<DataResponse<Customer>>), ApiError> {
    if body.phone.trim().is_empty() {
        return Err(ApiError::bad_request("phone is required"));
    }
    let customer = state.storage().create_customer(&body).await?;
    tracing::info!(customer_id = customer.id, "customer created");
    Ok((StatusCode::CREATED, ok(customer)))
}

/// GET /api/customers/{id}
pub async fn get_customer(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
) -> ApiResult<Customer> {
    let customer = state
        .storage()
        .get_customer(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer not found"))?;
    Ok(ok(customer))
}

/// POST /api/services
pub async fn post_service_visit(
    State(state): State<GatewayState>,
    Json(body): Json<NewServiceVisit>,
) -> Result<(StatusCode, Json<DataResponse<ServiceVisit>>), ApiError> {
    let storage = state.storage();
    if storage.get_customer(body.customer_id).await?.is_none() {
        return Err(ApiError::bad_request(format!(
            "customer {} does not exist",
            body.customer_id
        )));
    }
    let visit = storage.create_service_visit(&body).await?;
    tracing::info!(visit_id = visit.id, customer_id = visit.customer_id, "service visit created");
    Ok((StatusCode::CREATED, ok(visit)))
}

/// GET /api/services/{id}
pub async fn get_service_visit(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
) -> ApiResult<ServiceVisit> {
    let visit = state
        .storage()
        .get_service_visit(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service visit not found"))?;
    Ok(ok(visit))
}

/// GET /api/services/{id}/messages
pub async fn list_service_messages(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<MessageLog>> {
    let storage = state.storage();
    if storage.get_service_visit(id).await?.is_none() {
        return Err(ApiError::not_found("Service visit not found"));
    }
    Ok(ok(storage.message_logs_for_visit(id).await?))
}

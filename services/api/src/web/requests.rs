//! services/api/src/web/requests.rs
//!
//! The lesson request inbox and its approve/decline actions.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use std::sync::Arc;
use tutors_core::RequestFilter;
use uuid::Uuid;

use crate::web::dto::{ApprovalResponse, LessonRequestResponse, RequestListQuery, ReviewRequestBody};
use crate::web::rest::{port_error, HandlerError};
use crate::web::state::AppState;

/// Requests addressed to the caller's tutor profile, newest first.
#[utoipa::path(
    get,
    path = "/me/lesson-requests",
    params(RequestListQuery),
    responses(
        (status = 200, description = "Incoming requests", body = [LessonRequestResponse]),
        (status = 403, description = "Caller is not a tutor"),
        (status = 422, description = "Unknown status filter")
    )
)]
pub async fn incoming_requests_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<Vec<LessonRequestResponse>>, HandlerError> {
    let filter = query
        .status
        .as_deref()
        .map(str::parse::<RequestFilter>)
        .transpose()
        .map_err(port_error)?
        .unwrap_or_default();
    let requests = state
        .lessons
        .list_for_tutor(user_id, filter)
        .await
        .map_err(port_error)?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

/// Requests the caller sent as a student.
#[utoipa::path(
    get,
    path = "/me/lesson-requests/sent",
    responses((status = 200, description = "Sent requests", body = [LessonRequestResponse]))
)]
pub async fn sent_requests_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<LessonRequestResponse>>, HandlerError> {
    let requests = state
        .lessons
        .list_for_student(user_id)
        .await
        .map_err(port_error)?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

/// Approve a request and make sure its lesson exists. Safe to retry.
#[utoipa::path(
    post,
    path = "/lesson-requests/{id}/approve",
    params(("id" = Uuid, Path, description = "Lesson request id")),
    request_body = ReviewRequestBody,
    responses(
        (status = 200, description = "Approved with its lesson", body = ApprovalResponse),
        (status = 403, description = "Request belongs to another tutor"),
        (status = 404, description = "Unknown request"),
        (status = 409, description = "Request was already declined")
    )
)]
pub async fn approve_request_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ReviewRequestBody>,
) -> Result<Json<ApprovalResponse>, HandlerError> {
    let approval = state
        .lessons
        .approve(user_id, request_id, body.response)
        .await
        .map_err(port_error)?;
    Ok(Json(approval.into()))
}

/// Decline a pending request.
#[utoipa::path(
    post,
    path = "/lesson-requests/{id}/decline",
    params(("id" = Uuid, Path, description = "Lesson request id")),
    request_body = ReviewRequestBody,
    responses(
        (status = 200, description = "Declined request", body = LessonRequestResponse),
        (status = 403, description = "Request belongs to another tutor"),
        (status = 404, description = "Unknown request"),
        (status = 409, description = "Request is no longer pending")
    )
)]
pub async fn decline_request_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ReviewRequestBody>,
) -> Result<Json<LessonRequestResponse>, HandlerError> {
    let request = state
        .lessons
        .decline(user_id, request_id, body.response)
        .await
        .map_err(port_error)?;
    Ok(Json(request.into()))
}

//! services/api/src/web/schedule.rs
//!
//! The weekly booking grid, tutor availability and lesson booking.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::web::dto::{
    AvailabilitySlotResponse, CreateLessonRequestBody, LessonRequestResponse, ScheduleQuery,
    ScheduleResponse, SetAvailabilityRequest,
};
use crate::web::rest::{port_error, HandlerError};
use crate::web::state::AppState;

/// A tutor's bookable grid for one week.
#[utoipa::path(
    get,
    path = "/tutors/{id}/schedule",
    params(("id" = Uuid, Path, description = "Tutor id"), ScheduleQuery),
    responses(
        (status = 200, description = "Seven days of slots", body = ScheduleResponse),
        (status = 404, description = "Unknown tutor, or unapproved and not the caller's"),
        (status = 422, description = "Week outside the supported calendar")
    )
)]
pub async fn schedule_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(tutor_id): Path<Uuid>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<ScheduleResponse>, HandlerError> {
    let grid = state
        .booking
        .week_grid(user_id, tutor_id, query.week)
        .await
        .map_err(port_error)?;
    Ok(Json(grid.into()))
}

/// A tutor's recurring weekly availability.
#[utoipa::path(
    get,
    path = "/tutors/{id}/availability",
    params(("id" = Uuid, Path, description = "Tutor id")),
    responses(
        (status = 200, description = "Weekly windows", body = [AvailabilitySlotResponse]),
        (status = 404, description = "Unknown tutor, or unapproved and not the caller's")
    )
)]
pub async fn availability_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(tutor_id): Path<Uuid>,
) -> Result<Json<Vec<AvailabilitySlotResponse>>, HandlerError> {
    let slots = state
        .booking
        .availability(user_id, tutor_id)
        .await
        .map_err(port_error)?;
    Ok(Json(slots.into_iter().map(Into::into).collect()))
}

/// Replace the caller's weekly availability.
#[utoipa::path(
    put,
    path = "/me/availability",
    request_body = SetAvailabilityRequest,
    responses(
        (status = 200, description = "Stored windows", body = [AvailabilitySlotResponse]),
        (status = 403, description = "Caller is not a tutor"),
        (status = 422, description = "Overlapping or inverted windows")
    )
)]
pub async fn set_availability_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(body): Json<SetAvailabilityRequest>,
) -> Result<Json<Vec<AvailabilitySlotResponse>>, HandlerError> {
    let slots = body.into_slots().map_err(port_error)?;
    let stored = state
        .booking
        .set_availability(user_id, slots)
        .await
        .map_err(port_error)?;
    Ok(Json(stored.into_iter().map(Into::into).collect()))
}

/// Request a lesson in an available cell of the tutor's grid.
#[utoipa::path(
    post,
    path = "/tutors/{id}/lesson-requests",
    params(("id" = Uuid, Path, description = "Tutor id")),
    request_body = CreateLessonRequestBody,
    responses(
        (status = 201, description = "Pending request created", body = LessonRequestResponse),
        (status = 404, description = "Unknown or unapproved tutor"),
        (status = 409, description = "The slot is no longer available"),
        (status = 422, description = "Not a slot on the grid")
    )
)]
pub async fn request_lesson_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(tutor_id): Path<Uuid>,
    Json(body): Json<CreateLessonRequestBody>,
) -> Result<impl IntoResponse, HandlerError> {
    let request = state
        .booking
        .request_lesson(user_id, tutor_id, body.date, body.start_time, body.message)
        .await
        .map_err(port_error)?;
    info!("User {} requested lesson {}", user_id, request.id);
    Ok((StatusCode::CREATED, Json(LessonRequestResponse::from(request))))
}

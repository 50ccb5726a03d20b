//! services/api/src/web/tutors.rs
//!
//! Tutor directory and tutor application endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::web::dto::{MyApplicationResponse, TutorApplicationRequest, TutorListQuery, TutorResponse};
use crate::web::rest::{port_error, HandlerError};
use crate::web::state::AppState;

/// List approved tutors matching the given filters.
#[utoipa::path(
    get,
    path = "/tutors",
    params(TutorListQuery),
    responses(
        (status = 200, description = "Matching tutors", body = [TutorResponse]),
        (status = 422, description = "Unknown sort order")
    )
)]
pub async fn list_tutors_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TutorListQuery>,
) -> Result<Json<Vec<TutorResponse>>, HandlerError> {
    let filter = query.into_filter().map_err(port_error)?;
    let tutors = state.directory.search(&filter).await.map_err(port_error)?;
    Ok(Json(tutors.into_iter().map(TutorResponse::from).collect()))
}

/// A single tutor profile.
#[utoipa::path(
    get,
    path = "/tutors/{id}",
    params(("id" = Uuid, Path, description = "Tutor id")),
    responses(
        (status = 200, description = "Tutor profile", body = TutorResponse),
        (status = 404, description = "No such approved tutor")
    )
)]
pub async fn get_tutor_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(tutor_id): Path<Uuid>,
) -> Result<Json<TutorResponse>, HandlerError> {
    let tutor = state
        .directory
        .profile(tutor_id, Some(user_id))
        .await
        .map_err(port_error)?;
    Ok(Json(tutor.into()))
}

/// Apply to become a tutor. The profile stays hidden until it is approved.
#[utoipa::path(
    post,
    path = "/tutors/application",
    request_body = TutorApplicationRequest,
    responses(
        (status = 201, description = "Application stored", body = TutorResponse),
        (status = 409, description = "The user already has a tutor profile"),
        (status = 422, description = "Invalid application")
    )
)]
pub async fn submit_application_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(body): Json<TutorApplicationRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let tutor = state
        .directory
        .submit_application(user_id, body.into())
        .await
        .map_err(port_error)?;
    Ok((StatusCode::CREATED, Json(TutorResponse::from(tutor))))
}

/// The caller's own tutor application, if any.
#[utoipa::path(
    get,
    path = "/tutors/application",
    responses((status = 200, description = "The caller's application or null", body = MyApplicationResponse))
)]
pub async fn my_application_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<MyApplicationResponse>, HandlerError> {
    let application = state
        .directory
        .my_application(user_id)
        .await
        .map_err(port_error)?;
    Ok(Json(MyApplicationResponse {
        application: application.map(TutorResponse::from),
    }))
}

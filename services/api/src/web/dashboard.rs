//! services/api/src/web/dashboard.rs

use axum::{extract::State, Extension, Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::web::dto::DashboardResponse;
use crate::web::rest::{port_error, HandlerError};
use crate::web::state::AppState;

/// Everything the dashboard shows, in one round trip.
#[utoipa::path(
    get,
    path = "/me/dashboard",
    responses((status = 200, description = "Dashboard sections", body = DashboardResponse))
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<DashboardResponse>, HandlerError> {
    let today = state.booking.now().date();
    let dashboard = state
        .dashboard
        .load(user_id, today)
        .await
        .map_err(port_error)?;
    Ok(Json(dashboard.into()))
}

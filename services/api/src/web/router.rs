//! services/api/src/web/router.rs
//!
//! Assembles the HTTP router: public and session-protected routes, CORS,
//! request tracing and the Swagger UI.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::{
    auth::{logout_handler, me_handler},
    chats::{create_chat_handler, list_chats_handler, list_messages_handler, send_message_handler},
    dashboard::dashboard_handler,
    middleware::require_auth,
    requests::{
        approve_request_handler, decline_request_handler, incoming_requests_handler,
        sent_requests_handler,
    },
    rest::ApiDoc,
    schedule::{
        availability_handler, request_lesson_handler, schedule_handler, set_availability_handler,
    },
    state::AppState,
    tutors::{
        get_tutor_handler, list_tutors_handler, my_application_handler,
        submit_application_handler,
    },
    ws_handler::ws_handler,
};

pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(app_state.config.cors_origin.clone())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new().route("/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(me_handler))
        .route("/tutors", get(list_tutors_handler))
        .route(
            "/tutors/application",
            get(my_application_handler).post(submit_application_handler),
        )
        .route("/tutors/{id}", get(get_tutor_handler))
        .route("/tutors/{id}/schedule", get(schedule_handler))
        .route("/tutors/{id}/availability", get(availability_handler))
        .route("/tutors/{id}/lesson-requests", post(request_lesson_handler))
        .route("/me/availability", put(set_availability_handler))
        .route("/me/lesson-requests", get(incoming_requests_handler))
        .route("/me/lesson-requests/sent", get(sent_requests_handler))
        .route("/me/dashboard", get(dashboard_handler))
        .route("/lesson-requests/{id}/approve", post(approve_request_handler))
        .route("/lesson-requests/{id}/decline", post(decline_request_handler))
        .route("/chats", get(list_chats_handler).post(create_chat_handler))
        .route(
            "/chats/{id}/messages",
            get(list_messages_handler).post(send_message_handler),
        )
        .route("/ws", get(ws_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification and the mapping from
//! core errors to HTTP responses shared by every REST handler.

use axum::http::StatusCode;
use tracing::{error, warn};
use tutors_core::PortError;
use utoipa::OpenApi;

use crate::web::{auth, chats, dashboard, dto, requests, schedule, tutors};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::logout_handler,
        auth::me_handler,
        tutors::list_tutors_handler,
        tutors::get_tutor_handler,
        tutors::submit_application_handler,
        tutors::my_application_handler,
        schedule::schedule_handler,
        schedule::availability_handler,
        schedule::set_availability_handler,
        schedule::request_lesson_handler,
        requests::incoming_requests_handler,
        requests::sent_requests_handler,
        requests::approve_request_handler,
        requests::decline_request_handler,
        chats::create_chat_handler,
        chats::list_chats_handler,
        chats::list_messages_handler,
        chats::send_message_handler,
        dashboard::dashboard_handler,
    ),
    components(
        schemas(
            dto::UserResponse,
            dto::TutorResponse,
            dto::TutorApplicationRequest,
            dto::MyApplicationResponse,
            dto::GridCellResponse,
            dto::GridDayResponse,
            dto::ScheduleResponse,
            dto::AvailabilitySlotResponse,
            dto::AvailabilitySlotPayload,
            dto::SetAvailabilityRequest,
            dto::CreateLessonRequestBody,
            dto::LessonRequestResponse,
            dto::LessonResponse,
            dto::ReviewRequestBody,
            dto::ApprovalResponse,
            dto::CreateChatRequest,
            dto::ChatResponse,
            dto::MessageResponse,
            dto::ChatSummaryResponse,
            dto::SendMessageRequest,
            dto::DashboardResponse,
        )
    ),
    tags(
        (name = "Tutor Marketplace API", description = "Tutor discovery, lesson booking and messaging.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

/// The error half of every REST handler's result.
pub type HandlerError = (StatusCode, String);

/// Translates a core error into a status code and a client-safe message.
pub fn port_error(err: PortError) -> HandlerError {
    match err {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::AlreadyExists(msg) => (StatusCode::CONFLICT, msg),
        PortError::InvalidState(msg) => (StatusCode::CONFLICT, msg),
        PortError::SlotUnavailable => (
            StatusCode::CONFLICT,
            "This time slot is no longer available".to_string(),
        ),
        PortError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        PortError::Forbidden(msg) => {
            warn!("Forbidden: {}", msg);
            (StatusCode::FORBIDDEN, msg)
        }
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Unexpected(msg) => {
            error!("Unexpected error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PortError::NotFound("x".into()), StatusCode::NOT_FOUND)]
    #[case(PortError::AlreadyExists("x".into()), StatusCode::CONFLICT)]
    #[case(PortError::InvalidState("x".into()), StatusCode::CONFLICT)]
    #[case(PortError::SlotUnavailable, StatusCode::CONFLICT)]
    #[case(PortError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(PortError::Forbidden("x".into()), StatusCode::FORBIDDEN)]
    #[case(PortError::Unauthorized, StatusCode::UNAUTHORIZED)]
    #[case(PortError::Unexpected("db down".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn maps_port_errors_to_status_codes(#[case] err: PortError, #[case] expected: StatusCode) {
        assert_eq!(port_error(err).0, expected);
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let (_, body) = port_error(PortError::Unexpected("password=hunter2".into()));
        assert!(!body.contains("hunter2"));
    }

    #[test]
    fn openapi_document_lists_marketplace_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/tutors/{id}/schedule"));
        assert!(doc.paths.paths.contains_key("/lesson-requests/{id}/approve"));
        assert!(doc.paths.paths.contains_key("/chats/{id}/messages"));
    }
}

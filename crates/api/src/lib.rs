#![forbid(unsafe_code)]

pub mod dto;
pub mod error;
mod handlers;

use axum::Router;
use axum::routing::{get, post, put};
use services::AppServices;

pub use error::ApiError;

/// HTTP surface of the course progress service.
///
/// The router is stateless apart from the shared `AppServices`; layers such as
/// tracing are added by the binary.
pub fn router(services: AppServices) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/v1/courses/{course_id}/enrollments",
            post(handlers::enroll),
        )
        .route(
            "/api/v1/enrollments/{enrollment_id}",
            get(handlers::get_enrollment),
        )
        .route(
            "/api/v1/enrollments/{enrollment_id}/progress",
            get(handlers::get_enrollment_progress),
        )
        .route(
            "/api/v1/enrollments/{enrollment_id}/lessons/{lesson_id}/progress",
            put(handlers::update_lesson_progress).get(handlers::get_lesson_progress),
        )
        .route(
            "/api/v1/enrollments/{enrollment_id}/eligibility",
            get(handlers::get_eligibility),
        )
        .route(
            "/api/v1/enrollments/{enrollment_id}/complete",
            post(handlers::complete),
        )
        .route(
            "/api/v1/enrollments/{enrollment_id}/quizzes/{quiz_id}/attempts",
            post(handlers::record_quiz_attempt),
        )
        .route(
            "/api/v1/enrollments/{enrollment_id}/assignments/{assignment_id}",
            put(handlers::put_assignment),
        )
        .with_state(services)
}

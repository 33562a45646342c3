use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use course_core::model::ParseIdError;
use serde_json::json;
use services::{
    AssessmentServiceError, EligibilityServiceError, EnrollmentServiceError, ProgressServiceError,
};
use storage::repository::StorageError;
use thiserror::Error;
use tracing::error;

/// Error returned by handlers, rendered as `{"error": {"code", "message"}}`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    fn internal(err: &impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(detail) => {
                error!(%detail, "request failed");
                "internal server error".to_owned()
            }
            other => other.to_string(),
        };
        let body = Json(json!({
            "error": { "code": self.code(), "message": message }
        }));
        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ParseIdError> for ApiError {
    fn from(err: ParseIdError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => ApiError::NotFound("resource not found".into()),
            StorageError::Conflict => ApiError::Conflict("resource already exists".into()),
            other => ApiError::internal(&other),
        }
    }
}

impl From<ProgressServiceError> for ApiError {
    fn from(err: ProgressServiceError) -> Self {
        match err {
            ProgressServiceError::EnrollmentNotFound(_)
            | ProgressServiceError::CourseNotFound(_)
            | ProgressServiceError::LessonNotInCourse { .. }
            | ProgressServiceError::ProgressNotFound { .. } => ApiError::NotFound(err.to_string()),
            ProgressServiceError::Progress(_) => ApiError::BadRequest(err.to_string()),
            ProgressServiceError::Storage(inner) => inner.into(),
            other => ApiError::internal(&other),
        }
    }
}

impl From<EnrollmentServiceError> for ApiError {
    fn from(err: EnrollmentServiceError) -> Self {
        match err {
            EnrollmentServiceError::CourseNotFound(_)
            | EnrollmentServiceError::EnrollmentNotFound(_) => ApiError::NotFound(err.to_string()),
            EnrollmentServiceError::AlreadyEnrolled { .. } => ApiError::Conflict(err.to_string()),
            EnrollmentServiceError::Enrollment(_) => ApiError::BadRequest(err.to_string()),
            EnrollmentServiceError::Storage(inner) => inner.into(),
            other => ApiError::internal(&other),
        }
    }
}

impl From<AssessmentServiceError> for ApiError {
    fn from(err: AssessmentServiceError) -> Self {
        match err {
            AssessmentServiceError::EnrollmentNotFound(_)
            | AssessmentServiceError::SubmissionNotFound { .. } => {
                ApiError::NotFound(err.to_string())
            }
            AssessmentServiceError::Assessment(_) => ApiError::BadRequest(err.to_string()),
            AssessmentServiceError::Storage(inner) => inner.into(),
            other => ApiError::internal(&other),
        }
    }
}

impl From<EligibilityServiceError> for ApiError {
    fn from(err: EligibilityServiceError) -> Self {
        match err {
            EligibilityServiceError::EnrollmentNotFound(_)
            | EligibilityServiceError::CourseNotFound(_) => ApiError::NotFound(err.to_string()),
            EligibilityServiceError::Storage(inner) => inner.into(),
            other => ApiError::internal(&other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::{EnrollmentId, ProgressError};

    #[test]
    fn service_errors_map_to_statuses() {
        let not_found: ApiError =
            ProgressServiceError::EnrollmentNotFound(EnrollmentId::new("e9")).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "enrollment e9 not found");

        let invalid: ApiError =
            ProgressServiceError::Progress(ProgressError::InvalidVideoProgress(-1.0)).into();
        assert_eq!(invalid.code(), "BAD_REQUEST");

        let storage: ApiError =
            ProgressServiceError::Storage(StorageError::Connection("down".into())).into();
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

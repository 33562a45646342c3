use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use course_core::eligibility::EligibilityReport;
use course_core::model::{
    AssignmentId, AssignmentSubmission, CourseId, EnrollmentId, LessonId, LessonProgress,
    QuizAttempt, QuizId, UserId,
};
use services::{AppServices, EnrollmentProgress};
use tracing::debug;

use crate::dto::{
    AssignmentRequest, CompletionResponse, EnrollRequest, EnrollmentResponse, HealthResponse,
    LessonProgressRequest, QuizAttemptRequest,
};
use crate::error::ApiError;

type ApiResult<T> = Result<T, ApiError>;

pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

pub(crate) async fn update_lesson_progress(
    State(services): State<AppServices>,
    Path((enrollment_id, lesson_id)): Path<(String, String)>,
    payload: Result<Json<LessonProgressRequest>, JsonRejection>,
) -> ApiResult<Json<LessonProgress>> {
    let enrollment_id: EnrollmentId = enrollment_id.parse()?;
    let lesson_id: LessonId = lesson_id.parse()?;
    let Json(body) = payload?;
    debug!(enrollment = %enrollment_id, lesson = %lesson_id, "update lesson progress");

    let record = services
        .progress()
        .update_lesson_progress(
            &enrollment_id,
            &lesson_id,
            body.completed,
            body.video_progress,
        )
        .await?;
    Ok(Json(record))
}

pub(crate) async fn get_lesson_progress(
    State(services): State<AppServices>,
    Path((enrollment_id, lesson_id)): Path<(String, String)>,
) -> ApiResult<Json<LessonProgress>> {
    let enrollment_id: EnrollmentId = enrollment_id.parse()?;
    let lesson_id: LessonId = lesson_id.parse()?;
    let record = services
        .progress()
        .get_lesson_progress(&enrollment_id, &lesson_id)
        .await?;
    Ok(Json(record))
}

pub(crate) async fn get_enrollment_progress(
    State(services): State<AppServices>,
    Path(enrollment_id): Path<String>,
) -> ApiResult<Json<EnrollmentProgress>> {
    let enrollment_id: EnrollmentId = enrollment_id.parse()?;
    let summary = services
        .progress()
        .get_enrollment_progress(&enrollment_id)
        .await?;
    Ok(Json(summary))
}

//
// ─── ENROLLMENTS ───────────────────────────────────────────────────────────────
//

pub(crate) async fn enroll(
    State(services): State<AppServices>,
    Path(course_id): Path<String>,
    payload: Result<Json<EnrollRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EnrollmentResponse>)> {
    let course_id: CourseId = course_id.parse()?;
    let Json(body) = payload?;
    let user_id: UserId = body.user_id.parse()?;

    let enrollment = services.enrollments().enroll(&course_id, &user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(EnrollmentResponse::from(&enrollment)),
    ))
}

pub(crate) async fn get_enrollment(
    State(services): State<AppServices>,
    Path(enrollment_id): Path<String>,
) -> ApiResult<Json<EnrollmentResponse>> {
    let enrollment_id: EnrollmentId = enrollment_id.parse()?;
    let enrollment = services.enrollments().get(&enrollment_id).await?;
    Ok(Json(EnrollmentResponse::from(&enrollment)))
}

//
// ─── ELIGIBILITY ───────────────────────────────────────────────────────────────
//

pub(crate) async fn get_eligibility(
    State(services): State<AppServices>,
    Path(enrollment_id): Path<String>,
) -> ApiResult<Json<EligibilityReport>> {
    let enrollment_id: EnrollmentId = enrollment_id.parse()?;
    let report = services.eligibility().evaluate(&enrollment_id).await?;
    Ok(Json(report))
}

pub(crate) async fn complete(
    State(services): State<AppServices>,
    Path(enrollment_id): Path<String>,
) -> ApiResult<Json<CompletionResponse>> {
    let enrollment_id: EnrollmentId = enrollment_id.parse()?;
    let outcome = services
        .eligibility()
        .complete_if_eligible(&enrollment_id)
        .await?;
    Ok(Json(outcome.into()))
}

//
// ─── ASSESSMENTS ───────────────────────────────────────────────────────────────
//

pub(crate) async fn record_quiz_attempt(
    State(services): State<AppServices>,
    Path((enrollment_id, quiz_id)): Path<(String, String)>,
    payload: Result<Json<QuizAttemptRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<QuizAttempt>)> {
    let enrollment_id: EnrollmentId = enrollment_id.parse()?;
    let quiz_id: QuizId = quiz_id.parse()?;
    let Json(body) = payload?;

    let attempt = services
        .assessments()
        .record_quiz_attempt(&enrollment_id, &quiz_id, body.score)
        .await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

pub(crate) async fn put_assignment(
    State(services): State<AppServices>,
    Path((enrollment_id, assignment_id)): Path<(String, String)>,
    payload: Result<Json<AssignmentRequest>, JsonRejection>,
) -> ApiResult<Json<AssignmentSubmission>> {
    let enrollment_id: EnrollmentId = enrollment_id.parse()?;
    let assignment_id: AssignmentId = assignment_id.parse()?;
    let Json(body) = payload?;

    let assessments = services.assessments();
    let submission = match body.passed {
        None => {
            assessments
                .submit_assignment(&enrollment_id, &assignment_id)
                .await?
        }
        Some(passed) => {
            assessments
                .grade_assignment(&enrollment_id, &assignment_id, passed)
                .await?
        }
    };
    Ok(Json(submission))
}

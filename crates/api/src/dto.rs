//! Request and response bodies. All JSON is camelCase.

use chrono::{DateTime, Utc};
use course_core::eligibility::EligibilityReport;
use course_core::model::{CourseId, Enrollment, EnrollmentId, EnrollmentStatus, Percent, UserId};
use serde::{Deserialize, Serialize};
use services::CompletionOutcome;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgressRequest {
    pub completed: bool,
    /// Watch position; older clients send it as `timeSpent`.
    #[serde(default, alias = "timeSpent")]
    pub video_progress: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizAttemptRequest {
    pub score: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentRequest {
    /// Absent: submit for grading. Present: grade the existing submission.
    #[serde(default)]
    pub passed: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    pub id: EnrollmentId,
    pub course_id: CourseId,
    pub user_id: UserId,
    pub status: EnrollmentStatus,
    pub progress_percent: Percent,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Enrollment> for EnrollmentResponse {
    fn from(e: &Enrollment) -> Self {
        Self {
            id: e.id().clone(),
            course_id: e.course_id().clone(),
            user_id: e.user_id().clone(),
            status: e.status(),
            progress_percent: e.progress_percent(),
            enrolled_at: e.enrolled_at(),
            completed_at: e.completed_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    #[serde(flatten)]
    pub report: EligibilityReport,
    pub newly_completed: bool,
    pub enrollment: EnrollmentResponse,
}

impl From<CompletionOutcome> for CompletionResponse {
    fn from(outcome: CompletionOutcome) -> Self {
        Self {
            enrollment: EnrollmentResponse::from(&outcome.enrollment),
            newly_completed: outcome.newly_completed,
            report: outcome.report,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

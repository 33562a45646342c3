use chrono::{DateTime, Utc};
use course_core::model::{
    AssignmentId, AssignmentSubmission, CourseId, Enrollment, EnrollmentId, EnrollmentStatus,
    Lesson, LessonId, LessonProgress, Percent, QuizAttempt, QuizId, Section, SectionId,
    SubmissionStatus, UserId,
};
use sqlx::Row;
use sqlx::error::ErrorKind;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps driver errors, turning constraint violations into domain outcomes.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        match db.kind() {
            ErrorKind::UniqueViolation => return StorageError::Conflict,
            ErrorKind::ForeignKeyViolation => return StorageError::NotFound,
            _ => {}
        }
    }
    StorageError::Connection(e.to_string())
}

pub(crate) fn position_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn percent_from_i64(field: &'static str, v: i64) -> Result<Percent, StorageError> {
    u32::try_from(v)
        .ok()
        .and_then(|v| Percent::new(v).ok())
        .ok_or_else(|| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_section_row(row: &SqliteRow) -> Result<Section, StorageError> {
    Section::new(
        SectionId::new(row.try_get::<String, _>("id").map_err(ser)?),
        CourseId::new(row.try_get::<String, _>("course_id").map_err(ser)?),
        row.try_get::<String, _>("title").map_err(ser)?,
        position_from_i64("position", row.try_get("position").map_err(ser)?)?,
    )
    .map_err(ser)
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    Lesson::new(
        LessonId::new(row.try_get::<String, _>("id").map_err(ser)?),
        SectionId::new(row.try_get::<String, _>("section_id").map_err(ser)?),
        row.try_get::<String, _>("title").map_err(ser)?,
        position_from_i64("position", row.try_get("position").map_err(ser)?)?,
    )
    .map_err(ser)
}

pub(crate) fn map_enrollment_row(row: &SqliteRow) -> Result<Enrollment, StorageError> {
    let status: String = row.try_get("status").map_err(ser)?;
    let status: EnrollmentStatus = status.parse().map_err(ser)?;

    Enrollment::from_persisted(
        EnrollmentId::new(row.try_get::<String, _>("id").map_err(ser)?),
        CourseId::new(row.try_get::<String, _>("course_id").map_err(ser)?),
        UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        status,
        percent_from_i64(
            "progress_percent",
            row.try_get("progress_percent").map_err(ser)?,
        )?,
        row.try_get("enrolled_at").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<LessonProgress, StorageError> {
    let completed_at: Option<DateTime<Utc>> = row.try_get("completed_at").map_err(ser)?;
    Ok(LessonProgress {
        enrollment_id: EnrollmentId::new(row.try_get::<String, _>("enrollment_id").map_err(ser)?),
        lesson_id: LessonId::new(row.try_get::<String, _>("lesson_id").map_err(ser)?),
        is_completed: row.try_get::<bool, _>("is_completed").map_err(ser)?,
        completed_at,
        video_progress: row.try_get("video_progress").map_err(ser)?,
        last_viewed_at: row.try_get("last_viewed_at").map_err(ser)?,
    })
}

pub(crate) fn map_quiz_attempt_row(row: &SqliteRow) -> Result<QuizAttempt, StorageError> {
    let score: i64 = row.try_get("score").map_err(ser)?;
    Ok(QuizAttempt {
        enrollment_id: EnrollmentId::new(row.try_get::<String, _>("enrollment_id").map_err(ser)?),
        quiz_id: QuizId::new(row.try_get::<String, _>("quiz_id").map_err(ser)?),
        score: percent_from_i64("score", score)?,
        submitted_at: row.try_get("submitted_at").map_err(ser)?,
    })
}

pub(crate) fn map_submission_row(row: &SqliteRow) -> Result<AssignmentSubmission, StorageError> {
    let status: String = row.try_get("status").map_err(ser)?;
    let status: SubmissionStatus = status.parse().map_err(ser)?;
    Ok(AssignmentSubmission {
        enrollment_id: EnrollmentId::new(row.try_get::<String, _>("enrollment_id").map_err(ser)?),
        assignment_id: AssignmentId::new(row.try_get::<String, _>("assignment_id").map_err(ser)?),
        status,
        submitted_at: row.try_get("submitted_at").map_err(ser)?,
        graded_at: row.try_get("graded_at").map_err(ser)?,
    })
}

//! Shared error types for the services crate.

use thiserror::Error;

use course_core::model::{
    AssessmentError, AssignmentId, CourseError, CourseId, EnrollmentError, EnrollmentId, LessonId,
    ProgressError, SectionId, UserId,
};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("enrollment {0} not found")]
    EnrollmentNotFound(EnrollmentId),
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error("lesson {lesson_id} not found in course {course_id}")]
    LessonNotInCourse {
        lesson_id: LessonId,
        course_id: CourseId,
    },
    #[error("no progress for lesson {lesson_id} in enrollment {enrollment_id}")]
    ProgressNotFound {
        enrollment_id: EnrollmentId,
        lesson_id: LessonId,
    },
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `EnrollmentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnrollmentServiceError {
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error("enrollment {0} not found")]
    EnrollmentNotFound(EnrollmentId),
    #[error("user {user_id} is already enrolled in course {course_id}")]
    AlreadyEnrolled { user_id: UserId, course_id: CourseId },
    #[error(transparent)]
    Enrollment(#[from] EnrollmentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AssessmentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssessmentServiceError {
    #[error("enrollment {0} not found")]
    EnrollmentNotFound(EnrollmentId),
    #[error("no submission of assignment {assignment_id} in enrollment {enrollment_id}")]
    SubmissionNotFound {
        enrollment_id: EnrollmentId,
        assignment_id: AssignmentId,
    },
    #[error(transparent)]
    Assessment(#[from] AssessmentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `EligibilityService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EligibilityServiceError {
    #[error("enrollment {0} not found")]
    EnrollmentNotFound(EnrollmentId),
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error(transparent)]
    Enrollment(#[from] EnrollmentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CourseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseServiceError {
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error("section {0} not found")]
    SectionNotFound(SectionId),
    #[error("lesson {lesson_id} not found in course {course_id}")]
    UnknownLesson {
        lesson_id: LessonId,
        course_id: CourseId,
    },
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}

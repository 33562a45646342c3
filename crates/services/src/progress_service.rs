use std::sync::Arc;

use course_core::model::{
    CourseId, EnrollmentId, LessonId, LessonProgress, LessonProgressUpdate, Percent,
};
use serde::Serialize;
use storage::repository::{CourseRepository, EnrollmentRepository, ProgressRepository};
use tracing::debug;

use crate::Clock;
use crate::error::ProgressServiceError;

/// Overall progress of one enrollment together with its lesson records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentProgress {
    pub enrollment_id: EnrollmentId,
    pub course_id: CourseId,
    /// Cached percentage as last written by the aggregator.
    pub overall_progress: Percent,
    pub completed_lessons: usize,
    pub total_lessons: usize,
    pub lesson_progress: Vec<LessonProgress>,
}

/// Records lesson interactions and keeps the enrollment percentage current.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            enrollments,
            progress,
        }
    }

    /// Upsert the progress record for a lesson, then recalculate the enrollment.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::EnrollmentNotFound` for an unknown enrollment.
    /// Returns `ProgressServiceError::LessonNotInCourse` if the lesson is not part
    /// of the enrollment's course.
    /// Returns `ProgressServiceError::Progress` for an invalid video position.
    /// Returns `ProgressServiceError::Storage` if persistence fails.
    pub async fn update_lesson_progress(
        &self,
        enrollment_id: &EnrollmentId,
        lesson_id: &LessonId,
        completed: bool,
        video_progress: Option<f64>,
    ) -> Result<LessonProgress, ProgressServiceError> {
        let enrollment = self
            .enrollments
            .get_enrollment(enrollment_id)
            .await?
            .ok_or_else(|| ProgressServiceError::EnrollmentNotFound(enrollment_id.clone()))?;

        let course = self
            .courses
            .get_course(enrollment.course_id())
            .await?
            .ok_or_else(|| ProgressServiceError::CourseNotFound(enrollment.course_id().clone()))?;

        if !course.contains_lesson(lesson_id) {
            return Err(ProgressServiceError::LessonNotInCourse {
                lesson_id: lesson_id.clone(),
                course_id: course.id().clone(),
            });
        }

        let update = LessonProgressUpdate::new(
            enrollment_id.clone(),
            lesson_id.clone(),
            completed,
            video_progress,
            self.clock.now(),
        )?;
        let record = self.progress.upsert_progress(&update).await?;
        debug!(
            enrollment = %enrollment_id,
            lesson = %lesson_id,
            completed,
            "lesson progress recorded"
        );

        self.recalculate_enrollment_progress(enrollment_id).await?;
        Ok(record)
    }

    /// Recompute the enrollment percentage from its lesson records.
    ///
    /// A missing enrollment is not an error; `Ok(None)` is returned and nothing
    /// is written.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the update fails.
    pub async fn recalculate_enrollment_progress(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<Option<Percent>, ProgressServiceError> {
        let percent = self.enrollments.recalculate_progress(enrollment_id).await?;
        match percent {
            Some(percent) => {
                debug!(enrollment = %enrollment_id, %percent, "enrollment progress recalculated");
            }
            None => debug!(enrollment = %enrollment_id, "enrollment missing; skipping recalculation"),
        }
        Ok(percent)
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::ProgressNotFound` if the lesson has no record.
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn get_lesson_progress(
        &self,
        enrollment_id: &EnrollmentId,
        lesson_id: &LessonId,
    ) -> Result<LessonProgress, ProgressServiceError> {
        self.progress
            .get_progress(enrollment_id, lesson_id)
            .await?
            .ok_or_else(|| ProgressServiceError::ProgressNotFound {
                enrollment_id: enrollment_id.clone(),
                lesson_id: lesson_id.clone(),
            })
    }

    /// Summary of an enrollment using the cached percentage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::EnrollmentNotFound` for an unknown enrollment.
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn get_enrollment_progress(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<EnrollmentProgress, ProgressServiceError> {
        let enrollment = self
            .enrollments
            .get_enrollment(enrollment_id)
            .await?
            .ok_or_else(|| ProgressServiceError::EnrollmentNotFound(enrollment_id.clone()))?;

        let total_lessons = self
            .courses
            .get_course(enrollment.course_id())
            .await?
            .map_or(0, |course| course.total_lessons());

        let lesson_progress = self.progress.list_progress(enrollment_id).await?;
        let completed_lessons = lesson_progress.iter().filter(|p| p.is_completed).count();

        Ok(EnrollmentProgress {
            enrollment_id: enrollment_id.clone(),
            course_id: enrollment.course_id().clone(),
            overall_progress: enrollment.progress_percent(),
            completed_lessons,
            total_lessons,
            lesson_progress,
        })
    }
}

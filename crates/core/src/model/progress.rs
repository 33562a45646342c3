use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{EnrollmentId, LessonId};

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("video progress must be a finite, non-negative number, got {0}")]
    InvalidVideoProgress(f64),
}

/// Completion state of one lesson for one enrollment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub enrollment_id: EnrollmentId,
    pub lesson_id: LessonId,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub video_progress: Option<f64>,
    pub last_viewed_at: DateTime<Utc>,
}

/// A learner interaction with a lesson, applied as an upsert on
/// `(enrollment_id, lesson_id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonProgressUpdate {
    enrollment_id: EnrollmentId,
    lesson_id: LessonId,
    completed: bool,
    video_progress: Option<f64>,
    at: DateTime<Utc>,
}

impl LessonProgressUpdate {
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidVideoProgress` for negative or non-finite positions.
    pub fn new(
        enrollment_id: EnrollmentId,
        lesson_id: LessonId,
        completed: bool,
        video_progress: Option<f64>,
        at: DateTime<Utc>,
    ) -> Result<Self, ProgressError> {
        if let Some(v) = video_progress.filter(|v| !v.is_finite() || *v < 0.0) {
            return Err(ProgressError::InvalidVideoProgress(v));
        }
        Ok(Self {
            enrollment_id,
            lesson_id,
            completed,
            video_progress,
            at,
        })
    }

    #[must_use]
    pub fn enrollment_id(&self) -> &EnrollmentId {
        &self.enrollment_id
    }

    #[must_use]
    pub fn lesson_id(&self) -> &LessonId {
        &self.lesson_id
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn video_progress(&self) -> Option<f64> {
        self.video_progress
    }

    #[must_use]
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    /// The record that results from applying this update on top of `existing`.
    ///
    /// - `completed_at` is cleared when not completed, keeps the first completion
    ///   time when already completed, and is `at` otherwise.
    /// - A missing `video_progress` keeps the stored position.
    /// - `last_viewed_at` is always `at`.
    ///
    /// Storage adapters that upsert in SQL must implement the same rules.
    #[must_use]
    pub fn apply(&self, existing: Option<&LessonProgress>) -> LessonProgress {
        let completed_at = match (self.completed, existing) {
            (false, _) => None,
            (true, Some(prev)) if prev.is_completed => prev.completed_at.or(Some(self.at)),
            (true, _) => Some(self.at),
        };
        let video_progress = self
            .video_progress
            .or_else(|| existing.and_then(|p| p.video_progress));

        LessonProgress {
            enrollment_id: self.enrollment_id.clone(),
            lesson_id: self.lesson_id.clone(),
            is_completed: self.completed,
            completed_at,
            video_progress,
            last_viewed_at: self.at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn update(completed: bool, video: Option<f64>, minutes: i64) -> LessonProgressUpdate {
        LessonProgressUpdate::new(
            EnrollmentId::new("e1"),
            LessonId::new("l1"),
            completed,
            video,
            fixed_now() + Duration::minutes(minutes),
        )
        .unwrap()
    }

    #[test]
    fn first_completion_stamps_completed_at() {
        let record = update(true, None, 0).apply(None);
        assert!(record.is_completed);
        assert_eq!(record.completed_at, Some(fixed_now()));
        assert_eq!(record.last_viewed_at, fixed_now());
        assert_eq!(record.video_progress, None);
    }

    #[test]
    fn repeating_completion_keeps_state_but_advances_last_viewed() {
        let first = update(true, Some(12.5), 0).apply(None);
        let second = update(true, Some(12.5), 10).apply(Some(&first));
        assert_eq!(second.completed_at, first.completed_at);
        assert_eq!(second.video_progress, Some(12.5));
        assert_eq!(second.last_viewed_at, fixed_now() + Duration::minutes(10));
    }

    #[test]
    fn uncompleting_clears_completed_at() {
        let done = update(true, None, 0).apply(None);
        let undone = update(false, None, 5).apply(Some(&done));
        assert!(!undone.is_completed);
        assert_eq!(undone.completed_at, None);
    }

    #[test]
    fn missing_video_progress_keeps_previous_position() {
        let watched = update(false, Some(42.0), 0).apply(None);
        let revisit = update(false, None, 1).apply(Some(&watched));
        assert_eq!(revisit.video_progress, Some(42.0));
    }

    #[test]
    fn rejects_bad_video_progress() {
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let err = LessonProgressUpdate::new(
                EnrollmentId::new("e1"),
                LessonId::new("l1"),
                false,
                Some(bad),
                fixed_now(),
            );
            assert!(err.is_err());
        }
    }
}

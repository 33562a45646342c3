use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, EnrollmentId, UserId};
use crate::model::percent::Percent;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EnrollmentError {
    #[error("completed_at is before enrolled_at")]
    InvalidTimeRange,

    #[error("enrollment is {0}, expected active")]
    NotActive(EnrollmentStatus),

    #[error("unknown enrollment status: {0}")]
    UnknownStatus(String),

    #[error("completion can only be set through eligibility evaluation")]
    CompletionRequiresEvaluation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Cancelled,
    Expired,
}

impl EnrollmentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Cancelled => "cancelled",
            EnrollmentStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = EnrollmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            _ => Err(EnrollmentError::UnknownStatus(s.to_owned())),
        }
    }
}

/// A learner's registration in a course.
///
/// `progress_percent` is a cache maintained by the progress aggregator; nothing
/// else writes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    id: EnrollmentId,
    course_id: CourseId,
    user_id: UserId,
    status: EnrollmentStatus,
    progress_percent: Percent,
    enrolled_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    /// New active enrollment at 0%.
    #[must_use]
    pub fn new(
        id: EnrollmentId,
        course_id: CourseId,
        user_id: UserId,
        enrolled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            course_id,
            user_id,
            status: EnrollmentStatus::Active,
            progress_percent: Percent::ZERO,
            enrolled_at,
            completed_at: None,
        }
    }

    /// Rehydrate an enrollment from storage.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::InvalidTimeRange` if `completed_at` precedes `enrolled_at`.
    pub fn from_persisted(
        id: EnrollmentId,
        course_id: CourseId,
        user_id: UserId,
        status: EnrollmentStatus,
        progress_percent: Percent,
        enrolled_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, EnrollmentError> {
        if completed_at.is_some_and(|c| c < enrolled_at) {
            return Err(EnrollmentError::InvalidTimeRange);
        }
        Ok(Self {
            id,
            course_id,
            user_id,
            status,
            progress_percent,
            enrolled_at,
            completed_at,
        })
    }

    /// # Errors
    ///
    /// Returns `EnrollmentError::NotActive` unless the enrollment is active.
    pub fn mark_completed(&mut self, at: DateTime<Utc>) -> Result<(), EnrollmentError> {
        if self.status != EnrollmentStatus::Active {
            return Err(EnrollmentError::NotActive(self.status));
        }
        if at < self.enrolled_at {
            return Err(EnrollmentError::InvalidTimeRange);
        }
        self.status = EnrollmentStatus::Completed;
        self.completed_at = Some(at);
        Ok(())
    }

    /// Move to a non-completed status (cancel, expire, reactivate).
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::CompletionRequiresEvaluation` for `Completed`,
    /// which is only reachable through `mark_completed`.
    pub fn set_status(&mut self, status: EnrollmentStatus) -> Result<(), EnrollmentError> {
        if status == EnrollmentStatus::Completed {
            return Err(EnrollmentError::CompletionRequiresEvaluation);
        }
        self.status = status;
        self.completed_at = None;
        Ok(())
    }

    /// Overwrite the cached percentage. Only the progress aggregator calls this.
    pub fn record_progress(&mut self, percent: Percent) {
        self.progress_percent = percent;
    }

    #[must_use]
    pub fn id(&self) -> &EnrollmentId {
        &self.id
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn status(&self) -> EnrollmentStatus {
        self.status
    }

    #[must_use]
    pub fn progress_percent(&self) -> Percent {
        self.progress_percent
    }

    #[must_use]
    pub fn enrolled_at(&self) -> DateTime<Utc> {
        self.enrolled_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == EnrollmentStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn enrollment() -> Enrollment {
        Enrollment::new(
            EnrollmentId::new("e1"),
            CourseId::new("c1"),
            UserId::new("u1"),
            fixed_now(),
        )
    }

    #[test]
    fn starts_active_at_zero() {
        let e = enrollment();
        assert!(e.is_active());
        assert_eq!(e.progress_percent(), Percent::ZERO);
        assert_eq!(e.completed_at(), None);
    }

    #[test]
    fn completes_once() {
        let mut e = enrollment();
        let at = fixed_now() + Duration::days(3);
        e.mark_completed(at).unwrap();
        assert_eq!(e.status(), EnrollmentStatus::Completed);
        assert_eq!(e.completed_at(), Some(at));
        assert_eq!(
            e.mark_completed(at),
            Err(EnrollmentError::NotActive(EnrollmentStatus::Completed))
        );
    }

    #[test]
    fn completed_status_cannot_be_set_directly() {
        let mut e = enrollment();
        assert_eq!(
            e.set_status(EnrollmentStatus::Completed),
            Err(EnrollmentError::CompletionRequiresEvaluation)
        );
        e.set_status(EnrollmentStatus::Cancelled).unwrap();
        assert!(!e.is_active());
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("ACTIVE".parse(), Ok(EnrollmentStatus::Active));
        assert_eq!("expired".parse(), Ok(EnrollmentStatus::Expired));
        assert!("paused".parse::<EnrollmentStatus>().is_err());
    }

    #[test]
    fn persisted_completion_before_enrollment_is_rejected() {
        let err = Enrollment::from_persisted(
            EnrollmentId::new("e1"),
            CourseId::new("c1"),
            UserId::new("u1"),
            EnrollmentStatus::Completed,
            Percent::FULL,
            fixed_now(),
            Some(fixed_now() - Duration::seconds(1)),
        )
        .unwrap_err();
        assert_eq!(err, EnrollmentError::InvalidTimeRange);
    }
}

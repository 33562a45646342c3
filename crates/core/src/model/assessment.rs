use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{AssignmentId, EnrollmentId, QuizId};
use crate::model::percent::{Percent, PercentError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssessmentError {
    #[error("invalid quiz score: {0}")]
    InvalidScore(#[from] PercentError),

    #[error("unknown submission status: {0}")]
    UnknownStatus(String),

    #[error("graded_at is before submitted_at")]
    InvalidTimeRange,
}

/// One scored attempt at a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub enrollment_id: EnrollmentId,
    pub quiz_id: QuizId,
    pub score: Percent,
    pub submitted_at: DateTime<Utc>,
}

impl QuizAttempt {
    /// # Errors
    ///
    /// Returns `AssessmentError::InvalidScore` if `score` is above 100.
    pub fn new(
        enrollment_id: EnrollmentId,
        quiz_id: QuizId,
        score: u32,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, AssessmentError> {
        Ok(Self {
            enrollment_id,
            quiz_id,
            score: Percent::new(score)?,
            submitted_at,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    Passed,
    Failed,
}

impl SubmissionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Passed => "passed",
            SubmissionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = AssessmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            _ => Err(AssessmentError::UnknownStatus(s.to_owned())),
        }
    }
}

/// The latest submission of an assignment for an enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSubmission {
    pub enrollment_id: EnrollmentId,
    pub assignment_id: AssignmentId,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
}

impl AssignmentSubmission {
    #[must_use]
    pub fn submit(
        enrollment_id: EnrollmentId,
        assignment_id: AssignmentId,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            enrollment_id,
            assignment_id,
            status: SubmissionStatus::Pending,
            submitted_at,
            graded_at: None,
        }
    }

    /// # Errors
    ///
    /// Returns `AssessmentError::InvalidTimeRange` if grading predates submission.
    pub fn grade(&mut self, passed: bool, at: DateTime<Utc>) -> Result<(), AssessmentError> {
        if at < self.submitted_at {
            return Err(AssessmentError::InvalidTimeRange);
        }
        self.status = if passed {
            SubmissionStatus::Passed
        } else {
            SubmissionStatus::Failed
        };
        self.graded_at = Some(at);
        Ok(())
    }

    #[must_use]
    pub fn is_graded(&self) -> bool {
        self.status != SubmissionStatus::Pending
    }
}

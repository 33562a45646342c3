use std::sync::Arc;

use course_core::model::{AssignmentId, AssignmentSubmission, EnrollmentId, QuizAttempt, QuizId};
use storage::repository::{AssessmentRepository, EnrollmentRepository};
use tracing::debug;

use crate::Clock;
use crate::error::AssessmentServiceError;

/// Records quiz attempts and assignment submissions for enrollments.
#[derive(Clone)]
pub struct AssessmentService {
    clock: Clock,
    enrollments: Arc<dyn EnrollmentRepository>,
    assessments: Arc<dyn AssessmentRepository>,
}

impl AssessmentService {
    #[must_use]
    pub fn new(
        clock: Clock,
        enrollments: Arc<dyn EnrollmentRepository>,
        assessments: Arc<dyn AssessmentRepository>,
    ) -> Self {
        Self {
            clock,
            enrollments,
            assessments,
        }
    }

    async fn ensure_enrollment(&self, id: &EnrollmentId) -> Result<(), AssessmentServiceError> {
        if self.enrollments.get_enrollment(id).await?.is_none() {
            return Err(AssessmentServiceError::EnrollmentNotFound(id.clone()));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AssessmentServiceError::Assessment` if `score` exceeds 100.
    /// Returns `AssessmentServiceError::EnrollmentNotFound` for an unknown enrollment.
    /// Returns `AssessmentServiceError::Storage` if persistence fails.
    pub async fn record_quiz_attempt(
        &self,
        enrollment_id: &EnrollmentId,
        quiz_id: &QuizId,
        score: u32,
    ) -> Result<QuizAttempt, AssessmentServiceError> {
        let attempt = QuizAttempt::new(
            enrollment_id.clone(),
            quiz_id.clone(),
            score,
            self.clock.now(),
        )?;
        self.ensure_enrollment(enrollment_id).await?;
        let attempt_id = self.assessments.append_quiz_attempt(&attempt).await?;
        debug!(enrollment = %enrollment_id, quiz = %quiz_id, score, attempt_id, "quiz attempt recorded");
        Ok(attempt)
    }

    /// Submit (or resubmit) an assignment; the submission starts pending.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentServiceError::EnrollmentNotFound` for an unknown enrollment.
    /// Returns `AssessmentServiceError::Storage` if persistence fails.
    pub async fn submit_assignment(
        &self,
        enrollment_id: &EnrollmentId,
        assignment_id: &AssignmentId,
    ) -> Result<AssignmentSubmission, AssessmentServiceError> {
        self.ensure_enrollment(enrollment_id).await?;
        let submission = AssignmentSubmission::submit(
            enrollment_id.clone(),
            assignment_id.clone(),
            self.clock.now(),
        );
        self.assessments.upsert_submission(&submission).await?;
        Ok(submission)
    }

    /// # Errors
    ///
    /// Returns `AssessmentServiceError::SubmissionNotFound` if nothing was submitted.
    /// Returns `AssessmentServiceError::Assessment` if grading predates submission.
    /// Returns `AssessmentServiceError::Storage` if persistence fails.
    pub async fn grade_assignment(
        &self,
        enrollment_id: &EnrollmentId,
        assignment_id: &AssignmentId,
        passed: bool,
    ) -> Result<AssignmentSubmission, AssessmentServiceError> {
        let mut submission = self
            .assessments
            .get_submission(enrollment_id, assignment_id)
            .await?
            .ok_or_else(|| AssessmentServiceError::SubmissionNotFound {
                enrollment_id: enrollment_id.clone(),
                assignment_id: assignment_id.clone(),
            })?;
        submission.grade(passed, self.clock.now())?;
        self.assessments.upsert_submission(&submission).await?;
        debug!(enrollment = %enrollment_id, assignment = %assignment_id, passed, "assignment graded");
        Ok(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use course_core::model::{
        CompletionCriteria, Course, CourseId, Enrollment, SubmissionStatus, UserId,
    };
    use course_core::time::fixed_now;
    use storage::repository::{CourseRepository, InMemoryRepository};

    async fn service() -> AssessmentService {
        let repo = Arc::new(InMemoryRepository::new());
        let course = Course::new(
            CourseId::new("c1"),
            "Course",
            CompletionCriteria::default(),
            fixed_now(),
        )
        .unwrap();
        repo.insert_course(&course).await.unwrap();
        repo.insert_enrollment(&Enrollment::new(
            EnrollmentId::new("e1"),
            CourseId::new("c1"),
            UserId::new("u1"),
            fixed_now(),
        ))
        .await
        .unwrap();
        AssessmentService::new(Clock::Fixed(fixed_now()), repo.clone(), repo)
    }

    #[tokio::test]
    async fn out_of_range_score_is_rejected() {
        let service = service().await;
        let err = service
            .record_quiz_attempt(&EnrollmentId::new("e1"), &QuizId::new("q1"), 101)
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentServiceError::Assessment(_)));
    }

    #[tokio::test]
    async fn attempts_require_an_enrollment() {
        let service = service().await;
        let err = service
            .record_quiz_attempt(&EnrollmentId::new("ghost"), &QuizId::new("q1"), 80)
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentServiceError::EnrollmentNotFound(_)));
    }

    #[tokio::test]
    async fn submit_then_grade() {
        let service = service().await;
        let e1 = EnrollmentId::new("e1");
        let a1 = AssignmentId::new("a1");

        let pending = service.submit_assignment(&e1, &a1).await.unwrap();
        assert_eq!(pending.status, SubmissionStatus::Pending);

        let graded = service.grade_assignment(&e1, &a1, true).await.unwrap();
        assert_eq!(graded.status, SubmissionStatus::Passed);
        assert_eq!(graded.graded_at, Some(fixed_now()));
    }

    #[tokio::test]
    async fn grading_without_submission_is_not_found() {
        let service = service().await;
        let err = service
            .grade_assignment(&EnrollmentId::new("e1"), &AssignmentId::new("a9"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentServiceError::SubmissionNotFound { .. }));
    }
}

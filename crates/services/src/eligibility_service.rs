use std::sync::Arc;

use course_core::eligibility::{EligibilityReport, LearnerState, evaluate};
use course_core::model::{Enrollment, EnrollmentId};
use storage::repository::{
    AssessmentRepository, CourseRepository, EnrollmentRepository, ProgressRepository,
};
use tracing::info;

use crate::Clock;
use crate::error::EligibilityServiceError;

/// Result of a completion request.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub report: EligibilityReport,
    pub enrollment: Enrollment,
    /// True only when this call moved the enrollment to completed.
    pub newly_completed: bool,
}

/// Evaluates completion criteria for enrollments and records completion.
#[derive(Clone)]
pub struct EligibilityService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    progress: Arc<dyn ProgressRepository>,
    assessments: Arc<dyn AssessmentRepository>,
}

impl EligibilityService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        progress: Arc<dyn ProgressRepository>,
        assessments: Arc<dyn AssessmentRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            enrollments,
            progress,
            assessments,
        }
    }

    async fn load(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<(Enrollment, EligibilityReport), EligibilityServiceError> {
        let enrollment = self
            .enrollments
            .get_enrollment(enrollment_id)
            .await?
            .ok_or_else(|| EligibilityServiceError::EnrollmentNotFound(enrollment_id.clone()))?;
        let course = self
            .courses
            .get_course(enrollment.course_id())
            .await?
            .ok_or_else(|| {
                EligibilityServiceError::CourseNotFound(enrollment.course_id().clone())
            })?;

        let state = LearnerState {
            course_lessons: course.lessons().map(|l| l.id().clone()).collect(),
            completed_lessons: self
                .progress
                .list_progress(enrollment_id)
                .await?
                .into_iter()
                .filter(|p| p.is_completed)
                .map(|p| p.lesson_id)
                .collect(),
            quiz_attempts: self.assessments.list_quiz_attempts(enrollment_id).await?,
            assignments: self.assessments.list_submissions(enrollment_id).await?,
            progress: enrollment.progress_percent(),
        };

        let report = evaluate(course.criteria(), &state);
        Ok((enrollment, report))
    }

    /// Evaluate the course's completion criteria against the enrollment.
    ///
    /// # Errors
    ///
    /// Returns `EligibilityServiceError::EnrollmentNotFound` or `CourseNotFound`
    /// when either record is missing.
    /// Returns `EligibilityServiceError::Storage` if repository access fails.
    pub async fn evaluate(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<EligibilityReport, EligibilityServiceError> {
        let (_, report) = self.load(enrollment_id).await?;
        Ok(report)
    }

    /// Evaluate and, when eligible and still active, mark the enrollment completed.
    ///
    /// # Errors
    ///
    /// Returns `EligibilityServiceError::EnrollmentNotFound` or `CourseNotFound`
    /// when either record is missing.
    /// Returns `EligibilityServiceError::Storage` if persistence fails.
    pub async fn complete_if_eligible(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<CompletionOutcome, EligibilityServiceError> {
        let (mut enrollment, report) = self.load(enrollment_id).await?;

        let newly_completed = report.eligible && enrollment.is_active();
        if newly_completed {
            enrollment.mark_completed(self.clock.now())?;
            self.enrollments.update_status(&enrollment).await?;
            info!(enrollment = %enrollment_id, "enrollment completed");
        }

        Ok(CompletionOutcome {
            report,
            enrollment,
            newly_completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use course_core::eligibility::Criterion;
    use course_core::model::{
        CompletionCriteria, Course, CourseId, EnrollmentStatus, Lesson, LessonId,
        LessonProgressUpdate, LessonRequirement, Percent, QuizAttempt, QuizId, QuizRequirement,
        Section, SectionId, UserId,
    };
    use course_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    async fn setup(criteria: CompletionCriteria) -> (EligibilityService, Arc<InMemoryRepository>) {
        let repo = Arc::new(InMemoryRepository::new());
        let course_id = CourseId::new("c1");
        let mut course = Course::new(course_id.clone(), "Course", criteria, fixed_now()).unwrap();
        let mut section = Section::new(SectionId::new("s1"), course_id.clone(), "S", 0).unwrap();
        for i in 1..=2 {
            section
                .push_lesson(
                    Lesson::new(LessonId::new(format!("l{i}")), SectionId::new("s1"), "L", i)
                        .unwrap(),
                )
                .unwrap();
        }
        course.push_section(section).unwrap();
        repo.insert_course(&course).await.unwrap();
        repo.insert_enrollment(&Enrollment::new(
            EnrollmentId::new("e1"),
            course_id,
            UserId::new("u1"),
            fixed_now(),
        ))
        .await
        .unwrap();

        let service = EligibilityService::new(
            Clock::Fixed(fixed_now() + Duration::days(1)),
            repo.clone(),
            repo.clone(),
            repo.clone(),
            repo.clone(),
        );
        (service, repo)
    }

    async fn complete(repo: &InMemoryRepository, lesson: &str) {
        let update = LessonProgressUpdate::new(
            EnrollmentId::new("e1"),
            LessonId::new(lesson),
            true,
            None,
            fixed_now(),
        )
        .unwrap();
        repo.upsert_progress(&update).await.unwrap();
        repo.recalculate_progress(&EnrollmentId::new("e1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn incomplete_enrollment_is_not_completed() {
        let (service, repo) = setup(CompletionCriteria::default()).await;
        complete(&repo, "l1").await;

        let outcome = service
            .complete_if_eligible(&EnrollmentId::new("e1"))
            .await
            .unwrap();
        assert!(!outcome.report.eligible);
        assert!(!outcome.newly_completed);
        assert_eq!(outcome.enrollment.status(), EnrollmentStatus::Active);
    }

    #[tokio::test]
    async fn eligible_enrollment_is_completed_once() {
        let (service, repo) = setup(CompletionCriteria::default()).await;
        complete(&repo, "l1").await;
        complete(&repo, "l2").await;

        let e1 = EnrollmentId::new("e1");
        let outcome = service.complete_if_eligible(&e1).await.unwrap();
        assert!(outcome.newly_completed);
        assert_eq!(
            outcome.enrollment.completed_at(),
            Some(fixed_now() + Duration::days(1))
        );

        let again = service.complete_if_eligible(&e1).await.unwrap();
        assert!(again.report.eligible);
        assert!(!again.newly_completed);

        let stored = repo.get_enrollment(&e1).await.unwrap().unwrap();
        assert_eq!(stored.status(), EnrollmentStatus::Completed);
        assert_eq!(stored.progress_percent(), Percent::FULL);
    }

    #[tokio::test]
    async fn quiz_scores_feed_the_report() {
        let criteria = CompletionCriteria::new(
            LessonRequirement::Specific(vec![LessonId::new("l1")]),
            Some(QuizRequirement::new(Percent::new(80).unwrap())),
            false,
            Percent::new(50).unwrap(),
        );
        let (service, repo) = setup(criteria).await;
        complete(&repo, "l1").await;
        let attempt =
            QuizAttempt::new(EnrollmentId::new("e1"), QuizId::new("q1"), 79, fixed_now()).unwrap();
        repo.append_quiz_attempt(&attempt).await.unwrap();

        let report = service.evaluate(&EnrollmentId::new("e1")).await.unwrap();
        assert_eq!(report.failed(), vec![Criterion::QuizPassing]);

        // a later passing retake does not erase the failed attempt
        let retake =
            QuizAttempt::new(EnrollmentId::new("e1"), QuizId::new("q1"), 95, fixed_now()).unwrap();
        repo.append_quiz_attempt(&retake).await.unwrap();

        let report = service.evaluate(&EnrollmentId::new("e1")).await.unwrap();
        assert_eq!(report.failed(), vec![Criterion::QuizPassing]);
        assert_eq!(
            report.check(Criterion::QuizPassing).unwrap().detail,
            "below 80%: q1 (79%)"
        );
    }

    #[tokio::test]
    async fn unknown_enrollment_is_not_found() {
        let (service, _repo) = setup(CompletionCriteria::default()).await;
        let err = service
            .evaluate(&EnrollmentId::new("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, EligibilityServiceError::EnrollmentNotFound(_)));
    }
}

use std::sync::Arc;

use course_core::IdGenerator;
use course_core::model::{CourseId, Enrollment, EnrollmentId, EnrollmentStatus, UserId};
use storage::repository::{CourseRepository, EnrollmentRepository};
use tracing::info;

use crate::Clock;
use crate::error::EnrollmentServiceError;

/// Creates enrollments and manages their lifecycle outside of completion.
#[derive(Clone)]
pub struct EnrollmentService {
    clock: Clock,
    ids: IdGenerator,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl EnrollmentService {
    #[must_use]
    pub fn new(
        clock: Clock,
        ids: IdGenerator,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self {
            clock,
            ids,
            courses,
            enrollments,
        }
    }

    /// Enroll a user in a course at 0%.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::CourseNotFound` for an unknown course.
    /// Returns `EnrollmentServiceError::AlreadyEnrolled` if the user holds an
    /// active enrollment in the course.
    /// Returns `EnrollmentServiceError::Storage` if persistence fails.
    pub async fn enroll(
        &self,
        course_id: &CourseId,
        user_id: &UserId,
    ) -> Result<Enrollment, EnrollmentServiceError> {
        if self.courses.get_course(course_id).await?.is_none() {
            return Err(EnrollmentServiceError::CourseNotFound(course_id.clone()));
        }

        let existing = self.enrollments.list_enrollments(course_id).await?;
        if existing
            .iter()
            .any(|e| e.user_id() == user_id && e.is_active())
        {
            return Err(EnrollmentServiceError::AlreadyEnrolled {
                user_id: user_id.clone(),
                course_id: course_id.clone(),
            });
        }

        let enrollment = Enrollment::new(
            EnrollmentId::new(self.ids.next("enrollment")),
            course_id.clone(),
            user_id.clone(),
            self.clock.now(),
        );
        self.enrollments.insert_enrollment(&enrollment).await?;
        info!(enrollment = %enrollment.id(), course = %course_id, user = %user_id, "enrolled");
        Ok(enrollment)
    }

    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::EnrollmentNotFound` for an unknown id.
    /// Returns `EnrollmentServiceError::Storage` if repository access fails.
    pub async fn get(&self, id: &EnrollmentId) -> Result<Enrollment, EnrollmentServiceError> {
        self.enrollments
            .get_enrollment(id)
            .await?
            .ok_or_else(|| EnrollmentServiceError::EnrollmentNotFound(id.clone()))
    }

    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::Storage` if repository access fails.
    pub async fn list_for_course(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<Enrollment>, EnrollmentServiceError> {
        Ok(self.enrollments.list_enrollments(course_id).await?)
    }

    /// Cancel, expire or reactivate an enrollment.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::Enrollment` when asked for `Completed`.
    /// Returns `EnrollmentServiceError::EnrollmentNotFound` for an unknown id.
    /// Returns `EnrollmentServiceError::Storage` if persistence fails.
    pub async fn set_status(
        &self,
        id: &EnrollmentId,
        status: EnrollmentStatus,
    ) -> Result<Enrollment, EnrollmentServiceError> {
        let mut enrollment = self.get(id).await?;
        enrollment.set_status(status)?;
        self.enrollments.update_status(&enrollment).await?;
        info!(enrollment = %id, %status, "enrollment status changed");
        Ok(enrollment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use course_core::model::CompletionCriteria;
    use course_core::model::Course;
    use course_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    async fn service() -> EnrollmentService {
        let repo = Arc::new(InMemoryRepository::new());
        let course = Course::new(
            CourseId::new("c1"),
            "Course",
            CompletionCriteria::default(),
            fixed_now(),
        )
        .unwrap();
        repo.insert_course(&course).await.unwrap();
        EnrollmentService::new(
            Clock::Fixed(fixed_now()),
            IdGenerator::sequential(),
            repo.clone(),
            repo,
        )
    }

    #[tokio::test]
    async fn enroll_assigns_generated_id() {
        let service = service().await;
        let enrollment = service
            .enroll(&CourseId::new("c1"), &UserId::new("u1"))
            .await
            .unwrap();
        assert_eq!(enrollment.id().as_str(), "enrollment-1");
        assert_eq!(enrollment.enrolled_at(), fixed_now());
        assert!(enrollment.is_active());
    }

    #[tokio::test]
    async fn duplicate_active_enrollment_conflicts() {
        let service = service().await;
        let c1 = CourseId::new("c1");
        let u1 = UserId::new("u1");
        let first = service.enroll(&c1, &u1).await.unwrap();

        let err = service.enroll(&c1, &u1).await.unwrap_err();
        assert!(matches!(err, EnrollmentServiceError::AlreadyEnrolled { .. }));

        service
            .set_status(first.id(), EnrollmentStatus::Cancelled)
            .await
            .unwrap();
        service.enroll(&c1, &u1).await.unwrap();
        assert_eq!(service.list_for_course(&c1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_course_is_not_found() {
        let service = service().await;
        let err = service
            .enroll(&CourseId::new("nope"), &UserId::new("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, EnrollmentServiceError::CourseNotFound(_)));
    }

    #[tokio::test]
    async fn completion_is_not_a_plain_status_change() {
        let service = service().await;
        let enrollment = service
            .enroll(&CourseId::new("c1"), &UserId::new("u1"))
            .await
            .unwrap();
        let err = service
            .set_status(enrollment.id(), EnrollmentStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, EnrollmentServiceError::Enrollment(_)));
    }
}

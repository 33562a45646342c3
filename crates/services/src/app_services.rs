use std::sync::Arc;

use course_core::IdGenerator;
use storage::repository::Storage;

use crate::Clock;
use crate::assessment_service::AssessmentService;
use crate::course_service::CourseService;
use crate::eligibility_service::EligibilityService;
use crate::enrollment_service::EnrollmentService;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;

/// Assembles the services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    courses: Arc<CourseService>,
    enrollments: Arc<EnrollmentService>,
    progress: Arc<ProgressService>,
    assessments: Arc<AssessmentService>,
    eligibility: Arc<EligibilityService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        ids: IdGenerator,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, ids))
    }

    /// Build services over in-memory repositories.
    #[must_use]
    pub fn in_memory(clock: Clock, ids: IdGenerator) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, ids)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, ids: IdGenerator) -> Self {
        let courses = Arc::new(CourseService::new(
            clock,
            ids.clone(),
            Arc::clone(&storage.courses),
        ));
        let enrollments = Arc::new(EnrollmentService::new(
            clock,
            ids,
            Arc::clone(&storage.courses),
            Arc::clone(&storage.enrollments),
        ));
        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.courses),
            Arc::clone(&storage.enrollments),
            Arc::clone(&storage.progress),
        ));
        let assessments = Arc::new(AssessmentService::new(
            clock,
            Arc::clone(&storage.enrollments),
            Arc::clone(&storage.assessments),
        ));
        let eligibility = Arc::new(EligibilityService::new(
            clock,
            Arc::clone(&storage.courses),
            Arc::clone(&storage.enrollments),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.assessments),
        ));

        Self {
            courses,
            enrollments,
            progress,
            assessments,
            eligibility,
        }
    }

    #[must_use]
    pub fn courses(&self) -> Arc<CourseService> {
        Arc::clone(&self.courses)
    }

    #[must_use]
    pub fn enrollments(&self) -> Arc<EnrollmentService> {
        Arc::clone(&self.enrollments)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn assessments(&self) -> Arc<AssessmentService> {
        Arc::clone(&self.assessments)
    }

    #[must_use]
    pub fn eligibility(&self) -> Arc<EligibilityService> {
        Arc::clone(&self.eligibility)
    }
}

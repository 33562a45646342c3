use async_trait::async_trait;
use course_core::model::{
    AssignmentId, AssignmentSubmission, CompletionCriteria, Course, CourseId, Enrollment,
    EnrollmentId, Lesson, LessonId, LessonProgress, LessonProgressUpdate, Percent, QuizAttempt,
    Section, SectionId,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Course → section → lesson hierarchy and course-level criteria.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Persist a course together with any sections and lessons it already holds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if any id is already taken.
    async fn insert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the parent course is missing.
    async fn insert_section(&self, section: &Section) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the parent section is missing.
    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError>;

    /// Fetch a course with its full, ordered hierarchy.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be read or decoded.
    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the section cannot be read.
    async fn get_section(&self, id: &SectionId) -> Result<Option<Section>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course is missing.
    async fn update_criteria(
        &self,
        id: &CourseId,
        criteria: &CompletionCriteria,
    ) -> Result<(), StorageError>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id exists, `NotFound` if the course is missing.
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the enrollment cannot be read or decoded.
    async fn get_enrollment(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, StorageError>;

    /// Enrollments of a course, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the enrollments cannot be read.
    async fn list_enrollments(&self, course_id: &CourseId)
    -> Result<Vec<Enrollment>, StorageError>;

    /// Persist `status` and `completed_at`. The cached percentage is left alone.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the enrollment is missing.
    async fn update_status(&self, enrollment: &Enrollment) -> Result<(), StorageError>;

    /// Recompute and store the cached percentage in one atomic step.
    ///
    /// Returns `Ok(None)` when the enrollment does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the update fails.
    async fn recalculate_progress(
        &self,
        id: &EnrollmentId,
    ) -> Result<Option<Percent>, StorageError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Apply an update keyed by `(enrollment_id, lesson_id)` and return the stored record.
    ///
    /// Follows the merge rules of `LessonProgressUpdate::apply`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the enrollment or lesson row is missing.
    async fn upsert_progress(
        &self,
        update: &LessonProgressUpdate,
    ) -> Result<LessonProgress, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be read.
    async fn get_progress(
        &self,
        enrollment_id: &EnrollmentId,
        lesson_id: &LessonId,
    ) -> Result<Option<LessonProgress>, StorageError>;

    /// All records of an enrollment ordered by lesson id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the records cannot be read.
    async fn list_progress(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<Vec<LessonProgress>, StorageError>;
}

#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_quiz_attempt(&self, attempt: &QuizAttempt) -> Result<i64, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the attempts cannot be read.
    async fn list_quiz_attempts(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<Vec<QuizAttempt>, StorageError>;

    /// Insert or replace the submission for `(enrollment_id, assignment_id)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the submission cannot be stored.
    async fn upsert_submission(&self, submission: &AssignmentSubmission)
    -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the submission cannot be read.
    async fn get_submission(
        &self,
        enrollment_id: &EnrollmentId,
        assignment_id: &AssignmentId,
    ) -> Result<Option<AssignmentSubmission>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the submissions cannot be read.
    async fn list_submissions(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<Vec<AssignmentSubmission>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct Tables {
    courses: HashMap<CourseId, Course>,
    section_courses: HashMap<SectionId, CourseId>,
    enrollments: HashMap<EnrollmentId, Enrollment>,
    enrollment_order: Vec<EnrollmentId>,
    progress: BTreeMap<(EnrollmentId, LessonId), LessonProgress>,
    quiz_attempts: Vec<QuizAttempt>,
    submissions: BTreeMap<(EnrollmentId, AssignmentId), AssignmentSubmission>,
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// A single lock guards every table, so each call is atomic.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn course_err(e: course_core::model::CourseError) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn insert_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if guard.courses.contains_key(course.id()) {
            return Err(StorageError::Conflict);
        }
        for section in course.sections() {
            guard
                .section_courses
                .insert(section.id().clone(), course.id().clone());
        }
        guard.courses.insert(course.id().clone(), course.clone());
        Ok(())
    }

    async fn insert_section(&self, section: &Section) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if guard.section_courses.contains_key(section.id()) {
            return Err(StorageError::Conflict);
        }
        let course = guard
            .courses
            .get_mut(section.course_id())
            .ok_or(StorageError::NotFound)?;
        course.push_section(section.clone()).map_err(course_err)?;
        guard
            .section_courses
            .insert(section.id().clone(), section.course_id().clone());
        Ok(())
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let course_id = guard
            .section_courses
            .get(lesson.section_id())
            .cloned()
            .ok_or(StorageError::NotFound)?;
        let course = guard
            .courses
            .get_mut(&course_id)
            .ok_or(StorageError::NotFound)?;
        if course.contains_lesson(lesson.id()) {
            return Err(StorageError::Conflict);
        }
        course
            .section_mut(lesson.section_id())
            .ok_or(StorageError::NotFound)?
            .push_lesson(lesson.clone())
            .map_err(course_err)?;
        Ok(())
    }

    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.courses.get(id).cloned())
    }

    async fn get_section(&self, id: &SectionId) -> Result<Option<Section>, StorageError> {
        let guard = self.lock()?;
        let section = guard
            .section_courses
            .get(id)
            .and_then(|course_id| guard.courses.get(course_id))
            .and_then(|course| course.sections().iter().find(|s| s.id() == id))
            .cloned();
        Ok(section)
    }

    async fn update_criteria(
        &self,
        id: &CourseId,
        criteria: &CompletionCriteria,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let course = guard.courses.get_mut(id).ok_or(StorageError::NotFound)?;
        course.set_criteria(criteria.clone());
        Ok(())
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if guard.enrollments.contains_key(enrollment.id()) {
            return Err(StorageError::Conflict);
        }
        if !guard.courses.contains_key(enrollment.course_id()) {
            return Err(StorageError::NotFound);
        }
        guard
            .enrollments
            .insert(enrollment.id().clone(), enrollment.clone());
        guard.enrollment_order.push(enrollment.id().clone());
        Ok(())
    }

    async fn get_enrollment(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.enrollments.get(id).cloned())
    }

    async fn list_enrollments(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<Enrollment>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .enrollment_order
            .iter()
            .filter_map(|id| guard.enrollments.get(id))
            .filter(|e| e.course_id() == course_id)
            .cloned()
            .collect())
    }

    async fn update_status(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let stored = guard
            .enrollments
            .get_mut(enrollment.id())
            .ok_or(StorageError::NotFound)?;
        let mut updated = enrollment.clone();
        updated.record_progress(stored.progress_percent());
        *stored = updated;
        Ok(())
    }

    async fn recalculate_progress(
        &self,
        id: &EnrollmentId,
    ) -> Result<Option<Percent>, StorageError> {
        let mut guard = self.lock()?;
        let Some(course_id) = guard.enrollments.get(id).map(|e| e.course_id().clone()) else {
            return Ok(None);
        };
        let total = guard
            .courses
            .get(&course_id)
            .map_or(0, Course::total_lessons);
        let completed = guard
            .progress
            .values()
            .filter(|p| &p.enrollment_id == id && p.is_completed)
            .count();

        let percent = Percent::from_ratio(completed as u64, total as u64);
        if let Some(enrollment) = guard.enrollments.get_mut(id) {
            enrollment.record_progress(percent);
        }
        Ok(Some(percent))
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn upsert_progress(
        &self,
        update: &LessonProgressUpdate,
    ) -> Result<LessonProgress, StorageError> {
        let mut guard = self.lock()?;
        let lesson_known = guard
            .courses
            .values()
            .any(|c| c.contains_lesson(update.lesson_id()));
        if !guard.enrollments.contains_key(update.enrollment_id()) || !lesson_known {
            return Err(StorageError::NotFound);
        }
        let key = (update.enrollment_id().clone(), update.lesson_id().clone());
        let record = update.apply(guard.progress.get(&key));
        guard.progress.insert(key, record.clone());
        Ok(record)
    }

    async fn get_progress(
        &self,
        enrollment_id: &EnrollmentId,
        lesson_id: &LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .progress
            .get(&(enrollment_id.clone(), lesson_id.clone()))
            .cloned())
    }

    async fn list_progress(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .progress
            .values()
            .filter(|p| &p.enrollment_id == enrollment_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AssessmentRepository for InMemoryRepository {
    async fn append_quiz_attempt(&self, attempt: &QuizAttempt) -> Result<i64, StorageError> {
        let mut guard = self.lock()?;
        guard.quiz_attempts.push(attempt.clone());
        i64::try_from(guard.quiz_attempts.len())
            .map_err(|_| StorageError::Serialization("attempt id overflow".into()))
    }

    async fn list_quiz_attempts(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<Vec<QuizAttempt>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .quiz_attempts
            .iter()
            .filter(|a| &a.enrollment_id == enrollment_id)
            .cloned()
            .collect())
    }

    async fn upsert_submission(
        &self,
        submission: &AssignmentSubmission,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.submissions.insert(
            (
                submission.enrollment_id.clone(),
                submission.assignment_id.clone(),
            ),
            submission.clone(),
        );
        Ok(())
    }

    async fn get_submission(
        &self,
        enrollment_id: &EnrollmentId,
        assignment_id: &AssignmentId,
    ) -> Result<Option<AssignmentSubmission>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .submissions
            .get(&(enrollment_id.clone(), assignment_id.clone()))
            .cloned())
    }

    async fn list_submissions(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<Vec<AssignmentSubmission>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .submissions
            .values()
            .filter(|s| &s.enrollment_id == enrollment_id)
            .cloned()
            .collect())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub assessments: Arc<dyn AssessmentRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            courses: Arc::new(repo.clone()),
            enrollments: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            assessments: Arc::new(repo),
        }
    }
}

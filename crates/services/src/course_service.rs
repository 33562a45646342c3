use std::sync::Arc;

use course_core::IdGenerator;
use course_core::model::{
    CompletionCriteria, Course, CourseId, Lesson, LessonId, LessonRequirement, Section, SectionId,
};
use storage::repository::CourseRepository;

use crate::Clock;
use crate::error::CourseServiceError;

/// Minimal course authoring: hierarchy and completion criteria.
#[derive(Clone)]
pub struct CourseService {
    clock: Clock,
    ids: IdGenerator,
    courses: Arc<dyn CourseRepository>,
}

impl CourseService {
    #[must_use]
    pub fn new(clock: Clock, ids: IdGenerator, courses: Arc<dyn CourseRepository>) -> Self {
        Self {
            clock,
            ids,
            courses,
        }
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` for a blank title.
    /// Returns `CourseServiceError::Storage` if persistence fails.
    pub async fn create_course(
        &self,
        title: &str,
        criteria: CompletionCriteria,
    ) -> Result<Course, CourseServiceError> {
        let course = Course::new(
            CourseId::new(self.ids.next("course")),
            title,
            criteria,
            self.clock.now(),
        )?;
        self.courses.insert_course(&course).await?;
        Ok(course)
    }

    /// Append a section after the course's last section.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::CourseNotFound` for an unknown course.
    /// Returns `CourseServiceError::Course` for a blank title.
    /// Returns `CourseServiceError::Storage` if persistence fails.
    pub async fn add_section(
        &self,
        course_id: &CourseId,
        title: &str,
    ) -> Result<Section, CourseServiceError> {
        let course = self.get_course(course_id).await?;
        let section = Section::new(
            SectionId::new(self.ids.next("section")),
            course_id.clone(),
            title,
            course.next_section_position(),
        )?;
        self.courses.insert_section(&section).await?;
        Ok(section)
    }

    /// Append a lesson after the section's last lesson.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::SectionNotFound` for an unknown section.
    /// Returns `CourseServiceError::Course` for a blank title.
    /// Returns `CourseServiceError::Storage` if persistence fails.
    pub async fn add_lesson(
        &self,
        section_id: &SectionId,
        title: &str,
    ) -> Result<Lesson, CourseServiceError> {
        let section = self
            .courses
            .get_section(section_id)
            .await?
            .ok_or_else(|| CourseServiceError::SectionNotFound(section_id.clone()))?;
        let lesson = Lesson::new(
            LessonId::new(self.ids.next("lesson")),
            section_id.clone(),
            title,
            section.next_lesson_position(),
        )?;
        self.courses.insert_lesson(&lesson).await?;
        Ok(lesson)
    }

    /// Replace the completion criteria of a course.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::UnknownLesson` if a required lesson is not
    /// part of the course.
    /// Returns `CourseServiceError::CourseNotFound` for an unknown course.
    /// Returns `CourseServiceError::Storage` if persistence fails.
    pub async fn set_criteria(
        &self,
        course_id: &CourseId,
        criteria: CompletionCriteria,
    ) -> Result<(), CourseServiceError> {
        let course = self.get_course(course_id).await?;
        if let LessonRequirement::Specific(ids) = criteria.lessons()
            && let Some(unknown) = ids.iter().find(|id| !course.contains_lesson(id))
        {
            return Err(CourseServiceError::UnknownLesson {
                lesson_id: unknown.clone(),
                course_id: course_id.clone(),
            });
        }
        self.courses.update_criteria(course_id, &criteria).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::CourseNotFound` for an unknown course.
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn get_course(&self, course_id: &CourseId) -> Result<Course, CourseServiceError> {
        self.courses
            .get_course(course_id)
            .await?
            .ok_or_else(|| CourseServiceError::CourseNotFound(course_id.clone()))
    }
}

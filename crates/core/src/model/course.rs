use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::criteria::CompletionCriteria;
use crate::model::ids::{CourseId, LessonId, SectionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("section title cannot be empty")]
    EmptySectionTitle,

    #[error("lesson title cannot be empty")]
    EmptyLessonTitle,

    #[error("section {section_id} does not belong to course {course_id}")]
    ForeignSection {
        section_id: SectionId,
        course_id: CourseId,
    },

    #[error("lesson {lesson_id} does not belong to section {section_id}")]
    ForeignLesson {
        lesson_id: LessonId,
        section_id: SectionId,
    },
}

fn non_empty(value: impl Into<String>, err: CourseError) -> Result<String, CourseError> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(err);
    }
    Ok(trimmed.to_owned())
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    section_id: SectionId,
    title: String,
    position: u32,
}

impl Lesson {
    /// # Errors
    ///
    /// Returns `CourseError::EmptyLessonTitle` for a blank title.
    pub fn new(
        id: LessonId,
        section_id: SectionId,
        title: impl Into<String>,
        position: u32,
    ) -> Result<Self, CourseError> {
        Ok(Self {
            id,
            section_id,
            title: non_empty(title, CourseError::EmptyLessonTitle)?,
            position,
        })
    }

    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn section_id(&self) -> &SectionId {
        &self.section_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }
}

//
// ─── SECTION ───────────────────────────────────────────────────────────────────
//

/// An ordered group of lessons within a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    id: SectionId,
    course_id: CourseId,
    title: String,
    position: u32,
    lessons: Vec<Lesson>,
}

impl Section {
    /// # Errors
    ///
    /// Returns `CourseError::EmptySectionTitle` for a blank title.
    pub fn new(
        id: SectionId,
        course_id: CourseId,
        title: impl Into<String>,
        position: u32,
    ) -> Result<Self, CourseError> {
        Ok(Self {
            id,
            course_id,
            title: non_empty(title, CourseError::EmptySectionTitle)?,
            position,
            lessons: Vec::new(),
        })
    }

    /// Insert a lesson keeping the list ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::ForeignLesson` if the lesson names another section.
    pub fn push_lesson(&mut self, lesson: Lesson) -> Result<(), CourseError> {
        if lesson.section_id != self.id {
            return Err(CourseError::ForeignLesson {
                lesson_id: lesson.id,
                section_id: self.id.clone(),
            });
        }
        let at = self
            .lessons
            .partition_point(|l| l.position <= lesson.position);
        self.lessons.insert(at, lesson);
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> &SectionId {
        &self.id
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    /// Position for a lesson appended at the end of this section.
    #[must_use]
    pub fn next_lesson_position(&self) -> u32 {
        self.lessons.last().map_or(0, |l| l.position.saturating_add(1))
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// A course with its ordered section/lesson hierarchy and completion criteria.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    id: CourseId,
    title: String,
    criteria: CompletionCriteria,
    created_at: DateTime<Utc>,
    sections: Vec<Section>,
}

impl Course {
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` for a blank title.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        criteria: CompletionCriteria,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CourseError> {
        Ok(Self {
            id,
            title: non_empty(title, CourseError::EmptyTitle)?,
            criteria,
            created_at,
            sections: Vec::new(),
        })
    }

    /// Insert a section keeping the list ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::ForeignSection` if the section names another course.
    pub fn push_section(&mut self, section: Section) -> Result<(), CourseError> {
        if section.course_id != self.id {
            return Err(CourseError::ForeignSection {
                section_id: section.id,
                course_id: self.id.clone(),
            });
        }
        let at = self
            .sections
            .partition_point(|s| s.position <= section.position);
        self.sections.insert(at, section);
        Ok(())
    }

    #[must_use]
    pub fn section_mut(&mut self, id: &SectionId) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| &s.id == id)
    }

    pub fn set_criteria(&mut self, criteria: CompletionCriteria) {
        self.criteria = criteria;
    }

    #[must_use]
    pub fn id(&self) -> &CourseId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn criteria(&self) -> &CompletionCriteria {
        &self.criteria
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// All lessons in section order, then lesson order.
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.sections.iter().flat_map(|s| s.lessons.iter())
    }

    /// Sum of lesson counts across all sections.
    #[must_use]
    pub fn total_lessons(&self) -> usize {
        self.sections.iter().map(|s| s.lessons.len()).sum()
    }

    /// Walks every section's lesson list looking for `lesson_id`.
    #[must_use]
    pub fn contains_lesson(&self, lesson_id: &LessonId) -> bool {
        self.lessons().any(|l| &l.id == lesson_id)
    }

    #[must_use]
    pub fn next_section_position(&self) -> u32 {
        self.sections
            .last()
            .map_or(0, |s| s.position.saturating_add(1))
    }
}

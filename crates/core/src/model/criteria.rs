use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::LessonId;
use crate::model::percent::{Percent, PercentError};

/// Quiz threshold applied when legacy metadata enables quiz passing without a score.
pub const DEFAULT_MINIMUM_QUIZ_SCORE: u32 = 70;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CriteriaError {
    #[error("invalid minimum quiz score: {0}")]
    QuizScore(PercentError),

    #[error("invalid minimum progress: {0}")]
    MinimumProgress(PercentError),

    #[error("malformed course metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

//
// ─── CRITERIA ──────────────────────────────────────────────────────────────────
//

/// Which lessons must be completed. Exactly one mode is active at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "lessonIds", rename_all = "camelCase")]
pub enum LessonRequirement {
    AllLessons,
    Specific(Vec<LessonId>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequirement {
    minimum_score: Percent,
}

impl QuizRequirement {
    #[must_use]
    pub fn new(minimum_score: Percent) -> Self {
        Self { minimum_score }
    }

    #[must_use]
    pub fn minimum_score(&self) -> Percent {
        self.minimum_score
    }
}

/// Rules gating certificate issuance for a course. All enabled rules must hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionCriteria {
    lessons: LessonRequirement,
    quiz: Option<QuizRequirement>,
    require_assignment_passing: bool,
    minimum_progress: Percent,
}

impl Default for CompletionCriteria {
    /// Every lesson, no quiz or assignment gate, 100% progress.
    fn default() -> Self {
        Self {
            lessons: LessonRequirement::AllLessons,
            quiz: None,
            require_assignment_passing: false,
            minimum_progress: Percent::FULL,
        }
    }
}

impl CompletionCriteria {
    #[must_use]
    pub fn new(
        lessons: LessonRequirement,
        quiz: Option<QuizRequirement>,
        require_assignment_passing: bool,
        minimum_progress: Percent,
    ) -> Self {
        Self {
            lessons,
            quiz,
            require_assignment_passing,
            minimum_progress,
        }
    }

    #[must_use]
    pub fn lessons(&self) -> &LessonRequirement {
        &self.lessons
    }

    #[must_use]
    pub fn quiz(&self) -> Option<QuizRequirement> {
        self.quiz
    }

    #[must_use]
    pub fn require_assignment_passing(&self) -> bool {
        self.require_assignment_passing
    }

    #[must_use]
    pub fn minimum_progress(&self) -> Percent {
        self.minimum_progress
    }
}

//
// ─── METADATA ──────────────────────────────────────────────────────────────────
//

/// Shape written by the old course editor: every field optional, both lesson
/// fields may be present at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCompletionCriteria {
    pub require_all_lessons: Option<bool>,
    pub required_lesson_ids: Option<Vec<String>>,
    pub require_quiz_passing: Option<bool>,
    pub minimum_quiz_score: Option<u32>,
    pub require_assignment_passing: Option<bool>,
    pub minimum_progress: Option<u32>,
}

impl LegacyCompletionCriteria {
    /// # Errors
    ///
    /// Returns `CriteriaError` if a score or progress threshold exceeds 100.
    pub fn migrate(self) -> Result<CompletionCriteria, CriteriaError> {
        let ids: Vec<LessonId> = self
            .required_lesson_ids
            .unwrap_or_default()
            .into_iter()
            .filter(|id| !id.trim().is_empty())
            .map(LessonId::new)
            .collect();

        // `requireAllLessons: true` wins over a stale id list the form forgot to clear.
        let lessons = match self.require_all_lessons {
            Some(true) => LessonRequirement::AllLessons,
            Some(false) => LessonRequirement::Specific(ids),
            None if ids.is_empty() => LessonRequirement::AllLessons,
            None => LessonRequirement::Specific(ids),
        };

        let quiz = if self.require_quiz_passing.unwrap_or(false) {
            let score = self
                .minimum_quiz_score
                .unwrap_or(DEFAULT_MINIMUM_QUIZ_SCORE);
            Some(QuizRequirement::new(
                Percent::new(score).map_err(CriteriaError::QuizScore)?,
            ))
        } else {
            None
        };

        let minimum_progress = match self.minimum_progress {
            Some(p) => Percent::new(p).map_err(CriteriaError::MinimumProgress)?,
            None => Percent::FULL,
        };

        Ok(CompletionCriteria {
            lessons,
            quiz,
            require_assignment_passing: self.require_assignment_passing.unwrap_or(false),
            minimum_progress,
        })
    }
}

/// Course metadata blob, tagged by schema version.
///
/// Untagged blobs predate versioning and are read as version 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "version")]
pub enum CourseMetadata {
    #[serde(rename = "1", rename_all = "camelCase")]
    V1 {
        #[serde(default)]
        completion_criteria: Option<LegacyCompletionCriteria>,
    },
    #[serde(rename = "2", rename_all = "camelCase")]
    V2 {
        completion_criteria: CompletionCriteria,
    },
}

impl CourseMetadata {
    #[must_use]
    pub fn current(criteria: CompletionCriteria) -> Self {
        Self::V2 {
            completion_criteria: criteria,
        }
    }

    /// Parse a stored blob of any version.
    ///
    /// # Errors
    ///
    /// Returns `CriteriaError::Metadata` if the JSON does not match a known version.
    pub fn from_json(raw: &str) -> Result<Self, CriteriaError> {
        let mut value: serde_json::Value = serde_json::from_str(raw)?;
        if let serde_json::Value::Object(map) = &mut value {
            map.entry("version")
                .or_insert_with(|| serde_json::Value::String("1".into()));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// # Errors
    ///
    /// Returns `CriteriaError::Metadata` if serialization fails.
    pub fn to_json(&self) -> Result<String, CriteriaError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Upgrade to the current schema and return the criteria it carries.
    ///
    /// # Errors
    ///
    /// Returns `CriteriaError` if legacy thresholds are out of range.
    pub fn into_criteria(self) -> Result<CompletionCriteria, CriteriaError> {
        match self {
            CourseMetadata::V1 {
                completion_criteria,
            } => completion_criteria.unwrap_or_default().migrate(),
            CourseMetadata::V2 {
                completion_criteria,
            } => Ok(completion_criteria),
        }
    }
}

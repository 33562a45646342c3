use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{
    AssignmentSubmission, CompletionCriteria, LessonId, LessonRequirement, Percent, QuizAttempt,
    SubmissionStatus,
};

//
// ─── LEARNER STATE ─────────────────────────────────────────────────────────────
//

/// Everything the evaluator needs to know about one enrollment.
#[derive(Debug, Clone, Default)]
pub struct LearnerState {
    /// Every lesson of the course, in course order.
    pub course_lessons: Vec<LessonId>,
    pub completed_lessons: BTreeSet<LessonId>,
    pub quiz_attempts: Vec<QuizAttempt>,
    pub assignments: Vec<AssignmentSubmission>,
    /// Cached overall progress of the enrollment.
    pub progress: Percent,
}

//
// ─── REPORT ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Criterion {
    AllLessons,
    RequiredLessons,
    QuizPassing,
    AssignmentPassing,
    MinimumProgress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionCheck {
    pub criterion: Criterion,
    pub passed: bool,
    pub detail: String,
}

/// Outcome of evaluating every enabled criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityReport {
    pub eligible: bool,
    pub checks: Vec<CriterionCheck>,
}

impl EligibilityReport {
    #[must_use]
    pub fn check(&self, criterion: Criterion) -> Option<&CriterionCheck> {
        self.checks.iter().find(|c| c.criterion == criterion)
    }

    #[must_use]
    pub fn failed(&self) -> Vec<Criterion> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.criterion)
            .collect()
    }
}

//
// ─── EVALUATION ────────────────────────────────────────────────────────────────
//

/// Decide certificate eligibility: the logical AND of every enabled criterion.
///
/// - Lessons: all course lessons, or the configured subset, must be completed.
/// - Quizzes: every attempt must reach the minimum score.
/// - Assignments: every graded submission must have passed; ungraded ones
///   are ignored.
/// - Progress: the cached percentage must reach the minimum.
///
/// # Examples
///
/// ```
/// # use course_core::eligibility::{evaluate, Criterion, LearnerState};
/// # use course_core::model::{CompletionCriteria, LessonId, Percent};
/// let state = LearnerState {
///     course_lessons: vec![LessonId::new("l1"), LessonId::new("l2")],
///     completed_lessons: [LessonId::new("l1")].into_iter().collect(),
///     progress: Percent::from_ratio(1, 2),
///     ..LearnerState::default()
/// };
/// let report = evaluate(&CompletionCriteria::default(), &state);
/// assert!(!report.eligible);
/// assert_eq!(report.failed(), vec![Criterion::AllLessons, Criterion::MinimumProgress]);
/// ```
#[must_use]
pub fn evaluate(criteria: &CompletionCriteria, state: &LearnerState) -> EligibilityReport {
    let mut checks = Vec::with_capacity(4);

    checks.push(check_lessons(criteria.lessons(), state));

    if let Some(quiz) = criteria.quiz() {
        checks.push(check_quizzes(quiz.minimum_score(), &state.quiz_attempts));
    }

    if criteria.require_assignment_passing() {
        checks.push(check_assignments(&state.assignments));
    }

    let minimum = criteria.minimum_progress();
    checks.push(CriterionCheck {
        criterion: Criterion::MinimumProgress,
        passed: state.progress >= minimum,
        detail: format!("progress {} of required {}", state.progress, minimum),
    });

    EligibilityReport {
        eligible: checks.iter().all(|c| c.passed),
        checks,
    }
}

fn check_lessons(requirement: &LessonRequirement, state: &LearnerState) -> CriterionCheck {
    let (criterion, required) = match requirement {
        LessonRequirement::AllLessons => (Criterion::AllLessons, state.course_lessons.as_slice()),
        LessonRequirement::Specific(ids) => (Criterion::RequiredLessons, ids.as_slice()),
    };
    let missing: Vec<&str> = required
        .iter()
        .filter(|id| !state.completed_lessons.contains(*id))
        .map(LessonId::as_str)
        .collect();

    CriterionCheck {
        criterion,
        passed: missing.is_empty(),
        detail: if missing.is_empty() {
            format!("{} of {} lessons completed", required.len(), required.len())
        } else {
            format!("incomplete lessons: {}", missing.join(", "))
        },
    }
}

fn check_quizzes(minimum: Percent, attempts: &[QuizAttempt]) -> CriterionCheck {
    let below: Vec<String> = attempts
        .iter()
        .filter(|a| a.score < minimum)
        .map(|a| format!("{} ({})", a.quiz_id, a.score))
        .collect();

    CriterionCheck {
        criterion: Criterion::QuizPassing,
        passed: below.is_empty(),
        detail: if below.is_empty() {
            format!("{} attempts at or above {}", attempts.len(), minimum)
        } else {
            format!("below {}: {}", minimum, below.join(", "))
        },
    }
}

fn check_assignments(submissions: &[AssignmentSubmission]) -> CriterionCheck {
    let graded: Vec<&AssignmentSubmission> =
        submissions.iter().filter(|s| s.is_graded()).collect();
    let failed: Vec<&str> = graded
        .iter()
        .filter(|s| s.status != SubmissionStatus::Passed)
        .map(|s| s.assignment_id.as_str())
        .collect();

    CriterionCheck {
        criterion: Criterion::AssignmentPassing,
        passed: failed.is_empty(),
        detail: if failed.is_empty() {
            format!("{} graded assignments passed", graded.len())
        } else {
            format!("failed: {}", failed.join(", "))
        },
    }
}

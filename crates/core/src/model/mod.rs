mod assessment;
mod course;
pub mod criteria;
mod enrollment;
mod ids;
mod percent;
mod progress;

pub use ids::{
    AssignmentId, CourseId, EnrollmentId, LessonId, ParseIdError, QuizId, SectionId, UserId,
};
pub use percent::{Percent, PercentError};

pub use assessment::{AssessmentError, AssignmentSubmission, QuizAttempt, SubmissionStatus};
pub use course::{Course, CourseError, Lesson, Section};
pub use criteria::{
    CompletionCriteria, CourseMetadata, CriteriaError, LessonRequirement, QuizRequirement,
};
pub use enrollment::{Enrollment, EnrollmentError, EnrollmentStatus};
pub use progress::{LessonProgress, LessonProgressUpdate, ProgressError};

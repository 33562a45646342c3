#![forbid(unsafe_code)]

pub mod app_services;
pub mod assessment_service;
pub mod course_service;
pub mod eligibility_service;
pub mod enrollment_service;
pub mod error;
pub mod progress_service;

pub use course_core::{Clock, IdGenerator};

pub use app_services::AppServices;
pub use assessment_service::AssessmentService;
pub use course_service::CourseService;
pub use eligibility_service::{CompletionOutcome, EligibilityService};
pub use enrollment_service::EnrollmentService;
pub use error::{
    AppServicesError, AssessmentServiceError, CourseServiceError, EligibilityServiceError,
    EnrollmentServiceError, ProgressServiceError,
};
pub use progress_service::{EnrollmentProgress, ProgressService};

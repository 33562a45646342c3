use course_core::eligibility::Criterion;
use course_core::model::{
    AssignmentId, CompletionCriteria, EnrollmentId, EnrollmentStatus, LessonId,
    LessonRequirement, Percent, QuizId, QuizRequirement, UserId,
};
use course_core::time::fixed_now;
use services::{AppServices, Clock, IdGenerator, ProgressServiceError};

async fn sqlite_services(name: &str) -> AppServices {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    AppServices::new_sqlite(&url, Clock::fixed(fixed_now()), IdGenerator::sequential())
        .await
        .expect("connect sqlite")
}

#[tokio::test]
async fn learner_completes_a_course_end_to_end() {
    let app = sqlite_services("memdb_course_flow").await;
    let courses = app.courses();

    let course = courses
        .create_course("Rust basics", CompletionCriteria::default())
        .await
        .expect("create course");
    let section = courses.add_section(course.id(), "Intro").await.unwrap();
    let mut lessons = Vec::new();
    for title in ["Hello", "Ownership", "Borrowing"] {
        lessons.push(courses.add_lesson(section.id(), title).await.unwrap());
    }
    let quiz_lesson = lessons[0].id().clone();
    courses
        .set_criteria(
            course.id(),
            CompletionCriteria::new(
                LessonRequirement::AllLessons,
                Some(QuizRequirement::new(Percent::new(70).unwrap())),
                true,
                Percent::FULL,
            ),
        )
        .await
        .expect("set criteria");

    let enrollment = app
        .enrollments()
        .enroll(course.id(), &UserId::new("ada"))
        .await
        .expect("enroll");
    let e = enrollment.id().clone();

    let progress = app.progress();
    let mut seen = Vec::new();
    for lesson in &lessons {
        progress
            .update_lesson_progress(&e, lesson.id(), true, Some(120.0))
            .await
            .expect("update progress");
        seen.push(
            progress
                .get_enrollment_progress(&e)
                .await
                .unwrap()
                .overall_progress
                .value(),
        );
    }
    assert_eq!(seen, [33, 67, 100]);

    // repeating an update keeps a single record and the same percentage
    progress
        .update_lesson_progress(&e, &quiz_lesson, true, None)
        .await
        .unwrap();
    let summary = progress.get_enrollment_progress(&e).await.unwrap();
    assert_eq!(summary.lesson_progress.len(), 3);
    assert_eq!(summary.completed_lessons, 3);
    assert_eq!(summary.total_lessons, 3);

    let assessments = app.assessments();
    let quiz = QuizId::new("quiz-1");
    assessments.record_quiz_attempt(&e, &quiz, 90).await.unwrap();
    let assignment = AssignmentId::new("essay");
    assessments.submit_assignment(&e, &assignment).await.unwrap();

    // an assignment awaiting grading does not hold the learner back
    let report = app.eligibility().evaluate(&e).await.unwrap();
    assert!(report.failed().is_empty(), "{report:?}");

    assessments
        .grade_assignment(&e, &assignment, false)
        .await
        .unwrap();
    let report = app.eligibility().evaluate(&e).await.unwrap();
    assert_eq!(report.failed(), vec![Criterion::AssignmentPassing]);

    assessments.submit_assignment(&e, &assignment).await.unwrap();
    assessments
        .grade_assignment(&e, &assignment, true)
        .await
        .unwrap();

    let outcome = app.eligibility().complete_if_eligible(&e).await.unwrap();
    assert!(outcome.report.eligible, "{:?}", outcome.report);
    assert!(outcome.newly_completed);

    let stored = app.enrollments().get(&e).await.unwrap();
    assert_eq!(stored.status(), EnrollmentStatus::Completed);
    assert_eq!(stored.completed_at(), Some(fixed_now()));
}

#[tokio::test]
async fn progress_errors_name_the_missing_ids() {
    let app = sqlite_services("memdb_course_errors").await;
    let course = app
        .courses()
        .create_course("Empty", CompletionCriteria::default())
        .await
        .unwrap();
    let enrollment = app
        .enrollments()
        .enroll(course.id(), &UserId::new("bob"))
        .await
        .unwrap();

    let err = app
        .progress()
        .update_lesson_progress(
            &EnrollmentId::new("missing-enrollment"),
            &LessonId::new("l1"),
            true,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressServiceError::EnrollmentNotFound(_)));
    assert!(err.to_string().contains("missing-enrollment"));

    let err = app
        .progress()
        .update_lesson_progress(
            enrollment.id(),
            &LessonId::new("lesson-not-in-course"),
            true,
            None,
        )
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("lesson-not-in-course"));
    assert!(message.contains(course.id().as_str()));

    let summary = app
        .progress()
        .get_enrollment_progress(enrollment.id())
        .await
        .unwrap();
    assert_eq!(
        (summary.completed_lessons, summary.total_lessons),
        (0, 0)
    );
    assert_eq!(summary.overall_progress, Percent::ZERO);
}

use chrono::Duration;
use course_core::model::{
    AssignmentId, AssignmentSubmission, CompletionCriteria, Course, CourseId, Enrollment,
    EnrollmentId, EnrollmentStatus, Lesson, LessonId, LessonProgressUpdate, LessonRequirement,
    Percent, QuizAttempt, QuizId, Section, SectionId, SubmissionStatus, UserId,
};
use course_core::time::fixed_now;
use storage::repository::{
    AssessmentRepository, CourseRepository, EnrollmentRepository, ProgressRepository,
    StorageError,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn build_course(id: &str, per_section: &[u32]) -> Course {
    let course_id = CourseId::new(id);
    let mut course =
        Course::new(course_id.clone(), "Course", CompletionCriteria::default(), fixed_now())
            .unwrap();
    let mut n = 0;
    for (pos, count) in (0_u32..).zip(per_section) {
        let section_id = SectionId::new(format!("{id}-s{pos}"));
        let mut section =
            Section::new(section_id.clone(), course_id.clone(), format!("S{pos}"), pos).unwrap();
        for lesson_pos in 0..*count {
            n += 1;
            let lesson = Lesson::new(
                LessonId::new(format!("{id}-l{n}")),
                section_id.clone(),
                format!("L{n}"),
                lesson_pos,
            )
            .unwrap();
            section.push_lesson(lesson).unwrap();
        }
        course.push_section(section).unwrap();
    }
    course
}

async fn enroll(repo: &SqliteRepository, course: &Course, id: &str) -> EnrollmentId {
    let enrollment = Enrollment::new(
        EnrollmentId::new(id),
        course.id().clone(),
        UserId::new("u1"),
        fixed_now(),
    );
    repo.insert_enrollment(&enrollment).await.unwrap();
    enrollment.id().clone()
}

fn update(enrollment: &EnrollmentId, lesson: &str, completed: bool) -> LessonProgressUpdate {
    LessonProgressUpdate::new(
        enrollment.clone(),
        LessonId::new(lesson),
        completed,
        None,
        fixed_now(),
    )
    .unwrap()
}

#[tokio::test]
async fn course_hierarchy_roundtrips_in_order() {
    let repo = connect("memdb_hierarchy").await;
    let course = build_course("c1", &[2, 0, 3]);
    repo.insert_course(&course).await.unwrap();

    let fetched = repo
        .get_course(&CourseId::new("c1"))
        .await
        .unwrap()
        .expect("course");
    assert_eq!(fetched, course);
    assert_eq!(fetched.total_lessons(), 5);

    assert!(matches!(
        repo.insert_course(&course).await,
        Err(StorageError::Conflict)
    ));
}

#[tokio::test]
async fn criteria_are_stored_as_versioned_metadata() {
    let repo = connect("memdb_criteria").await;
    let course = build_course("c1", &[2]);
    repo.insert_course(&course).await.unwrap();

    let criteria = CompletionCriteria::new(
        LessonRequirement::Specific(vec![LessonId::new("c1-l1")]),
        None,
        false,
        Percent::new(50).unwrap(),
    );
    repo.update_criteria(course.id(), &criteria).await.unwrap();

    let raw: String = sqlx::query_scalar("SELECT metadata FROM courses WHERE id = 'c1'")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert!(raw.contains(r#""version":"2""#), "{raw}");

    let fetched = repo.get_course(course.id()).await.unwrap().unwrap();
    assert_eq!(fetched.criteria(), &criteria);
}

#[tokio::test]
async fn legacy_metadata_is_migrated_on_read() {
    let repo = connect("memdb_legacy").await;
    let course = build_course("c1", &[1]);
    repo.insert_course(&course).await.unwrap();

    sqlx::query("UPDATE courses SET metadata = ?1 WHERE id = 'c1'")
        .bind(r#"{"completionCriteria":{"requireAllLessons":false,"requiredLessonIds":["c1-l1"],"minimumProgress":80}}"#)
        .execute(repo.pool())
        .await
        .unwrap();

    let fetched = repo.get_course(course.id()).await.unwrap().unwrap();
    assert_eq!(
        fetched.criteria().lessons(),
        &LessonRequirement::Specific(vec![LessonId::new("c1-l1")])
    );
    assert_eq!(fetched.criteria().minimum_progress().value(), 80);
}

#[tokio::test]
async fn recalculation_follows_the_thirds_scenario() {
    let repo = connect("memdb_thirds").await;
    let course = build_course("c1", &[2, 1]);
    repo.insert_course(&course).await.unwrap();
    let e1 = enroll(&repo, &course, "e1").await;

    let mut seen = Vec::new();
    for lesson in ["c1-l1", "c1-l2", "c1-l3"] {
        repo.upsert_progress(&update(&e1, lesson, true)).await.unwrap();
        let percent = repo.recalculate_progress(&e1).await.unwrap().unwrap();
        seen.push(percent.value());
    }
    assert_eq!(seen, [33, 67, 100]);

    let stored = repo.get_enrollment(&e1).await.unwrap().unwrap();
    assert_eq!(stored.progress_percent(), Percent::FULL);
}

#[tokio::test]
async fn recalculation_handles_empty_and_missing() {
    let repo = connect("memdb_empty").await;
    let course = build_course("c1", &[]);
    repo.insert_course(&course).await.unwrap();
    let e1 = enroll(&repo, &course, "e1").await;

    assert_eq!(
        repo.recalculate_progress(&e1).await.unwrap(),
        Some(Percent::ZERO)
    );
    assert_eq!(
        repo.recalculate_progress(&EnrollmentId::new("missing"))
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn upsert_is_idempotent_and_keeps_first_completion() {
    let repo = connect("memdb_upsert").await;
    let course = build_course("c1", &[1]);
    repo.insert_course(&course).await.unwrap();
    let e1 = enroll(&repo, &course, "e1").await;

    let first = LessonProgressUpdate::new(
        e1.clone(),
        LessonId::new("c1-l1"),
        true,
        Some(30.0),
        fixed_now(),
    )
    .unwrap();
    let later = LessonProgressUpdate::new(
        e1.clone(),
        LessonId::new("c1-l1"),
        true,
        None,
        fixed_now() + Duration::minutes(5),
    )
    .unwrap();

    let a = repo.upsert_progress(&first).await.unwrap();
    let b = repo.upsert_progress(&later).await.unwrap();
    assert_eq!(b, later.apply(Some(&a)));
    assert_eq!(b.completed_at, Some(fixed_now()));
    assert_eq!(b.video_progress, Some(30.0));

    let undone = repo
        .upsert_progress(&update(&e1, "c1-l1", false))
        .await
        .unwrap();
    assert!(!undone.is_completed);
    assert_eq!(undone.completed_at, None);

    let all = repo.list_progress(&e1).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(
        repo.get_progress(&e1, &LessonId::new("c1-l1"))
            .await
            .unwrap(),
        Some(undone)
    );
}

#[tokio::test]
async fn upsert_for_unknown_rows_is_not_found() {
    let repo = connect("memdb_fk").await;
    let course = build_course("c1", &[1]);
    repo.insert_course(&course).await.unwrap();
    let e1 = enroll(&repo, &course, "e1").await;

    let err = repo
        .upsert_progress(&update(&e1, "nope", true))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    let err = repo
        .upsert_progress(&update(&EnrollmentId::new("ghost"), "c1-l1", true))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn status_update_leaves_percent_untouched() {
    let repo = connect("memdb_status").await;
    let course = build_course("c1", &[1]);
    repo.insert_course(&course).await.unwrap();
    let e1 = enroll(&repo, &course, "e1").await;
    repo.upsert_progress(&update(&e1, "c1-l1", true))
        .await
        .unwrap();
    repo.recalculate_progress(&e1).await.unwrap();

    let mut enrollment = repo.get_enrollment(&e1).await.unwrap().unwrap();
    enrollment.mark_completed(fixed_now()).unwrap();
    repo.update_status(&enrollment).await.unwrap();

    let stored = repo.get_enrollment(&e1).await.unwrap().unwrap();
    assert_eq!(stored.status(), EnrollmentStatus::Completed);
    assert_eq!(stored.completed_at(), Some(fixed_now()));
    assert_eq!(stored.progress_percent(), Percent::FULL);

    let listed = repo.list_enrollments(course.id()).await.unwrap();
    assert_eq!(listed, vec![stored]);
}

#[tokio::test]
async fn assessments_persist_attempts_and_latest_submission() {
    let repo = connect("memdb_assessments").await;
    let course = build_course("c1", &[1]);
    repo.insert_course(&course).await.unwrap();
    let e1 = enroll(&repo, &course, "e1").await;

    for score in [40, 85] {
        let attempt = QuizAttempt::new(e1.clone(), QuizId::new("q1"), score, fixed_now()).unwrap();
        repo.append_quiz_attempt(&attempt).await.unwrap();
    }
    let attempts = repo.list_quiz_attempts(&e1).await.unwrap();
    let scores: Vec<u8> = attempts.iter().map(|a| a.score.value()).collect();
    assert_eq!(scores, [40, 85]);

    let mut submission =
        AssignmentSubmission::submit(e1.clone(), AssignmentId::new("a1"), fixed_now());
    repo.upsert_submission(&submission).await.unwrap();
    submission
        .grade(true, fixed_now() + Duration::hours(1))
        .unwrap();
    repo.upsert_submission(&submission).await.unwrap();

    let stored = repo
        .get_submission(&e1, &AssignmentId::new("a1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, SubmissionStatus::Passed);
    assert_eq!(repo.list_submissions(&e1).await.unwrap().len(), 1);
}

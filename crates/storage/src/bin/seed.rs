use chrono::{DateTime, Utc};
use clap::Parser;
use course_core::model::{
    CompletionCriteria, Course, CourseId, Enrollment, EnrollmentId, Lesson, LessonId, Section,
    SectionId, UserId,
};
use storage::repository::Storage;

/// Seed a demo course with one enrolled learner.
#[derive(Debug, Clone, Parser)]
#[command(name = "seed", about)]
struct Args {
    /// SQLite URL.
    #[arg(long = "db", env = "COURSE_DB_URL", default_value = "sqlite:course.sqlite3")]
    db_url: String,

    #[arg(long, env = "COURSE_SEED_COURSE", default_value = "demo-course")]
    course_id: CourseId,

    /// Learner to enroll.
    #[arg(long, env = "COURSE_SEED_USER", default_value = "demo-user")]
    user_id: UserId,

    #[arg(
        long,
        env = "COURSE_SEED_SECTIONS",
        default_value_t = 2,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    sections: u32,

    /// Lessons per section.
    #[arg(
        long,
        env = "COURSE_SEED_LESSONS",
        default_value_t = 3,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    lessons: u32,

    /// Fixed current time (RFC 3339) for deterministic seeding.
    #[arg(long)]
    now: Option<DateTime<Utc>>,
}

fn demo_course(args: &Args, now: DateTime<Utc>) -> Result<Course, Box<dyn std::error::Error>> {
    let mut course = Course::new(
        args.course_id.clone(),
        "Demo course",
        CompletionCriteria::default(),
        now,
    )?;
    for s in 0..args.sections {
        let section_id = SectionId::new(format!("{}-s{}", args.course_id, s + 1));
        let mut section = Section::new(
            section_id.clone(),
            args.course_id.clone(),
            format!("Section {}", s + 1),
            s,
        )?;
        for l in 0..args.lessons {
            let lesson = Lesson::new(
                LessonId::new(format!("{section_id}-l{}", l + 1)),
                section_id.clone(),
                format!("Lesson {}.{}", s + 1, l + 1),
                l,
            )?;
            section.push_lesson(lesson)?;
        }
        course.push_section(section)?;
    }
    Ok(course)
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let course = match storage.courses.get_course(&args.course_id).await? {
        Some(existing) => existing,
        None => {
            let course = demo_course(&args, now)?;
            storage.courses.insert_course(&course).await?;
            course
        }
    };

    let enrollment_id = EnrollmentId::new(format!("{}-{}", course.id(), args.user_id));
    if storage
        .enrollments
        .get_enrollment(&enrollment_id)
        .await?
        .is_none()
    {
        let enrollment = Enrollment::new(
            enrollment_id.clone(),
            course.id().clone(),
            args.user_id.clone(),
            now,
        );
        storage.enrollments.insert_enrollment(&enrollment).await?;
    }

    println!(
        "Seeded course {} with {} lessons and enrollment {} into {}",
        course.id(),
        course.total_lessons(),
        enrollment_id,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run(Args::parse()).await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_build_the_demo_hierarchy() {
        let args = Args::try_parse_from([
            "seed",
            "--course-id",
            "rust-101",
            "--sections",
            "3",
            "--lessons",
            "2",
            "--now",
            "2024-01-01T00:00:00Z",
        ])
        .unwrap();
        let now = args.now.unwrap();
        let course = demo_course(&args, now).unwrap();

        assert_eq!(course.id().as_str(), "rust-101");
        assert_eq!(course.total_lessons(), 6);
        assert!(course.contains_lesson(&LessonId::new("rust-101-s3-l2")));
    }

    #[test]
    fn rejects_blank_ids_and_zero_counts() {
        assert!(Args::try_parse_from(["seed", "--course-id", "  "]).is_err());
        assert!(Args::try_parse_from(["seed", "--lessons", "0"]).is_err());
        assert!(Args::try_parse_from(["seed", "--now", "yesterday"]).is_err());
    }
}

use course_core::model::{
    CompletionCriteria, Course, CourseId, CourseMetadata, Lesson, Section, SectionId,
};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{db_err, map_lesson_row, map_section_row, ser};
use crate::repository::{CourseRepository, StorageError};

fn metadata_json(criteria: &CompletionCriteria) -> Result<String, StorageError> {
    CourseMetadata::current(criteria.clone())
        .to_json()
        .map_err(ser)
}

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn insert_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r"
            INSERT INTO courses (id, title, metadata, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(course.id().as_str())
        .bind(course.title())
        .bind(metadata_json(course.criteria())?)
        .bind(course.created_at())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        for section in course.sections() {
            sqlx::query(
                r"
                INSERT INTO sections (id, course_id, title, position)
                VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(section.id().as_str())
            .bind(section.course_id().as_str())
            .bind(section.title())
            .bind(i64::from(section.position()))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

            for lesson in section.lessons() {
                sqlx::query(
                    r"
                    INSERT INTO lessons (id, section_id, title, position)
                    VALUES (?1, ?2, ?3, ?4)
                    ",
                )
                .bind(lesson.id().as_str())
                .bind(lesson.section_id().as_str())
                .bind(lesson.title())
                .bind(i64::from(lesson.position()))
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            }
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn insert_section(&self, section: &Section) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO sections (id, course_id, title, position)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(section.id().as_str())
        .bind(section.course_id().as_str())
        .bind(section.title())
        .bind(i64::from(section.position()))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO lessons (id, section_id, title, position)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(lesson.id().as_str())
        .bind(lesson.section_id().as_str())
        .bind(lesson.title())
        .bind(i64::from(lesson.position()))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError> {
        let Some(row) = sqlx::query(
            r"
            SELECT id, title, metadata, created_at
            FROM courses WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        else {
            return Ok(None);
        };

        let raw: String = row.try_get("metadata").map_err(ser)?;
        let criteria = CourseMetadata::from_json(&raw)
            .and_then(CourseMetadata::into_criteria)
            .map_err(ser)?;
        let mut course = Course::new(
            id.clone(),
            row.try_get::<String, _>("title").map_err(ser)?,
            criteria,
            row.try_get("created_at").map_err(ser)?,
        )
        .map_err(ser)?;

        let section_rows = sqlx::query(
            r"
            SELECT id, course_id, title, position
            FROM sections
            WHERE course_id = ?1
            ORDER BY position ASC, id ASC
            ",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        for row in &section_rows {
            course.push_section(map_section_row(row)?).map_err(ser)?;
        }

        let lesson_rows = sqlx::query(
            r"
            SELECT l.id, l.section_id, l.title, l.position
            FROM lessons l
            JOIN sections s ON s.id = l.section_id
            WHERE s.course_id = ?1
            ORDER BY l.position ASC, l.id ASC
            ",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        for row in &lesson_rows {
            let lesson = map_lesson_row(row)?;
            let section = course
                .section_mut(lesson.section_id())
                .ok_or_else(|| ser(format!("orphan lesson {}", lesson.id())))?;
            section.push_lesson(lesson).map_err(ser)?;
        }

        Ok(Some(course))
    }

    async fn get_section(&self, id: &SectionId) -> Result<Option<Section>, StorageError> {
        let Some(row) = sqlx::query(
            r"
            SELECT id, course_id, title, position
            FROM sections WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        else {
            return Ok(None);
        };
        let mut section = map_section_row(&row)?;

        let rows = sqlx::query(
            r"
            SELECT id, section_id, title, position
            FROM lessons
            WHERE section_id = ?1
            ORDER BY position ASC, id ASC
            ",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        for row in &rows {
            section.push_lesson(map_lesson_row(row)?).map_err(ser)?;
        }
        Ok(Some(section))
    }

    async fn update_criteria(
        &self,
        id: &CourseId,
        criteria: &CompletionCriteria,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE courses SET metadata = ?1 WHERE id = ?2")
            .bind(metadata_json(criteria)?)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

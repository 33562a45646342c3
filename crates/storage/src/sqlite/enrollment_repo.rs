use course_core::model::{CourseId, Enrollment, EnrollmentId, Percent};

use super::SqliteRepository;
use super::mapping::{db_err, map_enrollment_row, percent_from_i64};
use crate::repository::{EnrollmentRepository, StorageError};

#[async_trait::async_trait]
impl EnrollmentRepository for SqliteRepository {
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO enrollments (id, course_id, user_id, status, progress_percent, enrolled_at, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(enrollment.id().as_str())
        .bind(enrollment.course_id().as_str())
        .bind(enrollment.user_id().as_str())
        .bind(enrollment.status().as_str())
        .bind(i64::from(enrollment.progress_percent().value()))
        .bind(enrollment.enrolled_at())
        .bind(enrollment.completed_at())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_enrollment(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, course_id, user_id, status, progress_percent, enrolled_at, completed_at
            FROM enrollments WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => map_enrollment_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_enrollments(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<Enrollment>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, course_id, user_id, status, progress_percent, enrolled_at, completed_at
            FROM enrollments
            WHERE course_id = ?1
            ORDER BY enrolled_at ASC, id ASC
            ",
        )
        .bind(course_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_enrollment_row).collect()
    }

    async fn update_status(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE enrollments
            SET status = ?1, completed_at = ?2
            WHERE id = ?3
            ",
        )
        .bind(enrollment.status().as_str())
        .bind(enrollment.completed_at())
        .bind(enrollment.id().as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn recalculate_progress(
        &self,
        id: &EnrollmentId,
    ) -> Result<Option<Percent>, StorageError> {
        // Counts and write happen in one statement: round-half-up of
        // completed/total, 0 for a course without lessons.
        let percent: Option<i64> = sqlx::query_scalar(
            r"
            WITH target AS (
                SELECT course_id FROM enrollments WHERE id = ?1
            ),
            totals AS (
                SELECT COUNT(*) AS total
                FROM lessons l
                JOIN sections s ON s.id = l.section_id
                WHERE s.course_id = (SELECT course_id FROM target)
            ),
            done AS (
                SELECT COUNT(*) AS completed
                FROM lesson_progress
                WHERE enrollment_id = ?1 AND is_completed = 1
            )
            UPDATE enrollments
            SET progress_percent = (
                SELECT CASE
                    WHEN total = 0 THEN 0
                    ELSE MIN(100, (200 * completed + total) / (2 * total))
                END
                FROM totals, done
            )
            WHERE id = ?1
            RETURNING progress_percent
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        percent
            .map(|v| percent_from_i64("progress_percent", v))
            .transpose()
    }
}

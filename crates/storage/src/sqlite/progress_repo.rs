use course_core::model::{EnrollmentId, LessonId, LessonProgress, LessonProgressUpdate};

use super::SqliteRepository;
use super::mapping::{db_err, map_progress_row};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn upsert_progress(
        &self,
        update: &LessonProgressUpdate,
    ) -> Result<LessonProgress, StorageError> {
        let completed_at = update.completed().then(|| update.at());

        let row = sqlx::query(
            r"
            INSERT INTO lesson_progress (enrollment_id, lesson_id, is_completed, completed_at, video_progress, last_viewed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(enrollment_id, lesson_id) DO UPDATE SET
                completed_at = CASE
                    WHEN excluded.is_completed = 0 THEN NULL
                    WHEN lesson_progress.is_completed = 1
                        THEN COALESCE(lesson_progress.completed_at, excluded.completed_at)
                    ELSE excluded.completed_at
                END,
                is_completed = excluded.is_completed,
                video_progress = COALESCE(excluded.video_progress, lesson_progress.video_progress),
                last_viewed_at = excluded.last_viewed_at
            RETURNING enrollment_id, lesson_id, is_completed, completed_at, video_progress, last_viewed_at
            ",
        )
        .bind(update.enrollment_id().as_str())
        .bind(update.lesson_id().as_str())
        .bind(update.completed())
        .bind(completed_at)
        .bind(update.video_progress())
        .bind(update.at())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        map_progress_row(&row)
    }

    async fn get_progress(
        &self,
        enrollment_id: &EnrollmentId,
        lesson_id: &LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT enrollment_id, lesson_id, is_completed, completed_at, video_progress, last_viewed_at
            FROM lesson_progress
            WHERE enrollment_id = ?1 AND lesson_id = ?2
            ",
        )
        .bind(enrollment_id.as_str())
        .bind(lesson_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => map_progress_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_progress(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT enrollment_id, lesson_id, is_completed, completed_at, video_progress, last_viewed_at
            FROM lesson_progress
            WHERE enrollment_id = ?1
            ORDER BY lesson_id ASC
            ",
        )
        .bind(enrollment_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_progress_row).collect()
    }
}

use course_core::model::{AssignmentId, AssignmentSubmission, EnrollmentId, QuizAttempt};

use super::SqliteRepository;
use super::mapping::{db_err, map_quiz_attempt_row, map_submission_row};
use crate::repository::{AssessmentRepository, StorageError};

#[async_trait::async_trait]
impl AssessmentRepository for SqliteRepository {
    async fn append_quiz_attempt(&self, attempt: &QuizAttempt) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO quiz_attempts (enrollment_id, quiz_id, score, submitted_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(attempt.enrollment_id.as_str())
        .bind(attempt.quiz_id.as_str())
        .bind(i64::from(attempt.score.value()))
        .bind(attempt.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(res.last_insert_rowid())
    }

    async fn list_quiz_attempts(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<Vec<QuizAttempt>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT enrollment_id, quiz_id, score, submitted_at
            FROM quiz_attempts
            WHERE enrollment_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(enrollment_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_quiz_attempt_row).collect()
    }

    async fn upsert_submission(
        &self,
        submission: &AssignmentSubmission,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO assignment_submissions (enrollment_id, assignment_id, status, submitted_at, graded_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(enrollment_id, assignment_id) DO UPDATE SET
                status = excluded.status,
                submitted_at = excluded.submitted_at,
                graded_at = excluded.graded_at
            ",
        )
        .bind(submission.enrollment_id.as_str())
        .bind(submission.assignment_id.as_str())
        .bind(submission.status.as_str())
        .bind(submission.submitted_at)
        .bind(submission.graded_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_submission(
        &self,
        enrollment_id: &EnrollmentId,
        assignment_id: &AssignmentId,
    ) -> Result<Option<AssignmentSubmission>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT enrollment_id, assignment_id, status, submitted_at, graded_at
            FROM assignment_submissions
            WHERE enrollment_id = ?1 AND assignment_id = ?2
            ",
        )
        .bind(enrollment_id.as_str())
        .bind(assignment_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => map_submission_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_submissions(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<Vec<AssignmentSubmission>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT enrollment_id, assignment_id, status, submitted_at, graded_at
            FROM assignment_submissions
            WHERE enrollment_id = ?1
            ORDER BY assignment_id ASC
            ",
        )
        .bind(enrollment_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_submission_row).collect()
    }
}

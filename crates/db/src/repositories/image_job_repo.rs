//! Repository for the `image_generation_jobs` table.

use sparkfluence_core::status::JobStatus;
use sparkfluence_core::types::DbId;
use sqlx::PgPool;

use crate::models::image_job::{ImageJob, NewImageJob};

/// Column list for `image_generation_jobs` queries.
const COLUMNS: &str = "\
    id, user_id, session_id, segment_id, segment_number, segment_type, \
    shot_type, emotion, visual_prompt, style, aspect_ratio, provider, topic, \
    character_description, character_ref_png, status, image_url, \
    error_message, created_at, updated_at";

/// Provides CRUD operations for image generation jobs.
pub struct ImageJobRepo;

impl ImageJobRepo {
    /// Insert a batch of pending jobs in one transaction.
    pub async fn insert_many(
        pool: &PgPool,
        jobs: &[NewImageJob],
    ) -> Result<Vec<ImageJob>, sqlx::Error> {
        let query = format!(
            "INSERT INTO image_generation_jobs \
                (user_id, session_id, segment_id, segment_number, segment_type, shot_type, \
                 emotion, visual_prompt, style, aspect_ratio, provider, topic, \
                 character_description, character_ref_png, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {COLUMNS}"
        );

        let mut tx = pool.begin().await?;
        let mut rows = Vec::with_capacity(jobs.len());
        for job in jobs {
            let row = sqlx::query_as::<_, ImageJob>(&query)
                .bind(job.user_id)
                .bind(&job.session_id)
                .bind(&job.segment_id)
                .bind(job.segment_number)
                .bind(&job.segment_type)
                .bind(&job.shot_type)
                .bind(&job.emotion)
                .bind(&job.visual_prompt)
                .bind(&job.style)
                .bind(&job.aspect_ratio)
                .bind(&job.provider)
                .bind(&job.topic)
                .bind(&job.character_description)
                .bind(&job.character_ref_png)
                .bind(JobStatus::Pending.id())
                .fetch_one(&mut *tx)
                .await?;
            rows.push(row);
        }
        tx.commit().await?;
        Ok(rows)
    }

    /// Find a job by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ImageJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM image_generation_jobs WHERE id = $1");
        sqlx::query_as::<_, ImageJob>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The lowest-numbered pending job of a session.
    pub async fn next_pending(
        pool: &PgPool,
        session_id: &str,
        user_id: DbId,
    ) -> Result<Option<ImageJob>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM image_generation_jobs \
             WHERE session_id = $1 AND user_id = $2 AND status = $3 \
             ORDER BY segment_number ASC \
             LIMIT 1"
        );
        sqlx::query_as::<_, ImageJob>(&query)
            .bind(session_id)
            .bind(user_id)
            .bind(JobStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// All jobs of a session ordered by segment number.
    pub async fn list_for_session(
        pool: &PgPool,
        session_id: &str,
        user_id: DbId,
    ) -> Result<Vec<ImageJob>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM image_generation_jobs \
             WHERE session_id = $1 AND user_id = $2 \
             ORDER BY segment_number ASC"
        );
        sqlx::query_as::<_, ImageJob>(&query)
            .bind(session_id)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn mark_processing(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE image_generation_jobs SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(JobStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn complete(pool: &PgPool, id: DbId, image_url: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE image_generation_jobs \
             SET status = $2, image_url = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(JobStatus::Completed.id())
        .bind(image_url)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn mark_failed(pool: &PgPool, id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE image_generation_jobs \
             SET status = $2, error_message = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(JobStatus::Failed.id())
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }
}

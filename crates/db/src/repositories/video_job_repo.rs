//! Repository for the `video_generation_jobs` table.
//!
//! Status transitions use `JobStatus` from `sparkfluence_core::status`.

use sparkfluence_core::status::JobStatus;
use sparkfluence_core::types::DbId;
use sqlx::PgPool;

use crate::models::video_job::{NewVideoJob, SubmittedVideoJob, VideoJob};

/// Column list for `video_generation_jobs` queries.
const COLUMNS: &str = "\
    id, user_id, session_id, segment_id, segment_number, segment_type, \
    shot_type, emotion, script_text, image_url, duration_seconds, language, \
    aspect_ratio, resolution, environment, topic, preferred_platform, \
    platform, prompt, veo_uuid, status, video_url, thumbnail_url, \
    error_message, created_at, updated_at";

/// Provides CRUD operations for video generation jobs.
pub struct VideoJobRepo;

impl VideoJobRepo {
    /// Insert or reset one job per segment, keyed by `(session_id, segment_id)`.
    ///
    /// A re-created job goes back to pending and loses any previous provider
    /// submission and outcome. All rows are written in one transaction.
    pub async fn upsert_many(
        pool: &PgPool,
        jobs: &[NewVideoJob],
    ) -> Result<Vec<VideoJob>, sqlx::Error> {
        let query = format!(
            "INSERT INTO video_generation_jobs \
                (user_id, session_id, segment_id, segment_number, segment_type, shot_type, \
                 emotion, script_text, image_url, duration_seconds, language, aspect_ratio, \
                 resolution, environment, topic, preferred_platform, platform, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
             ON CONFLICT ON CONSTRAINT uq_video_generation_jobs_session_segment DO UPDATE SET \
                user_id = EXCLUDED.user_id, \
                segment_number = EXCLUDED.segment_number, \
                segment_type = EXCLUDED.segment_type, \
                shot_type = EXCLUDED.shot_type, \
                emotion = EXCLUDED.emotion, \
                script_text = EXCLUDED.script_text, \
                image_url = EXCLUDED.image_url, \
                duration_seconds = EXCLUDED.duration_seconds, \
                language = EXCLUDED.language, \
                aspect_ratio = EXCLUDED.aspect_ratio, \
                resolution = EXCLUDED.resolution, \
                environment = EXCLUDED.environment, \
                topic = EXCLUDED.topic, \
                preferred_platform = EXCLUDED.preferred_platform, \
                platform = EXCLUDED.platform, \
                status = EXCLUDED.status, \
                prompt = NULL, veo_uuid = NULL, video_url = NULL, \
                thumbnail_url = NULL, error_message = NULL, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );

        let mut tx = pool.begin().await?;
        let mut rows = Vec::with_capacity(jobs.len());
        for job in jobs {
            let row = sqlx::query_as::<_, VideoJob>(&query)
                .bind(job.user_id)
                .bind(&job.session_id)
                .bind(&job.segment_id)
                .bind(job.segment_number)
                .bind(&job.segment_type)
                .bind(&job.shot_type)
                .bind(&job.emotion)
                .bind(&job.script_text)
                .bind(&job.image_url)
                .bind(job.duration_seconds)
                .bind(&job.language)
                .bind(&job.aspect_ratio)
                .bind(&job.resolution)
                .bind(&job.environment)
                .bind(&job.topic)
                .bind(&job.preferred_platform)
                .bind(&job.platform)
                .bind(JobStatus::Pending.id())
                .fetch_one(&mut *tx)
                .await?;
            rows.push(row);
        }
        tx.commit().await?;
        Ok(rows)
    }

    /// Record a job submitted by the synchronous batch path. The row is
    /// created (or overwritten) already processing.
    pub async fn upsert_submitted(
        pool: &PgPool,
        job: &SubmittedVideoJob,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO video_generation_jobs \
                (user_id, session_id, segment_id, segment_type, veo_uuid, platform, \
                 prompt, image_url, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT ON CONSTRAINT uq_video_generation_jobs_session_segment DO UPDATE SET \
                user_id = EXCLUDED.user_id, \
                segment_type = EXCLUDED.segment_type, \
                veo_uuid = EXCLUDED.veo_uuid, \
                platform = EXCLUDED.platform, \
                prompt = EXCLUDED.prompt, \
                image_url = EXCLUDED.image_url, \
                status = EXCLUDED.status, \
                updated_at = NOW()",
        )
        .bind(job.user_id)
        .bind(&job.session_id)
        .bind(&job.segment_id)
        .bind(&job.segment_type)
        .bind(&job.veo_uuid)
        .bind(&job.platform)
        .bind(&job.prompt)
        .bind(&job.image_url)
        .bind(JobStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find a job by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<VideoJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM video_generation_jobs WHERE id = $1");
        sqlx::query_as::<_, VideoJob>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The lowest-numbered pending job of a session.
    pub async fn next_pending(
        pool: &PgPool,
        session_id: &str,
        user_id: DbId,
    ) -> Result<Option<VideoJob>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM video_generation_jobs \
             WHERE session_id = $1 AND user_id = $2 AND status = $3 \
             ORDER BY segment_number ASC \
             LIMIT 1"
        );
        sqlx::query_as::<_, VideoJob>(&query)
            .bind(session_id)
            .bind(user_id)
            .bind(JobStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Number of jobs of a session currently being rendered by the provider.
    pub async fn count_processing(
        pool: &PgPool,
        session_id: &str,
        user_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM video_generation_jobs \
             WHERE session_id = $1 AND user_id = $2 AND status = $3",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(JobStatus::Processing.id())
        .fetch_one(pool)
        .await
    }

    /// All jobs of a session ordered by segment number.
    pub async fn list_for_session(
        pool: &PgPool,
        session_id: &str,
        user_id: DbId,
    ) -> Result<Vec<VideoJob>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM video_generation_jobs \
             WHERE session_id = $1 AND user_id = $2 \
             ORDER BY segment_number ASC"
        );
        sqlx::query_as::<_, VideoJob>(&query)
            .bind(session_id)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Processing jobs of a session that have been submitted to the provider.
    pub async fn list_submitted(
        pool: &PgPool,
        session_id: &str,
        user_id: DbId,
    ) -> Result<Vec<VideoJob>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM video_generation_jobs \
             WHERE session_id = $1 AND user_id = $2 AND status = $3 \
               AND veo_uuid IS NOT NULL \
             ORDER BY segment_number ASC"
        );
        sqlx::query_as::<_, VideoJob>(&query)
            .bind(session_id)
            .bind(user_id)
            .bind(JobStatus::Processing.id())
            .fetch_all(pool)
            .await
    }

    pub async fn mark_processing(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE video_generation_jobs SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(JobStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn mark_failed(pool: &PgPool, id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE video_generation_jobs \
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

    /// Store the provider's identifier after a successful submission. The
    /// job stays processing until the poller sees a terminal status.
    pub async fn record_submission(
        pool: &PgPool,
        id: DbId,
        veo_uuid: &str,
        platform: &str,
        prompt: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE video_generation_jobs \
             SET veo_uuid = $2, platform = $3, prompt = $4, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(veo_uuid)
        .bind(platform)
        .bind(prompt)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark every job carrying `veo_uuid` as completed. Returns rows touched.
    pub async fn complete_by_uuid(
        pool: &PgPool,
        veo_uuid: &str,
        video_url: Option<&str>,
        thumbnail_url: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE video_generation_jobs \
             SET status = $2, video_url = $3, thumbnail_url = $4, updated_at = NOW() \
             WHERE veo_uuid = $1",
        )
        .bind(veo_uuid)
        .bind(JobStatus::Completed.id())
        .bind(video_url)
        .bind(thumbnail_url)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Mark every job carrying `veo_uuid` as failed. Returns rows touched.
    pub async fn fail_by_uuid(
        pool: &PgPool,
        veo_uuid: &str,
        error: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE video_generation_jobs \
             SET status = $2, error_message = $3, updated_at = NOW() \
             WHERE veo_uuid = $1",
        )
        .bind(veo_uuid)
        .bind(JobStatus::Failed.id())
        .bind(error)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

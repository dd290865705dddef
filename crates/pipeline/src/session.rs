//! Session-level status: job listing, aggregate counts, and the completion
//! notification raised once a session has nothing left in flight.

use serde::Serialize;
use sparkfluence_core::notification::{GenerationKind, NewNotification};
use sparkfluence_core::status::SessionSummary;
use sparkfluence_core::types::DbId;
use sparkfluence_db::models::image_job::ImageJob;
use sparkfluence_db::models::video_job::VideoJob;
use sparkfluence_db::repositories::{ImageJobRepo, NotificationRepo, VideoJobRepo};
use sparkfluence_db::DbPool;

use crate::error::PipelineError;

/// A generation session owned by one user.
#[derive(Debug, Clone, Copy)]
pub struct SessionRef<'a> {
    pub session_id: &'a str,
    pub user_id: DbId,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus<J> {
    pub jobs: Vec<J>,
    pub summary: SessionSummary,
    pub all_complete: bool,
}

impl<J> SessionStatus<J> {
    fn tally(jobs: Vec<J>, status_of: impl Fn(&J) -> i16) -> Self {
        let summary = SessionSummary::from_statuses(jobs.iter().map(status_of));
        Self {
            all_complete: summary.all_complete(),
            jobs,
            summary,
        }
    }
}

/// Video jobs of a session. Raises the completion notification once per
/// finished session.
pub async fn video_session_status(
    pool: &DbPool,
    session: SessionRef<'_>,
) -> Result<SessionStatus<VideoJob>, PipelineError> {
    let jobs = VideoJobRepo::list_for_session(pool, session.session_id, session.user_id).await?;
    let status = SessionStatus::tally(jobs, |j| j.status);

    if status.all_complete {
        notify_video_session(pool, session, &status.summary).await;
    }
    Ok(status)
}

/// Image jobs of a session. When `notify` is set and the session is done,
/// a completion notification is created.
pub async fn image_session_status(
    pool: &DbPool,
    session: SessionRef<'_>,
    notify: bool,
) -> Result<SessionStatus<ImageJob>, PipelineError> {
    let jobs = ImageJobRepo::list_for_session(pool, session.session_id, session.user_id).await?;
    let status = SessionStatus::tally(jobs, |j| j.status);

    if notify && status.all_complete {
        let notification =
            NewNotification::session_complete(GenerationKind::Image, session.session_id, &status.summary);
        create_notification(pool, session, &notification).await;
    }
    Ok(status)
}

async fn notify_video_session(pool: &DbPool, session: SessionRef<'_>, summary: &SessionSummary) {
    let notification =
        NewNotification::session_complete(GenerationKind::Video, session.session_id, summary);
    match NotificationRepo::exists_for_session(
        pool,
        session.user_id,
        &notification.notification_type,
        session.session_id,
    )
    .await
    {
        Ok(true) => return,
        Ok(false) => {}
        Err(e) => {
            tracing::error!(session_id = session.session_id, error = %e, "Notification lookup failed");
            return;
        }
    }

    create_notification(pool, session, &notification).await;
}

/// Notification failures never fail the status request.
async fn create_notification(pool: &DbPool, session: SessionRef<'_>, notification: &NewNotification) {
    match NotificationRepo::create(pool, session.user_id, notification).await {
        Ok(created) => tracing::info!(
            user_id = %session.user_id,
            session_id = session.session_id,
            notification_id = %created.id,
            kind = %notification.notification_type,
            "Created completion notification",
        ),
        Err(e) => tracing::error!(
            user_id = %session.user_id,
            session_id = session.session_id,
            error = %e,
            "Failed to create completion notification",
        ),
    }
}

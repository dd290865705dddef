//! Completion notifications raised when a generation session finishes.

use serde::Serialize;
use serde_json::{json, Value};

use crate::status::SessionSummary;

/// Notification type that marks a fully successful video session. Used to
/// suppress duplicate video notifications for the same session.
pub const VIDEO_COMPLETE_TYPE: &str = "video_generation_complete";

/// Which kind of generation session finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Image,
    Video,
}

/// A notification ready to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewNotification {
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: Value,
}

impl NewNotification {
    /// Build the completion notification for a finished session.
    pub fn session_complete(kind: GenerationKind, session_id: &str, summary: &SessionSummary) -> Self {
        let all_success = summary.failed == 0;
        let SessionSummary {
            completed,
            failed,
            total,
            ..
        } = *summary;

        let (notification_type, title, message, redirect) = match (kind, all_success) {
            (GenerationKind::Image, true) => (
                "image_generation_complete",
                "Images Ready!",
                format!("{completed} images generated"),
                "/video-editor",
            ),
            (GenerationKind::Image, false) => (
                "image_generation_partial",
                "Partial Complete",
                format!("{completed}/{total} done, {failed} failed"),
                "/video-editor",
            ),
            (GenerationKind::Video, true) => (
                VIDEO_COMPLETE_TYPE,
                "Videos Ready!",
                format!(
                    "All {completed} video segments have been generated. \
                     Click to continue to music selection."
                ),
                "/video-generation",
            ),
            (GenerationKind::Video, false) => (
                "video_generation_partial",
                "Video Generation Complete",
                format!("{completed}/{total} videos generated. {failed} failed. Click to review and retry."),
                "/video-generation",
            ),
        };

        Self {
            notification_type: notification_type.to_string(),
            title: title.to_string(),
            message,
            data: json!({
                "session_id": session_id,
                "completed": completed,
                "failed": failed,
                "total": total,
                "redirect_url": format!("{redirect}?session={session_id}"),
            }),
        }
    }
}

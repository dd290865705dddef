//! Route definitions for the function endpoints.

use axum::routing::post;
use axum::Router;

use crate::handlers::{image_generation, otp, video_generation, video_status};
use crate::state::AppState;

/// Routes mounted at `/functions/v1`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate-videos", post(video_generation::generate_videos))
        .route("/generate-images", post(image_generation::generate_images))
        .route("/check-video-status", post(video_status::check_video_status))
        .route("/send-whatsapp-otp", post(otp::send_otp))
        .route("/verify-whatsapp-otp", post(otp::verify_otp))
}

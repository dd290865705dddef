//! Object storage buckets and object key construction.

use rand::distr::Alphanumeric;
use rand::Rng;

/// Bucket holding re-hosted video clips.
pub const VIDEO_BUCKET: &str = "video-segments";
/// Bucket holding generated still images.
pub const IMAGE_BUCKET: &str = "generated-images";

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";
pub const IMAGE_CONTENT_TYPE: &str = "image/png";

/// Object key for a re-hosted clip:
/// `<unix_millis>_<label>_<uuid prefix>.mp4`.
///
/// The label is the segment type when known, else `segment_<number>`
/// (`segment_0` when the number is also unknown). The uuid prefix is its
/// first 8 characters.
pub fn rehosted_video_key(
    unix_millis: i64,
    provider_uuid: &str,
    segment_type: Option<&str>,
    segment_number: Option<i64>,
) -> String {
    let label = match segment_type.filter(|t| !t.is_empty()) {
        Some(t) => t.to_string(),
        None => format!("segment_{}", segment_number.unwrap_or(0)),
    };
    let prefix: String = provider_uuid.chars().take(8).collect();
    format!("{unix_millis}_{label}_{prefix}.mp4")
}

/// Object key for a generated image: `generated/<prefix>_<millis>_<rand>.png`.
pub fn generated_image_key(prefix: &str, unix_millis: i64) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("generated/{prefix}_{unix_millis}_{suffix}.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_key_prefers_segment_type() {
        let key = rehosted_video_key(1_700_000_000_000, "abcdef123456", Some("HOOK"), Some(1));
        assert_eq!(key, "1700000000000_HOOK_abcdef12.mp4");
    }

    #[test]
    fn video_key_falls_back_to_number() {
        assert_eq!(rehosted_video_key(5, "u1", None, Some(3)), "5_segment_3_u1.mp4");
        assert_eq!(rehosted_video_key(5, "u1", Some(""), None), "5_segment_0_u1.mp4");
    }

    #[test]
    fn image_key_shape() {
        let key = generated_image_key("flux", 42);
        assert!(key.starts_with("generated/flux_42_"));
        assert!(key.ends_with(".png"));
        assert_eq!(key.len(), "generated/flux_42_".len() + 7 + ".png".len());
    }
}

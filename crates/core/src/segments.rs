//! Normalization of client-supplied script segments.
//!
//! Segments arrive as loosely-shaped JSON objects produced by several
//! generations of the dashboard, so the same field can appear under more
//! than one key (`script_text` / `script`, `image_url` / `imageUrl`, ...).
//! The first non-empty key wins; empty strings and `null` count as absent.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Default clip length when a segment does not specify one.
pub const DEFAULT_DURATION_SECS: i32 = 8;
/// Default emotion tag.
pub const DEFAULT_EMOTION: &str = "authority";
/// Default shot type.
pub const DEFAULT_SHOT_TYPE: &str = "B-ROLL";
/// Shot type that shows the creator's face.
pub const SHOT_CREATOR: &str = "CREATOR";

/// Segment types that always feature the creator on camera.
const CREATOR_SEGMENT_TYPES: &[&str] = &["HOOK", "CTA", "LOOP-END", "ENDING_CTA"];

/// Read-only view over one raw segment object.
pub struct RawSegment<'a>(pub &'a Map<String, Value>);

impl RawSegment<'_> {
    /// First present, non-empty value among `keys`, rendered as a string.
    /// Numbers are accepted and stringified.
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| match self.0.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    /// First present, non-zero integer among `keys`.
    pub fn int(&self, keys: &[&str]) -> Option<i64> {
        keys.iter().find_map(|key| {
            let value = self.0.get(*key)?;
            let n = value
                .as_i64()
                .or_else(|| value.as_f64().map(|f| f as i64))
                .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))?;
            (n != 0).then_some(n)
        })
    }
}

/// A video segment with all defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSegment {
    pub segment_id: String,
    pub segment_number: i32,
    pub segment_type: String,
    pub shot_type: String,
    pub emotion: String,
    pub script_text: String,
    pub image_url: Option<String>,
    pub duration_seconds: i32,
    pub character_name: Option<String>,
    pub transition: Option<String>,
}

impl VideoSegment {
    /// Normalize the segment at position `index` (0-based).
    pub fn from_raw(raw: &Map<String, Value>, index: usize) -> Self {
        let seg = RawSegment(raw);
        let ordinal = index + 1;
        Self {
            segment_id: seg
                .text(&["segment_id", "id"])
                .unwrap_or_else(|| ordinal.to_string()),
            segment_number: seg
                .int(&["segment_number"])
                .and_then(|n| i32::try_from(n).ok())
                .unwrap_or(ordinal as i32),
            segment_type: seg
                .text(&["type", "element", "segment_type"])
                .unwrap_or_else(|| format!("SEGMENT_{ordinal}")),
            shot_type: seg
                .text(&["shot_type"])
                .unwrap_or_else(|| DEFAULT_SHOT_TYPE.to_string()),
            emotion: seg
                .text(&["emotion"])
                .unwrap_or_else(|| DEFAULT_EMOTION.to_string()),
            script_text: seg.text(&["script_text", "script"]).unwrap_or_default(),
            image_url: seg.text(&["image_url", "imageUrl"]),
            duration_seconds: seg
                .int(&["duration_seconds"])
                .and_then(|n| i32::try_from(n).ok())
                .unwrap_or(DEFAULT_DURATION_SECS),
            character_name: seg.text(&["character_name"]),
            transition: seg.text(&["transition"]),
        }
    }

    pub fn has_dialogue(&self) -> bool {
        !self.script_text.is_empty()
    }
}

/// An image segment with all defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSegment {
    pub segment_id: String,
    pub segment_number: i32,
    pub segment_type: String,
    pub shot_type: String,
    pub emotion: String,
    pub visual_direction: String,
    pub character_description: Option<String>,
    pub character_ref_png: Option<String>,
}

impl ImageSegment {
    /// Normalize the segment at position `index` (0-based).
    pub fn from_raw(raw: &Map<String, Value>, index: usize) -> Self {
        let seg = RawSegment(raw);
        let ordinal = index + 1;
        Self {
            segment_id: seg
                .text(&["segment_id"])
                .unwrap_or_else(|| format!("SEG-{ordinal}")),
            segment_number: seg
                .int(&["segment_number"])
                .and_then(|n| i32::try_from(n).ok())
                .unwrap_or(ordinal as i32),
            segment_type: seg
                .text(&["segment_type", "type"])
                .unwrap_or_else(|| format!("segment_{index}")),
            shot_type: seg
                .text(&["shot_type"])
                .unwrap_or_else(|| DEFAULT_SHOT_TYPE.to_string()),
            emotion: seg
                .text(&["emotion"])
                .unwrap_or_else(|| DEFAULT_EMOTION.to_string()),
            visual_direction: seg
                .text(&["visual_prompt", "visual_direction"])
                .unwrap_or_default(),
            character_description: seg.text(&["character_description"]),
            character_ref_png: seg.text(&["character_ref_png"]),
        }
    }

    /// Whether this segment shows the creator (and so needs face
    /// consistency with the reference avatar).
    pub fn is_creator_shot(&self) -> bool {
        self.shot_type == SHOT_CREATOR
    }

    /// Creator shots plus the segment types that always feature the
    /// creator on camera.
    pub fn features_creator(&self) -> bool {
        self.is_creator_shot() || is_creator_segment_type(&self.segment_type)
    }
}

pub fn is_creator_segment_type(segment_type: &str) -> bool {
    let upper = segment_type.to_uppercase();
    CREATOR_SEGMENT_TYPES.contains(&upper.as_str())
}

/// Extract the `segments` array from a request body as a list of objects.
///
/// Returns a validation error if the array is missing, empty, or holds a
/// non-object element.
pub fn segment_objects(segments: Option<&Value>) -> Result<Vec<&Map<String, Value>>, CoreError> {
    let items = segments
        .and_then(Value::as_array)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| CoreError::Validation("Missing or invalid segments array".into()))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_object()
                .ok_or_else(|| CoreError::Validation(format!("Segment {} is not an object", i + 1)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn video_segment_defaults() {
        let raw = obj(json!({}));
        let seg = VideoSegment::from_raw(&raw, 2);
        assert_eq!(seg.segment_id, "3");
        assert_eq!(seg.segment_number, 3);
        assert_eq!(seg.segment_type, "SEGMENT_3");
        assert_eq!(seg.shot_type, "B-ROLL");
        assert_eq!(seg.emotion, "authority");
        assert_eq!(seg.duration_seconds, 8);
        assert!(seg.image_url.is_none());
        assert!(!seg.has_dialogue());
    }

    #[test]
    fn video_segment_prefers_first_alias() {
        let raw = obj(json!({
            "id": "fallback",
            "segment_id": "primary",
            "element": "HOOK",
            "script": "hello there",
            "imageUrl": "https://cdn/x.png",
            "duration_seconds": 6,
            "segment_number": 4
        }));
        let seg = VideoSegment::from_raw(&raw, 0);
        assert_eq!(seg.segment_id, "primary");
        assert_eq!(seg.segment_type, "HOOK");
        assert_eq!(seg.script_text, "hello there");
        assert_eq!(seg.image_url.as_deref(), Some("https://cdn/x.png"));
        assert_eq!(seg.duration_seconds, 6);
        assert_eq!(seg.segment_number, 4);
    }

    #[test]
    fn out_of_range_numbers_use_defaults() {
        let raw = obj(json!({
            "segment_number": 4_294_967_297_i64,
            "duration_seconds": -4_294_967_290_i64
        }));
        let seg = VideoSegment::from_raw(&raw, 1);
        assert_eq!(seg.segment_number, 2);
        assert_eq!(seg.duration_seconds, 8);

        let seg = ImageSegment::from_raw(&obj(json!({ "segment_number": "9999999999" })), 0);
        assert_eq!(seg.segment_number, 1);
    }

    #[test]
    fn empty_strings_fall_through() {
        let raw = obj(json!({ "segment_id": "", "id": 7, "script_text": "", "script": "x" }));
        let seg = VideoSegment::from_raw(&raw, 0);
        assert_eq!(seg.segment_id, "7");
        assert_eq!(seg.script_text, "x");
    }

    #[test]
    fn image_segment_defaults_and_creator_detection() {
        let raw = obj(json!({ "type": "cta", "visual_direction": "desk" }));
        let seg = ImageSegment::from_raw(&raw, 0);
        assert_eq!(seg.segment_id, "SEG-1");
        assert_eq!(seg.segment_type, "cta");
        assert_eq!(seg.visual_direction, "desk");
        assert!(!seg.is_creator_shot());
        assert!(seg.features_creator());
    }

    #[test]
    fn segment_objects_rejects_missing_and_empty() {
        assert_matches!(segment_objects(None), Err(CoreError::Validation(_)));
        assert_matches!(
            segment_objects(Some(&json!([]))),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            segment_objects(Some(&json!([{}, 3]))),
            Err(CoreError::Validation(msg)) if msg.contains("Segment 2")
        );
        assert_eq!(segment_objects(Some(&json!([{}, {}]))).unwrap().len(), 2);
    }
}

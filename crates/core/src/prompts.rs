//! Plain prompt builders for image and video generation.
//!
//! Prompts are assembled from the segment's own fields plus a handful of
//! request-level settings. Creator segments put the on-camera presenter in
//! frame and carry the dialogue; everything else is B-roll with optional
//! voiceover narration.

use crate::segments::{is_creator_segment_type, ImageSegment, VideoSegment};
use crate::video_models::{resolution_for_aspect, VideoPlatform};

/// Maximum prompt length persisted on a video job row.
pub const STORED_PROMPT_MAX_CHARS: usize = 1000;

/// Length of the dialogue preview returned by `preview_prompts`.
pub const DIALOGUE_PREVIEW_CHARS: usize = 100;

const DEFAULT_CREATOR_DESCRIPTION: &str =
    "Professional content creator, confident posture, engaging presence";

/// Request-level settings shared by every video segment of a session.
#[derive(Debug, Clone)]
pub struct VideoPromptContext<'a> {
    pub platform: VideoPlatform,
    pub language: &'a str,
    pub aspect_ratio: &'a str,
    pub environment: &'a str,
    pub topic: &'a str,
}

/// Request-level settings shared by every image segment of a session.
#[derive(Debug, Clone)]
pub struct ImagePromptContext<'a> {
    pub style: &'a str,
    pub aspect_ratio: &'a str,
    pub topic: &'a str,
    pub character_description: &'a str,
}

/// Build the image-to-video prompt for one segment.
pub fn build_video_prompt(segment: &VideoSegment, ctx: &VideoPromptContext<'_>) -> String {
    let duration = ctx.platform.clamp_duration(segment.duration_seconds);
    let resolution = resolution_for_aspect(ctx.aspect_ratio);
    let voice = voice_direction(ctx.language);
    let transition = segment.transition.as_deref().unwrap_or("hold");

    let mut lines = vec![
        format!(
            "[{} - {} #{}]",
            ctx.platform.display_name(),
            segment.segment_type,
            segment.segment_number
        ),
        format!("DURATION: {duration} seconds"),
        format!("RESOLUTION: {resolution}"),
        format!("ASPECT: {}", ctx.aspect_ratio),
        String::new(),
    ];

    if is_creator_segment_type(&segment.segment_type) {
        let name = segment.character_name.as_deref().unwrap_or("Creator");
        lines.push(format!(
            "SCENE: {name} speaks directly to camera in a {} setting, medium close-up, eye-level.",
            ctx.environment
        ));
        lines.push(format!("EMOTION: {}", segment.emotion));
        if segment.has_dialogue() {
            lines.push(format!("DIALOGUE: {name}: \"{}\"", segment.script_text));
            lines.push(format!("VOICE: {voice}"));
        }
    } else {
        lines.push(format!(
            "SCENE: B-roll of the reference image, {} atmosphere in a {} setting. No presenter on screen.",
            segment.emotion, ctx.environment
        ));
        if !ctx.topic.is_empty() {
            lines.push(format!("TOPIC: {}", ctx.topic));
        }
        if segment.has_dialogue() {
            lines.push(format!(
                "VOICEOVER (off-screen narration): \"{}\"",
                segment.script_text
            ));
            lines.push(format!("VOICE: {voice}"));
        } else {
            lines.push("No voiceover in this clip".to_string());
        }
    }

    lines.push(format!("TRANSITION: {transition}"));
    lines.join("\n")
}

/// Build the still-image prompt for one segment.
pub fn build_image_prompt(segment: &ImageSegment, ctx: &ImagePromptContext<'_>) -> String {
    let style = style_guide(ctx.style);

    if segment.features_creator() {
        let description = segment
            .character_description
            .as_deref()
            .filter(|d| !d.is_empty())
            .or(Some(ctx.character_description).filter(|d| !d.is_empty()))
            .unwrap_or(DEFAULT_CREATOR_DESCRIPTION);
        let mut prompt = format!(
            "Photorealistic portrait, {} aspect ratio. {description}. Expression: {}. \
             Medium close-up, looking into the lens.",
            ctx.aspect_ratio, segment.emotion
        );
        if !ctx.topic.is_empty() {
            prompt.push_str(&format!(" Context: {}.", ctx.topic));
        }
        prompt.push_str(&format!("\n\nPRODUCTION STYLE:\n{style}"));
        return prompt;
    }

    let visual = if segment.visual_direction.is_empty() {
        format!("Professional {} concept visualization", ctx.topic)
    } else {
        segment.visual_direction.clone()
    };
    format!(
        "{visual}. Mood: {}. {} aspect ratio, no people facing camera.\n\nPRODUCTION STYLE:\n{style}",
        segment.emotion, ctx.aspect_ratio
    )
}

fn style_guide(style: &str) -> &'static str {
    match style {
        "realistic" => "Documentary style, natural authentic, high detail photorealistic",
        "animated" => "Digital illustration, vibrant stylized, modern graphic design",
        "3d" => "3D render, professional studio lighting, hyperrealistic",
        _ => "Cinematic photorealistic, film production value",
    }
}

fn voice_direction(language: &str) -> &'static str {
    match language.to_lowercase().as_str() {
        "indonesian" => "Indonesian voice, casual tone, natural narration style",
        "hindi" => "Hindi voice with Hinglish style, warm narration",
        "spanish" => "Latin American Spanish voice, warm narrator delivery",
        _ => "American English voice, engaging narrator tone, clear delivery",
    }
}

/// Truncate to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// First [`DIALOGUE_PREVIEW_CHARS`] characters, with an ellipsis when cut.
pub fn dialogue_preview(script: &str) -> String {
    let cut = truncate_chars(script, DIALOGUE_PREVIEW_CHARS);
    if cut.len() < script.len() {
        format!("{cut}...")
    } else {
        cut.to_string()
    }
}

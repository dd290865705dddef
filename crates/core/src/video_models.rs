//! Video generation platforms and their fixed technical limits.

use serde::Serialize;

/// A supported image-to-video model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VideoPlatform {
    #[serde(rename = "veo-3.1-fast")]
    Veo31Fast,
    #[serde(rename = "sora-2-hd")]
    Sora2Hd,
}

impl VideoPlatform {
    /// Resolve the dashboard's platform choice (`auto`, `veo31`, `sora2`).
    ///
    /// `auto` and unrecognised values both resolve to Veo so that every
    /// segment of a session renders at the same resolution.
    pub fn from_preference(preference: Option<&str>) -> Self {
        match preference {
            Some("sora2") => Self::Sora2Hd,
            _ => Self::Veo31Fast,
        }
    }

    /// Parse a stored platform key, as written by [`Self::key`].
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "veo-3.1-fast" => Some(Self::Veo31Fast),
            "sora-2-hd" => Some(Self::Sora2Hd),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Veo31Fast => "veo-3.1-fast",
            Self::Sora2Hd => "sora-2-hd",
        }
    }

    /// Model identifier sent to the provider.
    pub fn api_model(self) -> &'static str {
        self.key()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Veo31Fast => "Veo 3.1 Fast (8s)",
            Self::Sora2Hd => "Sora 2 HD (10s)",
        }
    }

    pub fn max_duration_secs(self) -> i32 {
        match self {
            Self::Veo31Fast => 8,
            Self::Sora2Hd => 10,
        }
    }

    pub fn resolution_label(self) -> &'static str {
        match self {
            Self::Veo31Fast => "720p-1080p",
            Self::Sora2Hd => "720p",
        }
    }

    /// Price per generated clip in USD.
    pub fn price_usd(self) -> f64 {
        0.01
    }

    /// Maximum spoken words that fit in one clip.
    pub fn max_dialogue_words(self) -> usize {
        match self {
            Self::Veo31Fast => 15,
            Self::Sora2Hd => 20,
        }
    }

    /// Clamp a requested duration to what the model can render.
    pub fn clamp_duration(self, requested: i32) -> i32 {
        requested.min(self.max_duration_secs())
    }
}

/// Output resolution for a given aspect ratio. Portrait output is capped
/// at 720p; landscape can render at 1080p.
pub fn resolution_for_aspect(aspect_ratio: &str) -> &'static str {
    if aspect_ratio == "16:9" {
        "1080p"
    } else {
        "720p"
    }
}

/// Result of checking a segment's dialogue against the model's word limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogueCheck {
    pub valid: bool,
    pub word_count: usize,
    pub max_words: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn check_dialogue_length(dialogue: &str, platform: VideoPlatform) -> DialogueCheck {
    let word_count = dialogue.split_whitespace().count();
    let max_words = platform.max_dialogue_words();
    let message = (word_count > max_words).then(|| {
        format!(
            "Dialogue too long: {word_count} words (max {max_words} for {})",
            platform.display_name()
        )
    });
    DialogueCheck {
        valid: message.is_none(),
        word_count,
        max_words,
        message,
    }
}

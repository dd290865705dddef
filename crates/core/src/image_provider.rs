//! Image generation providers and per-segment provider selection.

use serde::Serialize;

/// A concrete image generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageProvider {
    /// DALL-E 3 through the OpenAI images API.
    #[serde(rename = "openai")]
    OpenAi,
    /// gpt-image-1, optionally editing a reference avatar.
    #[serde(rename = "gpt-image-1")]
    GptImage1,
    /// FLUX.1-schnell on the HuggingFace inference router.
    #[serde(rename = "huggingface")]
    HuggingFace,
}

/// Provider mode requested by the client: `auto` picks per segment.
pub const PROVIDER_AUTO: &str = "auto";

impl ImageProvider {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "openai" => Some(Self::OpenAi),
            "gpt-image-1" => Some(Self::GptImage1),
            "huggingface" => Some(Self::HuggingFace),
            _ => None,
        }
    }

    /// Key stored in `image_generation_jobs.provider`.
    pub fn key(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::GptImage1 => "gpt-image-1",
            Self::HuggingFace => "huggingface",
        }
    }

    /// Label reported back to the client in synchronous results.
    pub fn result_label(self) -> &'static str {
        match self {
            Self::OpenAi => "openai-dalle3",
            Self::GptImage1 => "openai-gpt-image-1",
            Self::HuggingFace => "huggingface-flux",
        }
    }

    /// Whether this provider authenticates with the OpenAI key.
    pub fn uses_openai_key(self) -> bool {
        matches!(self, Self::OpenAi | Self::GptImage1)
    }

    /// Pick the provider for one segment.
    ///
    /// In `auto` mode creator shots go to gpt-image-1 (face consistency with
    /// the reference avatar) and everything else to FLUX. An explicit,
    /// unknown provider name falls back to FLUX.
    pub fn for_segment(mode: &str, is_creator_shot: bool) -> Self {
        if mode == PROVIDER_AUTO {
            return if is_creator_shot {
                Self::GptImage1
            } else {
                Self::HuggingFace
            };
        }
        Self::from_key(mode).unwrap_or(Self::HuggingFace)
    }

    /// Requested output size for an aspect ratio, as the provider expects
    /// it. Unknown ratios use the portrait size.
    pub fn size_for_aspect(self, aspect_ratio: &str) -> ImageSize {
        match self {
            Self::OpenAi => match aspect_ratio {
                "16:9" => ImageSize::new(1792, 1024),
                "1:1" => ImageSize::new(1024, 1024),
                _ => ImageSize::new(1024, 1792),
            },
            Self::GptImage1 => match aspect_ratio {
                "16:9" => ImageSize::new(1536, 1024),
                "1:1" => ImageSize::new(1024, 1024),
                _ => ImageSize::new(1024, 1536),
            },
            Self::HuggingFace => match aspect_ratio {
                "16:9" => ImageSize::new(1024, 576),
                "1:1" => ImageSize::new(1024, 1024),
                _ => ImageSize::new(576, 1024),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

//! HTTP clients for the third-party services the backend forwards to.
//!
//! - [`veo`]: image-to-video submission and history lookup (VEO / Sora)
//! - [`openai`]: DALL-E 3 and gpt-image-1 image generation
//! - [`huggingface`]: FLUX.1-schnell image generation
//! - [`fonnte`]: WhatsApp message delivery
//! - [`storage`]: object storage upload and public URLs
//!
//! Every client wraps a shared [`reqwest::Client`] and reports failures as
//! [`ProviderError`].

pub mod config;
pub mod error;
pub mod fonnte;
mod http;
pub mod huggingface;
pub mod openai;
pub mod storage;
pub mod veo;

pub use config::ProviderConfig;
pub use error::ProviderError;

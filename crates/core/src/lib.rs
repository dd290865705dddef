//! Domain types and pure logic shared by the Sparkfluence backend crates.
//!
//! Nothing in here touches the network or the database. Handlers and the
//! pipeline call into these modules for status arithmetic, segment
//! normalization, provider selection, and OTP rules.

pub mod error;
pub mod image_provider;
pub mod naming;
pub mod notification;
pub mod otp;
pub mod prompts;
pub mod segments;
pub mod status;
pub mod types;
pub mod video_models;

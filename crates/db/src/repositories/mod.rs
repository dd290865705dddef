//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod image_job_repo;
pub mod linked_account_repo;
pub mod notification_repo;
pub mod otp_repo;
pub mod token_repo;
pub mod video_job_repo;

pub use image_job_repo::ImageJobRepo;
pub use linked_account_repo::LinkedAccountRepo;
pub use notification_repo::{NotificationRepo, NotificationSettingsRepo};
pub use otp_repo::{OtpRepo, ProfileRepo};
pub use token_repo::TokenRepo;
pub use video_job_repo::VideoJobRepo;

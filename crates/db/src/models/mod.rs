//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row and, where the API writes the table, a `Deserialize`
//! input DTO.

pub mod image_job;
pub mod linked_account;
pub mod notification;
pub mod otp;
pub mod token;
pub mod video_job;

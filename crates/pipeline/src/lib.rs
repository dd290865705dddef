//! Generation job lifecycle: job creation, single-job processing, status
//! polling with asset re-hosting, and session status reporting.
//!
//! Nothing here schedules work. Each entry point runs to completion inside
//! one request and is driven by the client's polling cadence.

pub mod adapters;
pub mod error;
pub mod image;
pub mod poller;
pub mod session;
pub mod video;

pub use error::PipelineError;
pub use poller::{PollItem, PollOptions, PollReport, StatusPoller};
pub use session::{SessionRef, SessionStatus};

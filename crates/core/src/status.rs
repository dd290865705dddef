//! Generation job status codes and session-level aggregation.
//!
//! Status values are stored as SMALLINT in the job tables and are also the
//! codes the video provider reports (1 = processing, 2 = completed,
//! 3 = failed), so one enum serves both.

use serde::Serialize;

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Look up a variant by its database status ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                $(
                    if id == $val {
                        return Some(Self::$variant);
                    }
                )+
                None
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Lifecycle of an image or video generation job.
    JobStatus {
        Pending = 0,
        Processing = 1,
        Completed = 2,
        Failed = 3,
    }
}

impl JobStatus {
    /// Classify a status code reported by the video provider.
    ///
    /// Only 2 and 3 are terminal; every other value (including unknown
    /// codes) counts as still processing.
    pub fn from_provider(code: i64) -> Self {
        match code {
            2 => Self::Completed,
            3 => Self::Failed,
            _ => Self::Processing,
        }
    }
}

/// Counts of jobs by status for one generation session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub total: u32,
    pub completed: u32,
    pub failed: u32,
    pub pending: u32,
    pub processing: u32,
}

impl SessionSummary {
    /// Tally a sequence of stored status IDs. Unknown IDs count towards
    /// `total` only.
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = StatusId>,
    {
        let mut summary = Self::default();
        for id in statuses {
            summary.total += 1;
            match JobStatus::from_id(id) {
                Some(JobStatus::Pending) => summary.pending += 1,
                Some(JobStatus::Processing) => summary.processing += 1,
                Some(JobStatus::Completed) => summary.completed += 1,
                Some(JobStatus::Failed) => summary.failed += 1,
                None => {}
            }
        }
        summary
    }

    /// True once nothing is pending or processing and the session has at
    /// least one job.
    pub fn all_complete(&self) -> bool {
        self.pending == 0 && self.processing == 0 && self.total > 0
    }
}

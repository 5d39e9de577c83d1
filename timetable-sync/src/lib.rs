//! Timetable Sync Library
//!
//! This library connects a [`timetable_core::Editor`] to the store that owns
//! the project records. It defines the asynchronous [`ScheduleBackend`] seam,
//! an in-memory backend used by the CLI and tests, and [`ScheduleSession`],
//! which dispatches queued changes, re-fetches and reconciles, and performs
//! bulk saves.

pub mod backend;
pub mod memory;
pub mod session;

pub use backend::{NewScheduleItem, ScheduleBackend};
pub use memory::{MemoryBackend, ProjectSnapshot};
pub use session::{FlushReport, SaveOutcome, ScheduleSession};

/// Result type for timetable-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for timetable-sync operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Editor error: {0}")]
    Core(#[from] timetable_core::Error),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Backend is offline")]
    Unavailable,

    #[error("Bulk save failed for {failed} of {total} requests")]
    BulkSaveFailed { failed: usize, total: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether retrying the same request later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Unavailable | Error::Backend(_) | Error::Io(_))
    }
}

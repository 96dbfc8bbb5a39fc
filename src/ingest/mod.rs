//! Inbound homework artifacts.
//!
//! ```text
//! inbox dir ──▶ InboxWatcher (poll, size-stable) ──▶ IngestionGateway::accept
//!                                                      │ extension / size / decode / resize
//!                                                      ▼
//!                                       HomeworkSink::submit(Submission)
//! ```

pub mod gateway;
pub mod inbox;
pub mod validate;

use crate::session::{JobId, Submission};

pub use gateway::IngestionGateway;
pub use inbox::InboxWatcher;
pub use validate::{clean_filename, IngestError};

/// Result of handing a submission to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Admitted; the pipeline is running.
    Started(JobId),
    /// Another job is in progress; the submission was dropped.
    Busy,
}

/// Receiver of validated submissions.
pub trait HomeworkSink: Send + Sync {
    fn submit(&self, submission: Submission) -> SubmitOutcome;
}

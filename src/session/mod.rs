//! Session state: the phase machine, homework jobs and lesson material.
//!
//! [`PhaseController`] exclusively owns the [`SessionPhase`] and the
//! "in-flight job" slot.  The pipeline is the only producer of [`Lesson`]s;
//! teaching playback only reads them.

pub mod controller;
pub mod job;
pub mod phase;

pub use controller::{PhaseController, PlaybackTicket};
pub use job::{
    ArtifactKind, ExplanationDocument, HomeworkJob, JobId, JobOrigin, Lesson, SlideDeck,
    Submission,
};
pub use phase::SessionPhase;

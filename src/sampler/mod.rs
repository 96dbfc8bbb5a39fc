//! Continuous camera sampling.
//!
//! ```text
//! every interval (Delay on overrun):
//!   capture ── Err ──▶ skip tick
//!      │
//!   recognize (timeout) ── Err/timeout ──▶ ""
//!      │
//!      ├─ teaching phrase  && phase == TeachingReady ──▶ on_teaching_trigger
//!      ├─ interrupt phrase && !interrupt_busy        ──▶ on_interrupt_trigger(frame)
//!      └─ command token (edge-triggered)             ──▶ on_command
//! ```

pub mod runner;
pub mod triggers;

use std::time::Instant;

use crate::collab::Frame;
use crate::command::Command;
use crate::session::SessionPhase;

pub use runner::{FrameSampler, Tick};
pub use triggers::TriggerDetector;

/// What the sampler drives.  Calls are synchronous and must not block.
pub trait SamplerTarget: Send + Sync {
    fn phase(&self) -> SessionPhase;
    fn interrupt_busy(&self) -> bool;
    fn on_teaching_trigger(&self);
    /// Admission (cooldown) is the target's job.
    fn on_interrupt_trigger(&self, frame: Frame, now: Instant);
    fn on_command(&self, command: Command);
}

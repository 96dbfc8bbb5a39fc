//! Pkaisetu ("explain this one") interrupt flow.

pub mod cooldown;
pub mod handler;

pub use cooldown::CooldownGate;
pub use handler::{
    Admission, InterruptError, InterruptGate, InterruptHandler, InterruptOutcome, InterruptPermit,
    PkaisetuRequest, DETAIL_MARKER,
};

//! Lesson playback on the device.

pub mod player;

pub use player::{PlaybackOutcome, TeachingPlayer};

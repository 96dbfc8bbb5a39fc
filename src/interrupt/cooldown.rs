//! Minimum spacing between accepted Pkaisetu triggers.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Admits at most one trigger per `duration`.
///
/// The first trigger is always admitted.  Check and update happen under one
/// lock, so two concurrent callers cannot both pass.
#[derive(Debug)]
pub struct CooldownGate {
    duration: Duration,
    last_accepted: Mutex<Option<Instant>>,
}

impl CooldownGate {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            last_accepted: Mutex::new(None),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Admit a trigger observed at `now`, recording it as the last accepted
    /// one.  Rejections leave the gate untouched.
    pub fn try_admit(&self, now: Instant) -> bool {
        let mut last = self.last_accepted.lock().unwrap_or_else(PoisonError::into_inner);
        match *last {
            Some(previous) if now.saturating_duration_since(previous) < self.duration => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Time left before the next trigger would be admitted at `now`.
    pub fn remaining(&self, now: Instant) -> Duration {
        let last = self.last_accepted.lock().unwrap_or_else(PoisonError::into_inner);
        match *last {
            Some(previous) => self
                .duration
                .saturating_sub(now.saturating_duration_since(previous)),
            None => Duration::ZERO,
        }
    }
}

//! [`PhaseController`] — the single owner of [`SessionPhase`].
//!
//! Every transition is a check-and-set performed under one mutex; there is no
//! other way to change the phase.  The committed phase is mirrored into an
//! atomic so the frame sampler can read it every tick without locking.
//!
//! Playback cancellation is explicit: [`enter_teaching`](PhaseController::enter_teaching)
//! hands out a [`PlaybackTicket`] carrying a fresh [`CancellationToken`], and
//! any transition away from `Teaching` (or a restart) cancels it.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use super::job::{JobId, Lesson};
use super::phase::SessionPhase;

/// Permission to present one lesson, valid until its token is cancelled.
#[derive(Debug, Clone)]
pub struct PlaybackTicket {
    pub id: u64,
    pub lesson: Arc<Lesson>,
    pub token: CancellationToken,
}

#[derive(Debug)]
struct ActivePlayback {
    id: u64,
    token: CancellationToken,
}

#[derive(Debug, Default)]
struct ControllerState {
    phase: SessionPhase,
    in_flight: Option<JobId>,
    lesson: Option<Arc<Lesson>>,
    playback: Option<ActivePlayback>,
    next_playback_id: u64,
}

/// Single source of truth for the session phase.
#[derive(Debug, Default)]
pub struct PhaseController {
    state: Mutex<ControllerState>,
    observed: AtomicU8,
}

impl PhaseController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last committed phase, read without taking the lock.
    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from_u8(self.observed.load(Ordering::Acquire))
    }

    /// Admit `job` if and only if the session is `Waiting`.
    ///
    /// This is the only admission point for homework: at most one call
    /// returns `true` until the job completes or the session is reset.
    pub fn try_enter_processing(&self, job: JobId) -> bool {
        let mut st = self.lock();
        if st.phase != SessionPhase::Waiting {
            return false;
        }
        st.in_flight = Some(job);
        self.commit(&mut st, SessionPhase::Processing);
        true
    }

    /// Publish the lesson produced for `job` and move to `TeachingReady`.
    ///
    /// Rejected when `job` is no longer the in-flight job (the session was
    /// reset while the pipeline ran); the lesson is dropped in that case.
    pub fn mark_teaching_ready(&self, job: JobId, lesson: impl Into<Arc<Lesson>>) -> bool {
        let mut st = self.lock();
        if st.phase != SessionPhase::Processing || st.in_flight != Some(job) {
            return false;
        }
        st.in_flight = None;
        st.lesson = Some(lesson.into());
        self.commit(&mut st, SessionPhase::TeachingReady);
        true
    }

    /// Enter (or restart) `Teaching`.
    ///
    /// Valid from `TeachingReady` and `Teaching`.  A running playback is
    /// cancelled and superseded by the returned ticket.
    pub fn enter_teaching(&self) -> Option<PlaybackTicket> {
        let mut st = self.lock();
        if !st.phase.can_teach() {
            return None;
        }
        let lesson = Arc::clone(st.lesson.as_ref()?);

        if let Some(previous) = st.playback.take() {
            previous.token.cancel();
        }

        st.next_playback_id += 1;
        let id = st.next_playback_id;
        let token = CancellationToken::new();
        st.playback = Some(ActivePlayback {
            id,
            token: token.clone(),
        });
        self.commit(&mut st, SessionPhase::Teaching);

        Some(PlaybackTicket { id, lesson, token })
    }

    /// Playback `playback_id` ran to the end: return to `Waiting`.
    ///
    /// Ignored when the ticket has been superseded or cancelled meanwhile.
    pub fn finish_teaching(&self, playback_id: u64) -> bool {
        let mut st = self.lock();
        let current = st
            .playback
            .as_ref()
            .is_some_and(|p| p.id == playback_id && !p.token.is_cancelled());
        if st.phase != SessionPhase::Teaching || !current {
            return false;
        }
        st.playback = None;
        self.commit(&mut st, SessionPhase::Waiting);
        true
    }

    /// Force `Waiting` from any phase.  Cancels playback and frees the
    /// in-flight slot; the interrupt flow is not affected.
    ///
    /// Returns the phase that was left.
    pub fn reset(&self) -> SessionPhase {
        let mut st = self.lock();
        let previous = st.phase;
        Self::clear(&mut st);
        self.commit(&mut st, SessionPhase::Waiting);
        previous
    }

    /// Reset only if `job` is still in flight.  Used by the pipeline when a
    /// run aborts, so a stale failure cannot clobber a newer session.
    pub fn abandon(&self, job: JobId) -> bool {
        let mut st = self.lock();
        if st.phase != SessionPhase::Processing || st.in_flight != Some(job) {
            return false;
        }
        Self::clear(&mut st);
        self.commit(&mut st, SessionPhase::Waiting);
        true
    }

    /// Most recent lesson, if any pipeline run has completed.
    pub fn lesson(&self) -> Option<Arc<Lesson>> {
        self.lock().lesson.clone()
    }

    pub fn in_flight(&self) -> Option<JobId> {
        self.lock().in_flight
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn clear(st: &mut ControllerState) {
        st.in_flight = None;
        if let Some(playback) = st.playback.take() {
            playback.token.cancel();
        }
    }

    fn commit(&self, st: &mut MutexGuard<'_, ControllerState>, to: SessionPhase) {
        if st.phase != to {
            log::debug!("session: {} → {}", st.phase, to);
        }
        st.phase = to;
        self.observed.store(to.as_u8(), Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

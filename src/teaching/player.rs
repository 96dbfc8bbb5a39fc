//! [`TeachingPlayer`] — presents a lesson slide by slide.
//!
//! ```text
//! enter_teaching ─▶ ticket{id, lesson, token}
//!   speak(opening)
//!   for i in 0..deck.len():
//!       show_slide(deck[i])
//!       speak(segments[i] | filler)
//!       sleep(slide_delay)
//!   finish_teaching(id) ─▶ Waiting
//! ```
//!
//! Every await is raced against the ticket's token, so a reset or restart
//! stops playback at the next suspension point and nothing further is sent.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::TeachingConfig;
use crate::session::{PhaseController, PlaybackTicket};
use crate::speech::Narrator;
use crate::supervisor::{TaskKind, TaskSupervisor};
use crate::transport::DeviceLink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every slide was handled; `delivered` of them reached the transport.
    Completed { delivered: usize },
    /// Stopped while presenting slide `at` (0 while still on the opening line).
    Cancelled { at: usize },
}

pub struct TeachingPlayer {
    link: DeviceLink,
    narrator: Arc<Narrator>,
    controller: Arc<PhaseController>,
    slide_delay: Duration,
    opening_line: String,
    filler_line: String,
}

impl TeachingPlayer {
    pub fn new(
        link: DeviceLink,
        narrator: Arc<Narrator>,
        controller: Arc<PhaseController>,
        config: &TeachingConfig,
    ) -> Self {
        Self {
            link,
            narrator,
            controller,
            slide_delay: config.slide_delay(),
            opening_line: config.opening_line.clone(),
            filler_line: config.filler_line.clone(),
        }
    }

    /// Enter `Teaching` and spawn playback from slide 0.
    ///
    /// Valid from `TeachingReady` and, as a restart, from `Teaching`; the
    /// previous playback is cancelled by the controller.  Returns `false` when
    /// there is nothing to teach.
    pub fn start(self: &Arc<Self>, supervisor: &TaskSupervisor) -> bool {
        let Some(ticket) = self.controller.enter_teaching() else {
            log::debug!("teaching: start ignored in phase {}", self.controller.phase());
            return false;
        };
        log::info!(
            "teaching: playback {} started ({} slides)",
            ticket.id,
            ticket.lesson.deck.len()
        );

        let player = Arc::clone(self);
        supervisor.spawn(TaskKind::Teaching, async move {
            let outcome = player.play(ticket).await;
            log::info!("teaching: {outcome:?}");
        });
        true
    }

    pub async fn play(&self, ticket: PlaybackTicket) -> PlaybackOutcome {
        let PlaybackTicket { id, lesson, token } = ticket;

        if until_cancelled(&token, self.narrator.speak(&self.opening_line))
            .await
            .is_none()
        {
            return PlaybackOutcome::Cancelled { at: 0 };
        }

        let mut delivered = 0;
        for (index, slide) in lesson.deck.iter().enumerate() {
            if token.is_cancelled() {
                return PlaybackOutcome::Cancelled { at: index };
            }

            match until_cancelled(&token, self.link.show_slide(slide)).await {
                None => return PlaybackOutcome::Cancelled { at: index },
                Some(Ok(())) => delivered += 1,
                Some(Err(e)) => log::warn!("teaching: slide {index} not delivered: {e}"),
            }

            let narration = lesson
                .document
                .narration_for(index)
                .unwrap_or(&self.filler_line);
            if until_cancelled(&token, self.narrator.speak(narration))
                .await
                .is_none()
            {
                return PlaybackOutcome::Cancelled { at: index };
            }

            if until_cancelled(&token, tokio::time::sleep(self.slide_delay))
                .await
                .is_none()
            {
                return PlaybackOutcome::Cancelled { at: index };
            }
        }

        if !self.controller.finish_teaching(id) {
            log::debug!("teaching: playback {id} finished after being superseded");
        }
        PlaybackOutcome::Completed { delivered }
    }
}

/// `None` as soon as `token` is cancelled, otherwise the future's output.
async fn until_cancelled<F: Future>(token: &CancellationToken, future: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        output = future => Some(output),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

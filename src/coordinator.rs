//! [`Coordinator`] — wires the session flows together.
//!
//! ```text
//!  InboxWatcher ──submit──▶ ┌─────────────┐ ──spawn(Homework)──▶ HomeworkPipeline
//!  Console ──stop/replay──▶ │ Coordinator │ ──spawn(Teaching)──▶ TeachingPlayer
//!  FrameSampler ─triggers─▶ │             │ ──spawn(Interrupt)─▶ InterruptHandler
//!                           └─────────────┘ ──broadcast────────▶ command subscribers
//!                                 │
//!                          PhaseController / InterruptGate
//! ```
//!
//! The coordinator holds no session state of its own beyond the submission
//! and job history; phase and busy flag live in their owners.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::sync::broadcast;

use crate::collab::{Frame, FrameSource};
use crate::command::Command;
use crate::ingest::{HomeworkSink, SubmitOutcome};
use crate::interrupt::{Admission, InterruptGate, InterruptHandler, PkaisetuRequest};
use crate::pipeline::HomeworkPipeline;
use crate::sampler::SamplerTarget;
use crate::session::{HomeworkJob, JobId, JobOrigin, PhaseController, SessionPhase, Submission};
use crate::supervisor::{TaskKind, TaskSupervisor};
use crate::teaching::TeachingPlayer;

const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Snapshot for the operator console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub phase: SessionPhase,
    pub in_flight: Option<JobId>,
    pub lesson_slides: Option<usize>,
    pub interrupt_busy: bool,
    pub submissions: usize,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "phase={}", self.phase)?;
        if let Some(job) = self.in_flight {
            write!(f, " job={job}")?;
        }
        match self.lesson_slides {
            Some(n) => write!(f, " lesson={n} slides")?,
            None => write!(f, " lesson=none")?,
        }
        write!(
            f,
            " pkaisetu={} submissions={}",
            if self.interrupt_busy { "busy" } else { "idle" },
            self.submissions
        )
    }
}

pub struct Coordinator {
    controller: Arc<PhaseController>,
    pipeline: Arc<HomeworkPipeline>,
    player: Arc<TeachingPlayer>,
    gate: InterruptGate,
    interrupt: Arc<InterruptHandler>,
    camera: Arc<dyn FrameSource>,
    supervisor: TaskSupervisor,
    commands: broadcast::Sender<Command>,
    /// Every submission, admitted or not.
    submissions: Mutex<Vec<Submission>>,
    /// Admitted jobs, each holding its lesson once the pipeline publishes it.
    jobs: Arc<Mutex<Vec<HomeworkJob>>>,
}

impl Coordinator {
    pub fn new(
        controller: Arc<PhaseController>,
        pipeline: Arc<HomeworkPipeline>,
        player: Arc<TeachingPlayer>,
        gate: InterruptGate,
        interrupt: Arc<InterruptHandler>,
        camera: Arc<dyn FrameSource>,
        supervisor: TaskSupervisor,
    ) -> Self {
        let (commands, _) = broadcast::channel(COMMAND_CHANNEL_CAPACITY);
        Self {
            controller,
            pipeline,
            player,
            gate,
            interrupt,
            camera,
            supervisor,
            commands,
            submissions: Mutex::new(Vec::new()),
            jobs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    // -----------------------------------------------------------------------
    // Homework
    // -----------------------------------------------------------------------

    /// Record `submission` and start its pipeline if the session is idle.
    ///
    /// A busy session records the submission only; no job is created.
    pub fn submit(&self, submission: Submission) -> SubmitOutcome {
        let job = HomeworkJob::from_submission(&submission);
        lock(&self.submissions).push(submission);
        self.start_job(job)
    }

    /// Resubmit the most recent ingested artifact as a new job.
    pub fn replay_latest(&self) -> Option<SubmitOutcome> {
        let latest = lock(&self.jobs)
            .iter()
            .rev()
            .find(|job| matches!(job.origin, JobOrigin::Ingested { .. }))
            .map(HomeworkJob::replay_of)?;
        log::info!("coordinator: replaying {}", latest.artifact.display());
        Some(self.start_job(latest))
    }

    /// Admitted jobs in admission order.
    pub fn jobs(&self) -> Vec<HomeworkJob> {
        lock(&self.jobs).clone()
    }

    fn start_job(&self, job: HomeworkJob) -> SubmitOutcome {
        let id = job.id;
        if !self.controller.try_enter_processing(id) {
            log::warn!(
                "coordinator: job {id} dropped, session is {}",
                self.controller.phase()
            );
            return SubmitOutcome::Busy;
        }
        lock(&self.jobs).push(job.clone());

        let pipeline = Arc::clone(&self.pipeline);
        let jobs = Arc::clone(&self.jobs);
        self.supervisor.spawn(TaskKind::Homework, async move {
            if let Some(lesson) = pipeline.execute(job).await {
                if let Some(entry) = lock(&jobs).iter_mut().find(|j| j.id == id) {
                    entry.lesson = Some(lesson);
                }
            }
        });
        SubmitOutcome::Started(id)
    }

    // -----------------------------------------------------------------------
    // Teaching and commands
    // -----------------------------------------------------------------------

    pub fn start_teaching(&self) -> bool {
        self.player.start(&self.supervisor)
    }

    pub fn dispatch(&self, command: Command) {
        // No subscribers is fine.
        let _ = self.commands.send(command);

        match command {
            Command::Stop => {
                let previous = self.controller.reset();
                log::info!("coordinator: stop ({previous} → waiting)");
            }
            Command::Restart => {
                if !self.start_teaching() {
                    log::debug!("coordinator: restart ignored, no lesson to present");
                }
            }
            Command::Skip | Command::Repeat | Command::Faster | Command::Slower => {
                log::info!("coordinator: {command} recognized (not applied to playback)");
            }
        }
    }

    pub fn subscribe_commands(&self) -> broadcast::Receiver<Command> {
        self.commands.subscribe()
    }

    /// Operator stop: back to `Waiting` from any phase.  A running Pkaisetu
    /// is left to finish.
    pub fn emergency_stop(&self) -> SessionPhase {
        let previous = self.controller.reset();
        log::warn!("coordinator: emergency stop in phase {previous}");
        previous
    }

    // -----------------------------------------------------------------------
    // Pkaisetu
    // -----------------------------------------------------------------------

    /// Camera trigger: busy flag and cooldown apply.
    pub fn handle_interrupt(&self, frame: Frame, now: Instant) -> bool {
        match self.gate.try_admit(now) {
            Admission::Admitted(permit) => {
                log::info!("coordinator: Pkaisetu admitted");
                let handler = Arc::clone(&self.interrupt);
                let request = PkaisetuRequest {
                    frame,
                    requested_at: now,
                };
                self.supervisor.spawn(TaskKind::Interrupt, async move {
                    let outcome = handler.run(permit, request).await;
                    log::info!("coordinator: Pkaisetu {outcome:?}");
                });
                true
            }
            Admission::Busy => {
                log::debug!("coordinator: Pkaisetu ignored, already handling one");
                false
            }
            Admission::CoolingDown { remaining } => {
                log::trace!("coordinator: Pkaisetu ignored, cooling down for {remaining:?}");
                false
            }
        }
    }

    /// Operator trigger on a fresh frame.  Bypasses the cooldown; `false`
    /// when a Pkaisetu is already running.
    pub fn manual_interrupt(&self) -> bool {
        let Some(permit) = self.gate.try_admit_manual() else {
            log::info!("coordinator: manual Pkaisetu ignored, already handling one");
            return false;
        };

        let camera = Arc::clone(&self.camera);
        let handler = Arc::clone(&self.interrupt);
        self.supervisor.spawn(TaskKind::Interrupt, async move {
            match camera.capture().await {
                Ok(frame) => {
                    let outcome = handler.run(permit, PkaisetuRequest::new(frame)).await;
                    log::info!("coordinator: manual Pkaisetu {outcome:?}");
                }
                Err(e) => log::warn!("coordinator: manual Pkaisetu capture failed: {e}"),
            }
        });
        true
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            phase: self.controller.phase(),
            in_flight: self.controller.in_flight(),
            lesson_slides: self.controller.lesson().map(|l| l.deck.len()),
            interrupt_busy: self.gate.is_busy(),
            submissions: lock(&self.submissions).len(),
        }
    }

    pub fn supervisor(&self) -> &TaskSupervisor {
        &self.supervisor
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SamplerTarget for Coordinator {
    fn phase(&self) -> SessionPhase {
        self.controller.phase()
    }

    fn interrupt_busy(&self) -> bool {
        self.gate.is_busy()
    }

    fn on_teaching_trigger(&self) {
        self.start_teaching();
    }

    fn on_interrupt_trigger(&self, frame: Frame, now: Instant) {
        self.handle_interrupt(frame, now);
    }

    fn on_command(&self, command: Command) {
        self.dispatch(command);
    }
}

impl HomeworkSink for Coordinator {
    fn submit(&self, submission: Submission) -> SubmitOutcome {
        Coordinator::submit(self, submission)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

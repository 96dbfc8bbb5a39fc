//! [`FrameSampler`] — the per-tick recognition loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::triggers::TriggerDetector;
use super::SamplerTarget;
use crate::collab::{FrameSource, TextRecognizer};
use crate::command::{Command, CommandRecognizer};
use crate::config::SamplerConfig;
use crate::session::SessionPhase;

/// What one tick dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tick {
    pub captured: bool,
    pub teaching: bool,
    pub interrupt: bool,
    pub command: Option<Command>,
}

pub struct FrameSampler {
    camera: Arc<dyn FrameSource>,
    recognizer: Arc<dyn TextRecognizer>,
    commands: CommandRecognizer,
    teaching: TriggerDetector,
    interrupt: TriggerDetector,
    interval: Duration,
    recognition_timeout: Duration,
}

impl FrameSampler {
    pub fn new(
        camera: Arc<dyn FrameSource>,
        recognizer: Arc<dyn TextRecognizer>,
        config: &SamplerConfig,
    ) -> Self {
        Self {
            camera,
            recognizer,
            commands: CommandRecognizer::new(),
            teaching: TriggerDetector::new(&config.teaching_phrases),
            interrupt: TriggerDetector::new(&config.interrupt_phrases),
            interval: config.interval(),
            recognition_timeout: config.recognition_timeout(),
        }
    }

    /// Sample until `shutdown` is cancelled.
    pub async fn run(&self, target: Arc<dyn SamplerTarget>, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_command = None;

        log::info!("sampler: started ({:?} interval)", self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let tick = self.sample_once(target.as_ref(), &mut last_command).await;
                    if tick.teaching || tick.interrupt || tick.command.is_some() {
                        log::debug!("sampler: {tick:?}");
                    }
                }
                _ = shutdown.cancelled() => {
                    log::info!("sampler: shutting down");
                    break;
                }
            }
        }
    }

    /// One capture → recognize → dispatch pass.
    ///
    /// `last_command` carries the command seen on the previous tick; a
    /// command is only dispatched on the tick where it first appears.
    pub async fn sample_once(
        &self,
        target: &dyn SamplerTarget,
        last_command: &mut Option<Command>,
    ) -> Tick {
        let frame = match self.camera.capture().await {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("sampler: capture failed: {e}");
                return Tick::default();
            }
        };

        let text = match tokio::time::timeout(self.recognition_timeout, self.recognizer.recognize(&frame.data)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                log::debug!("sampler: recognition failed: {e}");
                String::new()
            }
            Err(_) => {
                log::debug!("sampler: recognition timed out");
                String::new()
            }
        };
        let lowered = text.to_lowercase();
        let mut tick = Tick {
            captured: true,
            ..Tick::default()
        };

        if target.phase() == SessionPhase::TeachingReady && self.teaching.matches_lowered(&lowered) {
            log::info!("sampler: teaching trigger recognized");
            target.on_teaching_trigger();
            tick.teaching = true;
        }

        if !target.interrupt_busy() && self.interrupt.matches_lowered(&lowered) {
            target.on_interrupt_trigger(frame, Instant::now());
            tick.interrupt = true;
        }

        let command = self.commands.match_text(&lowered);
        if let Some(cmd) = command.filter(|c| Some(*c) != *last_command) {
            log::info!("sampler: command {cmd} recognized");
            target.on_command(cmd);
            tick.command = Some(cmd);
        }
        *last_command = command;

        tick
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::Frame;
    use crate::testing::{ScriptedRecognizer, StaticCamera};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTarget {
        phase: Mutex<SessionPhase>,
        busy: AtomicBool,
        events: Mutex<Vec<String>>,
    }

    impl RecordingTarget {
        fn in_phase(phase: SessionPhase) -> Self {
            Self {
                phase: Mutex::new(phase),
                ..Self::default()
            }
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl SamplerTarget for RecordingTarget {
        fn phase(&self) -> SessionPhase {
            *self.phase.lock().unwrap()
        }
        fn interrupt_busy(&self) -> bool {
            self.busy.load(Ordering::SeqCst)
        }
        fn on_teaching_trigger(&self) {
            self.events.lock().unwrap().push("teach".into());
        }
        fn on_interrupt_trigger(&self, _frame: Frame, _now: Instant) {
            self.events.lock().unwrap().push("pkaisetu".into());
        }
        fn on_command(&self, command: Command) {
            self.events.lock().unwrap().push(command.label().into());
        }
    }

    fn sampler(texts: &[&str]) -> FrameSampler {
        FrameSampler::new(
            Arc::new(StaticCamera::ok()),
            Arc::new(ScriptedRecognizer::new(texts)),
            &SamplerConfig::default(),
        )
    }

    #[tokio::test]
    async fn teaching_trigger_needs_a_ready_lesson() {
        let sampler = sampler(&["おしえて！", "おしえて！"]);
        let mut last = None;

        let waiting = RecordingTarget::in_phase(SessionPhase::Waiting);
        assert!(!sampler.sample_once(&waiting, &mut last).await.teaching);

        let ready = RecordingTarget::in_phase(SessionPhase::TeachingReady);
        assert!(sampler.sample_once(&ready, &mut last).await.teaching);
        assert_eq!(ready.events(), ["teach"]);
    }

    #[tokio::test]
    async fn interrupt_is_skipped_while_busy() {
        let sampler = sampler(&["PKAISETU", "pkaisetu"]);
        let target = RecordingTarget::default();
        let mut last = None;

        target.busy.store(true, Ordering::SeqCst);
        assert!(!sampler.sample_once(&target, &mut last).await.interrupt);

        target.busy.store(false, Ordering::SeqCst);
        assert!(sampler.sample_once(&target, &mut last).await.interrupt);
        assert_eq!(target.events(), ["pkaisetu"]);
    }

    #[tokio::test]
    async fn commands_fire_once_per_appearance() {
        let sampler = sampler(&["STOP", "stop", "", "stop", "skip"]);
        let target = RecordingTarget::default();
        let mut last = None;

        for _ in 0..5 {
            sampler.sample_once(&target, &mut last).await;
        }

        assert_eq!(target.events(), ["stop", "stop", "skip"]);
    }

    #[tokio::test]
    async fn one_frame_can_carry_several_triggers() {
        let sampler = sampler(&["おしえて pkaisetu restart"]);
        let target = RecordingTarget::in_phase(SessionPhase::TeachingReady);
        let mut last = None;

        let tick = sampler.sample_once(&target, &mut last).await;

        assert_eq!(
            tick,
            Tick {
                captured: true,
                teaching: true,
                interrupt: true,
                command: Some(Command::Restart),
            }
        );
        assert_eq!(target.events(), ["teach", "pkaisetu", "restart"]);
    }

    #[tokio::test]
    async fn capture_failure_skips_the_tick() {
        let sampler = FrameSampler::new(
            Arc::new(StaticCamera::failing()),
            Arc::new(ScriptedRecognizer::new(&["stop"])),
            &SamplerConfig::default(),
        );
        let target = RecordingTarget::default();

        let tick = sampler.sample_once(&target, &mut None).await;

        assert_eq!(tick, Tick::default());
        assert!(target.events().is_empty());
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let sampler = Arc::new(sampler(&[]));
        let target: Arc<RecordingTarget> = Arc::new(RecordingTarget::default());
        let token = CancellationToken::new();

        let handle = tokio::spawn({
            let sampler = sampler.clone();
            let token = token.clone();
            let target: Arc<dyn SamplerTarget> = target.clone();
            async move { sampler.run(target, token).await }
        });
        tokio::time::sleep(Duration::from_millis(250)).await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sampler stopped")
            .unwrap();
        assert!(target.events().is_empty());
    }
}

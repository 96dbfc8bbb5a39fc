//! Pkaisetu admission and handling.
//!
//! ```text
//! trigger ─▶ InterruptGate::try_admit ── Busy ──────────▶ (ignored)
//!                  │                 └── CoolingDown ───▶ (ignored, busy released)
//!                  ▼ Admitted(permit)
//!            InterruptHandler::run
//!              speak(acknowledgement)
//!              analyze_snapshot(frame) ─▶ explain_in_detail ─▶ speak
//!              [analysis says 詳細解説が必要] render detail slide ─▶ show_slide
//!              any model error ─▶ speak(apology)
//!            drop(permit) ─▶ busy = false
//! ```
//!
//! The flow is independent of the session phase and may overlap playback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use super::cooldown::CooldownGate;
use crate::collab::{Frame, SlideRenderer, SlideSpec};
use crate::config::InterruptConfig;
use crate::llm::{LanguageModel, LlmError};
use crate::pipeline::DEFAULT_PROBLEM;
use crate::session::PhaseController;
use crate::speech::Narrator;
use crate::transport::DeviceLink;

/// Analysis text asking for a detail slide.
pub const DETAIL_MARKER: &str = "詳細解説が必要";
pub const FALLBACK_TITLE: &str = "Pkaisetu - 詳細解説";
const FALLBACK_LINES: usize = 10;

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

/// Holding a permit means the interrupt flow is busy.  Dropping it clears the
/// busy flag on every exit path.
#[derive(Debug)]
pub struct InterruptPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for InterruptPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub enum Admission {
    Admitted(InterruptPermit),
    /// Another Pkaisetu is being handled.
    Busy,
    /// Too soon after the last accepted trigger.
    CoolingDown { remaining: Duration },
}

/// Busy flag plus cooldown.  The only writer of either.
#[derive(Debug)]
pub struct InterruptGate {
    busy: Arc<AtomicBool>,
    cooldown: CooldownGate,
}

impl InterruptGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            cooldown: CooldownGate::new(cooldown),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Camera-triggered admission: busy flag first, then the cooldown.
    pub fn try_admit(&self, now: Instant) -> Admission {
        let Some(permit) = self.acquire() else {
            return Admission::Busy;
        };
        if !self.cooldown.try_admit(now) {
            let remaining = self.cooldown.remaining(now);
            drop(permit);
            return Admission::CoolingDown { remaining };
        }
        Admission::Admitted(permit)
    }

    /// Operator-triggered admission: honours the busy flag only.
    pub fn try_admit_manual(&self) -> Option<InterruptPermit> {
        self.acquire()
    }

    fn acquire(&self) -> Option<InterruptPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InterruptPermit {
                busy: Arc::clone(&self.busy),
            })
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// Snapshot handed to one handler invocation.
#[derive(Debug, Clone)]
pub struct PkaisetuRequest {
    pub frame: Frame,
    pub requested_at: Instant,
}

impl PkaisetuRequest {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            requested_at: Instant::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum InterruptError {
    #[error("snapshot analysis failed: {0}")]
    Analysis(LlmError),
    #[error("detailed explanation failed: {0}")]
    Explanation(LlmError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOutcome {
    Explained { slide_sent: bool },
    /// A model stage failed; the apology was spoken.
    Failed,
}

pub struct InterruptHandler {
    model: Arc<dyn LanguageModel>,
    renderer: Arc<dyn SlideRenderer>,
    narrator: Arc<Narrator>,
    link: DeviceLink,
    controller: Arc<PhaseController>,
    acknowledgement: String,
    apology: String,
}

impl InterruptHandler {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        renderer: Arc<dyn SlideRenderer>,
        narrator: Arc<Narrator>,
        link: DeviceLink,
        controller: Arc<PhaseController>,
        config: &InterruptConfig,
    ) -> Self {
        Self {
            model,
            renderer,
            narrator,
            link,
            controller,
            acknowledgement: config.acknowledgement.clone(),
            apology: config.apology.clone(),
        }
    }

    /// Handle one admitted Pkaisetu.  Never fails; the permit is released
    /// when this returns.
    pub async fn run(&self, permit: InterruptPermit, request: PkaisetuRequest) -> InterruptOutcome {
        let _permit = permit;
        log::info!(
            "interrupt: handling snapshot ({} bytes, queued {:?})",
            request.frame.data.len(),
            request.requested_at.elapsed()
        );

        self.narrator.speak(&self.acknowledgement).await;

        match self.explain(&request).await {
            Ok(slide_sent) => InterruptOutcome::Explained { slide_sent },
            Err(e) => {
                log::warn!("interrupt: {e}");
                self.narrator.speak(&self.apology).await;
                InterruptOutcome::Failed
            }
        }
    }

    async fn explain(&self, request: &PkaisetuRequest) -> Result<bool, InterruptError> {
        let analysis = self
            .model
            .analyze_snapshot(&request.frame.data)
            .await
            .map_err(InterruptError::Analysis)?;
        let detail = self
            .model
            .explain_in_detail(&analysis)
            .await
            .map_err(InterruptError::Explanation)?;

        self.narrator.speak(&detail).await;

        if !analysis.contains(DETAIL_MARKER) {
            return Ok(false);
        }
        Ok(self.send_detail_slide(&detail).await)
    }

    async fn send_detail_slide(&self, detail: &str) -> bool {
        let problem = self
            .controller
            .lesson()
            .map(|lesson| lesson.problem_summary.clone())
            .unwrap_or_else(|| DEFAULT_PROBLEM.to_string());

        let detail_spec = SlideSpec::Detail {
            problem,
            explanation: detail.to_string(),
        };
        let path = match self.try_render(&detail_spec).await {
            Some(path) => path,
            None => {
                let fallback = SlideSpec::Text {
                    title: FALLBACK_TITLE.to_string(),
                    lines: fallback_lines(detail),
                };
                match self.try_render(&fallback).await {
                    Some(path) => path,
                    None => return false,
                }
            }
        };

        match self.link.show_slide(&path).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("interrupt: detail slide not delivered: {e}");
                false
            }
        }
    }

    async fn try_render(&self, spec: &SlideSpec) -> Option<std::path::PathBuf> {
        match self.renderer.render(spec).await {
            Ok(path) => path,
            Err(e) => {
                log::warn!("interrupt: {} slide failed: {e}", spec.kind());
                None
            }
        }
    }
}

/// First non-empty lines of the explanation for the plain text slide.
fn fallback_lines(detail: &str) -> Vec<String> {
    detail
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(FALLBACK_LINES)
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;
    use crate::testing::{RecordingSpeech, RecordingTransport, ScriptedModel, TestRenderer};

    #[test]
    fn busy_gate_leaves_the_cooldown_untouched() {
        let gate = InterruptGate::new(Duration::from_secs(5));
        let t0 = Instant::now();

        let Admission::Admitted(permit) = gate.try_admit(t0) else {
            panic!("first trigger must be admitted");
        };
        assert!(gate.is_busy());
        assert!(matches!(gate.try_admit(t0 + Duration::from_secs(10)), Admission::Busy));

        drop(permit);
        assert!(!gate.is_busy());
        // The busy rejection did not consume the cooldown slot.
        assert!(matches!(gate.try_admit(t0 + Duration::from_secs(10)), Admission::Admitted(_)));
    }

    #[test]
    fn cooldown_rejection_releases_busy() {
        let gate = InterruptGate::new(Duration::from_secs(5));
        let t0 = Instant::now();
        drop(gate.try_admit(t0));

        match gate.try_admit(t0 + Duration::from_secs(1)) {
            Admission::CoolingDown { remaining } => assert_eq!(remaining, Duration::from_secs(4)),
            other => panic!("unexpected admission: {other:?}"),
        }
        assert!(!gate.is_busy());
    }

    #[test]
    fn manual_trigger_ignores_the_cooldown_only() {
        let gate = InterruptGate::new(Duration::from_secs(5));
        drop(gate.try_admit(Instant::now()));

        let permit = gate.try_admit_manual().expect("manual bypasses cooldown");
        assert!(gate.try_admit_manual().is_none());
        drop(permit);
        assert!(gate.try_admit_manual().is_some());
    }

    #[test]
    fn concurrent_triggers_admit_one() {
        let gate = Arc::new(InterruptGate::new(Duration::ZERO));
        let now = Instant::now();
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    gate.try_admit(now)
                })
            })
            .collect();
        let admissions: Vec<Admission> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let admitted = admissions
            .iter()
            .filter(|a| matches!(a, Admission::Admitted(_)))
            .count();
        assert_eq!(admitted, 1);
    }

    struct Rig {
        handler: InterruptHandler,
        gate: InterruptGate,
        speech: Arc<RecordingSpeech>,
        transport: Arc<RecordingTransport>,
        renderer: Arc<TestRenderer>,
        _dir: tempfile::TempDir,
    }

    fn rig(model: ScriptedModel, renderer: impl FnOnce(&std::path::Path) -> TestRenderer) -> Rig {
        let dir = tempfile::tempdir().expect("temp dir");
        let transport = Arc::new(RecordingTransport::default());
        let speech = Arc::new(RecordingSpeech::default());
        let renderer = Arc::new(renderer(dir.path()));
        let link = DeviceLink::new(transport.clone(), &DeviceConfig::default());
        let narrator = Arc::new(Narrator::new(speech.clone(), link.clone(), dir.path().to_path_buf()));
        let handler = InterruptHandler::new(
            Arc::new(model),
            renderer.clone(),
            narrator,
            link,
            Arc::new(PhaseController::new()),
            &InterruptConfig::default(),
        );
        Rig {
            handler,
            gate: InterruptGate::new(Duration::from_secs(5)),
            speech,
            transport,
            renderer,
            _dir: dir,
        }
    }

    fn admit(gate: &InterruptGate) -> InterruptPermit {
        gate.try_admit_manual().expect("gate free")
    }

    fn request() -> PkaisetuRequest {
        PkaisetuRequest::new(Frame::new(vec![0xFF, 0xD8]))
    }

    #[tokio::test]
    async fn explanation_is_spoken_after_the_acknowledgement() {
        let model = ScriptedModel::new()
            .with_analysis("問題: 2x = 6")
            .with_detail("お兄ちゃん、x = 3 だよ");
        let rig = rig(model, TestRenderer::new);

        let outcome = rig.handler.run(admit(&rig.gate), request()).await;

        assert_eq!(outcome, InterruptOutcome::Explained { slide_sent: false });
        assert_eq!(
            rig.speech.spoken(),
            [InterruptConfig::default().acknowledgement, "お兄ちゃん、x = 3 だよ".into()]
        );
        assert!(rig.transport.slides().is_empty());
        assert!(!rig.gate.is_busy());
    }

    #[tokio::test]
    async fn detail_marker_sends_a_detail_slide() {
        let model = ScriptedModel::new()
            .with_analysis("途中式に誤り。詳細解説が必要")
            .with_detail("ここが違うよ");
        let rig = rig(model, TestRenderer::new);

        let outcome = rig.handler.run(admit(&rig.gate), request()).await;

        assert_eq!(outcome, InterruptOutcome::Explained { slide_sent: true });
        let kinds: Vec<_> = rig.renderer.rendered().iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, ["detail"]);
        assert_eq!(rig.transport.slides().len(), 1);
    }

    #[tokio::test]
    async fn missing_detail_slide_falls_back_to_text() {
        let model = ScriptedModel::new()
            .with_analysis("詳細解説が必要")
            .with_detail("一行目\n\n二行目");
        let rig = rig(model, |dir| TestRenderer::new(dir).skipping(&["detail"]));

        let outcome = rig.handler.run(admit(&rig.gate), request()).await;

        assert_eq!(outcome, InterruptOutcome::Explained { slide_sent: true });
        let rendered = rig.renderer.rendered();
        assert_eq!(
            rendered.last(),
            Some(&SlideSpec::Text {
                title: FALLBACK_TITLE.into(),
                lines: vec!["一行目".into(), "二行目".into()],
            })
        );
    }

    #[tokio::test]
    async fn model_failure_apologises_and_releases_busy() {
        let rig = rig(ScriptedModel::new(), TestRenderer::new);

        let outcome = rig.handler.run(admit(&rig.gate), request()).await;

        assert_eq!(outcome, InterruptOutcome::Failed);
        let spoken = rig.speech.spoken();
        assert_eq!(spoken.last(), Some(&InterruptConfig::default().apology));
        assert!(!rig.gate.is_busy());
    }

    #[test]
    fn fallback_keeps_ten_lines() {
        let text: String = (0..15).map(|i| format!("line {i}\n\n")).collect();
        let lines = fallback_lines(&text);
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[9], "line 9");
    }
}

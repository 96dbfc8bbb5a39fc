//! Application entry point — VR Sensei session coordinator.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (default on first run) and apply
//!    environment overrides.
//! 3. Create the data directories.
//! 4. Create the [`tokio`] runtime.
//! 5. Build the collaborators (camera, OCR, renderer, LLM, VOICEVOX, UDP).
//! 6. Assemble pipeline, player, Pkaisetu handler and [`Coordinator`].
//! 7. Spawn the frame sampler, the inbox watcher and the stdin console.
//! 8. Wait for Ctrl-C or `quit`, then shut down within the grace period.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use vr_sensei::{
    collab::{CommandCamera, CommandOcr, CommandSlideRenderer, FrameSource},
    config::{AppConfig, AppPaths},
    console::run_console,
    coordinator::Coordinator,
    ingest::{IngestionGateway, InboxWatcher},
    interrupt::{InterruptGate, InterruptHandler},
    llm::{ApiLanguageModel, LanguageModel},
    pipeline::HomeworkPipeline,
    sampler::FrameSampler,
    session::PhaseController,
    speech::{Narrator, VoicevoxSynthesizer},
    supervisor::{TaskKind, TaskSupervisor},
    teaching::TeachingPlayer,
    transport::{DeviceLink, UdpTransport},
};

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("VR Sensei starting up");

    // 2. Configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    config.apply_env_overrides();

    // 3. Directories
    let paths = AppPaths::new();
    paths.ensure_dirs().context("failed to create data directories")?;

    // 4. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let result = rt.block_on(run(config, paths));
    // The console may still be parked in a blocking stdin read.
    rt.shutdown_timeout(Duration::from_secs(1));
    result
}

async fn run(config: AppConfig, paths: AppPaths) -> anyhow::Result<()> {
    // 5. Collaborators
    let tool_timeout = config.tools.timeout();
    let camera: Arc<dyn FrameSource> = Arc::new(CommandCamera::new(
        config.tools.camera_command.clone(),
        paths.work_dir.clone(),
        tool_timeout,
    ));
    let ocr = Arc::new(CommandOcr::new(
        config.tools.ocr_command.clone(),
        config.tools.pdf_command.clone(),
        paths.work_dir.clone(),
        tool_timeout,
    ));
    let renderer = Arc::new(CommandSlideRenderer::new(
        config.tools.render_command.clone(),
        paths.slides_dir.clone(),
        tool_timeout,
    ));
    let model: Arc<dyn LanguageModel> = Arc::new(ApiLanguageModel::from_config(&config.llm));
    let speech = Arc::new(VoicevoxSynthesizer::from_config(&config.speech));

    let transport = UdpTransport::connect(&config.device)
        .await
        .with_context(|| format!("cannot reach headset at {}:{}", config.device.host, config.device.base_port))?;
    let link = DeviceLink::new(Arc::new(transport), &config.device);
    let narrator = Arc::new(Narrator::new(speech, link.clone(), paths.audio_dir.clone()));

    // 6. Session core
    let controller = Arc::new(PhaseController::new());
    let supervisor = TaskSupervisor::new();
    let pipeline = Arc::new(HomeworkPipeline::new(
        ocr.clone(),
        model.clone(),
        renderer.clone(),
        controller.clone(),
    ));
    let player = Arc::new(TeachingPlayer::new(
        link.clone(),
        narrator.clone(),
        controller.clone(),
        &config.teaching,
    ));
    let interrupt = Arc::new(InterruptHandler::new(
        model,
        renderer,
        narrator,
        link,
        controller.clone(),
        &config.interrupt,
    ));
    let coordinator = Arc::new(Coordinator::new(
        controller,
        pipeline,
        player,
        InterruptGate::new(config.interrupt.cooldown()),
        interrupt,
        camera.clone(),
        supervisor.clone(),
    ));

    // 7. Loops
    let shutdown = supervisor.shutdown_token();
    {
        let sampler = FrameSampler::new(camera, ocr, &config.sampler);
        let target = coordinator.clone();
        let token = shutdown.clone();
        supervisor.spawn(TaskKind::Sampler, async move {
            sampler.run(target, token).await;
        });
    }

    if config.ingest.enabled {
        let inbox_dir = config.inbox_dir(&paths);
        std::fs::create_dir_all(&inbox_dir)
            .with_context(|| format!("failed to create inbox {}", inbox_dir.display()))?;
        let gateway = IngestionGateway::new(paths.work_dir.clone(), &config.ingest);
        let watcher = InboxWatcher::new(
            inbox_dir,
            gateway,
            coordinator.clone(),
            Duration::from_millis(config.ingest.poll_interval_ms),
        );
        supervisor.spawn(TaskKind::Ingest, watcher.run(shutdown.clone()));
    } else {
        log::info!("Inbox watcher disabled");
    }

    let quit = CancellationToken::new();
    supervisor.spawn(
        TaskKind::Console,
        run_console(
            tokio::io::BufReader::new(tokio::io::stdin()),
            coordinator.clone(),
            quit.clone(),
            shutdown.clone(),
        ),
    );

    log::info!("VR Sensei ready: {}", coordinator.status());

    // 8. Shutdown
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                log::warn!("Ctrl-C handler failed: {e}");
            }
            log::info!("Ctrl-C received");
        }
        _ = quit.cancelled() => {}
    }

    let grace = Duration::from_secs(config.shutdown_grace_secs);
    if !supervisor.shutdown(grace).await {
        log::warn!("Some tasks did not stop within {grace:?}");
    }
    log::info!("VR Sensei stopped");
    Ok(())
}

//! Application entry point: voice assistant.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (defaults on first run; a broken file is fatal).
//! 3. Load the Whisper model (fatal when missing).
//! 4. Probe the configured input device (fatal when absent).
//! 5. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 6. Spawn the interrupt monitor thread.
//! 7. Run the turn loop until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use voice_assistant::{
    audio::{list_input_devices, CaptureError, InputDevice},
    config::{AppConfig, AppPaths},
    interrupt::{CancellationFlag, InterruptMonitor},
    listen::{MicrophoneListener, RecorderSettings},
    pipeline::{new_shared_state, TurnCoordinator, TurnSettings},
    providers::{NewsApiClient, OpenAiChat, OpenWeatherClient},
    router::IntentRouter,
    stt::{SttEngine, TranscribeParams, WhisperEngine},
    tts::{CommandSynthesizer, ResponseSpeaker},
    wake::MicrophoneWakeListener,
};

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voice assistant starting up");

    // 2. Configuration
    let paths = AppPaths::new();
    let config = AppConfig::load_from(&paths.settings_file)
        .with_context(|| format!("invalid configuration in {}", paths.settings_file.display()))?;

    // 3. Whisper model
    let model_path = paths.model_file(&config.stt.model);
    let params = TranscribeParams {
        language: config.stt.language.clone(),
        use_gpu: config.stt.use_gpu,
        ..TranscribeParams::default()
    };
    let stt: Arc<dyn SttEngine> = Arc::new(
        WhisperEngine::load(&model_path, params)
            .with_context(|| format!("could not load Whisper model {}", model_path.display()))?,
    );
    log::info!("Whisper model loaded: {}", model_path.display());

    // 4. Input device
    let input = match InputDevice::open(config.audio.device.as_deref()) {
        Ok(input) => input,
        Err(e @ CaptureError::DeviceNotFound(_)) => {
            if let Ok(names) = list_input_devices() {
                log::error!("available input devices: {names:?}");
            }
            return Err(e).context("no usable microphone");
        }
        Err(e) => return Err(e).context("no usable microphone"),
    };
    log::info!("microphone: {}", input.info());
    drop(input);

    // 5. Tokio runtime (2 worker threads; blocking capture runs on the blocking pool)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 6. Shared cancellation flag and interrupt monitor
    let flag = CancellationFlag::new();
    let _interrupt = if config.interrupt.enabled {
        let listener = MicrophoneListener::new(
            Arc::clone(&stt),
            RecorderSettings::for_interrupt(&config.audio, &config.interrupt),
            &config.audio,
        );
        let monitor = InterruptMonitor::new(
            Arc::new(listener),
            flag.clone(),
            config.assistant.stop_keyword.clone(),
            config.interrupt.error_backoff(),
        );
        Some(monitor.spawn().context("failed to start interrupt monitor")?)
    } else {
        log::info!("interrupt monitor disabled");
        None
    };

    // 7. Turn loop
    let wake = Arc::new(MicrophoneWakeListener::new(
        Arc::clone(&stt),
        &config.assistant,
        &config.audio,
    ));
    let command = Arc::new(MicrophoneListener::new(
        Arc::clone(&stt),
        RecorderSettings::for_command(&config.audio),
        &config.audio,
    ));
    let router = IntentRouter::new(
        Arc::new(OpenAiChat::from_config(&config.chat)),
        Arc::new(NewsApiClient::from_config(&config.news)),
        Arc::new(OpenWeatherClient::from_config(&config.weather)),
        &config,
    );
    let speaker = ResponseSpeaker::new(
        Arc::new(CommandSynthesizer::from_config(&config.tts)),
        flag,
        config.tts.poll_interval(),
    );
    let mut coordinator = TurnCoordinator::new(
        wake,
        command,
        router,
        speaker,
        new_shared_state(),
        TurnSettings::from_config(&config.assistant),
    );

    rt.block_on(async move {
        tokio::select! {
            _ = coordinator.run_forever() => {}
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    log::error!("failed to listen for Ctrl-C: {e}");
                }
            }
        }
    });

    println!("Exiting...");
    // The monitor and any blocking capture are abandoned; process exit ends them.
    rt.shutdown_background();
    Ok(())
}

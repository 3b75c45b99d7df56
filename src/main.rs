use anyhow::{Context, Result};
use hark::audio::Recorder;
use hark::config::AppConfig;
use hark::dispatch::CommandDispatcher;
use hark::narrate::{Narrator, SilentNarrator, SpokenNarrator};
use hark::service::{CalibrationConfig, CommandCycle, ServiceLoop};
use hark::stt::WhisperTranscriber;
use hark::tasks::TaskExecutor;
use hark::transcript::TranscriptLog;
use hark::wake::WakeWordDetector;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    hark::init_tracing(config.logs || config.log_json, config.log_json);

    if config.list_input_devices {
        let devices = Recorder::list_devices()?;
        if devices.is_empty() {
            println!("No audio input devices detected.");
        } else {
            for name in devices {
                println!("{name}");
            }
        }
        return Ok(());
    }

    let recorder = Recorder::new(config.input_device.as_deref())?;
    println!("Listening on '{}'", recorder.device_name());

    let model_path = config
        .model_path
        .as_deref()
        .context("a model path is required")?;
    let stt: Arc<dyn hark::stt::SpeechToText> =
        Arc::new(WhisperTranscriber::new(model_path, &config.lang)?);

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = shutdown.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    })
    .context("failed to install the interrupt handler")?;

    let executor = TaskExecutor::new(config.download_dir.clone())?;
    let narrator: Box<dyn Narrator> = if config.quiet {
        Box::new(SilentNarrator)
    } else {
        Box::new(SpokenNarrator)
    };
    let transcript = TranscriptLog::new(
        config
            .transcript_log
            .clone()
            .unwrap_or_else(TranscriptLog::default_path),
    );

    let cycle = CommandCycle::new(
        stt.clone(),
        CommandDispatcher::new(executor),
        narrator,
        transcript,
    );
    let detector = WakeWordDetector::new(&config.wake_word, stt);
    let calibration = CalibrationConfig {
        sample_secs: config.calibration_secs,
        interval_secs: config.calibration_interval_secs,
        multiplier: config.threshold_multiplier,
    };

    println!("Say '{}' to issue a command.", config.wake_word);
    let mut service = ServiceLoop::new(
        recorder,
        config.input_device.clone(),
        config.buffer_samples(),
        detector,
        cycle,
        config.capture_config(),
        calibration,
        Duration::from_millis(config.tick_ms),
        shutdown,
    );
    service.run()?;

    println!("Goodbye.");
    Ok(())
}

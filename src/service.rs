//! Assistant control loop.
//!
//! Ties the pipeline together: background monitor filling the rolling
//! buffer, a polled wake check, one-shot utterance capture, and the
//! transcribe/classify/dispatch/narrate cycle. The post-capture path lives in
//! [`CommandCycle`], which has no device dependency and is exercised directly
//! by tests with stub transcribers.

use crate::audio::{
    calibrate, CaptureConfig, Recorder, SharedAudioBuffer, SharedThreshold, Utterance,
    DEFAULT_SILENCE_THRESHOLD,
};
use crate::dispatch::{CommandDispatcher, DispatchOutcome};
use crate::error::SttError;
use crate::intent::IntentClassifier;
use crate::narrate::Narrator;
use crate::stt::SpeechToText;
use crate::transcript::TranscriptLog;
use crate::wake::WakeWordDetector;
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Where the loop currently is. Logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Idle,
    WakeListening,
    CommandCapture,
    Dispatching,
    ShuttingDown,
}

impl ServiceState {
    pub fn label(self) -> &'static str {
        match self {
            ServiceState::Idle => "idle",
            ServiceState::WakeListening => "wake_listening",
            ServiceState::CommandCapture => "command_capture",
            ServiceState::Dispatching => "dispatching",
            ServiceState::ShuttingDown => "shutting_down",
        }
    }
}

/// Whether the loop keeps running after a command cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Shutdown,
}

/// The post-capture half of the pipeline: transcribe, log, classify,
/// dispatch, narrate. Owns no audio device.
pub struct CommandCycle {
    stt: Arc<dyn SpeechToText>,
    classifier: IntentClassifier,
    dispatcher: CommandDispatcher,
    narrator: Box<dyn Narrator>,
    transcript: TranscriptLog,
}

impl CommandCycle {
    pub fn new(
        stt: Arc<dyn SpeechToText>,
        dispatcher: CommandDispatcher,
        narrator: Box<dyn Narrator>,
        transcript: TranscriptLog,
    ) -> Self {
        Self {
            stt,
            classifier: IntentClassifier::new(),
            dispatcher,
            narrator,
            transcript,
        }
    }

    /// Speak a line outside the dispatch path (greeting, degraded mode,
    /// shutdown notices).
    pub fn announce(&self, text: &str) {
        self.narrator.say(text);
    }

    /// Run one cycle over a captured utterance. `None` means capture ended
    /// without any speech.
    pub fn process(&self, utterance: Option<Utterance>) -> Flow {
        let Some(utterance) = utterance else {
            self.narrator.say("I did not hear a command");
            return Flow::Continue;
        };

        let text = match self.stt.transcribe(&utterance.samples) {
            Ok(text) => text,
            Err(SttError::Unintelligible) => {
                self.narrator.say("Sorry, I could not make that out");
                return Flow::Continue;
            }
            Err(SttError::Unavailable(err)) => {
                tracing::warn!(%err, "speech service unavailable during command cycle");
                self.narrator.say("Speech recognition is not available right now");
                return Flow::Continue;
            }
        };

        tracing::info!(%text, stop = utterance.stop.label(), "command transcribed");
        let classified = self.classifier.classify(&text);
        if let Err(err) = self.transcript.append(&text, &classified) {
            tracing::warn!(%err, "failed to append transcript entry");
        }

        let outcome = self.dispatcher.dispatch(&classified);
        self.narrator.say(outcome.narration());
        match outcome {
            DispatchOutcome::ExitRequested => Flow::Shutdown,
            _ => Flow::Continue,
        }
    }
}

/// Calibration and recalibration settings.
#[derive(Debug, Clone)]
pub struct CalibrationConfig {
    pub sample_secs: u64,
    pub interval_secs: u64,
    pub multiplier: f32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            sample_secs: 5,
            interval_secs: 60,
            multiplier: 2.0,
        }
    }
}

/// The full assistant loop over real audio hardware.
pub struct ServiceLoop {
    recorder: Recorder,
    device_name: Option<String>,
    buffer: SharedAudioBuffer,
    threshold: SharedThreshold,
    detector: WakeWordDetector,
    cycle: CommandCycle,
    capture: CaptureConfig,
    calibration: CalibrationConfig,
    tick: Duration,
    shutdown: Arc<AtomicBool>,
    recalibrating: Arc<AtomicBool>,
}

impl ServiceLoop {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        recorder: Recorder,
        device_name: Option<String>,
        buffer_samples: usize,
        detector: WakeWordDetector,
        cycle: CommandCycle,
        capture: CaptureConfig,
        calibration: CalibrationConfig,
        tick: Duration,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            recorder,
            device_name,
            buffer: SharedAudioBuffer::new(buffer_samples),
            threshold: SharedThreshold::new(DEFAULT_SILENCE_THRESHOLD),
            detector,
            cycle,
            capture,
            calibration,
            tick,
            shutdown,
            recalibrating: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn threshold(&self) -> &SharedThreshold {
        &self.threshold
    }

    /// Run until the exit command or the shutdown flag.
    pub fn run(&mut self) -> Result<()> {
        self.transition(ServiceState::Idle);
        self.initial_calibration();

        let mut monitor = self
            .recorder
            .start_monitor(self.buffer.clone(), &self.capture)
            .context("failed to start the microphone monitor")?;
        self.transition(ServiceState::WakeListening);
        let mut last_calibration = Instant::now();

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                self.transition(ServiceState::ShuttingDown);
                self.cycle.announce("Shutting down");
                break;
            }

            if last_calibration.elapsed()
                >= Duration::from_secs(self.calibration.interval_secs)
            {
                self.spawn_recalibration();
                last_calibration = Instant::now();
            }

            if self.detector.check(&self.buffer, self.threshold.get()) {
                tracing::info!(phrase = self.detector.phrase(), "wake word detected");
                self.transition(ServiceState::CommandCapture);
                self.cycle.announce("Yes?");

                // Release the device so the capture stream owns it alone.
                drop(monitor);
                let utterance = self
                    .recorder
                    .capture_utterance(&self.capture, self.threshold.get())?;

                self.transition(ServiceState::Dispatching);
                let flow = self.cycle.process(utterance);

                // Stale audio from before the command must not retrigger.
                self.buffer.clear();
                monitor = self
                    .recorder
                    .start_monitor(self.buffer.clone(), &self.capture)
                    .context("failed to restart the microphone monitor")?;

                if flow == Flow::Shutdown {
                    self.transition(ServiceState::ShuttingDown);
                    break;
                }
                self.transition(ServiceState::WakeListening);
            }

            thread::sleep(self.tick);
        }

        let dropped = monitor.dropped_frames();
        drop(monitor);
        if dropped > 0 {
            tracing::debug!(dropped, "monitor dropped frames during the session");
        }
        Ok(())
    }

    fn transition(&self, state: ServiceState) {
        tracing::debug!(state = state.label(), "state transition");
    }

    fn initial_calibration(&self) {
        let duration = Duration::from_secs(self.calibration.sample_secs);
        tracing::info!(secs = self.calibration.sample_secs, "calibrating silence threshold");
        match calibrate(&self.recorder, duration, self.calibration.multiplier) {
            Ok(threshold) => {
                self.threshold.replace(threshold);
            }
            Err(err) => {
                tracing::warn!(%err, "calibration failed, keeping default threshold");
                self.cycle
                    .announce("Audio calibration failed, using the default sensitivity");
            }
        }
    }

    /// Recalibrate on a detached thread with its own device handle so wake
    /// polling never pauses. At most one recalibration is in flight.
    fn spawn_recalibration(&self) {
        if self
            .recalibrating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let in_flight = self.recalibrating.clone();
        let threshold = self.threshold.clone();
        let device_name = self.device_name.clone();
        let duration = Duration::from_secs(self.calibration.sample_secs);
        let multiplier = self.calibration.multiplier;

        let spawned = thread::Builder::new()
            .name("hark-recalibrate".into())
            .spawn(move || {
                let result = Recorder::new(device_name.as_deref())
                    .and_then(|recorder| calibrate(&recorder, duration, multiplier));
                match result {
                    Ok(new_threshold) => {
                        threshold.replace(new_threshold);
                        tracing::debug!(threshold = new_threshold, "threshold recalibrated");
                    }
                    Err(err) => {
                        tracing::debug!(%err, "recalibration failed, keeping current threshold");
                    }
                }
                in_flight.store(false, Ordering::Release);
            });
        if let Err(err) = spawned {
            tracing::warn!(%err, "failed to spawn recalibration thread");
            self.recalibrating.store(false, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::CaptureStop;
    use crate::tasks::TaskExecutor;
    use tempfile::tempdir;

    struct StubStt {
        reply: Result<String, SttError>,
    }

    impl SpeechToText for StubStt {
        fn transcribe(&self, _samples: &[f32]) -> Result<String, SttError> {
            self.reply.clone()
        }
    }

    fn cycle_with(
        root: &std::path::Path,
        reply: Result<String, SttError>,
    ) -> (CommandCycle, std::path::PathBuf) {
        let transcript_path = root.join("transcript.jsonl");
        let cycle = CommandCycle::new(
            Arc::new(StubStt { reply }),
            CommandDispatcher::new(TaskExecutor::rooted_at(root).unwrap()),
            Box::new(crate::narrate::SilentNarrator),
            TranscriptLog::new(transcript_path.clone()),
        );
        (cycle, transcript_path)
    }

    fn utterance() -> Option<Utterance> {
        Some(Utterance {
            samples: vec![0.2; 800],
            stop: CaptureStop::PauseAfterSpeech,
        })
    }

    #[test]
    fn no_speech_continues_listening() {
        let dir = tempdir().unwrap();
        let (cycle, _) = cycle_with(dir.path(), Ok("unused".to_string()));
        assert_eq!(cycle.process(None), Flow::Continue);
    }

    #[test]
    fn unavailable_stt_returns_to_listening() {
        let dir = tempdir().unwrap();
        let (cycle, transcript) = cycle_with(
            dir.path(),
            Err(SttError::Unavailable("connection refused".to_string())),
        );
        assert_eq!(cycle.process(utterance()), Flow::Continue);
        assert!(!transcript.exists());
    }

    #[test]
    fn unintelligible_speech_is_not_fatal() {
        let dir = tempdir().unwrap();
        let (cycle, _) = cycle_with(dir.path(), Err(SttError::Unintelligible));
        assert_eq!(cycle.process(utterance()), Flow::Continue);
    }

    #[test]
    fn exit_command_requests_shutdown() {
        let dir = tempdir().unwrap();
        let (cycle, transcript) = cycle_with(dir.path(), Ok("exit".to_string()));
        assert_eq!(cycle.process(utterance()), Flow::Shutdown);
        assert!(transcript.exists());
    }

    #[test]
    fn create_file_command_runs_end_to_end() {
        let dir = tempdir().unwrap();
        let (cycle, transcript) =
            cycle_with(dir.path(), Ok("create a file named notes.txt".to_string()));
        assert_eq!(cycle.process(utterance()), Flow::Continue);
        assert!(dir.path().join("notes.txt").is_file());
        let logged = std::fs::read_to_string(transcript).unwrap();
        assert!(logged.contains("create_file"));
    }

    #[test]
    fn unknown_command_continues() {
        let dir = tempdir().unwrap();
        let (cycle, _) = cycle_with(dir.path(), Ok("what time is it".to_string()));
        assert_eq!(cycle.process(utterance()), Flow::Continue);
    }

    #[test]
    fn state_labels_are_stable() {
        assert_eq!(ServiceState::WakeListening.label(), "wake_listening");
        assert_eq!(ServiceState::ShuttingDown.label(), "shutting_down");
    }
}

//! Utterance capture state machine: record until sustained speech is
//! followed by a fixed pause, or a hard duration cap is hit.
//!
//! Leading silence is appended to the recording but never advances the stop
//! condition, so a quiet room cannot end a capture before the user speaks.

use super::level::is_silent;
use super::TARGET_RATE;

/// Tunables for one capture attempt.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub sample_rate: u32,
    pub frame_ms: u64,
    /// Silence that must follow speech before capture stops.
    pub pause_ms: u64,
    /// Hard cap on total capture length, pause detected or not.
    pub max_capture_ms: u64,
    pub channel_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: TARGET_RATE,
            frame_ms: 50,
            pause_ms: 1_500,
            max_capture_ms: 10_000,
            channel_capacity: 64,
        }
    }
}

impl CaptureConfig {
    pub fn frame_samples(&self) -> usize {
        ((u64::from(self.sample_rate) * self.frame_ms) / 1000).max(1) as usize
    }
}

/// Why a capture attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStop {
    /// Speech was observed and then a full pause of silence.
    PauseAfterSpeech,
    /// The hard duration cap was reached.
    MaxDuration,
    /// The audio stream went away mid-capture.
    StreamClosed,
}

impl CaptureStop {
    pub fn label(self) -> &'static str {
        match self {
            CaptureStop::PauseAfterSpeech => "pause_after_speech",
            CaptureStop::MaxDuration => "max_duration",
            CaptureStop::StreamClosed => "stream_closed",
        }
    }
}

/// One fully captured spoken segment.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub samples: Vec<f32>,
    pub stop: CaptureStop,
}

/// Tracks speech onset and the trailing-silence run across frames.
///
/// Phases: waiting for speech, then in speech. While waiting, silent frames
/// are ignored for timing; after onset, `ceil(pause_ms / frame_ms)`
/// consecutive silent frames end the capture and any non-silent frame resets
/// the run.
pub struct UtteranceState {
    speech_started: bool,
    silent_run: u64,
    frames_seen: u64,
    max_silent_frames: u64,
    max_frames: u64,
}

impl UtteranceState {
    pub fn new(cfg: &CaptureConfig) -> Self {
        let frame_ms = cfg.frame_ms.max(1);
        Self {
            speech_started: false,
            silent_run: 0,
            frames_seen: 0,
            max_silent_frames: cfg.pause_ms.div_ceil(frame_ms).max(1),
            max_frames: (cfg.max_capture_ms / frame_ms).max(1),
        }
    }

    /// Observe one frame's silence classification; returns a stop reason once
    /// a stop condition is met.
    pub fn observe(&mut self, silent: bool) -> Option<CaptureStop> {
        self.frames_seen += 1;
        if silent {
            if self.speech_started {
                self.silent_run += 1;
                if self.silent_run >= self.max_silent_frames {
                    return Some(CaptureStop::PauseAfterSpeech);
                }
            }
        } else {
            self.speech_started = true;
            self.silent_run = 0;
        }
        if self.frames_seen >= self.max_frames {
            return Some(CaptureStop::MaxDuration);
        }
        None
    }

    pub fn speech_started(&self) -> bool {
        self.speech_started
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
}

/// Run the capture state machine over pre-recorded frames.
///
/// Returns `None` when speech never started before a stop condition; callers
/// treat that as "nothing to process", not an error.
pub fn capture_from_frames<I>(frames: I, threshold: f32, cfg: &CaptureConfig) -> Option<Utterance>
where
    I: IntoIterator<Item = Vec<f32>>,
{
    let mut state = UtteranceState::new(cfg);
    let mut recorded: Vec<Vec<f32>> = Vec::new();
    let mut stop = CaptureStop::MaxDuration;

    for frame in frames {
        let silent = is_silent(&frame, threshold);
        recorded.push(frame);
        if let Some(reason) = state.observe(silent) {
            stop = reason;
            break;
        }
    }

    if !state.speech_started() {
        return None;
    }

    let total: usize = recorded.iter().map(Vec::len).sum();
    let mut samples = Vec::with_capacity(total);
    for frame in recorded {
        samples.extend(frame);
    }
    Some(Utterance { samples, stop })
}

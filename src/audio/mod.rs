//! Audio capture pipeline: rolling buffer, silence threshold, and
//! speech-then-pause utterance capture.
//!
//! Audio is captured via CPAL, downmixed to mono, resampled to 16kHz
//! (Whisper's expected format), and classified frame-by-frame against a
//! dynamically calibrated silence threshold.

/// Target sample rate for Whisper STT.
pub const TARGET_RATE: u32 = 16_000;

mod buffer;
mod calibrate;
mod capture;
mod chunk;
mod level;
mod recorder;
mod resample;
#[cfg(test)]
mod tests;

pub use buffer::{RollingBuffer, SharedAudioBuffer};
pub use calibrate::{calibrate, threshold_from_ambient};
pub use capture::{capture_from_frames, CaptureConfig, CaptureStop, Utterance, UtteranceState};
pub use level::{is_silent, mean_abs_amplitude, SharedThreshold, DEFAULT_SILENCE_THRESHOLD};
pub use recorder::{MonitorStream, Recorder};

//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use clap::Parser;
use std::path::PathBuf;

pub use defaults::{
    DEFAULT_BUFFER_MS, DEFAULT_CALIBRATION_INTERVAL_SECS, DEFAULT_CALIBRATION_SECS,
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_FRAME_MS, DEFAULT_MAX_CAPTURE_MS, DEFAULT_PAUSE_MS,
    DEFAULT_THRESHOLD_MULTIPLIER, DEFAULT_TICK_MS, DEFAULT_WAKE_WORD,
};

/// CLI options for the hark voice assistant. Validated values keep the audio
/// pipeline and spawned subprocesses safe.
#[derive(Debug, Parser, Clone)]
#[command(about = "Voice-activated desktop assistant", author, version)]
pub struct AppConfig {
    /// Wake word or phrase that activates command capture
    #[arg(long = "wake-word", default_value = DEFAULT_WAKE_WORD)]
    pub wake_word: String,

    /// Preferred audio input device name
    #[arg(long)]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Path to the ggml Whisper model file
    #[arg(long = "model-path", env = "HARK_MODEL_PATH")]
    pub model_path: Option<String>,

    /// Transcription language (ISO-639-1 code or 'auto')
    #[arg(long, default_value = "en")]
    pub lang: String,

    /// Analysis frame length in milliseconds
    #[arg(long = "frame-ms", default_value_t = DEFAULT_FRAME_MS)]
    pub frame_ms: u64,

    /// Silence run that ends a command capture (milliseconds)
    #[arg(long = "pause-ms", default_value_t = DEFAULT_PAUSE_MS)]
    pub pause_ms: u64,

    /// Hard cap on a single command capture (milliseconds)
    #[arg(long = "max-capture-ms", default_value_t = DEFAULT_MAX_CAPTURE_MS)]
    pub max_capture_ms: u64,

    /// Rolling wake buffer length (milliseconds)
    #[arg(long = "buffer-ms", default_value_t = DEFAULT_BUFFER_MS)]
    pub buffer_ms: u64,

    /// Wake polling interval (milliseconds)
    #[arg(long = "tick-ms", default_value_t = DEFAULT_TICK_MS)]
    pub tick_ms: u64,

    /// Ambient sample length for threshold calibration (seconds)
    #[arg(long = "calibration-secs", default_value_t = DEFAULT_CALIBRATION_SECS)]
    pub calibration_secs: u64,

    /// Interval between background recalibrations (seconds)
    #[arg(long = "calibration-interval-secs", default_value_t = DEFAULT_CALIBRATION_INTERVAL_SECS)]
    pub calibration_interval_secs: u64,

    /// Silence threshold as a multiple of the ambient mean amplitude
    #[arg(long = "threshold-multiplier", default_value_t = DEFAULT_THRESHOLD_MULTIPLIER)]
    pub threshold_multiplier: f32,

    /// Bounded audio channel capacity (frames)
    #[arg(long = "channel-capacity", default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,

    /// Directory for downloaded files (defaults to the OS download folder)
    #[arg(long = "download-dir")]
    pub download_dir: Option<PathBuf>,

    /// Transcript log location (defaults to the OS data directory)
    #[arg(long = "transcript-log")]
    pub transcript_log: Option<PathBuf>,

    /// Print confirmations instead of speaking them
    #[arg(long, default_value_t = false)]
    pub quiet: bool,

    /// Enable logging to stderr
    #[arg(long, env = "HARK_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Route logs to a JSON trace file instead of stderr
    #[arg(long = "log-json", env = "HARK_LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

impl AppConfig {
    /// Snapshot the capture-related settings for the audio layer.
    pub fn capture_config(&self) -> crate::audio::CaptureConfig {
        crate::audio::CaptureConfig {
            sample_rate: crate::audio::TARGET_RATE,
            frame_ms: self.frame_ms,
            pause_ms: self.pause_ms,
            max_capture_ms: self.max_capture_ms,
            channel_capacity: self.channel_capacity,
        }
    }

    /// Rolling buffer capacity in samples at the pipeline rate.
    pub fn buffer_samples(&self) -> usize {
        ((u64::from(crate::audio::TARGET_RATE) * self.buffer_ms) / 1000).max(1) as usize
    }
}

//! Microphone access via CPAL.
//!
//! Owns device selection and stream construction, normalizing every
//! supported sample format to mono f32 at the pipeline rate. Three capture
//! modes: a bounded one-shot recording for calibration, a continuous
//! background monitor feeding the rolling buffer, and a blocking utterance
//! capture that runs the speech-then-pause state machine.

use super::buffer::SharedAudioBuffer;
use super::capture::{CaptureConfig, CaptureStop, Utterance, UtteranceState};
use super::chunk::FrameChunker;
use super::level::is_silent;
use super::resample::{convert_frame_to_target, resample_to_target_rate};
use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Frame length used for the calibration recording path, where the exact
/// cadence does not matter.
const RECORD_FRAME_MS: u64 = 100;

/// Audio input device wrapper.
pub struct Recorder {
    device: cpal::Device,
}

impl Recorder {
    /// List microphone names so the CLI can expose a selector.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("no input devices available")?;
        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Create a recorder, optionally forcing a specific device so users can
    /// pick the right microphone when the machine exposes several inputs.
    pub fn new(preferred_device: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = match preferred_device {
            Some(name) => {
                let mut devices = host.input_devices().context("no input devices available")?;
                devices
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| anyhow!("input device '{name}' not found"))?
            }
            None => host
                .default_input_device()
                .context("no default input device available")?,
        };
        Ok(Self { device })
    }

    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string())
    }

    /// Record for `duration` on a dedicated stream and return 16 kHz mono
    /// samples. Used by threshold calibration.
    pub fn record_for(&self, duration: Duration) -> Result<Vec<f32>> {
        let opened = self.open_chunked_stream(RECORD_FRAME_MS, 64)?;
        opened.stream.play()?;

        let deadline = Instant::now() + duration;
        let mut samples: Vec<f32> = Vec::new();
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match opened.receiver.recv_timeout(deadline - now) {
                Ok(frame) => samples.extend(frame),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        if let Err(err) = opened.stream.pause() {
            tracing::debug!(%err, "failed to pause calibration stream");
        }
        drop(opened.stream);

        if samples.is_empty() {
            return Err(anyhow!(
                "no samples captured from '{}'; check microphone permissions and availability. {}",
                self.device_name(),
                mic_permission_hint()
            ));
        }

        Ok(resample_to_target_rate(&samples, opened.device_rate))
    }

    /// Start the continuous background monitor: CPAL callback chunks device
    /// frames into a bounded channel, a drain thread converts them to the
    /// target rate and appends to the shared rolling buffer.
    ///
    /// The returned handle owns both the stream and the drain thread; drop it
    /// to stop monitoring.
    pub fn start_monitor(
        &self,
        buffer: SharedAudioBuffer,
        cfg: &CaptureConfig,
    ) -> Result<MonitorStream> {
        let frame_ms = cfg.frame_ms.clamp(5, 120);
        let opened = self.open_chunked_stream(frame_ms, cfg.channel_capacity)?;
        let device_rate = opened.device_rate;
        let target_frame_samples = cfg.frame_samples();
        let target_rate = cfg.sample_rate;
        let receiver = opened.receiver;

        let drain = thread::Builder::new()
            .name("hark-monitor".into())
            .spawn(move || {
                while let Ok(device_frame) = receiver.recv() {
                    let frame = convert_frame_to_target(
                        device_frame,
                        device_rate,
                        target_rate,
                        target_frame_samples,
                    );
                    if !frame.is_empty() {
                        buffer.try_append(frame);
                    }
                }
            })
            .context("failed to spawn monitor thread")?;

        opened.stream.play()?;
        tracing::info!(
            device = %self.device_name(),
            device_rate,
            frame_ms,
            "continuous monitor stream started"
        );

        Ok(MonitorStream {
            stream: Some(opened.stream),
            drain: Some(drain),
            dropped: opened.dropped,
        })
    }

    /// Record one utterance on a dedicated stream, stopping on a sustained
    /// pause after speech or the hard duration cap.
    ///
    /// Returns `Ok(None)` when no speech was observed before a stop
    /// condition.
    pub fn capture_utterance(
        &self,
        cfg: &CaptureConfig,
        threshold: f32,
    ) -> Result<Option<Utterance>> {
        let frame_ms = cfg.frame_ms.clamp(5, 120);
        let opened = self.open_chunked_stream(frame_ms, cfg.channel_capacity)?;
        let device_rate = opened.device_rate;
        let target_frame_samples = cfg.frame_samples();
        opened.stream.play()?;

        let started = Instant::now();
        let hard_cap = Duration::from_millis(cfg.max_capture_ms);
        let wait = Duration::from_millis(frame_ms);
        let mut state = UtteranceState::new(cfg);
        let mut recorded: Vec<Vec<f32>> = Vec::new();
        let mut stop = CaptureStop::MaxDuration;

        loop {
            if started.elapsed() >= hard_cap {
                break;
            }
            match opened.receiver.recv_timeout(wait) {
                Ok(device_frame) => {
                    let frame = convert_frame_to_target(
                        device_frame,
                        device_rate,
                        cfg.sample_rate,
                        target_frame_samples,
                    );
                    if frame.is_empty() {
                        continue;
                    }
                    let silent = is_silent(&frame, threshold);
                    recorded.push(frame);
                    if let Some(reason) = state.observe(silent) {
                        stop = reason;
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    stop = CaptureStop::StreamClosed;
                    break;
                }
            }
        }

        if let Err(err) = opened.stream.pause() {
            tracing::debug!(%err, "failed to pause capture stream");
        }
        drop(opened.stream);

        tracing::debug!(
            frames = state.frames_seen(),
            speech_started = state.speech_started(),
            dropped = opened.dropped.load(Ordering::Relaxed),
            stop = stop.label(),
            "utterance capture finished"
        );

        if !state.speech_started() {
            return Ok(None);
        }

        let total: usize = recorded.iter().map(Vec::len).sum();
        let mut samples = Vec::with_capacity(total);
        for frame in recorded {
            samples.extend(frame);
        }
        Ok(Some(Utterance { samples, stop }))
    }

    /// Build an input stream that delivers fixed-size device-rate mono frames
    /// over a bounded channel.
    fn open_chunked_stream(&self, frame_ms: u64, channel_capacity: usize) -> Result<OpenedStream> {
        let default_config = self
            .device
            .default_input_config()
            .context("failed to query default input config")?;
        let format = default_config.sample_format();
        let device_config: StreamConfig = default_config.into();
        let device_rate = device_config.sample_rate.0;
        let channels = usize::from(device_config.channels.max(1));
        let device_frame_samples = ((u64::from(device_rate) * frame_ms) / 1000).max(1) as usize;

        let (sender, receiver) = bounded::<Vec<f32>>(channel_capacity.max(1));
        let dropped = Arc::new(AtomicUsize::new(0));
        let chunker = Arc::new(Mutex::new(FrameChunker::new(
            device_frame_samples,
            sender,
            dropped.clone(),
        )));

        let err_fn = |err| tracing::debug!(%err, "audio stream error");
        let stream = match format {
            SampleFormat::F32 => {
                let chunker = chunker.clone();
                let dropped = dropped.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[f32], _| {
                        if let Ok(mut pump) = chunker.try_lock() {
                            pump.push(data, channels, |sample| sample);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::I16 => {
                let chunker = chunker.clone();
                let dropped = dropped.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[i16], _| {
                        if let Ok(mut pump) = chunker.try_lock() {
                            pump.push(data, channels, |sample| sample as f32 / 32_768.0);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::U16 => {
                let chunker = chunker.clone();
                let dropped = dropped.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[u16], _| {
                        if let Ok(mut pump) = chunker.try_lock() {
                            pump.push(data, channels, |sample| {
                                (sample as f32 - 32_768.0) / 32_768.0
                            });
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            other => return Err(anyhow!("unsupported sample format: {other:?}")),
        };

        Ok(OpenedStream {
            stream,
            receiver,
            device_rate,
            dropped,
        })
    }
}

struct OpenedStream {
    stream: cpal::Stream,
    receiver: Receiver<Vec<f32>>,
    device_rate: u32,
    dropped: Arc<AtomicUsize>,
}

/// Handle over the continuous monitor stream and its drain thread. Dropping
/// it pauses the stream, releases the device, and joins the thread.
pub struct MonitorStream {
    stream: Option<cpal::Stream>,
    drain: Option<thread::JoinHandle<()>>,
    dropped: Arc<AtomicUsize>,
}

impl MonitorStream {
    /// Frames the callback path had to drop (channel full or buffer busy).
    pub fn dropped_frames(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for MonitorStream {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                tracing::debug!(%err, "failed to pause monitor stream");
            }
            // Dropping the stream drops the sender, which lets the drain
            // thread run to completion.
            drop(stream);
        }
        if let Some(handle) = self.drain.take() {
            let _ = handle.join();
        }
    }
}

fn mic_permission_hint() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "macOS: System Settings > Privacy & Security > Microphone (enable your terminal)."
    }
    #[cfg(target_os = "linux")]
    {
        "Linux: check PipeWire/PulseAudio permissions and ensure the device is not muted."
    }
    #[cfg(target_os = "windows")]
    {
        "Windows: Settings > Privacy & Security > Microphone (allow access for your terminal)."
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        "Check OS microphone permissions."
    }
}

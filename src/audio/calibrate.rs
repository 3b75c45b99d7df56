//! Ambient noise calibration for the silence threshold.
//!
//! Samples a few seconds from a dedicated capture stream and derives the
//! threshold as a multiple of the mean ambient amplitude. Runs at startup and
//! periodically from a background thread so wake-word polling never pauses.

use super::level::mean_abs_amplitude;
use super::recorder::Recorder;
use anyhow::{bail, Result};
use std::time::Duration;

const MIN_THRESHOLD: f32 = 1.0e-6;

/// Threshold derived from an ambient sample: `mean * multiplier`, floored to
/// stay positive when the room is digitally silent.
pub fn threshold_from_ambient(samples: &[f32], multiplier: f32) -> Option<f32> {
    if samples.is_empty() {
        return None;
    }
    Some((mean_abs_amplitude(samples) * multiplier).max(MIN_THRESHOLD))
}

/// Capture `duration` of ambient audio on a dedicated stream and compute the
/// silence threshold from it.
///
/// Failure here is not fatal: the caller falls back to the default threshold
/// and keeps the service running in degraded mode.
pub fn calibrate(recorder: &Recorder, duration: Duration, multiplier: f32) -> Result<f32> {
    let samples = recorder.record_for(duration)?;
    match threshold_from_ambient(&samples, multiplier) {
        Some(threshold) => {
            tracing::info!(
                threshold,
                sampled_ms = duration.as_millis() as u64,
                "silence threshold calibrated"
            );
            Ok(threshold)
        }
        None => bail!("calibration captured no samples"),
    }
}

//! Amplitude measurement and the shared silence threshold.
//!
//! Frames are classified silent/non-silent by comparing their mean absolute
//! amplitude against a threshold calibrated from ambient noise. The threshold
//! is stored as f32 bits in an atomic so recalibration replaces it without
//! readers ever observing a partial value.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Fallback threshold when calibration fails, matching a mean amplitude of
/// 300 on a 16-bit sample scale.
pub const DEFAULT_SILENCE_THRESHOLD: f32 = 300.0 / 32_768.0;

/// Mean absolute amplitude of a frame. Empty frames measure 0.0.
pub fn mean_abs_amplitude(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32
}

/// A frame is non-silent only when its mean amplitude strictly exceeds the
/// threshold; amplitude exactly equal to the threshold counts as silent.
pub fn is_silent(samples: &[f32], threshold: f32) -> bool {
    mean_abs_amplitude(samples) <= threshold
}

/// Silence threshold shared between the control loop and the recalibration
/// thread. Replaced atomically, never mutated in place.
#[derive(Clone, Debug)]
pub struct SharedThreshold {
    bits: Arc<AtomicU32>,
}

impl SharedThreshold {
    pub fn new(initial: f32) -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(initial.to_bits())),
        }
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn replace(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Default for SharedThreshold {
    fn default() -> Self {
        Self::new(DEFAULT_SILENCE_THRESHOLD)
    }
}

//! Rolling window of recent audio frames.
//!
//! The continuous monitor stream appends into this buffer while the control
//! loop reads it for wake-word checks. Readers take copies under a short
//! lock; the writer side uses `try_lock` so the audio path never blocks, and
//! counts the frames it had to drop instead.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Sample-count bounded FIFO of audio frames. Oldest frames are evicted
/// first once the capacity is exceeded.
pub struct RollingBuffer {
    frames: VecDeque<Vec<f32>>,
    total_samples: usize,
    max_samples: usize,
}

impl RollingBuffer {
    pub fn new(max_samples: usize) -> Self {
        Self {
            frames: VecDeque::new(),
            total_samples: 0,
            max_samples: max_samples.max(1),
        }
    }

    pub fn push(&mut self, frame: Vec<f32>) {
        self.total_samples = self.total_samples.saturating_add(frame.len());
        self.frames.push_back(frame);
        while self.total_samples > self.max_samples {
            match self.frames.pop_front() {
                Some(evicted) => {
                    self.total_samples = self.total_samples.saturating_sub(evicted.len());
                }
                None => break,
            }
        }
    }

    pub fn latest(&self) -> Option<&[f32]> {
        self.frames.back().map(Vec::as_slice)
    }

    /// Concatenate all buffered frames in arrival order.
    pub fn join(&self) -> Vec<f32> {
        let mut joined = Vec::with_capacity(self.total_samples);
        for frame in &self.frames {
            joined.extend_from_slice(frame);
        }
        joined
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.total_samples = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.total_samples == 0
    }

    pub fn total_samples(&self) -> usize {
        self.total_samples
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Thread-safe handle over a [`RollingBuffer`], shared between the monitor
/// thread (writer) and the control loop (reader).
#[derive(Clone)]
pub struct SharedAudioBuffer {
    inner: Arc<Mutex<RollingBuffer>>,
    dropped: Arc<AtomicUsize>,
}

impl SharedAudioBuffer {
    pub fn new(max_samples: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RollingBuffer::new(max_samples))),
            dropped: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Non-blocking append. On lock contention the frame is dropped and
    /// counted rather than stalling the audio path.
    pub fn try_append(&self, frame: Vec<f32>) {
        match self.inner.try_lock() {
            Ok(mut buffer) => buffer.push(frame),
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Copy of the most recent frame, for the cheap silence pre-check.
    pub fn latest_frame(&self) -> Option<Vec<f32>> {
        let buffer = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        buffer.latest().map(<[f32]>::to_vec)
    }

    /// Consistent joined copy of the whole window.
    pub fn snapshot_joined(&self) -> Vec<f32> {
        let buffer = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        buffer.join()
    }

    pub fn clear(&self) {
        let mut buffer = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        buffer.clear();
    }

    pub fn is_empty(&self) -> bool {
        let buffer = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        buffer.is_empty()
    }

    pub fn dropped_frames(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

//! Wake-word detection over the rolling audio buffer.
//!
//! Steady-state cost is dominated by the amplitude pre-check on the newest
//! frame; the full buffer is joined and sent to the speech service only when
//! energy is present. Transcription is expensive, so the pre-check is the
//! admission-control mechanism for the whole idle loop.

use crate::audio::{is_silent, SharedAudioBuffer};
use crate::error::SttError;
use crate::stt::SpeechToText;
use std::sync::Arc;

pub struct WakeWordDetector {
    phrase: String,
    stt: Arc<dyn SpeechToText>,
}

impl WakeWordDetector {
    pub fn new(phrase: &str, stt: Arc<dyn SpeechToText>) -> Self {
        Self {
            phrase: normalize(phrase),
            stt,
        }
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Check whether the buffered audio ends in the wake phrase.
    ///
    /// Recognition failures are never fatal here; both failure kinds map to
    /// "not detected" and the loop keeps polling.
    pub fn check(&self, buffer: &SharedAudioBuffer, threshold: f32) -> bool {
        let Some(latest) = buffer.latest_frame() else {
            return false;
        };
        if is_silent(&latest, threshold) {
            return false;
        }

        let joined = buffer.snapshot_joined();
        if joined.is_empty() {
            return false;
        }

        match self.stt.transcribe(&joined) {
            Ok(text) => {
                let heard = normalize(&text);
                tracing::debug!(%heard, "wake check transcription");
                heard == self.phrase
            }
            Err(SttError::Unintelligible) => {
                tracing::debug!("wake check: no speech understood");
                false
            }
            Err(SttError::Unavailable(err)) => {
                tracing::warn!(%err, "wake check: speech service unavailable");
                false
            }
        }
    }
}

/// Lowercase, drop punctuation, collapse whitespace. Whisper decorates
/// output with case and punctuation that must not defeat an exact match.
fn normalize(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubStt {
        reply: Result<String, fn() -> SttError>,
        calls: AtomicUsize,
    }

    impl StubStt {
        fn text(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(err: fn() -> SttError) -> Self {
            Self {
                reply: Err(err),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    impl SpeechToText for StubStt {
        fn transcribe(&self, _samples: &[f32]) -> Result<String, SttError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn loud_buffer() -> SharedAudioBuffer {
        let buffer = SharedAudioBuffer::new(1_024);
        buffer.try_append(vec![0.8; 64]);
        buffer
    }

    #[test]
    fn silent_latest_frame_skips_transcription() {
        let stt = Arc::new(StubStt::text("hark"));
        let detector = WakeWordDetector::new("hark", stt.clone());
        let buffer = SharedAudioBuffer::new(1_024);
        buffer.try_append(vec![0.001; 64]);
        assert!(!detector.check(&buffer, 0.01));
        assert_eq!(stt.calls(), 0);
    }

    #[test]
    fn empty_buffer_is_never_a_wake() {
        let stt = Arc::new(StubStt::text("hark"));
        let detector = WakeWordDetector::new("hark", stt.clone());
        let buffer = SharedAudioBuffer::new(1_024);
        assert!(!detector.check(&buffer, 0.01));
        assert_eq!(stt.calls(), 0);
    }

    #[test]
    fn matches_wake_phrase_despite_punctuation_and_case() {
        let stt = Arc::new(StubStt::text("  Hark!  "));
        let detector = WakeWordDetector::new("hark", stt.clone());
        assert!(detector.check(&loud_buffer(), 0.01));
        assert_eq!(stt.calls(), 1);
    }

    #[test]
    fn other_speech_is_not_a_wake() {
        let stt = Arc::new(StubStt::text("hello there"));
        let detector = WakeWordDetector::new("hark", stt);
        assert!(!detector.check(&loud_buffer(), 0.01));
    }

    #[test]
    fn unintelligible_audio_is_not_detected() {
        let stt = Arc::new(StubStt::failing(|| SttError::Unintelligible));
        let detector = WakeWordDetector::new("hark", stt);
        assert!(!detector.check(&loud_buffer(), 0.01));
    }

    #[test]
    fn service_outage_is_not_fatal() {
        let stt = Arc::new(StubStt::failing(|| {
            SttError::Unavailable("connection refused".to_string())
        }));
        let detector = WakeWordDetector::new("hark", stt);
        assert!(!detector.check(&loud_buffer(), 0.01));
    }

    #[test]
    fn multi_word_phrases_normalize() {
        let stt = Arc::new(StubStt::text("Hey, Hark."));
        let detector = WakeWordDetector::new("hey hark", stt);
        assert!(detector.check(&loud_buffer(), 0.01));
    }
}

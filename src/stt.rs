//! Whisper speech-to-text integration.
//!
//! Wraps `whisper_rs` behind the [`SpeechToText`] trait so the wake detector
//! and the command cycle can be exercised with stubs. The model is loaded
//! once at startup and reused for every transcription.

use crate::error::SttError;
use regex::Regex;
use std::sync::OnceLock;

/// Boundary to the external transcription service.
///
/// Implementations take 16 kHz mono PCM and return text, or one of the two
/// recoverable failure kinds. Call sites must survive both without ending
/// the listening loop.
pub trait SpeechToText: Send + Sync {
    fn transcribe(&self, samples: &[f32]) -> Result<String, SttError>;
}

/// Strip non-speech markers Whisper emits for silence, noise, music and the
/// like, then collapse whitespace.
pub fn sanitize_transcript(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    static NON_SPEECH_RE: OnceLock<Regex> = OnceLock::new();
    let re = NON_SPEECH_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\[\s*\]|\(\s*\)|\[(?:\s*(?:silence|noise|inaudible|blank_audio|blank audio|music|laughter|applause|cough|breath(?:ing)?|wind|background)\s*)\]|\((?:\s*(?:silence|noise|inaudible|blank audio|music|laughter|applause|cough|breath(?:ing)?|wind|background|wind blowing)\s*)\)",
        )
        .expect("non-speech regex should compile")
    });
    let without_markers = re.replace_all(trimmed, " ");
    without_markers
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(unix)]
mod platform {
    use super::sanitize_transcript;
    use super::SpeechToText;
    use crate::error::SttError;
    use anyhow::{anyhow, Context, Result};
    use std::io;
    use std::os::raw::{c_char, c_uint, c_void};
    use std::os::unix::io::AsRawFd;
    use std::sync::Once;
    use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

    /// Whisper model context. Create once and reuse; loading the GGML model
    /// is by far the most expensive step.
    pub struct WhisperTranscriber {
        ctx: WhisperContext,
        lang: String,
    }

    impl WhisperTranscriber {
        /// Loads the Whisper model from disk.
        ///
        /// Redirects stderr to `/dev/null` while loading because whisper.cpp
        /// emits verbose initialization messages.
        pub fn new(model_path: &str, lang: &str) -> Result<Self> {
            install_whisper_log_silencer();

            let null = std::fs::OpenOptions::new()
                .write(true)
                .open("/dev/null")
                .context("failed to open /dev/null")?;
            let null_fd = null.as_raw_fd();

            // SAFETY: dup(2) duplicates the stderr descriptor; we restore it
            // before returning on every path.
            let orig_stderr = unsafe { libc::dup(2) };
            if orig_stderr < 0 {
                return Err(anyhow!(
                    "failed to dup stderr: {}",
                    io::Error::last_os_error()
                ));
            }
            let redirected = unsafe { libc::dup2(null_fd, 2) };
            if redirected < 0 {
                unsafe {
                    libc::close(orig_stderr);
                }
                return Err(anyhow!(
                    "failed to redirect stderr: {}",
                    io::Error::last_os_error()
                ));
            }

            let ctx_result =
                WhisperContext::new_with_params(model_path, WhisperContextParameters::default());

            let restored = unsafe { libc::dup2(orig_stderr, 2) };
            unsafe {
                libc::close(orig_stderr);
            }
            if restored < 0 {
                return Err(anyhow!(
                    "failed to restore stderr: {}",
                    io::Error::last_os_error()
                ));
            }

            let ctx = ctx_result.context("failed to load whisper model")?;
            Ok(Self {
                ctx,
                lang: lang.to_string(),
            })
        }

        fn run(&self, samples: &[f32]) -> Result<String, SttError> {
            let mut state = self
                .ctx
                .create_state()
                .map_err(|err| SttError::Unavailable(format!("whisper state: {err}")))?;

            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
            if self.lang.eq_ignore_ascii_case("auto") {
                params.set_language(None);
                params.set_detect_language(true);
            } else {
                params.set_language(Some(&self.lang));
                params.set_detect_language(false);
            }
            // Cap thread count so laptops don't max out all cores.
            params.set_n_threads(num_cpus::get().min(8) as i32);
            params.set_print_progress(false);
            params.set_print_timestamps(false);
            params.set_print_special(false);
            params.set_print_realtime(false);
            params.set_translate(false);
            params.set_token_timestamps(false);

            state
                .full(params, samples)
                .map_err(|err| SttError::Unavailable(format!("whisper inference: {err}")))?;

            let num_segments = state
                .full_n_segments()
                .map_err(|err| SttError::Unavailable(format!("whisper segments: {err}")))?;
            if num_segments <= 0 {
                return Err(SttError::Unintelligible);
            }

            // Whisper splits output into small segments; stitch them together.
            let mut transcript = String::new();
            for i in 0..num_segments {
                match state.full_get_segment_text_lossy(i) {
                    Ok(text) => transcript.push_str(&text),
                    Err(err) => tracing::debug!(segment = i, %err, "failed to read segment"),
                }
            }

            let cleaned = sanitize_transcript(&transcript);
            if cleaned.is_empty() {
                return Err(SttError::Unintelligible);
            }
            Ok(cleaned)
        }
    }

    impl SpeechToText for WhisperTranscriber {
        fn transcribe(&self, samples: &[f32]) -> Result<String, SttError> {
            self.run(samples)
        }
    }

    fn install_whisper_log_silencer() {
        static INSTALL_LOG_CALLBACK: Once = Once::new();
        INSTALL_LOG_CALLBACK.call_once(|| unsafe {
            whisper_rs::set_log_callback(Some(whisper_log_callback), std::ptr::null_mut());
        });
    }

    #[allow(unused_variables)]
    unsafe extern "C" fn whisper_log_callback(
        _level: c_uint,
        _text: *const c_char,
        _user_data: *mut c_void,
    ) {
        // Silence the default whisper.cpp logger.
    }
}

#[cfg(unix)]
pub use platform::WhisperTranscriber;

#[cfg(not(unix))]
mod platform {
    use super::SpeechToText;
    use crate::error::SttError;
    use anyhow::{anyhow, Result};

    /// Stub for targets without whisper.cpp support.
    pub struct WhisperTranscriber;

    impl WhisperTranscriber {
        pub fn new(_: &str, _: &str) -> Result<Self> {
            Err(anyhow!(
                "Whisper transcription is currently supported only on Unix-like platforms"
            ))
        }
    }

    impl SpeechToText for WhisperTranscriber {
        fn transcribe(&self, _: &[f32]) -> Result<String, SttError> {
            Err(SttError::Unavailable("unsupported platform".to_string()))
        }
    }
}

#[cfg(not(unix))]
pub use platform::WhisperTranscriber;

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn transcriber_rejects_missing_model() {
        assert!(WhisperTranscriber::new("/no/such/model.bin", "en").is_err());
    }

    #[test]
    fn sanitize_strips_non_speech_markers() {
        assert_eq!(sanitize_transcript("[silence] hello (noise) there"), "hello there");
        assert_eq!(sanitize_transcript("  [BLANK_AUDIO]  "), "");
        assert_eq!(sanitize_transcript("open the   browser"), "open the browser");
    }
}

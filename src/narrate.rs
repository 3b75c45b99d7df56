//! Spoken feedback.
//!
//! The assistant answers out loud through whatever speech engine the OS
//! provides. Narration is best-effort: a missing or failing engine downgrades
//! to a log line and the pipeline keeps going.

use crate::platform;
use std::process::{Command, Stdio};

pub trait Narrator: Send {
    fn say(&self, text: &str);
}

/// Prints the line, then speaks it through the OS text-to-speech command,
/// blocking until the sentence finishes so confirmations don't overlap the
/// next capture.
pub struct SpokenNarrator;

impl Narrator for SpokenNarrator {
    fn say(&self, text: &str) {
        println!("{text}");
        let Some(argv) = platform::tts_command(text) else {
            tracing::debug!(%text, "no speech engine available, narration printed only");
            return;
        };
        let result = Command::new(&argv[0])
            .args(&argv[1..])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match result {
            Ok(status) if status.success() => {}
            Ok(status) => tracing::debug!(%text, %status, "speech engine exited nonzero"),
            Err(err) => tracing::debug!(%text, %err, "speech engine failed to start"),
        }
    }
}

/// Logs instead of speaking. Used by `--quiet` and by tests.
pub struct SilentNarrator;

impl Narrator for SilentNarrator {
    fn say(&self, text: &str) {
        tracing::info!(%text, "narration");
    }
}

use super::defaults::{ISO_639_1_CODES, MAX_BUFFER_MS, MAX_CAPTURE_HARD_LIMIT_MS};
use super::AppConfig;
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::path::Path;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize paths.
    pub fn validate(&mut self) -> Result<()> {
        if self.wake_word.trim().is_empty() {
            bail!("--wake-word must not be empty");
        }
        if !self
            .wake_word
            .chars()
            .all(|ch| ch.is_alphanumeric() || ch.is_whitespace())
        {
            bail!("--wake-word must contain only letters, digits, and spaces");
        }

        if !(5..=120).contains(&self.frame_ms) {
            bail!("--frame-ms must be between 5 and 120, got {}", self.frame_ms);
        }
        if self.max_capture_ms == 0 || self.max_capture_ms > MAX_CAPTURE_HARD_LIMIT_MS {
            bail!(
                "--max-capture-ms must be between 1 and {MAX_CAPTURE_HARD_LIMIT_MS} ms, got {}",
                self.max_capture_ms
            );
        }
        if self.pause_ms < 200 || self.pause_ms > self.max_capture_ms {
            bail!(
                "--pause-ms must be >=200 and <= --max-capture-ms ({})",
                self.max_capture_ms
            );
        }
        if self.buffer_ms < self.max_capture_ms || self.buffer_ms > MAX_BUFFER_MS {
            bail!(
                "--buffer-ms must be between {} and {MAX_BUFFER_MS} (ms)",
                self.max_capture_ms
            );
        }
        if !(10..=2_000).contains(&self.tick_ms) {
            bail!("--tick-ms must be between 10 and 2000, got {}", self.tick_ms);
        }
        if !(1..=60).contains(&self.calibration_secs) {
            bail!(
                "--calibration-secs must be between 1 and 60, got {}",
                self.calibration_secs
            );
        }
        if self.calibration_interval_secs < self.calibration_secs {
            bail!(
                "--calibration-interval-secs must be at least --calibration-secs ({})",
                self.calibration_secs
            );
        }
        if !(1.0..=100.0).contains(&self.threshold_multiplier) {
            bail!(
                "--threshold-multiplier must be between 1.0 and 100.0, got {}",
                self.threshold_multiplier
            );
        }
        if !(8..=1024).contains(&self.channel_capacity) {
            bail!(
                "--channel-capacity must be between 8 and 1024, got {}",
                self.channel_capacity
            );
        }

        if self.model_path.is_none() && !self.list_input_devices {
            bail!("--model-path is required (or set HARK_MODEL_PATH)");
        }
        if let Some(model) = &mut self.model_path {
            let model_path = Path::new(model);
            if !model_path.exists() {
                bail!("model path '{}' does not exist", model_path.display());
            }
            // Store a canonical absolute path.
            let canonical = model_path
                .canonicalize()
                .with_context(|| format!("failed to canonicalize model path '{model}'"))?;
            *model = canonical
                .to_str()
                .map(|s| s.to_string())
                .ok_or_else(|| anyhow!("model path must be valid UTF-8"))?;
        }

        if self.lang.trim().is_empty() {
            bail!("--lang must not be empty");
        }
        if !self.lang.eq_ignore_ascii_case("auto") {
            if !self
                .lang
                .chars()
                .all(|ch| ch.is_ascii_alphabetic() || ch == '-' || ch == '_')
            {
                bail!("--lang must contain only alphabetic characters or '-'/'_' separators");
            }
            // Allow locale-style values but only check the leading ISO-639-1 code.
            let lang_primary = self
                .lang
                .split(['-', '_'])
                .next()
                .unwrap_or("")
                .to_ascii_lowercase();
            if !ISO_639_1_CODES.contains(&lang_primary.as_str()) {
                bail!(
                    "--lang must start with a valid ISO-639-1 code or be 'auto', got '{}'",
                    self.lang
                );
            }
        }

        if let Some(dir) = &self.download_dir {
            if dir.as_os_str().is_empty() {
                bail!("--download-dir must not be empty");
            }
        }

        Ok(())
    }
}

use super::buffer::{RollingBuffer, SharedAudioBuffer};
use super::calibrate::threshold_from_ambient;
use super::capture::{capture_from_frames, CaptureConfig, CaptureStop, UtteranceState};
use super::chunk::{append_downmixed_samples, FrameChunker};
use super::level::{is_silent, mean_abs_amplitude, SharedThreshold, DEFAULT_SILENCE_THRESHOLD};
use super::resample::{
    adjust_frame_length, convert_frame_to_target, design_low_pass, downsampling_tap_count,
    low_pass_fir, resample_linear, resample_to_target_rate,
};
use super::TARGET_RATE;
use crossbeam_channel::bounded;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn frame_of(amplitude: f32, len: usize) -> Vec<f32> {
    vec![amplitude; len]
}

fn test_capture_config() -> CaptureConfig {
    CaptureConfig {
        sample_rate: TARGET_RATE,
        frame_ms: 50,
        pause_ms: 1_500,
        max_capture_ms: 10_000,
        channel_capacity: 64,
    }
}

#[test]
fn mean_amplitude_of_empty_frame_is_zero() {
    assert_eq!(mean_abs_amplitude(&[]), 0.0);
}

#[test]
fn mean_amplitude_uses_absolute_values() {
    assert_eq!(mean_abs_amplitude(&[0.5, -0.5, 0.5, -0.5]), 0.5);
}

#[test]
fn amplitude_below_threshold_is_silent() {
    assert!(is_silent(&frame_of(80.0, 16), 100.0));
}

#[test]
fn amplitude_at_threshold_is_silent() {
    // Boundary: only amplitude strictly above the threshold is non-silent.
    assert!(is_silent(&frame_of(100.0, 16), 100.0));
}

#[test]
fn amplitude_above_threshold_is_not_silent() {
    assert!(!is_silent(&frame_of(150.0, 16), 100.0));
}

#[test]
fn empty_frame_is_silent() {
    assert!(is_silent(&[], DEFAULT_SILENCE_THRESHOLD));
}

#[test]
fn calibration_doubles_ambient_mean() {
    let ambient = frame_of(50.0, 1_000);
    let threshold = threshold_from_ambient(&ambient, 2.0).expect("non-empty sample");
    assert_eq!(threshold, 100.0);
}

#[test]
fn calibration_of_digital_silence_stays_positive() {
    let threshold = threshold_from_ambient(&frame_of(0.0, 100), 2.0).expect("non-empty sample");
    assert!(threshold > 0.0);
}

#[test]
fn calibration_needs_samples() {
    assert!(threshold_from_ambient(&[], 2.0).is_none());
}

#[test]
fn shared_threshold_replace_is_visible() {
    let threshold = SharedThreshold::new(0.5);
    assert_eq!(threshold.get(), 0.5);
    let reader = threshold.clone();
    threshold.replace(0.25);
    assert_eq!(reader.get(), 0.25);
}

#[test]
fn rolling_buffer_never_exceeds_capacity() {
    let mut buffer = RollingBuffer::new(4);
    buffer.push(vec![1.0, 1.0]);
    buffer.push(vec![2.0, 2.0]);
    buffer.push(vec![3.0, 3.0]);
    assert!(buffer.total_samples() <= 4);
    assert_eq!(buffer.frame_count(), 2);
}

#[test]
fn rolling_buffer_evicts_oldest_first() {
    let mut buffer = RollingBuffer::new(4);
    buffer.push(vec![1.0, 1.0]);
    buffer.push(vec![2.0, 2.0]);
    buffer.push(vec![3.0, 3.0]);
    assert_eq!(buffer.join(), vec![2.0, 2.0, 3.0, 3.0]);
    assert_eq!(buffer.latest(), Some(&[3.0, 3.0][..]));
}

#[test]
fn rolling_buffer_clear_resets_accounting() {
    let mut buffer = RollingBuffer::new(8);
    buffer.push(vec![1.0; 4]);
    buffer.clear();
    assert!(buffer.is_empty());
    assert_eq!(buffer.total_samples(), 0);
    assert!(buffer.latest().is_none());
}

#[test]
fn shared_buffer_append_and_snapshot() {
    let buffer = SharedAudioBuffer::new(8);
    buffer.try_append(vec![0.1, 0.2]);
    buffer.try_append(vec![0.3, 0.4]);
    assert_eq!(buffer.snapshot_joined(), vec![0.1, 0.2, 0.3, 0.4]);
    assert_eq!(buffer.latest_frame(), Some(vec![0.3, 0.4]));
    assert_eq!(buffer.dropped_frames(), 0);
    buffer.clear();
    assert!(buffer.is_empty());
}

#[test]
fn utterance_state_ignores_leading_silence() {
    let cfg = test_capture_config();
    let mut state = UtteranceState::new(&cfg);
    // 1500ms / 50ms = 30 silent frames would stop after speech; before
    // speech they must not.
    for _ in 0..60 {
        assert_eq!(state.observe(true), None);
    }
    assert!(!state.speech_started());
}

#[test]
fn utterance_state_stops_after_exact_pause() {
    let cfg = test_capture_config();
    let max_silent = cfg.pause_ms.div_ceil(cfg.frame_ms);
    let mut state = UtteranceState::new(&cfg);
    assert_eq!(state.observe(false), None);
    for _ in 0..max_silent - 1 {
        assert_eq!(state.observe(true), None);
    }
    assert_eq!(state.observe(true), Some(CaptureStop::PauseAfterSpeech));
}

#[test]
fn utterance_state_speech_resets_silent_run() {
    let cfg = test_capture_config();
    let max_silent = cfg.pause_ms.div_ceil(cfg.frame_ms);
    let mut state = UtteranceState::new(&cfg);
    state.observe(false);
    for _ in 0..max_silent - 1 {
        assert_eq!(state.observe(true), None);
    }
    // Speech resumes; the run starts over.
    assert_eq!(state.observe(false), None);
    for _ in 0..max_silent - 1 {
        assert_eq!(state.observe(true), None);
    }
    assert_eq!(state.observe(true), Some(CaptureStop::PauseAfterSpeech));
}

#[test]
fn utterance_state_enforces_hard_cap() {
    let cfg = CaptureConfig {
        frame_ms: 50,
        pause_ms: 1_500,
        max_capture_ms: 500,
        ..test_capture_config()
    };
    let mut state = UtteranceState::new(&cfg);
    let mut stop = None;
    for _ in 0..20 {
        stop = state.observe(false);
        if stop.is_some() {
            break;
        }
    }
    assert_eq!(stop, Some(CaptureStop::MaxDuration));
}

#[test]
fn capture_without_speech_yields_nothing() {
    let cfg = CaptureConfig {
        max_capture_ms: 1_000,
        ..test_capture_config()
    };
    let frames = (0..40).map(|_| frame_of(0.0, 16)).collect::<Vec<_>>();
    assert!(capture_from_frames(frames, 0.5, &cfg).is_none());
}

#[test]
fn capture_keeps_leading_silence_in_the_recording() {
    let cfg = test_capture_config();
    let max_silent = cfg.pause_ms.div_ceil(cfg.frame_ms) as usize;
    let mut frames = vec![frame_of(0.0, 4), frame_of(0.0, 4)];
    frames.push(frame_of(1.0, 4));
    frames.extend((0..max_silent).map(|_| frame_of(0.0, 4)));
    let utterance = capture_from_frames(frames, 0.5, &cfg).expect("speech was present");
    assert_eq!(utterance.stop, CaptureStop::PauseAfterSpeech);
    // Two leading silent frames + speech + the pause tail all recorded.
    assert_eq!(utterance.samples.len(), (3 + max_silent) * 4);
}

#[test]
fn downmixes_multi_channel_audio() {
    let mut buf = Vec::new();
    let samples = [1.0f32, -1.0, 0.5, 0.5];
    append_downmixed_samples(&mut buf, &samples, 2, |sample| sample);
    assert_eq!(buf, vec![0.0, 0.5]);
}

#[test]
fn preserves_single_channel_audio() {
    let mut buf = Vec::new();
    let samples = [0.1f32, 0.2, 0.3];
    append_downmixed_samples(&mut buf, &samples, 1, |sample| sample);
    assert_eq!(buf, samples);
}

#[test]
fn chunker_emits_fixed_size_frames() {
    let (sender, receiver) = bounded::<Vec<f32>>(8);
    let dropped = Arc::new(AtomicUsize::new(0));
    let mut chunker = FrameChunker::new(4, sender, dropped.clone());
    chunker.push(&[0.1f32; 10], 1, |s| s);
    assert_eq!(receiver.try_recv().map(|f| f.len()), Ok(4));
    assert_eq!(receiver.try_recv().map(|f| f.len()), Ok(4));
    // Two samples remain pending until the next callback.
    assert!(receiver.try_recv().is_err());
    assert_eq!(dropped.load(Ordering::Relaxed), 0);
}

#[test]
fn chunker_counts_drops_when_channel_is_full() {
    let (sender, receiver) = bounded::<Vec<f32>>(1);
    let dropped = Arc::new(AtomicUsize::new(0));
    let mut chunker = FrameChunker::new(2, sender, dropped.clone());
    chunker.push(&[0.1f32; 8], 1, |s| s);
    assert_eq!(dropped.load(Ordering::Relaxed), 3);
    assert_eq!(receiver.try_recv().map(|f| f.len()), Ok(2));
}

#[test]
fn resample_to_target_rate_returns_input_when_rate_matches() {
    let input = vec![0.1f32, 0.2, 0.3];
    assert_eq!(resample_to_target_rate(&input, TARGET_RATE), input);
}

#[test]
fn resample_to_target_rate_returns_empty_for_empty_input() {
    let input: Vec<f32> = Vec::new();
    assert!(resample_to_target_rate(&input, 48_000).is_empty());
}

#[test]
fn resample_to_target_rate_shrinks_48k_input() {
    let input = vec![0.0, 1.0, 0.5, -0.5, -1.0, 0.0];
    let result = resample_to_target_rate(&input, 48_000);
    assert!(result.len() < input.len());
}

#[test]
fn resample_linear_scales_length() {
    let input = vec![0.0f32, 1.0, 2.0, 3.0];
    let result = resample_linear(&input, 0.5);
    assert!(result.len() < input.len());
    assert!((result.first().copied().unwrap_or_default() - 0.0).abs() < 1e-6);
}

#[test]
fn tap_count_is_odd_and_bounded() {
    for rate in [22_050, 44_100, 48_000, 96_000] {
        let taps = downsampling_tap_count(rate);
        assert_eq!(taps % 2, 1, "taps must be odd for rate {rate}");
        assert!(taps <= 129);
    }
}

#[test]
fn low_pass_preserves_length() {
    let input: Vec<f32> = (0..100).map(|i| (i as f32 * 0.3).sin()).collect();
    let output = low_pass_fir(&input, 48_000, downsampling_tap_count(48_000));
    assert_eq!(output.len(), input.len());
}

#[test]
fn low_pass_coefficients_are_normalized() {
    let coeffs = design_low_pass(0.2, 21);
    let sum: f32 = coeffs.iter().sum();
    assert!((sum - 1.0).abs() < 1e-4);
}

#[test]
fn adjust_frame_length_pads_and_truncates() {
    assert_eq!(adjust_frame_length(vec![1.0, 2.0, 3.0], 2), vec![1.0, 2.0]);
    assert_eq!(adjust_frame_length(vec![1.0, 2.0], 4), vec![1.0, 2.0, 2.0, 2.0]);
    assert_eq!(adjust_frame_length(Vec::new(), 2), vec![0.0, 0.0]);
}

#[test]
fn convert_frame_keeps_target_rate_frames_sized() {
    let frame = vec![0.5f32; 800];
    let out = convert_frame_to_target(frame, TARGET_RATE, TARGET_RATE, 800);
    assert_eq!(out.len(), 800);
}

#[test]
fn convert_frame_resizes_device_rate_frames() {
    // 48kHz 50ms frame -> 16kHz 50ms frame.
    let frame = vec![0.5f32; 2_400];
    let out = convert_frame_to_target(frame, 48_000, TARGET_RATE, 800);
    assert_eq!(out.len(), 800);
}

#[test]
fn capture_config_frame_samples() {
    let cfg = test_capture_config();
    assert_eq!(cfg.frame_samples(), 800);
}

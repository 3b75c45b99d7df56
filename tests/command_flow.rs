//! End-to-end command path without audio hardware: a stubbed transcriber
//! feeds the classify/dispatch/narrate cycle and the results land on disk.

use hark::audio::{CaptureStop, Utterance};
use hark::dispatch::CommandDispatcher;
use hark::error::SttError;
use hark::intent::{Intent, IntentClassifier};
use hark::narrate::SilentNarrator;
use hark::service::{CommandCycle, Flow};
use hark::stt::SpeechToText;
use hark::tasks::TaskExecutor;
use hark::transcript::TranscriptLog;
use std::path::Path;
use std::sync::Arc;

struct ScriptedStt {
    text: String,
}

impl SpeechToText for ScriptedStt {
    fn transcribe(&self, _samples: &[f32]) -> Result<String, SttError> {
        Ok(self.text.clone())
    }
}

fn cycle(root: &Path, heard: &str) -> CommandCycle {
    CommandCycle::new(
        Arc::new(ScriptedStt {
            text: heard.to_string(),
        }),
        CommandDispatcher::new(TaskExecutor::rooted_at(root).unwrap()),
        Box::new(SilentNarrator),
        TranscriptLog::new(root.join("transcript.jsonl")),
    )
}

fn spoken() -> Option<Utterance> {
    Some(Utterance {
        samples: vec![0.25; 1_600],
        stop: CaptureStop::PauseAfterSpeech,
    })
}

#[test]
fn spoken_file_command_creates_the_file_and_logs_it() {
    let dir = tempfile::tempdir().unwrap();
    let flow = cycle(dir.path(), "Please create a file named minutes.md").process(spoken());
    assert_eq!(flow, Flow::Continue);
    assert!(dir.path().join("minutes.md").is_file());

    let log = std::fs::read_to_string(dir.path().join("transcript.jsonl")).unwrap();
    let entry: serde_json::Value = serde_json::from_str(log.lines().next().unwrap()).unwrap();
    assert_eq!(entry["intent"], "create_file");
    assert_eq!(entry["entity"], "minutes.md");
}

#[test]
fn spoken_folder_command_creates_the_folder() {
    let dir = tempfile::tempdir().unwrap();
    let flow = cycle(dir.path(), "make a folder called recordings").process(spoken());
    assert_eq!(flow, Flow::Continue);
    assert!(dir.path().join("recordings").is_dir());
}

#[test]
fn exit_command_ends_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let flow = cycle(dir.path(), "goodbye").process(spoken());
    assert_eq!(flow, Flow::Shutdown);
}

#[test]
fn nonsense_is_logged_as_unknown_and_session_continues() {
    let dir = tempfile::tempdir().unwrap();
    let flow = cycle(dir.path(), "purple monkey dishwasher").process(spoken());
    assert_eq!(flow, Flow::Continue);

    let log = std::fs::read_to_string(dir.path().join("transcript.jsonl")).unwrap();
    let entry: serde_json::Value = serde_json::from_str(log.lines().next().unwrap()).unwrap();
    assert_eq!(entry["intent"], "unknown");
    assert!(entry["entity"].is_null());
}

#[test]
fn classifier_and_dispatcher_agree_on_the_intent_set() {
    // Every classifiable sentence must land in an arm the dispatcher handles.
    let classifier = IntentClassifier::new();
    let sentences = [
        "create a file named a.txt",
        "make a folder called b",
        "open the browser",
        "search for rust",
        "download https://example.com/c.bin",
        "shutdown",
        "exit",
        "gibberish with no verbs",
    ];
    for sentence in sentences {
        let result = classifier.classify(sentence);
        // label() is total over the enum, so this is the exhaustiveness check.
        assert!(!result.intent.label().is_empty());
        if result.intent == Intent::Unknown {
            assert_eq!(result.confidence, 0.0);
        }
    }
}

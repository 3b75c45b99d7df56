//! Intent classification for transcribed commands.
//!
//! The contract is fixed: free text in, `{intent, entity, confidence}` out,
//! with the intent drawn from a closed set. Internally this is a rule table:
//! one trigger pattern per intent plus an optional entity extractor. Entity
//! tails are anchored so lazy groups capture the full argument instead of a
//! single character.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Closed set of command intents the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CreateFile,
    CreateFolder,
    OpenApplication,
    WebSearch,
    DownloadFile,
    SystemCommand,
    Exit,
    Unknown,
}

impl Intent {
    pub fn label(self) -> &'static str {
        match self {
            Intent::CreateFile => "create_file",
            Intent::CreateFolder => "create_folder",
            Intent::OpenApplication => "open_application",
            Intent::WebSearch => "web_search",
            Intent::DownloadFile => "download_file",
            Intent::SystemCommand => "system_command",
            Intent::Exit => "exit",
            Intent::Unknown => "unknown",
        }
    }
}

/// One classified utterance. `entity` is `None` when no parameter could be
/// extracted; entity-requiring intents treat that as a format error at
/// dispatch time, never a crash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub intent: Intent,
    pub entity: Option<String>,
    pub confidence: f32,
}

const CONFIDENCE_WITH_ENTITY: f32 = 0.9;
const CONFIDENCE_TRIGGER_ONLY: f32 = 0.6;

struct IntentRule {
    intent: Intent,
    trigger: Regex,
    entity: Option<Regex>,
}

pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        let rule = |intent, trigger: &str, entity: Option<&str>| IntentRule {
            intent,
            trigger: Regex::new(trigger).expect("intent trigger pattern should compile"),
            entity: entity
                .map(|p| Regex::new(p).expect("intent entity pattern should compile")),
        };

        // Order matters: more specific rules first so generic verbs like
        // "open" or "find" don't shadow them.
        let rules = vec![
            rule(
                Intent::CreateFile,
                r"(?i)\b(?:create|make|generate|need)\b.*\b(?:file|document)\b",
                Some(r"(?i)\b(?:file|document)\s+(?:named\s+|called\s+)?([\w\-.]+\.\w+)"),
            ),
            rule(
                Intent::CreateFolder,
                r"(?i)\b(?:create|make|set up|new)\b.*\b(?:folder|directory)\b",
                Some(r"(?i)\b(?:folder|directory)\s+(?:for\s+|named\s+|called\s+)?([\w\-]+)"),
            ),
            rule(
                Intent::SystemCommand,
                r"(?i)\b(?:shutdown|restart|sleep|increase volume|decrease volume|mute|lock)\b",
                Some(r"(?i)\b(shutdown|restart|sleep|increase volume|decrease volume|mute|lock)\b"),
            ),
            rule(
                Intent::DownloadFile,
                r"(?i)\b(?:download|fetch)\b",
                Some(r"(?i)\b(?:download|fetch)\s+(?:the\s+)?(\S+)"),
            ),
            rule(
                Intent::OpenApplication,
                r"(?i)\b(?:open|start|launch|run)\b",
                Some(
                    r"(?i)\b(?:open|start|launch|run)\s+(?:the\s+)?([\w][\w ]*?)(?:\s+application|\s+app)?(?:\s+now)?\s*$",
                ),
            ),
            rule(
                Intent::WebSearch,
                r"(?i)\b(?:search|find|look up)\b",
                Some(
                    r"(?i)\b(?:search|find|look up)(?:\s+(?:for|the\s+internet\s+for))?\s+(.+?)(?:\s+on\s+the\s+web)?\s*$",
                ),
            ),
            rule(
                Intent::Exit,
                r"(?i)^\s*(?:exit|quit|goodbye|stop listening|shut yourself down)\b",
                None,
            ),
        ];

        Self { rules }
    }

    /// Classify one transcript. Always total: text matching no rule yields
    /// `Unknown` with zero confidence.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        for rule in &self.rules {
            if !rule.trigger.is_match(text) {
                continue;
            }
            let entity = rule.entity.as_ref().and_then(|pattern| {
                pattern
                    .captures(text)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|s| !s.is_empty())
            });
            let confidence = if rule.entity.is_none() || entity.is_some() {
                CONFIDENCE_WITH_ENTITY
            } else {
                CONFIDENCE_TRIGGER_ONLY
            };
            return ClassificationResult {
                intent: rule.intent,
                entity,
                confidence,
            };
        }

        ClassificationResult {
            intent: Intent::Unknown,
            entity: None,
            confidence: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> ClassificationResult {
        IntentClassifier::new().classify(text)
    }

    #[test]
    fn create_file_with_name() {
        let result = classify("create a file named notes.txt");
        assert_eq!(result.intent, Intent::CreateFile);
        assert_eq!(result.entity.as_deref(), Some("notes.txt"));
        assert!(result.confidence > 0.8);
    }

    #[test]
    fn create_file_without_name_has_no_entity() {
        let result = classify("please make a file for me");
        assert_eq!(result.intent, Intent::CreateFile);
        assert_eq!(result.entity, None);
        assert!(result.confidence < 0.8);
    }

    #[test]
    fn create_folder_with_name() {
        let result = classify("make a folder called projects");
        assert_eq!(result.intent, Intent::CreateFolder);
        assert_eq!(result.entity.as_deref(), Some("projects"));
    }

    #[test]
    fn open_application_captures_full_name() {
        let result = classify("open the browser");
        assert_eq!(result.intent, Intent::OpenApplication);
        assert_eq!(result.entity.as_deref(), Some("browser"));
    }

    #[test]
    fn open_application_drops_app_suffix() {
        let result = classify("launch the calculator app");
        assert_eq!(result.intent, Intent::OpenApplication);
        assert_eq!(result.entity.as_deref(), Some("calculator"));
    }

    #[test]
    fn web_search_captures_query() {
        let result = classify("search for rust audio programming");
        assert_eq!(result.intent, Intent::WebSearch);
        assert_eq!(result.entity.as_deref(), Some("rust audio programming"));
    }

    #[test]
    fn download_captures_url() {
        let result = classify("download https://example.com/report.pdf");
        assert_eq!(result.intent, Intent::DownloadFile);
        assert_eq!(result.entity.as_deref(), Some("https://example.com/report.pdf"));
    }

    #[test]
    fn system_command_alias() {
        let result = classify("please restart my computer");
        assert_eq!(result.intent, Intent::SystemCommand);
        assert_eq!(result.entity.as_deref(), Some("restart"));
    }

    #[test]
    fn system_command_beats_open_for_restart() {
        // "restart" must not be read as the generic "start" launch verb.
        let result = classify("restart now");
        assert_eq!(result.intent, Intent::SystemCommand);
    }

    #[test]
    fn exit_is_recognized() {
        assert_eq!(classify("exit").intent, Intent::Exit);
        assert_eq!(classify("goodbye").intent, Intent::Exit);
    }

    #[test]
    fn unrelated_text_is_unknown() {
        let result = classify("what is the weather like today");
        assert_eq!(result.intent, Intent::Unknown);
        assert_eq!(result.entity, None);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn intent_serializes_snake_case() {
        let json = serde_json::to_string(&Intent::CreateFile).unwrap();
        assert_eq!(json, "\"create_file\"");
    }
}

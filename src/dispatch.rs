//! Command dispatch: classified intent in, outcome out.
//!
//! The dispatcher is the single exhaustive match over the intent set. It
//! never terminates the process; even the exit command is reported as an
//! outcome and the caller decides what to do with it. A missing entity on an
//! entity-requiring intent is an ordinary rejection, not a panic.

use crate::error::TaskError;
use crate::intent::{ClassificationResult, Intent};
use crate::tasks::TaskExecutor;

/// What happened to one dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The task ran; `message` is the confirmation to narrate.
    Completed { message: String },
    /// The task was refused or failed; `message` explains why.
    Rejected { message: String },
    /// The utterance matched no known intent.
    NotUnderstood,
    /// The user asked the assistant to stop.
    ExitRequested,
}

impl DispatchOutcome {
    /// The sentence to speak for this outcome.
    pub fn narration(&self) -> &str {
        match self {
            DispatchOutcome::Completed { message } => message,
            DispatchOutcome::Rejected { message } => message,
            DispatchOutcome::NotUnderstood => "Sorry, I did not understand that",
            DispatchOutcome::ExitRequested => "Goodbye",
        }
    }
}

pub struct CommandDispatcher {
    executor: TaskExecutor,
}

impl CommandDispatcher {
    pub fn new(executor: TaskExecutor) -> Self {
        Self { executor }
    }

    pub fn dispatch(&self, classified: &ClassificationResult) -> DispatchOutcome {
        tracing::info!(
            intent = classified.intent.label(),
            entity = classified.entity.as_deref().unwrap_or("-"),
            confidence = classified.confidence,
            "dispatching command"
        );

        match classified.intent {
            Intent::CreateFile => self.with_entity(classified, "I need a file name", |name| {
                self.executor.create_file(name)
            }),
            Intent::CreateFolder => {
                self.with_entity(classified, "I need a folder name", |name| {
                    self.executor.create_folder(name)
                })
            }
            Intent::OpenApplication => {
                self.with_entity(classified, "I need an application name", |name| {
                    self.executor.open_application(name)
                })
            }
            Intent::WebSearch => self.with_entity(classified, "I need a search query", |query| {
                self.executor.web_search(query)
            }),
            Intent::DownloadFile => {
                self.with_entity(classified, "I need a download address", |url| {
                    self.executor.download_file(url)
                })
            }
            Intent::SystemCommand => {
                self.with_entity(classified, "I need a system action", |action| {
                    self.executor.system_command(action)
                })
            }
            Intent::Exit => DispatchOutcome::ExitRequested,
            Intent::Unknown => DispatchOutcome::NotUnderstood,
        }
    }

    fn with_entity(
        &self,
        classified: &ClassificationResult,
        missing: &str,
        run: impl FnOnce(&str) -> Result<String, TaskError>,
    ) -> DispatchOutcome {
        let Some(entity) = classified.entity.as_deref() else {
            return DispatchOutcome::Rejected {
                message: missing.to_string(),
            };
        };
        match run(entity) {
            Ok(message) => DispatchOutcome::Completed { message },
            Err(err) => {
                tracing::warn!(
                    intent = classified.intent.label(),
                    %err,
                    "task failed"
                );
                DispatchOutcome::Rejected {
                    message: rejection_message(&err),
                }
            }
        }
    }
}

fn rejection_message(err: &TaskError) -> String {
    match err {
        TaskError::InvalidPath(name) => format!("{name} is not a valid name"),
        TaskError::ApplicationNotFound(name) => format!("I could not find {name}"),
        TaskError::CommandNotSupported(action) => {
            format!("{action} is not supported on this system")
        }
        TaskError::DownloadConflict(path) => {
            format!("{} already exists", path.display())
        }
        TaskError::DownloadFailed(reason) => format!("The download failed: {reason}"),
        TaskError::Io(err) => format!("That did not work: {err}"),
    }
}

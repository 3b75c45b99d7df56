//! Task execution for classified commands.
//!
//! Each method performs one concrete action and returns a short confirmation
//! sentence suitable for narration, or a [`TaskError`] describing why the
//! action was refused. File-creating tasks validate names before touching the
//! filesystem; the downloader checks for an existing target before any
//! network traffic.

use crate::error::TaskError;
use crate::platform::{self, SystemAction};
use anyhow::Context as _;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Executes filesystem, launch, and network tasks on behalf of the
/// dispatcher. Created files, folders, and downloads all land in the
/// download directory, resolved once at startup.
pub struct TaskExecutor {
    download_dir: PathBuf,
    http: reqwest::blocking::Client,
}

impl TaskExecutor {
    pub fn new(download_dir_override: Option<PathBuf>) -> anyhow::Result<Self> {
        let download_dir = download_dir_override
            .or_else(dirs::download_dir)
            .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&download_dir).with_context(|| {
            format!("failed to create download directory {}", download_dir.display())
        })?;
        // Bound connection setup only; transfers run as long as bytes flow.
        let http = reqwest::blocking::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { download_dir, http })
    }

    /// Root the download directory at `root`. Test hook.
    pub fn rooted_at(root: &Path) -> anyhow::Result<Self> {
        Self::new(Some(root.to_path_buf()))
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Create an empty file in the download directory.
    pub fn create_file(&self, name: &str) -> Result<String, TaskError> {
        let name = validate_name(name)?;
        let path = self.download_dir.join(&name);
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        file.flush()?;
        tracing::info!(path = %path.display(), "created file");
        Ok(format!("Created file {name}"))
    }

    /// Create a folder in the download directory. Existing folders are fine.
    pub fn create_folder(&self, name: &str) -> Result<String, TaskError> {
        let name = validate_name(name)?;
        let path = self.download_dir.join(&name);
        fs::create_dir_all(&path)?;
        tracing::info!(path = %path.display(), "created folder");
        Ok(format!("Created folder {name}"))
    }

    /// Launch an application by spoken alias or binary name.
    pub fn open_application(&self, name: &str) -> Result<String, TaskError> {
        let argv = platform::app_launch_command(name);
        let program = &argv[0];
        if platform::which(program).is_none() && !Path::new(program).is_absolute() {
            return Err(TaskError::ApplicationNotFound(name.to_string()));
        }
        Command::new(program)
            .args(&argv[1..])
            .spawn()
            .map_err(|_| TaskError::ApplicationNotFound(name.to_string()))?;
        tracing::info!(%name, %program, "launched application");
        Ok(format!("Opening {name}"))
    }

    /// Open the default browser on a search-results page for `query`.
    pub fn web_search(&self, query: &str) -> Result<String, TaskError> {
        let url = format!(
            "https://duckduckgo.com/?q={}",
            urlencoding::encode(query.trim())
        );
        let argv = platform::open_url_command(&url);
        Command::new(&argv[0]).args(&argv[1..]).spawn()?;
        tracing::info!(%query, "opened web search");
        Ok(format!("Searching the web for {query}"))
    }

    /// Download `url` into the download directory.
    ///
    /// Refuses to overwrite: an existing target file is a conflict, reported
    /// before any network request is made.
    pub fn download_file(&self, url: &str) -> Result<String, TaskError> {
        let file_name = url
            .rsplit('/')
            .next()
            .map(|tail| tail.split(['?', '#']).next().unwrap_or(tail))
            .filter(|tail| !tail.is_empty())
            .unwrap_or("download");
        let file_name = validate_name(file_name)?;
        let target = self.download_dir.join(&file_name);
        if target.exists() {
            return Err(TaskError::DownloadConflict(target));
        }

        let mut response = self
            .http
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|err| TaskError::DownloadFailed(err.to_string()))?;

        // Stream to disk; never hold the whole body in memory.
        let mut file = fs::File::create(&target)?;
        let written = response
            .copy_to(&mut file)
            .map_err(|err| TaskError::DownloadFailed(err.to_string()));
        match written.and_then(|bytes| file.flush().map(|_| bytes).map_err(TaskError::from)) {
            Ok(bytes) => {
                tracing::info!(path = %target.display(), bytes, "downloaded file");
                Ok(format!("Downloaded {file_name}"))
            }
            Err(err) => {
                // A failed transfer must not leave a partial file behind.
                if let Err(remove_err) = fs::remove_file(&target) {
                    tracing::debug!(%remove_err, path = %target.display(), "failed to remove partial download");
                }
                Err(err)
            }
        }
    }

    /// Run a named system action, falling back to a literal command line when
    /// the alias table has no entry and the program exists on PATH.
    pub fn system_command(&self, spoken: &str) -> Result<String, TaskError> {
        match platform::system_action(spoken) {
            SystemAction::Command(argv) => {
                Command::new(&argv[0]).args(&argv[1..]).spawn()?;
                tracing::info!(action = %spoken, "system action started");
                Ok(format!("Running {spoken}"))
            }
            SystemAction::Unsupported => {
                Err(TaskError::CommandNotSupported(spoken.to_string()))
            }
            SystemAction::NotAnAlias => {
                let argv = shell_words::split(spoken)
                    .map_err(|_| TaskError::CommandNotSupported(spoken.to_string()))?;
                let Some(program) = argv.first() else {
                    return Err(TaskError::CommandNotSupported(spoken.to_string()));
                };
                if platform::which(program).is_none() {
                    return Err(TaskError::CommandNotSupported(spoken.to_string()));
                }
                Command::new(program).args(&argv[1..]).spawn()?;
                tracing::info!(command = %spoken, "raw command started");
                Ok(format!("Running {spoken}"))
            }
        }
    }
}

/// Reject names that would escape the target directory or are illegal on
/// common filesystems.
fn validate_name(name: &str) -> Result<String, TaskError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return Err(TaskError::InvalidPath(name.to_string()));
    }
    let illegal = |c: char| {
        matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*' | '/' | '\\')
            || (c as u32) < 0x20
    };
    if trimmed.chars().any(illegal) {
        return Err(TaskError::InvalidPath(name.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_file_in_download_dir() {
        let dir = tempdir().unwrap();
        let executor = TaskExecutor::rooted_at(dir.path()).unwrap();
        let message = executor.create_file("notes.txt").unwrap();
        assert!(message.contains("notes.txt"));
        assert!(dir.path().join("notes.txt").is_file());
    }

    #[test]
    fn creating_an_existing_file_is_not_an_error() {
        let dir = tempdir().unwrap();
        let executor = TaskExecutor::rooted_at(dir.path()).unwrap();
        executor.create_file("notes.txt").unwrap();
        executor.create_file("notes.txt").unwrap();
    }

    #[test]
    fn creates_folder() {
        let dir = tempdir().unwrap();
        let executor = TaskExecutor::rooted_at(dir.path()).unwrap();
        executor.create_folder("projects").unwrap();
        assert!(dir.path().join("projects").is_dir());
    }

    #[test]
    fn rejects_path_traversal() {
        let dir = tempdir().unwrap();
        let executor = TaskExecutor::rooted_at(dir.path()).unwrap();
        assert!(matches!(
            executor.create_file("../escape.txt"),
            Err(TaskError::InvalidPath(_))
        ));
        assert!(matches!(
            executor.create_folder(".."),
            Err(TaskError::InvalidPath(_))
        ));
    }

    #[test]
    fn rejects_illegal_characters() {
        assert!(validate_name("a<b.txt").is_err());
        assert!(validate_name("con|sole").is_err());
        assert!(validate_name("").is_err());
        assert_eq!(validate_name("  report.pdf ").unwrap(), "report.pdf");
    }

    #[test]
    fn new_creates_the_download_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("downloads").join("hark");
        let executor = TaskExecutor::rooted_at(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(executor.download_dir(), nested.as_path());
    }

    #[test]
    fn failed_download_leaves_no_partial_file() {
        let dir = tempdir().unwrap();
        let executor = TaskExecutor::rooted_at(dir.path()).unwrap();
        let err = executor
            .download_file("http://127.0.0.1:1/report.pdf")
            .unwrap_err();
        assert!(matches!(err, TaskError::DownloadFailed(_)));
        assert!(!dir.path().join("report.pdf").exists());
    }

    #[test]
    fn download_conflict_is_detected_before_any_request() {
        let dir = tempdir().unwrap();
        let executor = TaskExecutor::rooted_at(dir.path()).unwrap();
        std::fs::write(dir.path().join("report.pdf"), b"existing").unwrap();
        // No server behind this URL; the conflict must win before the
        // request is attempted.
        let err = executor
            .download_file("http://127.0.0.1:1/report.pdf")
            .unwrap_err();
        assert!(matches!(err, TaskError::DownloadConflict(_)));
    }

    #[test]
    fn missing_application_is_reported() {
        let dir = tempdir().unwrap();
        let executor = TaskExecutor::rooted_at(dir.path()).unwrap();
        let err = executor
            .open_application("definitely-not-installed-xyz")
            .unwrap_err();
        assert!(matches!(err, TaskError::ApplicationNotFound(_)));
    }

    #[test]
    fn unknown_raw_command_is_not_supported() {
        let dir = tempdir().unwrap();
        let executor = TaskExecutor::rooted_at(dir.path()).unwrap();
        let err = executor
            .system_command("definitely-not-a-binary --flag")
            .unwrap_err();
        assert!(matches!(err, TaskError::CommandNotSupported(_)));
    }
}

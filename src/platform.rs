//! Per-OS command tables.
//!
//! Everything OS-specific lives here: alias tables for launchable
//! applications, the system action lookup, URL opening, and the text-to-speech
//! command. Callers get back plain argv vectors and run them through
//! `std::process::Command`; nothing in this module spawns processes itself.

use std::env;
use std::path::PathBuf;

/// Result of looking up a spoken system action like "restart" or "mute".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemAction {
    /// Known action with a runnable argv for this OS.
    Command(Vec<String>),
    /// Known action name, but this OS has no mapping for it.
    Unsupported,
    /// Not one of the recognized action names.
    NotAnAlias,
}

/// Search PATH for an executable, mirroring the shell's `which`.
pub fn which(program: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    for dir in env::split_paths(&path_var) {
        let candidate = dir.join(program);
        if is_executable(&candidate) {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            for ext in ["exe", "cmd", "bat"] {
                let with_ext = dir.join(format!("{program}.{ext}"));
                if with_ext.is_file() {
                    return Some(with_ext);
                }
            }
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &PathBuf) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.is_file()
        && std::fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &PathBuf) -> bool {
    path.is_file()
}

/// Map a spoken application alias to a launch argv.
///
/// Unknown names fall through to the name itself so users can launch
/// anything on PATH by saying its binary name.
pub fn app_launch_command(name: &str) -> Vec<String> {
    let alias = name.trim().to_lowercase();
    if matches!(alias.as_str(), "browser" | "web browser") {
        return default_browser_argv();
    }
    let argv: &[&str] = match alias.as_str() {
        "notepad" | "text editor" | "editor" => default_editor_argv(),
        "calculator" => default_calculator_argv(),
        "terminal" | "console" => default_terminal_argv(),
        "files" | "file manager" => default_file_manager_argv(),
        _ => return vec![alias],
    };
    argv.iter().map(|s| s.to_string()).collect()
}

#[cfg(target_os = "macos")]
fn default_browser_argv() -> Vec<String> {
    vec!["open".to_string(), "-a".to_string(), "Safari".to_string()]
}
#[cfg(target_os = "windows")]
fn default_browser_argv() -> Vec<String> {
    ["cmd", "/C", "start", "", "msedge"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn default_browser_argv() -> Vec<String> {
    // No universal browser binary on Linux; take the first installed one.
    for browser in ["firefox", "chromium", "chromium-browser", "google-chrome"] {
        if which(browser).is_some() {
            return vec![browser.to_string()];
        }
    }
    vec!["xdg-open".to_string(), "about:blank".to_string()]
}

#[cfg(target_os = "macos")]
fn default_editor_argv() -> &'static [&'static str] {
    &["open", "-a", "TextEdit"]
}
#[cfg(target_os = "windows")]
fn default_editor_argv() -> &'static [&'static str] {
    &["notepad"]
}
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn default_editor_argv() -> &'static [&'static str] {
    &["gedit"]
}

#[cfg(target_os = "macos")]
fn default_calculator_argv() -> &'static [&'static str] {
    &["open", "-a", "Calculator"]
}
#[cfg(target_os = "windows")]
fn default_calculator_argv() -> &'static [&'static str] {
    &["calc"]
}
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn default_calculator_argv() -> &'static [&'static str] {
    &["gnome-calculator"]
}

#[cfg(target_os = "macos")]
fn default_terminal_argv() -> &'static [&'static str] {
    &["open", "-a", "Terminal"]
}
#[cfg(target_os = "windows")]
fn default_terminal_argv() -> &'static [&'static str] {
    &["cmd", "/C", "start", "cmd"]
}
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn default_terminal_argv() -> &'static [&'static str] {
    &["x-terminal-emulator"]
}

#[cfg(target_os = "macos")]
fn default_file_manager_argv() -> &'static [&'static str] {
    &["open", "."]
}
#[cfg(target_os = "windows")]
fn default_file_manager_argv() -> &'static [&'static str] {
    &["explorer", "."]
}
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn default_file_manager_argv() -> &'static [&'static str] {
    &["xdg-open", "."]
}

const SYSTEM_ACTION_NAMES: &[&str] = &[
    "shutdown",
    "restart",
    "sleep",
    "increase volume",
    "decrease volume",
    "mute",
    "lock",
];

/// Look up a spoken system action.
pub fn system_action(name: &str) -> SystemAction {
    let alias = name.trim().to_lowercase();
    if !SYSTEM_ACTION_NAMES.contains(&alias.as_str()) {
        return SystemAction::NotAnAlias;
    }
    match system_action_argv(&alias) {
        Some(argv) => SystemAction::Command(argv.iter().map(|s| s.to_string()).collect()),
        None => SystemAction::Unsupported,
    }
}

#[cfg(target_os = "macos")]
fn system_action_argv(alias: &str) -> Option<&'static [&'static str]> {
    Some(match alias {
        "shutdown" => &["osascript", "-e", "tell app \"System Events\" to shut down"],
        "restart" => &["osascript", "-e", "tell app \"System Events\" to restart"],
        "sleep" => &["pmset", "sleepnow"],
        "increase volume" => &[
            "osascript",
            "-e",
            "set volume output volume ((output volume of (get volume settings)) + 10)",
        ],
        "decrease volume" => &[
            "osascript",
            "-e",
            "set volume output volume ((output volume of (get volume settings)) - 10)",
        ],
        "mute" => &["osascript", "-e", "set volume output muted true"],
        "lock" => return None,
        _ => return None,
    })
}

#[cfg(target_os = "windows")]
fn system_action_argv(alias: &str) -> Option<&'static [&'static str]> {
    Some(match alias {
        "shutdown" => &["shutdown", "/s", "/t", "0"],
        "restart" => &["shutdown", "/r", "/t", "0"],
        "sleep" => &[
            "rundll32.exe",
            "powrprof.dll,SetSuspendState",
            "0,1,0",
        ],
        "lock" => &["rundll32.exe", "user32.dll,LockWorkStation"],
        "increase volume" | "decrease volume" | "mute" => return None,
        _ => return None,
    })
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn system_action_argv(alias: &str) -> Option<&'static [&'static str]> {
    Some(match alias {
        "shutdown" => &["systemctl", "poweroff"],
        "restart" => &["systemctl", "reboot"],
        "sleep" => &["systemctl", "suspend"],
        "increase volume" => &["amixer", "-q", "sset", "Master", "5%+"],
        "decrease volume" => &["amixer", "-q", "sset", "Master", "5%-"],
        "mute" => &["amixer", "-q", "sset", "Master", "toggle"],
        "lock" => &["loginctl", "lock-session"],
        _ => return None,
    })
}

/// Argv that opens a URL in the default browser.
pub fn open_url_command(url: &str) -> Vec<String> {
    #[cfg(target_os = "macos")]
    {
        vec!["open".to_string(), url.to_string()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![
            "cmd".to_string(),
            "/C".to_string(),
            "start".to_string(),
            String::new(),
            url.to_string(),
        ]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec!["xdg-open".to_string(), url.to_string()]
    }
}

/// Argv that speaks `text` aloud, or `None` when no speech engine is
/// available on this machine.
pub fn tts_command(text: &str) -> Option<Vec<String>> {
    #[cfg(target_os = "macos")]
    {
        Some(vec!["say".to_string(), text.to_string()])
    }
    #[cfg(target_os = "windows")]
    {
        let script = format!(
            "Add-Type -AssemblyName System.Speech; (New-Object System.Speech.Synthesis.SpeechSynthesizer).Speak(\"{}\")",
            text.replace('"', "")
        );
        Some(vec![
            "powershell".to_string(),
            "-NoProfile".to_string(),
            "-Command".to_string(),
            script,
        ])
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        for engine in ["espeak", "spd-say"] {
            if which(engine).is_some() {
                return Some(vec![engine.to_string(), text.to_string()]);
            }
        }
        None
    }
}

/// System module: desktop launcher for paths and URLs, logging macros

use crate::ui::Launcher;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::process::Command;

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?|file)://[^\s]+$").expect("url regex is valid")
});

/// Logging macros for convenient access
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        log::info!("{}", msg);
    }}
}

/// Default production implementation of Launcher
///
/// Hands paths and URLs to the desktop opener (`xdg-open`, `open` or
/// `explorer`). Arguments are passed separately, never through a shell.
pub struct SystemLauncher {
    opener: &'static str,
}

impl SystemLauncher {
    pub fn new() -> Self {
        let opener = if cfg!(target_os = "macos") {
            "open"
        } else if cfg!(target_os = "windows") {
            "explorer"
        } else {
            "xdg-open"
        };
        SystemLauncher { opener }
    }

    pub fn opener(&self) -> &str {
        self.opener
    }

    fn spawn(&self, target: &str) -> Result<(), String> {
        log::info!("[System] [LAUNCH] {} {}", self.opener, target);
        Command::new(self.opener)
            .arg(target)
            .spawn()
            .map(|_| ())
            .map_err(|e| format!("Failed to execute {}: {}", self.opener, e))
    }
}

impl Default for SystemLauncher {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject anything that isn't a plain http(s) or file URL
pub fn validate_url(url: &str) -> Result<(), String> {
    if URL_RE.is_match(url.trim()) {
        Ok(())
    } else {
        Err(format!("Refusing to open invalid URL: {}", url))
    }
}

impl Launcher for SystemLauncher {
    fn open_path(&self, path: &Path) -> Result<(), String> {
        // CANONICALIZE: Resolve symlinks and verify existence
        let absolute = path
            .canonicalize()
            .map_err(|e| format!("Cannot open {}: {}", path.display(), e))?;
        self.spawn(&absolute.to_string_lossy())
    }

    fn open_url(&self, url: &str) -> Result<(), String> {
        validate_url(url)?;
        self.spawn(url.trim())
    }
}

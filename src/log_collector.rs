//! Decoupled logging pipeline for the options window.
//!
//! ```text
//! log::info!() / log_info!()
//!     |
//! [LogCollector] (non-blocking, crossbeam unbounded)
//!     |
//! [persister thread]
//!     |               \
//! logs/<ts>_options.log  UI channel (try_send, drops when full)
//! ```
//!
//! Disk writes never depend on the UI channel; a full or closed UI channel
//! only loses the in-window mirror.

use chrono::Local;
use crossbeam_channel::{unbounded, Sender};
use log::{Level, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Internal log line or special marker
enum LogMessage {
    Line(LogLine),
    /// Flush marker with channel sender to signal completion
    Flush(std::sync::mpsc::Sender<()>),
}

/// Get the global logs path: ~/.local/share/adblock-options/logs, or ./logs
/// when no data directory is known.
pub fn get_global_logs_path() -> Result<PathBuf, String> {
    if let Some(data) = dirs::data_local_dir() {
        return Ok(data.join("adblock-options").join("logs"));
    }
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Failed to get current working directory: {}", e))?;
    Ok(cwd.join("logs"))
}

/// Ensure the logs directory exists
pub fn ensure_logs_dir_exists(log_dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(log_dir)
        .map_err(|e| format!("Failed to create logs directory: {}", e))
}

/// A log line with metadata
#[derive(Clone, Debug)]
pub struct LogLine {
    pub level: Level,
    pub message: String,
    pub timestamp: String,
}

impl LogLine {
    pub fn new(level: Level, message: String) -> Self {
        LogLine {
            level,
            message,
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
        }
    }

    /// `[HH:MM:SS.mmm] [LEVEL] message`
    pub fn formatted(&self) -> String {
        format!("[{}] [{}] {}", self.timestamp, self.level, self.message)
    }
}

/// Logger that persists every line to the session file and mirrors it to the UI
pub struct LogCollector {
    tx: Sender<LogMessage>,
    log_dir: PathBuf,
    session_path: PathBuf,
}

impl LogCollector {
    /// Create the session log file and start the persister thread
    pub fn new(
        log_dir: PathBuf,
        ui_tx: Option<tokio::sync::mpsc::Sender<LogLine>>,
    ) -> Result<Self, String> {
        ensure_logs_dir_exists(&log_dir)?;

        let session_path = log_dir.join(format!(
            "{}_options.log",
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        let mut file: File = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&session_path)
            .map_err(|e| format!("Failed to open log file {}: {}", session_path.display(), e))?;

        let (tx, rx) = unbounded::<LogMessage>();

        // OS thread rather than a tokio task so logging keeps working outside
        // (and after) the runtime.
        std::thread::spawn(move || {
            while let Ok(msg) = rx.recv() {
                match msg {
                    LogMessage::Line(line) => {
                        let formatted = format!("{}\n", line.formatted());
                        let _ = file.write_all(formatted.as_bytes());
                        if let Some(ref ui_tx) = ui_tx {
                            let _ = ui_tx.try_send(line);
                        }
                    }
                    LogMessage::Flush(done) => {
                        let _ = file.flush();
                        let _ = done.send(());
                    }
                }
            }
            let _ = file.flush();
        });

        Ok(LogCollector {
            tx,
            log_dir,
            session_path,
        })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn session_log_path(&self) -> &Path {
        &self.session_path
    }

    /// Send a log line (non-blocking)
    pub fn log_line(&self, line: LogLine) {
        let _ = self.tx.send(LogMessage::Line(line));
    }

    pub fn log_str(&self, message: impl Into<String>) {
        self.log_line(LogLine::new(Level::Info, message.into()));
    }

    /// Wait until every line sent before this call is on disk
    pub async fn wait_for_empty(&self) -> Result<(), String> {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        self.tx
            .send(LogMessage::Flush(tx))
            .map_err(|e| format!("Failed to send flush marker: {}", e))?;
        tokio::task::spawn_blocking(move || rx.recv())
            .await
            .map_err(|e| format!("Flush task failed: {}", e))?
            .map_err(|e| format!("Flush signal interrupted: {}", e))
    }
}

impl Clone for LogCollector {
    fn clone(&self) -> Self {
        LogCollector {
            tx: self.tx.clone(),
            log_dir: self.log_dir.clone(),
            session_path: self.session_path.clone(),
        }
    }
}

/// Wires all log::info!(), log::warn!(), log::error!() calls into LogCollector
impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.log_line(LogLine::new(record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_log_collector_writes_session_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let collector = LogCollector::new(temp_dir.path().to_path_buf(), None).unwrap();

        collector.log_str("filters loaded");
        collector.wait_for_empty().await.unwrap();

        let content = fs::read_to_string(collector.session_log_path()).unwrap();
        assert!(content.contains("[INFO] filters loaded"));
    }

    #[tokio::test]
    async fn test_log_collector_mirrors_to_ui_channel() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let (ui_tx, mut ui_rx) = tokio::sync::mpsc::channel(16);
        let collector = LogCollector::new(temp_dir.path().to_path_buf(), Some(ui_tx)).unwrap();

        collector.log_line(LogLine::new(Level::Warn, "whitelist save failed".to_string()));
        collector.wait_for_empty().await.unwrap();

        let line = ui_rx.recv().await.unwrap();
        assert_eq!(line.level, Level::Warn);
        assert!(line.formatted().contains("whitelist save failed"));
    }

    #[tokio::test]
    async fn test_full_ui_channel_does_not_block_disk() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let (ui_tx, _ui_rx) = tokio::sync::mpsc::channel(1);
        let collector = LogCollector::new(temp_dir.path().to_path_buf(), Some(ui_tx)).unwrap();

        for i in 0..500 {
            collector.log_str(format!("line {}", i));
        }
        collector.wait_for_empty().await.unwrap();

        let content = fs::read_to_string(collector.session_log_path()).unwrap();
        assert_eq!(content.lines().count(), 500);
    }
}

use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

const LOG_RETENTION_DAYS: i64 = 7;

static FILE_LOGGER: OnceLock<FileLogger> = OnceLock::new();

/// One JSON log line
#[derive(Debug, Serialize)]
struct LogRecord<'a> {
    ts: String,
    level: &'a str,
    source: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    msg: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
}

struct LogFileState {
    writer: Option<BufWriter<File>>,
    current_date: Option<NaiveDate>,
}

/// Thread-safe daily log file writer
///
/// Appends one JSON record per line to `~/.devsetup/logs/YYYY-MM-DD.log`.
/// Holds client-reported log entries and an audit trail of destructive
/// workspace operations.
pub struct FileLogger {
    log_dir: PathBuf,
    state: Mutex<LogFileState>,
}

impl FileLogger {
    pub fn global() -> &'static FileLogger {
        FILE_LOGGER.get_or_init(|| {
            let log_dir = dirs::home_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(".devsetup")
                .join("logs");
            FileLogger::new(log_dir)
        })
    }

    pub fn new(log_dir: PathBuf) -> Self {
        let _ = fs::create_dir_all(&log_dir);
        Self {
            log_dir,
            state: Mutex::new(LogFileState {
                writer: None,
                current_date: None,
            }),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Entry reported by a connected client
    pub fn write_client_log(
        &self,
        level: &str,
        source: &str,
        category: Option<&str>,
        msg: &str,
        detail: Option<&str>,
    ) {
        self.write_record(&LogRecord {
            ts: timestamp(),
            level,
            source,
            category,
            msg,
            detail,
        });
    }

    /// Audit line for a destructive operation (delete, archive, save)
    /// `target` is the directory or path operated on, `summary` the outcome.
    pub fn write_audit(&self, operation: &str, target: &str, summary: &str) {
        self.write_record(&LogRecord {
            ts: timestamp(),
            level: "info",
            source: "core",
            category: Some(operation),
            msg: summary,
            detail: Some(target),
        });
    }

    /// Remove log files older than the retention window
    pub fn cleanup_old_logs(&self) {
        let cutoff = Local::now().date_naive() - chrono::Duration::days(LOG_RETENTION_DAYS);
        let Ok(entries) = fs::read_dir(&self.log_dir) else {
            return;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("log") {
                continue;
            }
            let date = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|stem| NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok());
            if matches!(date, Some(date) if date < cutoff) {
                let _ = fs::remove_file(&path);
            }
        }
    }

    fn write_record(&self, record: &LogRecord<'_>) {
        let today = Local::now().date_naive();
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        // Reopen on date change
        if state.current_date != Some(today) {
            state.writer = self.open_log_file(today);
            state.current_date = state.writer.as_ref().map(|_| today);
        }

        if let Some(writer) = state.writer.as_mut() {
            if let Ok(json) = serde_json::to_string(record) {
                let _ = writeln!(writer, "{}", json);
                let _ = writer.flush();
            }
        }
    }

    fn open_log_file(&self, date: NaiveDate) -> Option<BufWriter<File>> {
        let path = self.log_dir.join(format!("{}.log", date.format("%Y-%m-%d")));
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
            .map(BufWriter::new)
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_json_lines_and_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let logger = FileLogger::new(tmp.path().to_path_buf());
        fs::write(tmp.path().join("2000-01-01.log"), "{}\n").unwrap();
        fs::write(tmp.path().join("notes.txt"), "keep").unwrap();

        logger.write_client_log("warn", "web", Some("ui"), "clicked", None);
        logger.write_audit("delete_items", "/tmp/x", "removed 3 entries");
        logger.cleanup_old_logs();

        assert!(!tmp.path().join("2000-01-01.log").exists());
        assert!(tmp.path().join("notes.txt").exists());

        let today = tmp
            .path()
            .join(format!("{}.log", Local::now().date_naive().format("%Y-%m-%d")));
        let content = fs::read_to_string(today).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["source"], "web");
        assert_eq!(lines[1]["category"], "delete_items");
        assert_eq!(lines[1]["msg"], "removed 3 entries");
        assert_eq!(lines[1]["detail"], "/tmp/x");
        assert!(lines[0].get("detail").is_none());
    }
}

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

/// Default maximum number of log lines to keep in memory
pub const DEFAULT_MAX_LOG_LINES: usize = 10000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Increases by one per entry logged through the same manager.
    pub id: u64,
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
    pub session_id: Option<String>,
}

/// Diagnostic trace of a sync run.
///
/// Per-file failures never reach the end user individually; they land here
/// and on the `tracing` console output.
pub struct LogManager {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    next_id: AtomicU64,
    max_lines: usize,
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOG_LINES)
    }
}

impl LogManager {
    pub fn new(max_lines: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(max_lines.min(1024)))),
            next_id: AtomicU64::new(1),
            max_lines,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn log(&self, level: LogLevel, message: &str, session_id: Option<&str>) {
        match level {
            LogLevel::Debug => tracing::debug!(session = session_id, "{message}"),
            LogLevel::Info => tracing::info!(session = session_id, "{message}"),
            LogLevel::Warning => tracing::warn!(session = session_id, "{message}"),
            LogLevel::Error => tracing::error!(session = session_id, "{message}"),
        }

        let entry = LogEntry {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            timestamp: chrono::Utc::now().to_rfc3339(),
            level,
            message: message.to_string(),
            session_id: session_id.map(str::to_string),
        };

        let mut logs = self.lock();
        logs.push_back(entry);

        // Remove from front if full
        while logs.len() > self.max_lines {
            logs.pop_front();
        }
    }

    pub fn info(&self, message: &str, session_id: Option<&str>) {
        self.log(LogLevel::Info, message, session_id);
    }

    pub fn warn(&self, message: &str, session_id: Option<&str>) {
        self.log(LogLevel::Warning, message, session_id);
    }

    pub fn get_logs(&self, session_id: Option<&str>) -> Vec<LogEntry> {
        let logs = self.lock();
        match session_id {
            Some(id) => logs
                .iter()
                .filter(|l| l.session_id.as_deref() == Some(id))
                .cloned()
                .collect(),
            None => logs.iter().cloned().collect(),
        }
    }

    /// Entries at or above `min_level`, oldest first.
    pub fn get_logs_at_least(&self, min_level: LogLevel, session_id: Option<&str>) -> Vec<LogEntry> {
        self.get_logs(session_id)
            .into_iter()
            .filter(|l| level_rank(l.level) >= level_rank(min_level))
            .collect()
    }
}

fn level_rank(level: LogLevel) -> u8 {
    match level {
        LogLevel::Debug => 0,
        LogLevel::Info => 1,
        LogLevel::Warning => 2,
        LogLevel::Error => 3,
    }
}

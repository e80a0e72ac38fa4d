use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("failed to serialize log entry: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write log file: {0}")]
    Io(#[from] std::io::Error),
}

/// One line of the interaction log.
#[derive(Debug, Serialize)]
pub struct LogEntry<'a, T: ?Sized> {
    /// Milliseconds since the Unix epoch, taken when the entry is built.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub data: &'a T,
}

/// Append-only JSON-Lines writer shared by every request handler.
///
/// - one compact JSON object per line, never an array
/// - a single lock serialises appends, so lines never interleave
/// - failures are reported through `log` and never reach the caller
#[derive(Debug, Clone)]
pub struct InteractionLog {
    inner: Arc<InteractionLogInner>,
}

#[derive(Debug)]
struct InteractionLogInner {
    path: PathBuf,
    lock: Mutex<()>,
}

impl InteractionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(InteractionLogInner {
                path: path.into(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Append an entry, swallowing any failure.
    pub fn log<T: Serialize + ?Sized>(&self, kind: &str, payload: &T) {
        match self.try_log(kind, payload) {
            Ok(()) => log::info!("Logged {} response to {}", kind, self.path().display()),
            Err(e) => log::error!(
                "Failed to log {} response to {}: {}",
                kind,
                self.path().display(),
                e
            ),
        }
    }

    pub fn try_log<T: Serialize + ?Sized>(&self, kind: &str, payload: &T) -> Result<(), LogError> {
        let entry = LogEntry {
            timestamp: chrono::Utc::now().timestamp_millis(),
            kind,
            data: payload,
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        if let Some(parent) = self.inner.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // The guarded value is (), so a poisoned lock carries no broken state.
        let _guard = self
            .inner
            .lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// [`InteractionLog::log`] from async code; the file write runs on the
    /// blocking pool and this future resolves once it is done.
    pub async fn record<T: Serialize + ?Sized>(&self, kind: &'static str, payload: &T) {
        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                log::error!("Failed to serialize {} response: {}", kind, e);
                return;
            }
        };
        let writer = self.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || writer.log(kind, &payload)).await {
            log::error!("Interaction log task failed: {}", e);
        }
    }
}

//! Operator-visible log lines and the sinks that mirror them.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::EnvFilter;

use crate::error::Result;

/// Destination for human-readable simulation lines.
pub trait LogSink: Send + Sync {
    fn write(&self, line: &str);
}

/// Prefix a message with a millisecond timestamp and the current thread name.
pub fn format_line(message: &str) -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let current = thread::current();
    let thread_name = current.name().unwrap_or("unnamed");
    format!("[{ts}ms][{thread_name}] {message}")
}

/// Install the global tracing subscriber; `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // A subscriber may already be installed (tests, embedding hosts).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .try_init();
}

/// Appends every line to a file that is truncated when the sink is created.
pub struct FileLogSink {
    file: Mutex<File>,
}

impl FileLogSink {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl LogSink for FileLogSink {
    fn write(&self, line: &str) {
        let mut file = self.file.lock().expect("log file mutex poisoned");
        if let Err(e) = writeln!(file, "{}", format_line(line)).and_then(|_| file.flush()) {
            tracing::warn!("log file write failed: {e}");
        }
    }
}

/// Keeps lines in memory; used by tests and embedding hosts.
#[derive(Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("memory sink mutex poisoned").clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .expect("memory sink mutex poisoned")
            .iter()
            .any(|line| line.contains(needle))
    }
}

impl LogSink for MemoryLogSink {
    fn write(&self, line: &str) {
        self.lines
            .lock()
            .expect("memory sink mutex poisoned")
            .push(line.to_string());
    }
}

/// Fans simulation lines out to `tracing` and every attached sink.
#[derive(Clone, Default)]
pub struct FleetLog {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl FleetLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{message}");
        self.emit(message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{message}");
        self.emit(&format!("WARNING: {message}"));
    }

    fn emit(&self, line: &str) {
        for sink in &self.sinks {
            sink.write(line);
        }
    }
}

#[macro_export]
macro_rules! fleet_info {
    ($log:expr, $($arg:tt)*) => {
        $log.info(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! fleet_warn {
    ($log:expr, $($arg:tt)*) => {
        $log.warn(&format!($($arg)*))
    };
}

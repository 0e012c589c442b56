//! Type-scoped identifiers and per-object log histories.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, AtomicU8, Ordering},
        Mutex, PoisonError,
    },
    time::SystemTime,
};

use serde::{Deserialize, Serialize};

static COUNTERS: Mutex<BTreeMap<String, u64>> = Mutex::new(BTreeMap::new());
static SEQUENCE: AtomicU64 = AtomicU64::new(0);
static PRINT_THRESHOLD: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Returns `"{type_name}_{n}"` where `n` counts up from one per type name.
#[must_use]
pub fn generate_id(type_name: &str) -> String {
    let mut counters = COUNTERS.lock().unwrap_or_else(PoisonError::into_inner);
    let counter = counters.entry(type_name.to_owned()).or_insert(0);
    *counter += 1;
    format!("{type_name}_{counter}")
}

/// Sets the lowest severity echoed to the tracing subscriber.
pub fn set_print_threshold(level: LogLevel) {
    PRINT_THRESHOLD.store(level as u8, Ordering::Relaxed);
}

/// Lowest severity currently echoed to the tracing subscriber.
#[must_use]
pub fn print_threshold() -> LogLevel {
    LogLevel::from_u8(PRINT_THRESHOLD.load(Ordering::Relaxed))
}

/// Severity attached to a log record.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LogLevel {
    /// Routine progress.
    #[default]
    Info = 0,
    /// Recoverable trouble.
    Warn = 1,
    /// Failure the object could not work around.
    Error = 2,
}

impl LogLevel {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Info,
            1 => Self::Warn,
            _ => Self::Error,
        }
    }
}

/// One entry of an object's log history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Free-form message.
    pub message: String,
    /// Severity of the message.
    pub level: LogLevel,
    /// Wall-clock time the record was written.
    pub timestamp: SystemTime,
    /// Process-wide write order, used to break timestamp ties.
    pub sequence: u64,
}

/// Identifier plus append-only log history carried by every simulation object.
#[derive(Clone, Debug)]
pub struct Identity<Id> {
    id: Id,
    history: Vec<LogRecord>,
}

impl<Id: AsRef<str>> Identity<Id> {
    /// Creates an identity with an empty history.
    #[must_use]
    pub fn new(id: Id) -> Self {
        Self {
            id,
            history: Vec::new(),
        }
    }

    /// Identifier of the object.
    #[must_use]
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Appends a record, echoing it when the print threshold permits.
    pub fn log(&mut self, message: impl Into<String>, level: LogLevel) {
        let message = message.into();
        if level >= print_threshold() {
            let id = self.id.as_ref();
            match level {
                LogLevel::Info => tracing::info!(target: "droidworks", id, "{message}"),
                LogLevel::Warn => tracing::warn!(target: "droidworks", id, "{message}"),
                LogLevel::Error => tracing::error!(target: "droidworks", id, "{message}"),
            }
        }
        self.history.push(LogRecord {
            message,
            level,
            timestamp: SystemTime::now(),
            sequence: SEQUENCE.fetch_add(1, Ordering::Relaxed),
        });
    }

    /// Appends an informational record.
    pub fn info(&mut self, message: impl Into<String>) {
        self.log(message, LogLevel::Info);
    }

    /// Appends a warning record.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.log(message, LogLevel::Warn);
    }

    /// Appends an error record.
    pub fn error(&mut self, message: impl Into<String>) {
        self.log(message, LogLevel::Error);
    }

    /// Full history in write order.
    #[must_use]
    pub fn history(&self) -> &[LogRecord] {
        &self.history
    }

    /// Most recent message, if any.
    #[must_use]
    pub fn last_message(&self) -> Option<&str> {
        self.history.last().map(|record| record.message.as_str())
    }
}

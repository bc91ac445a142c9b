//! Severity-tagged diagnostic accumulation for the NUML reader and validator.
//!
//! Reading a NUML document never aborts on recoverable problems; instead the
//! reader records every issue in an [`ErrorLog`] and keeps going. Callers must
//! inspect the log before trusting the returned document:
//!
//! ```rust
//! use numl::error_log::{ErrorLog, Severity};
//!
//! let mut log = ErrorLog::new();
//! log.warning("indexType defaulted to string");
//! assert_eq!(log.count_at_or_above(Severity::Error), 0);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a single diagnostic entry.
///
/// Severities are ordered: `Info < Warning < Error < Fatal`. Documents read
/// with only `Info`/`Warning` entries are faithful to the source; `Error`
/// entries mean the document is usable but lossy; a `Fatal` entry means the
/// envelope itself could not be established and the document is partial or
/// empty.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational note, no data affected.
    Info,
    /// Tolerated irregularity, no data lost.
    Warning,
    /// Recoverable problem; the offending fragment was dropped or kept raw.
    Error,
    /// The input could not be parsed as a NUML document at all.
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        };
        f.write_str(label)
    }
}

/// One diagnostic produced while reading or validating a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Severity of the diagnostic.
    pub severity: Severity,
    /// Human-readable description of the problem.
    pub message: String,
    /// Source line, when the underlying parser could supply one.
    pub line: Option<u64>,
    /// Source column, when the underlying parser could supply one.
    pub column: Option<u64>,
}

impl LogEntry {
    /// Create an entry without source position.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Attach a source position to the entry.
    #[must_use]
    pub fn at(mut self, line: u64, column: u64) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(l), Some(c)) => {
                write!(f, "[{}] line {}, column {}: {}", self.severity, l, c, self.message)
            }
            (Some(l), None) => write!(f, "[{}] line {}: {}", self.severity, l, self.message),
            _ => write!(f, "[{}] {}", self.severity, self.message),
        }
    }
}

/// Ordered collection of diagnostics from one reader or validator invocation.
///
/// Each call to [`read_numl`](crate::reader::read_numl) or
/// [`validate`](crate::validator::validate) produces its own log; logs are
/// never shared between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLog {
    entries: Vec<LogEntry>,
}

impl ErrorLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn add(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Append a message at the given severity.
    pub fn log(&mut self, severity: Severity, message: impl Into<String>) {
        self.add(LogEntry::new(severity, message));
    }

    /// Append an `Info` entry.
    pub fn info(&mut self, message: impl Into<String>) {
        self.log(Severity::Info, message);
    }

    /// Append a `Warning` entry.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.log(Severity::Warning, message);
    }

    /// Append an `Error` entry.
    pub fn error(&mut self, message: impl Into<String>) {
        self.log(Severity::Error, message);
    }

    /// Append a `Fatal` entry.
    pub fn fatal(&mut self, message: impl Into<String>) {
        self.log(Severity::Fatal, message);
    }

    /// Number of entries in the log.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, in insertion order.
    pub fn get(&self, index: usize) -> Option<&LogEntry> {
        self.entries.get(index)
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Count entries whose severity is at least `severity`.
    ///
    /// `count_at_or_above(Severity::Error) == 0` is the green light callers
    /// should require before trusting a read result.
    pub fn count_at_or_above(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|e| e.severity >= severity).count()
    }

    /// Whether a fatal entry is present.
    pub fn has_fatal(&self) -> bool {
        self.count_at_or_above(Severity::Fatal) > 0
    }
}

impl fmt::Display for ErrorLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return writeln!(f, "no diagnostics");
        }
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        writeln!(
            f,
            "{} diagnostic(s), {} at error severity or above",
            self.entries.len(),
            self.count_at_or_above(Severity::Error)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_count_at_or_above() {
        let mut log = ErrorLog::new();
        log.info("parsed envelope");
        log.warning("empty ontologyTerms section");
        log.error("duplicate id `term1`");
        log.fatal("missing numl element");

        assert_eq!(log.len(), 4);
        assert_eq!(log.count_at_or_above(Severity::Info), 4);
        assert_eq!(log.count_at_or_above(Severity::Error), 2);
        assert_eq!(log.count_at_or_above(Severity::Fatal), 1);
        assert!(log.has_fatal());
    }

    #[test]
    fn test_entry_display_with_position() {
        let entry = LogEntry::new(Severity::Error, "bad token").at(3, 17);
        assert_eq!(entry.to_string(), "[error] line 3, column 17: bad token");
    }

    #[test]
    fn test_log_serializes_to_json() {
        let mut log = ErrorLog::new();
        log.error("unresolved ontology term reference `term9`");

        let json = serde_json::to_string(&log).expect("log serializes");
        assert!(json.contains("\"severity\":\"error\""));

        let back: ErrorLog = serde_json::from_str(&json).expect("log deserializes");
        assert_eq!(back, log);
    }
}

//! Error types for smstat-core
//!
//! Provides the error hierarchy with thiserror, plus a per-line report for
//! batch imports so one bad record does not abort the whole file.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for smstat operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // Record Errors
    // ===================
    #[error("Unsupported record kind: {kind}")]
    UnsupportedRecordKind { kind: String },

    #[error("Invalid {kind} record: {message}")]
    InvalidRecord {
        kind: String,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid country fee '{country_code}': {reason}")]
    InvalidCountryFee {
        country_code: String,
        reason: String,
    },

    #[error("Recipient {recipient} matches several country codes: {}", .candidates.join(", "))]
    AmbiguousCountryMatch {
        recipient: String,
        candidates: Vec<String>,
    },

    // ===================
    // Store Errors
    // ===================
    #[error("Storage unavailable during {operation}: {message}")]
    StorageUnavailable {
        operation: String,
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // ===================
    // Statistics Errors
    // ===================
    #[error("Fee total for {label} exceeds the representable amount")]
    FeeOverflow { label: String },

    // ===================
    // IO Errors
    // ===================
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    // ===================
    // Parse Errors
    // ===================
    #[error("Malformed JSONL line {line_number} in {path}: {message}")]
    JsonlParse {
        path: PathBuf,
        line_number: usize,
        message: String,
    },

    #[error("Failed to parse TOML in {path}: {message}")]
    TomlParse {
        path: PathBuf,
        message: String,
        #[source]
        source: toml::de::Error,
    },

    // ===================
    // Config Errors
    // ===================
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl CoreError {
    /// Wrap a SQLite failure as `StorageUnavailable`
    pub fn storage(operation: impl Into<String>, source: rusqlite::Error) -> Self {
        CoreError::StorageUnavailable {
            operation: operation.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Storage failure without an underlying driver error
    pub fn storage_message(operation: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::StorageUnavailable {
            operation: operation.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, CoreError::StorageUnavailable { .. })
    }
}

/// Severity level for errors during import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Record skipped, nothing wrong with the input itself (e.g. duplicate code)
    Warning,
    /// Record could not be understood or classified
    Error,
    /// Import cannot continue
    Fatal,
}

/// Individual error entry in an import report
#[derive(Debug, Clone)]
pub struct ImportError {
    /// 1-based line number in the source file (0 when not line specific)
    pub line: usize,
    pub message: String,
    pub severity: ErrorSeverity,
    /// Actionable suggestion for user (optional)
    pub suggestion: Option<String>,
}

impl ImportError {
    pub fn warning(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            severity: ErrorSeverity::Warning,
            suggestion: None,
        }
    }

    pub fn error(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            severity: ErrorSeverity::Error,
            suggestion: None,
        }
    }

    pub fn fatal(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            severity: ErrorSeverity::Fatal,
            suggestion: None,
        }
    }

    /// Add an actionable suggestion to this error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Create user-friendly error from CoreError with context-aware suggestions
    pub fn from_core_error(line: usize, error: &CoreError) -> Self {
        let (severity, suggestion) = match error {
            CoreError::UnsupportedRecordKind { .. } => (
                ErrorSeverity::Error,
                Some(format!(
                    "Use one of the supported kinds: {}",
                    smstat_types::Record::KINDS.join(", ")
                )),
            ),
            CoreError::InvalidRecord { kind, .. } => (
                ErrorSeverity::Error,
                Some(format!("Check the required fields of a {} record", kind)),
            ),
            CoreError::AmbiguousCountryMatch { .. } => (
                ErrorSeverity::Error,
                Some("Use --match-policy first_match or longest_prefix".to_string()),
            ),
            CoreError::StorageUnavailable { .. } => (
                ErrorSeverity::Fatal,
                Some("Check that the database file is writable".to_string()),
            ),
            _ => (ErrorSeverity::Error, None),
        };

        Self {
            line,
            message: error.to_string(),
            severity,
            suggestion,
        }
    }
}

/// Report of a JSONL import
///
/// Tracks per-line failures instead of failing the whole import.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub errors: Vec<ImportError>,
    /// Non-blank lines read
    pub records_read: usize,
    pub fees_stored: usize,
    pub messages_stored: usize,
    /// Records the store declined (e.g. duplicate country code)
    pub rejected: usize,
}

impl ImportReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: ImportError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, line: usize, message: impl Into<String>) {
        self.errors.push(ImportError::warning(line, message));
    }

    pub fn add_fatal(&mut self, line: usize, message: impl Into<String>) {
        self.errors.push(ImportError::fatal(line, message));
    }

    /// Returns true if there are any fatal errors
    pub fn has_fatal_errors(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.severity == ErrorSeverity::Fatal)
    }

    /// Returns count by severity
    pub fn error_count(&self) -> (usize, usize, usize) {
        let count = |severity: ErrorSeverity| self.errors.iter().filter(|e| e.severity == severity).count();
        (
            count(ErrorSeverity::Warning),
            count(ErrorSeverity::Error),
            count(ErrorSeverity::Fatal),
        )
    }

    /// Records successfully stored
    pub fn stored(&self) -> usize {
        self.fees_stored + self.messages_stored
    }
}

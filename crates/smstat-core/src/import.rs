//! JSONL import
//!
//! One `kind`-tagged record per line:
//!
//! ```text
//! {"kind":"country_fee","countryCode":"1","country":"USA","fee":"0.10"}
//! {"kind":"sms","sender":"alice","recipient":"15551234567","text":"hi"}
//! ```
//!
//! Lines are saved in file order, so a fee defined earlier in the file is
//! visible to the messages that follow it. Bad lines are reported and
//! skipped; a storage failure stops the import.

use smstat_types::Record;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{CoreError, ImportError, ImportReport};
use crate::service::{parse_record, SmsService};

/// Import every record of a JSONL file through `service`
///
/// Returns `Err` only when the file itself cannot be opened; everything else
/// ends up in the report.
pub fn import_jsonl(service: &SmsService, path: &Path) -> Result<ImportReport, CoreError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CoreError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            CoreError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let mut report = ImportReport::new();

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line_number = index + 1;
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                let err = CoreError::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                };
                report.add_fatal(line_number, err.to_string());
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }
        report.records_read += 1;

        let record = match decode_line(&line, path, line_number) {
            Ok(record) => record,
            Err(e) => {
                report.add_error(ImportError::from_core_error(line_number, &e));
                continue;
            }
        };
        let kind = record.kind();

        match service.save_entity(record) {
            Ok(true) if kind == "country_fee" => report.fees_stored += 1,
            Ok(true) => report.messages_stored += 1,
            Ok(false) => {
                report.rejected += 1;
                report.add_warning(line_number, "Country code already registered, record skipped");
            }
            Err(e) => {
                let error = ImportError::from_core_error(line_number, &e);
                report.add_error(error);
                if e.is_storage_unavailable() {
                    warn!(?path, line = line_number, error = %e, "Import aborted");
                    break;
                }
            }
        }
    }

    debug!(
        ?path,
        read = report.records_read,
        stored = report.stored(),
        errors = report.errors.len(),
        "JSONL import finished"
    );
    Ok(report)
}

fn decode_line(line: &str, path: &Path, line_number: usize) -> Result<Record, CoreError> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| CoreError::JsonlParse {
            path: path.to_path_buf(),
            line_number,
            message: e.to_string(),
        })?;
    parse_record(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorSeverity;
    use crate::store::MemoryStore;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn jsonl(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_import_mixed_file() {
        let file = jsonl(&[
            r#"{"kind":"country_fee","countryCode":"1","country":"USA","fee":"0.10"}"#,
            "",
            r#"{"kind":"sms","sender":"alice","recipient":"15551234567","text":"hi"}"#,
            r#"{"kind":"sms","sender":"bob","recipient":"447700900000"}"#,
            r#"{"kind":"country_fee","countryCode":"1","country":"USA again","fee":"0.20"}"#,
            r#"{"kind":"mms","sender":"carol"}"#,
            "not json",
        ]);

        let service = SmsService::with_defaults(Arc::new(MemoryStore::new()));
        let report = import_jsonl(&service, file.path()).unwrap();

        assert_eq!(report.records_read, 6);
        assert_eq!(report.fees_stored, 1);
        assert_eq!(report.messages_stored, 2);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.error_count(), (1, 2, 0));
        assert!(!report.has_fatal_errors());

        let unsupported = report
            .errors
            .iter()
            .find(|e| e.line == 6)
            .unwrap();
        assert_eq!(unsupported.severity, ErrorSeverity::Error);
        assert!(unsupported.suggestion.is_some());

        let totals = service.totals().unwrap();
        assert_eq!(totals.billable, 1);
        assert_eq!(totals.messages, 2);
    }

    #[test]
    fn test_import_missing_file() {
        let service = SmsService::with_defaults(Arc::new(MemoryStore::new()));
        let err = import_jsonl(&service, Path::new("/nonexistent/smstat.jsonl")).unwrap_err();
        assert!(matches!(err, CoreError::FileNotFound { .. }));
    }
}

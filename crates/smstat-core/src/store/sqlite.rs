//! SQLite record store
//!
//! Schema:
//! - country_fee: one row per country code, `id` gives registration order
//! - sms: classified messages, `id` gives insertion order
//! - store_metadata: schema version
//!
//! Fees are stored as decimal text so no precision is lost on the way
//! through SQLite's REAL type. Snapshots read both tables inside one
//! transaction.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use smstat_types::{CountryFee, Sms, SmsRecord};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::{RecordStore, Snapshot};
use crate::classifier::Classified;
use crate::error::CoreError;

/// Current schema version
///
/// Version History:
/// - v1: country_fee + sms tables
/// - v2: sms.sent_at column, fee stored as TEXT
const SCHEMA_VERSION: i32 = 2;

/// SQLite-backed store (thread-safe)
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Create or open the database at `path`
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CoreError::storage_message(
                    "open",
                    format!("failed to create directory {}: {}", parent.display(), e),
                )
            })?;
        }

        let conn = Connection::open(path).map_err(|e| CoreError::storage("open", e))?;

        // WAL lets readers run while a writer appends
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| CoreError::storage("enable WAL", e))?;

        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Private database that disappears with the store
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(|e| CoreError::storage("open", e))?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, CoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS store_metadata (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS country_fee (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                country_code TEXT NOT NULL UNIQUE,
                country TEXT NOT NULL,
                fee TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sender TEXT NOT NULL,
                recipient TEXT NOT NULL,
                text TEXT NOT NULL,
                sent_at TEXT NOT NULL,
                country_code TEXT,
                billable INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sms_sender ON sms(sender);
            CREATE INDEX IF NOT EXISTS idx_sms_country_code ON sms(country_code);
            "#,
        )
        .map_err(|e| CoreError::storage("create schema", e))?;

        let stored_version: Option<i32> = conn
            .query_row(
                "SELECT value FROM store_metadata WHERE key = 'version'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| CoreError::storage("query schema version", e))?;

        match stored_version {
            None => {
                conn.execute(
                    "INSERT INTO store_metadata (key, value) VALUES ('version', ?1)",
                    params![SCHEMA_VERSION],
                )
                .map_err(|e| CoreError::storage("initialize schema version", e))?;
                debug!("Schema version initialized to {}", SCHEMA_VERSION);
            }
            Some(v) if v != SCHEMA_VERSION => {
                // Mismatched databases are refused, never cleared
                return Err(CoreError::storage_message(
                    "open",
                    format!(
                        "database schema version {} does not match supported version {}",
                        v, SCHEMA_VERSION
                    ),
                ));
            }
            Some(_) => {
                debug!("Schema version {} matches current", SCHEMA_VERSION);
            }
        }

        if let Some(ref p) = path {
            debug!(path = %p.display(), "SQLite store opened");
        }

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    fn lock(&self, operation: &str) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.conn.lock().map_err(|e| {
            CoreError::storage_message(operation, format!("connection lock poisoned: {}", e))
        })
    }
}

impl RecordStore for SqliteStore {
    fn create(&self, record: &Classified) -> Result<bool, CoreError> {
        let conn = self.lock("create")?;

        match record {
            Classified::CountryFee(fee) => {
                let inserted = conn
                    .execute(
                        "INSERT OR IGNORE INTO country_fee (country_code, country, fee) VALUES (?1, ?2, ?3)",
                        params![fee.country_code, fee.country, fee.fee.to_string()],
                    )
                    .map_err(|e| CoreError::storage("create country fee", e))?;

                if inserted == 0 {
                    debug!(country_code = %fee.country_code, "country code already registered");
                }
                Ok(inserted == 1)
            }
            Classified::Sms(record) => {
                conn.execute(
                    r#"INSERT INTO sms (sender, recipient, text, sent_at, country_code, billable)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                    params![
                        record.sms.sender,
                        record.sms.recipient,
                        record.sms.text,
                        record.sms.sent_at.to_rfc3339(),
                        record.country_code,
                        record.billable,
                    ],
                )
                .map_err(|e| CoreError::storage("create sms", e))?;
                Ok(true)
            }
        }
    }

    fn country_fees(&self) -> Result<Vec<CountryFee>, CoreError> {
        let conn = self.lock("country fees")?;
        load_country_fees(&conn)
    }

    fn snapshot(&self) -> Result<Snapshot, CoreError> {
        let mut conn = self.lock("snapshot")?;
        let tx = conn
            .transaction()
            .map_err(|e| CoreError::storage("begin snapshot", e))?;

        let fees = load_country_fees(&tx)?;
        let messages = load_messages(&tx)?;

        tx.commit()
            .map_err(|e| CoreError::storage("end snapshot", e))?;

        debug!(
            fees = fees.len(),
            messages = messages.len(),
            "snapshot loaded"
        );

        Ok(Snapshot::new(fees, messages))
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

fn load_country_fees(conn: &Connection) -> Result<Vec<CountryFee>, CoreError> {
    let mut stmt = conn
        .prepare("SELECT country_code, country, fee FROM country_fee ORDER BY id")
        .map_err(|e| CoreError::storage("read country fees", e))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .map_err(|e| CoreError::storage("read country fees", e))?;

    let mut fees = Vec::new();
    for row in rows {
        let (country_code, country, fee) =
            row.map_err(|e| CoreError::storage("read country fees", e))?;
        let fee = Decimal::from_str(&fee).map_err(|e| {
            CoreError::storage_message(
                "read country fees",
                format!("corrupt fee '{}' for country code {}: {}", fee, country_code, e),
            )
        })?;
        fees.push(CountryFee {
            country_code,
            country,
            fee,
        });
    }
    Ok(fees)
}

fn load_messages(conn: &Connection) -> Result<Vec<SmsRecord>, CoreError> {
    let mut stmt = conn
        .prepare(
            "SELECT sender, recipient, text, sent_at, country_code, billable FROM sms ORDER BY id",
        )
        .map_err(|e| CoreError::storage("read sms", e))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, bool>(5)?,
            ))
        })
        .map_err(|e| CoreError::storage("read sms", e))?;

    let mut messages = Vec::new();
    for row in rows {
        let (sender, recipient, text, sent_at, country_code, billable) =
            row.map_err(|e| CoreError::storage("read sms", e))?;
        let sent_at = DateTime::parse_from_rfc3339(&sent_at)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| {
                CoreError::storage_message(
                    "read sms",
                    format!("corrupt timestamp '{}': {}", sent_at, e),
                )
            })?;
        messages.push(SmsRecord {
            sms: Sms {
                sender,
                recipient,
                text,
                sent_at,
            },
            country_code,
            billable,
        });
    }
    Ok(messages)
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        if self.path.is_none() {
            return;
        }
        // Fold the WAL back into the main file so it doesn't grow across runs
        if let Ok(conn) = self.conn.lock() {
            match conn.pragma_update(None, "wal_checkpoint", "TRUNCATE") {
                Ok(()) => debug!("WAL checkpoint completed on SqliteStore drop"),
                Err(e) => debug!(error = %e, "WAL checkpoint failed on SqliteStore drop"),
            }
        }
    }
}

//! SMS service
//!
//! Facade used by the command front end: save records, toggle the output
//! mode, run the two statistics queries. Options live in a context object
//! guarded by `parking_lot::RwLock` and are read once per call, so a query
//! never mixes two output modes.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use smstat_types::{Record, StatsRow};
use std::sync::Arc;
use tracing::debug;

use crate::classifier::{classify, MatchPolicy};
use crate::error::CoreError;
use crate::registry::CountryFeeRegistry;
use crate::stats::{self, OutputMode, Totals};
use crate::store::RecordStore;

/// Query and classification options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceOptions {
    pub output_mode: OutputMode,
    pub match_policy: MatchPolicy,
}

/// Front-end facing service over a record store
pub struct SmsService {
    store: Arc<dyn RecordStore>,
    options: RwLock<ServiceOptions>,
}

impl SmsService {
    pub fn new(store: Arc<dyn RecordStore>, options: ServiceOptions) -> Self {
        Self {
            store,
            options: RwLock::new(options),
        }
    }

    /// Service with default options (counts only, first-match)
    pub fn with_defaults(store: Arc<dyn RecordStore>) -> Self {
        Self::new(store, ServiceOptions::default())
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    // ===================
    // Output mode
    // ===================

    /// Include fee totals in top senders results
    pub fn set_country_fee_enabled(&self, enabled: bool) {
        self.options.write().output_mode = OutputMode::from_enabled(enabled);
        debug!(enabled, "country fee output toggled");
    }

    pub fn is_country_fee_enabled(&self) -> bool {
        self.options.read().output_mode.is_enriched()
    }

    pub fn set_match_policy(&self, policy: MatchPolicy) {
        self.options.write().match_policy = policy;
    }

    pub fn match_policy(&self) -> MatchPolicy {
        self.options.read().match_policy
    }

    // ===================
    // Writes
    // ===================

    /// Classify and persist a record
    ///
    /// `Ok(false)` means the store declined it (duplicate country code).
    pub fn save_entity(&self, record: Record) -> Result<bool, CoreError> {
        let policy = self.match_policy();

        // Fee definitions don't need the registry
        let registry = match record {
            Record::Sms(_) => CountryFeeRegistry::from_fees(self.store.country_fees()?),
            Record::CountryFee(_) => CountryFeeRegistry::new(),
        };

        let classified = classify(record, &registry, policy)?;
        let kind = classified.kind();
        let created = self.store.create(&classified)?;

        debug!(kind, created, backend = self.store.backend(), "record saved");
        Ok(created)
    }

    /// Save an untyped JSON record tagged with `kind`
    pub fn save_value(&self, value: serde_json::Value) -> Result<bool, CoreError> {
        let record = parse_record(value)?;
        self.save_entity(record)
    }

    // ===================
    // Queries
    // ===================

    /// Top `limit` senders by message count; fee totals when enabled
    pub fn top_senders_stats(&self, limit: i64) -> Result<Vec<StatsRow>, CoreError> {
        let mode = self.options.read().output_mode;
        if limit <= 0 {
            return Ok(Vec::new());
        }
        let snapshot = self.store.snapshot()?;
        stats::top_senders(&snapshot, limit, mode)
    }

    /// Per-country message count and fee total
    ///
    /// `FeeOverflow` when a total cannot be represented; no rows are returned.
    pub fn country_fee_stats(&self) -> Result<Vec<StatsRow>, CoreError> {
        let snapshot = self.store.snapshot()?;
        stats::country_fee_stats(&snapshot)
    }

    /// Whole-store summary
    pub fn totals(&self) -> Result<Totals, CoreError> {
        let snapshot = self.store.snapshot()?;
        stats::totals(&snapshot)
    }
}

/// Decode a `kind`-tagged JSON value into a [`Record`]
///
/// Unknown or missing kinds are `UnsupportedRecordKind`; a known kind with
/// bad fields is `InvalidRecord`.
pub fn parse_record(value: serde_json::Value) -> Result<Record, CoreError> {
    let kind = match value.get("kind") {
        Some(serde_json::Value::String(kind)) => kind.clone(),
        Some(other) => other.to_string(),
        None => "<missing>".to_string(),
    };

    if !Record::KINDS.contains(&kind.as_str()) {
        return Err(CoreError::UnsupportedRecordKind { kind });
    }

    serde_json::from_value(value).map_err(|e| CoreError::InvalidRecord {
        kind,
        message: e.to_string(),
        source: e,
    })
}

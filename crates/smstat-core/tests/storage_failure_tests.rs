//! Behavior when the record store cannot be reached

use rust_decimal_macros::dec;
use smstat_core::error::ErrorSeverity;
use smstat_core::{
    import_jsonl, Classified, CoreError, CountryFee, RecordStore, Sms, SmsService, Snapshot,
};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Store that fails every call once `down` is set
#[derive(Default)]
struct FlakyStore {
    down: AtomicBool,
    inner: smstat_core::MemoryStore,
}

impl FlakyStore {
    fn check(&self, operation: &str) -> Result<(), CoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(CoreError::storage_message(operation, "connection refused"));
        }
        Ok(())
    }
}

impl RecordStore for FlakyStore {
    fn create(&self, record: &Classified) -> Result<bool, CoreError> {
        self.check("create")?;
        self.inner.create(record)
    }

    fn country_fees(&self) -> Result<Vec<CountryFee>, CoreError> {
        self.check("country_fees")?;
        self.inner.country_fees()
    }

    fn snapshot(&self) -> Result<Snapshot, CoreError> {
        self.check("snapshot")?;
        self.inner.snapshot()
    }

    fn backend(&self) -> &'static str {
        "flaky"
    }
}

fn service() -> (Arc<FlakyStore>, SmsService) {
    let store = Arc::new(FlakyStore::default());
    let service = SmsService::with_defaults(store.clone());
    (store, service)
}

#[test]
fn test_queries_fail_without_partial_results() {
    let (store, service) = service();
    service
        .save_entity(CountryFee::new("1", "USA", dec!(0.10)).into())
        .unwrap();
    service
        .save_entity(Sms::new("alice", "15551234567", "").into())
        .unwrap();

    store.down.store(true, Ordering::SeqCst);

    let err = service.top_senders_stats(5).unwrap_err();
    assert!(err.is_storage_unavailable());
    let err = service.country_fee_stats().unwrap_err();
    assert!(err.is_storage_unavailable());
    assert!(service.totals().is_err());

    store.down.store(false, Ordering::SeqCst);
    assert_eq!(service.top_senders_stats(5).unwrap().len(), 1);
}

#[test]
fn test_save_fails_when_store_down() {
    let (store, service) = service();
    store.down.store(true, Ordering::SeqCst);

    let err = service
        .save_entity(Sms::new("alice", "15551234567", "").into())
        .unwrap_err();
    assert!(matches!(err, CoreError::StorageUnavailable { .. }));

    store.down.store(false, Ordering::SeqCst);
    assert!(service.top_senders_stats(5).unwrap().is_empty());
}

#[test]
fn test_import_stops_on_storage_failure() {
    let (store, service) = service();
    store.down.store(true, Ordering::SeqCst);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"kind":"sms","sender":"alice","recipient":"1"}}"#).unwrap();
    writeln!(file, r#"{{"kind":"sms","sender":"bob","recipient":"1"}}"#).unwrap();

    let report = import_jsonl(&service, file.path()).unwrap();
    assert!(report.has_fatal_errors());
    assert_eq!(report.records_read, 1);
    assert_eq!(report.stored(), 0);
    assert_eq!(report.errors[0].severity, ErrorSeverity::Fatal);
}

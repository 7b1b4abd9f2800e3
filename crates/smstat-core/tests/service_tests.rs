//! End-to-end tests for SmsService over both record stores

use rust_decimal_macros::dec;
use smstat_core::{
    CoreError, CountryFee, MatchPolicy, MemoryStore, Record, RecordStore, Sms, SmsService,
    SqliteStore, StatsRow,
};
use std::sync::Arc;
use tempfile::TempDir;

fn memory_service() -> SmsService {
    SmsService::with_defaults(Arc::new(MemoryStore::new()))
}

fn sqlite_service(dir: &TempDir) -> SmsService {
    let store = SqliteStore::open(&dir.path().join("smstat.db")).unwrap();
    SmsService::with_defaults(Arc::new(store))
}

/// Run a check against a fresh service on every backend
fn each_backend(check: impl Fn(&SmsService)) {
    check(&memory_service());

    let dir = TempDir::new().unwrap();
    check(&sqlite_service(&dir));
}

fn fee(code: &str, country: &str, fee: rust_decimal::Decimal) -> Record {
    CountryFee::new(code, country, fee).into()
}

fn sms(sender: &str, recipient: &str) -> Record {
    Sms::new(sender, recipient, "hello").into()
}

#[test]
fn test_reference_scenario() {
    each_backend(|service| {
        service.save_entity(fee("1", "USA", dec!(0.10))).unwrap();
        service.save_entity(sms("alice", "15551234567")).unwrap();
        service.save_entity(sms("bob", "447700900000")).unwrap();

        assert_eq!(
            service.top_senders_stats(5).unwrap(),
            vec![StatsRow::count("alice", 1), StatsRow::count("bob", 1)]
        );
        assert_eq!(
            service.country_fee_stats().unwrap(),
            vec![StatsRow::with_fee("USA", 1, dec!(0.10))]
        );

        service.set_country_fee_enabled(true);
        assert_eq!(
            service.top_senders_stats(5).unwrap(),
            vec![
                StatsRow::with_fee("alice", 1, dec!(0.10)),
                StatsRow::with_fee("bob", 1, dec!(0)),
            ]
        );
    });
}

#[test]
fn test_country_rows_match_registry() {
    each_backend(|service| {
        service.save_entity(fee("44", "UK", dec!(0.07))).unwrap();
        service.save_entity(fee("1", "USA", dec!(0.10))).unwrap();
        service.save_entity(fee("33", "France", dec!(0.09))).unwrap();
        for recipient in ["447700900001", "447700900002", "15550000000"] {
            service.save_entity(sms("carol", recipient)).unwrap();
        }

        let rows = service.country_fee_stats().unwrap();
        let labels: Vec<_> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["France", "UK", "USA"]);

        // total = count x fee for every row
        let fees = [dec!(0.09), dec!(0.07), dec!(0.10)];
        for (row, fee) in rows.iter().zip(fees) {
            assert_eq!(row.total_fee, Some(fee * rust_decimal::Decimal::from(row.count)));
        }

        let counted: u64 = rows.iter().map(|r| r.count).sum();
        assert_eq!(counted, service.totals().unwrap().billable);
    });
}

#[test]
fn test_first_match_uses_registration_order() {
    each_backend(|service| {
        service.save_entity(fee("1", "USA", dec!(0.10))).unwrap();
        service.save_entity(fee("1473", "Grenada", dec!(0.25))).unwrap();
        service.save_entity(sms("alice", "14735550000")).unwrap();

        let rows = service.country_fee_stats().unwrap();
        assert_eq!(
            rows,
            vec![
                StatsRow::with_fee("Grenada", 0, dec!(0)),
                StatsRow::with_fee("USA", 1, dec!(0.10)),
            ]
        );
    });
}

#[test]
fn test_longest_prefix_policy() {
    each_backend(|service| {
        service.set_match_policy(MatchPolicy::LongestPrefix);
        service.save_entity(fee("1", "USA", dec!(0.10))).unwrap();
        service.save_entity(fee("1473", "Grenada", dec!(0.25))).unwrap();
        service.save_entity(sms("alice", "14735550000")).unwrap();

        let rows = service.country_fee_stats().unwrap();
        assert_eq!(rows[0], StatsRow::with_fee("Grenada", 1, dec!(0.25)));
        assert_eq!(rows[1], StatsRow::with_fee("USA", 0, dec!(0)));
    });
}

#[test]
fn test_strict_policy_stores_nothing_on_ambiguity() {
    each_backend(|service| {
        service.set_match_policy(MatchPolicy::Strict);
        service.save_entity(fee("1", "USA", dec!(0.10))).unwrap();
        service.save_entity(fee("1473", "Grenada", dec!(0.25))).unwrap();

        let err = service.save_entity(sms("alice", "14735550000")).unwrap_err();
        assert!(matches!(err, CoreError::AmbiguousCountryMatch { .. }));
        assert!(service.top_senders_stats(5).unwrap().is_empty());

        // Unambiguous recipients still classify
        assert!(service.save_entity(sms("bob", "15550000000")).unwrap());
    });
}

#[test]
fn test_duplicate_country_code_rejected() {
    each_backend(|service| {
        assert!(service.save_entity(fee("1", "USA", dec!(0.10))).unwrap());
        assert!(!service.save_entity(fee("1", "United States", dec!(0.50))).unwrap());

        assert_eq!(
            service.country_fee_stats().unwrap(),
            vec![StatsRow::with_fee("USA", 0, dec!(0))]
        );
    });
}

#[test]
fn test_invalid_country_fee_rejected() {
    each_backend(|service| {
        let err = service.save_entity(fee("", "Nowhere", dec!(0.10))).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCountryFee { .. }));

        let err = service.save_entity(fee("1", "USA", dec!(-0.10))).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCountryFee { .. }));

        assert!(service.country_fee_stats().unwrap().is_empty());
    });
}

#[test]
fn test_top_senders_limit_edges() {
    each_backend(|service| {
        for (sender, times) in [("carol", 3), ("dave", 2), ("alice", 1), ("bob", 1)] {
            for _ in 0..times {
                service.save_entity(sms(sender, "000")).unwrap();
            }
        }

        let rows = service.top_senders_stats(3).unwrap();
        assert_eq!(
            rows,
            vec![
                StatsRow::count("carol", 3),
                StatsRow::count("dave", 2),
                StatsRow::count("alice", 1),
            ]
        );
        assert_eq!(service.top_senders_stats(50).unwrap().len(), 4);
        assert!(service.top_senders_stats(0).unwrap().is_empty());
        assert!(service.top_senders_stats(-1).unwrap().is_empty());
    });
}

#[test]
fn test_sqlite_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let service = sqlite_service(&dir);
        service.save_entity(fee("1", "USA", dec!(0.10))).unwrap();
        service.save_entity(sms("alice", "15551234567")).unwrap();
    }

    let service = sqlite_service(&dir);
    assert_eq!(
        service.country_fee_stats().unwrap(),
        vec![StatsRow::with_fee("USA", 1, dec!(0.10))]
    );
    assert_eq!(service.store().backend(), "sqlite");
}

#[test]
fn test_concurrent_saves_and_queries() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let service = Arc::new(SmsService::with_defaults(store));
    service.save_entity(fee("1", "USA", dec!(0.10))).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|i| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || {
                for _ in 0..25 {
                    service
                        .save_entity(sms(&format!("sender-{}", i), "15550000000"))
                        .unwrap();
                    let rows = service.country_fee_stats().unwrap();
                    assert_eq!(rows.len(), 1);
                }
            })
        })
        .collect();

    for handle in writers {
        handle.join().unwrap();
    }

    let rows = service.country_fee_stats().unwrap();
    assert_eq!(rows, vec![StatsRow::with_fee("USA", 100, dec!(10.00))]);
    assert_eq!(service.top_senders_stats(10).unwrap().len(), 4);
}

#[test]
fn test_fee_overflow_fails_queries_without_panicking() {
    each_backend(|service| {
        service
            .save_entity(fee("1", "USA", rust_decimal::Decimal::MAX))
            .unwrap();
        service.save_entity(sms("alice", "15551234567")).unwrap();
        service.save_entity(sms("alice", "15557654321")).unwrap();

        let err = service.country_fee_stats().unwrap_err();
        assert!(matches!(err, CoreError::FeeOverflow { .. }));
        assert!(service.totals().is_err());

        // Count-only output is still available
        assert_eq!(
            service.top_senders_stats(5).unwrap(),
            vec![StatsRow::count("alice", 2)]
        );

        service.set_country_fee_enabled(true);
        let err = service.top_senders_stats(5).unwrap_err();
        assert!(matches!(err, CoreError::FeeOverflow { .. }));
    });
}

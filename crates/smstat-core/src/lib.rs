//! smstat-core - Core library for smstat
//!
//! Classifies inbound SMS and country fee records, persists them through a
//! pluggable record store and computes sender and country statistics.

pub mod classifier;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod registry;
pub mod service;
pub mod stats;
pub mod store;

pub use classifier::{classify, Classified, MatchPolicy};
pub use config::Config;
pub use error::{CoreError, ImportError, ImportReport};
pub use export::{export_stats_to_csv, export_stats_to_json};
pub use import::import_jsonl;
pub use registry::CountryFeeRegistry;
pub use service::{ServiceOptions, SmsService};
pub use stats::{country_fee_stats, top_senders, OutputMode};
pub use store::{MemoryStore, RecordStore, Snapshot, SqliteStore};

pub use smstat_types::{CountryFee, Record, Sms, SmsRecord, StatsRow};

//! smstat-types - Shared data types for smstat
//!
//! This crate contains pure data structures without heavy dependencies.
//! No storage engine, no I/O - just serde-serializable types.
//!
//! Used by:
//! - smstat-core (classification, storage, statistics)
//! - smstat (command line front end)

pub mod models;

pub use models::{CountryFee, Record, Sms, SmsRecord, StatsRow};

//! Record storage
//!
//! The statistics engine only needs three things from storage: create a
//! classified record, list the country fees in registration order, and read
//! fees and messages together as one consistent snapshot.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use smstat_types::{CountryFee, SmsRecord};

use crate::classifier::Classified;
use crate::error::CoreError;
use crate::registry::CountryFeeRegistry;

/// Point-in-time view of everything persisted
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub registry: CountryFeeRegistry,
    /// Messages in insertion order
    pub messages: Vec<SmsRecord>,
}

impl Snapshot {
    pub fn new(fees: Vec<CountryFee>, messages: Vec<SmsRecord>) -> Self {
        Self {
            registry: CountryFeeRegistry::from_fees(fees),
            messages,
        }
    }
}

/// Storage collaborator
///
/// Implementations must make a created record fully visible to later
/// snapshots or not at all.
pub trait RecordStore: Send + Sync {
    /// Persist a classified record.
    ///
    /// Returns `Ok(false)` for ordinary conflicts (a country code that is
    /// already registered) and `Err(StorageUnavailable)` when the backend
    /// cannot be reached.
    fn create(&self, record: &Classified) -> Result<bool, CoreError>;

    /// Registered country fees in registration order
    fn country_fees(&self) -> Result<Vec<CountryFee>, CoreError>;

    /// Fees and messages read together
    fn snapshot(&self) -> Result<Snapshot, CoreError>;

    /// Short backend name for diagnostics
    fn backend(&self) -> &'static str;
}

//! In-memory record store with parking_lot::RwLock
//!
//! Fees and messages live behind one lock so a snapshot can never observe a
//! message without the fee it references.

use parking_lot::RwLock;
use smstat_types::{CountryFee, SmsRecord};
use tracing::debug;

use super::{RecordStore, Snapshot};
use crate::classifier::Classified;
use crate::error::CoreError;
use crate::registry::CountryFeeRegistry;

#[derive(Debug, Default)]
struct Inner {
    registry: CountryFeeRegistry,
    messages: Vec<SmsRecord>,
}

/// Process-local store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn create(&self, record: &Classified) -> Result<bool, CoreError> {
        let mut inner = self.inner.write();
        match record {
            Classified::CountryFee(fee) => {
                let created = inner.registry.insert(fee.clone());
                if !created {
                    debug!(country_code = %fee.country_code, "country code already registered");
                }
                Ok(created)
            }
            Classified::Sms(sms) => {
                inner.messages.push(sms.clone());
                Ok(true)
            }
        }
    }

    fn country_fees(&self) -> Result<Vec<CountryFee>, CoreError> {
        Ok(self.inner.read().registry.iter().cloned().collect())
    }

    fn snapshot(&self) -> Result<Snapshot, CoreError> {
        let inner = self.inner.read();
        Ok(Snapshot {
            registry: inner.registry.clone(),
            messages: inner.messages.clone(),
        })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

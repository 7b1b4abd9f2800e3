//! Country fee definition
//!
//! A country fee maps a dialing-code prefix to a flat per-message fee.
//! Codes are kept as strings and compared as prefixes, never parsed as
//! integers: "1" and "1473" are distinct codes and both match "1473555...".

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-country fee schedule entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryFee {
    /// Dialing-code prefix (e.g. "1", "44", "1473"). Unique per registry.
    pub country_code: String,

    /// Human readable country name
    pub country: String,

    /// Fee charged per delivered message
    pub fee: Decimal,
}

impl CountryFee {
    pub fn new(country_code: impl Into<String>, country: impl Into<String>, fee: Decimal) -> Self {
        Self {
            country_code: country_code.into(),
            country: country.into(),
            fee,
        }
    }

    /// True when this code is a string prefix of `recipient`
    pub fn matches(&self, recipient: &str) -> bool {
        recipient.starts_with(self.country_code.as_str())
    }
}

//! Inbound record sum type

use serde::{Deserialize, Serialize};

use super::{CountryFee, Sms};

/// Everything that can be fed into the system
///
/// Serialized with an explicit `kind` tag:
/// `{"kind":"country_fee","countryCode":"1",...}` or `{"kind":"sms",...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    CountryFee(CountryFee),
    Sms(Sms),
}

impl Record {
    /// Tag values accepted in serialized input
    pub const KINDS: [&'static str; 2] = ["country_fee", "sms"];

    pub fn kind(&self) -> &'static str {
        match self {
            Record::CountryFee(_) => "country_fee",
            Record::Sms(_) => "sms",
        }
    }
}

impl From<CountryFee> for Record {
    fn from(fee: CountryFee) -> Self {
        Record::CountryFee(fee)
    }
}

impl From<Sms> for Record {
    fn from(sms: Sms) -> Self {
        Record::Sms(sms)
    }
}

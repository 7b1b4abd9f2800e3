//! Data models for smstat

pub mod country_fee;
pub mod record;
pub mod sms;
pub mod stats;

pub use country_fee::CountryFee;
pub use record::Record;
pub use sms::{Sms, SmsRecord};
pub use stats::StatsRow;

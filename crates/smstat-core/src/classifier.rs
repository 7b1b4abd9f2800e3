//! Record classification
//!
//! Turns an inbound [`Record`] into something the store can persist. Country
//! fees pass through unchanged (after validation); SMS are resolved against a
//! registry snapshot and marked billable when a country code matches.
//!
//! Classification performs no I/O. The caller fetches the registry snapshot.

use serde::{Deserialize, Serialize};
use smstat_types::{CountryFee, Record, Sms, SmsRecord};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::registry::CountryFeeRegistry;

/// How a recipient number is resolved when several country codes match
///
/// `FirstMatch` walks the registry in registration order and takes the first
/// code that prefixes the recipient, even if a longer code would also match
/// ("1" registered before "1473" wins for "1473..."). It is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    #[default]
    FirstMatch,
    /// Most specific code wins; ties go to the earlier registration
    LongestPrefix,
    /// More than one candidate is an `AmbiguousCountryMatch` error
    Strict,
}

impl MatchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPolicy::FirstMatch => "first_match",
            MatchPolicy::LongestPrefix => "longest_prefix",
            MatchPolicy::Strict => "strict",
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "first_match" | "first" => Ok(MatchPolicy::FirstMatch),
            "longest_prefix" | "longest" => Ok(MatchPolicy::LongestPrefix),
            "strict" => Ok(MatchPolicy::Strict),
            other => Err(CoreError::InvalidConfig {
                message: format!(
                    "unknown match policy '{}' (expected first_match, longest_prefix or strict)",
                    other
                ),
            }),
        }
    }
}

/// A record ready to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// Fee definition, stored as-is
    CountryFee(CountryFee),
    /// Enriched message
    Sms(SmsRecord),
}

impl Classified {
    pub fn kind(&self) -> &'static str {
        match self {
            Classified::CountryFee(_) => "country_fee",
            Classified::Sms(_) => "sms",
        }
    }
}

/// Classify an inbound record against a registry snapshot
pub fn classify(
    record: Record,
    registry: &CountryFeeRegistry,
    policy: MatchPolicy,
) -> Result<Classified, CoreError> {
    match record {
        Record::CountryFee(fee) => {
            validate_country_fee(&fee)?;
            Ok(Classified::CountryFee(fee))
        }
        Record::Sms(sms) => classify_sms(sms, registry, policy).map(Classified::Sms),
    }
}

/// Resolve the country fee for a message and fix its billable flag
pub fn classify_sms(
    sms: Sms,
    registry: &CountryFeeRegistry,
    policy: MatchPolicy,
) -> Result<SmsRecord, CoreError> {
    let matched = resolve(&sms.recipient, registry, policy)?;
    let country_code = matched.map(|fee| fee.country_code.clone());

    tracing::trace!(
        sender = %sms.sender,
        recipient = %sms.recipient,
        country_code = ?country_code,
        %policy,
        "sms classified"
    );

    Ok(SmsRecord {
        billable: country_code.is_some(),
        country_code,
        sms,
    })
}

/// Country fee owning `recipient` under `policy`, if any
pub fn resolve<'r>(
    recipient: &str,
    registry: &'r CountryFeeRegistry,
    policy: MatchPolicy,
) -> Result<Option<&'r CountryFee>, CoreError> {
    match policy {
        MatchPolicy::FirstMatch => Ok(registry.first_match(recipient)),
        MatchPolicy::LongestPrefix => Ok(registry.longest_match(recipient)),
        MatchPolicy::Strict => {
            let candidates = registry.matching(recipient);
            if candidates.len() > 1 {
                return Err(CoreError::AmbiguousCountryMatch {
                    recipient: recipient.to_string(),
                    candidates: candidates
                        .iter()
                        .map(|fee| fee.country_code.clone())
                        .collect(),
                });
            }
            Ok(candidates.into_iter().next())
        }
    }
}

fn validate_country_fee(fee: &CountryFee) -> Result<(), CoreError> {
    let invalid = |reason: &str| CoreError::InvalidCountryFee {
        country_code: fee.country_code.clone(),
        reason: reason.to_string(),
    };

    if fee.country_code.is_empty() {
        return Err(invalid("country code is empty"));
    }
    if !fee.country_code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("country code must contain digits only"));
    }
    if fee.fee.is_sign_negative() && !fee.fee.is_zero() {
        return Err(invalid("fee must not be negative"));
    }
    Ok(())
}

//! Statistics engine
//!
//! Pure functions over a [`Snapshot`]: nothing here touches storage, so the
//! same snapshot always yields the same rows.
//!
//! Ordering rules:
//! - top senders: message count descending, then sender ascending
//! - country stats: country name ascending, then country code ascending

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smstat_types::{CountryFee, SmsRecord, StatsRow};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use crate::error::CoreError;
use crate::store::Snapshot;

/// Shape of the top senders result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// (sender, count)
    #[default]
    Counts,
    /// (sender, count, total fee)
    Enriched,
}

impl OutputMode {
    pub fn from_enabled(country_fee_enabled: bool) -> Self {
        if country_fee_enabled {
            OutputMode::Enriched
        } else {
            OutputMode::Counts
        }
    }

    pub fn is_enriched(&self) -> bool {
        matches!(self, OutputMode::Enriched)
    }
}

/// Aggregate totals over the whole snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub messages: u64,
    pub billable: u64,
    pub senders: usize,
    pub countries: usize,
    pub total_fee: Decimal,
}

/// Top `limit` senders by message volume
///
/// The fee total (enriched mode) sums the fee of the referenced country for
/// billable messages only; it never affects ordering. `limit <= 0` yields an
/// empty list. A total that overflows `Decimal` fails the whole query.
pub fn top_senders(
    snapshot: &Snapshot,
    limit: i64,
    mode: OutputMode,
) -> Result<Vec<StatsRow>, CoreError> {
    if limit <= 0 {
        return Ok(Vec::new());
    }
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);

    let mut by_sender: HashMap<&str, (u64, Decimal)> = HashMap::new();
    for message in &snapshot.messages {
        let (count, total) = by_sender
            .entry(message.sender())
            .or_insert((0, Decimal::ZERO));
        *count += 1;
        if !mode.is_enriched() {
            continue;
        }
        if let Some(fee) = billed_fee(snapshot, message) {
            *total = add_fee(*total, fee.fee, message.sender())?;
        }
    }

    let mut senders: Vec<_> = by_sender.into_iter().collect();
    senders.sort_by_key(|&(sender, (count, _))| (Reverse(count), sender));
    senders.truncate(limit);

    Ok(senders
        .into_iter()
        .map(|(sender, (count, total))| match mode {
            OutputMode::Counts => StatsRow::count(sender, count),
            OutputMode::Enriched => StatsRow::with_fee(sender, count, total),
        })
        .collect())
}

/// One row per registered country: billable message count and `count × fee`
pub fn country_fee_stats(snapshot: &Snapshot) -> Result<Vec<StatsRow>, CoreError> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for code in snapshot.messages.iter().filter_map(|m| m.billed_code()) {
        *counts.entry(code).or_insert(0) += 1;
    }

    let mut countries: Vec<(&CountryFee, u64)> = snapshot
        .registry
        .iter()
        .map(|fee| (fee, counts.get(fee.country_code.as_str()).copied().unwrap_or(0)))
        .collect();
    countries.sort_by(|(a, _), (b, _)| {
        a.country
            .cmp(&b.country)
            .then_with(|| a.country_code.cmp(&b.country_code))
    });

    countries
        .into_iter()
        .map(|(fee, count)| {
            let total = fee
                .fee
                .checked_mul(Decimal::from(count))
                .ok_or_else(|| CoreError::FeeOverflow {
                    label: fee.country.clone(),
                })?;
            Ok(StatsRow::with_fee(fee.country.clone(), count, total))
        })
        .collect()
}

/// Whole-snapshot summary
pub fn totals(snapshot: &Snapshot) -> Result<Totals, CoreError> {
    let mut totals = Totals {
        countries: snapshot.registry.len(),
        ..Totals::default()
    };
    let mut senders: HashSet<&str> = HashSet::new();

    for message in &snapshot.messages {
        totals.messages += 1;
        senders.insert(message.sender());
        if let Some(fee) = billed_fee(snapshot, message) {
            totals.billable += 1;
            totals.total_fee = add_fee(totals.total_fee, fee.fee, "all messages")?;
        }
    }

    totals.senders = senders.len();
    Ok(totals)
}

fn billed_fee<'s>(snapshot: &'s Snapshot, message: &SmsRecord) -> Option<&'s CountryFee> {
    message
        .billed_code()
        .and_then(|code| snapshot.registry.get(code))
}

fn add_fee(total: Decimal, fee: Decimal, label: &str) -> Result<Decimal, CoreError> {
    total.checked_add(fee).ok_or_else(|| CoreError::FeeOverflow {
        label: label.to_string(),
    })
}

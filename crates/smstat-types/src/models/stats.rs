//! Statistics output row

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of a statistics result: sender or country, message count and
/// (depending on the query and output mode) the total fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRow {
    pub label: String,
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_fee: Option<Decimal>,
}

impl StatsRow {
    /// Count-only row
    pub fn count(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
            total_fee: None,
        }
    }

    /// Row with a monetary total
    pub fn with_fee(label: impl Into<String>, count: u64, total_fee: Decimal) -> Self {
        Self {
            label: label.into(),
            count,
            total_fee: Some(total_fee),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_count_row_omits_fee_in_json() {
        let json = serde_json::to_string(&StatsRow::count("alice", 3)).unwrap();
        assert_eq!(json, r#"{"label":"alice","count":3}"#);
    }

    #[test]
    fn test_fee_row_serializes_total() {
        let json = serde_json::to_string(&StatsRow::with_fee("USA", 1, dec!(0.10))).unwrap();
        assert_eq!(json, r#"{"label":"USA","count":1,"totalFee":"0.10"}"#);
    }
}

//! Country fee registry
//!
//! Ordered snapshot of registered country fees. Enumeration order is the
//! order in which fees were registered and is significant: first-match
//! resolution walks the registry in that order.

use smstat_types::CountryFee;
use std::collections::HashMap;

/// Country code -> fee lookup with stable enumeration order
#[derive(Debug, Clone, Default)]
pub struct CountryFeeRegistry {
    fees: Vec<CountryFee>,
    by_code: HashMap<String, usize>,
}

impl CountryFeeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from fees in enumeration order. Later duplicates of a code are dropped.
    pub fn from_fees(fees: impl IntoIterator<Item = CountryFee>) -> Self {
        let mut registry = Self::new();
        for fee in fees {
            registry.insert(fee);
        }
        registry
    }

    /// Register a fee; returns false if the code is already taken
    pub fn insert(&mut self, fee: CountryFee) -> bool {
        if self.by_code.contains_key(&fee.country_code) {
            return false;
        }
        self.by_code
            .insert(fee.country_code.clone(), self.fees.len());
        self.fees.push(fee);
        true
    }

    pub fn get(&self, country_code: &str) -> Option<&CountryFee> {
        self.by_code.get(country_code).map(|&idx| &self.fees[idx])
    }

    /// All fees in enumeration order
    pub fn iter(&self) -> impl Iterator<Item = &CountryFee> {
        self.fees.iter()
    }

    pub fn len(&self) -> usize {
        self.fees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fees.is_empty()
    }

    /// Fees whose code prefixes `recipient`, in enumeration order
    pub fn matching(&self, recipient: &str) -> Vec<&CountryFee> {
        self.fees
            .iter()
            .filter(|fee| fee.matches(recipient))
            .collect()
    }

    /// First registered fee whose code prefixes `recipient`
    pub fn first_match(&self, recipient: &str) -> Option<&CountryFee> {
        self.fees.iter().find(|fee| fee.matches(recipient))
    }

    /// Most specific (longest code) match; ties go to the earlier registration
    pub fn longest_match(&self, recipient: &str) -> Option<&CountryFee> {
        self.fees
            .iter()
            .filter(|fee| fee.matches(recipient))
            .fold(None, |best: Option<&CountryFee>, fee| match best {
                Some(b) if b.country_code.len() >= fee.country_code.len() => Some(b),
                _ => Some(fee),
            })
    }
}

impl FromIterator<CountryFee> for CountryFeeRegistry {
    fn from_iter<I: IntoIterator<Item = CountryFee>>(iter: I) -> Self {
        Self::from_fees(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn registry() -> CountryFeeRegistry {
        CountryFeeRegistry::from_fees([
            CountryFee::new("1", "USA", dec!(0.10)),
            CountryFee::new("44", "UK", dec!(0.07)),
            CountryFee::new("1473", "Grenada", dec!(0.25)),
        ])
    }

    #[test]
    fn test_enumeration_order_preserved() {
        let codes: Vec<_> = registry().iter().map(|f| f.country_code.clone()).collect();
        assert_eq!(codes, vec!["1", "44", "1473"]);
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let mut registry = registry();
        assert!(!registry.insert(CountryFee::new("44", "Other", dec!(1))));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("44").unwrap().country, "UK");
    }

    #[test]
    fn test_first_match_follows_enumeration_order() {
        let registry = registry();
        assert_eq!(registry.first_match("14735550000").unwrap().country, "USA");
        assert_eq!(registry.first_match("447700900000").unwrap().country, "UK");
        assert!(registry.first_match("33123456789").is_none());
    }

    #[test]
    fn test_longest_match_prefers_specific_code() {
        let registry = registry();
        assert_eq!(registry.longest_match("14735550000").unwrap().country, "Grenada");
        assert_eq!(registry.longest_match("15551234567").unwrap().country, "USA");
        assert!(registry.longest_match("33123456789").is_none());
    }

    #[test]
    fn test_matching_lists_all_candidates() {
        let registry = registry();
        assert_eq!(registry.matching("14735550000").len(), 2);
        assert_eq!(registry.matching("").len(), 0);
    }
}

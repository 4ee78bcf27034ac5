//! Label selectors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label-equality predicate over machine labels.
///
/// A machine matches iff every key/value pair is present and equal in its
/// label set. The empty selector matches every machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector(BTreeMap<String, String>);

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required key/value pair.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.0.iter().all(|(key, value)| labels.get(key) == Some(value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl From<BTreeMap<String, String>> for Selector {
    fn from(pairs: BTreeMap<String, String>) -> Self {
        Self(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn matches_when_all_pairs_present() {
        let selector = Selector::new().with("pool", "workers").with("zone", "a");
        assert!(selector.matches(&labels(&[("pool", "workers"), ("zone", "a"), ("extra", "x")])));
    }

    #[test]
    fn rejects_missing_or_unequal_pairs() {
        let selector = Selector::new().with("pool", "workers");
        assert!(!selector.matches(&labels(&[("pool", "batch")])));
        assert!(!selector.matches(&labels(&[("zone", "a")])));
        assert!(!selector.matches(&labels(&[])));
    }

    #[test]
    fn empty_selector_matches_everything() {
        let selector = Selector::new();
        assert!(selector.matches(&labels(&[])));
        assert!(selector.matches(&labels(&[("pool", "workers")])));
    }
}

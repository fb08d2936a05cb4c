//! Rule store abstraction
//!
//! The suffix matcher only needs to know whether a normalized rule string is
//! present. Any backing store that can answer that question exactly (no false
//! negatives, no case folding) can be plugged in.

use std::collections::HashSet;

/// Presence test over a set of normalized suffix rules.
pub trait RuleStore {
    /// Whether `rule` is in the set, by exact string equality.
    fn exists(&self, rule: &str) -> bool;

    /// Number of distinct rules in the set.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: RuleStore + ?Sized> RuleStore for &T {
    #[inline]
    fn exists(&self, rule: &str) -> bool {
        (**self).exists(rule)
    }

    #[inline]
    fn len(&self) -> usize {
        (**self).len()
    }
}

/// In-memory rule set.
#[derive(Debug, Clone, Default)]
pub struct MemoryRuleStore {
    rules: HashSet<String>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from already-normalized rules. Duplicates collapse.
    pub fn from_rules<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        rules.into_iter().collect()
    }

    /// Insert a rule. Returns false if it was already present.
    pub fn insert(&mut self, rule: impl Into<String>) -> bool {
        self.rules.insert(rule.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(String::as_str)
    }
}

impl RuleStore for MemoryRuleStore {
    #[inline]
    fn exists(&self, rule: &str) -> bool {
        self.rules.contains(rule)
    }

    fn len(&self) -> usize {
        self.rules.len()
    }
}

impl<S: Into<String>> FromIterator<S> for MemoryRuleStore {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for MemoryRuleStore {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.rules.extend(iter.into_iter().map(Into::into));
    }
}

use std::collections::HashSet;

use crate::parser::{ParsedRule, RuleKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    pub before: usize,
    pub after: usize,
    pub deduped: usize,
    pub plain_rules: usize,
    pub wildcard_rules: usize,
    pub exception_rules: usize,
}

/// Collapse duplicate rule strings, keeping the first occurrence.
///
/// Kind counts are taken over the kept rules. An exception rule that repeats a
/// plain rule collapses into it like any other duplicate.
pub fn optimize_rules(rules: &mut Vec<ParsedRule>) -> OptimizeStats {
    let before = rules.len();

    let mut seen: HashSet<String> = HashSet::with_capacity(rules.len());
    rules.retain(|rule| seen.insert(rule.rule.clone()));

    let after = rules.len();
    let mut stats = OptimizeStats {
        before,
        after,
        deduped: before - after,
        ..OptimizeStats::default()
    };

    for rule in rules.iter() {
        match rule.kind {
            RuleKind::Plain => stats.plain_rules += 1,
            RuleKind::Wildcard => stats.wildcard_rules += 1,
            RuleKind::Exception => stats.exception_rules += 1,
        }
    }

    if stats.deduped > 0 {
        log::debug!("removed {} duplicate rules", stats.deduped);
    }

    stats
}

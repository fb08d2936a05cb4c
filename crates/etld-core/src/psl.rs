//! Public Suffix List (PSL) matching for eTLD+1 extraction
//!
//! The matcher walks candidate suffixes of a hostname from the longest to the
//! shortest and stops at the first one the rule store knows about. Because the
//! longest candidate is tried first, the first hit is also the longest matching
//! rule, so no length comparison between rules is needed.
//!
//! Wildcards are only tried in the left-most label of a candidate: for the
//! candidate `www.ck` the store is asked for `www.ck` and for `*.ck`.
//!
//! Exception rules (`!www.ck`) reach the store as plain rules and get no
//! special priority here.
//!
//! # Examples
//!
//! ```
//! use etld_core::psl::{MatcherConfig, SuffixMatcher};
//! use etld_core::store::MemoryRuleStore;
//!
//! let store = MemoryRuleStore::from_rules(["com", "uk", "co.uk"]);
//! let matcher = SuffixMatcher::new(store, MatcherConfig::default());
//!
//! assert_eq!(matcher.registrable_domain("sub.example.com"), "example.com");
//! assert_eq!(matcher.registrable_domain("sub.example.co.uk"), "example.co.uk");
//! ```

use crate::store::RuleStore;

/// Matcher settings, fixed at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatcherConfig {
    /// Log every candidate probe and its outcome at `info` level.
    pub verbose: bool,
}

impl MatcherConfig {
    pub fn verbose(verbose: bool) -> Self {
        Self { verbose }
    }
}

/// eTLD+1 calculator over a rule store.
///
/// Lookups only read the store, so a matcher over a `Sync` store can be
/// shared across threads.
#[derive(Debug, Clone)]
pub struct SuffixMatcher<S> {
    store: S,
    config: MatcherConfig,
}

impl<S: RuleStore> SuffixMatcher<S> {
    pub fn new(store: S, config: MatcherConfig) -> Self {
        Self { store, config }
    }

    /// Compute the eTLD+1 of every hostname, in input order.
    pub fn calculate<H: AsRef<str>>(&self, hostnames: &[H]) -> Vec<String> {
        hostnames
            .iter()
            .map(|host| self.registrable_domain(host.as_ref()))
            .collect()
    }

    /// Compute the eTLD+1 of a single hostname.
    ///
    /// Returns the hostname unchanged when it has fewer than two labels or
    /// when no rule matches any of its suffixes.
    pub fn registrable_domain(&self, host: &str) -> String {
        let labels = Labels::new(host);

        for i in 1..labels.len() {
            let suffix = labels.suffix(i);
            let wildcard = labels.wildcard(i);

            let hit = self.store.exists(suffix)
                || wildcard.as_deref().is_some_and(|w| self.store.exists(w));

            if self.config.verbose {
                log::info!(
                    "eTLD '{}' OR eTLD '{}' : {}",
                    suffix,
                    wildcard.as_deref().unwrap_or(suffix),
                    if hit { "hit" } else { "miss" }
                );
            }

            if hit {
                let etld1 = labels.suffix(i - 1);
                if self.config.verbose {
                    log::info!("eTLD+1 '{}'", etld1);
                }
                return etld1.to_string();
            }
        }

        if self.config.verbose {
            log::info!("eTLD+1 NONE for '{}'", host);
        }
        host.to_string()
    }
}

/// A hostname split into labels, kept as byte offsets into the stripped host
/// so every suffix is a borrowed slice.
struct Labels<'a> {
    host: &'a str,
    starts: Vec<usize>,
}

impl<'a> Labels<'a> {
    fn new(host: &'a str) -> Self {
        let host = host.trim_matches('.');
        let starts = std::iter::once(0)
            .chain(host.match_indices('.').map(|(pos, _)| pos + 1))
            .collect();
        Self { host, starts }
    }

    #[inline]
    fn len(&self) -> usize {
        self.starts.len()
    }

    /// Labels `i..` joined with `.`.
    #[inline]
    fn suffix(&self, i: usize) -> &'a str {
        &self.host[self.starts[i]..]
    }

    /// `*.` plus labels `i + 1..`. None for the last label, since a lone `*`
    /// is not a rule.
    fn wildcard(&self, i: usize) -> Option<String> {
        if i + 1 >= self.len() {
            return None;
        }
        Some(format!("*.{}", self.suffix(i + 1)))
    }
}

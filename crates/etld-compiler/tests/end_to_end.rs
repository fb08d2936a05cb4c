//! Rule list text -> snapshot -> matcher, using an excerpt of the real list.

use etld_compiler::{compile_rule_list, source_crc32};
use etld_core::psl::{MatcherConfig, SuffixMatcher};
use etld_core::snapshot::Snapshot;
use etld_core::store::RuleStore;

const PSL_EXCERPT: &str = "\
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0.

// ===BEGIN ICANN DOMAINS===

// com : https://en.wikipedia.org/wiki/.com
com

// uk : https://en.wikipedia.org/wiki/.uk
uk
ac.uk
co.uk
gov.uk

// ck : https://en.wikipedia.org/wiki/.ck
*.ck
!www.ck

// jp
jp
// jp geographic type names
*.kawasaki.jp
!city.kawasaki.jp

// ===END ICANN DOMAINS===
// ===BEGIN PRIVATE DOMAINS===

// Google, Inc.
blogspot.com
blogspot.co.uk

// GitHub, Inc.
github.io
githubusercontent.com

// ===END PRIVATE DOMAINS===
";

fn matcher_for<'a>(snapshot: &Snapshot<'a>) -> SuffixMatcher<etld_core::RuleSetView<'a>> {
    let set = snapshot.rule_set().expect("rule set present");
    SuffixMatcher::new(set, MatcherConfig::default())
}

#[test]
fn resolves_registrable_domains() {
    let (bytes, stats) = compile_rule_list(PSL_EXCERPT, 1_700_000_000).expect("compiles");
    assert_eq!(stats.after, 14);
    assert_eq!(stats.wildcard_rules, 2);
    assert_eq!(stats.exception_rules, 2);

    let snapshot = Snapshot::load(&bytes).expect("loads");
    let matcher = matcher_for(&snapshot);

    let hosts = [
        "www.example.com",
        "example.com",
        "a.b.example.co.uk",
        "mysite.blogspot.com",
        "deep.mysite.blogspot.co.uk",
        "user.github.io",
        "raw.githubusercontent.com",
        "foo.bar.ck",
        "www.ck",
        "x.city.kawasaki.jp",
        "localhost",
        "example.invalid",
    ];
    let expected = [
        "example.com",
        "example.com",
        "example.co.uk",
        "mysite.blogspot.com",
        "mysite.blogspot.co.uk",
        "user.github.io",
        "raw.githubusercontent.com",
        "foo.bar.ck",
        "www.ck",
        "x.city.kawasaki.jp",
        "localhost",
        "example.invalid",
    ];

    assert_eq!(matcher.calculate(&hosts), expected);
}

#[test]
fn comments_do_not_change_the_rule_set() {
    let stripped: String = PSL_EXCERPT
        .lines()
        .filter(|line| !line.is_empty() && !line.starts_with("//"))
        .map(|line| format!("{}\n", line))
        .collect();

    let (noisy, _) = compile_rule_list(PSL_EXCERPT, 0).expect("compiles");
    let (clean, _) = compile_rule_list(&stripped, 0).expect("compiles");

    let noisy = Snapshot::load(&noisy).expect("loads");
    let clean = Snapshot::load(&clean).expect("loads");
    let mut noisy_rules: Vec<&str> = noisy.rule_set().expect("rule set").iter().collect();
    let mut clean_rules: Vec<&str> = clean.rule_set().expect("rule set").iter().collect();
    noisy_rules.sort_unstable();
    clean_rules.sort_unstable();

    assert_eq!(noisy_rules, clean_rules);
    assert_ne!(noisy.source_crc32, clean.source_crc32);
}

#[test]
fn source_checksum_is_recorded() {
    let (bytes, _) = compile_rule_list(PSL_EXCERPT, 42).expect("compiles");
    let snapshot = Snapshot::load(&bytes).expect("loads");
    assert_eq!(snapshot.source_crc32, source_crc32(PSL_EXCERPT));
    assert_eq!(snapshot.generated_at, 42);
    assert_eq!(snapshot.rule_set().expect("rule set").len(), 14);
}

#[test]
fn reduced_domains_are_fixed_points() {
    let (bytes, _) = compile_rule_list(PSL_EXCERPT, 0).expect("compiles");
    let snapshot = Snapshot::load(&bytes).expect("loads");
    let matcher = matcher_for(&snapshot);

    let hosts = ["a.b.c.example.co.uk", "q.mysite.blogspot.com", "z.y.x.ck", "x.y.city.kawasaki.jp"];
    let once = matcher.calculate(&hosts);
    assert_eq!(matcher.calculate(&once), once);
}

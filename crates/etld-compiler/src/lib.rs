//! etld1 Rule List Compiler
//!
//! This crate compiles a public suffix list into the PSX snapshot format.

pub mod parser;
pub mod optimizer;
pub mod builder;

pub use builder::{build_snapshot, BuildError, BuildOptions};
pub use optimizer::{optimize_rules, OptimizeStats};
pub use parser::{parse_rule_list, ParsedRule, RuleKind};

use etld_core::hash::crc32;

/// CRC32 of a rule list, as stored in the snapshot header.
pub fn source_crc32(text: &str) -> u32 {
    crc32(text.as_bytes())
}

/// Parse, dedupe and build a snapshot in one step.
pub fn compile_rule_list(text: &str, generated_at: u64) -> Result<(Vec<u8>, OptimizeStats), BuildError> {
    let mut rules = parse_rule_list(text);
    let stats = optimize_rules(&mut rules);
    let options = BuildOptions {
        generated_at,
        source_crc32: source_crc32(text),
        ..BuildOptions::default()
    };
    let bytes = build_snapshot(&rules, &options)?;
    Ok((bytes, stats))
}

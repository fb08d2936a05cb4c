//! etld1 Core Library
//!
//! This crate computes the registrable domain (eTLD+1) of a hostname from a set
//! of public suffix rules.
//!
//! # Architecture
//!
//! The matcher is written against the [`RuleStore`] trait, a plain "does this
//! rule exist" capability. Two stores ship with the crate: an in-memory hash
//! set, and a zero-copy view over a compiled PSX snapshot file whose header
//! records when the rules were last generated.
//!
//! # Modules
//!
//! - `hash`: Seeded Murmur3 rule keys and CRC32 checksums
//! - `psl`: Suffix matcher for eTLD+1 extraction
//! - `snapshot`: PSX snapshot format and zero-copy loader
//! - `store`: Rule store trait and in-memory implementation

pub mod hash;
pub mod psl;
pub mod snapshot;
pub mod store;

// Re-export commonly used types
pub use hash::{Hash64, RuleHasher};
pub use psl::{MatcherConfig, SuffixMatcher};
pub use snapshot::{RuleSetView, Snapshot, SnapshotError};
pub use store::{MemoryRuleStore, RuleStore};

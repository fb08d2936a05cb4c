//! PSX Snapshot Format and Loader
//!
//! This module provides the binary format specification and zero-copy loader
//! for compiled public suffix rule snapshots.

mod format;
mod loader;

pub use format::*;
pub use loader::*;

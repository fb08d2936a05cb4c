use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use etld_compiler::{compile_rule_list, OptimizeStats};
use etld_core::snapshot::Snapshot;

/// File name looked up next to the executable when no path is configured.
pub const DEFAULT_SNAPSHOT_NAME: &str = "psl.snapshot";

#[derive(Debug, Clone)]
pub struct CompileStats {
    pub rules_before: usize,
    pub rules_after: usize,
    pub rules_deduped: usize,
    pub wildcard_rules: usize,
    pub exception_rules: usize,
    pub total_ms: f64,
}

impl From<(&OptimizeStats, f64)> for CompileStats {
    fn from((stats, total_ms): (&OptimizeStats, f64)) -> Self {
        Self {
            rules_before: stats.before,
            rules_after: stats.after,
            rules_deduped: stats.deduped,
            wildcard_rules: stats.wildcard_rules,
            exception_rules: stats.exception_rules,
            total_ms,
        }
    }
}

pub fn compile_snapshot_bytes(text: &str, generated_at: u64) -> Result<(Vec<u8>, CompileStats), String> {
    let start = Instant::now();

    let (snapshot_bytes, optimize_stats) = compile_rule_list(text, generated_at)
        .map_err(|e| format!("Failed to build snapshot: {}", e))?;

    Snapshot::load(&snapshot_bytes)
        .map_err(|e| format!("Generated snapshot failed validation: {}", e))?;

    let total_ms = start.elapsed().as_secs_f64() * 1000.0;
    Ok((snapshot_bytes, CompileStats::from((&optimize_stats, total_ms))))
}

/// Snapshot path from the flag/env value, else next to the executable.
pub fn resolve_snapshot_path(configured: Option<&Path>) -> Result<PathBuf, String> {
    match configured {
        Some(path) => Ok(path.to_path_buf()),
        None => default_snapshot_path(),
    }
}

pub fn default_snapshot_path() -> Result<PathBuf, String> {
    let exe = std::env::current_exe()
        .map_err(|e| format!("Failed to locate executable: {}", e))?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(DEFAULT_SNAPSHOT_NAME))
}

/// Write through a temp file in the target directory, then rename over `path`.
/// An interrupted write leaves the previous snapshot in place.
pub fn write_snapshot(path: &Path, bytes: &[u8]) -> Result<(), String> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create '{}': {}", dir.display(), e))?;

    let write_err = |e: std::io::Error| format!("Failed to write '{}': {}", path.display(), e);
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

pub fn read_snapshot(path: &Path) -> Result<Vec<u8>, String> {
    if !path.exists() {
        return Err(format!("Path '{}' is unavailable.", path.display()));
    }
    if !path.is_file() {
        return Err(format!("Path '{}' is not a file.", path.display()));
    }
    fs::read(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))
}

/// Whether an existing snapshot at `path` was built from a source with this CRC.
pub fn is_up_to_date(path: &Path, source_crc32: u32) -> bool {
    let Ok(bytes) = fs::read(path) else {
        return false;
    };
    match Snapshot::load(&bytes) {
        Ok(snapshot) => snapshot.source_crc32 == source_crc32,
        Err(e) => {
            log::warn!("existing snapshot '{}' is unusable: {}", path.display(), e);
            false
        }
    }
}

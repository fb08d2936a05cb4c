use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use etld_core::snapshot::Snapshot;
use etld_core::store::RuleStore;

use crate::snapshot;

pub struct InfoOptions {
    pub snapshot_path: Option<PathBuf>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct SnapshotInfo {
    pub path: String,
    pub version: u16,
    pub rules: usize,
    pub generated_at: u64,
    pub generated_at_rfc3339: Option<String>,
    pub age_seconds: i64,
    pub source_crc32: String,
    pub snapshot_crc32: String,
    pub hash_seeds: String,
    pub size_bytes: usize,
}

impl SnapshotInfo {
    pub fn from_snapshot(path: &Path, snapshot: &Snapshot<'_>, now: DateTime<Utc>) -> Result<Self, String> {
        let rules = snapshot
            .rule_set()
            .map_err(|e| format!("Invalid snapshot '{}': {}", path.display(), e))?;
        let generated = i64::try_from(snapshot.generated_at)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
        let (seed_lo, seed_hi) = rules.hasher().seeds();

        Ok(Self {
            path: path.display().to_string(),
            version: snapshot.version,
            rules: rules.len(),
            generated_at: snapshot.generated_at,
            generated_at_rfc3339: generated.map(|t| t.to_rfc3339()),
            age_seconds: generated.map_or(0, |t| (now - t).num_seconds()),
            source_crc32: format!("{:08x}", snapshot.source_crc32),
            snapshot_crc32: format!("{:08x}", snapshot.crc32),
            hash_seeds: format!("{:08x}:{:08x}", seed_lo, seed_hi),
            size_bytes: snapshot.size(),
        })
    }
}

pub fn run_info(opts: InfoOptions, out: &mut impl Write) -> Result<(), String> {
    let path = snapshot::resolve_snapshot_path(opts.snapshot_path.as_deref())?;
    let bytes = snapshot::read_snapshot(&path)?;
    let snapshot = Snapshot::load(&bytes)
        .map_err(|e| format!("Invalid snapshot '{}': {}", path.display(), e))?;
    let info = SnapshotInfo::from_snapshot(&path, &snapshot, Utc::now())?;

    let write_err = |e: std::io::Error| format!("Failed to write output: {}", e);

    if opts.json {
        serde_json::to_writer_pretty(&mut *out, &info)
            .map_err(|e| format!("Failed to serialize JSON: {}", e))?;
        writeln!(out).map_err(write_err)?;
        return Ok(());
    }

    writeln!(out, "Snapshot: {}", info.path).map_err(write_err)?;
    writeln!(out, "  Magic:       PSX1").map_err(write_err)?;
    writeln!(out, "  Version:     {}", info.version).map_err(write_err)?;
    writeln!(out, "  Rules:       {}", info.rules).map_err(write_err)?;
    writeln!(
        out,
        "  Generated:   {} ({})",
        info.generated_at_rfc3339.as_deref().unwrap_or("unknown"),
        format_age(info.age_seconds)
    )
    .map_err(write_err)?;
    writeln!(out, "  Source CRC:  {}", info.source_crc32).map_err(write_err)?;
    writeln!(out, "  CRC32:       {}", info.snapshot_crc32).map_err(write_err)?;
    writeln!(out, "  Hash seeds:  {}", info.hash_seeds).map_err(write_err)?;
    writeln!(
        out,
        "  Size:        {} bytes ({:.1} KB)",
        info.size_bytes,
        info.size_bytes as f64 / 1024.0
    )
    .map_err(write_err)?;

    Ok(())
}

fn format_age(seconds: i64) -> String {
    match seconds {
        s if s < 0 => "in the future".to_string(),
        s if s < 3600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3600),
        s => format!("{}d ago", s / 86_400),
    }
}

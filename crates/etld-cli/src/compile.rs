use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use etld_compiler::source_crc32;

use crate::snapshot;

pub struct CompileOptions {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub force: bool,
    pub generated_at: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CompileOutcome {
    Built,
    UpToDate,
}

pub fn run_compile(opts: CompileOptions, out: &mut impl Write) -> Result<CompileOutcome, String> {
    let output = snapshot::resolve_snapshot_path(opts.output.as_deref())?;
    let text = fs::read_to_string(&opts.input)
        .map_err(|e| format!("Failed to read '{}': {}", opts.input.display(), e))?;
    let write_err = |e: std::io::Error| format!("Failed to write output: {}", e);

    let crc = source_crc32(&text);
    if !opts.force && snapshot::is_up_to_date(&output, crc) {
        log::info!("source crc {:08x} unchanged, keeping '{}'", crc, output.display());
        writeln!(out, "Snapshot '{}' is up to date", output.display()).map_err(write_err)?;
        return Ok(CompileOutcome::UpToDate);
    }

    let (bytes, stats) = snapshot::compile_snapshot_bytes(&text, opts.generated_at)?;
    snapshot::write_snapshot(&output, &bytes)?;

    writeln!(out, "Compiled '{}' to '{}'", file_name(&opts.input), output.display()).map_err(write_err)?;
    writeln!(out, "  Lines:      {}", text.lines().count()).map_err(write_err)?;
    writeln!(
        out,
        "  Rules:      {} -> {} (dedupe removed {})",
        stats.rules_before, stats.rules_after, stats.rules_deduped
    )
    .map_err(write_err)?;
    writeln!(
        out,
        "  Wildcards:  {}, exceptions stored as plain rules: {}",
        stats.wildcard_rules, stats.exception_rules
    )
    .map_err(write_err)?;
    writeln!(
        out,
        "  Size:       {} bytes ({:.1} KB)",
        bytes.len(),
        bytes.len() as f64 / 1024.0
    )
    .map_err(write_err)?;
    writeln!(out, "  Time:       {:.1}ms", stats.total_ms).map_err(write_err)?;

    Ok(CompileOutcome::Built)
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap_or_default().to_string_lossy().into_owned()
}

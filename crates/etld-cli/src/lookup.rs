use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use etld_core::psl::{MatcherConfig, SuffixMatcher};
use etld_core::snapshot::Snapshot;
use etld_core::store::RuleStore;

use crate::snapshot;
use crate::Outcome;

pub struct LookupOptions {
    pub hostnames: Vec<String>,
    pub snapshot_path: Option<PathBuf>,
    pub verbose: bool,
    pub json: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct LookupResult<'a> {
    pub hostname: &'a str,
    pub registrable_domain: &'a str,
}

pub fn run_lookup(opts: LookupOptions, out: &mut impl Write) -> Result<Outcome, String> {
    if opts.hostnames.is_empty() {
        log::warn!("no hostnames given");
        return Ok(Outcome::NoResults);
    }

    let path = snapshot::resolve_snapshot_path(opts.snapshot_path.as_deref())?;
    let bytes = snapshot::read_snapshot(&path)?;
    let snapshot = Snapshot::load(&bytes)
        .map_err(|e| format!("Invalid snapshot '{}': {}", path.display(), e))?;
    let rules = snapshot
        .rule_set()
        .map_err(|e| format!("Invalid snapshot '{}': {}", path.display(), e))?;

    log::info!("using {} rules from '{}'", rules.len(), path.display());

    let matcher = SuffixMatcher::new(rules, MatcherConfig::verbose(opts.verbose));
    let results = matcher.calculate(opts.hostnames.as_slice());

    write_results(out, &opts.hostnames, &results, opts.json)?;
    Ok(Outcome::Success)
}

pub fn write_results(
    out: &mut impl Write,
    hostnames: &[String],
    results: &[String],
    json: bool,
) -> Result<(), String> {
    if json {
        let rows: Vec<LookupResult<'_>> = hostnames
            .iter()
            .zip(results)
            .map(|(hostname, domain)| LookupResult {
                hostname: hostname.as_str(),
                registrable_domain: domain.as_str(),
            })
            .collect();
        serde_json::to_writer_pretty(&mut *out, &rows)
            .map_err(|e| format!("Failed to serialize JSON: {}", e))?;
        writeln!(out).map_err(|e| format!("Failed to write output: {}", e))?;
    } else {
        for domain in results {
            writeln!(out, "{}", domain).map_err(|e| format!("Failed to write output: {}", e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_snapshot(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("psl.snapshot");
        let (bytes, _) = snapshot::compile_snapshot_bytes("com\nuk\nco.uk\n*.ck\n!www.ck\n", 1)
            .expect("compiles");
        snapshot::write_snapshot(&path, &bytes).expect("writes");
        path
    }

    fn lookup(hostnames: &[&str], snapshot_path: Option<PathBuf>, json: bool) -> (Result<Outcome, String>, String) {
        let mut out = Vec::new();
        let opts = LookupOptions {
            hostnames: hostnames.iter().map(|h| h.to_string()).collect(),
            snapshot_path,
            verbose: false,
            json,
        };
        let result = run_lookup(opts, &mut out);
        (result, String::from_utf8(out).expect("utf8 output"))
    }

    #[test]
    fn prints_one_line_per_hostname() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_snapshot(&dir);

        let (result, out) = lookup(&["foo.example.com", "localhost", "a.b.example.co.uk"], Some(path), false);
        assert_eq!(result, Ok(Outcome::Success));
        assert_eq!(out, "example.com\nlocalhost\nexample.co.uk\n");
    }

    #[test]
    fn json_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_snapshot(&dir);

        let (result, out) = lookup(&["x.foo.bar.ck"], Some(path), true);
        assert_eq!(result, Ok(Outcome::Success));
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("valid json");
        assert_eq!(parsed[0]["hostname"], "x.foo.bar.ck");
        assert_eq!(parsed[0]["registrable_domain"], "foo.bar.ck");
    }

    #[test]
    fn no_hostnames_is_no_results() {
        let (result, out) = lookup(&[], None, false);
        assert_eq!(result, Ok(Outcome::NoResults));
        assert!(out.is_empty());
    }

    #[test]
    fn missing_snapshot_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (result, out) = lookup(&["example.com"], Some(dir.path().join("nope")), false);
        assert!(result.is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn corrupt_snapshot_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("psl.snapshot");
        std::fs::write(&path, vec![0u8; 128]).expect("writes");
        let (result, _) = lookup(&["example.com"], Some(path), false);
        let err = result.unwrap_err();
        assert!(err.contains("Invalid snapshot"), "{}", err);
    }
}

//! Runs the etld1 binary and checks its output and exit codes.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const LIST: &str = "\
// ===BEGIN ICANN DOMAINS===
com
uk
co.uk
ck
*.ck
!www.ck
// ===END ICANN DOMAINS===
";

fn etld1(args: &[&str], snapshot: Option<&Path>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_etld1"));
    cmd.args(args).env_remove("ETLD1_SNAPSHOT").env_remove("RUST_LOG");
    if let Some(path) = snapshot {
        cmd.env("ETLD1_SNAPSHOT", path);
    }
    cmd.output().expect("etld1 runs")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("utf8 stdout")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn built_snapshot(dir: &TempDir) -> PathBuf {
    let list = dir.path().join("public_suffix_list.dat");
    fs::write(&list, LIST).expect("writes list");
    let snapshot = dir.path().join("psl.snapshot");

    let output = etld1(&["--build", list.to_str().expect("utf8 path")], Some(&snapshot));
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(snapshot.is_file());
    snapshot
}

#[test]
fn lookup_prints_one_line_per_hostname() {
    let dir = tempfile::tempdir().expect("tempdir");
    let snapshot = built_snapshot(&dir);

    let output = etld1(
        &["foo.example.com", "localhost", "a.b.example.co.uk", "x.foo.bar.ck", "foo.www.ck"],
        Some(&snapshot),
    );
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "example.com\nlocalhost\nexample.co.uk\nfoo.bar.ck\nfoo.www.ck\n"
    );
}

#[test]
fn mode_words_are_looked_up_as_hostnames() {
    let dir = tempfile::tempdir().expect("tempdir");
    let snapshot = built_snapshot(&dir);

    let output = etld1(&["info", "build", "help"], Some(&snapshot));
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(stdout(&output), "info\nbuild\nhelp\n");
}

#[test]
fn no_hostnames_exits_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = etld1(&[], Some(&dir.path().join("absent.snapshot")));
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn missing_snapshot_exits_255() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = etld1(&["example.com"], Some(&dir.path().join("absent.snapshot")));
    assert_eq!(output.status.code(), Some(255));
    assert!(output.stdout.is_empty());
    let err = stderr(&output);
    assert!(err.contains("ERROR.") && err.contains("is unavailable"), "{}", err);
}

#[test]
fn corrupt_snapshot_exits_255() {
    let dir = tempfile::tempdir().expect("tempdir");
    let snapshot = built_snapshot(&dir);
    let mut bytes = fs::read(&snapshot).expect("reads");
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    fs::write(&snapshot, bytes).expect("writes");

    let output = etld1(&["example.com"], Some(&snapshot));
    assert_eq!(output.status.code(), Some(255));
    assert!(stderr(&output).contains("CRC32 mismatch"), "{}", stderr(&output));
}

#[test]
fn rebuild_of_unchanged_list_is_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let snapshot = built_snapshot(&dir);
    let list = dir.path().join("public_suffix_list.dat");
    let list = list.to_str().expect("utf8 path");

    let output = etld1(&["--build", list], Some(&snapshot));
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(stdout(&output).contains("is up to date"), "{}", stdout(&output));

    let output = etld1(&["--build", list, "--force"], Some(&snapshot));
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(stdout(&output).starts_with("Compiled"), "{}", stdout(&output));
}

#[test]
fn info_reports_rule_count_as_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let snapshot = built_snapshot(&dir);

    let output = etld1(&["--info", "--json"], Some(&snapshot));
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let info: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(info["rules"], 6);
    assert_eq!(info["version"], 1);
}

//! etld1 CLI
//!
//! Prints the registrable domain (eTLD+1) of each hostname, and compiles the
//! public suffix list into the snapshot those lookups read.

mod compile;
mod info;
mod lookup;
mod snapshot;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use compile::CompileOptions;
use info::InfoOptions;
use lookup::LookupOptions;

/// At least one result was printed.
const EXIT_SUCCESS: u8 = 0;
/// No hostname was processed.
const EXIT_NO_RESULTS: u8 = 1;
/// The snapshot or rule list could not be located, read or validated.
const EXIT_FATAL: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NoResults,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::from(EXIT_SUCCESS),
            Outcome::NoResults => ExitCode::from(EXIT_NO_RESULTS),
        }
    }
}

#[derive(Parser)]
#[command(name = "etld1")]
#[command(about = "Given a hostname, print its registrable domain: \
    the label following its effective top-level domain plus the eTLD itself")]
struct Cli {
    /// Hostnames to look up
    #[arg(value_name = "HOSTNAME")]
    hostnames: Vec<String>,

    /// Output information on the process
    #[arg(short, long)]
    verbose: bool,

    /// Snapshot file read by lookups and --info, written by --build
    /// (defaults to psl.snapshot next to the executable)
    #[arg(short, long, env = "ETLD1_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Print lookup results or snapshot info as JSON
    #[arg(long)]
    json: bool,

    /// Compile a public suffix list (public_suffix_list.dat) into the snapshot
    #[arg(long, value_name = "LIST", conflicts_with_all = ["hostnames", "info", "json"])]
    build: Option<PathBuf>,

    /// With --build, rebuild even if the rule list is unchanged
    #[arg(long, requires = "build")]
    force: bool,

    /// Dump snapshot info
    #[arg(long, conflicts_with = "hostnames")]
    info: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut stdout = io::stdout().lock();

    let result = if let Some(input) = cli.build {
        let opts = CompileOptions {
            input,
            output: cli.snapshot,
            force: cli.force,
            generated_at: now_unix(),
        };
        compile::run_compile(opts, &mut stdout).map(|_| Outcome::Success)
    } else if cli.info {
        let opts = InfoOptions {
            snapshot_path: cli.snapshot,
            json: cli.json,
        };
        info::run_info(opts, &mut stdout).map(|_| Outcome::Success)
    } else {
        let opts = LookupOptions {
            hostnames: cli.hostnames,
            snapshot_path: cli.snapshot,
            verbose: cli.verbose,
            json: cli.json,
        };
        lookup::run_lookup(opts, &mut stdout)
    };

    match result {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            eprintln!("ERROR. {e}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the verbosity flag.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,etld_core=info,etld_compiler=info,etld1=info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn now_unix() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

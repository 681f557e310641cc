/// Dump command-line tool: inspect, validate and summarise snapshot files.
///
/// # Command overview
///
/// ```text
/// rdb <COMMAND> [OPTIONS] FILE
///
/// Commands:
///   inspect    Print one line per object
///   validate   Decode the whole file and verify its checksum
///   stats      Print per-type and per-database counts
///   help       Print help information
///
/// Global options:
///   -v, --verbose    Log decoder events to stderr (RUST_LOG overrides)
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// # Exit codes
///
/// | Code | Meaning                                 |
/// |------|-----------------------------------------|
/// | 0    | Success                                 |
/// | 1    | Error (I/O failure, invalid file, etc.) |
///
/// Logs and error details go to stderr so stdout can be piped cleanly.
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rdb_decoder::{DecoderConfig, OpcodeTable};
use rdb_wire::header::{MAX_SUPPORTED_VERSION, MIN_SUPPORTED_VERSION};
use tracing_subscriber::EnvFilter;

mod cmd_inspect;
mod cmd_stats;
mod cmd_validate;
mod render;

// ── CLI root ──────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "rdb", version, about = "Snapshot dump decoder CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log decoder events (header, databases, aux fields, checksum).
    #[arg(short, long, global = true)]
    verbose: bool,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Print one line per object.
    Inspect(InspectArgs),
    /// Decode the whole file and verify its checksum.
    Validate(ValidateArgs),
    /// Print per-type and per-database counts.
    Stats(StatsArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Format settings shared by every sub-command.
///
/// ```text
/// ┌──────────────────────┬───────────────────────────────────────────────┐
/// │ Flag                 │ Effect                                        │
/// ├──────────────────────┼───────────────────────────────────────────────┤
/// │ --min-version N      │ lowest accepted header version (default 1)    │
/// │ --max-version N      │ highest accepted header version (default 12)  │
/// │ --opcodes TABLE      │ meaning of 0xF4/0xF5: legacy-v12 | standard   │
/// └──────────────────────┴───────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct FormatOptions {
    #[arg(long, default_value_t = MIN_SUPPORTED_VERSION)]
    pub min_version: u32,

    #[arg(long, default_value_t = MAX_SUPPORTED_VERSION)]
    pub max_version: u32,

    #[arg(long, value_enum, default_value_t = OpcodeSet::LegacyV12)]
    pub opcodes: OpcodeSet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OpcodeSet {
    /// 0xF4 = frequency, 0xF5 = idle time.
    LegacyV12,
    /// 0xF4 = slot info, 0xF5 = function library.
    Standard,
}

impl FormatOptions {
    pub fn to_config(&self, verify_checksum: bool) -> DecoderConfig {
        DecoderConfig {
            verify_checksum,
            min_version: self.min_version,
            max_version: self.max_version,
            opcodes: match self.opcodes {
                OpcodeSet::LegacyV12 => OpcodeTable::legacy_v12(),
                OpcodeSet::Standard => OpcodeTable::standard(),
            },
        }
    }
}

/// [`FormatOptions`] plus `--no-verify-checksum`, for the commands where
/// skipping the trailer comparison makes sense.
#[derive(clap::Args)]
pub struct DecodeOptions {
    /// Skip the CRC-64 trailer comparison.
    #[arg(long)]
    pub no_verify_checksum: bool,

    #[command(flatten)]
    pub format: FormatOptions,
}

impl DecodeOptions {
    pub fn to_config(&self) -> DecoderConfig {
        self.format.to_config(!self.no_verify_checksum)
    }
}

/// Arguments for `rdb inspect`.
///
/// ```text
/// ┌───────────────┬──────────────────────────────────────────────────┐
/// │ Flag          │ Effect                                           │
/// ├───────────────┼──────────────────────────────────────────────────┤
/// │ --db N        │ only print objects from database N               │
/// │ --limit N     │ stop after printing N objects                    │
/// │ --show-values │ print elements under each object (80 chars max)  │
/// └───────────────┴──────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct InspectArgs {
    pub file: PathBuf,

    #[command(flatten)]
    pub decode: DecodeOptions,

    #[arg(long)]
    pub db: Option<u64>,

    #[arg(long)]
    pub limit: Option<u64>,

    #[arg(long)]
    pub show_values: bool,
}

/// Arguments for `rdb validate`. Checksum verification is always on, so
/// only the format flags are accepted.
#[derive(clap::Args)]
pub struct ValidateArgs {
    pub file: PathBuf,

    #[command(flatten)]
    pub format: FormatOptions,
}

#[derive(clap::Args)]
pub struct StatsArgs {
    pub file: PathBuf,

    #[command(flatten)]
    pub decode: DecodeOptions,
}

/// Open `path` for buffered, forward-only reading.
pub(crate) fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("cannot read {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Inspect(args) => cmd_inspect::run(&args),
        Commands::Validate(args) => cmd_validate::run(&args),
        Commands::Stats(args) => cmd_stats::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

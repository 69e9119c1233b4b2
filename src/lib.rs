pub mod batch;
pub mod commands;
pub mod discovery;
pub mod extraction;
pub mod header;
pub mod logging;
pub mod output;
pub mod sources;
pub mod utils;

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum, builder::ValueHint};
use clap_complete::Shell;
use std::io::{self, IsTerminal};
use strum_macros::Display;

use crate::{
    batch::{BatchOptions, FailurePolicy},
    extraction::ExtractOptions,
    header::{DEFAULT_MAX_HEADER_BYTES, HeaderFormat},
    sources::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE},
};

/// Parse a usize that must be at least 1.
fn parse_at_least_one(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|e| format!("{e}"))?;
    if n == 0 {
        Err("value must be at least 1".into())
    } else {
        Ok(n)
    }
}

/// Parse a human-readable byte size (e.g., "64KiB", "1MB") that must be greater than 0.
#[allow(clippy::cast_possible_truncation)]
fn parse_nonzero_byte_size(s: &str) -> Result<usize, String> {
    let bytes = s
        .parse::<bytesize::ByteSize>()
        .map_err(|_| {
            format!("invalid byte size '{s}': expected format like '64KiB', '1MB', or '4096'")
        })?
        .as_u64() as usize;
    if bytes == 0 {
        Err("value must be greater than 0".into())
    } else {
        Ok(bytes)
    }
}

/// Parse a read chunk size: a non-zero byte size no larger than [`MAX_CHUNK_SIZE`].
fn parse_chunk_size(s: &str) -> Result<usize, String> {
    let bytes = parse_nonzero_byte_size(s)?;
    if bytes > MAX_CHUNK_SIZE {
        Err(format!(
            "chunk size '{s}' is too large: at most {}MiB allowed",
            MAX_CHUNK_SIZE / (1024 * 1024)
        ))
    } else {
        Ok(bytes)
    }
}

/// Parse a field separator: a single ASCII character, or `tab`/`\t`.
fn parse_separator(s: &str) -> Result<u8, String> {
    match s {
        "tab" | "\\t" | "\t" => return Ok(b'\t'),
        _ => {}
    }
    match s.as_bytes() {
        [b] if b.is_ascii() && *b != b'\n' => Ok(*b),
        _ => Err(format!(
            "invalid separator '{s}': expected a single ASCII character"
        )),
    }
}

#[derive(Parser, Debug)]
#[command(
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"),
    about,
    long_about = None
)]
pub struct Cli {
    /// Maximum worker threads for the tokio async runtime.
    ///
    /// Every table is read on its own task; this only bounds how many run in parallel
    /// on the CPU. Defaults to the number of CPU cores.
    #[arg(long, short = 't', global = true, value_parser = parse_at_least_one)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the column keys of every table export in a directory.
    ///
    /// Examples:
    ///   # Every *.csv file in the current directory
    ///   table-keys scan
    ///
    ///   # Tab-separated exports, as JSON
    ///   table-keys scan exports/ --pattern '*.tsv' --separator tab --format json
    ///
    ///   # Stop the other reads as soon as one file fails
    ///   table-keys scan exports/ --on-failure cancel
    #[command(verbatim_doc_comment)]
    Scan(ScanCommand),

    /// Print the column keys of a single file.
    ///
    /// Examples:
    ///   table-keys peek exports/users.csv
    ///   table-keys peek exports/users.csv --name people
    #[command(verbatim_doc_comment)]
    Peek(PeekCommand),

    /// Generate shell completions for your shell.
    ///
    /// To add completions for your current shell session only:
    ///   zsh:  eval "$(table-keys completions zsh)"
    ///   bash: eval "$(table-keys completions bash)"
    ///   fish: table-keys completions fish | source
    #[command(verbatim_doc_comment)]
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

impl Commands {
    pub fn generate_completions(shell: Shell) {
        clap_complete::generate(
            shell,
            &mut Cli::command(),
            "table-keys",
            &mut std::io::stdout(),
        );
    }
}

/// Options shared by every command that reads headers.
#[derive(Args, Debug, Clone)]
pub struct ReadArgs {
    /// Field separator in the header line (a single ASCII character, or "tab").
    #[arg(long, short = 's', default_value = ",", value_parser = parse_separator)]
    pub separator: u8,

    /// Size of each read from a file (e.g., "64KiB", "4096").
    #[arg(long, default_value = "64KiB", value_parser = parse_chunk_size)]
    pub chunk_size: usize,

    /// Give up on a file whose first line is longer than this (e.g., "1MiB").
    #[arg(long, default_value = "1MiB", value_parser = parse_nonzero_byte_size)]
    pub max_header_bytes: usize,

    /// Output format (auto-detects based on TTY if not specified)
    #[arg(long, short = 'f', value_enum, default_value = "auto")]
    pub format: OutputFormat,
}

impl Default for ReadArgs {
    fn default() -> Self {
        Self {
            separator: b',',
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            format: OutputFormat::Auto,
        }
    }
}

impl ReadArgs {
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            format: HeaderFormat::default().with_separator(self.separator),
            max_header_bytes: Some(self.max_header_bytes),
        }
    }
}

#[derive(Args, Debug)]
pub struct ScanCommand {
    /// Directory holding the table exports (not searched recursively)
    #[arg(default_value = ".", value_hint = ValueHint::DirPath)]
    pub dir: Utf8PathBuf,

    /// Glob matched against file names to pick the table exports
    #[arg(long, short = 'p', default_value = "*.csv")]
    pub pattern: String,

    /// What to do with the other reads once one file has failed
    #[arg(long, value_enum, default_value_t = OnFailure::Detach)]
    pub on_failure: OnFailure,

    #[command(flatten)]
    pub read: ReadArgs,
}

impl ScanCommand {
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            extract: self.read.extract_options(),
            on_failure: self.on_failure.into(),
        }
    }
}

#[derive(Args, Debug)]
pub struct PeekCommand {
    /// Path to the file
    #[arg(value_hint = ValueHint::FilePath)]
    pub file: Utf8PathBuf,

    /// Table name to report (defaults to the file name up to its first '.')
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    #[command(flatten)]
    pub read: ReadArgs,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Display)]
#[value(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OnFailure {
    /// Let the other reads finish in the background and ignore them
    #[default]
    Detach,
    /// Stop the other reads and close their files before exiting
    Cancel,
}

impl From<OnFailure> for FailurePolicy {
    fn from(on_failure: OnFailure) -> Self {
        match on_failure {
            OnFailure::Detach => FailurePolicy::Detach,
            OnFailure::Cancel => FailurePolicy::Cancel,
        }
    }
}

/// Output format for printed results
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Auto-detect: JSON if stdout is not a TTY, otherwise text
    #[default]
    Auto,
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
}

impl OutputFormat {
    pub fn resolves_to_json(&self) -> bool {
        match self {
            OutputFormat::Auto => !io::stdout().is_terminal(),
            OutputFormat::Text => false,
            OutputFormat::Json => true,
        }
    }
}

use clap::Parser;

use crate::application::data::LogLevel;

/// Make the destination tree match the source tree.
///
/// Files and directories present in the source but missing from the destination
/// are copied; those present only in the destination are deleted. A file is
/// refreshed when its size differs or, unless --size-only is given, when the
/// source copy is newer.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// Path or file:// URI to read from. May point to a file or a directory.
    pub source: String,

    /// Directory to reconcile. Without it, every regular file under the source is listed instead.
    pub destination: Option<String>,

    /// Ignore modification times and compare files by size only
    #[clap(long)]
    pub size_only: bool,

    /// Describe what would be done without changing anything
    #[clap(long)]
    pub dry_run: bool,

    /// Print the per-directory diff breakdown
    #[clap(long)]
    pub verbose: bool,

    /// Refuse to sync when two source names differ only by case
    #[clap(long)]
    pub case_insensitive_protect: bool,

    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,
}

impl Cli {
    /// `--verbose` lifts the default log level so diagnostics accompany the diff output.
    pub fn effective_log_level(&self) -> LogLevel {
        match self.log_level {
            LogLevel::Warn if self.verbose => LogLevel::Info,
            level => level,
        }
    }
}

use crate::cli::Cli;
use crate::sync::SyncOptions;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub source: String,
    pub destination: Option<String>,
    pub case_insensitive_protect: bool,
    pub options: SyncOptions,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            source: cli.source,
            destination: cli.destination,
            case_insensitive_protect: cli.case_insensitive_protect,
            options: SyncOptions {
                size_only: cli.size_only,
                dry_run: cli.dry_run,
                verbose: cli.verbose,
            },
        }
    }
}

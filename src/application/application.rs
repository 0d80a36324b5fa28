use std::io;

use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::application::RuntimeConfig;
use crate::filesystem::{FilesystemProvider, LocalProvider, ProviderError};
use crate::sync::{
    CaseGuardError, ConsoleLog, ListingError, SyncError, Synchronizer, check_case_collisions,
    list_files,
};

pub struct Application;

impl Application {
    pub fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        Self::run_with(&LocalProvider, app_config.into())
    }

    pub fn run_with<P: FilesystemProvider>(
        provider: &P,
        app_config: RuntimeConfig,
    ) -> Result<(), ApplicationError> {
        debug!("Runtime config: {:?}", app_config);
        let source = provider
            .resolve(&app_config.source)
            .context(ResolveSnafu {
                argument: app_config.source.clone(),
            })?;

        let Some(destination_argument) = app_config.destination.as_deref() else {
            let listed =
                list_files(provider, &source, &mut io::stdout().lock()).context(ListingSnafu)?;
            info!("Listed {} files", listed);
            return Ok(());
        };

        let destination = provider
            .resolve(destination_argument)
            .context(ResolveSnafu {
                argument: destination_argument,
            })?;

        if app_config.case_insensitive_protect {
            check_case_collisions(provider, &source, std::slice::from_ref(&destination))
                .context(CaseGuardSnafu)?;
        }

        let mut log = ConsoleLog::new(app_config.options.verbose);
        let summary = Synchronizer::new(provider, &app_config.options, &mut log)
            .run(&source, &destination)
            .context(SyncSnafu)?;

        if app_config.options.dry_run {
            info!("Dry run: {} operations were not applied", summary.operations);
        }
        println!("Done");

        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Cannot resolve location '{}'", argument))]
    ResolveError {
        argument: String,
        source: ProviderError,
    },
    #[snafu(display("Critical failure encountered while listing files"))]
    ListingError { source: ListingError },
    #[snafu(display("Source tree cannot be synced safely"))]
    CaseGuardError { source: CaseGuardError },
    #[snafu(display("Critical failure encountered during synchronization"))]
    SyncError { source: SyncError },
}

/// Flags that shape a reconciliation run. Built once from the command line and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Compare files by size only, ignoring modification times.
    pub size_only: bool,
    /// Record every operation without issuing any mutating provider call.
    pub dry_run: bool,
    /// Print the per-directory diff breakdown.
    pub verbose: bool,
}

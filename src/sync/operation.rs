use std::fmt::{self, Display};
use std::time::SystemTime;

use colored::Colorize;

use crate::filesystem::Node;
use crate::sync::DiffResult;

/// One mutating step of a reconciliation run, recorded before it is carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation<L> {
    CreateDirectory { location: L },
    CopyFile {
        source: L,
        destination: L,
        overwrite: bool,
    },
    Delete { location: L, is_dir: bool },
}

impl<L> Operation<L> {
    pub fn marker(&self) -> &'static str {
        match self {
            Operation::CreateDirectory { .. } => "+/",
            Operation::CopyFile {
                overwrite: false, ..
            } => "->",
            Operation::CopyFile { overwrite: true, .. } => "+>",
            Operation::Delete { is_dir: true, .. } => "X/",
            Operation::Delete { is_dir: false, .. } => "X",
        }
    }
}

impl<L: Display> Display for Operation<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateDirectory { location } | Operation::Delete { location, .. } => {
                write!(f, "{} {}", self.marker(), location)
            }
            Operation::CopyFile {
                source,
                destination,
                ..
            } => write!(f, "{} {} {}", source, self.marker(), destination),
        }
    }
}

/// Receives the operation log of a run, in execution order.
pub trait OperationLog<L> {
    fn record(&mut self, operation: Operation<L>);

    /// Called with the file-level diff of every directory that needs work.
    fn describe(&mut self, _destination: &L, _diff: &DiffResult<Node<L>>) {}
}

impl<L> OperationLog<L> for Vec<Operation<L>> {
    fn record(&mut self, operation: Operation<L>) {
        self.push(operation);
    }
}

/// Prints operations to stdout, one line each.
#[derive(Debug, Clone)]
pub struct ConsoleLog {
    verbose: bool,
    colored: bool,
}

impl ConsoleLog {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            colored: supports_color::on(supports_color::Stream::Stdout).is_some(),
        }
    }

    fn styled<L: Display>(&self, operation: &Operation<L>) -> String {
        let line = operation.to_string();
        if !self.colored {
            return line;
        }
        match operation {
            Operation::CreateDirectory { .. } => line.cyan().to_string(),
            Operation::CopyFile {
                overwrite: false, ..
            } => line.green().to_string(),
            Operation::CopyFile { overwrite: true, .. } => line.yellow().to_string(),
            Operation::Delete { .. } => line.red().to_string(),
        }
    }
}

impl<L: Display> OperationLog<L> for ConsoleLog {
    fn record(&mut self, operation: Operation<L>) {
        println!("{}", self.styled(&operation));
    }

    fn describe(&mut self, destination: &L, diff: &DiffResult<Node<L>>) {
        if self.verbose {
            println!("{}", describe_diff(destination, diff));
        }
    }
}

fn describe_time(time: Option<SystemTime>) -> String {
    time.and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| format!("{}.{:09}", d.as_secs(), d.subsec_nanos()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Renders the extra / missing / changed / same breakdown of a file-level diff.
pub fn describe_diff<L: Display>(destination: &L, diff: &DiffResult<Node<L>>) -> String {
    let mut lines = vec![format!("Sync required at {destination}")];

    lines.push("Extra:".to_string());
    lines.extend(diff.extra.iter().map(|n| n.name().to_string()));

    lines.push("Missing:".to_string());
    lines.extend(diff.missing.iter().map(|n| n.name().to_string()));

    lines.push("Changed:".to_string());
    lines.extend(diff.changed.iter().map(|(dst, src)| {
        format!(
            "{} (size {} vs. {}, modified {} vs. {})",
            dst.name(),
            dst.entry.size,
            src.entry.size,
            describe_time(dst.entry.modified_at),
            describe_time(src.entry.modified_at),
        )
    }));

    lines.push("Same:".to_string());
    lines.extend(
        diff.same
            .iter()
            .map(|(dst, _)| format!("{} (size {})", dst.name(), dst.entry.size)),
    );

    lines.join("\n") + "\n"
}

/*!
 * Subcommand drivers
 *
 * Each driver wires planning, the confirmation gates and the transfer
 * engine together. Executor, confirmer and metadata source are passed in
 * so the drivers run unchanged against test doubles.
 */

pub mod ingest_fastq;
pub mod pull_raw_data;

use crate::core::engine::TransferReport;
use crate::core::job::TransferJob;
use crate::error::{EXIT_DECLINED, EXIT_SUCCESS};

/// How a subcommand ended when no error occurred
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// All jobs were executed
    Completed(TransferReport),
    /// The operator declined at a confirmation gate
    Cancelled,
    /// Jobs were planned and listed but not executed
    DryRun { jobs: Vec<TransferJob> },
    /// Planning found nothing to transfer
    NothingToDo,
}

impl CommandOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandOutcome::Cancelled => EXIT_DECLINED,
            _ => EXIT_SUCCESS,
        }
    }
}

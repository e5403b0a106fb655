/*!
 * seqport - bulk sequencing data transfer for SODAR/iRODS
 *
 * - Pattern-driven mapping of local FASTQ files to remote collections
 * - MD5 sidecar generation in md5sum format
 * - Parallel transfers through the iRODS icommands
 * - Raw data pulls driven by SODAR sample sheets
 */

pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod sodar;

// Re-export commonly used types
pub use commands::CommandOutcome;
pub use core::{Direction, JobPlanner, PlanOptions, TransferEngine, TransferExecutor, TransferJob};
pub use error::{Result, SeqportError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/*!
 * `seqport ingest-fastq`: upload FASTQ files with their MD5 sidecars
 */

use std::path::PathBuf;
use tracing::info;

use super::CommandOutcome;
use crate::core::checksum::fix_sidecars;
use crate::core::confirm::{confirm, Confirmer, TransferSummary};
use crate::core::engine::{TransferEngine, DEFAULT_NUM_TRANSFERS};
use crate::core::executor::{Direction, TransferExecutor};
use crate::core::job::TransferJob;
use crate::core::pattern::{DEFAULT_DEST_PATTERN, DEFAULT_SRC_REGEX};
use crate::core::planner::{stage_remote_sources, JobPlanner, PlanOptions};
use crate::error::Result;

/// Settings of one ingest run
#[derive(Debug, Clone)]
pub struct IngestFastqArgs {
    /// Local folders or `i:`/`davs://` remote collections
    pub sources: Vec<String>,
    /// Remote collection to upload into
    pub destination: String,
    pub num_parallel_transfers: usize,
    pub yes: bool,
    pub remote_dir_date: String,
    pub src_regex: String,
    pub remote_dir_pattern: String,
    pub add_suffix: String,
    /// Parent of the staging folders for remote sources
    pub tmp: PathBuf,
    /// Compute missing `.md5` sidecars instead of failing
    pub fix_md5: bool,
    pub dry_run: bool,
    pub show_progress: bool,
}

impl IngestFastqArgs {
    /// Defaults for everything but sources, destination and date
    pub fn new(
        sources: Vec<String>,
        destination: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            sources,
            destination: destination.into(),
            num_parallel_transfers: DEFAULT_NUM_TRANSFERS,
            yes: false,
            remote_dir_date: date.into(),
            src_regex: DEFAULT_SRC_REGEX.to_string(),
            remote_dir_pattern: DEFAULT_DEST_PATTERN.to_string(),
            add_suffix: String::new(),
            tmp: PathBuf::from("temp/"),
            fix_md5: true,
            dry_run: false,
            show_progress: false,
        }
    }
}

pub fn run(
    args: &IngestFastqArgs,
    executor: &dyn TransferExecutor,
    confirmer: &dyn Confirmer,
) -> Result<CommandOutcome> {
    info!("Starting seqport ingest-fastq");
    info!("  destination: {}", args.destination);
    info!("  sources: {}", args.sources.join(", "));

    if !args.dry_run {
        executor.preflight()?;
    }

    let planner = JobPlanner::new(PlanOptions {
        dest_root: args.destination.clone(),
        src_regex: args.src_regex.clone(),
        dest_template: args.remote_dir_pattern.clone(),
        date: args.remote_dir_date.clone(),
        suffix: args.add_suffix.clone(),
        fix_sidecars: args.fix_md5,
    })?;

    let sources = stage_remote_sources(&args.sources, &args.tmp);
    let mut folders = sources.folders;

    if !sources.staging.is_empty() {
        if args.dry_run {
            // Staged folders only exist after the download
            let staged: Vec<PathBuf> = sources
                .staging
                .iter()
                .map(|j| PathBuf::from(j.dest_path()))
                .collect();
            folders.retain(|f| !staged.contains(f));
            TransferSummary::new("Would stage remote sources:", &sources.staging).present();
        } else {
            let summary = TransferSummary::new("Staging remote sources:", &sources.staging);
            if !confirm(&summary, args.yes, confirmer) {
                return Ok(CommandOutcome::Cancelled);
            }
            TransferEngine::new(executor, args.num_parallel_transfers)
                .direction(Direction::Download)
                .show_progress(args.show_progress)
                .execute(&sources.staging)?;
        }
    }

    let jobs = planner.plan(&folders)?;

    if args.dry_run {
        TransferSummary::new("Would transfer:", &jobs).present();
        let mut listed = sources.staging;
        listed.extend(jobs);
        return Ok(CommandOutcome::DryRun { jobs: listed });
    }

    if jobs.is_empty() {
        info!("No files matched, nothing to transfer");
        return Ok(CommandOutcome::NothingToDo);
    }

    let jobs: Vec<TransferJob> = if args.fix_md5 {
        fix_sidecars(jobs, args.num_parallel_transfers, args.show_progress)?
    } else {
        jobs
    };

    let summary = TransferSummary::new("Planned transfers:", &jobs);
    if !confirm(&summary, args.yes, confirmer) {
        return Ok(CommandOutcome::Cancelled);
    }

    let report = TransferEngine::new(executor, args.num_parallel_transfers)
        .direction(Direction::Upload)
        .show_progress(args.show_progress)
        .execute(&jobs)?;
    Ok(CommandOutcome::Completed(report))
}

/*!
 * `seqport pull-raw-data`: download raw data folders of a project's libraries
 */

use std::fs;
use std::path::Path;
use tracing::info;

use super::CommandOutcome;
use crate::core::confirm::{confirm, Confirmer, TransferSummary};
use crate::core::engine::TransferEngine;
use crate::core::executor::{Direction, TransferExecutor};
use crate::core::job::TransferJob;
use crate::error::{Result, SeqportError};
use crate::sodar::{MetadataSource, RemoteFolderMapping};

#[derive(Debug, Clone)]
pub struct PullRawDataArgs {
    pub project_uuid: String,
    pub output_dir: String,
    /// Libraries of samples from earlier batches are skipped
    pub min_batch: u32,
    pub num_parallel_transfers: usize,
    pub yes: bool,
    pub dry_run: bool,
    pub show_progress: bool,
}

/// `output_dir` without trailing slashes (the root stays `/`)
pub fn normalize_output_dir(output_dir: &str) -> String {
    let trimmed = output_dir.trim_end_matches('/');
    if trimmed.is_empty() && output_dir.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// One recursive download per library folder
pub fn download_jobs(
    irods_path: &str,
    output_dir: &str,
    mapping: &RemoteFolderMapping,
) -> Vec<TransferJob> {
    let base = irods_path.trim_end_matches('/');
    mapping
        .iter()
        .map(|lib| {
            TransferJob::new(
                format!("{}/{}", base, lib.library_name),
                format!("{}/{}", output_dir.trim_end_matches('/'), lib.folder_name),
                0,
            )
        })
        .collect()
}

pub fn run(
    args: &PullRawDataArgs,
    metadata: &dyn MetadataSource,
    executor: &dyn TransferExecutor,
    confirmer: &dyn Confirmer,
) -> Result<CommandOutcome> {
    info!("Starting seqport pull-raw-data");
    let output_dir = normalize_output_dir(&args.output_dir);
    info!("  project: {}", args.project_uuid);
    info!("  output dir: {}", output_dir);

    if !args.dry_run && !Path::new(&output_dir).exists() {
        fs::create_dir_all(&output_dir)?;
    }

    let investigation = metadata.get_investigation(&args.project_uuid)?;
    let (assay_uuid, assay) = investigation.first_assay().ok_or_else(|| {
        info!("Found no assay");
        SeqportError::Metadata(format!("project {} has no assay", args.project_uuid))
    })?;
    let irods_path = assay.irods_path.as_deref().ok_or_else(|| {
        SeqportError::Metadata(format!("assay {} has no iRODS path", assay_uuid))
    })?;
    info!("Using irods path of first assay: {}", irods_path);

    let sheet = metadata.get_samplesheet(&args.project_uuid)?;
    let mapping = RemoteFolderMapping::from_sample_sheet(&sheet).filter_min_batch(args.min_batch);
    let jobs = download_jobs(irods_path, &output_dir, &mapping);

    if jobs.is_empty() {
        info!("No samples to transfer with --min-batch={}", args.min_batch);
        return Ok(CommandOutcome::NothingToDo);
    }

    if args.dry_run {
        TransferSummary::new("Would pull:", &jobs).present();
        return Ok(CommandOutcome::DryRun { jobs });
    }

    let summary = TransferSummary::new("Pull data for the following libraries:", &jobs);
    if !confirm(&summary, args.yes, confirmer) {
        return Ok(CommandOutcome::Cancelled);
    }

    let report = TransferEngine::new(executor, args.num_parallel_transfers)
        .direction(Direction::Download)
        .show_progress(args.show_progress)
        .execute(&jobs)?;
    Ok(CommandOutcome::Completed(report))
}

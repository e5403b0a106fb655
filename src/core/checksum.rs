/*!
 * MD5 sidecar generation
 *
 * Every uploaded data file travels with a `<file>.md5` companion in
 * `md5sum` format. Missing companions are computed locally before the
 * transfer starts.
 */

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use super::engine::run_bounded;
use super::job::{normalize, TransferJob, SIDECAR_SUFFIX};
use super::progress::{format_bytes, TransferProgress};
use crate::error::{Result, SeqportError};

const BUFFER_SIZE: usize = 1024 * 1024;

/// Hex MD5 digest of a file, streamed in 1 MiB chunks
pub fn md5_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SeqportError::MissingFile(path.to_path_buf()),
        _ => SeqportError::Io(e),
    })?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut ctx = md5::Context::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        ctx.consume(&buffer[..n]);
    }

    Ok(format!("{:x}", ctx.compute()))
}

/// `<path>.md5`
pub fn sidecar_path(data_path: &Path) -> PathBuf {
    let mut name = data_path.as_os_str().to_os_string();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Compute the digest of `data_path` and write its sidecar.
///
/// Returns the size of the written sidecar. A partially written sidecar is
/// removed again on failure.
pub fn write_sidecar(data_path: &Path) -> Result<u64> {
    let target = sidecar_path(data_path);
    let file_name = data_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| SeqportError::MissingFile(data_path.to_path_buf()))?;

    debug!("Computing MD5 sum {} > {}", data_path.display(), target.display());
    let digest = md5_file(data_path)?;

    let written = File::create(&target)
        .and_then(|mut out| out.write_all(format!("{}  {}\n", digest, file_name).as_bytes()));
    if let Err(e) = written {
        error!("Problem writing {}: {}", target.display(), e);
        if let Err(e_rm) = fs::remove_file(&target) {
            debug!("Could not remove {}: {}", target.display(), e_rm);
        }
        return Err(SeqportError::Io(e));
    }

    Ok(fs::metadata(&target)?.len())
}

/// Make sure every data job has a sidecar on disk and a sidecar job in the list.
///
/// Sidecar jobs missing from `jobs` are added, sidecars missing on disk are
/// computed with up to `concurrency` workers, and sidecar sizes are refreshed.
/// The result is sorted.
pub fn fix_sidecars(
    jobs: Vec<TransferJob>,
    concurrency: usize,
    show_progress: bool,
) -> Result<Vec<TransferJob>> {
    let mut jobs = with_sidecar_jobs(jobs);

    let (todo, mut done): (Vec<TransferJob>, Vec<TransferJob>) = jobs
        .drain(..)
        .partition(|job| job.is_sidecar() && !Path::new(job.source_path()).exists());

    let data_size = |job: &TransferJob| -> Result<u64> {
        let data = data_path_of(job);
        fs::metadata(&data)
            .map(|m| m.len())
            .map_err(|_| SeqportError::MissingFile(data))
    };
    let total = todo.iter().map(data_size).sum::<Result<u64>>()?;

    info!(
        "Computing MD5 sums for {} files of {} with up to {} workers",
        todo.len(),
        format_bytes(total),
        concurrency
    );
    for job in &todo {
        debug!("Missing MD5 file: {}", job.source_path());
    }

    let progress = TransferProgress::for_terminal(total, "md5", show_progress && !todo.is_empty());
    let result = run_bounded(&todo, concurrency, |job| {
        write_sidecar(&data_path_of(job))?;
        progress.advance(data_size(job)?);
        Ok(())
    });
    if let Err(e) = result {
        progress.abandon();
        return Err(e);
    }
    progress.finish();

    for job in todo {
        let size = fs::metadata(job.source_path())
            .map(|m| m.len())
            .map_err(|_| SeqportError::MissingFile(PathBuf::from(job.source_path())))?;
        done.push(job.with_size(size));
    }

    Ok(normalize(done))
}

/// Add a sidecar job for each data job that lacks one
fn with_sidecar_jobs(mut jobs: Vec<TransferJob>) -> Vec<TransferJob> {
    let present: BTreeSet<String> = jobs
        .iter()
        .filter(|j| j.is_sidecar())
        .map(|j| j.source_path().to_string())
        .collect();

    let missing: Vec<TransferJob> = jobs
        .iter()
        .filter(|j| !j.is_sidecar())
        .filter(|j| !present.contains(&format!("{}{}", j.source_path(), SIDECAR_SUFFIX)))
        .map(|j| {
            let size = fs::metadata(sidecar_path(Path::new(j.source_path())))
                .map(|m| m.len())
                .unwrap_or(0);
            j.sidecar(size)
        })
        .collect();

    jobs.extend(missing);
    jobs
}

fn data_path_of(sidecar_job: &TransferJob) -> PathBuf {
    let src = sidecar_job.source_path();
    PathBuf::from(src.strip_suffix(SIDECAR_SUFFIX).unwrap_or(src))
}

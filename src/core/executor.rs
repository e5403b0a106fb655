/*!
 * External transfer executor
 *
 * The engine only needs "move this source to that destination"; the iRODS
 * icommands do the actual work and report success through their exit status.
 */

use std::path::Path;
use std::process::Command;
use tracing::debug;

use super::job::TransferJob;
use crate::error::{Result, SeqportError};

/// Prefix marking a path inside the iRODS store
pub const IRODS_PREFIX: &str = "i:";

/// Executables that must be on PATH for transfers
pub const REQUIRED_ICOMMANDS: [&str; 5] = ["iinit", "iput", "iget", "irsync", "imkdir"];

/// Which way a job moves data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Local file to remote collection
    Upload,
    /// Remote collection to local folder, recursively
    Download,
}

/// Black-box primitive that performs one job to completion
pub trait TransferExecutor: Send + Sync {
    fn transfer(&self, job: &TransferJob, direction: Direction) -> Result<()>;

    /// Check the executor can run at all before anything is planned
    fn preflight(&self) -> Result<()> {
        Ok(())
    }
}

/// Executor backed by `imkdir` and `irsync`
#[derive(Debug, Clone, Default)]
pub struct IrodsExecutor {
    /// Value for `irsync -N` (threads per transfer)
    pub irsync_threads: Option<u32>,
}

impl IrodsExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(irsync_threads: Option<u32>) -> Self {
        Self { irsync_threads }
    }

    /// Command lines this executor runs for a job
    pub fn command_lines(&self, job: &TransferJob, direction: Direction) -> Vec<Vec<String>> {
        match direction {
            Direction::Upload => {
                let parent = remote_parent(job.dest_path());
                vec![
                    vec!["imkdir".to_string(), "-p".to_string(), parent],
                    vec![
                        "irsync".to_string(),
                        "-a".to_string(),
                        "-K".to_string(),
                        job.source_path().to_string(),
                        irods_locator(job.dest_path()),
                    ],
                ]
            }
            Direction::Download => {
                let mut argv = vec![
                    "irsync".to_string(),
                    "-r".to_string(),
                    "-a".to_string(),
                    "-K".to_string(),
                ];
                if let Some(threads) = self.irsync_threads {
                    argv.push("-N".to_string());
                    argv.push(threads.to_string());
                }
                argv.push(irods_locator(job.source_path()));
                argv.push(job.dest_path().to_string());
                vec![argv]
            }
        }
    }
}

impl TransferExecutor for IrodsExecutor {
    fn preflight(&self) -> Result<()> {
        check_icommands()
    }

    fn transfer(&self, job: &TransferJob, direction: Direction) -> Result<()> {
        if direction == Direction::Download {
            if let Some(parent) = Path::new(job.dest_path()).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }
        for argv in self.command_lines(job, direction) {
            run_command(&argv)?;
        }
        Ok(())
    }
}

/// Run one command to completion, capturing output for diagnostics
pub fn run_command(argv: &[String]) -> Result<()> {
    let command_line = argv.join(" ");
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| SeqportError::Config("Empty command line".to_string()))?;

    debug!("Executing: {}", command_line);
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| SeqportError::ExecutorFailure {
            command: command_line.clone(),
            status: None,
            stderr: e.to_string(),
        })?;

    if !output.stdout.is_empty() {
        debug!("{}: {}", program, String::from_utf8_lossy(&output.stdout).trim_end());
    }

    if output.status.success() {
        Ok(())
    } else {
        Err(SeqportError::ExecutorFailure {
            command: command_line,
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        })
    }
}

/// `i:`-qualified form of a remote path (idempotent)
pub fn irods_locator(path: &str) -> String {
    if path.starts_with(IRODS_PREFIX) {
        path.to_string()
    } else {
        format!("{}{}", IRODS_PREFIX, path)
    }
}

/// Parent collection of a remote path
fn remote_parent(path: &str) -> String {
    let path = path.strip_prefix(IRODS_PREFIX).unwrap_or(path);
    match path.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
        None => ".".to_string(),
    }
}

/// Names of required icommands that are not on PATH
pub fn missing_icommands() -> Vec<&'static str> {
    let path_var = std::env::var_os("PATH").unwrap_or_default();
    let dirs: Vec<_> = std::env::split_paths(&path_var).collect();
    REQUIRED_ICOMMANDS
        .iter()
        .copied()
        .filter(|prog| !dirs.iter().any(|dir| dir.join(prog).is_file()))
        .collect()
}

/// Fail unless all required icommands are available
pub fn check_icommands() -> Result<()> {
    let missing = missing_icommands();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SeqportError::Config(format!(
            "Could not find irods-icommands executables: {}",
            missing.join(", ")
        )))
    }
}

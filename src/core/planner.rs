/*!
 * Transfer job planning
 *
 * Walks the source folders, matches every regular file against the source
 * expression and derives the remote destination from the destination
 * template. Each matched file yields a data job and an `.md5` sidecar job.
 */

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use super::checksum::sidecar_path;
use super::job::{normalize, TransferJob, SIDECAR_SUFFIX};
use super::locator::Locator;
use super::pattern::{DestTemplate, PathPattern, TemplateExtras};
use crate::error::{Result, SeqportError};

/// Inputs of one planning run
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Remote collection all destinations are placed under
    pub dest_root: String,
    /// Expression matched against each discovered path
    pub src_regex: String,
    /// Destination pattern below `dest_root`
    pub dest_template: String,
    /// Value of the `{date}` placeholder
    pub date: String,
    /// Appended to every destination file name
    pub suffix: String,
    /// Tolerate missing `.md5` sidecars (they are generated later)
    pub fix_sidecars: bool,
}

/// Sources after classifying remote locators
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePlan {
    /// Local folders to plan from, in command-line order
    pub folders: Vec<PathBuf>,
    /// Downloads that fill staging folders listed in `folders`
    pub staging: Vec<TransferJob>,
}

/// Split sources into local folders and staging downloads for remote ones.
///
/// Each remote source is downloaded into `<tmp>/stage_<n>` (counting from 1);
/// that folder takes the remote source's place.
pub fn stage_remote_sources(sources: &[String], tmp: &Path) -> SourcePlan {
    let mut plan = SourcePlan::default();
    for source in sources {
        match Locator::parse(source) {
            Locator::Local(path) => plan.folders.push(path),
            Locator::Remote(remote) => {
                let folder = tmp.join(format!("stage_{}", plan.staging.len() + 1));
                plan.staging
                    .push(TransferJob::new(remote, folder.to_string_lossy(), 0));
                plan.folders.push(folder);
            }
        }
    }
    plan
}

/// Builds sorted job lists from local folders
#[derive(Debug, Clone)]
pub struct JobPlanner {
    options: PlanOptions,
    pattern: PathPattern,
    template: DestTemplate,
}

impl JobPlanner {
    /// Compile expression and template; fails before any file is looked at
    pub fn new(options: PlanOptions) -> Result<Self> {
        let pattern = PathPattern::new(&options.src_regex)?;
        let template = DestTemplate::compile(&options.dest_template)?;
        template.check_fields(&pattern)?;
        Ok(Self {
            options,
            pattern,
            template,
        })
    }

    pub fn options(&self) -> &PlanOptions {
        &self.options
    }

    /// Plan all folders; the result is sorted and free of duplicates
    pub fn plan(&self, folders: &[PathBuf]) -> Result<Vec<TransferJob>> {
        let mut jobs = Vec::new();
        for folder in folders {
            info!("Searching for fastq files in folder: {}", folder.display());
            if !folder.is_dir() {
                return Err(SeqportError::MissingFile(folder.clone()));
            }
            self.plan_folder(folder, &mut jobs)?;
        }
        Ok(normalize(jobs))
    }

    fn plan_folder(&self, folder: &Path, jobs: &mut Vec<TransferJob>) -> Result<()> {
        let walker = WalkDir::new(folder)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(pair) = self.plan_file(entry.path())? {
                jobs.extend(pair);
            }
        }
        Ok(())
    }

    /// Jobs for one enumerated file, or `None` if it is skipped
    fn plan_file(&self, path: &Path) -> Result<Option<[TransferJob; 2]>> {
        if path.to_string_lossy().ends_with(SIDECAR_SUFFIX) {
            return Ok(None);
        }

        let real = fs::canonicalize(path).map_err(|e| missing_or_io(e, path))?;
        if real.to_string_lossy().ends_with(SIDECAR_SUFFIX) {
            return Ok(None);
        }
        let size = fs::metadata(&real)
            .map_err(|e| missing_or_io(e, &real))?
            .len();

        let sidecar = sidecar_path(&real);
        if !self.options.fix_sidecars && !sidecar.exists() {
            return Err(SeqportError::MissingFile(sidecar));
        }

        let path_str = path.to_string_lossy();
        let captures = match self.pattern.captures(&path_str) {
            Some(c) => c,
            None => {
                debug!(
                    "{} does not match {}, skipping",
                    path_str,
                    self.pattern.as_str()
                );
                return Ok(None);
            }
        };
        debug!(
            "Matched {} with regex {}: {:?}",
            path_str,
            self.pattern.as_str(),
            captures
        );

        let fields = self.template.retain(captures);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extras = TemplateExtras {
            filename: format!("{}{}", file_name, self.options.suffix),
            date: self.options.date.clone(),
        };
        let rendered = self.template.render(&fields, &extras)?;
        let remote = join_remote(&self.options.dest_root, &rendered);

        let data = TransferJob::new(real.to_string_lossy(), remote, size);
        let sidecar_size = fs::metadata(&sidecar).map(|m| m.len()).unwrap_or(0);
        let sidecar_job = data.sidecar(sidecar_size);
        Ok(Some([data, sidecar_job]))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

fn missing_or_io(e: io::Error, path: &Path) -> SeqportError {
    match e.kind() {
        io::ErrorKind::NotFound => SeqportError::MissingFile(path.to_path_buf()),
        _ => SeqportError::Io(e),
    }
}

/// Join a rendered relative path onto the remote root; absolute paths replace the root.
///
/// Empty and `.` segments are dropped, so placeholders that rendered empty
/// leave no `//` behind.
pub fn join_remote(root: &str, relative: &str) -> String {
    let joined = if relative.starts_with('/') || root.is_empty() {
        relative.to_string()
    } else {
        format!("{}/{}", root, relative)
    };
    let segments: Vec<&str> = joined
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect();
    if joined.starts_with('/') {
        format!("/{}", segments.join("/"))
    } else {
        segments.join("/")
    }
}

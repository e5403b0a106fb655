/*!
 * Transfer job records
 */

use std::fmt;

/// Suffix of checksum sidecar files
pub const SIDECAR_SUFFIX: &str = ".md5";

/// One file (or folder) move from a source locator to a destination locator.
///
/// Jobs are immutable once built. Ordering compares `source_path`, then
/// `dest_path`, then `byte_size`, which keeps sorted job lists identical
/// across runs with the same inputs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransferJob {
    source_path: String,
    dest_path: String,
    byte_size: u64,
}

impl TransferJob {
    pub fn new(
        source_path: impl Into<String>,
        dest_path: impl Into<String>,
        byte_size: u64,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            dest_path: dest_path.into(),
            byte_size,
        }
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn dest_path(&self) -> &str {
        &self.dest_path
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    /// Whether the source is a checksum sidecar
    pub fn is_sidecar(&self) -> bool {
        self.source_path.ends_with(SIDECAR_SUFFIX)
    }

    /// The sidecar job belonging to this data job
    pub fn sidecar(&self, byte_size: u64) -> TransferJob {
        TransferJob::new(
            format!("{}{}", self.source_path, SIDECAR_SUFFIX),
            format!("{}{}", self.dest_path, SIDECAR_SUFFIX),
            byte_size,
        )
    }

    /// Copy of this job with a different size
    pub fn with_size(&self, byte_size: u64) -> TransferJob {
        TransferJob {
            byte_size,
            ..self.clone()
        }
    }

    pub fn to_oneline(&self) -> String {
        format!("{} -> {} ({})", self.source_path, self.dest_path, self.byte_size)
    }
}

impl fmt::Display for TransferJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.source_path, self.dest_path)
    }
}

/// Sum of all job sizes
pub fn total_bytes(jobs: &[TransferJob]) -> u64 {
    jobs.iter().map(TransferJob::byte_size).sum()
}

/// Sort and drop exact duplicates
pub fn normalize(mut jobs: Vec<TransferJob>) -> Vec<TransferJob> {
    jobs.sort();
    jobs.dedup();
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_by_source_then_dest() {
        let a = TransferJob::new("/in/a.fastq.gz", "/dest/z", 10);
        let b = TransferJob::new("/in/a.fastq.gz", "/dest/a", 10);
        let c = TransferJob::new("/in/a.fastq.gz.md5", "/dest/a.md5", 5);

        let jobs = normalize(vec![c.clone(), a.clone(), b.clone()]);
        assert_eq!(jobs, vec![b, a, c]);
    }

    #[test]
    fn test_sidecar_job() {
        let job = TransferJob::new("/in/x.fq.gz", "/zone/s/x.fq.gz", 100);
        let sidecar = job.sidecar(33);
        assert_eq!(sidecar.source_path(), "/in/x.fq.gz.md5");
        assert_eq!(sidecar.dest_path(), "/zone/s/x.fq.gz.md5");
        assert_eq!(sidecar.byte_size(), 33);
        assert!(sidecar.is_sidecar());
        assert!(!job.is_sidecar());
    }

    #[test]
    fn test_normalize_dedups() {
        let job = TransferJob::new("a", "b", 1);
        assert_eq!(normalize(vec![job.clone(), job.clone()]).len(), 1);
    }

    #[test]
    fn test_total_bytes_and_oneline() {
        let jobs = vec![TransferJob::new("a", "b", 3), TransferJob::new("c", "d", 4)];
        assert_eq!(total_bytes(&jobs), 7);
        assert_eq!(jobs[0].to_oneline(), "a -> b (3)");
        assert_eq!(jobs[1].to_string(), "c => d");
    }
}

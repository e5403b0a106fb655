/*!
 * End-to-end tests for the ingest flow against a recording executor
 */

use seqport::commands::ingest_fastq::{self, IngestFastqArgs};
use seqport::core::confirm::{Confirmer, FixedAnswer, TransferSummary};
use seqport::core::planner::{JobPlanner, PlanOptions};
use seqport::core::pattern::{DEFAULT_DEST_PATTERN, DEFAULT_SRC_REGEX};
use seqport::{CommandOutcome, Direction, Result, SeqportError, TransferExecutor, TransferJob};
use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

#[derive(Default)]
struct RecordingExecutor {
    jobs: Mutex<Vec<TransferJob>>,
}

impl RecordingExecutor {
    fn count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

impl TransferExecutor for RecordingExecutor {
    fn transfer(&self, job: &TransferJob, _direction: Direction) -> Result<()> {
        self.jobs.lock().unwrap().push(job.clone());
        Ok(())
    }
}

struct CountingConfirmer {
    asked: Cell<usize>,
    answer: bool,
}

impl Confirmer for CountingConfirmer {
    fn confirm(&self, _summary: &TransferSummary<'_>) -> bool {
        self.asked.set(self.asked.get() + 1);
        self.answer
    }
}

fn write(path: &Path, contents: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn plan_options(root: &str) -> PlanOptions {
    PlanOptions {
        dest_root: root.to_string(),
        src_regex: DEFAULT_SRC_REGEX.to_string(),
        dest_template: DEFAULT_DEST_PATTERN.to_string(),
        date: "2024-01-01".to_string(),
        suffix: String::new(),
        fix_sidecars: false,
    }
}

#[test]
fn test_sample_a_scenario() {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("run1/sampleA_L001_R1.fastq.gz"), b"ACGTACGTAC");
    write(&temp.path().join("run1/sampleA_L001_R1.fastq.gz.md5"), b"abcde");

    let planner = JobPlanner::new(plan_options("/zone/landing")).unwrap();
    let jobs = planner.plan(&[temp.path().to_path_buf()]).unwrap();

    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].dest_path(), "/zone/landing/sampleA/2024-01-01/sampleA_L001_R1.fastq.gz");
    assert_eq!(jobs[0].byte_size(), 10);
    assert_eq!(
        jobs[1].dest_path(),
        "/zone/landing/sampleA/2024-01-01/sampleA_L001_R1.fastq.gz.md5"
    );
    assert_eq!(jobs[1].byte_size(), 5);
    assert!(jobs[1].source_path().ends_with("run1/sampleA_L001_R1.fastq.gz.md5"));
}

#[test]
fn test_planning_is_deterministic() {
    let temp = TempDir::new().unwrap();
    let names = [
        "s2_R2.fastq.gz",
        "s1_R1.fastq.gz",
        "nested/deep/s3_L002_R1.fq.gz",
        "s1_R2.fastq.gz",
    ];
    for name in names {
        let path = temp.path().join(name);
        write(&path, name.as_bytes());
        let mut sidecar = path.into_os_string();
        sidecar.push(".md5");
        fs::write(sidecar, b"x").unwrap();
    }

    let planner = JobPlanner::new(plan_options("/zone/p")).unwrap();
    let folders = [temp.path().to_path_buf()];
    let first = planner.plan(&folders).unwrap();
    let second = planner.plan(&folders).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 8);

    let mut sorted = first.clone();
    sorted.sort();
    assert_eq!(first, sorted);
}

#[test]
fn test_sidecars_are_never_planned_as_data() {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("s1_R1.fastq.gz"), b"data");
    write(&temp.path().join("s1_R1.fastq.gz.md5"), b"sum");
    write(&temp.path().join("orphan.fastq.gz.md5"), b"sum");

    let jobs = JobPlanner::new(plan_options("/zone/p"))
        .unwrap()
        .plan(&[temp.path().to_path_buf()])
        .unwrap();
    assert_eq!(jobs.len(), 2);
    assert!(!jobs.iter().any(|j| j.dest_path().ends_with(".md5.md5")));
    assert!(!jobs.iter().any(|j| j.source_path().contains("orphan")));
}

#[test]
fn test_non_matching_files_are_excluded() {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("s1_R1.fastq.gz"), b"data");
    write(&temp.path().join("s1_R1.fastq.gz.md5"), b"sum");
    write(&temp.path().join("SampleSheet.csv"), b"csv");
    write(&temp.path().join("SampleSheet.csv.md5"), b"sum");

    let jobs = JobPlanner::new(plan_options("/zone/p"))
        .unwrap()
        .plan(&[temp.path().to_path_buf()])
        .unwrap();
    assert_eq!(jobs.len(), 2);
    assert!(jobs.iter().all(|j| j.source_path().contains("s1_R1.fastq.gz")));
}

#[test]
fn test_custom_regex_and_pattern() {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("FC01/Lib7_S3_L004_R2_001.fastq.gz"), b"reads");

    let mut options = plan_options("/zone/p/");
    options.src_regex =
        r"(.*/)?(?P<flowcell>FC[0-9]+)/(?P<library>[^_/]+)_.*\.fastq\.gz".to_string();
    options.dest_template = "{library}/{flowcell}/{date}/{filename}".to_string();
    options.fix_sidecars = true;

    let jobs = JobPlanner::new(options).unwrap().plan(&[temp.path().to_path_buf()]).unwrap();
    assert_eq!(jobs[0].dest_path(), "/zone/p/Lib7/FC01/2024-01-01/Lib7_S3_L004_R2_001.fastq.gz");
    assert_eq!(jobs[1].byte_size(), 0);
}

#[test]
fn test_template_error_is_reported_before_any_transfer() {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("s1_R1.fastq.gz"), b"data");

    let mut args = IngestFastqArgs::new(
        vec![temp.path().to_string_lossy().into_owned()],
        "/zone/p",
        "2024-01-01",
    );
    args.yes = true;
    args.remote_dir_pattern = "{sample}/{run_id}/{filename}".to_string();

    let executor = RecordingExecutor::default();
    let err = ingest_fastq::run(&args, &executor, &FixedAnswer(true)).unwrap_err();
    match &err {
        SeqportError::TemplateField { field, .. } => assert_eq!(field, "run_id"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.exit_code(), 1);
    assert_eq!(executor.count(), 0);
    assert!(!temp.path().join("s1_R1.fastq.gz.md5").exists());
}

#[test]
fn test_declined_confirmation_runs_nothing() {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("s1_R1.fastq.gz"), b"data");
    write(&temp.path().join("s1_R1.fastq.gz.md5"), b"sum");

    let args = IngestFastqArgs::new(
        vec![temp.path().to_string_lossy().into_owned()],
        "/zone/p",
        "2024-01-01",
    );
    let executor = RecordingExecutor::default();
    let confirmer = CountingConfirmer {
        asked: Cell::new(0),
        answer: false,
    };

    let outcome = ingest_fastq::run(&args, &executor, &confirmer).unwrap();
    assert_eq!(outcome, CommandOutcome::Cancelled);
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(confirmer.asked.get(), 1);
    assert_eq!(executor.count(), 0);
}

#[test]
fn test_full_ingest_uploads_every_job_once() {
    let temp = TempDir::new().unwrap();
    for sample in ["a", "b", "c", "d"] {
        write(&temp.path().join(format!("{sample}_R1.fastq.gz")), sample.repeat(100).as_bytes());
        write(&temp.path().join(format!("{sample}_R2.fastq.gz")), sample.repeat(50).as_bytes());
    }

    let mut args = IngestFastqArgs::new(
        vec![temp.path().to_string_lossy().into_owned()],
        "/zone/p",
        "2024-01-01",
    );
    args.num_parallel_transfers = 8;
    let confirmer = CountingConfirmer {
        asked: Cell::new(0),
        answer: true,
    };
    let executor = RecordingExecutor::default();

    let outcome = ingest_fastq::run(&args, &executor, &confirmer).unwrap();
    let report = match outcome {
        CommandOutcome::Completed(report) => report,
        other => panic!("unexpected outcome {other:?}"),
    };

    assert_eq!(report.jobs_completed, 16);
    assert_eq!(executor.count(), 16);
    assert_eq!(report.bytes_transferred, report.total_bytes);
    let sidecar_bytes: u64 = executor
        .jobs
        .lock()
        .unwrap()
        .iter()
        .filter(|j| j.is_sidecar())
        .map(|j| j.byte_size())
        .sum();
    assert!(sidecar_bytes > 0);
    assert_eq!(report.total_bytes, 4 * 150 + sidecar_bytes);

    let contents = fs::read_to_string(temp.path().join("a_R1.fastq.gz.md5")).unwrap();
    assert!(contents.ends_with("  a_R1.fastq.gz\n"));
    assert_eq!(contents.len(), 32 + 2 + "a_R1.fastq.gz".len() + 1);
}

/// Download writes one FASTQ file into the staging folder
#[derive(Default)]
struct StagingExecutor {
    calls: Mutex<Vec<(TransferJob, Direction)>>,
}

impl TransferExecutor for StagingExecutor {
    fn transfer(&self, job: &TransferJob, direction: Direction) -> Result<()> {
        if direction == Direction::Download {
            let dest = Path::new(job.dest_path());
            fs::create_dir_all(dest)?;
            fs::write(dest.join("x_R1.fastq.gz"), b"ACGT")?;
        }
        self.calls.lock().unwrap().push((job.clone(), direction));
        Ok(())
    }
}

#[test]
fn test_remote_source_is_staged_then_uploaded() {
    let temp = TempDir::new().unwrap();
    let mut args =
        IngestFastqArgs::new(vec!["i:/zone/raw/run1".to_string()], "/zone/p", "2024-01-01");
    args.tmp = temp.path().join("tmp");
    args.yes = true;
    args.num_parallel_transfers = 1;

    let executor = StagingExecutor::default();
    let outcome = ingest_fastq::run(&args, &executor, &FixedAnswer(false)).unwrap();
    assert!(matches!(outcome, CommandOutcome::Completed(_)));

    let calls = executor.calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].1, Direction::Download);
    assert_eq!(calls[0].0.source_path(), "/zone/raw/run1");

    let mut uploads: Vec<&str> = calls[1..]
        .iter()
        .inspect(|(_, d)| assert_eq!(*d, Direction::Upload))
        .map(|(j, _)| j.dest_path())
        .collect();
    uploads.sort();
    assert_eq!(
        uploads,
        [
            "/zone/p/x/2024-01-01/x_R1.fastq.gz",
            "/zone/p/x/2024-01-01/x_R1.fastq.gz.md5"
        ]
    );
    assert!(Path::new(calls[0].0.dest_path()).join("x_R1.fastq.gz.md5").exists());
}

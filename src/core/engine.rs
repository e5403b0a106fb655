/*!
 * Parallel transfer engine
 *
 * Drives a fixed-size pool of OS threads over a planned job list. Each
 * worker blocks on the external executor; the only state the workers share
 * is the cumulative byte counter feeding the progress bar.
 */

use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::executor::{Direction, TransferExecutor};
use super::job::{total_bytes, TransferJob};
use super::progress::{format_bytes, ByteCounter, TransferProgress};
use crate::error::{Result, SeqportError};

/// Default number of parallel transfers
pub const DEFAULT_NUM_TRANSFERS: usize = 8;

/// Outcome of a completed bulk transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub jobs_completed: usize,
    pub bytes_transferred: u64,
    pub total_bytes: u64,
    pub duration: Duration,
}

/// Run `op` over all items with at most `concurrency` worker threads.
///
/// `concurrency == 0` runs sequentially in slice order. The first error
/// stops workers from picking up further items; items already running are
/// allowed to finish. The first error is returned once the pool has joined.
pub fn run_bounded<T, F>(items: &[T], concurrency: usize, op: F) -> Result<()>
where
    T: Sync,
    F: Fn(&T) -> Result<()> + Sync + Send,
{
    if concurrency == 0 {
        return items.iter().try_for_each(op);
    }

    let aborted = AtomicBool::new(false);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .thread_name(|idx| format!("seqport-worker-{}", idx))
        .build()
        .map_err(|e| SeqportError::Parallel(e.to_string()))?;

    pool.install(|| {
        items
            .par_iter()
            .with_max_len(1)
            .try_for_each(|item| {
                if aborted.load(Ordering::SeqCst) {
                    return Ok(());
                }
                op(item).inspect_err(|_| aborted.store(true, Ordering::SeqCst))
            })
    })
}

/// Bulk transfer over a pluggable executor
pub struct TransferEngine<'a> {
    executor: &'a dyn TransferExecutor,
    concurrency: usize,
    direction: Direction,
    show_progress: bool,
}

impl<'a> TransferEngine<'a> {
    pub fn new(executor: &'a dyn TransferExecutor, concurrency: usize) -> Self {
        Self {
            executor,
            concurrency,
            direction: Direction::Upload,
            show_progress: false,
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Execute every job once; the first executor failure aborts the run
    pub fn execute(&self, jobs: &[TransferJob]) -> Result<TransferReport> {
        let start = Instant::now();
        let total = total_bytes(jobs);
        let counter = ByteCounter::new();
        let completed = AtomicUsize::new(0);
        let progress = TransferProgress::for_terminal(total, "transfer", self.show_progress);

        info!(
            "Transferring {} files with a total size of {} ({} parallel)",
            jobs.len(),
            format_bytes(total),
            self.concurrency
        );

        let result = run_bounded(jobs, self.concurrency, |job| {
            debug!("Transferring {}", job.to_oneline());
            self.executor
                .transfer(job, self.direction)
                .inspect_err(|e| {
                    error!(
                        "Transfer of {} to {} failed: {}",
                        job.source_path(),
                        job.dest_path(),
                        e
                    )
                })?;
            counter.add(job.byte_size());
            progress.advance(job.byte_size());
            completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        if let Err(e) = result {
            progress.abandon();
            error!(
                "Aborted after {} of {} jobs ({} transferred)",
                completed.load(Ordering::SeqCst),
                jobs.len(),
                format_bytes(counter.get())
            );
            return Err(e);
        }

        progress.finish();
        let report = TransferReport {
            jobs_completed: completed.load(Ordering::SeqCst),
            bytes_transferred: counter.get(),
            total_bytes: total,
            duration: start.elapsed(),
        };
        info!(
            "All done: {} files, {} in {:.1}s",
            report.jobs_completed,
            format_bytes(report.bytes_transferred),
            report.duration.as_secs_f64()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread;

    /// Records every call; fails on sources listed in `fail_on`
    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<String>>,
        fail_on: Vec<String>,
    }

    impl TransferExecutor for RecordingExecutor {
        fn transfer(&self, job: &TransferJob, _direction: Direction) -> Result<()> {
            thread::sleep(Duration::from_millis(1));
            self.calls.lock().unwrap().push(job.source_path().to_string());
            if self.fail_on.iter().any(|s| s == job.source_path()) {
                return Err(SeqportError::ExecutorFailure {
                    command: format!("irsync {}", job.source_path()),
                    status: Some(3),
                    stderr: "simulated".to_string(),
                });
            }
            Ok(())
        }
    }

    fn jobs(n: usize) -> Vec<TransferJob> {
        (0..n)
            .map(|i| {
                TransferJob::new(
                    format!("/in/f{:03}", i),
                    format!("/out/f{:03}", i),
                    i as u64 + 1,
                )
            })
            .collect()
    }

    #[test]
    fn test_counter_equals_total_for_all_pool_sizes() {
        crate::logging::init_test_logging();
        let jobs = jobs(50);
        let expected: u64 = (1..=50).sum();
        for concurrency in [0, 1, 8] {
            let executor = RecordingExecutor::default();
            let report = TransferEngine::new(&executor, concurrency)
                .execute(&jobs)
                .unwrap();
            assert_eq!(report.bytes_transferred, expected, "concurrency {concurrency}");
            assert_eq!(report.total_bytes, expected);
            assert_eq!(report.jobs_completed, 50);
            assert_eq!(executor.calls.lock().unwrap().len(), 50);
        }
    }

    #[test]
    fn test_sequential_runs_in_order() {
        let jobs = jobs(5);
        let executor = RecordingExecutor::default();
        TransferEngine::new(&executor, 0).execute(&jobs).unwrap();
        let calls = executor.calls.lock().unwrap().clone();
        let expected: Vec<String> = jobs.iter().map(|j| j.source_path().to_string()).collect();
        assert_eq!(calls, expected);
    }

    #[test]
    fn test_sequential_failure_stops_remaining_jobs() {
        let jobs = jobs(5);
        let executor = RecordingExecutor {
            fail_on: vec!["/in/f001".to_string()],
            ..Default::default()
        };
        let err = TransferEngine::new(&executor, 0).execute(&jobs).unwrap_err();
        assert!(matches!(err, SeqportError::ExecutorFailure { status: Some(3), .. }));
        assert_eq!(executor.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_parallel_failure_is_propagated() {
        let jobs = jobs(200);
        let executor = RecordingExecutor {
            fail_on: vec!["/in/f000".to_string()],
            ..Default::default()
        };
        let err = TransferEngine::new(&executor, 2).execute(&jobs).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(executor.calls.lock().unwrap().len() < 200);
    }

    #[test]
    fn test_empty_job_list() {
        let executor = RecordingExecutor::default();
        let report = TransferEngine::new(&executor, 8).execute(&[]).unwrap();
        assert_eq!(report.jobs_completed, 0);
        assert_eq!(report.bytes_transferred, 0);
    }

    #[test]
    fn test_run_bounded_visits_every_item() {
        let items: Vec<u64> = (1..=100).collect();
        let sum = std::sync::atomic::AtomicU64::new(0);
        run_bounded(&items, 4, |v| {
            sum.fetch_add(*v, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();
        assert_eq!(sum.load(Ordering::SeqCst), 5050);
    }
}

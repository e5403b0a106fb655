/*!
 * Aggregate byte progress for bulk operations
 *
 * Workers report completed bytes to a shared `ByteCounter` and advance an
 * indicatif bar sized to the precomputed target by the same amount.
 */

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const BAR_TEMPLATE: &str =
    "{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({binary_bytes_per_sec}, {eta})";

/// Cumulative byte counter shared by all workers of one invocation.
///
/// Cloning yields another handle to the same counter. The value only grows.
#[derive(Debug, Clone, Default)]
pub struct ByteCounter {
    bytes: Arc<AtomicU64>,
}

impl ByteCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add completed bytes and return the new cumulative total
    pub fn add(&self, bytes: u64) -> u64 {
        self.bytes.fetch_add(bytes, Ordering::SeqCst) + bytes
    }

    pub fn get(&self) -> u64 {
        self.bytes.load(Ordering::SeqCst)
    }
}

/// Byte progress display for one bulk operation
#[derive(Debug, Clone)]
pub struct TransferProgress {
    bar: ProgressBar,
}

impl TransferProgress {
    /// Visible bar on stderr
    pub fn new(total_bytes: u64, label: &str) -> Self {
        let bar = ProgressBar::new(total_bytes);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.set_message(label.to_string());
        Self { bar }
    }

    /// Bar that tracks state but never draws
    pub fn hidden(total_bytes: u64) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total_bytes), ProgressDrawTarget::hidden());
        Self { bar }
    }

    /// Pick a visible or hidden bar
    pub fn for_terminal(total_bytes: u64, label: &str, visible: bool) -> Self {
        if visible {
            Self::new(total_bytes, label)
        } else {
            Self::hidden(total_bytes)
        }
    }

    /// Advance by the bytes of one finished item
    pub fn advance(&self, bytes: u64) {
        self.bar.inc(bytes);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish();
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

/// Human-readable size with binary prefixes, e.g. `1.5MiB`
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.1}{}B", size, UNITS[unit_idx])
}

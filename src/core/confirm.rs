/*!
 * Confirmation gate in front of irreversible bulk actions
 */

use dialoguer::Input;
use tracing::{info, warn};

use super::job::{total_bytes, TransferJob};
use super::progress::format_bytes;

/// What the operator is asked to approve
#[derive(Debug, Clone)]
pub struct TransferSummary<'a> {
    pub heading: &'a str,
    pub jobs: &'a [TransferJob],
}

impl<'a> TransferSummary<'a> {
    pub fn new(heading: &'a str, jobs: &'a [TransferJob]) -> Self {
        Self { heading, jobs }
    }

    pub fn total_bytes(&self) -> u64 {
        total_bytes(self.jobs)
    }

    /// Log the full ordered job list and the total size
    pub fn present(&self) {
        info!("{}", self.heading);
        for job in self.jobs {
            info!("  {}", job);
        }
        info!(
            "{} jobs, {} in total",
            self.jobs.len(),
            format_bytes(self.total_bytes())
        );
    }
}

/// Strategy deciding whether a presented summary may proceed
pub trait Confirmer {
    fn confirm(&self, summary: &TransferSummary<'_>) -> bool;
}

/// Asks on the terminal; one line of input, only answers starting with "y" proceed
#[derive(Debug, Clone, Default)]
pub struct TerminalConfirmer;

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, _summary: &TransferSummary<'_>) -> bool {
        let answer = Input::<String>::new()
            .with_prompt("Is this OK? [yN]")
            .allow_empty(true)
            .interact_text();
        read_answer(answer)
    }
}

/// An unreadable answer counts as "no"
fn read_answer(answer: dialoguer::Result<String>) -> bool {
    match answer {
        Ok(answer) => is_affirmative(&answer),
        Err(e) => {
            warn!("Could not read confirmation, assuming no: {}", e);
            false
        }
    }
}

/// Always gives the same answer
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirmer for FixedAnswer {
    fn confirm(&self, _summary: &TransferSummary<'_>) -> bool {
        self.0
    }
}

/// Case-insensitive "starts with y"
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().to_lowercase().starts_with('y')
}

/// Present the summary and ask, unless `auto_yes` already approved everything
pub fn confirm(summary: &TransferSummary<'_>, auto_yes: bool, confirmer: &dyn Confirmer) -> bool {
    summary.present();
    if auto_yes {
        return true;
    }
    let approved = confirmer.confirm(summary);
    if !approved {
        info!("OK, breaking at your request");
    }
    approved
}

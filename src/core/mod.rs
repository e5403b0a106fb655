/*!
 * Core transfer machinery
 *
 * Planning turns source folders into a sorted list of transfer jobs; the
 * engine executes such a list on a bounded worker pool through a
 * pluggable executor.
 */

pub mod checksum;
pub mod confirm;
pub mod engine;
pub mod executor;
pub mod job;
pub mod locator;
pub mod pattern;
pub mod planner;
pub mod progress;

pub use engine::{TransferEngine, TransferReport};
pub use executor::{Direction, IrodsExecutor, TransferExecutor};
pub use job::TransferJob;
pub use planner::{JobPlanner, PlanOptions};

//! Observer port - abstraction for watching restarts as they complete
//!
//! The restart controller reports progress through this trait, so progress
//! bars, metrics collection and logging stay out of the inference code.

use crate::{Result, restarts::RestartSummary};

/// Observer trait for monitoring an inference session.
///
/// # Event Sequence
///
/// 1. `on_inference_start(total_restarts)` - Once at the beginning
/// 2. `on_restart_complete(summary)` - Once per finished restart. When
///    restarts run in parallel the calls arrive in completion order, not
///    restart order.
/// 3. `on_inference_end(best, completed)` - Once at the end
///
/// # Examples
///
/// ```no_run
/// use mace::{ports::Observer, restarts::RestartSummary};
///
/// struct CountingObserver {
///     finished: usize,
/// }
///
/// impl Observer for CountingObserver {
///     fn on_restart_complete(&mut self, _summary: &RestartSummary) -> mace::Result<()> {
///         self.finished += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called before the first restart starts.
    ///
    /// `total_restarts` is an upper bound: early stopping may end the
    /// session sooner.
    fn on_inference_start(&mut self, _total_restarts: usize) -> Result<()> {
        Ok(())
    }

    /// Called when a restart has converged or hit the iteration cap.
    fn on_restart_complete(&mut self, _summary: &RestartSummary) -> Result<()> {
        Ok(())
    }

    /// Called once the best restart has been selected.
    fn on_inference_end(&mut self, _best: &RestartSummary, _completed: usize) -> Result<()> {
        Ok(())
    }
}

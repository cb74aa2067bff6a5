//! Progress reporting for long-running operations

use crate::error::OperationError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Receives completion percentages.
///
/// Values arrive non-decreasing, start at 0 and end at exactly 100 for an
/// operation that finishes. A cancelled operation stops reporting early.
pub trait ProgressSink: Send {
    /// Called once per step with the percentage reached
    fn report(&mut self, percent: u8);
}

impl<F> ProgressSink for F
where
    F: FnMut(u8) + Send,
{
    fn report(&mut self, percent: u8) {
        self(percent);
    }
}

/// Discards progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _percent: u8) {}
}

/// `0, step, 2*step, ..., 100`
///
/// A trailing 100 is appended when `step` does not divide 100. A zero step
/// is treated as 100.
#[must_use]
pub fn progress_steps(step: u8) -> Vec<u8> {
    let step = if step == 0 { 100 } else { step.min(100) };
    let mut steps: Vec<u8> = (0..=100u8).step_by(usize::from(step)).collect();
    if steps.last() != Some(&100) {
        steps.push(100);
    }
    steps
}

/// Sleep for `delay`, or fail as soon as `cancel` fires.
pub(crate) async fn pause(delay: Duration, cancel: &CancellationToken) -> Result<(), OperationError> {
    if cancel.is_cancelled() {
        return Err(OperationError::Cancelled);
    }
    if delay.is_zero() {
        return Ok(());
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(OperationError::Cancelled),
        () = tokio::time::sleep(delay) => Ok(()),
    }
}

/// Walk `steps`: wait `step_delay`, then report, for each one.
pub(crate) async fn drive(
    steps: &[u8],
    step_delay: Duration,
    sink: &mut dyn ProgressSink,
    cancel: &CancellationToken,
) -> Result<(), OperationError> {
    for &percent in steps {
        pause(step_delay, cancel).await?;
        tracing::debug!(percent, "progress");
        sink.report(percent);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_end_at_exactly_100() {
        assert_eq!(progress_steps(10), vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
        assert_eq!(progress_steps(5).len(), 21);
        assert_eq!(progress_steps(30), vec![0, 30, 60, 90, 100]);
        assert_eq!(progress_steps(100), vec![0, 100]);
        assert_eq!(progress_steps(0), vec![0, 100]);
    }

    #[test]
    fn steps_are_non_decreasing() {
        for step in 1..=100u8 {
            let steps = progress_steps(step);
            assert_eq!(steps.first(), Some(&0));
            assert_eq!(steps.last(), Some(&100));
            assert!(steps.windows(2).all(|w| w[0] <= w[1]), "step {step}");
        }
    }

    #[tokio::test]
    async fn drive_stops_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut seen = Vec::new();
        let mut sink = |p: u8| seen.push(p);

        let result = drive(&progress_steps(10), Duration::ZERO, &mut sink, &cancel).await;

        assert!(matches!(result, Err(OperationError::Cancelled)));
        assert!(seen.is_empty());
    }
}

//! Coalesce bursts of rebuild requests into one delayed rebuild.

use std::pin::Pin;
use std::time::Duration;
use tokio::time::{Instant, Sleep};

/// A pending deadline plus one timer that every trigger pushes back.
///
/// Triggering only records the deadline, so it works outside a runtime; the
/// timer itself is created by the first [`Debouncer::fired`].
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None, sleep: None }
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Request a rebuild `delay` from now, replacing any earlier deadline.
    pub fn trigger(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Resolves once the deadline of a pending request passes.
    ///
    /// Cancel safe. Never resolves while nothing is pending.
    pub async fn fired(&mut self) {
        let Some(deadline) = self.deadline else {
            return std::future::pending().await;
        };
        match self.sleep.as_mut() {
            Some(sleep) if sleep.deadline() != deadline => sleep.as_mut().reset(deadline),
            Some(_) => {}
            None => self.sleep = Some(Box::pin(tokio::time::sleep_until(deadline))),
        }
        if let Some(sleep) = self.sleep.as_mut() {
            sleep.as_mut().await;
        }
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let mut debouncer = Debouncer::new(Duration::from_millis(200));
        let start = Instant::now();
        debouncer.trigger();
        debouncer.fired().await;
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrigger_pushes_deadline_back() {
        let mut debouncer = Debouncer::new(Duration::from_millis(200));
        let start = Instant::now();
        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(150)).await;
        debouncer.trigger();
        debouncer.fired().await;
        assert!(start.elapsed() >= Duration::from_millis(350));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_debouncer_never_fires() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        let fired = tokio::time::timeout(Duration::from_secs(5), debouncer.fired()).await;
        assert!(fired.is_err());
    }

    #[test]
    fn test_trigger_outside_runtime() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.trigger();
        assert!(debouncer.is_pending());

        let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
        runtime.block_on(debouncer.fired());
        assert!(!debouncer.is_pending());
    }
}

//! Sequential, interruptible scan over the configured search roots.
//!
//! ```text
//! Idle --Start--> Scanning --QueueExhausted--> Completed --Settle--> Idle
//!                    |  \--Stop--> Interrupted --Settle--> Idle
//!                    \--Reset--> Idle
//! ```
//!
//! One root is searched at a time. The search runs on a spawned task so the
//! match store stays free for single-document updates while a root is in
//! flight; its result is merged by [`ScanOrchestrator::apply`].

use super::search::{SearchOptions, SearchService};
use crate::domain::{Occurrence, RawMatch};
use crate::error::SearchError;
use crate::extract::TagExtractor;
use crate::store::{GlobFilter, MatchStore};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    Completed,
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEvent {
    /// Rebuild requested
    Start,
    /// A new rebuild arrived mid-scan
    Reset,
    QueueExhausted,
    /// Stop requested
    Stop,
    /// Leave a terminal state
    Settle,
}

impl ScanState {
    /// Transition table. `None` means the event is not valid in this state.
    pub fn next(self, event: ScanEvent) -> Option<ScanState> {
        use ScanEvent::*;
        match (self, event) {
            (ScanState::Idle, Start) => Some(ScanState::Scanning),
            (ScanState::Scanning, Reset) => Some(ScanState::Idle),
            (ScanState::Scanning, QueueExhausted) => Some(ScanState::Completed),
            (ScanState::Scanning, Stop) => Some(ScanState::Interrupted),
            (ScanState::Completed | ScanState::Interrupted, Settle) => Some(ScanState::Idle),
            _ => None,
        }
    }
}

/// How the last scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed,
    Interrupted,
}

/// Per-scan inputs, captured when the scan starts.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub options: SearchOptions,
    pub globs: GlobFilter,
    pub extractor: Arc<TagExtractor>,
}

/// Result of searching one root, ready to be applied.
#[derive(Debug)]
pub struct RootResult {
    pub root: PathBuf,
    pub result: Result<Vec<RawMatch>, SearchError>,
}

/// What applying a root result did.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub root: PathBuf,
    pub ingested: usize,
    pub error: Option<SearchError>,
    /// Set when this was the last root.
    pub finished: Option<ScanOutcome>,
}

struct InFlight {
    root: PathBuf,
    handle: JoinHandle<Result<Vec<RawMatch>, SearchError>>,
}

pub struct ScanOrchestrator<S> {
    service: S,
    state: ScanState,
    queue: VecDeque<PathBuf>,
    plan: Option<ScanPlan>,
    in_flight: Option<InFlight>,
    last_outcome: Option<ScanOutcome>,
}

impl<S: SearchService> ScanOrchestrator<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: ScanState::Idle,
            queue: VecDeque::new(),
            plan: None,
            in_flight: None,
            last_outcome: None,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn is_scanning(&self) -> bool {
        self.state == ScanState::Scanning
    }

    pub fn last_outcome(&self) -> Option<ScanOutcome> {
        self.last_outcome
    }

    fn transition(&mut self, event: ScanEvent) {
        match self.state.next(event) {
            Some(next) => {
                debug!(from = ?self.state, to = ?next, ?event, "Scan state transition");
                self.state = next;
            }
            None => warn!(state = ?self.state, ?event, "Ignoring invalid scan transition"),
        }
    }

    /// Clear the store and begin searching `roots` in order.
    ///
    /// A scan already running is reset first, so results of two scans never
    /// mix. Returns the outcome immediately when there is nothing to search.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, roots: Vec<PathBuf>, plan: ScanPlan, store: &mut MatchStore) -> Option<ScanOutcome> {
        if self.is_scanning() {
            self.abort_in_flight();
            self.transition(ScanEvent::Reset);
        }
        self.queue.clear();
        store.clear();

        info!(roots = roots.len(), "Starting scan");
        self.plan = Some(plan);
        self.queue.extend(roots);
        self.transition(ScanEvent::Start);

        if self.launch_next() {
            None
        } else {
            Some(self.finish(store))
        }
    }

    fn launch_next(&mut self) -> bool {
        let Some(plan) = self.plan.as_ref() else {
            return false;
        };
        let Some(root) = self.queue.pop_front() else {
            return false;
        };

        debug!(root = %root.display(), remaining = self.queue.len(), "Searching root");
        let service = self.service.clone();
        let options = plan.options.clone();
        let search_root = root.clone();
        let handle = tokio::spawn(async move { service.search(&search_root, &options).await });
        self.in_flight = Some(InFlight { root, handle });
        true
    }

    /// Wait for the root currently being searched.
    ///
    /// Cancel safe: dropping the future leaves the search running. Never
    /// resolves when no search is in flight.
    pub async fn next_step(&mut self) -> RootResult {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return std::future::pending().await;
        };
        let result = match (&mut in_flight.handle).await {
            Ok(result) => result,
            Err(e) => Err(SearchError::Output(e.to_string())),
        };
        let root = in_flight.root.clone();
        self.in_flight = None;
        RootResult { root, result }
    }

    /// Merge one root's result into `store` and launch the next root.
    ///
    /// A failed root is skipped; the rest of the queue still runs. After the
    /// last root the store is glob filtered and overlap trimmed.
    pub fn apply(&mut self, step: RootResult, store: &mut MatchStore) -> StepReport {
        let mut report = StepReport { root: step.root, ingested: 0, error: None, finished: None };
        let Some(plan) = self.plan.as_ref().filter(|_| self.is_scanning()) else {
            debug!(root = %report.root.display(), "Discarding result of a stale scan");
            return report;
        };

        match step.result {
            Ok(matches) => {
                let total = matches.len();
                let extractor = Arc::clone(&plan.extractor);
                report.ingested = store.ingest(matches.into_iter().map(|m| Occurrence::classify(m, &extractor)));
                info!(root = %report.root.display(), matches = total, new = report.ingested, "Root searched");
            }
            Err(e) => {
                warn!(root = %report.root.display(), "Search failed, skipping root: {}", e.user_message());
                report.error = Some(e);
            }
        }

        if !self.launch_next() {
            report.finished = Some(self.finish(store));
        }
        report
    }

    fn finish(&mut self, store: &mut MatchStore) -> ScanOutcome {
        if let Some(plan) = self.plan.take() {
            let removed = store.retain_by_glob(&plan.globs);
            if removed > 0 {
                debug!(removed, "Dropped occurrences outside the configured globs");
            }
        }
        store.apply_overlap_trim();

        self.transition(ScanEvent::QueueExhausted);
        self.transition(ScanEvent::Settle);
        self.last_outcome = Some(ScanOutcome::Completed);
        info!(occurrences = store.len(), "Scan completed");
        ScanOutcome::Completed
    }

    /// Kill the in-flight search and drop the queue. Results already merged
    /// are kept. Returns false when no scan was running.
    pub fn stop(&mut self, store: &mut MatchStore) -> bool {
        if !self.is_scanning() {
            return false;
        }
        self.abort_in_flight();
        self.queue.clear();
        self.plan = None;
        store.apply_overlap_trim();

        self.transition(ScanEvent::Stop);
        self.transition(ScanEvent::Settle);
        self.last_outcome = Some(ScanOutcome::Interrupted);
        info!(occurrences = store.len(), "Scan interrupted");
        true
    }

    fn abort_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!(root = %in_flight.root.display(), "Aborting search");
            in_flight.handle.abort();
        }
    }

    /// Drive the current scan to its end.
    pub async fn run_to_end(&mut self, store: &mut MatchStore) -> Vec<StepReport> {
        let mut reports = Vec::new();
        while self.is_scanning() {
            let step = self.next_step().await;
            let report = self.apply(step, store);
            let done = report.finished.is_some();
            reports.push(report);
            if done {
                break;
            }
        }
        reports
    }
}

impl<S> Drop for ScanOrchestrator<S> {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.handle.abort();
        }
    }
}

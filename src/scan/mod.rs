//! Scanning: search services, single-document scanning and the scan state machine

pub mod document;
pub mod orchestrator;
pub mod search;

pub use document::scan_document;
pub use orchestrator::{RootResult, ScanEvent, ScanOrchestrator, ScanOutcome, ScanPlan, ScanState, StepReport};
pub use search::{BuiltinSearch, RipgrepSearch, SearchEngine, SearchOptions, SearchService};

//! TestKeel - reliability engine for browser end-to-end suites
//!
//! Four cooperating components, owned per test run and wired through
//! [`RunContext`]:
//! - self-healing locator resolution (`locator-resolver`)
//! - intelligent waits for dynamic state (`wait-coordinator`)
//! - statistical flakiness detection (`flakiness-analyzer`)
//! - pixel-level visual regression (`visual-diff`)
//!
//! The engine consumes three narrow capabilities: browser control
//! (`driver-adapter`), optional generative suggestions (`suggest-bridge`),
//! and persistence (`run-store`).

pub mod config;
pub mod context;

pub use config::{ConfigError, Settings};
pub use context::RunContext;

// Re-exports
pub use driver_adapter::{BrowserDriver, DriverError, ElementHandle, ElementState, LoadState};
pub use flakiness_analyzer::{AnalyzerConfig, AnalyzerError, FlakinessAnalyzer, FlakinessReport};
pub use locator_resolver::{
    CandidateSource, LocatorError, LocatorResolver, Resolution, ResolveOptions,
};
pub use run_store::{
    FsImageStore, FsRecordLog, ImageStore, MemoryImageStore, MemoryRecordLog, RecordLog,
    StoreError,
};
pub use suggest_bridge::{
    DisabledSuggestions, FailureInsight, StaticSuggestions, SuggestError, SuggestionProvider,
};
pub use testkeel_core_types::{
    EnvTags, ExecutionRecord, Outcome, Rect, RunId, TestId,
};
pub use visual_diff::{CompareOptions, ComparisonResult, Region, VisualDiffEngine, VisualError};
pub use wait_coordinator::{WaitCondition, WaitCoordinator, WaitError, WaitOptions};

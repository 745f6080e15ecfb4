//! Per-run wiring of the four engine components
//!
//! A context is created per test run (or per worker process) and owns its
//! locator cache outright; only the history log and the baseline store
//! behind it are shared, and both are single-writer-serialized in
//! `run-store`. Nothing here is a module-level singleton.

use std::sync::Arc;

use flakiness_analyzer::FlakinessAnalyzer;
use locator_resolver::LocatorResolver;
use run_store::{FsImageStore, FsRecordLog, ImageStore, MemoryImageStore, MemoryRecordLog, RecordLog};
use suggest_bridge::SuggestionProvider;
use testkeel_core_types::RunId;
use tracing::info;
use visual_diff::VisualDiffEngine;
use wait_coordinator::WaitCoordinator;

use crate::config::Settings;
use driver_adapter::BrowserDriver;

/// One test run's engine instances.
pub struct RunContext {
    run_id: RunId,
    settings: Settings,
    resolver: LocatorResolver,
    waits: WaitCoordinator,
    flakiness: FlakinessAnalyzer,
    visual: VisualDiffEngine,
}

impl RunContext {
    /// Wire a context against filesystem-backed stores under
    /// `settings.artifacts_dir` / `settings.history_log`.
    pub fn new(
        settings: Settings,
        driver: Arc<dyn BrowserDriver>,
        suggestions: Arc<dyn SuggestionProvider>,
    ) -> Self {
        let record_log: Arc<dyn RecordLog> = Arc::new(FsRecordLog::new(&settings.history_log));
        let image_store: Arc<dyn ImageStore> = Arc::new(FsImageStore::new(&settings.artifacts_dir));
        Self::with_stores(settings, driver, suggestions, record_log, image_store)
    }

    /// Wire a context against in-memory stores. Nothing touches disk.
    pub fn in_memory(
        settings: Settings,
        driver: Arc<dyn BrowserDriver>,
        suggestions: Arc<dyn SuggestionProvider>,
    ) -> Self {
        let record_log: Arc<dyn RecordLog> = Arc::new(MemoryRecordLog::new());
        let image_store: Arc<dyn ImageStore> = Arc::new(MemoryImageStore::new());
        Self::with_stores(settings, driver, suggestions, record_log, image_store)
    }

    /// Wire a context against caller-owned stores. This is how parallel
    /// workers share one history log and one baseline store.
    pub fn with_stores(
        settings: Settings,
        driver: Arc<dyn BrowserDriver>,
        suggestions: Arc<dyn SuggestionProvider>,
        record_log: Arc<dyn RecordLog>,
        image_store: Arc<dyn ImageStore>,
    ) -> Self {
        let run_id = RunId::new();
        let resolver = LocatorResolver::new(Arc::clone(&driver), Arc::clone(&suggestions))
            .with_defaults(settings.resolve_options());
        let waits = WaitCoordinator::new(Arc::clone(&driver)).with_defaults(settings.wait_options());
        let flakiness = FlakinessAnalyzer::new(record_log, suggestions)
            .with_config(settings.analyzer_config());
        let visual =
            VisualDiffEngine::new(image_store).with_defaults(settings.compare_options());

        info!(run_id = %run_id, "run context created");
        Self {
            run_id,
            settings,
            resolver,
            waits,
            flakiness,
            visual,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn resolver(&self) -> &LocatorResolver {
        &self.resolver
    }

    pub fn waits(&self) -> &WaitCoordinator {
        &self.waits
    }

    pub fn flakiness(&self) -> &FlakinessAnalyzer {
        &self.flakiness
    }

    pub fn visual(&self) -> &VisualDiffEngine {
        &self.visual
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driver_adapter::stub::StubDriver;
    use suggest_bridge::DisabledSuggestions;

    #[tokio::test]
    async fn test_contexts_have_distinct_run_ids_and_caches() {
        let driver: Arc<dyn BrowserDriver> = Arc::new(StubDriver::new());
        let a = RunContext::in_memory(
            Settings::default(),
            Arc::clone(&driver),
            Arc::new(DisabledSuggestions),
        );
        let b = RunContext::in_memory(
            Settings::default(),
            Arc::clone(&driver),
            Arc::new(DisabledSuggestions),
        );

        assert_ne!(a.run_id(), b.run_id());

        // Caches are per-context, never shared
        a.resolver().cache().store(
            "login button",
            "#login",
            locator_resolver::CandidateSource::Structural,
        );
        assert!(b.resolver().cache().get("login button").is_none());
    }
}

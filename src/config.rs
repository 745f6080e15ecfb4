//! Configuration surface for the engine
//!
//! Defaults, an optional JSON file, then environment overrides, highest
//! precedence last. All knobs the components expose are reachable here;
//! unknown file keys are ignored so configs can be shared with outer
//! tooling.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use flakiness_analyzer::AnalyzerConfig;
use locator_resolver::ResolveOptions;
use visual_diff::CompareOptions;
use wait_coordinator::WaitOptions;

/// Configuration error enumeration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Engine settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default wait timeout (milliseconds).
    pub default_timeout_ms: u64,

    /// Per-candidate probe timeout during full resolution (milliseconds).
    pub probe_timeout_ms: u64,

    /// Short probe used to re-validate cached selectors (milliseconds).
    pub cache_probe_timeout_ms: u64,

    /// Polling interval for waits without native support (milliseconds).
    pub poll_interval_ms: u64,

    /// Consecutive stable samples required for geometric stability.
    pub stability_samples: u32,

    /// Stability epsilon in page units.
    pub stability_epsilon: f64,

    /// Flakiness classification threshold in [0,1].
    pub flaky_threshold: f64,

    /// Visual diff pass/fail ratio threshold in [0,1].
    pub diff_threshold: f64,

    /// Per-pixel perceptual sensitivity in [0,1].
    pub pixel_threshold: f64,

    /// Whether the generative-suggestion capability is consulted.
    pub suggestions_enabled: bool,

    /// Root directory for baselines and diff artifacts.
    pub artifacts_dir: PathBuf,

    /// Path of the append-only execution history log.
    pub history_log: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_timeout_ms: 10_000,
            probe_timeout_ms: 5_000,
            cache_probe_timeout_ms: 1_000,
            poll_interval_ms: 100,
            stability_samples: 3,
            stability_epsilon: 1.0,
            flaky_threshold: 0.3,
            diff_threshold: 0.2,
            pixel_threshold: 0.1,
            suggestions_enabled: true,
            artifacts_dir: PathBuf::from("test-artifacts"),
            history_log: PathBuf::from("test-artifacts/history.jsonl"),
        }
    }
}

impl Settings {
    /// Load settings: defaults, then the JSON file (if any), then
    /// `TESTKEEL_*` environment overrides.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match config_file {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(path)?;
                debug!(path = %path.display(), "loading settings file");
                serde_json::from_str(&raw)?
            }
            _ => Settings::default(),
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse::<f64>("TESTKEEL_DIFF_THRESHOLD") {
            self.diff_threshold = v;
        }
        if let Some(v) = env_parse::<f64>("TESTKEEL_PIXEL_THRESHOLD") {
            self.pixel_threshold = v;
        }
        if let Some(v) = env_parse::<f64>("TESTKEEL_FLAKY_THRESHOLD") {
            self.flaky_threshold = v;
        }
        if let Some(v) = env_parse::<u64>("TESTKEEL_DEFAULT_TIMEOUT_MS") {
            self.default_timeout_ms = v;
        }
        if let Some(v) = env_parse::<u64>("TESTKEEL_PROBE_TIMEOUT_MS") {
            self.probe_timeout_ms = v;
        }
        if let Ok(v) = std::env::var("TESTKEEL_SUGGESTIONS") {
            self.suggestions_enabled =
                matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Ok(v) = std::env::var("TESTKEEL_ARTIFACTS_DIR") {
            if !v.trim().is_empty() {
                self.artifacts_dir = PathBuf::from(v);
            }
        }
        if let Ok(v) = std::env::var("TESTKEEL_HISTORY_LOG") {
            if !v.trim().is_empty() {
                self.history_log = PathBuf::from(v);
            }
        }
    }

    /// Resolve options derived from these settings.
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            cache_probe_timeout: Duration::from_millis(self.cache_probe_timeout_ms),
            use_suggestions: self.suggestions_enabled,
            extra_fallbacks: Vec::new(),
        }
    }

    /// Wait options derived from these settings.
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout: Duration::from_millis(self.default_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            stability_samples: self.stability_samples,
            stability_epsilon: self.stability_epsilon,
        }
    }

    /// Analyzer thresholds derived from these settings.
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            flaky_threshold: self.flaky_threshold,
            ..AnalyzerConfig::default()
        }
    }

    /// Visual comparison options derived from these settings.
    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            threshold: self.diff_threshold,
            pixel_threshold: self.pixel_threshold,
            ignore_regions: Vec::new(),
            update_baseline: false,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

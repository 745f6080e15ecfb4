//! Configuration and report types for flakiness analysis

use serde::{Deserialize, Serialize};
use testkeel_core_types::TestId;

/// Thresholds controlling scoring and classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// A test is classified flaky at or above this score.
    pub flaky_threshold: f64,

    /// Duration coefficient of variation above which a timing reason fires.
    pub duration_cv_threshold: f64,

    /// Segment pass rates below this fire an environment reason.
    pub env_pass_rate_threshold: f64,

    /// Average retry count above which a retry reason fires.
    pub retry_avg_threshold: f64,

    /// Sample-size confidence saturates at this many runs.
    pub confidence_saturation_runs: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            flaky_threshold: 0.3,
            duration_cv_threshold: 0.5,
            env_pass_rate_threshold: 0.8,
            retry_avg_threshold: 1.0,
            confidence_saturation_runs: 10,
        }
    }
}

/// Derived flakiness assessment for one test.
///
/// Recomputed from the full history on demand; the history log is the
/// source of truth, never this report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlakinessReport {
    pub test_id: TestId,

    /// Flakiness estimate in [0,1].
    pub score: f64,

    /// Whether `score` crossed the configured threshold.
    pub is_flaky: bool,

    /// Executed (non-skipped) runs observed.
    pub total_runs: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,

    /// Ordered, deduplicated contributing reasons.
    pub reasons: Vec<String>,

    /// Actions derived from the reason categories that fired.
    pub recommendations: Vec<String>,

    /// Trust in this report, in [0,1].
    pub confidence: f64,
}

impl FlakinessReport {
    /// The most conservative report: no data, no claims.
    pub fn empty(test_id: TestId) -> Self {
        Self {
            test_id,
            score: 0.0,
            is_flaky: false,
            total_runs: 0,
            passed: 0,
            failed: 0,
            skipped: 0,
            reasons: Vec::new(),
            recommendations: Vec::new(),
            confidence: 0.0,
        }
    }
}

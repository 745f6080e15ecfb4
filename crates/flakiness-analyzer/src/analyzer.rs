//! History aggregation and per-test scoring

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use run_store::RecordLog;
use suggest_bridge::{FailureInsight, SuggestionProvider};
use testkeel_core_types::{ExecutionRecord, Outcome, TestId};
use tracing::{debug, info, warn};

use crate::errors::AnalyzerError;
use crate::signature::normalize_signature;
use crate::types::{AnalyzerConfig, FlakinessReport};

/// Combine the statistical score with an external (generative) score.
///
/// Named policy: take the maximum. External insight can raise a computed
/// risk but can never suppress a statistically detected problem.
pub fn combine_scores(statistical: f64, external: f64) -> f64 {
    statistical.max(external.clamp(0.0, 1.0))
}

/// Aggregates execution history and computes flakiness reports.
pub struct FlakinessAnalyzer {
    log: Arc<dyn RecordLog>,
    insight: Arc<dyn SuggestionProvider>,
    config: AnalyzerConfig,
}

impl FlakinessAnalyzer {
    pub fn new(log: Arc<dyn RecordLog>, insight: Arc<dyn SuggestionProvider>) -> Self {
        Self {
            log,
            insight,
            config: AnalyzerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    /// Append one outcome to the history log.
    pub async fn record_outcome(&self, record: ExecutionRecord) -> Result<(), AnalyzerError> {
        debug!(test_id = %record.test_id, outcome = ?record.outcome, "recording outcome");
        self.log.append(&record).await?;
        Ok(())
    }

    /// Compute a report for every test present in the history.
    ///
    /// Never fails: an unreadable history yields an empty list, and the
    /// insight capability is best-effort.
    pub async fn analyze(&self) -> Vec<FlakinessReport> {
        let records = match self.log.read_all().await {
            Ok(records) => records,
            Err(err) => {
                warn!(%err, "history unreadable; reporting nothing");
                return Vec::new();
            }
        };

        let insights = self.fetch_insights(&records).await;
        let mut by_test: BTreeMap<TestId, Vec<ExecutionRecord>> = BTreeMap::new();
        for record in records {
            by_test
                .entry(record.test_id.clone())
                .or_default()
                .push(record);
        }
        let reports: Vec<FlakinessReport> = by_test
            .into_iter()
            .map(|(test_id, records)| {
                let insight = insights.get(&test_id);
                self.build_report(test_id, &records, insight)
            })
            .collect();

        info!(tests = reports.len(), "flakiness analysis complete");
        reports
    }

    /// Compute the report for one test. Missing history yields the
    /// conservative empty report, never an error.
    pub async fn report_for(&self, test_id: &TestId) -> FlakinessReport {
        let records = match self.log.read_all().await {
            Ok(records) => records,
            Err(err) => {
                warn!(%err, test_id = %test_id, "history unreadable; reporting conservatively");
                return FlakinessReport::empty(test_id.clone());
            }
        };

        let records: Vec<ExecutionRecord> = records
            .into_iter()
            .filter(|r| &r.test_id == test_id)
            .collect();
        if records.is_empty() {
            return FlakinessReport::empty(test_id.clone());
        }

        let insights = self.fetch_insights(&records).await;
        self.build_report(test_id.clone(), &records, insights.get(test_id))
    }

    /// Ask the suggestion capability to explain the observed failures.
    /// Best-effort: disabled providers are skipped silently, errors are
    /// downgraded to a warning.
    async fn fetch_insights(&self, sample: &[ExecutionRecord]) -> HashMap<TestId, FailureInsight> {
        if !self.insight.is_enabled() {
            return HashMap::new();
        }
        match self.insight.explain_failures(sample).await {
            Ok(insights) => {
                let mut map = HashMap::new();
                for insight in insights {
                    map.entry(insight.test_id.clone()).or_insert(insight);
                }
                map
            }
            Err(err) if err.is_disabled() => HashMap::new(),
            Err(err) => {
                warn!(%err, "failure insight unavailable; statistics-only analysis");
                HashMap::new()
            }
        }
    }

    fn build_report(
        &self,
        test_id: TestId,
        records: &[ExecutionRecord],
        insight: Option<&FailureInsight>,
    ) -> FlakinessReport {
        let executed: Vec<&ExecutionRecord> = records
            .iter()
            .filter(|r| r.outcome != Outcome::Skipped)
            .collect();
        let skipped = records.len() - executed.len();

        if executed.is_empty() {
            let mut report = FlakinessReport::empty(test_id);
            report.skipped = skipped;
            return report;
        }

        let total = executed.len();
        let passed = executed.iter().filter(|r| r.outcome.is_passed()).count();
        let failed = executed.iter().filter(|r| r.outcome.is_failed()).count();
        let pass_rate = passed as f64 / total as f64;
        let mut score = (1.0 - pass_rate).clamp(0.0, 1.0);
        let mut reasons: Vec<String> = Vec::new();

        // Timing sensitivity: coefficient of variation of durations
        let durations: Vec<f64> = executed.iter().map(|r| r.duration_ms as f64).collect();
        let cv = coefficient_of_variation(&durations);
        if cv > self.config.duration_cv_threshold {
            reasons.push(format!(
                "High duration variance (cv {:.2}) indicates timing sensitivity",
                cv
            ));
        }

        // Recurring failure causes: normalized signature clustering
        for (signature, count) in cluster_signatures(&executed) {
            if count > 1 {
                reasons.push(format!("Recurring error ({}x): {}", count, signature));
            }
        }

        // Retry pressure, even when the final outcome passed
        let retry_sum: u32 = executed.iter().map(|r| r.retries).sum();
        let avg_retries = retry_sum as f64 / total as f64;
        let max_retries = executed.iter().map(|r| r.retries).max().unwrap_or(0);
        if avg_retries > self.config.retry_avg_threshold {
            reasons.push(format!(
                "High retry rate (avg {:.1}, max {}) before settling on an outcome",
                avg_retries, max_retries
            ));
        }

        // Environment-segmented pass rates
        self.segment_reasons(&executed, "browser", |r| &r.env.browser, &mut reasons);
        self.segment_reasons(&executed, "OS", |r| &r.env.os, &mut reasons);

        // External insight is max-merged: it can never lower the score
        if let Some(insight) = insight {
            score = combine_scores(score, insight.score);
            reasons.extend(insight.reasons.iter().cloned());
        }
        let reasons = dedup_preserving_order(reasons);
        let recommendations = recommendations_for(&reasons);

        let is_flaky = score >= self.config.flaky_threshold;
        let confidence = self.confidence(total, score);

        FlakinessReport {
            test_id,
            score,
            is_flaky,
            total_runs: total,
            passed,
            failed,
            skipped,
            reasons,
            recommendations,
            confidence,
        }
    }

    fn segment_reasons<'a, F>(
        &self,
        executed: &[&'a ExecutionRecord],
        dimension: &str,
        tag: F,
        reasons: &mut Vec<String>,
    ) where
        F: Fn(&'a ExecutionRecord) -> &'a String,
    {
        let mut segments: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for record in executed {
            let value = tag(*record);
            if value.is_empty() {
                continue;
            }
            let entry = segments.entry(value.as_str()).or_insert((0, 0));
            entry.1 += 1;
            if record.outcome.is_passed() {
                entry.0 += 1;
            }
        }
        for (value, (passed, total)) in segments {
            let rate = passed as f64 / total as f64;
            if rate < self.config.env_pass_rate_threshold {
                reasons.push(format!(
                    "Low pass rate on {} '{}': {}/{} passed",
                    dimension, value, passed, total
                ));
            }
        }
    }

    /// Mean of sample-size confidence (saturating at the configured run
    /// count) and score-clarity confidence (linear up to 0.5).
    fn confidence(&self, total_runs: usize, score: f64) -> f64 {
        let saturation = self.config.confidence_saturation_runs.max(1) as f64;
        let sample = (total_runs as f64 / saturation).min(1.0);
        let clarity = (score / 0.5).min(1.0);
        (sample + clarity) / 2.0
    }
}

/// Signature → occurrence count over failed runs, in first-seen order.
fn cluster_signatures(executed: &[&ExecutionRecord]) -> Vec<(String, usize)> {
    let mut clusters: Vec<(String, usize)> = Vec::new();
    for record in executed {
        if !record.outcome.is_failed() {
            continue;
        }
        let Some(error) = &record.error else { continue };
        let signature = normalize_signature(error);
        if signature.is_empty() {
            continue;
        }
        match clusters.iter_mut().find(|(sig, _)| sig == &signature) {
            Some((_, count)) => *count += 1,
            None => clusters.push((signature, 1)),
        }
    }
    clusters
}

fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean <= f64::EPSILON {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt() / mean
}

fn dedup_preserving_order(reasons: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    reasons
        .into_iter()
        .filter(|reason| seen.insert(reason.clone()))
        .collect()
}

/// Map fired reason categories to actions.
fn recommendations_for(reasons: &[String]) -> Vec<String> {
    let lower: Vec<String> = reasons.iter().map(|r| r.to_lowercase()).collect();
    let mentions = |keyword: &str| lower.iter().any(|r| r.contains(keyword));

    let mut recs = Vec::new();
    if mentions("duration variance") || mentions("timing") {
        recs.push(
            "Replace fixed sleeps with explicit waits for the states the test depends on"
                .to_string(),
        );
    }
    if mentions("timeout") {
        recs.push(
            "Increase operation timeouts or gate assertions behind a network-idle wait"
                .to_string(),
        );
    }
    if mentions("selector") || mentions("locator") || mentions("element not found") {
        recs.push(
            "Adopt resilient selectors (test ids) or self-healing locator resolution".to_string(),
        );
    }
    if mentions("retry rate") {
        recs.push(
            "Investigate retry pressure: a passing outcome after retries is masking instability"
                .to_string(),
        );
    }
    if mentions("low pass rate on") {
        recs.push(
            "Add environment-specific configuration for the affected browser/OS".to_string(),
        );
    }
    if mentions("data") {
        recs.push("Isolate test data so concurrent runs cannot contaminate each other".to_string());
    }
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use run_store::MemoryRecordLog;
    use suggest_bridge::{DisabledSuggestions, StaticSuggestions, SuggestError};
    use testkeel_core_types::EnvTags;

    fn record(id: &str, outcome: Outcome, duration_ms: u64) -> ExecutionRecord {
        ExecutionRecord::new(TestId::new(id), outcome, duration_ms)
            .with_env(EnvTags::new("chromium", "linux"))
    }

    fn analyzer() -> FlakinessAnalyzer {
        FlakinessAnalyzer::new(
            Arc::new(MemoryRecordLog::new()),
            Arc::new(DisabledSuggestions),
        )
    }

    async fn seed(analyzer: &FlakinessAnalyzer, records: Vec<ExecutionRecord>) {
        for r in records {
            analyzer.record_outcome(r).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_all_passing_scores_zero() {
        let analyzer = analyzer();
        seed(
            &analyzer,
            (0..10).map(|_| record("steady", Outcome::Passed, 100)).collect(),
        )
        .await;

        let report = analyzer.report_for(&TestId::new("steady")).await;
        assert_eq!(report.score, 0.0);
        assert!(!report.is_flaky);
        assert_eq!(report.total_runs, 10);
        assert_eq!(report.passed, 10);
    }

    #[tokio::test]
    async fn test_all_failing_scores_one() {
        let analyzer = analyzer();
        seed(
            &analyzer,
            (0..10)
                .map(|_| record("broken", Outcome::Failed, 100))
                .collect(),
        )
        .await;

        let report = analyzer.report_for(&TestId::new("broken")).await;
        assert_eq!(report.score, 1.0);
        assert!(report.is_flaky);
    }

    #[tokio::test]
    async fn test_login_scenario_recurring_timeout() {
        // 10 runs, 7 passes, 3 failures sharing a timeout signature
        let analyzer = analyzer();
        let mut records: Vec<ExecutionRecord> = (0..7)
            .map(|_| record("login test", Outcome::Passed, 1000))
            .collect();
        for ms in [5000u64, 9000, 12000] {
            records.push(
                record("login test", Outcome::Failed, 1000)
                    .with_error(format!("TimeoutError: waited {}ms for #submit", ms)),
            );
        }
        seed(&analyzer, records).await;

        let report = analyzer.report_for(&TestId::new("login test")).await;
        assert!((report.score - 0.3).abs() < 1e-9);
        assert!(report.is_flaky);
        assert!(report
            .reasons
            .iter()
            .any(|r| r.starts_with("Recurring error (3x):")));
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("timeouts") || r.contains("network-idle")));
        assert!((report.confidence - 0.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_score_always_in_unit_interval() {
        let analyzer = analyzer();
        seed(
            &analyzer,
            vec![
                record("mix", Outcome::Passed, 50),
                record("mix", Outcome::Failed, 80),
                record("mix", Outcome::Skipped, 0),
                record("mix", Outcome::Passed, 60),
            ],
        )
        .await;

        let report = analyzer.report_for(&TestId::new("mix")).await;
        assert!((0.0..=1.0).contains(&report.score));
        assert_eq!(report.skipped, 1);
        assert_eq!(report.total_runs, 3);
    }

    #[tokio::test]
    async fn test_confidence_monotonic_in_sample_count() {
        // Hold the score fixed at 1.0 (all failed) and grow the sample
        let mut previous = 0.0;
        for n in 1..=12 {
            let analyzer = analyzer();
            seed(
                &analyzer,
                (0..n).map(|_| record("t", Outcome::Failed, 100)).collect(),
            )
            .await;
            let report = analyzer.report_for(&TestId::new("t")).await;
            assert!(report.confidence >= previous);
            previous = report.confidence;
        }
        // Saturated at and beyond 10 runs
        assert_eq!(previous, 1.0);
    }

    #[tokio::test]
    async fn test_duration_variance_reason() {
        let analyzer = analyzer();
        seed(
            &analyzer,
            vec![
                record("slowfast", Outcome::Passed, 100),
                record("slowfast", Outcome::Passed, 120),
                record("slowfast", Outcome::Passed, 4000),
            ],
        )
        .await;

        let report = analyzer.report_for(&TestId::new("slowfast")).await;
        assert!(report
            .reasons
            .iter()
            .any(|r| r.contains("duration variance")));
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("explicit waits")));
    }

    #[tokio::test]
    async fn test_retry_reason_fires_even_when_passing() {
        let analyzer = analyzer();
        seed(
            &analyzer,
            (0..5)
                .map(|_| record("retrier", Outcome::Passed, 100).with_retries(3))
                .collect(),
        )
        .await;

        let report = analyzer.report_for(&TestId::new("retrier")).await;
        assert_eq!(report.score, 0.0);
        assert!(report.reasons.iter().any(|r| r.contains("retry rate")));
    }

    #[tokio::test]
    async fn test_environment_segmentation() {
        let analyzer = analyzer();
        let mut records: Vec<ExecutionRecord> = (0..5)
            .map(|_| record("cross", Outcome::Passed, 100))
            .collect();
        for i in 0..4 {
            let outcome = if i == 0 { Outcome::Passed } else { Outcome::Failed };
            records.push(
                ExecutionRecord::new(TestId::new("cross"), outcome, 100)
                    .with_env(EnvTags::new("webkit", "macos")),
            );
        }
        seed(&analyzer, records).await;

        let report = analyzer.report_for(&TestId::new("cross")).await;
        assert!(report
            .reasons
            .iter()
            .any(|r| r.contains("browser 'webkit'")));
        assert!(report.reasons.iter().any(|r| r.contains("OS 'macos'")));
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("environment-specific")));
    }

    #[tokio::test]
    async fn test_unknown_test_yields_conservative_report() {
        let analyzer = analyzer();
        let report = analyzer.report_for(&TestId::new("never ran")).await;
        assert_eq!(report.score, 0.0);
        assert_eq!(report.confidence, 0.0);
        assert!(report.reasons.is_empty());
    }

    #[tokio::test]
    async fn test_insight_can_raise_but_not_lower() {
        let insight = Arc::new(StaticSuggestions::new());
        insight.add_insight(FailureInsight {
            test_id: TestId::new("quiet"),
            reasons: vec!["Shared test data mutated by a sibling test".to_string()],
            score: 0.7,
        });
        let analyzer =
            FlakinessAnalyzer::new(Arc::new(MemoryRecordLog::new()), insight);
        seed(
            &analyzer,
            (0..10).map(|_| record("quiet", Outcome::Passed, 100)).collect(),
        )
        .await;

        let report = analyzer.report_for(&TestId::new("quiet")).await;
        // Statistical score is 0; the external score raises it
        assert_eq!(report.score, 0.7);
        assert!(report.is_flaky);
        assert!(report.reasons.iter().any(|r| r.contains("test data")));
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("Isolate test data")));
    }

    #[tokio::test]
    async fn test_insight_failure_keeps_statistics() {
        struct FailingInsight;

        #[async_trait]
        impl SuggestionProvider for FailingInsight {
            async fn suggest_selectors(
                &self,
                _description: &str,
                _dom_snapshot: Option<&str>,
            ) -> Result<Vec<String>, SuggestError> {
                Err(SuggestError::Unavailable("gateway down".to_string()))
            }

            async fn explain_failures(
                &self,
                _records: &[ExecutionRecord],
            ) -> Result<Vec<FailureInsight>, SuggestError> {
                Err(SuggestError::Unavailable("gateway down".to_string()))
            }
        }

        let analyzer =
            FlakinessAnalyzer::new(Arc::new(MemoryRecordLog::new()), Arc::new(FailingInsight));
        seed(
            &analyzer,
            (0..4).map(|_| record("t", Outcome::Failed, 100)).collect(),
        )
        .await;

        let report = analyzer.report_for(&TestId::new("t")).await;
        assert_eq!(report.score, 1.0);
    }

    #[tokio::test]
    async fn test_analyze_covers_all_tests_in_order() {
        let analyzer = analyzer();
        seed(
            &analyzer,
            vec![
                record("b", Outcome::Passed, 100),
                record("a", Outcome::Failed, 100),
                record("b", Outcome::Failed, 100),
            ],
        )
        .await;

        let reports = analyzer.analyze().await;
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].test_id, TestId::new("a"));
        assert_eq!(reports[1].test_id, TestId::new("b"));
        assert_eq!(reports[1].total_runs, 2);
    }

    #[test]
    fn test_combine_scores_is_max() {
        assert_eq!(combine_scores(0.3, 0.1), 0.3);
        assert_eq!(combine_scores(0.1, 0.6), 0.6);
        // Out-of-range external scores are clamped, not trusted
        assert_eq!(combine_scores(0.4, 7.0), 1.0);
        assert_eq!(combine_scores(0.4, -3.0), 0.4);
    }

    #[test]
    fn test_coefficient_of_variation() {
        assert_eq!(coefficient_of_variation(&[100.0]), 0.0);
        assert_eq!(coefficient_of_variation(&[100.0, 100.0, 100.0]), 0.0);
        assert!(coefficient_of_variation(&[100.0, 120.0, 4000.0]) > 0.5);
    }
}

//! Shared identifiers and data-model types for the TestKeel engine crates.
//!
//! The four engine crates (locator resolution, waiting, flakiness analysis,
//! visual comparison) do not call each other; this crate carries the only
//! conventions they share.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a test case, supplied by the caller.
///
/// Not generated: the test runner owns the naming scheme. Two records with
/// the same `TestId` belong to the same test's history.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestId(pub String);

impl TestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one engine run (one worker owning one browser session).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final outcome of one test execution.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed)
    }
}

/// Environment tags attached to an execution record.
///
/// Segmented pass-rate analysis groups by each tag independently.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct EnvTags {
    pub browser: String,
    pub os: String,
}

impl EnvTags {
    pub fn new(browser: impl Into<String>, os: impl Into<String>) -> Self {
        Self {
            browser: browser.into(),
            os: os.into(),
        }
    }
}

/// One test execution, appended to the shared history log.
///
/// Immutable once appended; the history is the source of truth that
/// flakiness reports are recomputed from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub test_id: TestId,
    pub outcome: Outcome,

    /// Wall-clock duration of the execution in milliseconds.
    pub duration_ms: u64,

    /// Number of retries the runner spent before settling on `outcome`.
    pub retries: u32,

    /// Raw error text of a failure, if any. Normalized into a signature
    /// only at analysis time; stored verbatim here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub env: EnvTags,

    pub recorded_at: DateTime<Utc>,
}

impl ExecutionRecord {
    pub fn new(test_id: TestId, outcome: Outcome, duration_ms: u64) -> Self {
        Self {
            test_id,
            outcome,
            duration_ms,
            retries: 0,
            error: None,
            env: EnvTags::default(),
            recorded_at: Utc::now(),
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_env(mut self, env: EnvTags) -> Self {
        self.env = env;
        self
    }
}

/// Axis-aligned rectangle in page coordinates.
///
/// Used for element geometry (bounding boxes) and stability sampling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Largest coordinate-wise delta between two rectangles.
    pub fn max_delta(&self, other: &Rect) -> f64 {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        let dw = (self.width - other.width).abs();
        let dh = (self.height - other.height).abs();
        dx.max(dy).max(dw).max(dh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_predicates() {
        assert!(Outcome::Passed.is_passed());
        assert!(!Outcome::Passed.is_failed());
        assert!(Outcome::Failed.is_failed());
        assert!(!Outcome::Skipped.is_passed());
        assert!(!Outcome::Skipped.is_failed());
    }

    #[test]
    fn test_record_roundtrip() {
        let record = ExecutionRecord::new(TestId::new("login test"), Outcome::Failed, 1200)
            .with_retries(2)
            .with_error("TimeoutError: waiting for selector")
            .with_env(EnvTags::new("chromium", "linux"));

        let json = serde_json::to_string(&record).unwrap();
        let back: ExecutionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn test_record_omits_missing_error() {
        let record = ExecutionRecord::new(TestId::new("t"), Outcome::Passed, 10);
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_rect_max_delta() {
        let a = Rect::new(10.0, 20.0, 100.0, 50.0);
        let b = Rect::new(10.5, 20.0, 100.0, 47.0);
        assert_eq!(a.max_delta(&b), 3.0);
        assert_eq!(a.max_delta(&a), 0.0);
    }

    #[test]
    fn test_run_id_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }
}

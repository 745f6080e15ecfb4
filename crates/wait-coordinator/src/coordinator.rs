//! Wait execution over the browser-control port

use std::sync::Arc;

use driver_adapter::{BrowserDriver, DriverError, LoadState};
use serde_json::Value;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::conditions::WaitCondition;
use crate::errors::WaitError;
use crate::types::WaitOptions;

/// Expression counting animation/transition effects still running.
const ANIMATIONS_SCRIPT: &str =
    "document.getAnimations().filter(a => a.playState === 'running').length";

/// Blocks a test's control flow until page conditions hold.
///
/// Element-state, network-idle, and response waits delegate to the
/// driver's native waits; the remaining kinds poll at
/// [`WaitOptions::poll_interval`].
pub struct WaitCoordinator {
    driver: Arc<dyn BrowserDriver>,
    defaults: WaitOptions,
}

impl WaitCoordinator {
    pub fn new(driver: Arc<dyn BrowserDriver>) -> Self {
        Self {
            driver,
            defaults: WaitOptions::default(),
        }
    }

    /// Replace the default wait options.
    pub fn with_defaults(mut self, defaults: WaitOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Await a condition with the coordinator's default options.
    pub async fn await_condition(&self, condition: &WaitCondition) -> Result<(), WaitError> {
        let defaults = self.defaults.clone();
        self.await_condition_with(condition, &defaults).await
    }

    /// Await a single condition. A timeout here is fatal, except for
    /// [`WaitCondition::AnimationsSettled`], which resolves at its cap.
    pub async fn await_condition_with(
        &self,
        condition: &WaitCondition,
        options: &WaitOptions,
    ) -> Result<(), WaitError> {
        debug!(condition = %condition, timeout_ms = options.timeout.as_millis() as u64, "awaiting");
        match condition {
            WaitCondition::ElementState { selector, state } => {
                let started = Instant::now();
                let handle = self
                    .driver
                    .locate(selector)
                    .await
                    .map_err(|err| WaitError::Driver(err.to_string()))?;
                handle
                    .wait_for(*state, options.timeout)
                    .await
                    .map_err(|err| self.map_driver_error(condition, err, started.elapsed()))
            }
            WaitCondition::NetworkIdle => {
                let started = Instant::now();
                self.driver
                    .wait_for_load_state(LoadState::NetworkIdle, options.timeout)
                    .await
                    .map_err(|err| self.map_driver_error(condition, err, started.elapsed()))
            }
            WaitCondition::ResponseMatching { pattern } => {
                let started = Instant::now();
                self.driver
                    .wait_for_response(pattern, options.timeout)
                    .await
                    .map_err(|err| self.map_driver_error(condition, err, started.elapsed()))
            }
            WaitCondition::AnimationsSettled => {
                self.wait_animations(options).await;
                Ok(())
            }
            WaitCondition::GeometricStability { selector } => {
                self.wait_stable(selector, options).await
            }
            WaitCondition::Script { expression } => self.wait_script(expression, options).await,
        }
    }

    /// Await the primary condition (fatal on timeout), then each optional
    /// enhancement (failures degrade to warnings).
    pub async fn await_with_enhancements(
        &self,
        primary: &WaitCondition,
        enhancements: &[WaitCondition],
    ) -> Result<(), WaitError> {
        self.await_condition(primary).await?;
        for extra in enhancements {
            if let Err(err) = self.await_condition(extra).await {
                warn!(condition = %extra, %err, "optional wait condition failed; continuing");
            }
        }
        Ok(())
    }

    /// Poll an arbitrary predicate until it returns true or the timeout
    /// elapses. `label` names the condition in timeout errors.
    pub async fn await_predicate<F>(
        &self,
        label: &str,
        mut predicate: F,
        options: &WaitOptions,
    ) -> Result<(), WaitError>
    where
        F: FnMut() -> bool + Send,
    {
        let started = Instant::now();
        let deadline = started + options.timeout;
        loop {
            if predicate() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(WaitError::timeout(label, started.elapsed()));
            }
            sleep(options.poll_interval).await;
        }
    }

    fn map_driver_error(
        &self,
        condition: &WaitCondition,
        err: DriverError,
        elapsed: std::time::Duration,
    ) -> WaitError {
        if err.is_timeout() {
            WaitError::timeout(condition.to_string(), elapsed)
        } else {
            WaitError::Driver(err.to_string())
        }
    }

    /// Wait for running animations to finish. Never fails: evaluation
    /// errors and the timeout cap both resolve, so a stuck or cancelled
    /// animation cannot block the test forever.
    async fn wait_animations(&self, options: &WaitOptions) {
        let started = Instant::now();
        let deadline = started + options.timeout;
        loop {
            match self.driver.evaluate(ANIMATIONS_SCRIPT).await {
                Ok(value) => {
                    let running = value.as_u64().or_else(|| {
                        value.as_f64().map(|f| f.max(0.0) as u64)
                    });
                    match running {
                        Some(0) => return,
                        Some(count) => {
                            debug!(count, "animations still running");
                        }
                        None => {
                            warn!(?value, "unexpected animation count; treating as settled");
                            return;
                        }
                    }
                }
                Err(err) => {
                    warn!(%err, "animation probe failed; treating as settled");
                    return;
                }
            }
            if Instant::now() >= deadline {
                warn!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "animations did not settle before timeout; continuing"
                );
                return;
            }
            sleep(options.poll_interval).await;
        }
    }

    /// Sample the bounding box until `stability_samples` consecutive
    /// samples agree within `stability_epsilon`. Any deviation, or a
    /// missing box, resets the streak.
    async fn wait_stable(&self, selector: &str, options: &WaitOptions) -> Result<(), WaitError> {
        let started = Instant::now();
        let deadline = started + options.timeout;
        let handle = self
            .driver
            .locate(selector)
            .await
            .map_err(|err| WaitError::Driver(err.to_string()))?;

        let mut last: Option<testkeel_core_types::Rect> = None;
        let mut streak: u32 = 0;
        loop {
            let bbox = handle
                .bounding_box()
                .await
                .map_err(|err| WaitError::Driver(err.to_string()))?;

            match (&bbox, &last) {
                (Some(rect), Some(prev)) if rect.max_delta(prev) <= options.stability_epsilon => {
                    streak += 1;
                }
                (Some(_), _) => {
                    // First sample, or the element moved: the streak
                    // restarts at the current sample
                    streak = 1;
                }
                (None, _) => {
                    streak = 0;
                }
            }
            last = bbox;

            if streak >= options.stability_samples {
                debug!(selector, samples = streak, "element geometrically stable");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(WaitError::timeout(
                    format!("element '{}' geometrically stable", selector),
                    started.elapsed(),
                ));
            }
            sleep(options.poll_interval).await;
        }
    }

    /// Poll a script expression until it evaluates truthy.
    async fn wait_script(&self, expression: &str, options: &WaitOptions) -> Result<(), WaitError> {
        let started = Instant::now();
        let deadline = started + options.timeout;
        loop {
            match self.driver.evaluate(expression).await {
                Ok(value) if is_truthy(&value) => return Ok(()),
                Ok(_) => {}
                Err(err) => {
                    debug!(%err, "script probe failed; retrying");
                }
            }
            if Instant::now() >= deadline {
                return Err(WaitError::timeout(
                    format!("script `{}` truthy", expression),
                    started.elapsed(),
                ));
            }
            sleep(options.poll_interval).await;
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driver_adapter::stub::StubDriver;
    use driver_adapter::ElementState;
    use serde_json::json;
    use std::time::Duration;
    use testkeel_core_types::Rect;

    fn fast_options() -> WaitOptions {
        WaitOptions::default()
            .with_timeout(Duration::from_millis(500))
            .with_poll_interval(Duration::from_millis(20))
    }

    fn coordinator(driver: &Arc<StubDriver>) -> WaitCoordinator {
        WaitCoordinator::new(Arc::clone(driver) as Arc<dyn BrowserDriver>)
            .with_defaults(fast_options())
    }

    #[tokio::test(start_paused = true)]
    async fn test_element_becomes_visible() {
        let driver = Arc::new(StubDriver::new());
        driver.add_appearing("#toast", Duration::from_millis(100));

        coordinator(&driver)
            .await_condition(&WaitCondition::visible("#toast"))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_element_timeout_is_fatal() {
        let driver = Arc::new(StubDriver::new());
        let err = coordinator(&driver)
            .await_condition(&WaitCondition::visible("#never"))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_and_hidden() {
        let driver = Arc::new(StubDriver::new());
        driver.add_hidden("#spinner");

        let waits = coordinator(&driver);
        waits
            .await_condition(&WaitCondition::hidden("#spinner"))
            .await
            .unwrap();
        waits
            .await_condition(&WaitCondition::element("#gone", ElementState::Detached))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_idle_and_response() {
        let driver = Arc::new(StubDriver::new());
        driver.set_load_delay(LoadState::NetworkIdle, Duration::from_millis(50));
        driver.complete_response("**/api/user", Duration::from_millis(80));

        let waits = coordinator(&driver);
        waits.await_condition(&WaitCondition::NetworkIdle).await.unwrap();
        waits
            .await_condition(&WaitCondition::response("**/api/user"))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_animations_settle() {
        let driver = Arc::new(StubDriver::new());
        driver.script_eval(ANIMATIONS_SCRIPT, vec![json!(2), json!(1), json!(0)]);

        coordinator(&driver)
            .await_condition(&WaitCondition::AnimationsSettled)
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_animations_resolve_at_cap() {
        let driver = Arc::new(StubDriver::new());
        driver.script_eval(ANIMATIONS_SCRIPT, vec![json!(3)]);

        let started = Instant::now();
        coordinator(&driver)
            .await_condition(&WaitCondition::AnimationsSettled)
            .await
            .unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(500));
        assert!(elapsed < Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn test_animation_probe_failure_is_tolerated() {
        let driver = Arc::new(StubDriver::new());
        driver.fail_eval(ANIMATIONS_SCRIPT, "execution context destroyed");

        coordinator(&driver)
            .await_condition(&WaitCondition::AnimationsSettled)
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_geometric_stability_after_transition() {
        let driver = Arc::new(StubDriver::new());
        driver.add_visible(".modal");
        driver.set_boxes(
            ".modal",
            vec![
                Rect::new(0.0, 0.0, 200.0, 100.0),
                Rect::new(20.0, 0.0, 200.0, 100.0),
                Rect::new(40.0, 0.0, 200.0, 100.0),
                Rect::new(40.5, 0.0, 200.0, 100.0),
                Rect::new(40.5, 0.0, 200.0, 100.0),
            ],
        );

        coordinator(&driver)
            .await_condition(&WaitCondition::stable(".modal"))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_geometric_stability_times_out_while_moving() {
        let driver = Arc::new(StubDriver::new());
        driver.add_visible(".marquee");
        // More positions than the wait can ever sample, all far apart
        let mut boxes = Vec::new();
        for i in 0..64 {
            boxes.push(Rect::new((i * 50) as f64, 0.0, 100.0, 20.0));
        }
        driver.set_boxes(".marquee", boxes);

        let err = coordinator(&driver)
            .await_condition(&WaitCondition::stable(".marquee"))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_script_condition() {
        let driver = Arc::new(StubDriver::new());
        driver.script_eval(
            "window.location.href === 'https://app/home'",
            vec![json!(false), json!(false), json!(true)],
        );

        coordinator(&driver)
            .await_condition(&WaitCondition::script(
                "window.location.href === 'https://app/home'",
            ))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_predicate() {
        let driver = Arc::new(StubDriver::new());
        let mut remaining = 3;
        coordinator(&driver)
            .await_predicate(
                "retries drained",
                move || {
                    remaining -= 1;
                    remaining == 0
                },
                &fast_options(),
            )
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_enhancement_timeout_degrades_to_warning() {
        let driver = Arc::new(StubDriver::new());
        driver.add_visible("#main");

        // Primary succeeds; the optional response never arrives
        coordinator(&driver)
            .await_with_enhancements(
                &WaitCondition::visible("#main"),
                &[WaitCondition::response("**/analytics")],
            )
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_primary_timeout_still_fatal_with_enhancements() {
        let driver = Arc::new(StubDriver::new());
        let err = coordinator(&driver)
            .await_with_enhancements(&WaitCondition::visible("#never"), &[])
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1.5)));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!({"a": 1})));
    }
}

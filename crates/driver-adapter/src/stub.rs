//! Scripted stub driver for deterministic engine tests
//!
//! Elements are declared with a timeline (hidden, visible, appearing after a
//! delay) and an optional sequence of bounding boxes replayed one per
//! sample. Script evaluations, response patterns, and load states are
//! scripted the same way. Works under `tokio::time::pause`, so wait-heavy
//! tests run in virtual time.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use testkeel_core_types::Rect;
use tokio::time::{sleep, Instant};

use crate::errors::DriverError;
use crate::types::{ElementState, LoadState};
use crate::{BrowserDriver, ElementHandle};

const STUB_POLL: Duration = Duration::from_millis(10);

/// Declared timeline for one stubbed element.
struct ScriptedElement {
    visible: bool,
    added_at: Instant,
    appear_after: Duration,
    boxes: Vec<Rect>,
    box_cursor: AtomicUsize,
}

impl ScriptedElement {
    fn attached(&self) -> bool {
        self.added_at.elapsed() >= self.appear_after
    }

    fn visible_now(&self) -> bool {
        self.attached() && self.visible
    }

    fn next_box(&self) -> Option<Rect> {
        if !self.attached() {
            return None;
        }
        if self.boxes.is_empty() {
            // Unconfigured geometry: a fixed box, stable across samples
            return Some(Rect::new(0.0, 0.0, 100.0, 30.0));
        }
        let idx = self.box_cursor.fetch_add(1, Ordering::SeqCst);
        let idx = idx.min(self.boxes.len() - 1);
        Some(self.boxes[idx])
    }
}

struct StubInner {
    elements: DashMap<String, ScriptedElement>,
    locate_calls: DashMap<String, usize>,
    eval_scripts: Mutex<HashMap<String, VecDeque<Value>>>,
    failing_scripts: DashMap<String, String>,
    responses: DashMap<String, (Instant, Duration)>,
    load_states: DashMap<LoadState, (Instant, Duration)>,
}

/// In-memory `BrowserDriver` with scripted behavior.
pub struct StubDriver {
    inner: Arc<StubInner>,
}

impl StubDriver {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StubInner {
                elements: DashMap::new(),
                locate_calls: DashMap::new(),
                eval_scripts: Mutex::new(HashMap::new()),
                failing_scripts: DashMap::new(),
                responses: DashMap::new(),
                load_states: DashMap::new(),
            }),
        }
    }

    /// Declare a visible element matching `selector`.
    pub fn add_visible(&self, selector: impl Into<String>) {
        self.add_element(selector, true, Duration::ZERO);
    }

    /// Declare an attached but hidden element.
    pub fn add_hidden(&self, selector: impl Into<String>) {
        self.add_element(selector, false, Duration::ZERO);
    }

    /// Declare an element that attaches (visible) only after `after`.
    pub fn add_appearing(&self, selector: impl Into<String>, after: Duration) {
        self.add_element(selector, true, after);
    }

    fn add_element(&self, selector: impl Into<String>, visible: bool, appear_after: Duration) {
        self.inner.elements.insert(
            selector.into(),
            ScriptedElement {
                visible,
                added_at: Instant::now(),
                appear_after,
                boxes: Vec::new(),
                box_cursor: AtomicUsize::new(0),
            },
        );
    }

    /// Replace the element's bounding-box sequence; the last box repeats
    /// once the sequence is exhausted.
    pub fn set_boxes(&self, selector: &str, boxes: Vec<Rect>) {
        if let Some(mut entry) = self.inner.elements.get_mut(selector) {
            entry.boxes = boxes;
            entry.box_cursor.store(0, Ordering::SeqCst);
        }
    }

    /// Detach an element.
    pub fn remove(&self, selector: &str) {
        self.inner.elements.remove(selector);
    }

    /// Queue evaluation results for `script`; the last value repeats.
    pub fn script_eval(&self, script: impl Into<String>, values: Vec<Value>) {
        self.inner
            .eval_scripts
            .lock()
            .insert(script.into(), values.into_iter().collect());
    }

    /// Make evaluation of `script` fail with `message`.
    pub fn fail_eval(&self, script: impl Into<String>, message: impl Into<String>) {
        self.inner
            .failing_scripts
            .insert(script.into(), message.into());
    }

    /// Script a response for `pattern` arriving `after` from now.
    pub fn complete_response(&self, pattern: impl Into<String>, after: Duration) {
        self.inner
            .responses
            .insert(pattern.into(), (Instant::now(), after));
    }

    /// Script a load state reached `after` from now. Unscripted states are
    /// reached immediately.
    pub fn set_load_delay(&self, state: LoadState, after: Duration) {
        self.inner
            .load_states
            .insert(state, (Instant::now(), after));
    }

    /// Number of `locate` calls issued for `selector`.
    pub fn locate_count(&self, selector: &str) -> usize {
        self.inner
            .locate_calls
            .get(selector)
            .map(|c| *c)
            .unwrap_or(0)
    }

    /// Total `locate` calls across all selectors.
    pub fn total_locates(&self) -> usize {
        self.inner.locate_calls.iter().map(|e| *e.value()).sum()
    }
}

impl Default for StubDriver {
    fn default() -> Self {
        Self::new()
    }
}

struct StubHandle {
    inner: Arc<StubInner>,
    selector: String,
}

impl StubHandle {
    fn state_holds(&self, state: ElementState) -> bool {
        let entry = self.inner.elements.get(&self.selector);
        match state {
            ElementState::Attached => entry.map(|e| e.attached()).unwrap_or(false),
            ElementState::Detached => !entry.map(|e| e.attached()).unwrap_or(false),
            ElementState::Visible => entry.map(|e| e.visible_now()).unwrap_or(false),
            ElementState::Hidden => !entry.map(|e| e.visible_now()).unwrap_or(false),
        }
    }
}

#[async_trait]
impl ElementHandle for StubHandle {
    async fn wait_for(&self, state: ElementState, timeout: Duration) -> Result<(), DriverError> {
        let started = Instant::now();
        let deadline = started + timeout;
        loop {
            if self.state_holds(state) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(DriverError::timeout(
                    format!("element '{}' to become {}", self.selector, state),
                    started.elapsed(),
                ));
            }
            sleep(STUB_POLL).await;
        }
    }

    async fn bounding_box(&self) -> Result<Option<Rect>, DriverError> {
        Ok(self
            .inner
            .elements
            .get(&self.selector)
            .and_then(|e| e.next_box()))
    }

    async fn is_visible(&self) -> Result<bool, DriverError> {
        Ok(self
            .inner
            .elements
            .get(&self.selector)
            .map(|e| e.visible_now())
            .unwrap_or(false))
    }
}

#[async_trait]
impl BrowserDriver for StubDriver {
    async fn locate(&self, selector: &str) -> Result<Arc<dyn ElementHandle>, DriverError> {
        *self
            .inner
            .locate_calls
            .entry(selector.to_string())
            .or_insert(0) += 1;
        Ok(Arc::new(StubHandle {
            inner: Arc::clone(&self.inner),
            selector: selector.to_string(),
        }))
    }

    async fn wait_for_load_state(
        &self,
        state: LoadState,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let ready_in = self
            .inner
            .load_states
            .get(&state)
            .map(|entry| {
                let (added, after) = *entry;
                after.saturating_sub(added.elapsed())
            })
            .unwrap_or(Duration::ZERO);

        if ready_in > timeout {
            sleep(timeout).await;
            return Err(DriverError::timeout(
                format!("load state {}", state),
                timeout,
            ));
        }
        sleep(ready_in).await;
        Ok(())
    }

    async fn wait_for_response(
        &self,
        pattern: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let ready_in = self.inner.responses.get(pattern).map(|entry| {
            let (added, after) = *entry;
            after.saturating_sub(added.elapsed())
        });

        match ready_in {
            Some(ready_in) if ready_in <= timeout => {
                sleep(ready_in).await;
                Ok(())
            }
            _ => {
                sleep(timeout).await;
                Err(DriverError::timeout(
                    format!("response matching '{}'", pattern),
                    timeout,
                ))
            }
        }
    }

    async fn evaluate(&self, script: &str) -> Result<Value, DriverError> {
        if let Some(message) = self.inner.failing_scripts.get(script) {
            return Err(DriverError::Evaluation(message.clone()));
        }
        let mut scripts = self.inner.eval_scripts.lock();
        match scripts.get_mut(script) {
            Some(queue) if queue.len() > 1 => Ok(queue.pop_front().unwrap()),
            Some(queue) => Ok(queue.front().cloned().unwrap_or(Value::Null)),
            None => Ok(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_visible_element_waits_immediately() {
        let driver = StubDriver::new();
        driver.add_visible("#ok");

        let handle = driver.locate("#ok").await.unwrap();
        handle
            .wait_for(ElementState::Visible, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(handle.is_visible().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_appearing_element() {
        let driver = StubDriver::new();
        driver.add_appearing("#late", Duration::from_millis(300));

        let handle = driver.locate("#late").await.unwrap();
        assert!(!handle.is_visible().await.unwrap());
        handle
            .wait_for(ElementState::Visible, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(handle.is_visible().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_element_times_out() {
        let driver = StubDriver::new();
        let handle = driver.locate("#ghost").await.unwrap();
        let err = handle
            .wait_for(ElementState::Visible, Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        // But absence satisfies hidden/detached straight away
        handle
            .wait_for(ElementState::Hidden, Duration::from_millis(50))
            .await
            .unwrap();
        handle
            .wait_for(ElementState::Detached, Duration::from_millis(50))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_box_sequence_replays_and_repeats() {
        let driver = StubDriver::new();
        driver.add_visible("#card");
        driver.set_boxes(
            "#card",
            vec![Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(5.0, 0.0, 10.0, 10.0)],
        );

        let handle = driver.locate("#card").await.unwrap();
        assert_eq!(handle.bounding_box().await.unwrap().unwrap().x, 0.0);
        assert_eq!(handle.bounding_box().await.unwrap().unwrap().x, 5.0);
        assert_eq!(handle.bounding_box().await.unwrap().unwrap().x, 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eval_queue_repeats_last_value() {
        let driver = StubDriver::new();
        driver.script_eval("count()", vec![json!(2), json!(1), json!(0)]);

        assert_eq!(driver.evaluate("count()").await.unwrap(), json!(2));
        assert_eq!(driver.evaluate("count()").await.unwrap(), json!(1));
        assert_eq!(driver.evaluate("count()").await.unwrap(), json!(0));
        assert_eq!(driver.evaluate("count()").await.unwrap(), json!(0));
        assert_eq!(driver.evaluate("unknown()").await.unwrap(), Value::Null);
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_and_load_state() {
        let driver = StubDriver::new();
        driver.complete_response("**/api/data", Duration::from_millis(100));
        driver.set_load_delay(LoadState::NetworkIdle, Duration::from_millis(50));

        driver
            .wait_for_response("**/api/data", Duration::from_secs(1))
            .await
            .unwrap();
        driver
            .wait_for_load_state(LoadState::NetworkIdle, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(driver
            .wait_for_response("**/other", Duration::from_millis(20))
            .await
            .unwrap_err()
            .is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_counting() {
        let driver = StubDriver::new();
        driver.add_visible("#a");
        driver.locate("#a").await.unwrap();
        driver.locate("#a").await.unwrap();
        driver.locate("#b").await.unwrap();

        assert_eq!(driver.locate_count("#a"), 2);
        assert_eq!(driver.locate_count("#b"), 1);
        assert_eq!(driver.total_locates(), 3);
    }
}

//! Browser-control port for the TestKeel engine.
//!
//! The engine never drives the browser itself; it consumes a narrow
//! capability surface:
//! - `locate` a selector into an element handle (lazy, never fails on
//!   absence; the handle reports state)
//! - element-level waits, visibility, and bounding boxes
//! - page-level load state, response matching, and script evaluation
//!
//! Production deployments implement [`BrowserDriver`] over their automation
//! transport. The bundled [`stub::StubDriver`] (feature `stub`, on by
//! default) scripts element timelines for deterministic engine tests.

pub mod errors;
pub mod types;

#[cfg(feature = "stub")]
pub mod stub;

pub use errors::DriverError;
pub use types::{ElementState, LoadState};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use testkeel_core_types::Rect;

/// Handle to one located element.
///
/// Handles are views, not pins: the element may appear, move, or detach
/// after the handle is created, and every method reflects the live state.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Block until the element reaches `state` or `timeout` elapses.
    async fn wait_for(&self, state: ElementState, timeout: Duration) -> Result<(), DriverError>;

    /// Current bounding box, or `None` while the element is not rendered.
    async fn bounding_box(&self) -> Result<Option<Rect>, DriverError>;

    /// Whether the element is currently visible.
    async fn is_visible(&self) -> Result<bool, DriverError>;
}

/// Browser-control capability consumed by the engine crates.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Build a handle for `selector`. Lazy: succeeds even when nothing
    /// matches yet; use [`ElementHandle::wait_for`] to require presence.
    async fn locate(&self, selector: &str) -> Result<Arc<dyn ElementHandle>, DriverError>;

    /// Block until the page reaches `state` or `timeout` elapses.
    async fn wait_for_load_state(
        &self,
        state: LoadState,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    /// Block until a response whose URL matches `pattern` is observed.
    async fn wait_for_response(&self, pattern: &str, timeout: Duration)
        -> Result<(), DriverError>;

    /// Evaluate a script expression against the live page.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, DriverError>;
}

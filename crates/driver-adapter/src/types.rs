//! State enumerations for element and page waits

use std::fmt;

use serde::{Deserialize, Serialize};

/// Observable element states a wait can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementState {
    /// Present in the DOM and rendered
    Visible,

    /// Absent from the DOM, or present but not rendered
    Hidden,

    /// Present in the DOM (rendered or not)
    Attached,

    /// Absent from the DOM
    Detached,
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementState::Visible => "visible",
            ElementState::Hidden => "hidden",
            ElementState::Attached => "attached",
            ElementState::Detached => "detached",
        };
        write!(f, "{}", name)
    }
}

/// Page-level load states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    DomContentLoaded,
    Load,

    /// No in-flight network activity for the backend's quiet window
    NetworkIdle,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadState::DomContentLoaded => "domcontentloaded",
            LoadState::Load => "load",
            LoadState::NetworkIdle => "networkidle",
        };
        write!(f, "{}", name)
    }
}

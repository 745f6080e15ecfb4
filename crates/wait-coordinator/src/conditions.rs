//! Condition kinds a wait can target

use std::fmt;

use driver_adapter::ElementState;
use serde::{Deserialize, Serialize};

/// One awaitable page or element condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WaitCondition {
    /// Element reaches a target state (visible/hidden/attached/detached)
    ElementState {
        selector: String,
        state: ElementState,
    },

    /// No in-flight network activity
    NetworkIdle,

    /// A response whose URL matches the pattern is observed
    ResponseMatching { pattern: String },

    /// All running animations and transitions have finished. Resolves
    /// rather than rejects on timeout: a stuck animation must not block
    /// the test forever.
    AnimationsSettled,

    /// The element's bounding box holds still for N consecutive samples
    GeometricStability { selector: String },

    /// A script expression evaluates truthy against the live page
    Script { expression: String },
}

impl WaitCondition {
    pub fn element(selector: impl Into<String>, state: ElementState) -> Self {
        Self::ElementState {
            selector: selector.into(),
            state,
        }
    }

    pub fn visible(selector: impl Into<String>) -> Self {
        Self::element(selector, ElementState::Visible)
    }

    pub fn hidden(selector: impl Into<String>) -> Self {
        Self::element(selector, ElementState::Hidden)
    }

    pub fn response(pattern: impl Into<String>) -> Self {
        Self::ResponseMatching {
            pattern: pattern.into(),
        }
    }

    pub fn stable(selector: impl Into<String>) -> Self {
        Self::GeometricStability {
            selector: selector.into(),
        }
    }

    pub fn script(expression: impl Into<String>) -> Self {
        Self::Script {
            expression: expression.into(),
        }
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitCondition::ElementState { selector, state } => {
                write!(f, "element '{}' {}", selector, state)
            }
            WaitCondition::NetworkIdle => write!(f, "network idle"),
            WaitCondition::ResponseMatching { pattern } => {
                write!(f, "response matching '{}'", pattern)
            }
            WaitCondition::AnimationsSettled => write!(f, "animations settled"),
            WaitCondition::GeometricStability { selector } => {
                write!(f, "element '{}' geometrically stable", selector)
            }
            WaitCondition::Script { expression } => write!(f, "script `{}` truthy", expression),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            WaitCondition::visible("#save").to_string(),
            "element '#save' visible"
        );
        assert_eq!(WaitCondition::NetworkIdle.to_string(), "network idle");
        assert_eq!(
            WaitCondition::stable(".modal").to_string(),
            "element '.modal' geometrically stable"
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let condition = WaitCondition::response("**/api/login");
        let json = serde_json::to_string(&condition).unwrap();
        let back: WaitCondition = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_string(), condition.to_string());
    }
}

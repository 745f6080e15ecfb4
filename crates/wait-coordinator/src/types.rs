//! Options for wait execution

use std::time::Duration;

/// Options shared by every wait kind.
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Overall timeout for the condition.
    pub timeout: Duration,

    /// Polling interval for conditions without a native event-driven wait.
    pub poll_interval: Duration,

    /// Consecutive stable samples required by geometric-stability waits.
    pub stability_samples: u32,

    /// Largest coordinate delta (position or size) still considered
    /// stable, in page units.
    pub stability_epsilon: f64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(100),
            stability_samples: 3,
            stability_epsilon: 1.0,
        }
    }
}

impl WaitOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = WaitOptions::default();
        assert_eq!(opts.timeout, Duration::from_secs(10));
        assert_eq!(opts.stability_samples, 3);
        assert_eq!(opts.stability_epsilon, 1.0);
    }
}

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use smol::Timer;
use tracing::{debug, warn};

use super::local_path;

/// Bounded, fixed-delay retry used when a picked file may not be on disk yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay_ms: u64,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, delay_ms: u64) -> Self {
        Self { attempts, delay_ms }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, 1000)
    }
}

/// Reads picked-file content, waiting out the gap between the picker event
/// and the file landing on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentReader {
    policy: RetryPolicy,
}

impl ContentReader {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Returns the file bytes, or `None` once every attempt has failed.
    ///
    /// Waits between attempts use a timer future, so the executor driving the
    /// host event loop is never blocked.
    pub async fn read(&self, path: &Path) -> Option<Vec<u8>> {
        let path = local_path(path);
        let attempts = self.policy.attempts.max(1);
        for attempt in 1..=attempts {
            if path.exists() {
                match smol::fs::read(&path).await {
                    Ok(bytes) => {
                        debug!(path = %path.display(), attempt, "read picked file");
                        return Some(bytes);
                    }
                    Err(err) => {
                        warn!(path = %path.display(), attempt, error = %err, "unable to read picked file");
                    }
                }
            } else {
                debug!(path = %path.display(), attempt, "picked file not on disk yet");
            }
            if attempt < attempts {
                Timer::after(self.policy.delay()).await;
            }
        }
        warn!(path = %path.display(), attempts, "giving up on picked file content");
        None
    }
}

//! Environment-based configuration.

use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Default wall-clock budget for one solve session, in seconds.
pub const DEFAULT_TIME_BUDGET_SEC: u64 = 170;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity email expected alongside the shared secret.
    pub email: String,
    /// Shared secret callers must present on `/quiz`.
    pub secret: String,
    /// Wall-clock budget for the follow-the-chain loop.
    pub time_budget: Duration,
    /// Explicit Chromium binary path, overriding discovery.
    pub chromium_path: Option<PathBuf>,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// Missing identity values are warned about rather than fatal — the
    /// `/quiz` secret check simply never passes until they are set.
    pub fn from_env() -> Self {
        let email = std::env::var("QUIZ_EMAIL").unwrap_or_default();
        let secret = std::env::var("QUIZ_SECRET").unwrap_or_default();
        if email.is_empty() || secret.is_empty() {
            warn!("QUIZ_EMAIL / QUIZ_SECRET not set in the environment");
        }

        let time_budget = std::env::var("QUIZ_TIME_BUDGET_SEC")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIME_BUDGET_SEC));

        let chromium_path = std::env::var("QUIZ_CHROMIUM_PATH").ok().map(PathBuf::from);

        Self {
            email,
            secret,
            time_budget,
            chromium_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budget() {
        assert_eq!(DEFAULT_TIME_BUDGET_SEC, 170);
        let d = Duration::from_secs(DEFAULT_TIME_BUDGET_SEC);
        assert!(d > Duration::from_secs(60));
    }
}

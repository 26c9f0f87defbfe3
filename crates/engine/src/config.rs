//! Tuning knobs for the host runtime.

use std::time::Duration;

/// Settings applied to every node run by the executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Per-request timeout for the authenticated HTTP helper.
    pub request_timeout: Duration,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("atoma-workflow/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

use std::time::Duration;

/// Runtime configuration for the client engine.
///
/// Loaded from the environment (`LEADSCOUT_*` variables, `.env` supported)
/// with defaults that match the hosted backend. Timing knobs are plain
/// fields so tests can zero them.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root URL of the backend; all endpoints are relative to it.
    pub base_url: String,
    /// Scraper API token forwarded with job-start requests.
    pub auth_token: Option<String>,
    pub bounds: LeadCountBounds,
    pub reconnect: ReconnectPolicy,
    pub delays: FlowDelays,
}

/// Product-configurable bounds on the requested lead count.
///
/// These are validation limits for starting a job, not invariants of the
/// engine; the backend may enforce its own.
#[derive(Debug, Clone)]
pub struct LeadCountBounds {
    pub min: u32,
    pub max: u32,
}

/// Reconnection policy for the live progress stream.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Maximum error-triggered retries before giving up on live updates.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

/// UX smoothing delays around flow transitions. Not correctness
/// requirements; zeroed in tests.
#[derive(Debug, Clone)]
pub struct FlowDelays {
    /// Pause after stream completion before fetching final results, so the
    /// backend can settle its task state.
    pub result_settle: Duration,
    /// Pause before redirecting the user away from a failed flow.
    pub redirect: Duration,
}

impl Default for LeadCountBounds {
    fn default() -> Self {
        Self {
            min: 500,
            max: 50_000,
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
        }
    }
}

impl Default for FlowDelays {
    fn default() -> Self {
        Self {
            result_settle: Duration::from_millis(1000),
            redirect: Duration::from_millis(2000),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            auth_token: None,
            bounds: LeadCountBounds::default(),
            reconnect: ReconnectPolicy::default(),
            delays: FlowDelays::default(),
        }
    }
}

impl ReconnectPolicy {
    /// Backoff delay before retry number `attempt` (1-based): doubles from
    /// `base_delay`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;
        let shift = attempt.min(20);
        let delay_ms = base_ms.saturating_mul(1u64 << shift).min(max_ms);
        Duration::from_millis(delay_ms)
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Config::default();
        if let Ok(base_url) = std::env::var("LEADSCOUT_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Ok(token) = std::env::var("LEADSCOUT_AUTH_TOKEN") {
            if !token.is_empty() {
                config.auth_token = Some(token);
            }
        }
        if let Some(min) = env_u32("LEADSCOUT_MIN_LEADS") {
            config.bounds.min = min;
        }
        if let Some(max) = env_u32("LEADSCOUT_MAX_LEADS") {
            config.bounds.max = max;
        }
        config
    }

    /// Config with all flow delays and backoff waits zeroed. Used by tests
    /// that drive the state machines without waiting out the UX pauses.
    pub fn immediate() -> Self {
        Self {
            reconnect: ReconnectPolicy {
                max_attempts: 5,
                base_delay: Duration::ZERO,
                max_delay: Duration::ZERO,
            },
            delays: FlowDelays {
                result_settle: Duration::ZERO,
                redirect: Duration::ZERO,
            },
            ..Config::default()
        }
    }
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.bounds.min, 500);
        assert_eq!(config.bounds.max, 50_000);
        assert_eq!(config.reconnect.max_attempts, 5);
        assert_eq!(config.delays.result_settle, Duration::from_millis(1000));
        assert_eq!(config.delays.redirect, Duration::from_millis(2000));
    }

    #[test]
    fn test_backoff_series_doubles_and_caps() {
        let policy = ReconnectPolicy::default();

        let series: Vec<u64> = (1..=5)
            .map(|n| policy.delay_for(n).as_millis() as u64)
            .collect();
        assert_eq!(series, vec![2000, 4000, 8000, 10_000, 10_000]);
    }

    #[test]
    fn test_backoff_with_zero_base_stays_zero() {
        let policy = Config::immediate().reconnect;

        for attempt in 1..=5 {
            assert_eq!(policy.delay_for(attempt), Duration::ZERO);
        }
    }

    #[test]
    fn test_immediate_config_zeroes_delays() {
        let config = Config::immediate();

        assert_eq!(config.delays.result_settle, Duration::ZERO);
        assert_eq!(config.delays.redirect, Duration::ZERO);
        assert_eq!(config.reconnect.base_delay, Duration::ZERO);
    }
}

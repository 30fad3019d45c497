use std::time::Duration;

use jobdash_core::view::DEFAULT_PAGE_SIZE;
use jobdash_db::store::DEFAULT_RECENT_OFFERS;
use jobdash_query::{QueryOptions, DEFAULT_STALE_TIME};

use crate::api::MAX_LATENCY_SCALE;

/// An environment variable that is set but unusable.
#[derive(Debug, thiserror::Error)]
#[error("Invalid {var}='{value}': {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Client configuration loaded from environment variables.
///
/// All fields have defaults matching the dashboard's behaviour, so an empty
/// environment is valid.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// How long a query result is served without refetching.
    pub stale_time: Duration,
    /// Optional cap on a single fetch.
    pub fetch_timeout: Option<Duration>,
    /// Rows per table page.
    pub page_size: usize,
    /// Offers in the home page "Recent saved offers" card.
    pub recent_offers_limit: usize,
    /// Multiplier on the mock API's simulated latencies (`0` disables them,
    /// at most `100`).
    pub mock_latency_scale: f64,
}

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                  | Default  |
    /// |--------------------------|----------|
    /// | `QUERY_STALE_TIME_MS`    | `300000` |
    /// | `QUERY_FETCH_TIMEOUT_MS` | unset    |
    /// | `PAGE_SIZE`              | `6`      |
    /// | `RECENT_OFFERS_LIMIT`    | `5`      |
    /// | `MOCK_LATENCY_SCALE`     | `1.0`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let stale_time_ms: Option<u64> = parse_var(&lookup, "QUERY_STALE_TIME_MS")?;
        let fetch_timeout_ms: Option<u64> = parse_var(&lookup, "QUERY_FETCH_TIMEOUT_MS")?;
        let page_size: Option<usize> = parse_var(&lookup, "PAGE_SIZE")?;
        let recent_offers_limit: Option<usize> = parse_var(&lookup, "RECENT_OFFERS_LIMIT")?;
        let mock_latency_scale: Option<f64> = parse_var(&lookup, "MOCK_LATENCY_SCALE")?;

        if page_size == Some(0) {
            return Err(invalid("PAGE_SIZE", "0", "must be at least 1"));
        }
        if let Some(scale) = mock_latency_scale {
            if !(0.0..=MAX_LATENCY_SCALE).contains(&scale) {
                return Err(invalid(
                    "MOCK_LATENCY_SCALE",
                    &scale.to_string(),
                    &format!("must be between 0 and {MAX_LATENCY_SCALE}"),
                ));
            }
        }

        Ok(Self {
            stale_time: stale_time_ms.map_or(DEFAULT_STALE_TIME, Duration::from_millis),
            fetch_timeout: fetch_timeout_ms.map(Duration::from_millis),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            recent_offers_limit: recent_offers_limit.unwrap_or(DEFAULT_RECENT_OFFERS),
            mock_latency_scale: mock_latency_scale.unwrap_or(1.0),
        })
    }

    /// Cache options derived from this configuration.
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            stale_time: self.stale_time,
            fetch_timeout: self.fetch_timeout,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            fetch_timeout: None,
            page_size: DEFAULT_PAGE_SIZE,
            recent_offers_limit: DEFAULT_RECENT_OFFERS,
            mock_latency_scale: 1.0,
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| invalid(var, &raw, &e.to_string())),
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.stale_time, Duration::from_millis(300_000));
        assert_eq!(config.page_size, 6);
        assert_eq!(config.recent_offers_limit, 5);
        assert!(config.fetch_timeout.is_none());
    }

    #[test]
    fn values_are_read_and_trimmed() {
        let config = load(&[
            ("QUERY_STALE_TIME_MS", "1000"),
            ("QUERY_FETCH_TIMEOUT_MS", " 2500 "),
            ("PAGE_SIZE", "10"),
            ("MOCK_LATENCY_SCALE", "0"),
        ])
        .unwrap();
        assert_eq!(config.stale_time, Duration::from_secs(1));
        assert_eq!(config.fetch_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.page_size, 10);
        assert_eq!(config.mock_latency_scale, 0.0);

        let options = config.query_options();
        assert_eq!(options.stale_time, Duration::from_secs(1));
    }

    #[test]
    fn unparseable_value_names_the_variable() {
        let err = load(&[("PAGE_SIZE", "six")]).unwrap_err();
        assert_eq!(err.var, "PAGE_SIZE");
        assert!(err.to_string().starts_with("Invalid PAGE_SIZE='six'"));
    }

    #[test]
    fn zero_page_size_and_negative_scale_are_rejected() {
        assert_eq!(load(&[("PAGE_SIZE", "0")]).unwrap_err().var, "PAGE_SIZE");
        assert_eq!(
            load(&[("MOCK_LATENCY_SCALE", "-1")]).unwrap_err().var,
            "MOCK_LATENCY_SCALE"
        );
    }

    #[test]
    fn latency_scale_is_bounded() {
        assert_eq!(load(&[("MOCK_LATENCY_SCALE", "100")]).unwrap().mock_latency_scale, 100.0);
        for raw in ["100.5", "1e30", "inf", "NaN"] {
            let err = load(&[("MOCK_LATENCY_SCALE", raw)]).unwrap_err();
            assert_eq!(err.var, "MOCK_LATENCY_SCALE", "{raw} should be rejected");
        }
    }
}

//! Pipeline configuration
//!
//! Values come from the environment (optionally seeded from a `.env` file).
//! A malformed value never aborts startup; it is logged and replaced by
//! the default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEADLINE_ENV: &str = "RESEARCH_DEADLINE_SECS";
pub const SAMPLE_SIZE_ENV: &str = "RESEARCH_DEFAULT_SAMPLE_SIZE";
pub const PARTICIPANTS_ENV: &str = "RESEARCH_DEFAULT_PARTICIPANTS";
pub const SPREAD_ENV: &str = "RESEARCH_COMPARISON_SPREAD";
pub const AUDIENCE_ENV: &str = "RESEARCH_DEFAULT_AUDIENCE";

const DEFAULT_DEADLINE: Duration = Duration::from_secs(8);
const DEFAULT_SAMPLE_SIZE: u32 = 500;
const DEFAULT_PARTICIPANTS: u32 = 8;
const DEFAULT_SPREAD: f64 = 15.0;
const DEFAULT_AUDIENCE: &str = "General Population";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Shared budget for every backend call in one turn
    pub deadline: Duration,
    /// Respondents per segment when the backend omits a usable sample size
    pub default_sample_size: u32,
    pub default_participant_count: u32,
    /// Maximum +/- percentage-point perturbation for legacy comparison fan-out
    pub comparison_spread: f64,
    pub default_audience: String,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
            default_sample_size: DEFAULT_SAMPLE_SIZE,
            default_participant_count: DEFAULT_PARTICIPANTS,
            comparison_spread: DEFAULT_SPREAD,
            default_audience: DEFAULT_AUDIENCE.to_string(),
        }
    }
}

impl ResearchConfig {
    /// Load from environment variables, reading `.env` first if present
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (env, test map, ...)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let deadline = parse_or(&lookup, DEADLINE_ENV, defaults.deadline.as_secs_f64())
            .filter(|secs| *secs > 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or(defaults.deadline);

        Self {
            deadline,
            default_sample_size: parse_or(&lookup, SAMPLE_SIZE_ENV, defaults.default_sample_size)
                .filter(|n| *n > 0)
                .unwrap_or(defaults.default_sample_size),
            default_participant_count: parse_or(
                &lookup,
                PARTICIPANTS_ENV,
                defaults.default_participant_count,
            )
            .filter(|n| *n > 0)
            .unwrap_or(defaults.default_participant_count),
            comparison_spread: parse_or(&lookup, SPREAD_ENV, defaults.comparison_spread)
                .filter(|s| s.is_finite() && *s >= 0.0)
                .unwrap_or(defaults.comparison_spread),
            default_audience: lookup(AUDIENCE_ENV)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.default_audience),
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

/// Parse `key` if set; a value that fails to parse logs and yields `default`
fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Option<T>
where
    T: std::str::FromStr + Copy,
{
    let Some(raw) = lookup(key) else {
        return Some(default);
    };
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring malformed config value");
            Some(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ResearchConfig::from_lookup(lookup(&[]));
        assert_eq!(config.deadline, Duration::from_secs(8));
        assert_eq!(config.default_sample_size, 500);
        assert_eq!(config.default_participant_count, 8);
        assert_eq!(config.comparison_spread, 15.0);
        assert_eq!(config.default_audience, "General Population");
    }

    #[test]
    fn test_overrides() {
        let config = ResearchConfig::from_lookup(lookup(&[
            (DEADLINE_ENV, "2.5"),
            (SAMPLE_SIZE_ENV, "1200"),
            (AUDIENCE_ENV, "US Adults"),
        ]));
        assert_eq!(config.deadline, Duration::from_millis(2500));
        assert_eq!(config.default_sample_size, 1200);
        assert_eq!(config.default_audience, "US Adults");
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = ResearchConfig::from_lookup(lookup(&[
            (DEADLINE_ENV, "soon"),
            (SAMPLE_SIZE_ENV, "0"),
            (SPREAD_ENV, "-3"),
            (AUDIENCE_ENV, "   "),
        ]));
        assert_eq!(config.deadline, Duration::from_secs(8));
        assert_eq!(config.default_sample_size, 500);
        assert_eq!(config.comparison_spread, 15.0);
        assert_eq!(config.default_audience, "General Population");
    }
}

use crate::error::{EngineError, Result};
use serde::Deserialize;

/// Environment prefix for every engine setting, e.g. `FEED_ENGINE_ACCELERATION=false`.
pub const ENV_PREFIX: &str = "FEED_ENGINE_";

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Try the vectorized backend before falling back to the reference one
    #[serde(default = "default_acceleration")]
    pub acceleration: bool,

    /// Extra attempts of the one-time backend initialization
    #[serde(default = "default_init_retries")]
    pub init_retries: u32,

    #[serde(default = "default_init_backoff_ms")]
    pub init_backoff_ms: u64,

    #[serde(default = "default_max_clusters")]
    pub max_clusters: usize,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Tolerance for the vectorized backend's startup self-check
    #[serde(default = "default_self_check_epsilon")]
    pub self_check_epsilon: f64,

    #[serde(default)]
    pub log_format: LogFormat,
}

/// Parameters of the opinion clustering pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusteringConfig {
    pub max_clusters: usize,
    pub max_iterations: usize,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_acceleration() -> bool {
    true
}

fn default_init_retries() -> u32 {
    1
}

fn default_init_backoff_ms() -> u64 {
    50
}

fn default_max_clusters() -> usize {
    4
}

fn default_max_iterations() -> usize {
    25
}

fn default_self_check_epsilon() -> f64 {
    1e-9
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            max_clusters: default_max_clusters(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            acceleration: default_acceleration(),
            init_retries: default_init_retries(),
            init_backoff_ms: default_init_backoff_ms(),
            max_clusters: default_max_clusters(),
            max_iterations: default_max_iterations(),
            self_check_epsilon: default_self_check_epsilon(),
            log_format: LogFormat::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config: EngineConfig = envy::prefixed(ENV_PREFIX).from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit key/value list; keys carry the `FEED_ENGINE_` prefix.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: EngineConfig = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_clusters == 0 {
            return Err(EngineError::invalid("max_clusters must be at least 1"));
        }
        if self.max_iterations == 0 {
            return Err(EngineError::invalid("max_iterations must be at least 1"));
        }
        if !self.self_check_epsilon.is_finite() || self.self_check_epsilon < 0.0 {
            return Err(EngineError::invalid(format!(
                "self_check_epsilon must be a non-negative finite number, got {}",
                self.self_check_epsilon
            )));
        }
        Ok(())
    }

    pub fn clustering(&self) -> ClusteringConfig {
        ClusteringConfig {
            max_clusters: self.max_clusters,
            max_iterations: self.max_iterations,
        }
    }

    /// Reference-only configuration, handy for tests and embedding.
    pub fn reference_only() -> Self {
        Self {
            acceleration: false,
            init_retries: 0,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_from_empty_env() {
        let config = EngineConfig::from_vars(Vec::new()).unwrap();

        assert!(config.acceleration);
        assert_eq!(config.init_retries, 1);
        assert_eq!(config.init_backoff_ms, 50);
        assert_eq!(config.max_clusters, 4);
        assert_eq!(config.max_iterations, 25);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_prefixed_overrides() {
        let config = EngineConfig::from_vars(vars(&[
            ("FEED_ENGINE_ACCELERATION", "false"),
            ("FEED_ENGINE_MAX_CLUSTERS", "3"),
            ("FEED_ENGINE_LOG_FORMAT", "json"),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();

        assert!(!config.acceleration);
        assert_eq!(config.max_clusters, 3);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_rejects_zero_clusters() {
        let result = EngineConfig::from_vars(vars(&[("FEED_ENGINE_MAX_CLUSTERS", "0")]));
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_unparseable_value() {
        let result = EngineConfig::from_vars(vars(&[("FEED_ENGINE_INIT_RETRIES", "many")]));
        assert!(matches!(result, Err(EngineError::Config(_))));
    }
}

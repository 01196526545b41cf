use crate::domain::ports::{ConfigProvider, StatsSource};
use crate::utils::error::{KbError, Result};
use crate::utils::validation::{validate_positive_number, validate_range, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const MAX_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub detection: DetectionConfig,
    pub history: HistoryConfig,
    pub stats: StatsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub delay_ms: u64,
    pub timeout_ms: u64,
    pub seed: Option<u64>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            delay_ms: 2000,
            timeout_ms: 10_000,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_entries: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub source: StatsSource,
}

impl SessionConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(KbError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Parses the configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| KbError::ConfigValidation {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` references with environment values (e.g. `${DETECTION_DELAY_MS}`).
    /// Unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| KbError::Config {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_positive_number("detection.timeout_ms", self.detection.timeout_ms, 1)?;
        validate_range("detection.delay_ms", self.detection.delay_ms, 0, MAX_DELAY_MS)?;

        if let Some(max_entries) = self.history.max_entries {
            validate_positive_number("history.max_entries", max_entries, 1)?;
        }

        if self.detection.delay_ms >= self.detection.timeout_ms {
            tracing::warn!(
                "detection.delay_ms ({}) is not below detection.timeout_ms ({}); every detection will time out",
                self.detection.delay_ms,
                self.detection.timeout_ms
            );
        }

        Ok(())
    }
}

impl ConfigProvider for SessionConfig {
    fn detection_delay(&self) -> Duration {
        Duration::from_millis(self.detection.delay_ms)
    }

    fn detection_timeout(&self) -> Duration {
        Duration::from_millis(self.detection.timeout_ms)
    }

    fn random_seed(&self) -> Option<u64> {
        self.detection.seed
    }

    fn history_max_entries(&self) -> Option<usize> {
        self.history.max_entries
    }

    fn stats_source(&self) -> StatsSource {
        self.stats.source
    }
}

impl Validate for SessionConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[detection]
delay_ms = 500
timeout_ms = 3000
seed = 42

[history]
max_entries = 100

[stats]
source = "live"
"#;

        let config = SessionConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.detection_delay(), Duration::from_millis(500));
        assert_eq!(config.detection_timeout(), Duration::from_secs(3));
        assert_eq!(config.random_seed(), Some(42));
        assert_eq!(config.history_max_entries(), Some(100));
        assert_eq!(config.stats_source(), StatsSource::Live);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.detection_delay(), Duration::from_secs(2));
        assert_eq!(config.detection_timeout(), Duration::from_secs(10));
        assert_eq!(config.stats_source(), StatsSource::Seed);
        assert!(config.history_max_entries().is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CROP_KB_TEST_DELAY", "750");

        let toml_content = r#"
[detection]
delay_ms = ${CROP_KB_TEST_DELAY}
"#;

        let config = SessionConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.detection.delay_ms, 750);

        std::env::remove_var("CROP_KB_TEST_DELAY");
    }

    #[test]
    fn test_config_validation() {
        let zero_timeout = SessionConfig::from_toml_str("[detection]\ntimeout_ms = 0\n").unwrap();
        assert!(zero_timeout.validate().is_err());

        let zero_cap = SessionConfig::from_toml_str("[history]\nmax_entries = 0\n").unwrap();
        assert!(zero_cap.validate().is_err());

        let long_delay = SessionConfig::from_toml_str("[detection]\ndelay_ms = 90000\n").unwrap();
        assert!(long_delay.validate().is_err());
    }

    #[test]
    fn test_unknown_stats_source_is_rejected() {
        let err = SessionConfig::from_toml_str("[stats]\nsource = \"psychic\"\n").unwrap_err();
        assert!(matches!(err, KbError::ConfigValidation { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[detection]\ndelay_ms = 0\nseed = 7\n")
            .unwrap();

        let config = SessionConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.detection.delay_ms, 0);
        assert_eq!(config.detection.seed, Some(7));
    }
}

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine configuration. Defaults are overridden by an optional JSON
/// config file (`PULSE_CONFIG` path), then by individual environment
/// variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// Archival window in whole calendar months.
    pub retention_months: u32,
    /// Records per external-store batch.
    pub rate_limit_batch_size: usize,
    /// Delay between batches, in milliseconds.
    pub rate_limit_delay_ms: u64,
    /// Conversation memory expiry.
    pub context_ttl_seconds: u64,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            retention_months: 1,
            rate_limit_batch_size: 100,
            rate_limit_delay_ms: 350,
            context_ttl_seconds: 3600,
        }
    }
}

impl PulseConfig {
    pub fn load() -> anyhow::Result<PulseConfig> {
        let mut config = match std::env::var_os("PULSE_CONFIG") {
            Some(path) => PulseConfig::from_file(Path::new(&path))?,
            None => PulseConfig::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<PulseConfig> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn apply_env(&mut self) {
        if let Some(v) = env_parse("PULSE_RETENTION_MONTHS") {
            self.retention_months = v;
        }
        if let Some(v) = env_parse("PULSE_RATE_LIMIT_BATCH_SIZE") {
            self.rate_limit_batch_size = v;
        }
        if let Some(v) = env_parse("PULSE_RATE_LIMIT_DELAY_MS") {
            self.rate_limit_delay_ms = v;
        }
        if let Some(v) = env_parse("PULSE_CONTEXT_TTL_SECONDS") {
            self.context_ttl_seconds = v;
        }
    }

    pub fn batch_policy(&self) -> pulse_store::BatchPolicy {
        pulse_store::BatchPolicy {
            batch_size: self.rate_limit_batch_size,
            delay: std::time::Duration::from_millis(self.rate_limit_delay_ms),
            max_retries: 3,
        }
    }

    pub fn retention_policy(&self) -> pulse_core::retention::RetentionPolicy {
        pulse_core::retention::RetentionPolicy {
            retention_months: self.retention_months,
        }
    }

    pub fn context_ttl(&self) -> time::Duration {
        time::Duration::seconds(self.context_ttl_seconds as i64)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

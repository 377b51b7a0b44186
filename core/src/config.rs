use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime configuration for the ledger. Every field has a default, so a
/// config file only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// SQLite path, or ":memory:" for a private in-memory database.
    pub db_path: String,
    /// How long a connection waits on a file lock before reporting busy.
    pub busy_timeout_ms: u64,
    /// Attempts after the first when the store reports lock contention.
    pub max_retries: u32,
    /// Backoff grows linearly by this step per retry...
    pub retry_backoff_ms: u64,
    /// ...up to this cap.
    pub max_backoff_ms: u64,
    /// Reject zero and negative payment amounts.
    pub require_positive_amount: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            db_path: ":memory:".to_string(),
            busy_timeout_ms: 5_000,
            max_retries: 20,
            retry_backoff_ms: 5,
            max_backoff_ms: 100,
            require_positive_amount: true,
        }
    }
}

impl LedgerConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: LedgerConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Shorter waits so a stuck lock fails a test quickly.
    pub fn default_test() -> Self {
        Self {
            busy_timeout_ms: 2_000,
            max_retries: 20,
            retry_backoff_ms: 1,
            max_backoff_ms: 10,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.db_path.trim().is_empty() {
            anyhow::bail!("db_path must not be empty");
        }
        if self.max_backoff_ms < self.retry_backoff_ms {
            anyhow::bail!(
                "max_backoff_ms ({}) is below retry_backoff_ms ({})",
                self.max_backoff_ms,
                self.retry_backoff_ms
            );
        }
        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

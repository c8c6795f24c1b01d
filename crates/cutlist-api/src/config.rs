use anyhow::{Context, Result};
use std::time::Duration;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_OPTIMIZE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_UNITS: u64 = 100_000;
const MAX_OPTIMIZE_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Server settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `CUTLIST_API_ADDR`
    pub addr: String,
    /// `CUTLIST_OPTIMIZE_TIMEOUT_SECS`, wall-clock budget for one optimization
    pub optimize_timeout: Duration,
    /// `CUTLIST_MAX_UNITS`, largest total cut-piece quantity accepted per request
    pub max_units: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            optimize_timeout: Duration::from_secs(DEFAULT_OPTIMIZE_TIMEOUT_SECS),
            max_units: DEFAULT_MAX_UNITS,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("CUTLIST_API_ADDR") {
            config.addr = addr;
        }

        if let Ok(secs) = std::env::var("CUTLIST_OPTIMIZE_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("CUTLIST_OPTIMIZE_TIMEOUT_SECS must be whole seconds, got '{secs}'"))?;
            if secs > MAX_OPTIMIZE_TIMEOUT_SECS {
                anyhow::bail!("CUTLIST_OPTIMIZE_TIMEOUT_SECS must be at most {MAX_OPTIMIZE_TIMEOUT_SECS}, got {secs}");
            }
            config.optimize_timeout = Duration::from_secs(secs);
        }

        if let Ok(units) = std::env::var("CUTLIST_MAX_UNITS") {
            config.max_units = units
                .trim()
                .parse()
                .with_context(|| format!("CUTLIST_MAX_UNITS must be a whole number, got '{units}'"))?;
        }

        Ok(config)
    }
}

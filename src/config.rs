use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub actions: ActionsApiConfig,
    pub relayer: RelayerConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionsApiConfig {
    /// Base URL of the onchain actions planning API
    pub base_url: String,
    /// HTTP timeout per request in milliseconds
    #[serde(default = "default_http_timeout")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayerConfig {
    /// Base URL of the signing relayer that submits transactions
    pub base_url: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_ms: u64,
    /// Optional bearer token for the relayer
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_http_timeout() -> u64 {
    30_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Extra attempts per planning call or submission
    pub max_retries: u32,
    /// Total position listing calls while the listing is still empty
    pub position_lookup_attempts: u32,
    /// Delay between position listing calls
    pub position_lookup_delay_ms: u64,
    /// Per-call timeout in milliseconds (0 = disabled)
    pub call_timeout_ms: u64,
    /// Slippage tolerance as a fraction (e.g., 0.005 = 0.5%)
    pub slippage: Decimal,
    /// Positions unwound concurrently (1 = sequential)
    #[serde(default = "default_unwind_concurrency")]
    pub unwind_concurrency: usize,
    /// Skip swapping reward dust below this amount when compounding
    #[serde(default)]
    pub min_swap_amount: Decimal,
}

fn default_unwind_concurrency() -> usize {
    1
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            position_lookup_attempts: 3,
            position_lookup_delay_ms: 1_000,
            call_timeout_ms: 60_000,
            slippage: dec!(0.005),
            unwind_concurrency: 1,
            min_swap_amount: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for the daily rolling log file; unset = console only
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("actions.base_url", "http://127.0.0.1:3500")?
            .set_default("relayer.base_url", "http://127.0.0.1:3600")?
            .set_default("execution.max_retries", 2)?
            .set_default("execution.position_lookup_attempts", 3)?
            .set_default("execution.position_lookup_delay_ms", 1_000)?
            .set_default("execution.call_timeout_ms", 60_000)?
            .set_default("execution.slippage", "0.005")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("YIELDEX_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (YIELDEX_ACTIONS__BASE_URL, etc.)
            .add_source(
                Environment::with_prefix("YIELDEX")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every run fail
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, raw) in [
            ("actions.base_url", &self.actions.base_url),
            ("relayer.base_url", &self.relayer.base_url),
        ] {
            url::Url::parse(raw)
                .map_err(|e| ConfigError::Message(format!("{name} is not a valid URL: {e}")))?;
        }
        if self.execution.unwind_concurrency == 0 {
            return Err(ConfigError::Message(
                "execution.unwind_concurrency must be at least 1".into(),
            ));
        }
        if self.execution.slippage < Decimal::ZERO || self.execution.slippage >= Decimal::ONE {
            return Err(ConfigError::Message(
                "execution.slippage must be in [0, 1)".into(),
            ));
        }
        Ok(())
    }
}

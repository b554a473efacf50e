//! Fundable Configuration
//!
//! Configuration management for a fund-order service.
//! Supports environment variables, `.env` files and config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundableConfig {
    /// Issuer identity settings
    #[serde(default)]
    pub issuer: IssuerSettings,

    /// Event delivery settings
    #[serde(default)]
    pub events: EventSettings,

    /// Snapshot storage settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Issuer identity settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerSettings {
    /// Deploying identity; becomes the first fund agent
    #[serde(default = "default_token_operator")]
    pub token_operator: String,

    /// Display symbol of the issued value
    #[serde(default = "default_asset_symbol")]
    pub asset_symbol: String,
}

impl Default for IssuerSettings {
    fn default() -> Self {
        Self {
            token_operator: default_token_operator(),
            asset_symbol: default_asset_symbol(),
        }
    }
}

/// Event delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSettings {
    /// Buffer of the broadcast channel feeding live subscribers
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Keep a hash-chained audit log of every event
    #[serde(default = "default_true")]
    pub audit_enabled: bool,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            audit_enabled: true,
        }
    }
}

/// Snapshot storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// JSON snapshot restored at startup when present
    pub snapshot_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `compact`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Install the global tracing subscriber
    ///
    /// A subscriber installed earlier is left in place.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.level));
        let registry = tracing_subscriber::registry().with(filter);

        let installed = match self.format.as_str() {
            "compact" => registry
                .with(tracing_subscriber::fmt::layer().compact())
                .try_init(),
            _ => registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init(),
        };

        if installed.is_err() {
            tracing::debug!("tracing subscriber already installed");
        }
    }
}

// =============================================================================
// Default Value Functions
// =============================================================================

fn default_token_operator() -> String {
    "0x00000000000000000000000000000000000000d1".to_string()
}

fn default_asset_symbol() -> String {
    "FUND".to_string()
}

fn default_channel_capacity() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Configuration Loading
// =============================================================================

impl FundableConfig {
    /// Load configuration from environment and optional config file
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        // FUNDABLE_ISSUER__TOKEN_OPERATOR=0x... and friends
        builder = builder.add_source(
            config::Environment::with_prefix("FUNDABLE")
                .separator("__")
                .try_parsing(true),
        );

        let fundable_config: FundableConfig = builder.build()?.try_deserialize()?;
        fundable_config.validate()?;

        Ok(fundable_config)
    }

    /// Create a configuration for development/testing
    pub fn development() -> Self {
        Self {
            issuer: IssuerSettings::default(),
            events: EventSettings::default(),
            storage: StorageSettings::default(),
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.issuer.token_operator.trim().is_empty() {
            anyhow::bail!("issuer.token_operator must not be empty");
        }
        if self.events.channel_capacity == 0 {
            anyhow::bail!("events.channel_capacity must be greater than zero");
        }
        Ok(())
    }
}

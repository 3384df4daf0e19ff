//! Configuration shared by the CLI commands.

use std::time::Duration;

use clap::Args;
use ksmart::shipping::DestinationId;

use crate::client::BackendConfig;

/// Backend connection settings.
#[derive(Debug, Args)]
pub struct BackendArgs {
    /// K-Smart backend base URL
    #[arg(long, env = "KSMART_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Bearer token for authenticated endpoints
    #[arg(long, env = "KSMART_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Destination id parcels ship from
    #[arg(long, env = "KSMART_SHIPPER_DESTINATION_ID", default_value_t = 0)]
    pub shipper_destination_id: u64,

    /// Request timeout in seconds
    #[arg(long, env = "KSMART_REQUEST_TIMEOUT_SECONDS", default_value_t = 15)]
    pub request_timeout_seconds: u64,
}

impl BackendArgs {
    /// Client configuration for these settings.
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.api_url.clone(),
            token: self.api_token.clone(),
            timeout: Duration::from_secs(self.request_timeout_seconds),
        }
    }

    /// Shipper destination.
    pub fn shipper(&self) -> DestinationId {
        DestinationId(self.shipper_destination_id)
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

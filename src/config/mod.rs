//! Configuration module for the BrainSAIT gateway.
//!
//! Configuration is loaded from environment variables (with `.env` support
//! via `dotenvy` in `main`) and optionally overlaid with a YAML file.
//! Priority: YAML > environment > defaults.
//!
//! The Gemini API key is the one required value: without it the process
//! refuses to start rather than serving with a broken upstream.
//!
//! # Example
//! ```rust,no_run
//! use brainsait_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable fallback
//! let config = ServerConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::core::gemini::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_LIVE_MODEL, DEFAULT_TEXT_MODEL, GeminiVoice, LiveConfig,
};

pub mod copilot;

pub use copilot::{COPILOT_SYSTEM_PROMPT, DEFAULT_COPILOT_LOCALE};

/// Default server port.
const DEFAULT_PORT: u16 = 4000;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The Gemini API key is missing
    #[error("GEMINI_API_KEY is required for the Gemini gateway")]
    MissingApiKey,

    /// An environment variable or YAML value could not be parsed
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    /// TLS requires both a certificate and a key path
    #[error("TLS configuration requires both cert and key paths")]
    PartialTls,

    /// The configuration file could not be read
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file could not be parsed
    #[error("Failed to parse configuration file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains everything needed to run the gateway: bind address, TLS,
/// the Gemini credential and model selection, the copilot locale, and
/// security settings (CORS, rate limiting).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Gemini settings
    pub gemini_api_key: String,
    pub gemini_text_model: String,
    pub gemini_live_model: String,
    pub gemini_live_voice: GeminiVoice,
    /// Live endpoint override, used by tests to point at a local server
    pub gemini_live_endpoint: Option<String>,
    /// REST endpoint override, used by tests to point at a local server
    pub gemini_text_endpoint: Option<String>,
    /// Bound on live session establishment
    pub live_connect_timeout_secs: u64,

    // Copilot settings
    pub copilot_locale: String,

    // Security settings
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: u32,
    pub rate_limit_burst_size: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::from_env_unchecked()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, with environment fallback for
    /// values the file does not set.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let yaml: YamlConfig = serde_yaml::from_str(&contents)?;

        let mut config = Self::from_env_unchecked()?;
        yaml.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn from_env_unchecked() -> Result<Self, ConfigError> {
        let tls = match (env_var("TLS_CERT_PATH"), env_var("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialTls),
        };

        Ok(Self {
            host: env_var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_env("SERVER_PORT")?.unwrap_or(DEFAULT_PORT),
            tls,
            gemini_api_key: env_var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_text_model: env_var("GEMINI_TEXT_MODEL")
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            gemini_live_model: env_var("GEMINI_LIVE_MODEL")
                .unwrap_or_else(|| DEFAULT_LIVE_MODEL.to_string()),
            gemini_live_voice: env_var("GEMINI_LIVE_VOICE")
                .map(|v| GeminiVoice::from_str_or_default(&v))
                .unwrap_or_default(),
            gemini_live_endpoint: env_var("GEMINI_LIVE_ENDPOINT"),
            gemini_text_endpoint: env_var("GEMINI_TEXT_ENDPOINT"),
            live_connect_timeout_secs: parse_env("GEMINI_LIVE_CONNECT_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            copilot_locale: env_var("COPILOT_LOCALE")
                .unwrap_or_else(|| DEFAULT_COPILOT_LOCALE.to_string()),
            cors_allowed_origins: env_var("CORS_ORIGIN"),
            rate_limit_requests_per_second: parse_env("RATE_LIMIT_RPS")?.unwrap_or(60),
            rate_limit_burst_size: parse_env("RATE_LIMIT_BURST")?.unwrap_or(10),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.gemini_api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }

    /// Bind address in `host:port` form.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether TLS serving is configured.
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Build the upstream live session configuration.
    pub fn live_config(&self) -> LiveConfig {
        LiveConfig {
            api_key: self.gemini_api_key.clone(),
            model: self.gemini_live_model.clone(),
            voice: self.gemini_live_voice,
            system_instruction: Some(COPILOT_SYSTEM_PROMPT.to_string()),
            connect_timeout: Duration::from_secs(self.live_connect_timeout_secs),
            endpoint: self.gemini_live_endpoint.clone(),
            ..LiveConfig::default()
        }
    }
}

/// Read an environment variable, treating empty strings as unset.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an environment variable into a numeric type.
fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env_var(key) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        None => Ok(None),
    }
}

// =============================================================================
// YAML configuration file
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct YamlConfig {
    server: YamlServer,
    gemini: YamlGemini,
    copilot: YamlCopilot,
    security: YamlSecurity,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct YamlServer {
    host: Option<String>,
    port: Option<u16>,
    tls: Option<YamlTls>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct YamlTls {
    cert_path: PathBuf,
    key_path: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct YamlGemini {
    api_key: Option<String>,
    text_model: Option<String>,
    live_model: Option<String>,
    live_voice: Option<String>,
    live_endpoint: Option<String>,
    text_endpoint: Option<String>,
    live_connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct YamlCopilot {
    locale: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct YamlSecurity {
    cors_allowed_origins: Option<String>,
    rate_limit_requests_per_second: Option<u32>,
    rate_limit_burst_size: Option<u32>,
}

impl YamlConfig {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.server.host {
            config.host = host;
        }
        if let Some(port) = self.server.port {
            config.port = port;
        }
        if let Some(tls) = self.server.tls {
            config.tls = Some(TlsConfig {
                cert_path: tls.cert_path,
                key_path: tls.key_path,
            });
        }
        if let Some(api_key) = self.gemini.api_key {
            config.gemini_api_key = api_key;
        }
        if let Some(model) = self.gemini.text_model {
            config.gemini_text_model = model;
        }
        if let Some(model) = self.gemini.live_model {
            config.gemini_live_model = model;
        }
        if let Some(voice) = self.gemini.live_voice {
            config.gemini_live_voice = GeminiVoice::from_str_or_default(&voice);
        }
        if let Some(endpoint) = self.gemini.live_endpoint {
            config.gemini_live_endpoint = Some(endpoint);
        }
        if let Some(endpoint) = self.gemini.text_endpoint {
            config.gemini_text_endpoint = Some(endpoint);
        }
        if let Some(secs) = self.gemini.live_connect_timeout_secs {
            config.live_connect_timeout_secs = secs;
        }
        if let Some(locale) = self.copilot.locale {
            config.copilot_locale = locale;
        }
        if let Some(origins) = self.security.cors_allowed_origins {
            config.cors_allowed_origins = Some(origins);
        }
        if let Some(rps) = self.security.rate_limit_requests_per_second {
            config.rate_limit_requests_per_second = rps;
        }
        if let Some(burst) = self.security.rate_limit_burst_size {
            config.rate_limit_burst_size = burst;
        }
    }
}

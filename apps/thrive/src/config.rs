//! # Configuration
//!
//! Layered configuration for the Thrive binary.
//!
//! Resolution order (highest priority first):
//! 1. CLI flags (applied via `CliOverrides`)
//! 2. Environment variables (`THRIVE_*`)
//! 3. Config file (`--config` path, or `thrive.toml` in the working directory)
//! 4. Compiled defaults
//!
//! Every field is optional in the file so partial configs merge cleanly;
//! the accessor methods apply the compiled defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default bind host. Loopback only.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default rate limit in requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Default keystore path.
pub const DEFAULT_KEYSTORE: &str = "thrive-wallets.json";

/// Default chat-completion endpoint for the advisor.
pub const DEFAULT_ADVISOR_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default advisor model.
pub const DEFAULT_ADVISOR_MODEL: &str = "gpt-4o-mini";

/// Default advisor timeout in seconds.
pub const DEFAULT_ADVISOR_TIMEOUT_SECS: u64 = 10;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "thrive.toml";

// =============================================================================
// ERRORS
// =============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid config {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Invalid value for {field}: {message}")]
    ValidationFailed { field: String, message: String },
}

// =============================================================================
// SECTIONS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Requests per second; 0 disables limiting.
    pub rate_limit: Option<u32>,
    /// Comma-separated origins, or `*`.
    pub cors_origins: Option<String>,
}

impl ServerConfig {
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn rate_limit(&self) -> u32 {
        self.rate_limit.unwrap_or(DEFAULT_RATE_LIMIT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub keystore: Option<String>,
    /// PBKDF2 rounds for seed encryption. Must match the rounds the
    /// keystore was written with.
    pub kdf_iterations: Option<u32>,
}

impl WalletConfig {
    pub fn keystore(&self) -> &str {
        self.keystore.as_deref().unwrap_or(DEFAULT_KEYSTORE)
    }

    pub fn kdf_iterations(&self) -> u32 {
        self.kdf_iterations
            .unwrap_or(thrive_core::primitives::PBKDF2_ITERATIONS)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl AdvisorConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ADVISOR_ENDPOINT)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_ADVISOR_MODEL)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_ADVISOR_TIMEOUT_SECS)
    }
}

// =============================================================================
// TOP-LEVEL CONFIG
// =============================================================================

/// Resolved Thrive configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThriveConfig {
    pub server: ServerConfig,
    pub wallet: WalletConfig,
    pub advisor: AdvisorConfig,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub keystore: Option<String>,
}

impl ThriveConfig {
    /// Load configuration with layered resolution.
    ///
    /// An explicit `config_path` must exist. Without one, `thrive.toml`
    /// in the working directory is used when present.
    pub fn load(
        config_path: Option<&Path>,
        cli_overrides: Option<&CliOverrides>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match config_path {
            Some(path) => Self::merge_toml_file(&mut config, path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::merge_toml_file(&mut config, default_path)?;
                }
            }
        }

        Self::apply_env_overrides(&mut config);

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;
        Ok(config)
    }

    /// Parse a TOML string (no env or CLI layers).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    pub fn validate(config: &ThriveConfig) -> Result<(), ConfigError> {
        if config.server.port == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "server.port".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if let Some(timeout) = config.advisor.timeout_secs {
            if !(1..=120).contains(&timeout) {
                return Err(ConfigError::ValidationFailed {
                    field: "advisor.timeout_secs".to_string(),
                    message: "must be between 1 and 120".to_string(),
                });
            }
        }
        if config.advisor.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(ConfigError::ValidationFailed {
                field: "advisor.model".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if config.wallet.kdf_iterations == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "wallet.kdf_iterations".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    fn merge_toml_file(config: &mut ThriveConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: ThriveConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Overlay `other` on `base` wherever `other` has a value.
    fn merge(base: &mut ThriveConfig, other: &ThriveConfig) {
        if other.server.host.is_some() {
            base.server.host = other.server.host.clone();
        }
        if other.server.port.is_some() {
            base.server.port = other.server.port;
        }
        if other.server.rate_limit.is_some() {
            base.server.rate_limit = other.server.rate_limit;
        }
        if other.server.cors_origins.is_some() {
            base.server.cors_origins = other.server.cors_origins.clone();
        }

        if other.wallet.keystore.is_some() {
            base.wallet.keystore = other.wallet.keystore.clone();
        }
        if other.wallet.kdf_iterations.is_some() {
            base.wallet.kdf_iterations = other.wallet.kdf_iterations;
        }

        if other.advisor.endpoint.is_some() {
            base.advisor.endpoint = other.advisor.endpoint.clone();
        }
        if other.advisor.model.is_some() {
            base.advisor.model = other.advisor.model.clone();
        }
        if other.advisor.timeout_secs.is_some() {
            base.advisor.timeout_secs = other.advisor.timeout_secs;
        }
    }

    /// Pattern: `THRIVE_PORT`, `THRIVE_KEYSTORE`, `THRIVE_ADVISOR_MODEL`, etc.
    /// Unparseable numbers are ignored.
    fn apply_env_overrides(config: &mut ThriveConfig) {
        if let Ok(val) = std::env::var("THRIVE_HOST") {
            config.server.host = Some(val);
        }
        if let Ok(val) = std::env::var("THRIVE_PORT") {
            if let Ok(v) = val.parse::<u16>() {
                config.server.port = Some(v);
            }
        }
        if let Ok(val) = std::env::var("THRIVE_RATE_LIMIT") {
            if let Ok(v) = val.parse::<u32>() {
                config.server.rate_limit = Some(v);
            }
        }
        if let Ok(val) = std::env::var("THRIVE_CORS_ORIGINS") {
            config.server.cors_origins = Some(val);
        }
        if let Ok(val) = std::env::var("THRIVE_KEYSTORE") {
            config.wallet.keystore = Some(val);
        }
        if let Ok(val) = std::env::var("THRIVE_KDF_ITERATIONS") {
            if let Ok(v) = val.parse::<u32>() {
                config.wallet.kdf_iterations = Some(v);
            }
        }
        if let Ok(val) = std::env::var("THRIVE_ADVISOR_ENDPOINT") {
            config.advisor.endpoint = Some(val);
        }
        if let Ok(val) = std::env::var("THRIVE_ADVISOR_MODEL") {
            config.advisor.model = Some(val);
        }
        if let Ok(val) = std::env::var("THRIVE_ADVISOR_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.advisor.timeout_secs = Some(v);
            }
        }
    }

    fn apply_cli_overrides(config: &mut ThriveConfig, cli: &CliOverrides) {
        if let Some(ref v) = cli.host {
            config.server.host = Some(v.clone());
        }
        if let Some(v) = cli.port {
            config.server.port = Some(v);
        }
        if let Some(ref v) = cli.keystore {
            config.wallet.keystore = Some(v.clone());
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

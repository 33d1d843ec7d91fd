//! Receiving configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ERP_BASE_URL` - Base URL of the ERP order/inventory API
//! - `ERP_API_TOKEN` - Bearer token for the ERP API
//! - `ERP_COMPANY` - ERP company the handhelds work in
//!
//! ## Optional
//! - `ERP_LANGUAGE` - Language sent with every request (default: en-US)
//! - `ERP_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
//! - `RECEIVING_ORIGIN_PROBE_ORDER` - Comma-separated origins probed for
//!   received lines when an order has no open lines
//!   (default: purchase,sales,transfer,transfer_manual,production)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)

use std::collections::HashMap;
use std::time::Duration;

use inbound_core::Origin;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_TIMEOUT_SECS: &str = "30";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Receiving application configuration.
#[derive(Debug, Clone)]
pub struct ReceivingConfig {
    /// ERP connection settings
    pub erp: ErpConfig,
    /// Origins probed for received lines, in order
    pub origin_probe_order: Vec<Origin>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
}

/// ERP API configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct ErpConfig {
    /// Base URL of the ERP API
    pub base_url: Url,
    /// Bearer token
    pub api_token: SecretString,
    /// ERP company context
    pub company: String,
    /// Language context
    pub language: String,
    /// Request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for ErpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErpConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &"[REDACTED]")
            .field("company", &self.company)
            .field("language", &self.language)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ReceivingConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let erp = ErpConfig::from_env()?;
        let origin_probe_order = get_optional_env("RECEIVING_ORIGIN_PROBE_ORDER")
            .map_or_else(|| Ok(Origin::ALL.to_vec()), |value| parse_probe_order(&value))?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            erp,
            origin_probe_order,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
        })
    }
}

impl LogFormat {
    /// Read `LOG_FORMAT`; only `json` selects structured output.
    ///
    /// Loads `.env` like [`ReceivingConfig::from_env`], so the format is
    /// known before the rest of the configuration is validated.
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        match get_optional_env("LOG_FORMAT").as_deref() {
            Some("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

impl ErpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_required_env("ERP_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| ConfigError::InvalidEnvVar("ERP_BASE_URL".to_string(), e.to_string()))?;
        let timeout_secs = get_env_or_default("ERP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ERP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            base_url,
            api_token: get_validated_secret("ERP_API_TOKEN")?,
            company: get_required_env("ERP_COMPANY")?,
            language: get_env_or_default("ERP_LANGUAGE", DEFAULT_LANGUAGE),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Parse a comma-separated origin probe order.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unknown or repeated origins, or an
/// empty list.
pub fn parse_probe_order(value: &str) -> Result<Vec<Origin>, ConfigError> {
    let invalid = |reason: String| {
        ConfigError::InvalidEnvVar("RECEIVING_ORIGIN_PROBE_ORDER".to_string(), reason)
    };

    let mut order = Vec::new();
    for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let origin = name.parse::<Origin>().map_err(|e| invalid(e.to_string()))?;
        if order.contains(&origin) {
            return Err(invalid(format!("origin listed twice: {origin}")));
        }
        order.push(origin);
    }

    if order.is_empty() {
        return Err(invalid("at least one origin is required".to_string()));
    }
    Ok(order)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API tokens have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the token issued by the ERP."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

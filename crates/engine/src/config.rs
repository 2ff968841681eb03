//! Channel configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BRIDGE_ENDPOINT` - Remote platform API endpoint URL
//! - `BRIDGE_API_USER` - Remote API user name
//! - `BRIDGE_API_KEY` - Remote API key (validated for placeholder/entropy)
//! - `BRIDGE_ACCOUNT_EXPENSE` - Expense account applied to imported products
//! - `BRIDGE_ACCOUNT_REVENUE` - Revenue account applied to imported products
//!
//! ## Optional
//! - `BRIDGE_CHANNEL_NAME` - Display name for the channel (default: primary)
//! - `BRIDGE_ORDER_PREFIX` - Prefix prepended to remote order increment ids
//!   when storing local order references (default: mag_)
//! - `BRIDGE_DEFAULT_UOM` - Unit of measure for imported products (default: Unit)
//! - `BRIDGE_ROOT_CATEGORY` - Remote root category id for catalog import (default: 1)

use std::collections::HashMap;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use storebridge_core::{ChannelId, PriceListId, RemoteId};

use crate::models::{Channel, DEFAULT_ORDER_PREFIX, DEFAULT_ROOT_CATEGORY, DEFAULT_UOM};

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

/// Channel connection settings loaded from the environment.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ChannelConfig {
    /// Display name for the channel.
    pub name: String,
    /// Remote platform API endpoint.
    pub endpoint: Url,
    /// Remote API user name.
    pub api_user: String,
    /// Remote API key.
    pub api_key: SecretString,
    /// Prefix for locally stored order references.
    pub order_prefix: String,
    /// Unit of measure applied to imported products.
    pub default_uom: String,
    /// Expense account applied to imported products.
    pub account_expense: String,
    /// Revenue account applied to imported products.
    pub account_revenue: String,
    /// Remote root category id for catalog import.
    pub root_category: RemoteId,
}

impl std::fmt::Debug for ChannelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelConfig")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint.as_str())
            .field("api_user", &self.api_user)
            .field("api_key", &"[REDACTED]")
            .field("order_prefix", &self.order_prefix)
            .field("default_uom", &self.default_uom)
            .field("account_expense", &self.account_expense)
            .field("account_revenue", &self.account_revenue)
            .field("root_category", &self.root_category)
            .finish()
    }
}

impl ChannelConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API key fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let endpoint = get_required_env("BRIDGE_ENDPOINT")?
            .parse::<Url>()
            .map_err(|e| ConfigError::InvalidEnvVar("BRIDGE_ENDPOINT".to_string(), e.to_string()))?;
        let root_category = get_env_or_default(
            "BRIDGE_ROOT_CATEGORY",
            &DEFAULT_ROOT_CATEGORY.as_i64().to_string(),
        )
        .parse::<i64>()
        .map(RemoteId::new)
        .map_err(|e| {
            ConfigError::InvalidEnvVar("BRIDGE_ROOT_CATEGORY".to_string(), e.to_string())
        })?;

        Ok(Self {
            name: get_env_or_default("BRIDGE_CHANNEL_NAME", "primary"),
            endpoint,
            api_user: get_required_env("BRIDGE_API_USER")?,
            api_key: get_validated_secret("BRIDGE_API_KEY")?,
            order_prefix: get_env_or_default("BRIDGE_ORDER_PREFIX", DEFAULT_ORDER_PREFIX),
            default_uom: get_env_or_default("BRIDGE_DEFAULT_UOM", DEFAULT_UOM),
            account_expense: get_required_env("BRIDGE_ACCOUNT_EXPENSE")?,
            account_revenue: get_required_env("BRIDGE_ACCOUNT_REVENUE")?,
            root_category,
        })
    }

    /// Materialize a [`Channel`] from this configuration.
    ///
    /// The id and price list are assigned by the local store, not the
    /// environment, so they are supplied by the caller.
    #[must_use]
    pub fn into_channel(self, id: ChannelId, price_list_id: PriceListId) -> Channel {
        Channel {
            id,
            name: self.name,
            endpoint: self.endpoint,
            api_user: self.api_user,
            api_key: self.api_key,
            order_prefix: self.order_prefix,
            default_uom: self.default_uom,
            account_expense: self.account_expense,
            account_revenue: self.account_revenue,
            root_category: self.root_category,
            price_list_id,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
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

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated key."
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

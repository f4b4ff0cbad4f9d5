//! Configuration loading and credential resolution
//!
//! Provider credentials resolve with ENV → TOML priority: an environment
//! variable always beats the config file, and the winning source (never the
//! value) is logged at startup.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// TOML configuration file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// SQLite database file path
    pub database_path: Option<String>,
    /// Listen address for the HTTP surface (e.g., "127.0.0.1:5810")
    pub bind_address: Option<String>,
    /// Per-provider API credentials
    #[serde(default)]
    pub providers: ProviderKeys,
}

/// Per-provider credentials as written in the TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderKeys {
    pub maersk_api_key: Option<String>,
    pub cmacgm_api_key: Option<String>,
    pub ups_token: Option<String>,
    pub dhl_api_key: Option<String>,
    pub aviationstack_key: Option<String>,
    pub ais_api_key: Option<String>,
}

/// Credentials after ENV → TOML resolution, ready to hand to the adapters
///
/// `None` means the provider is unconfigured; its adapter reports
/// `ProviderUnavailable` when selected and the dispatcher degrades to a
/// fallback result.
#[derive(Debug, Clone, Default)]
pub struct ResolvedCredentials {
    pub maersk: Option<String>,
    pub cmacgm: Option<String>,
    pub ups: Option<String>,
    pub dhl: Option<String>,
    pub aviationstack: Option<String>,
    pub ais: Option<String>,
}

impl ResolvedCredentials {
    /// Resolve every provider credential from environment and TOML config
    pub fn resolve(config: &TomlConfig) -> Self {
        let keys = &config.providers;
        Self {
            maersk: resolve_credential(
                "maersk",
                "SHIPTRACK_MAERSK_API_KEY",
                keys.maersk_api_key.as_deref(),
            ),
            cmacgm: resolve_credential(
                "cma-cgm",
                "SHIPTRACK_CMACGM_API_KEY",
                keys.cmacgm_api_key.as_deref(),
            ),
            ups: resolve_credential("ups", "SHIPTRACK_UPS_TOKEN", keys.ups_token.as_deref()),
            dhl: resolve_credential("dhl", "SHIPTRACK_DHL_API_KEY", keys.dhl_api_key.as_deref()),
            aviationstack: resolve_credential(
                "aviationstack",
                "SHIPTRACK_AVIATIONSTACK_KEY",
                keys.aviationstack_key.as_deref(),
            ),
            ais: resolve_credential("aisfeed", "SHIPTRACK_AIS_API_KEY", keys.ais_api_key.as_deref()),
        }
    }
}

/// Default configuration file path for the platform
///
/// e.g. `~/.config/shiptrack/config.toml` on Linux
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("shiptrack").join("config.toml"))
}

/// Default database path for the platform
///
/// e.g. `~/.local/share/shiptrack/shiptrack.db` on Linux, with a
/// working-directory fallback when no data directory can be determined
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("shiptrack").join("shiptrack.db"))
        .unwrap_or_else(|| PathBuf::from("shiptrack.db"))
}

/// Load the TOML configuration file
///
/// A missing file is not an error (defaults apply); a file that exists but
/// does not parse is.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        info!("No config file at {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Resolve one credential with ENV → TOML priority
///
/// Returns `None` when neither source holds a usable (non-blank) value.
pub fn resolve_credential(
    provider: &str,
    env_var: &str,
    toml_value: Option<&str>,
) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v)).map(str::to_string);

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            provider = provider,
            "Credential found in both {} and TOML config; using environment", env_var
        );
    }

    match (env_value, toml_value) {
        (Some(key), _) => {
            info!(provider = provider, "Credential loaded from environment");
            Some(key)
        }
        (None, Some(key)) => {
            info!(provider = provider, "Credential loaded from TOML config");
            Some(key)
        }
        (None, None) => {
            info!(
                provider = provider,
                "No credential configured; provider will answer with fallback data"
            );
            None
        }
    }
}

/// Validate a credential (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

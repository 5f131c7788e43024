//! Application configuration for LeadBridge.
//!
//! User config lives at `~/.leadbridge/leadbridge.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LeadBridgeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "leadbridge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".leadbridge";

// ---------------------------------------------------------------------------
// Config structs (matching leadbridge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// CRM connection settings.
    #[serde(default)]
    pub crm: CrmConfig,

    /// Reconciliation policy.
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

/// `[crm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmConfig {
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Account/location whose custom fields are reconciled against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,

    /// Name of the env var holding the API token (never store the token itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Value sent in the `Version` header.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How long a fetched catalog may be reused. 0 disables caching.
    #[serde(default = "default_catalog_ttl_secs")]
    pub catalog_ttl_secs: u64,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            location_id: None,
            api_key_env: default_api_key_env(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            catalog_ttl_secs: default_catalog_ttl_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://services.leadconnectorhq.com".into()
}
fn default_api_key_env() -> String {
    "LEADBRIDGE_CRM_TOKEN".into()
}
fn default_api_version() -> String {
    "2021-07-28".into()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_catalog_ttl_secs() -> u64 {
    300
}

/// `[reconcile]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Below this many reconciled fields the notes fallback kicks in.
    #[serde(default = "default_fallback_floor")]
    pub fallback_floor: usize,

    /// Free-text field names tried, in order, for the notes fallback.
    #[serde(default = "default_fallback_field_names")]
    pub fallback_field_names: Vec<String>,

    /// Value of the contact `source` property.
    #[serde(default = "default_lead_source")]
    pub lead_source: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            fallback_floor: default_fallback_floor(),
            fallback_field_names: default_fallback_field_names(),
            lead_source: default_lead_source(),
        }
    }
}

fn default_fallback_floor() -> usize {
    3
}
fn default_fallback_field_names() -> Vec<String> {
    vec!["Notes".into(), "Description".into(), "Additional Info".into()]
}
fn default_lead_source() -> String {
    "website".into()
}

// ---------------------------------------------------------------------------
// Credentials (runtime, merged from config + env + CLI flags)
// ---------------------------------------------------------------------------

/// Everything needed to talk to one CRM account.
#[derive(Clone)]
pub struct CrmCredentials {
    /// API base URL.
    pub base_url: String,
    /// Account/location identifier.
    pub location_id: String,
    /// Bearer token.
    pub token: String,
    /// `Version` header value.
    pub api_version: String,
}

impl std::fmt::Debug for CrmCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrmCredentials")
            .field("base_url", &self.base_url)
            .field("location_id", &self.location_id)
            .field("token", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Resolve CRM credentials from config and the environment.
///
/// `location_override` takes precedence over `crm.location_id`.
pub fn resolve_credentials(
    config: &AppConfig,
    location_override: Option<&str>,
) -> Result<CrmCredentials> {
    let location_id = location_override
        .map(str::to_string)
        .or_else(|| config.crm.location_id.clone())
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| {
            LeadBridgeError::config(
                "CRM location id not set. Pass --location or set crm.location_id.",
            )
        })?;

    url::Url::parse(&config.crm.base_url).map_err(|e| {
        LeadBridgeError::config(format!("invalid crm.base_url '{}': {e}", config.crm.base_url))
    })?;

    let var_name = &config.crm.api_key_env;
    let token = match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => val,
        _ => {
            return Err(LeadBridgeError::config(format!(
                "CRM API token not found. Set the {var_name} environment variable."
            )));
        }
    };

    Ok(CrmCredentials {
        base_url: config.crm.base_url.trim_end_matches('/').to_string(),
        location_id,
        token,
        api_version: config.crm.api_version.clone(),
    })
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.leadbridge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LeadBridgeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.leadbridge/leadbridge.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LeadBridgeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        LeadBridgeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LeadBridgeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LeadBridgeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LeadBridgeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("LEADBRIDGE_CRM_TOKEN"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.crm.timeout_secs, 10);
        assert_eq!(parsed.crm.catalog_ttl_secs, 300);
        assert_eq!(parsed.reconcile.fallback_floor, 3);
        assert_eq!(
            parsed.reconcile.fallback_field_names,
            vec!["Notes", "Description", "Additional Info"]
        );
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[crm]
location_id = "loc_123"
timeout_secs = 5
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.crm.location_id.as_deref(), Some("loc_123"));
        assert_eq!(config.crm.timeout_secs, 5);
        assert_eq!(config.crm.api_version, "2021-07-28");
        assert_eq!(config.reconcile.lead_source, "website");
    }

    #[test]
    fn credentials_require_location() {
        let config = AppConfig::default();
        let err = resolve_credentials(&config, None).unwrap_err();
        assert!(err.to_string().contains("location id not set"));
    }

    #[test]
    fn credentials_require_token() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.crm.api_key_env = "LB_TEST_NONEXISTENT_TOKEN_12345".into();
        let err = resolve_credentials(&config, Some("loc_1")).unwrap_err();
        assert!(err.to_string().contains("API token not found"));
    }

    #[test]
    fn credentials_debug_redacts_token() {
        let creds = CrmCredentials {
            base_url: "https://crm.example.com".into(),
            location_id: "loc_1".into(),
            token: "secret-token".into(),
            api_version: "2021-07-28".into(),
        };
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("secret-token"));
        assert!(dbg.contains("loc_1"));
    }
}

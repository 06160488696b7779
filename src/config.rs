use crate::logic::ReferencePolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub save: SaveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SaveConfig {
    /// How relation references that cannot be normalized are handled
    pub reference_policy: ReferencePolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_secs: 30,
            token: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional `signage` config file and
    /// `SIGNAGE_*` environment variables, later sources winning.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("signage").required(false));

        // Environment variables, e.g. SIGNAGE_API__BASE_URL
        config = config.add_source(
            config::Environment::with_prefix("SIGNAGE")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.api.token.is_none());
        assert_eq!(config.save.reference_policy, ReferencePolicy::Reject);
    }

    #[test]
    fn test_reference_policy_from_config_text() {
        let parsed: SaveConfig = serde_json::from_str(r#"{"reference_policy": "skip"}"#).unwrap();
        assert_eq!(parsed.reference_policy, ReferencePolicy::Skip);
    }
}

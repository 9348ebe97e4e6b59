//! `[plugins]` section configuration.

use serde::{Deserialize, Serialize};

/// `[plugins]` section in bramble.toml - plugin activation.
///
/// Plugins register their hooks in the order listed in `load`, which is
/// also the order their hooks run within each callback chain.
///
/// # Example
/// ```toml
/// [plugins]
/// load = ["ignore_future", "categories", "yeararchives"]
/// tolerant = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginsConfig {
    /// Names of plugins to activate, in order.
    #[serde(default)]
    pub load: Vec<String>,

    /// When true, an unknown plugin name is recorded and logged instead
    /// of aborting startup.
    #[serde(default)]
    pub tolerant: bool,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_plugins_config() {
        let config = r#"
            [plugins]
            load = ["categories", "markdown"]
            tolerant = true
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.plugins.load, vec!["categories", "markdown"]);
        assert!(config.plugins.tolerant);
    }

    #[test]
    fn test_plugins_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert!(config.plugins.load.is_empty());
        assert!(!config.plugins.tolerant);
    }
}

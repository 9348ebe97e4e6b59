//! The compiled-in plugin registry.
//!
//! `[plugins].load` selects and orders plugins by name. An unknown name
//! is a bad plugin: startup aborts unless `[plugins].tolerant` is set,
//! in which case the failure is recorded and logged and the rest keep
//! loading.

mod categories;
mod ignore_future;
mod markdown;
mod published_date;
mod yeararchives;

use crate::callback::{Plugin, Registry};
use crate::config::SiteConfig;
use crate::log;
use anyhow::{Result, bail};

/// Names of every plugin that ships with the engine.
pub const AVAILABLE: &[&str] = &[
    "categories",
    "ignore_future",
    "markdown",
    "published_date",
    "yeararchives",
];

/// Look up a plugin by name.
pub fn by_name(name: &str) -> Option<Box<dyn Plugin>> {
    let plugin: Box<dyn Plugin> = match name {
        "categories" => Box::new(categories::Categories),
        "ignore_future" => Box::new(ignore_future::IgnoreFuture),
        "markdown" => Box::new(markdown::Markdown),
        "published_date" => Box::new(published_date::PublishedDate),
        "yeararchives" => Box::new(yeararchives::YearArchives),
        _ => return None,
    };
    Some(plugin)
}

/// Build the callback registry from the configured plugin list.
///
/// Returns the registry and the names of bad plugins (only ever
/// non-empty in tolerant mode).
pub fn build_registry(config: &SiteConfig) -> Result<(Registry, Vec<String>)> {
    let mut registry = Registry::new();
    let mut bad_plugins = Vec::new();

    for name in &config.plugins.load {
        match by_name(name) {
            Some(plugin) => {
                plugin.register(&mut registry);
                log!("plugin"; "loaded {}", plugin.name());
            }
            None if config.plugins.tolerant => {
                log!("plugin"; "bad plugin `{name}`: unknown name");
                bad_plugins.push(name.clone());
            }
            None => bail!(
                "bad plugin `{name}`: unknown name (available: {})",
                AVAILABLE.join(", ")
            ),
        }
    }

    Ok((registry, bad_plugins))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_available_plugin_resolves() {
        for name in AVAILABLE {
            assert!(by_name(name).is_some(), "plugin {name} missing");
        }
        assert!(by_name("nonexistent").is_none());
    }

    #[test]
    fn test_unknown_plugin_aborts_startup() {
        let mut config = SiteConfig::default();
        config.plugins.load = vec!["nonexistent".into()];
        assert!(build_registry(&config).is_err());
    }

    #[test]
    fn test_tolerant_mode_records_bad_plugins() {
        let mut config = SiteConfig::default();
        config.plugins.load = vec!["nonexistent".into(), "markdown".into()];
        config.plugins.tolerant = true;

        let (registry, bad) = build_registry(&config).unwrap();
        assert_eq!(bad, vec!["nonexistent"]);
        // the good plugin after the bad one still loaded
        assert!(registry.parser_for("md").is_some());
    }

    #[test]
    fn test_registration_order_follows_load_order() {
        let mut config = SiteConfig::default();
        config.plugins.load = vec!["ignore_future".into(), "published_date".into()];

        let (registry, _) = build_registry(&config).unwrap();
        assert_eq!(registry.entries.len(), 1);
        assert_eq!(registry.entries[0].plugin, "ignore_future");
        assert_eq!(registry.filestat.len(), 1);
        assert_eq!(registry.filestat[0].plugin, "published_date");
    }
}

//! `[paths]` section configuration.
//!
//! Filesystem collaborators: the entry data directory, the theme
//! directory, and the static-compilation output directory.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[paths]` section in bramble.toml - filesystem layout.
///
/// All relative paths are resolved against the project root after loading.
///
/// # Example
/// ```toml
/// [paths]
/// datadir = "entries"
/// themedir = "themes"
/// compiledir = "compiled"
/// static_dirs = ["images"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory holding the entry files.
    #[serde(default = "defaults::paths::datadir")]
    #[educe(Default = defaults::paths::datadir())]
    pub datadir: PathBuf,

    /// Directory holding theme template files.
    #[serde(default = "defaults::paths::themedir")]
    #[educe(Default = defaults::paths::themedir())]
    pub themedir: PathBuf,

    /// Output directory for static compilation. Only required by the
    /// `compile`, `collectstatic`, and incremental commands.
    #[serde(default = "defaults::paths::compiledir")]
    #[educe(Default = defaults::paths::compiledir())]
    pub compiledir: Option<PathBuf>,

    /// Extra directories copied verbatim by `collectstatic`.
    #[serde(default)]
    pub static_dirs: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use std::path::PathBuf;

    #[test]
    fn test_paths_config() {
        let config = r#"
            [paths]
            datadir = "posts"
            themedir = "looks"
            compiledir = "out"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.paths.datadir, PathBuf::from("posts"));
        assert_eq!(config.paths.themedir, PathBuf::from("looks"));
        assert_eq!(config.paths.compiledir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_paths_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.paths.datadir, PathBuf::from("entries"));
        assert_eq!(config.paths.themedir, PathBuf::from("themes"));
        assert!(config.paths.compiledir.is_none());
        assert!(config.paths.static_dirs.is_empty());
    }
}

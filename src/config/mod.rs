//! Site configuration management for `bramble.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[blog]`    | Blog metadata (title, author, base_url)          |
//! | `[paths]`   | Data, theme, and compile directories             |
//! | `[entries]` | Resolution policy (depth, truncation, indexes)   |
//! | `[plugins]` | Plugin activation list                           |
//! | `[compile]` | Static compilation themes and extra urls         |
//! | `[serve]`   | Dynamic server (interface, port)                 |
//!
//! # Example
//!
//! ```toml
//! [blog]
//! title = "My Blog"
//! base_url = "https://example.com"
//!
//! [paths]
//! datadir = "entries"
//! themedir = "themes"
//!
//! [entries]
//! num_entries = 10
//!
//! [plugins]
//! load = ["ignore_future", "categories"]
//! ```

mod blog;
mod compile;
pub mod defaults;
mod entries;
mod error;
mod paths;
mod plugins;
mod serve;

pub use error::ConfigError;

use blog::BlogConfig;
use compile::CompileConfig;
use entries::EntriesConfig;
use paths::PathsConfig;
use plugins::PluginsConfig;
use serve::ServeConfig;

use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing bramble.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Blog metadata
    #[serde(default)]
    pub blog: BlogConfig,

    /// Filesystem layout
    #[serde(default)]
    pub paths: PathsConfig,

    /// Entry resolution policy
    #[serde(default)]
    pub entries: EntriesConfig,

    /// Plugin activation
    #[serde(default)]
    pub plugins: PluginsConfig,

    /// Static compilation settings
    #[serde(default)]
    pub compile: CompileConfig,

    /// Dynamic server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path and resolve all relative paths
    /// against the file's directory.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;

        let root = path.parent().unwrap_or(Path::new("./")).to_path_buf();
        config.resolve_paths(&root);
        config.config_path = normalize_path(path);
        Ok(config)
    }

    /// Resolve all configured paths relative to the project root and
    /// normalize them to absolute paths.
    pub fn resolve_paths(&mut self, root: &Path) {
        let root = normalize_path(root);

        self.paths.datadir = normalize_path(&root.join(&self.paths.datadir));
        self.paths.themedir = normalize_path(&root.join(&self.paths.themedir));
        if let Some(compiledir) = &self.paths.compiledir {
            self.paths.compiledir = Some(normalize_path(&root.join(compiledir)));
        }
        self.paths.static_dirs = self
            .paths
            .static_dirs
            .iter()
            .map(|dir| normalize_path(&root.join(dir)))
            .collect();

        self.root = root;
    }

    /// Validate configuration. Called once at startup; any error here is
    /// fatal before a single request is processed.
    pub fn validate(&self) -> Result<()> {
        if self.blog.base_url.is_empty() {
            bail!(ConfigError::Validation("[blog.base_url] is required".into()));
        }
        if !self.blog.base_url.starts_with("http") {
            bail!(ConfigError::Validation(
                "[blog.base_url] must start with http:// or https://".into()
            ));
        }
        if self.blog.base_url.ends_with('/') {
            bail!(ConfigError::Validation(
                "[blog.base_url] must not end with a slash".into()
            ));
        }

        if !self.paths.datadir.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[paths.datadir] `{}` is not a directory",
                self.paths.datadir.display()
            )));
        }
        if !self.paths.themedir.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[paths.themedir] `{}` is not a directory",
                self.paths.themedir.display()
            )));
        }

        Ok(())
    }

    /// The compile output directory, required by the compile-family
    /// commands and by `render_url_statically`.
    pub fn compiledir(&self) -> Result<&Path> {
        match &self.paths.compiledir {
            Some(dir) => Ok(dir),
            None => bail!(ConfigError::Validation(
                "[paths.compiledir] must be set for static compilation".into()
            )),
        }
    }
}

/// Normalize a path to absolute, using canonicalize if the path exists
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        // For non-existent paths, manually make them absolute
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

// ============================================================================
// Tests
// ============================================================================

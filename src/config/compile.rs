//! `[compile]` section configuration.
//!
//! Static compilation settings: which themes get rendered for entries
//! and index pages, plus arbitrary extra urls.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[compile]` section in bramble.toml - static compilation settings.
///
/// # Example
/// ```toml
/// [compile]
/// themes = ["html"]
/// index_themes = ["html", "rss"]
/// urls = ["/booklist.html", "/index.rss?page=2"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CompileConfig {
    /// Themes rendered for every single-entry page.
    #[serde(default = "defaults::compile::themes")]
    #[educe(Default = defaults::compile::themes())]
    pub themes: Vec<String>,

    /// Themes rendered for category and date index pages.
    #[serde(default = "defaults::compile::themes")]
    #[educe(Default = defaults::compile::themes())]
    pub index_themes: Vec<String>,

    /// Extra urls to compile, optionally carrying a query string.
    #[serde(default)]
    pub urls: Vec<String>,
}

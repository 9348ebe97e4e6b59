//! `[blog]` section configuration.
//!
//! Blog-level metadata exposed to theme templates.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[blog]` section in bramble.toml - blog metadata.
///
/// # Example
/// ```toml
/// [blog]
/// title = "Joe's blog about cooking"
/// description = "Critiques of restaurants in the Boston area"
/// author = "Joe Smith"
/// base_url = "https://blog.example.com"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BlogConfig {
    /// Blog title, available as `{blog_title}` in templates.
    #[serde(default = "defaults::blog::title")]
    #[educe(Default = defaults::blog::title())]
    pub title: String,

    /// Byline or summary of what the blog covers.
    #[serde(default)]
    pub description: String,

    /// Author name or pseudonym.
    #[serde(default)]
    pub author: String,

    /// Contact email associated with the blog.
    #[serde(default)]
    pub email: String,

    /// Copyright/rights statement used by feed themes.
    #[serde(default)]
    pub rights: String,

    /// Primary language code (ISO 639), used by feed themes.
    #[serde(default = "defaults::blog::language")]
    #[educe(Default = defaults::blog::language())]
    pub language: String,

    /// Base url for the blog. Required, must not end with a slash.
    #[serde(default)]
    pub base_url: String,
}

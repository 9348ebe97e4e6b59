//! `[entries]` section configuration.
//!
//! Entry resolution policy: listing depth, truncation, date-index
//! granularity, and directories to skip while walking.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[entries]` section in bramble.toml - entry resolution policy.
///
/// # Example
/// ```toml
/// [entries]
/// num_entries = 15
/// depth = 2
/// default_theme = "html"
/// truncate_date = true
/// ignore_directories = ["drafts", "CVS"]
/// month_indexes = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct EntriesConfig {
    /// Maximum number of entries shown on truncated listings.
    /// 0 disables truncation entirely.
    #[serde(default = "defaults::entries::num_entries")]
    #[educe(Default = defaults::entries::num_entries())]
    pub num_entries: usize,

    /// Directory walk depth for listings. 0 walks all the way down,
    /// 1 stays in the listing root, 2 descends one level, and so on.
    #[serde(default = "defaults::entries::depth")]
    #[educe(Default = defaults::entries::depth())]
    pub depth: usize,

    /// Theme used when the url carries no theme extension and no
    /// `theme=` query parameter.
    #[serde(default = "defaults::entries::default_theme")]
    #[educe(Default = defaults::entries::default_theme())]
    pub default_theme: String,

    /// Whether front-page listings are truncated to `num_entries`.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub truncate_frontpage: bool,

    /// Whether category listings are truncated to `num_entries`.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub truncate_category: bool,

    /// Whether date-archive listings are truncated to `num_entries`.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub truncate_date: bool,

    /// Directory suffixes excluded from the walk (e.g. `["CVS"]`).
    #[serde(default)]
    pub ignore_directories: Vec<String>,

    /// Serve `/<yyyy>` date archives.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub year_indexes: bool,

    /// Serve `/<yyyy>/<mm>` date archives.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub month_indexes: bool,

    /// Serve `/<yyyy>/<mm>/<dd>` date archives.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub day_indexes: bool,
}

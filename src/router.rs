//! Path routing: classify a url path into a content selection.
//!
//! A request path resolves to one of three things, tried in this order
//! against an ordered regex table (first accepted match wins):
//!
//! 1. an existing directory under the data root -> category listing
//! 2. an existing entry file (path + registered extension) -> single entry
//! 3. `/yyyy[/mm[/dd]]` -> date-archive listing, per-granularity gated
//!
//! Directories are tried before dates, so a category literally named
//! `2004` shadows the year archive. A path matching nothing is kept as
//! a literal file path under the data root and 404s at render time.
//!
//! Resolution is a pure function of the url path, the configuration,
//! and the filesystem; it never mutates anything.

use crate::config::SiteConfig;
use regex::{Captures, Regex};
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

// ============================================================================
// Path Classification
// ============================================================================

/// What kind of content a path selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentMode {
    /// Exactly one entry file.
    Single,
    /// A list of entries (category or date archive).
    Listing,
    /// Nothing recognized; renders as a 404.
    #[default]
    Unknown,
}

/// The routed classification of one request path.
#[derive(Debug, Clone, Default)]
pub struct PathInfo {
    pub mode: ContentMode,
    /// Resolution root: the entry file itself (Single), the listing
    /// directory (Listing), or the unrecognized literal path.
    pub root: PathBuf,
    /// Date-archive filter components; empty when unset.
    pub year: String,
    pub month: String,
    pub day: String,
    /// Theme for this request (path extension or caller default).
    pub theme: String,
    /// Whether the listing gets truncated to `num_entries`.
    pub truncate: bool,
    /// The original url path.
    pub path_info: String,
    /// Absolute url for this page.
    pub url: String,
}

// ============================================================================
// Route Table
// ============================================================================

/// What a route function reports back when it accepts a match.
struct RouteMatch {
    mode: ContentMode,
    root: PathBuf,
    year: String,
    month: String,
    day: String,
    theme: Option<String>,
    /// Date archives link to the blog root rather than the date path.
    strip_url_path: bool,
}

type RouteFn = fn(&SiteConfig, &[String], &Captures) -> Option<RouteMatch>;

struct Route {
    pattern: Regex,
    apply: RouteFn,
}

impl Route {
    fn new(pattern: &str, apply: RouteFn) -> Self {
        Self {
            // route patterns are compile-time constants
            pattern: Regex::new(pattern).unwrap(),
            apply,
        }
    }
}

static ROUTES: LazyLock<Vec<Route>> = LazyLock::new(|| {
    vec![
        Route::new(r"^/?$", route_directory),
        Route::new(r"^/(?P<path>.*)$", route_directory),
        Route::new(r"^/(?P<path>.*?)index$", route_directory),
        Route::new(r"^/(?P<path>.*?)index\.(?P<theme>[^./]+)$", route_directory),
        Route::new(r"^/(?P<path>.+)$", route_file),
        Route::new(r"^/(?P<path>.+)\.(?P<theme>[^./]+)$", route_file),
        Route::new(r"^/(?P<yr>\d{4})/?$", route_date),
        Route::new(r"^/(?P<yr>\d{4})/index$", route_date),
        Route::new(r"^/(?P<yr>\d{4})/index\.(?P<theme>[^./]+)$", route_date),
        Route::new(r"^/(?P<yr>\d{4})/(?P<mo>\d{2})/?$", route_date),
        Route::new(r"^/(?P<yr>\d{4})/(?P<mo>\d{2})/index$", route_date),
        Route::new(
            r"^/(?P<yr>\d{4})/(?P<mo>\d{2})/index\.(?P<theme>[^./]+)$",
            route_date,
        ),
        Route::new(r"^/(?P<yr>\d{4})/(?P<mo>\d{2})/(?P<da>\d{2})/?$", route_date),
        Route::new(
            r"^/(?P<yr>\d{4})/(?P<mo>\d{2})/(?P<da>\d{2})/index$",
            route_date,
        ),
        Route::new(
            r"^/(?P<yr>\d{4})/(?P<mo>\d{2})/(?P<da>\d{2})/index\.(?P<theme>[^./]+)$",
            route_date,
        ),
    ]
});

fn captured(caps: &Captures, name: &str) -> String {
    caps.name(name)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn route_directory(
    config: &SiteConfig,
    _extensions: &[String],
    caps: &Captures,
) -> Option<RouteMatch> {
    let path = captured(caps, "path");
    let dir = config.paths.datadir.join(path.trim_matches('/'));
    dir.is_dir().then(|| RouteMatch {
        mode: ContentMode::Listing,
        root: dir,
        year: String::new(),
        month: String::new(),
        day: String::new(),
        theme: caps.name("theme").map(|m| m.as_str().to_string()),
        strip_url_path: false,
    })
}

fn route_file(config: &SiteConfig, extensions: &[String], caps: &Captures) -> Option<RouteMatch> {
    let path = captured(caps, "path");
    let base = config.paths.datadir.join(path.trim_start_matches('/'));
    let file = what_ext(extensions, &base)?;
    Some(RouteMatch {
        mode: ContentMode::Single,
        root: file,
        year: String::new(),
        month: String::new(),
        day: String::new(),
        theme: caps.name("theme").map(|m| m.as_str().to_string()),
        strip_url_path: false,
    })
}

fn route_date(config: &SiteConfig, _extensions: &[String], caps: &Captures) -> Option<RouteMatch> {
    let year = captured(caps, "yr");
    let month = captured(caps, "mo");
    let day = captured(caps, "da");

    if !day.is_empty() && !config.entries.day_indexes {
        return None;
    }
    if !month.is_empty() && !config.entries.month_indexes {
        return None;
    }
    if !config.entries.year_indexes {
        return None;
    }

    // date archives enumerate the whole data root and post-filter by
    // timestamp; they are not anchored to a directory
    Some(RouteMatch {
        mode: ContentMode::Listing,
        root: config.paths.datadir.clone(),
        year,
        month,
        day,
        theme: caps.name("theme").map(|m| m.as_str().to_string()),
        strip_url_path: true,
    })
}

/// Try each registered extension against a base path and return the
/// first existing entry file.
pub fn what_ext(extensions: &[String], base: &Path) -> Option<PathBuf> {
    extensions.iter().find_map(|ext| {
        let candidate = PathBuf::from(format!("{}.{ext}", base.display()));
        candidate.is_file().then_some(candidate)
    })
}

// ============================================================================
// Resolution
// ============================================================================

/// Classify a url path. `fallback_theme` applies when the path carries
/// no theme extension (the caller derives it from the query string or
/// the configured default).
pub fn resolve_path(
    config: &SiteConfig,
    extensions: &[String],
    path_info: &str,
    fallback_theme: &str,
) -> PathInfo {
    let matched = ROUTES.iter().find_map(|route| {
        let caps = route.pattern.captures(path_info)?;
        (route.apply)(config, extensions, &caps)
    });

    let matched = matched.unwrap_or_else(|| RouteMatch {
        // nothing recognized: keep the literal path, 404s at render
        mode: ContentMode::Unknown,
        root: config.paths.datadir.join(path_info.trim_start_matches('/')),
        year: String::new(),
        month: String::new(),
        day: String::new(),
        theme: None,
        strip_url_path: false,
    });

    let truncate = if !matched.year.is_empty() {
        config.entries.truncate_date
    } else if matched.mode == ContentMode::Listing {
        if is_front_page(path_info) {
            config.entries.truncate_frontpage
        } else {
            config.entries.truncate_category
        }
    } else {
        false
    };

    let base_url = config.blog.base_url.trim_end_matches('/');
    let url = if matched.strip_url_path {
        base_url.to_string()
    } else {
        format!("{base_url}{path_info}")
    };

    PathInfo {
        mode: matched.mode,
        root: matched.root,
        year: matched.year,
        month: matched.month,
        day: matched.day,
        theme: matched.theme.unwrap_or_else(|| fallback_theme.to_string()),
        truncate,
        path_info: path_info.to_string(),
        url,
    }
}

fn is_front_page(path_info: &str) -> bool {
    matches!(path_info, "" | "/" | "/index") || path_info.starts_with("/index.")
}

// ============================================================================
// Tests
// ============================================================================

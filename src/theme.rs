//! Themes: named template sets controlling output for one format.
//!
//! A theme "taste" (html, rss, atom, ...) maps template roles
//! (`content_type`, `head`, `story`, `foot`, `date_head`, `date_foot`,
//! plus any custom names) to template text.
//!
//! Resolution is a directory overlay:
//!
//! 1. the embedded built-in theme for the taste, if there is one
//! 2. the theme directory root - either `themedir/<taste>/` or plain
//!    `themedir/*.{taste}` files
//! 3. each directory along the request's category path, so a category
//!    can override individual templates of its parents
//!
//! Later layers override earlier ones template-by-template. A taste
//! with no templates anywhere does not exist in this blog.

use crate::config::SiteConfig;
use crate::log;
use std::{collections::BTreeMap, fs, path::Path};

// ============================================================================
// Built-in Themes
// ============================================================================

const BUILTIN_HTML: &[(&str, &str)] = &[
    ("content_type", include_str!("embed/themes/html/content_type.html")),
    ("head", include_str!("embed/themes/html/head.html")),
    ("date_head", include_str!("embed/themes/html/date_head.html")),
    ("date_foot", include_str!("embed/themes/html/date_foot.html")),
    ("story", include_str!("embed/themes/html/story.html")),
    ("foot", include_str!("embed/themes/html/foot.html")),
];

const BUILTIN_RSS: &[(&str, &str)] = &[
    ("content_type", include_str!("embed/themes/rss/content_type.rss")),
    ("head", include_str!("embed/themes/rss/head.rss")),
    ("story", include_str!("embed/themes/rss/story.rss")),
    ("foot", include_str!("embed/themes/rss/foot.rss")),
];

const BUILTIN_ERROR: &[(&str, &str)] = &[
    ("content_type", include_str!("embed/themes/error/content_type.error")),
    ("head", include_str!("embed/themes/error/head.error")),
    ("story", include_str!("embed/themes/error/story.error")),
    ("foot", include_str!("embed/themes/error/foot.error")),
];

/// The embedded template set for a taste, if one ships with the engine.
pub fn builtin_theme(taste: &str) -> Option<BTreeMap<String, String>> {
    let templates = match taste {
        "html" => BUILTIN_HTML,
        "rss" => BUILTIN_RSS,
        "error" => BUILTIN_ERROR,
        _ => return None,
    };
    Some(
        templates
            .iter()
            .map(|(name, text)| (name.to_string(), text.to_string()))
            .collect(),
    )
}

/// The always-available error theme, used when even the error taste is
/// missing from the blog's theme directory.
pub fn fallback_error_theme() -> Theme {
    Theme {
        taste: "error".to_string(),
        // the embedded error theme always exists
        templates: builtin_theme("error").unwrap_or_default(),
    }
}

// ============================================================================
// Theme
// ============================================================================

/// A resolved template set for one taste. Read-only after resolution.
#[derive(Debug, Clone)]
pub struct Theme {
    taste: String,
    templates: BTreeMap<String, String>,
}

impl Theme {
    /// Resolve the theme for `taste`, overlaying the built-in set, the
    /// theme directory root, and each directory along the url path.
    /// `None` means the taste does not exist in this blog.
    pub fn load(config: &SiteConfig, path_info: &str, taste: &str) -> Option<Self> {
        let mut templates = builtin_theme(taste).unwrap_or_default();

        let themedir = &config.paths.themedir;
        if let Some(found) = theme_from_dir(themedir, taste) {
            templates.extend(found);
        }

        // walk down the category path, overriding as we go
        let mut dir = themedir.clone();
        for segment in path_info.split('/').filter(|s| !s.is_empty()) {
            dir.push(segment);
            if !dir.is_dir() {
                break;
            }
            if let Some(found) = theme_from_dir(&dir, taste) {
                templates.extend(found);
            }
        }

        (!templates.is_empty()).then(|| Self {
            taste: taste.to_string(),
            templates,
        })
    }

    pub fn taste(&self) -> &str {
        &self.taste
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }
}

/// Collect the template files for a taste from one directory: a
/// `<taste>/` subdirectory wins, otherwise plain `*.{taste}` files.
fn theme_from_dir(dir: &Path, taste: &str) -> Option<BTreeMap<String, String>> {
    let taste_dir = dir.join(taste);
    if taste_dir.is_dir() {
        return Some(collect_templates(&taste_dir, taste, true));
    }

    let templates = collect_templates(dir, taste, false);
    (!templates.is_empty()).then_some(templates)
}

fn collect_templates(dir: &Path, taste: &str, allow_bare: bool) -> BTreeMap<String, String> {
    let Ok(listing) = fs::read_dir(dir) else {
        return BTreeMap::new();
    };

    let mut templates = BTreeMap::new();
    for entry in listing.filter_map(Result::ok) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.is_empty() || name.starts_with('.') {
            continue;
        }
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if ext != taste && !(allow_bare && ext.is_empty()) {
            continue;
        }
        match fs::read_to_string(&path) {
            Ok(text) => {
                templates.insert(name, text);
            }
            Err(err) => {
                log!("theme"; "cannot read {}: {err}", path.display());
            }
        }
    }
    templates
}

// ============================================================================
// Tests
// ============================================================================

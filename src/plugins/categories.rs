//! Category links for theme templates.
//!
//! Walks the data directory, counts entries per category (each entry
//! counts toward every ancestor category), and exposes the result as a
//! `{categorylinks}` template variable: a nested html list of links to
//! category index pages.
//!
//! The scan is memoized per data directory; the cache is only active
//! during compile runs, where content cannot change mid-run.

use crate::cache::Memo;
use crate::callback::{Hook, Plugin, Registry};
use crate::request::{Request, Site};
use crate::resolver::get_entries;
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub struct Categories;

impl Plugin for Categories {
    fn name(&self) -> &'static str {
        "categories"
    }

    fn register(&self, registry: &mut Registry) {
        registry.prepare.push(Hook::new("categories", prepare));
    }
}

static SCAN_CACHE: LazyLock<Memo<Vec<(String, usize)>>> = LazyLock::new(Memo::new);

fn prepare(req: &mut Request) -> Option<()> {
    let site = req.site.clone();
    let theme = req.data.route.theme.clone();

    let key = site.config.paths.datadir.to_string_lossy().into_owned();
    let counts = SCAN_CACHE.get_or_insert_with(&key, || category_counts(&site));
    let html = as_list(&counts, &site.config.blog.base_url, &theme);

    req.data.vars.insert("categorylinks".to_string(), html);
    None
}

/// Count entries per category. Each entry counts toward the root
/// category and every category on its path.
fn category_counts(site: &Site) -> Vec<(String, usize)> {
    let root = &site.config.paths.datadir;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();

    for file in get_entries(site, root, 0) {
        let category = file
            .parent()
            .and_then(|dir| dir.strip_prefix(root).ok())
            .map(|rel| rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/"))
            .unwrap_or_default();
        for parent in parents(&category) {
            *counts.entry(parent).or_default() += 1;
        }
    }

    counts.into_iter().collect()
}

/// All ancestors of a category path, root first: `"a/b"` yields
/// `""`, `"a"`, `"a/b"`.
fn parents(category: &str) -> Vec<String> {
    let mut result = vec![String::new()];
    let mut prefix = String::new();
    for segment in category.split('/').filter(|s| !s.is_empty()) {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(segment);
        result.push(prefix.clone());
    }
    result
}

/// Render the counts as a nested html list of category links.
fn as_list(counts: &[(String, usize)], base_url: &str, theme: &str) -> String {
    let mut output = vec![r#"<ul class="categorygroup">"#.to_string()];
    let mut depth = 0usize;

    for (category, count) in counts {
        let level = if category.is_empty() {
            0
        } else {
            category.split('/').count()
        };

        while depth < level {
            output.push(r#"<li><ul class="categorygroup">"#.to_string());
            depth += 1;
        }
        while depth > level {
            output.push("</ul></li>".to_string());
            depth -= 1;
        }

        let label = if category.is_empty() {
            "/".to_string()
        } else {
            format!("{}/", category.rsplit('/').next().unwrap_or(category))
        };
        let href = if category.is_empty() {
            format!("{base_url}/index.{theme}")
        } else {
            format!("{base_url}/{}/index.{theme}", encode_path(category))
        };
        output.push(format!(
            r#"<li><a href="{href}">{}</a> ({count})</li>"#,
            html_escape::encode_text(&label)
        ));
    }

    while depth > 0 {
        output.push("</ul></li>".to_string());
        depth -= 1;
    }
    output.push("</ul>".to_string());
    output.join("\n")
}

/// Percent-encode a category path, segment by segment, keeping the
/// slashes.
fn encode_path(category: &str) -> String {
    category
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::entry::create_entry;
    use crate::request::HttpEnv;
    use chrono::Local;
    use std::collections::BTreeMap as Meta;
    use tempfile::tempdir;

    fn site_with_entries() -> (tempfile::TempDir, Site) {
        let dir = tempdir().unwrap();
        for (category, name) in [("", "a.txt"), ("dev", "b.txt"), ("dev/rust", "c.txt")] {
            create_entry(
                dir.path(),
                category,
                name,
                Local::now(),
                "T",
                &Meta::new(),
                "",
            )
            .unwrap();
        }
        let mut config = SiteConfig::default();
        config.paths.datadir = dir.path().to_path_buf();
        config.blog.base_url = "http://www.example.com".into();
        let mut registry = Registry::new();
        Categories.register(&mut registry);
        (dir, Site::new(config, registry))
    }

    #[test]
    fn test_parents() {
        assert_eq!(parents(""), vec![""]);
        assert_eq!(parents("a"), vec!["", "a"]);
        assert_eq!(parents("a/b"), vec!["", "a", "a/b"]);
    }

    #[test]
    fn test_category_counts_roll_up() {
        let (_dir, site) = site_with_entries();
        let counts = category_counts(&site);

        let lookup: BTreeMap<_, _> = counts.into_iter().collect();
        assert_eq!(lookup[""], 3);
        assert_eq!(lookup["dev"], 2);
        assert_eq!(lookup["dev/rust"], 1);
    }

    #[test]
    fn test_prepare_sets_categorylinks_var() {
        let (_dir, site) = site_with_entries();
        let mut http = HttpEnv::new();
        http.insert("PATH_INFO".into(), "/".into());
        let mut req = Request::new(site.clone(), http);
        req.data.route.theme = "html".into();

        prepare(&mut req);
        let html = &req.data.vars["categorylinks"];
        assert!(html.contains("http://www.example.com/dev/index.html"));
        assert!(html.contains("http://www.example.com/dev/rust/index.html"));
        assert!(html.contains("(3)"));
        assert!(html.contains("(1)"));
    }

    #[test]
    fn test_as_list_nesting_balanced() {
        let counts = vec![
            ("".to_string(), 3),
            ("dev".to_string(), 2),
            ("dev/rust".to_string(), 1),
        ];
        let html = as_list(&counts, "http://b", "html");
        assert_eq!(html.matches("<ul").count(), html.matches("</ul>").count());
        assert_eq!(html.matches("<li").count(), html.matches("</li>").count());
    }

    #[test]
    fn test_encode_path_keeps_slashes() {
        assert_eq!(encode_path("a b/c"), "a%20b/c");
    }
}

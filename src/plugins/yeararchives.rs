//! Year archive pages.
//!
//! Takes over `/<yyyy>` urls entirely: a `pathinfo` hook claims the
//! route and a `filelist` hook replaces the default resolver, building
//! one synthetic summary entry per month with links to that month's
//! posts. Feed themes (rss, atom) are left to the regular date-archive
//! handling so feeds keep their usual shape.

use crate::callback::{Hook, Plugin, Registry};
use crate::entry::{Entry, filestat};
use crate::log;
use crate::request::Request;
use crate::resolver::get_entries;
use crate::router::{ContentMode, PathInfo};
use chrono::{Local, TimeZone};
use regex::Regex;
use std::sync::LazyLock;

pub struct YearArchives;

impl Plugin for YearArchives {
    fn name(&self) -> &'static str {
        "yeararchives"
    }

    fn register(&self, registry: &mut Registry) {
        registry.pathinfo.push(Hook::new("yeararchives", pathinfo));
        registry.filelist.push(Hook::new("yeararchives", filelist));
    }
}

static RE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(\d{4})(?:/index(?:\.([^./]+))?)?/?$").unwrap());

/// Match `/2004`, `/2004/`, `/2004/index`, `/2004/index.theme`.
/// Returns the year and the theme extension, if any.
fn parse_path(path: &str) -> Option<(String, Option<String>)> {
    let caps = RE_YEAR.captures(path)?;
    let year = caps.get(1)?.as_str().to_string();
    let theme = caps.get(2).map(|m| m.as_str().to_string());
    Some((year, theme))
}

fn is_feed_theme(theme: &str) -> bool {
    matches!(theme, "rss" | "atom")
}

fn pathinfo(req: &mut Request) -> Option<PathInfo> {
    let (year, theme) = parse_path(req.path_info())?;
    let theme = theme.unwrap_or_else(|| req.theme());
    if is_feed_theme(&theme) {
        return None;
    }

    // a category directory with a year-like name keeps its usual route
    if req.config().paths.datadir.join(&year).is_dir() {
        return None;
    }

    req.data.view = "yeararchives".to_string();

    let config = req.config();
    let base_url = config.blog.base_url.trim_end_matches('/').to_string();
    Some(PathInfo {
        // the filelist hook below supplies the entries
        mode: ContentMode::Unknown,
        root: config.paths.datadir.clone(),
        year: String::new(),
        month: String::new(),
        day: String::new(),
        theme,
        truncate: false,
        path_info: req.path_info().to_string(),
        url: base_url,
    })
}

fn filelist(req: &mut Request) -> Option<Vec<Entry>> {
    if req.data.view != "yeararchives" {
        return None;
    }
    let (year, _) = parse_path(req.path_info())?;

    let site = req.site.clone();
    let theme = req.data.route.theme.clone();
    let base_url = site.config.blog.base_url.clone();

    // (YYYY-MM, YYYY-MM-DD, title, permalink) for the year, newest first
    let mut items: Vec<(String, String, String, String)> = Vec::new();
    for path in get_entries(&site, &site.config.paths.datadir, 0) {
        let Ok(mtime) = filestat(&site, &path) else {
            continue;
        };
        if mtime.format("%Y").to_string() != year {
            continue;
        }
        let entry = match Entry::load(&site, &path) {
            Ok(entry) => entry,
            Err(err) => {
                log!("yeararchives"; "skipping {}: {err:#}", path.display());
                continue;
            }
        };
        let vars = match entry.vars() {
            Ok(vars) => vars,
            Err(err) => {
                log!("yeararchives"; "skipping {}: {err:#}", path.display());
                continue;
            }
        };
        let file_path = vars.get("file_path").cloned().unwrap_or_default();
        items.push((
            mtime.format("%Y-%m").to_string(),
            mtime.format("%Y-%m-%d").to_string(),
            vars.get("title").cloned().unwrap_or_default(),
            format!("{base_url}/{file_path}.{theme}"),
        ));
    }
    items.sort_by(|a, b| b.1.cmp(&a.1));

    // one synthetic summary entry per month
    let mut entries = Vec::new();
    let mut month = String::new();
    let mut rows: Vec<String> = Vec::new();
    for (item_month, day, title, link) in &items {
        if *item_month != month {
            if !rows.is_empty() {
                entries.push(summary_entry(req, &month, &rows));
                rows.clear();
            }
            month = item_month.clone();
        }
        rows.push(format!(
            r#"<li>({day}) <a href="{link}">{}</a></li>"#,
            html_escape::encode_text(title)
        ));
    }
    if !rows.is_empty() {
        entries.push(summary_entry(req, &month, &rows));
    }

    Some(entries)
}

fn summary_entry(req: &Request, month: &str, rows: &[String]) -> Entry {
    let body = format!("<ul class=\"archives\">\n{}\n</ul>", rows.join("\n"));
    let mtime = parse_month(month).unwrap_or_else(Local::now);
    let mut entry = Entry::synthetic(&req.site, &format!("{month}::summary"), month, &body, mtime);
    entry.set_var("template_name", "yearsummarystory");
    entry
}

fn parse_month(month: &str) -> Option<chrono::DateTime<Local>> {
    let (year, month) = month.split_once('-')?;
    Local
        .with_ymd_and_hms(year.parse().ok()?, month.parse().ok()?, 1, 0, 0, 0)
        .single()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::entry::create_entry;
    use crate::request::{HttpEnv, Site};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn test_parse_path() {
        assert_eq!(parse_path("/2004"), Some(("2004".into(), None)));
        assert_eq!(parse_path("/2004/"), Some(("2004".into(), None)));
        assert_eq!(parse_path("/2004/index"), Some(("2004".into(), None)));
        assert_eq!(
            parse_path("/2004/index.html"),
            Some(("2004".into(), Some("html".into())))
        );
        assert_eq!(parse_path("/2004/05"), None);
        assert_eq!(parse_path("/about"), None);
    }

    fn archive_site() -> (tempfile::TempDir, Site) {
        let dir = tempdir().unwrap();
        let entries = [
            ("march.txt", "March post", (2020, 3, 10)),
            ("may-a.txt", "May post one", (2020, 5, 2)),
            ("may-b.txt", "May post two", (2020, 5, 20)),
            ("other-year.txt", "Old post", (2019, 7, 1)),
        ];
        for (name, title, (y, m, d)) in entries {
            let mtime = Local.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap();
            create_entry(dir.path(), "", name, mtime, title, &BTreeMap::new(), "").unwrap();
        }

        let mut config = SiteConfig::default();
        config.paths.datadir = dir.path().to_path_buf();
        config.blog.base_url = "http://www.example.com".into();
        let mut registry = Registry::new();
        YearArchives.register(&mut registry);
        (dir, Site::new(config, registry))
    }

    fn request_for(site: &Site, path: &str) -> Request {
        let mut http = HttpEnv::new();
        http.insert("PATH_INFO".into(), path.into());
        Request::new(site.clone(), http)
    }

    #[test]
    fn test_year_page_groups_by_month() {
        let (_dir, site) = archive_site();
        let mut req = request_for(&site, "/2020");
        let response = crate::app::run(&site, &mut req).unwrap();

        assert_eq!(response.status(), 200);
        let body = String::from_utf8_lossy(response.body());
        assert!(body.contains("2020-03"));
        assert!(body.contains("2020-05"));
        assert!(body.contains("May post one"));
        assert!(body.contains("May post two"));
        assert!(body.contains("March post"));
        assert!(!body.contains("Old post"));
    }

    #[test]
    fn test_feed_theme_falls_through_to_date_archive() {
        let (_dir, site) = archive_site();
        let mut req = request_for(&site, "/2020/index.rss");
        let response = crate::app::run(&site, &mut req).unwrap();

        let body = String::from_utf8_lossy(response.body());
        // the regular rss date archive renders, not the summary page
        assert!(body.contains("<rss version=\"2.0\">"));
        assert!(!body.contains("::summary"));
        assert!(body.contains("May post two"));
    }

    #[test]
    fn test_year_named_directory_keeps_priority() {
        let (dir, site) = archive_site();
        std::fs::create_dir(dir.path().join("2020")).unwrap();

        let mut req = request_for(&site, "/2020");
        let response = crate::app::run(&site, &mut req).unwrap();
        // the directory is empty, so the category listing 404s rather
        // than showing the year summary
        assert_eq!(response.status(), 404);
    }
}

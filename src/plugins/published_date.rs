//! Takes an entry's timestamp from a `#published` metadata line.
//!
//! By default an entry's date is its file modification time, which
//! shifts every time the file is edited. With this plugin an entry
//! carrying
//!
//! ```text
//! My post
//! #published 2021-04-09 08:42
//! ...
//! ```
//!
//! keeps that date forever. Runs on the `filestat` chain; entries
//! without the metadata fall through to the filesystem.

use crate::callback::{FileStat, Hook, Plugin, Registry};
use crate::entry::parse_entry_file;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

pub struct PublishedDate;

impl Plugin for PublishedDate {
    fn name(&self) -> &'static str {
        "published_date"
    }

    fn register(&self, registry: &mut Registry) {
        registry
            .filestat
            .push(Hook::new("published_date", published_stat));
    }
}

fn published_stat(args: &mut FileStat) -> Option<DateTime<Local>> {
    let parsed = parse_entry_file(&args.path).ok()?;
    let value = parsed.meta.get("published")?;
    parse_published(value)
}

/// Parse a `#published` value: `YYYY-MM-DD HH:MM[:SS]` or `YYYY-MM-DD`.
pub fn parse_published(value: &str) -> Option<DateTime<Local>> {
    let value = value.trim();

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    Local.from_local_datetime(&naive).earliest()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::entry::{Entry, create_entry};
    use crate::request::Site;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn test_parse_published_formats() {
        assert_eq!(
            parse_published("2021-04-09 08:42").unwrap().format("%Y%m%d%H%M").to_string(),
            "202104090842"
        );
        assert_eq!(
            parse_published("2021-04-09 08:42:30").unwrap().format("%H%M%S").to_string(),
            "084230"
        );
        assert_eq!(
            parse_published("2021-04-09").unwrap().format("%Y%m%d%H%M%S").to_string(),
            "20210409000000"
        );
        assert!(parse_published("yesterday").is_none());
        assert!(parse_published("2021-13-40").is_none());
    }

    #[test]
    fn test_published_metadata_overrides_file_mtime() {
        let dir = tempdir().unwrap();
        let mut meta = BTreeMap::new();
        meta.insert("published".to_string(), "2019-08-01 06:00".to_string());
        let path = create_entry(
            dir.path(),
            "",
            "a.txt",
            Local::now(),
            "A",
            &meta,
            "body\n",
        )
        .unwrap();

        let mut config = SiteConfig::default();
        config.paths.datadir = dir.path().to_path_buf();
        let mut registry = Registry::new();
        PublishedDate.register(&mut registry);
        let site = Site::new(config, registry);

        let entry = Entry::load(&site, &path).unwrap();
        assert_eq!(entry.fulltime(), "20190801060000");
    }

    #[test]
    fn test_entries_without_metadata_fall_through() {
        let dir = tempdir().unwrap();
        let mtime = Local::now() - chrono::Duration::hours(1);
        let path = create_entry(
            dir.path(),
            "",
            "plain.txt",
            mtime,
            "Plain",
            &BTreeMap::new(),
            "body\n",
        )
        .unwrap();

        let mut config = SiteConfig::default();
        config.paths.datadir = dir.path().to_path_buf();
        let mut registry = Registry::new();
        PublishedDate.register(&mut registry);
        let site = Site::new(config, registry);

        let entry = Entry::load(&site, &path).unwrap();
        // filesystem mtime survives, to the second
        assert_eq!(
            entry.mtime().format("%Y%m%d%H%M%S").to_string(),
            mtime.format("%Y%m%d%H%M%S").to_string()
        );
    }
}

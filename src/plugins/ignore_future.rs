//! Hides entries with timestamps in the future.
//!
//! Runs on the `entries` chain, so every listing (and every plugin that
//! walks the data directory through the resolver) sees only entries
//! whose timestamp has passed. Combine with `published_date` to queue
//! posts for later publication.

use crate::callback::{EntryFiles, Hook, Plugin, Registry};
use crate::entry::filestat;
use chrono::Local;

pub struct IgnoreFuture;

impl Plugin for IgnoreFuture {
    fn name(&self) -> &'static str {
        "ignore_future"
    }

    fn register(&self, registry: &mut Registry) {
        registry
            .entries
            .push(Hook::new("ignore_future", drop_future_entries));
    }
}

fn drop_future_entries(args: &mut EntryFiles) -> Option<()> {
    let now = Local::now();
    let site = args.site.clone();
    args.files.retain(|path| match filestat(&site, path) {
        Ok(mtime) => mtime <= now,
        // unreadable files are someone else's problem; keep them
        Err(_) => true,
    });
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::entry::create_entry;
    use crate::request::Site;
    use crate::resolver::get_entries;
    use chrono::Duration;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn test_future_entries_dropped_from_listings() {
        let dir = tempdir().unwrap();
        let past = Local::now() - Duration::days(2);
        let future = Local::now() + Duration::days(2);
        create_entry(dir.path(), "", "past.txt", past, "Past", &BTreeMap::new(), "").unwrap();
        create_entry(dir.path(), "", "future.txt", future, "Future", &BTreeMap::new(), "").unwrap();

        let mut config = SiteConfig::default();
        config.paths.datadir = dir.path().to_path_buf();
        let mut registry = Registry::new();
        IgnoreFuture.register(&mut registry);
        let site = Site::new(config, registry);

        let files = get_entries(&site, dir.path(), 0);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("past.txt"));
    }
}

//! Entry resolution: turn a routed path into an ordered entry list.
//!
//! Listings walk the data directory (depth-limited, extension-filtered,
//! skipping dotfiles and ignored directories), run the file list through
//! the `entries` chain, apply any date filter, then sort and truncate
//! through their chains. Plugins replace the whole resolution for a
//! request by returning `Some` from a `filelist` hook, which
//! short-circuits this default resolver entirely.
//!
//! Resolution never mutates files on disk.

use crate::callback::{EntryFiles, ListArgs, first_of, notify};
use crate::entry::Entry;
use crate::log;
use crate::request::{Request, Site};
use crate::router::ContentMode;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// ============================================================================
// File Enumeration
// ============================================================================

/// Enumerate entry files under `root`.
///
/// `depth` limits the walk: 0 goes all the way down, 1 stays in `root`,
/// 2 descends one level, and so on. Only files whose extension has a
/// registered parser are returned. Dotfiles, symlinked directories, and
/// directories matching `ignore_directories` suffixes are skipped.
///
/// The result flows through the `entries` chain, so plugins may remove
/// or add paths.
pub fn get_entries(site: &Site, root: &Path, depth: usize) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }

    let extensions = site.registry.extensions();
    let ignore = site.config.entries.ignore_directories.clone();

    let mut walker = WalkDir::new(root);
    if depth > 0 {
        walker = walker.max_depth(depth);
    }

    let files = walker
        .into_iter()
        .filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') {
                return false;
            }
            if entry.file_type().is_dir() {
                let path = entry.path().to_string_lossy();
                if ignore.iter().any(|suffix| path.ends_with(suffix.as_str())) {
                    return false;
                }
            }
            true
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.iter().any(|known| known == ext))
        })
        .collect();

    let mut args = EntryFiles {
        site: site.clone(),
        files,
    };
    notify(&site.registry.entries, &mut args);
    args.files
}

// ============================================================================
// Default Resolution
// ============================================================================

/// The default `filelist` handler: resolve the routed path into entries,
/// date-filter, then run the sort and truncate chains.
pub fn default_filelist(req: &mut Request) -> Vec<Entry> {
    let site = req.site.clone();
    let route = req.data.route.clone();

    let files = match route.mode {
        ContentMode::Listing => get_entries(&site, &route.root, site.config.entries.depth),
        ContentMode::Single => vec![route.root.clone()],
        ContentMode::Unknown => Vec::new(),
    };

    let mut entries: Vec<Entry> = files
        .iter()
        .filter_map(|path| match Entry::load(&site, path) {
            Ok(entry) => Some(entry),
            Err(err) => {
                log!("entry"; "skipping {}: {err:#}", path.display());
                None
            }
        })
        .collect();

    // archive requests keep only entries whose compact timestamp starts
    // with the year[month[day]] prefix
    let datestr = format!("{}{}{}", route.year, route.month, route.day);
    if !datestr.is_empty() {
        entries.retain(|entry| entry.fulltime().starts_with(&datestr));
    }

    let mut args = ListArgs {
        entries,
        truncate: route.truncate,
        num_entries: site.config.entries.num_entries,
    };
    args.entries = first_of(&site.registry.sortlist, &mut args, default_sort);
    first_of(&site.registry.truncatelist, &mut args, default_truncate)
}

/// Default sort: most recently written entries first. The sort is
/// stable, so same-timestamp entries keep their walk order.
pub fn default_sort(args: &mut ListArgs) -> Vec<Entry> {
    let mut entries = std::mem::take(&mut args.entries);
    entries.sort_by(|a, b| b.mtime().cmp(&a.mtime()));
    entries
}

/// Default truncation: keep the first `num_entries` when the route asked
/// for truncation and a positive limit is configured.
pub fn default_truncate(args: &mut ListArgs) -> Vec<Entry> {
    let mut entries = std::mem::take(&mut args.entries);
    if args.truncate && args.num_entries > 0 {
        entries.truncate(args.num_entries);
    }
    entries
}

// ============================================================================
// Tests
// ============================================================================

//! Static compilation: pre-render every reachable url to disk.
//!
//! Builds the url list - every entry times `compile.themes`, category
//! and date indexes times `compile.index_themes`, plus configured
//! extras - lets plugins extend it through the `compile_filelist`
//! chain, then repeats the whole request pipeline once per url,
//! sequentially, writing each body to the compile directory.

use crate::app;
use crate::callback::{CompileList, notify};
use crate::entry::filestat;
use crate::log;
use crate::request::Site;
use crate::resolver::get_entries;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::{collections::BTreeSet, fs, path::Path};
use walkdir::WalkDir;

// ============================================================================
// Compilation
// ============================================================================

/// Compile the blog into a static site under `paths.compiledir`.
///
/// With `incremental`, entries whose first-theme output is newer than
/// the entry file are skipped; index pages are always re-rendered.
pub fn run_compile(site: &Site, incremental: bool) -> Result<()> {
    let config = &site.config;
    let compiledir = config.compiledir()?.to_path_buf();
    let datadir = &config.paths.datadir;

    log!("compile"; "compiling to {}", compiledir.display());
    if incremental {
        log!("compile"; "incremental is set");
    }

    let themes = config.compile.themes.clone();
    let index_themes = config.compile.index_themes.clone();

    let mut renderme: Vec<(String, String)> = Vec::new();
    let mut categories: BTreeSet<String> = BTreeSet::new();
    let mut dates: BTreeSet<String> = BTreeSet::new();

    let listing = get_entries(site, datadir, 0);
    let mut entry_count = 0usize;

    for path in &listing {
        let mtime = match filestat(site, path) {
            Ok(mtime) => mtime,
            Err(err) => {
                log!("compile"; "skipping {}: {err:#}", path.display());
                continue;
            }
        };

        let Some(rel) = relative_url(datadir, path) else {
            continue;
        };

        if incremental && let Some(first_theme) = themes.first() {
            let compiled = compiledir.join(format!("{}.{first_theme}", rel.trim_start_matches('/')));
            if output_is_current(&compiled, mtime) {
                continue;
            }
        }

        // every ancestor directory is a category index to render
        let dir = rel.trim_start_matches('/').rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        let mut prefix = String::new();
        categories.insert(String::new());
        for segment in dir.split('/').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            categories.insert(prefix.clone());
        }

        // date indexes for each enabled granularity
        let year = mtime.format("%Y").to_string();
        let month = mtime.format("%m").to_string();
        let day = mtime.format("%d").to_string();
        if config.entries.year_indexes {
            dates.insert(year.clone());
        }
        if config.entries.month_indexes {
            dates.insert(format!("{year}/{month}"));
        }
        if config.entries.day_indexes {
            dates.insert(format!("{year}/{month}/{day}"));
        }

        for theme in &themes {
            renderme.push((format!("{rel}.{theme}"), String::new()));
        }
        entry_count += 1;
    }

    log!("compile"; "found {entry_count} entry(es)");
    log!("compile"; "found {} category index(es)", categories.len());
    log!("compile"; "found {} date index(es)", dates.len());

    for category in &categories {
        let base = if category.is_empty() {
            "/index".to_string()
        } else {
            format!("/{category}/index")
        };
        for theme in &index_themes {
            renderme.push((format!("{base}.{theme}"), String::new()));
        }
    }

    for date in &dates {
        for theme in &index_themes {
            renderme.push((format!("/{date}/index.{theme}"), String::new()));
        }
    }

    for extra in &config.compile.urls {
        let (url, query) = extra.split_once('?').unwrap_or((extra.as_str(), ""));
        renderme.push((url.to_string(), query.to_string()));
    }

    // let plugins queue their own urls
    let total = renderme.len();
    let mut args = CompileList {
        site: site.clone(),
        urls: renderme,
        themes,
        index_themes,
        incremental,
    };
    notify(&site.registry.compile_filelist, &mut args);

    let renderme: BTreeSet<(String, String)> = args.urls.into_iter().collect();
    if renderme.len() > total {
        log!("compile"; "found {} url(s) specified by plugins", renderme.len() - total);
    }

    log!("compile"; "compiling {} url(s) total", renderme.len());
    for (url, query) in &renderme {
        render_url_statically(site, url, query)?;
    }

    log!("compile"; "done");
    Ok(())
}

/// Render one url through the pipeline and save the body to the
/// compile directory at the url-derived path.
pub fn render_url_statically(site: &Site, url: &str, query: &str) -> Result<()> {
    let compiledir = site.config.compiledir()?;
    let response = app::run_url(site, url, query, true)
        .with_context(|| format!("rendering {url}"))?;

    let target = compiledir.join(url.trim_start_matches('/'));
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    fs::write(&target, response.body())
        .with_context(|| format!("cannot write {}", target.display()))?;

    log!("compile"; "rendered {url}");
    Ok(())
}

/// The url path for an entry file, relative to the data root, without
/// its extension: `<datadir>/cat/post.txt` -> `/cat/post`.
fn relative_url(datadir: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(datadir).ok()?.with_extension("");
    let rel = rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");
    Some(format!("/{rel}"))
}

fn output_is_current(compiled: &Path, entry_mtime: DateTime<Local>) -> bool {
    let Ok(meta) = fs::metadata(compiled) else {
        return false;
    };
    let Ok(modified) = meta.modified() else {
        return false;
    };
    DateTime::<Local>::from(modified) >= entry_mtime
}

// ============================================================================
// Static Files
// ============================================================================

/// Copy `paths.static_dirs` and every theme's `static/` directory into
/// `<compiledir>/static`.
pub fn run_collectstatic(site: &Site) -> Result<()> {
    let config = &site.config;
    let dst = config.compiledir()?.join("static");
    fs::create_dir_all(&dst).with_context(|| format!("cannot create {}", dst.display()))?;

    for dir in &config.paths.static_dirs {
        copy_dir(dir, &dst)?;
    }

    if let Ok(listing) = fs::read_dir(&config.paths.themedir) {
        for entry in listing.filter_map(Result::ok) {
            let static_dir = entry.path().join("static");
            if static_dir.is_dir() {
                copy_dir(&static_dir, &dst)?;
            }
        }
    }

    Ok(())
}

/// Recursively copy a directory tree, preserving relative layout.
fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_dir() {
        log!("compile"; "skipping missing static dir {}", src.display());
        return Ok(());
    }

    for entry in WalkDir::new(src).into_iter().filter_map(Result::ok) {
        let rel = match entry.path().strip_prefix(src) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("cannot create {}", target.display()))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)
                .with_context(|| format!("cannot copy {}", entry.path().display()))?;
            log!("compile"; "copied {}", target.display());
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

//! Blog initialization: create a new blog skeleton.
//!
//! Writes a default configuration, the data directory with a sample
//! first post, and editable copies of the embedded html and rss themes.

use crate::config::SiteConfig;
use crate::entry::create_entry;
use crate::log;
use crate::theme::builtin_theme;
use anyhow::{Context, Result, bail};
use chrono::Local;
use std::{collections::BTreeMap, fs, path::Path};

/// Default config filename
const CONFIG_FILE: &str = "bramble.toml";

const FIRST_POST: &str = "\
Welcome to your new blog. This whole post is one plain text file in
your data directory. The first line is the title, `#key value` lines
after it are metadata, and the rest is the body.

Edit me, add more files, then run `bramble serve`.
";

/// Create a new blog at `root` with the default structure.
pub fn new_blog(root: &Path) -> Result<()> {
    if root.exists() && !is_dir_empty(root)? {
        bail!("{} is not empty.", root.display());
    }

    let mut config = SiteConfig::default();
    config.blog.base_url = "http://localhost:8000".into();
    config.paths.compiledir = Some("compiled".into());

    let datadir = root.join(&config.paths.datadir);
    let themedir = root.join(&config.paths.themedir);
    fs::create_dir_all(&datadir)
        .with_context(|| format!("cannot create {}", datadir.display()))?;
    fs::create_dir_all(&themedir)
        .with_context(|| format!("cannot create {}", themedir.display()))?;

    init_default_config(root, &config)?;
    init_themes(&themedir)?;

    create_entry(
        &datadir,
        "",
        "first-post.txt",
        Local::now(),
        "First post!",
        &BTreeMap::new(),
        FIRST_POST,
    )?;

    log!("init"; "created blog at {}", root.display());
    log!("init"; "run `bramble -C {} serve` to see it", root.join(CONFIG_FILE).display());
    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Write default configuration file
fn init_default_config(root: &Path, config: &SiteConfig) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    fs::write(root.join(CONFIG_FILE), content)?;
    Ok(())
}

/// Write editable copies of the embedded themes so the new blog's
/// templates are visible on disk.
fn init_themes(themedir: &Path) -> Result<()> {
    for taste in ["html", "rss"] {
        // every taste written here ships embedded
        let Some(templates) = builtin_theme(taste) else {
            continue;
        };
        let taste_dir = themedir.join(taste);
        fs::create_dir_all(&taste_dir)?;
        for (name, text) in templates {
            fs::write(taste_dir.join(format!("{name}.{taste}")), text)?;
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

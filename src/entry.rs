//! Entries: one blog post or page, backed by a single file.
//!
//! An entry's identity is its file path. The stat-derived timestamp and
//! its formatted variants are computed at load time through the
//! `filestat` chain; the title, metadata, and body are populated lazily
//! on first access by the parser registered for the file's extension.
//!
//! # Entry file format
//!
//! ```text
//! First post          <- line 1: title
//! #tags rust,blog     <- `#key value` metadata lines (value defaults to "1")
//! #draft
//! The body starts     <- everything else: body
//! here.
//! ```

use crate::callback::{FileStat, first_opt};
use crate::request::Site;
use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Local, Utc};
use std::{
    cell::OnceCell,
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Parser for one entry file extension.
pub type ParserFn =
    Box<dyn Fn(&Path, &crate::config::SiteConfig) -> Result<ParsedEntry> + Send + Sync>;

/// The parsed pieces of an entry file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedEntry {
    pub title: String,
    pub meta: BTreeMap<String, String>,
    pub body: String,
}

// ============================================================================
// Entry
// ============================================================================

/// One blog post or page.
pub struct Entry {
    site: Site,
    path: PathBuf,
    id: String,
    mtime: DateTime<Local>,
    fulltime: String,
    parsed: OnceCell<ParsedEntry>,
    overrides: BTreeMap<String, String>,
}

impl Entry {
    /// Load a file-backed entry. The timestamp runs through the
    /// `filestat` chain so plugins can override it; the file content is
    /// not read until a parsed field is first accessed.
    pub fn load(site: &Site, path: &Path) -> Result<Self> {
        let mtime = filestat(site, path)?;
        let id = path.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");
        Ok(Self {
            site: site.clone(),
            path: path.to_path_buf(),
            id,
            mtime,
            fulltime: format_fulltime(mtime),
            parsed: OnceCell::new(),
            overrides: BTreeMap::new(),
        })
    }

    /// Build a synthetic entry that is not backed by a file. Used by
    /// plugins that generate listing content (e.g. archive summaries).
    pub fn synthetic(
        site: &Site,
        id: &str,
        title: &str,
        body: &str,
        mtime: DateTime<Local>,
    ) -> Self {
        let parsed = OnceCell::new();
        let _ = parsed.set(ParsedEntry {
            title: title.to_string(),
            meta: BTreeMap::new(),
            body: body.to_string(),
        });
        Self {
            site: site.clone(),
            path: PathBuf::new(),
            id: id.to_string(),
            mtime,
            fulltime: format_fulltime(mtime),
            parsed,
            overrides: BTreeMap::new(),
        }
    }

    /// Unique-enough id: the file path, or the synthetic id.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mtime(&self) -> DateTime<Local> {
        self.mtime
    }

    /// Compact timestamp `YYYYMMDDHHMMSS`, the form date filters match
    /// against.
    pub fn fulltime(&self) -> &str {
        &self.fulltime
    }

    pub fn title(&self) -> Result<&str> {
        Ok(&self.parsed()?.title)
    }

    pub fn body(&self) -> Result<&str> {
        Ok(&self.parsed()?.body)
    }

    pub fn meta(&self, key: &str) -> Result<Option<&str>> {
        Ok(self.parsed()?.meta.get(key).map(String::as_str))
    }

    /// Add or override a template variable on this entry. Plugin
    /// overrides win over parsed fields.
    pub fn set_var(&mut self, key: &str, value: &str) {
        self.overrides.insert(key.to_string(), value.to_string());
    }

    /// The full template variable map for this entry: path variables,
    /// date variables, parsed title/metadata/body, then overrides.
    pub fn vars(&self) -> Result<BTreeMap<String, String>> {
        let mut vars = self.date_vars();

        if !self.path.as_os_str().is_empty() {
            let datadir = &self.site.config.paths.datadir;
            let basename = self
                .path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let absolute_path = self
                .path
                .parent()
                .and_then(|dir| dir.strip_prefix(datadir).ok())
                .map(|rel| rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/"))
                .unwrap_or_default();
            let file_path = if absolute_path.is_empty() {
                basename.clone()
            } else {
                format!("{absolute_path}/{basename}")
            };

            vars.insert("filename".into(), self.id.clone());
            vars.insert("basename".into(), basename);
            vars.insert("absolute_path".into(), absolute_path);
            vars.insert("file_path".into(), file_path);
        }

        let parsed = self.parsed()?;
        vars.insert("title".into(), parsed.title.clone());
        vars.insert("body".into(), parsed.body.clone());
        for (key, value) in &parsed.meta {
            vars.insert(key.clone(), value.clone());
        }
        for (key, value) in &self.overrides {
            vars.insert(key.clone(), value.clone());
        }
        Ok(vars)
    }

    /// Formatted date variables derived from the entry timestamp.
    fn date_vars(&self) -> BTreeMap<String, String> {
        let local = self.mtime;
        let utc = local.with_timezone(&Utc);
        let mut vars = BTreeMap::new();
        vars.insert("yr".into(), local.format("%Y").to_string());
        vars.insert("mo".into(), local.format("%b").to_string());
        vars.insert("mo_num".into(), local.format("%m").to_string());
        vars.insert("da".into(), local.format("%d").to_string());
        vars.insert("dw".into(), local.format("%A").to_string());
        vars.insert("ti".into(), local.format("%H:%M").to_string());
        vars.insert("date".into(), local.format("%a, %d %b %Y").to_string());
        vars.insert("fulltime".into(), self.fulltime.clone());
        vars.insert("w3cdate".into(), utc.format("%Y-%m-%dT%H:%M:%SZ").to_string());
        vars.insert(
            "rfc822date".into(),
            utc.format("%a, %d %b %Y %H:%M GMT").to_string(),
        );
        vars
    }

    /// Parse the backing file on first access.
    fn parsed(&self) -> Result<&ParsedEntry> {
        match self.parsed.get() {
            Some(parsed) => Ok(parsed),
            None => {
                let ext = self
                    .path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or("");
                let parser = self
                    .site
                    .registry
                    .parser_for(ext)
                    .ok_or_else(|| anyhow!("no entry parser registered for `.{ext}`"))?;
                let parsed = parser(&self.path, &self.site.config)?;
                Ok(self.parsed.get_or_init(|| parsed))
            }
        }
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// The timestamp an entry file carries, via the `filestat` chain. The
/// fallback asks the filesystem for the modification time.
pub fn filestat(site: &Site, path: &Path) -> Result<DateTime<Local>> {
    let mut args = FileStat {
        config: site.config.clone(),
        path: path.to_path_buf(),
    };
    match first_opt(&site.registry.filestat, &mut args) {
        Some(mtime) => Ok(mtime),
        None => {
            let modified = fs::metadata(path)
                .and_then(|meta| meta.modified())
                .with_context(|| format!("stat failed for {}", path.display()))?;
            Ok(modified.into())
        }
    }
}

fn format_fulltime(mtime: DateTime<Local>) -> String {
    mtime.format("%Y%m%d%H%M%S").to_string()
}

// ============================================================================
// Entry File Format
// ============================================================================

/// The built-in `txt` entry parser.
pub fn parse_text_entry(path: &Path, _config: &crate::config::SiteConfig) -> Result<ParsedEntry> {
    parse_entry_file(path)
}

/// Parse an entry file: line 1 is the title, leading `#key value` lines
/// are metadata, the rest is the body.
pub fn parse_entry_file(path: &Path) -> Result<ParsedEntry> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("cannot read entry {}", path.display()))?;
    Ok(parse_entry_text(&content))
}

/// Parse entry text. See [`parse_entry_file`].
pub fn parse_entry_text(content: &str) -> ParsedEntry {
    let mut lines = content.split_inclusive('\n').peekable();

    let title = lines
        .next()
        .map(|line| line.trim_end().to_string())
        .unwrap_or_default();

    let mut meta = BTreeMap::new();
    while let Some(line) = lines.peek() {
        let trimmed = line.trim_end();
        let Some(rest) = trimmed.strip_prefix('#') else {
            break;
        };
        let (key, value) = match rest.split_once(char::is_whitespace) {
            Some((key, value)) => (key, value.trim()),
            None => (rest, ""),
        };
        if key.is_empty() {
            break;
        }
        let value = if value.is_empty() { "1" } else { value };
        meta.insert(key.to_string(), value.to_string());
        lines.next();
    }

    let body: String = lines.collect();
    ParsedEntry { title, meta, body }
}

/// Create a new entry file on disk in the metadata-line format and stamp
/// it with the given mtime. Used by the scaffolding command and tests.
pub fn create_entry(
    datadir: &Path,
    category: &str,
    filename: &str,
    mtime: DateTime<Local>,
    title: &str,
    metadata: &BTreeMap<String, String>,
    body: &str,
) -> Result<PathBuf> {
    let dir = datadir.join(category.trim_matches('/'));
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("cannot create category dir {}", dir.display()))?;
    }
    if !dir.is_dir() {
        bail!("{} exists, but is not a directory", dir.display());
    }

    let mut content = String::new();
    content.push_str(title.trim_end_matches('\n'));
    content.push('\n');
    for (key, value) in metadata {
        content.push_str(&format!("#{key} {value}\n"));
    }
    content.push_str(body);

    let path = dir.join(filename);
    fs::write(&path, content)
        .with_context(|| format!("cannot write entry {}", path.display()))?;
    filetime::set_file_mtime(
        &path,
        filetime::FileTime::from_system_time(mtime.into()),
    )?;
    Ok(path)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{Hook, Registry};
    use crate::config::SiteConfig;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn test_site(datadir: &Path) -> Site {
        let mut config = SiteConfig::default();
        config.paths.datadir = datadir.to_path_buf();
        Site::new(config, Registry::new())
    }

    #[test]
    fn test_parse_entry_text_basic() {
        let parsed = parse_entry_text("First post\nHello world.\n");
        assert_eq!(parsed.title, "First post");
        assert!(parsed.meta.is_empty());
        assert_eq!(parsed.body, "Hello world.\n");
    }

    #[test]
    fn test_parse_entry_text_metadata() {
        let parsed = parse_entry_text("Title\n#tags rust,blog\n#draft\nBody line 1\nBody line 2\n");
        assert_eq!(parsed.title, "Title");
        assert_eq!(parsed.meta["tags"], "rust,blog");
        // a metadata line without a value defaults to "1"
        assert_eq!(parsed.meta["draft"], "1");
        assert_eq!(parsed.body, "Body line 1\nBody line 2\n");
    }

    #[test]
    fn test_parse_entry_text_hash_in_body() {
        // a '#' line after the body has started stays in the body
        let parsed = parse_entry_text("Title\nbody\n#not-meta\n");
        assert!(parsed.meta.is_empty());
        assert_eq!(parsed.body, "body\n#not-meta\n");
    }

    #[test]
    fn test_parse_entry_text_empty() {
        let parsed = parse_entry_text("");
        assert_eq!(parsed.title, "");
        assert_eq!(parsed.body, "");
    }

    #[test]
    fn test_create_parse_round_trip() {
        let dir = tempdir().unwrap();
        let mtime = Local.with_ymd_and_hms(2020, 5, 17, 12, 30, 0).unwrap();
        let mut meta = BTreeMap::new();
        meta.insert("tags".to_string(), "one,two".to_string());
        meta.insert("published".to_string(), "2020-05-17 12:30".to_string());

        let path = create_entry(
            dir.path(),
            "cooking",
            "soup.txt",
            mtime,
            "Soup season",
            &meta,
            "It is soup season.\nReally.\n",
        )
        .unwrap();

        let parsed = parse_entry_file(&path).unwrap();
        assert_eq!(parsed.title, "Soup season");
        assert_eq!(parsed.meta, meta);
        assert_eq!(parsed.body, "It is soup season.\nReally.\n");
    }

    #[test]
    fn test_create_entry_sets_mtime() {
        let dir = tempdir().unwrap();
        let mtime = Local.with_ymd_and_hms(2019, 1, 2, 3, 4, 5).unwrap();
        let path = create_entry(
            dir.path(),
            "",
            "a.txt",
            mtime,
            "A",
            &BTreeMap::new(),
            "body\n",
        )
        .unwrap();

        let site = test_site(dir.path());
        let entry = Entry::load(&site, &path).unwrap();
        assert_eq!(entry.fulltime(), "20190102030405");
    }

    #[test]
    fn test_entry_lazy_parse_and_vars() {
        let dir = tempdir().unwrap();
        let mtime = Local.with_ymd_and_hms(2021, 7, 4, 8, 0, 0).unwrap();
        let path = create_entry(
            dir.path(),
            "cat",
            "b.txt",
            mtime,
            "B",
            &BTreeMap::new(),
            "body b\n",
        )
        .unwrap();

        let site = test_site(dir.path());
        let entry = Entry::load(&site, &path).unwrap();
        assert_eq!(entry.title().unwrap(), "B");

        let vars = entry.vars().unwrap();
        assert_eq!(vars["title"], "B");
        assert_eq!(vars["basename"], "b");
        assert_eq!(vars["absolute_path"], "cat");
        assert_eq!(vars["file_path"], "cat/b");
        assert_eq!(vars["yr"], "2021");
        assert_eq!(vars["mo_num"], "07");
        assert_eq!(vars["da"], "04");
    }

    #[test]
    fn test_entry_var_overrides_win() {
        let dir = tempdir().unwrap();
        let mtime = Local.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let path = create_entry(
            dir.path(),
            "",
            "a.txt",
            mtime,
            "Original",
            &BTreeMap::new(),
            "",
        )
        .unwrap();

        let site = test_site(dir.path());
        let mut entry = Entry::load(&site, &path).unwrap();
        entry.set_var("title", "Overridden");
        assert_eq!(entry.vars().unwrap()["title"], "Overridden");
    }

    #[test]
    fn test_synthetic_entry() {
        let dir = tempdir().unwrap();
        let site = test_site(dir.path());
        let mtime = Local.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap();
        let entry = Entry::synthetic(&site, "2020-03::summary", "2020-03", "<p>March</p>", mtime);

        assert_eq!(entry.id(), "2020-03::summary");
        assert_eq!(entry.title().unwrap(), "2020-03");
        assert_eq!(entry.body().unwrap(), "<p>March</p>");
        let vars = entry.vars().unwrap();
        // synthetic entries carry no path variables
        assert!(!vars.contains_key("filename"));
        assert_eq!(vars["yr"], "2020");
    }

    #[test]
    fn test_filestat_chain_override() {
        let dir = tempdir().unwrap();
        let path = create_entry(
            dir.path(),
            "",
            "a.txt",
            Local::now(),
            "A",
            &BTreeMap::new(),
            "",
        )
        .unwrap();

        let mut config = SiteConfig::default();
        config.paths.datadir = dir.path().to_path_buf();
        let mut registry = Registry::new();
        let fixed = Local.with_ymd_and_hms(1999, 12, 31, 23, 59, 0).unwrap();
        registry
            .filestat
            .push(Hook::new("test", move |_args: &mut FileStat| Some(fixed)));
        let site = Site::new(config, registry);

        let entry = Entry::load(&site, &path).unwrap();
        assert_eq!(entry.fulltime(), "19991231235900");
    }

    #[test]
    fn test_unknown_extension_fails_on_access() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.weird");
        fs::write(&path, "Title\nbody\n").unwrap();

        let site = test_site(dir.path());
        let entry = Entry::load(&site, &path).unwrap();
        // loading succeeded; parsing is what fails
        assert!(entry.title().is_err());
    }
}

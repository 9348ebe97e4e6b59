//! Per-request state: the request context and the response buffer.
//!
//! A [`Request`] is the mutable bag the whole pipeline works on. It
//! carries three things, mirroring their different lifecycles:
//!
//! - configuration: static, user-set, shared (`Site`)
//! - environment: HTTP/CGI-derived values for this request (`HttpEnv`)
//! - runtime data: everything computed during processing (`RunData`)
//!
//! A request lives for exactly one pass through the pipeline. In compile
//! mode the driver creates one synthetic request per output url.

use crate::callback::Registry;
use crate::config::SiteConfig;
use crate::entry::Entry;
use crate::router::PathInfo;
use anyhow::{Result, bail};
use std::{collections::BTreeMap, path::Path, sync::Arc};

/// Engine version baked into responses and the crash page.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Site
// ============================================================================

/// Process-wide immutable state shared by every request: the validated
/// configuration and the populated callback registry.
#[derive(Clone)]
pub struct Site {
    pub config: Arc<SiteConfig>,
    pub registry: Arc<Registry>,
}

impl Site {
    pub fn new(config: SiteConfig, registry: Registry) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
        }
    }
}

// ============================================================================
// Request
// ============================================================================

/// HTTP/CGI environment for one request (`PATH_INFO`, `QUERY_STRING`,
/// `REQUEST_METHOD`, `HTTP_HOST`, ...).
pub type HttpEnv = BTreeMap<String, String>;

/// Runtime data computed and transformed during one request.
#[derive(Default)]
pub struct RunData {
    /// Routed path classification; set by the pathinfo chain.
    pub route: PathInfo,
    /// Resolved entry list; set by the filelist chain.
    pub entries: Vec<Entry>,
    /// Template variables. Plugins add or override freely; the renderer
    /// folds these over the config variables.
    pub vars: BTreeMap<String, String>,
    /// View marker a plugin may set when it takes over resolution.
    pub view: String,
    /// True when this request is part of a static compilation run.
    pub compiling: bool,
}

/// The per-request context handed to every callback hook.
pub struct Request {
    pub site: Site,
    pub http: HttpEnv,
    pub data: RunData,
}

impl Request {
    pub fn new(site: Site, http: HttpEnv) -> Self {
        let mut data = RunData::default();
        data.vars
            .insert("generator".into(), format!("bramble {VERSION}"));
        Self { site, http, data }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.site.config
    }

    /// The url path for this request, e.g. `/dev/firstpost.html`.
    pub fn path_info(&self) -> &str {
        self.http.get("PATH_INFO").map(String::as_str).unwrap_or("")
    }

    pub fn query_string(&self) -> &str {
        self.http
            .get("QUERY_STRING")
            .map(String::as_str)
            .unwrap_or("")
    }

    /// A single decoded query parameter, if present.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query_string().split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key == name).then(|| {
                urlencoding::decode(value)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| value.to_string())
            })
        })
    }

    /// The theme requested for this request.
    ///
    /// A `theme=` query parameter wins, then the path extension, then
    /// the configured default.
    pub fn theme(&self) -> String {
        if let Some(theme) = self.query_param("theme")
            && !theme.is_empty()
        {
            return theme;
        }
        if let Some(ext) = Path::new(self.path_info()).extension().and_then(|e| e.to_str())
            && !ext.is_empty()
        {
            return ext.to_string();
        }
        self.config().entries.default_theme.clone()
    }
}

// ============================================================================
// Response
// ============================================================================

/// HTTP-style response buffer: status, ordered headers, body bytes.
#[derive(Debug)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Add a header line. A `Status` header sets the status code instead
    /// of landing in the header list.
    pub fn add_header(&mut self, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() || key.contains(' ') || key.contains(':') {
            bail!("invalid header key: `{key}`");
        }
        let value = value.trim();
        if key.eq_ignore_ascii_case("status") {
            let code = value
                .split_whitespace()
                .next()
                .and_then(|s| s.parse().ok());
            match code {
                Some(code) => self.status = code,
                None => bail!("invalid status value: `{value}`"),
            }
        } else {
            self.headers.push((key.to_string(), value.to_string()));
        }
        Ok(())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn write(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

// ============================================================================
// Tests
// ============================================================================

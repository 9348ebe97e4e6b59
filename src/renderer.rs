//! Renderers: turn a resolved entry list into response output.
//!
//! The driver talks to renderers through the [`Render`] trait only:
//! it hands over content (an entry list or a single error payload),
//! may add headers, asks for `render`, and checks the `rendered` flag
//! to avoid rendering twice. Plugins supply their own renderer through
//! the `renderer` chain.
//!
//! The default [`ThemeRenderer`] resolves the requested theme by
//! directory overlay and expands its templates by `{name}` placeholder
//! replacement. Anything fancier than placeholder replacement belongs
//! to a different renderer.

use crate::entry::Entry;
use crate::request::{Request, Response};
use crate::theme::{Theme, fallback_error_theme};
use anyhow::Result;
use std::collections::BTreeMap;

// ============================================================================
// Render Contract
// ============================================================================

/// What a renderer is asked to display.
pub enum Content {
    /// An ordered entry list.
    Entries(Vec<Entry>),
    /// A single error payload (404 and friends).
    Payload { title: String, body: String },
}

/// The renderer seam between the driver and output generation.
pub trait Render {
    /// Add a response header. A `Status` header sets the status code.
    fn add_header(&mut self, key: &str, value: &str) -> Result<()>;

    /// Set the content to display.
    fn set_content(&mut self, content: Content);

    /// True once output has been produced; the driver skips rendering.
    fn rendered(&self) -> bool;

    /// Produce the output.
    fn render(&mut self, req: &mut Request) -> Result<()>;

    /// Tear down into the finished response.
    fn into_response(self: Box<Self>) -> Response;
}

/// The default renderer choice: the theme renderer, or the debug
/// renderer when the request carries `debug=1`.
pub fn default_renderer(req: &mut Request) -> Box<dyn Render> {
    if req.query_param("debug").is_some() {
        Box::new(DebugRenderer::new())
    } else {
        Box::new(ThemeRenderer::new())
    }
}

// ============================================================================
// Template Substitution
// ============================================================================

/// Expand `{name}` placeholders from the variable map. Placeholders
/// with no matching variable are left alone.
pub fn substitute(vars: &BTreeMap<String, String>, template: &str) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

/// The base variable map for a request: config variables, then routed
/// data, then whatever plugins put in `data.vars` (which wins).
pub fn parse_vars(req: &Request) -> BTreeMap<String, String> {
    let blog = &req.config().blog;
    let mut vars = BTreeMap::new();
    vars.insert("blog_title".into(), blog.title.clone());
    vars.insert("blog_description".into(), blog.description.clone());
    vars.insert("blog_author".into(), blog.author.clone());
    vars.insert("blog_email".into(), blog.email.clone());
    vars.insert("blog_rights".into(), blog.rights.clone());
    vars.insert("blog_language".into(), blog.language.clone());
    vars.insert("base_url".into(), blog.base_url.clone());
    vars.insert(
        "escaped_blog_title".into(),
        html_escape::encode_text(&blog.title).into_owned(),
    );
    vars.insert(
        "escaped_blog_description".into(),
        html_escape::encode_text(&blog.description).into_owned(),
    );

    vars.insert("path_info".into(), req.data.route.path_info.clone());
    vars.insert("url".into(), req.data.route.url.clone());
    vars.insert("theme".into(), req.data.route.theme.clone());

    for (key, value) in &req.data.vars {
        vars.insert(key.clone(), value.clone());
    }
    vars
}

// ============================================================================
// Theme Renderer
// ============================================================================

/// The default, theme-driven renderer.
pub struct ThemeRenderer {
    response: Response,
    content: Option<Content>,
    rendered: bool,
}

impl ThemeRenderer {
    pub fn new() -> Self {
        Self {
            response: Response::new(),
            content: None,
            rendered: false,
        }
    }

    /// Resolve the theme for this request, escalating to the error
    /// theme (and finally the embedded one) when the taste is missing.
    fn resolve_theme(&mut self, req: &Request) -> Theme {
        let taste = req.data.route.theme.clone();
        let path_info = req.data.route.path_info.clone();

        match Theme::load(req.config(), &path_info, &taste) {
            Some(theme) => theme,
            None => {
                let mut message = format!("Theme '{taste}' does not exist.");
                let theme = match Theme::load(req.config(), &path_info, "error") {
                    Some(theme) => theme,
                    None => {
                        message.push_str("  And your error theme doesn't exist, either.");
                        fallback_error_theme()
                    }
                };
                self.response.set_status(404);
                self.content = Some(Content::Payload {
                    title: "HTTP 404: theme error".to_string(),
                    body: message,
                });
                theme
            }
        }
    }

    fn render_story(
        &mut self,
        theme: &Theme,
        base_vars: &BTreeMap<String, String>,
        entry_vars: BTreeMap<String, String>,
    ) {
        let mut vars = base_vars.clone();
        vars.extend(entry_vars);

        // a `template_name` variable redirects this entry to a custom
        // story template when the theme carries one
        let template = vars
            .get("template_name")
            .and_then(|name| theme.get(name))
            .or_else(|| theme.get("story"))
            .unwrap_or_default();
        let output = substitute(&vars, template);
        self.response.write(output.as_bytes());
    }

    fn render_entries(
        &mut self,
        theme: &Theme,
        base_vars: &BTreeMap<String, String>,
        entries: Vec<Entry>,
    ) -> Result<()> {
        let mut current_date = String::new();

        for entry in &entries {
            let mut entry_vars = entry.vars()?;
            let escaped_title = entry_vars
                .get("title")
                .map(|title| html_escape::encode_text(title).into_owned());
            if let Some(escaped) = escaped_title {
                entry_vars.insert("escaped_title".into(), escaped);
            }
            let escaped_body = entry_vars
                .get("body")
                .map(|body| html_escape::encode_text(body).into_owned());
            if let Some(escaped) = escaped_body {
                entry_vars.insert("escaped_body".into(), escaped);
            }

            // date_head/date_foot bracket runs of same-day entries
            let date = entry_vars.get("date").cloned().unwrap_or_default();
            if date != current_date {
                if !current_date.is_empty()
                    && let Some(template) = theme.get("date_foot")
                {
                    let mut vars = base_vars.clone();
                    vars.insert("date".into(), current_date.clone());
                    let output = substitute(&vars, template);
                    self.response.write(output.as_bytes());
                }
                if let Some(template) = theme.get("date_head") {
                    let mut vars = base_vars.clone();
                    vars.insert("date".into(), date.clone());
                    for key in ["yr", "mo", "da"] {
                        if let Some(value) = entry_vars.get(key) {
                            vars.insert(key.into(), value.clone());
                        }
                    }
                    let output = substitute(&vars, template);
                    self.response.write(output.as_bytes());
                }
                current_date = date;
            }

            self.render_story(theme, base_vars, entry_vars);
        }

        if !current_date.is_empty()
            && let Some(template) = theme.get("date_foot")
        {
            let mut vars = base_vars.clone();
            vars.insert("date".into(), current_date);
            let output = substitute(&vars, template);
            self.response.write(output.as_bytes());
        }
        Ok(())
    }
}

impl Default for ThemeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Render for ThemeRenderer {
    fn add_header(&mut self, key: &str, value: &str) -> Result<()> {
        self.response.add_header(key, value)
    }

    fn set_content(&mut self, content: Content) {
        self.content = Some(content);
    }

    fn rendered(&self) -> bool {
        self.rendered
    }

    fn render(&mut self, req: &mut Request) -> Result<()> {
        if self.rendered {
            return Ok(());
        }

        let theme = self.resolve_theme(req);

        if let Some(content_type) = theme.get("content_type") {
            let content_type = content_type.trim().to_string();
            if !content_type.is_empty() {
                self.response.add_header("Content-Type", &content_type)?;
            }
        }

        let base_vars = parse_vars(req);

        if let Some(template) = theme.get("head") {
            let output = substitute(&base_vars, template);
            self.response.write(output.as_bytes());
        }

        match self.content.take() {
            Some(Content::Entries(entries)) => {
                self.render_entries(&theme, &base_vars, entries)?;
            }
            Some(Content::Payload { title, body }) => {
                let mut vars = BTreeMap::new();
                vars.insert("title".to_string(), title.clone());
                vars.insert("body".to_string(), body.clone());
                vars.insert(
                    "escaped_title".to_string(),
                    html_escape::encode_text(&title).into_owned(),
                );
                vars.insert(
                    "escaped_body".to_string(),
                    html_escape::encode_text(&body).into_owned(),
                );
                self.render_story(&theme, &base_vars, vars);
            }
            None => {}
        }

        if let Some(template) = theme.get("foot") {
            let output = substitute(&base_vars, template);
            self.response.write(output.as_bytes());
        }

        self.rendered = true;
        Ok(())
    }

    fn into_response(self: Box<Self>) -> Response {
        self.response
    }
}

// ============================================================================
// Debug Renderer
// ============================================================================

/// Dumps the request state as plain text instead of rendering themes.
/// Selected with a `debug=1` query parameter.
pub struct DebugRenderer {
    response: Response,
    content: Option<Content>,
    rendered: bool,
}

impl DebugRenderer {
    pub fn new() -> Self {
        Self {
            response: Response::new(),
            content: None,
            rendered: false,
        }
    }
}

impl Default for DebugRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Render for DebugRenderer {
    fn add_header(&mut self, key: &str, value: &str) -> Result<()> {
        self.response.add_header(key, value)
    }

    fn set_content(&mut self, content: Content) {
        self.content = Some(content);
    }

    fn rendered(&self) -> bool {
        self.rendered
    }

    fn render(&mut self, req: &mut Request) -> Result<()> {
        if self.rendered {
            return Ok(());
        }
        self.response.add_header("Content-Type", "text/plain; charset=utf-8")?;

        let mut out = String::new();
        out.push_str("Welcome to debug mode!\n\n");
        out.push_str(&format!("Route: {:?}\n\n", req.data.route));

        out.push_str("-- http environment --\n");
        for (key, value) in &req.http {
            out.push_str(&format!("{key}: {value}\n"));
        }

        out.push_str("\n-- data vars --\n");
        for (key, value) in &req.data.vars {
            out.push_str(&format!("{key}: {value}\n"));
        }

        out.push_str("\n-- content --\n");
        match self.content.take() {
            Some(Content::Entries(entries)) => {
                for entry in &entries {
                    out.push_str(&format!("{}\n", entry.id()));
                }
            }
            Some(Content::Payload { title, .. }) => {
                out.push_str(&format!("payload: {title}\n"));
            }
            None => out.push_str("(none)\n"),
        }

        self.response.write(out.as_bytes());
        self.rendered = true;
        Ok(())
    }

    fn into_response(self: Box<Self>) -> Response {
        self.response
    }
}

// ============================================================================
// Tests
// ============================================================================

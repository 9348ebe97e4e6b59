//! Markdown entry parser.
//!
//! Registers a parser for `.md` entries: the usual title/metadata
//! header, with the body rendered to html through pulldown-cmark.

use crate::callback::{Plugin, Registry};
use crate::config::SiteConfig;
use crate::entry::{ParsedEntry, parse_entry_file};
use anyhow::Result;
use std::path::Path;

pub struct Markdown;

impl Plugin for Markdown {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn register(&self, registry: &mut Registry) {
        registry.register_parser("md", Box::new(parse_markdown_entry));
    }
}

fn parse_markdown_entry(path: &Path, _config: &SiteConfig) -> Result<ParsedEntry> {
    let mut parsed = parse_entry_file(path)?;
    parsed.body = render_markdown(&parsed.body);
    Ok(parsed)
}

fn render_markdown(source: &str) -> String {
    let parser = pulldown_cmark::Parser::new(source);
    let mut html = String::with_capacity(source.len() * 2);
    pulldown_cmark::html::push_html(&mut html, parser);
    html
}

// ============================================================================
// Tests
// ============================================================================

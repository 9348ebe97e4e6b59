//! The request driver: one pass through the pipeline per request.
//!
//! ```text
//! start chain
//!   -> handle chain (a Some(Response) short-circuits everything)
//!   -> renderer chain   (default: theme renderer)
//!   -> pathinfo chain   (default: path router)
//!   -> filelist chain   (default: entry resolver)
//!   -> prepare chain    (arbitrary context mutation)
//!   -> render
//! end chain
//! ```
//!
//! Errors bubble to the caller; the serving boundary turns them into
//! the crash page. Nothing here retries or partially recovers.

use crate::callback::{first_of, first_opt, notify};
use crate::renderer::{Content, default_renderer};
use crate::request::{Request, Response, Site};
use crate::resolver::default_filelist;
use crate::router::resolve_path;
use anyhow::Result;
use chrono::{Local, Utc};

/// Run one request through the pipeline and produce its response.
pub fn run(site: &Site, req: &mut Request) -> Result<Response> {
    notify(&site.registry.start, req);

    let response = match first_opt(&site.registry.handle, req) {
        Some(response) => response,
        None => default_handler(site, req)?,
    };

    notify(&site.registry.end, req);
    Ok(response)
}

/// The default handler: route, resolve, prepare, render.
fn default_handler(site: &Site, req: &mut Request) -> Result<Response> {
    let mut renderer = first_of(&site.registry.renderer, req, default_renderer);

    req.data.route = first_of(&site.registry.pathinfo, req, |req| {
        let theme = req.theme();
        resolve_path(
            req.site.config.as_ref(),
            &req.site.registry.extensions(),
            req.path_info(),
            &theme,
        )
    });

    req.data.entries = first_of(&site.registry.filelist, req, default_filelist);

    set_latest_date_vars(req);
    notify(&site.registry.prepare, req);

    if !renderer.rendered() {
        let entries = std::mem::take(&mut req.data.entries);
        if entries.is_empty() {
            let config = req.config();
            renderer.add_header("Status", "404 Not Found")?;
            renderer.set_content(Content::Payload {
                title: "The page you are looking for is not available".to_string(),
                body: format!(
                    "Somehow I cannot find the page you want. \
                     Go back to <a href=\"{}\">{}</a>?",
                    config.blog.base_url, config.blog.title
                ),
            });
        } else {
            renderer.set_content(Content::Entries(entries));
        }
        renderer.render(req)?;
    }

    Ok(renderer.into_response())
}

/// Blog-level date variables: the mtime of the newest resolved entry
/// (or now, for empty listings), formatted for html and feed themes.
fn set_latest_date_vars(req: &mut Request) {
    let latest = req
        .data
        .entries
        .first()
        .map(|entry| entry.mtime())
        .unwrap_or_else(Local::now);
    let utc = latest.with_timezone(&Utc);

    let vars = &mut req.data.vars;
    vars.insert("latest_date".into(), latest.format("%a, %d %b %Y").to_string());
    vars.insert(
        "latest_w3cdate".into(),
        utc.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    );
    vars.insert(
        "latest_rfc822date".into(),
        utc.format("%a, %d %b %Y %H:%M GMT").to_string(),
    );
}

/// Run a request for a url path and query string against a site. This
/// is the seam shared by dynamic serving, static compilation, and the
/// render-url command.
pub fn run_url(site: &Site, path: &str, query: &str, compiling: bool) -> Result<Response> {
    let mut req = Request::new(site.clone(), synthetic_env(site, path, query));
    req.data.compiling = compiling;
    run(site, &mut req)
}

/// A minimal CGI-style environment for internally generated requests.
fn synthetic_env(site: &Site, path: &str, query: &str) -> crate::request::HttpEnv {
    let base_url = &site.config.blog.base_url;
    let host = base_url
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .split('/')
        .next()
        .unwrap_or("")
        .to_string();

    let mut env = crate::request::HttpEnv::new();
    env.insert("HTTP_HOST".into(), host);
    env.insert("HTTP_USER_AGENT".into(), "static renderer".into());
    env.insert("PATH_INFO".into(), path.to_string());
    env.insert("QUERY_STRING".into(), query.to_string());
    env.insert("REQUEST_METHOD".into(), "GET".into());
    env
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{Hook, Registry};
    use crate::config::SiteConfig;
    use crate::entry::create_entry;
    use crate::request::HttpEnv;
    use chrono::TimeZone;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn scaffold(registry: Registry) -> (TempDir, Site) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("entries")).unwrap();
        std::fs::create_dir(dir.path().join("themes")).unwrap();

        let mut config = SiteConfig::default();
        config.blog.title = "My blog".into();
        config.blog.base_url = "http://www.example.com".into();
        config.resolve_paths(dir.path());
        (dir, Site::new(config, registry))
    }

    fn write_entry(site: &Site, category: &str, name: &str, title: &str, ymd: (i32, u32, u32)) {
        let mtime = Local
            .with_ymd_and_hms(ymd.0, ymd.1, ymd.2, 9, 30, 0)
            .unwrap();
        create_entry(
            &site.config.paths.datadir,
            category,
            name,
            mtime,
            title,
            &BTreeMap::new(),
            "some body\n",
        )
        .unwrap();
    }

    fn request_for(site: &Site, path: &str) -> Request {
        let mut http = HttpEnv::new();
        http.insert("PATH_INFO".into(), path.into());
        Request::new(site.clone(), http)
    }

    #[test]
    fn test_front_page_renders_entries() {
        let (_dir, site) = scaffold(Registry::new());
        write_entry(&site, "", "a.txt", "Post A", (2021, 4, 1));
        write_entry(&site, "cat", "b.txt", "Post B", (2021, 4, 2));

        let mut req = request_for(&site, "/");
        let response = run(&site, &mut req).unwrap();

        assert_eq!(response.status(), 200);
        let body = String::from_utf8_lossy(response.body());
        assert!(body.contains("Post A"));
        assert!(body.contains("Post B"));
    }

    #[test]
    fn test_single_entry_page() {
        let (_dir, site) = scaffold(Registry::new());
        write_entry(&site, "cat", "b.txt", "Post B", (2021, 4, 2));

        let mut req = request_for(&site, "/cat/b.html");
        let response = run(&site, &mut req).unwrap();

        assert_eq!(response.status(), 200);
        let body = String::from_utf8_lossy(response.body());
        assert!(body.contains("Post B"));
    }

    #[test]
    fn test_unknown_path_renders_404_payload() {
        let (_dir, site) = scaffold(Registry::new());
        let mut req = request_for(&site, "/no/such/page");
        let response = run(&site, &mut req).unwrap();

        assert_eq!(response.status(), 404);
        let body = String::from_utf8_lossy(response.body());
        assert!(body.contains("not available"));
        assert!(body.contains("http://www.example.com"));
    }

    #[test]
    fn test_handle_hook_short_circuits() {
        let mut registry = Registry::new();
        registry.handle.push(Hook::new("test", |_req: &mut Request| {
            let mut response = Response::new();
            response.write(b"handled elsewhere");
            Some(response)
        }));
        let (_dir, site) = scaffold(registry);
        write_entry(&site, "", "a.txt", "Post A", (2021, 4, 1));

        let mut req = request_for(&site, "/");
        let response = run(&site, &mut req).unwrap();
        assert_eq!(response.body(), b"handled elsewhere");
    }

    #[test]
    fn test_filelist_hook_replaces_resolution() {
        let mut registry = Registry::new();
        registry
            .filelist
            .push(Hook::new("test", |req: &mut Request| {
                let mtime = Local.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
                Some(vec![crate::entry::Entry::synthetic(
                    &req.site,
                    "synthetic::1",
                    "Synthetic entry",
                    "made up",
                    mtime,
                )])
            }));
        let (_dir, site) = scaffold(registry);
        // a real entry exists but the hook wins
        write_entry(&site, "", "a.txt", "Real entry", (2021, 4, 1));

        let mut req = request_for(&site, "/");
        let response = run(&site, &mut req).unwrap();
        let body = String::from_utf8_lossy(response.body());
        assert!(body.contains("Synthetic entry"));
        assert!(!body.contains("Real entry"));
    }

    #[test]
    fn test_prepare_hook_vars_reach_templates() {
        let mut registry = Registry::new();
        registry
            .prepare
            .push(Hook::new("test", |req: &mut Request| {
                req.data
                    .vars
                    .insert("blog_rights".into(), "All mine".into());
                None
            }));
        let (_dir, site) = scaffold(registry);
        write_entry(&site, "", "a.txt", "Post A", (2021, 4, 1));

        let mut req = request_for(&site, "/");
        let response = run(&site, &mut req).unwrap();
        let body = String::from_utf8_lossy(response.body());
        // the built-in foot template prints {blog_rights}
        assert!(body.contains("All mine"));
    }

    #[test]
    fn test_latest_date_vars_present() {
        let (_dir, site) = scaffold(Registry::new());
        write_entry(&site, "", "a.txt", "Post A", (2021, 4, 1));

        let mut req = request_for(&site, "/");
        run(&site, &mut req).unwrap();

        assert!(req.data.vars.contains_key("latest_date"));
        assert!(req.data.vars["latest_w3cdate"].ends_with('Z'));
        assert!(req.data.vars["latest_rfc822date"].ends_with("GMT"));
    }

    #[test]
    fn test_run_url_seam() {
        let (_dir, site) = scaffold(Registry::new());
        write_entry(&site, "", "a.txt", "Post A", (2021, 4, 1));

        let response = run_url(&site, "/index.html", "", true).unwrap();
        assert_eq!(response.status(), 200);
        assert!(String::from_utf8_lossy(response.body()).contains("Post A"));
    }
}

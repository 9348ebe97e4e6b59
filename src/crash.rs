//! The crash handler: a fixed HTTP 500 diagnostic page.
//!
//! Errors that escape the pipeline are caught at the request boundary
//! only (the serve loop and the render-url command) and converted into
//! a page showing the engine version, the full error chain, and an
//! escaped dump of the request environment. No retry, no partial
//! recovery.
//!
//! This is a leaf module: it must not depend on config, themes, or the
//! registry, so it still works when those are what broke.

use crate::request::{HttpEnv, Response, VERSION};

/// Build the HTTP 500 response for an error that escaped the pipeline.
pub fn response_for_error(err: &anyhow::Error, env: &HttpEnv) -> Response {
    let mut chain = String::new();
    for (depth, cause) in err.chain().enumerate() {
        let cause = cause.to_string();
        let cause = html_escape::encode_text(&cause);
        chain.push_str(&format!("{}{cause}\n", "  ".repeat(depth)));
    }

    let mut environ = String::new();
    for (key, value) in env {
        environ.push_str(&format!(
            "{}: {}\n",
            html_escape::encode_text(key),
            html_escape::encode_text(value)
        ));
    }

    let body = format!(
        r#"<html>
<head><title>HTTP 500: Oops!</title></head>
<body>
<h1>HTTP 500: GAH!</h1>
<p>A problem has occurred while bramble was rendering this page.</p>
<p>If this is your blog and you've just upgraded bramble, check the
documentation for changes you need to make to your bramble.toml,
plugins, and theme files.</p>
<p>Here is some useful information to track down the root cause of the
problem:</p>
<div style="border: 1px solid black; padding: 10px;">
<p>bramble version: {version}</p>
<p>Error:</p>
<pre>
{chain}</pre>
<p>HTTP environment:</p>
<pre>
{environ}</pre>
</div>
</body>
</html>
"#,
        version = html_escape::encode_text(VERSION),
    );

    let mut response = Response::new();
    response.set_status(500);
    // a hand-built header list: Response::add_header validates keys,
    // and these are known-good
    let _ = response.add_header("Content-Type", "text/html; charset=utf-8");
    response.write(body.as_bytes());
    response
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn failing() -> anyhow::Result<()> {
        Err(anyhow::anyhow!("inner kaboom"))
    }

    #[test]
    fn test_crash_page_contains_error_chain_and_version() {
        let err = failing().context("while rendering /broken").unwrap_err();
        let response = response_for_error(&err, &HttpEnv::new());

        assert_eq!(response.status(), 500);
        let body = String::from_utf8_lossy(response.body());
        assert!(body.contains("while rendering /broken"));
        assert!(body.contains("inner kaboom"));
        assert!(body.contains(VERSION));
    }

    #[test]
    fn test_crash_page_escapes_environment() {
        let mut env = HttpEnv::new();
        env.insert("PATH_INFO".into(), "/<script>alert(1)</script>".into());

        let err = anyhow::anyhow!("boom");
        let response = response_for_error(&err, &env);

        let body = String::from_utf8_lossy(response.body());
        assert!(body.contains("&lt;script&gt;"));
        assert!(!body.contains("<script>alert"));
    }
}

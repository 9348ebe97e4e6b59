//! Dynamic serving: run the request pipeline behind an HTTP server.
//!
//! This is a lightweight `tiny_http` loop, single-threaded and
//! synchronous: each request is translated into a CGI-style environment
//! map, pushed through the driver, and written back, one at a time.
//! Errors from the driver become the crash page; they never kill the
//! loop.
//!
//! - Automatic port retry when the configured port is taken
//! - Graceful shutdown on Ctrl+C

use crate::app;
use crate::crash;
use crate::log;
use crate::request::{HttpEnv, Request, Response, Site};
use anyhow::{Context, Result, anyhow};
use std::{io::Cursor, net::SocketAddr, sync::Arc};
use tiny_http::{Header, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Start the blog server.
///
/// This function:
/// 1. Binds to the configured interface and port (with auto-retry on
///    port conflict)
/// 2. Sets up Ctrl+C handler for graceful shutdown
/// 3. Enters the main request handling loop
///
/// The server blocks until Ctrl+C is received.
pub fn serve_site(site: &Site) -> Result<()> {
    let interface: std::net::IpAddr = site.config.serve.interface.parse()?;
    let base_port = site.config.serve.port;

    let (server, addr) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{addr}");

    for request in server.incoming_requests() {
        if let Err(err) = handle_request(site, request) {
            log!("serve"; "request error: {err:#}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: std::net::IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < max_retries => {
                continue;
            }
            Err(e) => {
                return Err(anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    max_retries,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle one HTTP request: build the environment, run the pipeline,
/// write the result. Pipeline errors render as the crash page.
fn handle_request(site: &Site, http_request: tiny_http::Request) -> Result<()> {
    let env = build_env(&http_request);

    let mut req = Request::new(site.clone(), env.clone());
    let response = match app::run(site, &mut req) {
        Ok(response) => response,
        Err(err) => {
            log!("error"; "{}: {err:#}", env.get("PATH_INFO").map(String::as_str).unwrap_or(""));
            crash::response_for_error(&err, &env)
        }
    };

    respond(http_request, response)
}

/// Translate an HTTP request into the CGI-style environment map the
/// pipeline works with.
fn build_env(request: &tiny_http::Request) -> HttpEnv {
    let (path, query) = split_url(request.url());

    let mut env = HttpEnv::new();
    env.insert("PATH_INFO".into(), path);
    env.insert("QUERY_STRING".into(), query);
    env.insert("REQUEST_METHOD".into(), request.method().to_string());
    env.insert("REQUEST_URI".into(), request.url().to_string());

    if let Some(addr) = request.remote_addr() {
        env.insert("REMOTE_ADDR".into(), addr.to_string());
    }
    for header in request.headers() {
        if header.field.equiv("host") {
            env.insert("HTTP_HOST".into(), header.value.to_string());
        } else if header.field.equiv("user-agent") {
            env.insert("HTTP_USER_AGENT".into(), header.value.to_string());
        }
    }
    env
}

/// Split a request url into its decoded path and raw query string.
fn split_url(url: &str) -> (String, String) {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let path = urlencoding::decode(path)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| path.to_string());
    (path, query.to_string())
}

/// Write the pipeline's response back through tiny_http.
fn respond(request: tiny_http::Request, response: Response) -> Result<()> {
    let headers: Vec<Header> = response
        .headers()
        .iter()
        .filter_map(|(key, value)| Header::from_bytes(key.as_bytes(), value.as_bytes()).ok())
        .collect();

    let body_len = response.body().len();
    let http_response = tiny_http::Response::new(
        StatusCode(response.status()),
        headers,
        Cursor::new(response.body().to_vec()),
        Some(body_len),
        None,
    );
    request.respond(http_response)?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

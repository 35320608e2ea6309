//! Embedded web dashboard for statdash.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page dashboard that draws every section with Plotly
//! - JSON endpoints for sections, the raw-data toggle, config and health
//!
//! Launched via `statdash serve` (default: `http://127.0.0.1:9747`).

mod api;
mod frontend;

use std::io::Cursor;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::api::{Fetcher, StatsClient};
use crate::config::StatdashConfig;
use crate::raw::RawDataToggle;

type HttpResponse = Response<Cursor<Vec<u8>>>;

/// Everything a request handler can see. The raw toggle is the only
/// mutable piece.
pub struct AppState<F> {
    pub config: StatdashConfig,
    pub fetcher: F,
    raw: Mutex<RawDataToggle>,
}

impl<F: Fetcher> AppState<F> {
    pub fn new(config: StatdashConfig, fetcher: F) -> Self {
        Self {
            config,
            fetcher,
            raw: Mutex::new(RawDataToggle::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard server on `addr`.
///
/// Blocks the current thread. Handles requests sequentially (sufficient for
/// a local single-user dashboard). A failing handler produces a JSON 500
/// for that request only.
pub fn serve(config: StatdashConfig, addr: &str) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    let client = StatsClient::from_config(&config);
    println!("statdash dashboard running at http://{addr}");
    println!("Reading from {}", client.base_url());
    println!("Press Ctrl+C to stop.\n");

    if config.server.open_browser {
        let _ = open_browser(&format!("http://{addr}"));
    }

    let state = AppState::new(config, client);

    for request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let response = match dispatch(&state, &method, &url) {
            Ok(resp) => resp,
            Err(e) => {
                let body = serde_json::json!({ "error": format!("{e:#}") }).to_string();
                Response::from_data(body.into_bytes())
                    .with_header(content_type_json())
                    .with_status_code(StatusCode(500))
            }
        };
        let status = response.status_code().0;
        let _ = request.respond(response);

        // Brief access log
        println!(
            "{} {} {} {}",
            chrono::Local::now().format("%H:%M:%S"),
            method,
            url,
            status
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
fn dispatch<F: Fetcher>(state: &AppState<F>, method: &Method, url: &str) -> Result<HttpResponse> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend()),

        // Sections
        (&Method::Get, "/api/sections") => api::get_sections(state),
        (&Method::Get, p) if p.starts_with("/api/section/") => {
            api::get_section(state, &p["/api/section/".len()..])
        }

        // Raw data
        (&Method::Post, "/api/raw/toggle") => api::post_raw_toggle(state),

        // Config / health
        (&Method::Get, "/api/config") => api::get_config(state),
        (&Method::Get, "/api/health") => api::get_health(state),

        // 404
        _ => Ok(not_found()),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Serve the embedded single-page frontend.
fn serve_frontend() -> HttpResponse {
    Response::from_data(frontend::index_html().into_bytes())
        .with_header(content_type_html())
        .with_status_code(StatusCode(200))
}

/// 404 response.
fn not_found() -> HttpResponse {
    let body = r#"{"error": "not found"}"#;
    Response::from_data(body.as_bytes().to_vec())
        .with_header(content_type_json())
        .with_status_code(StatusCode(404))
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8")
        .expect("static header is valid")
}

/// HTML content type header.
fn content_type_html() -> Header {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8").expect("static header is valid")
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

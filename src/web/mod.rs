//! Embedded web dashboard for ragboard.
//!
//! A lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - the single-page dashboard
//! - a JSON API over the [`Dashboard`](crate::dashboard::Dashboard) state machine
//!
//! Launched via `ragboard web` (default: `http://127.0.0.1:9747`).

mod api;
mod frontend;

use std::io::Cursor;
use std::time::Duration;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::api::Backend;
use crate::runtime::Runtime;

/// How long the server waits for an HTTP request before applying backend
/// completions that arrived meanwhile.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard server on the given address.
///
/// Blocks the current thread. HTTP requests are handled sequentially on the
/// same thread that applies backend completions, so the dashboard state has
/// a single writer. Errors are answered per request without stopping the
/// server.
pub fn serve<B: Backend + 'static>(
    mut runtime: Runtime<B>,
    addr: &str,
    open: bool,
) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("ragboard dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if open {
        // Best-effort
        let _ = open_browser(&format!("http://{addr}"));
    }

    loop {
        runtime.poll();

        let Some(mut request) = server
            .recv_timeout(POLL_INTERVAL)
            .context("failed to receive HTTP request")?
        else {
            continue;
        };

        let method = request.method().clone();
        let url = request.url().to_string();

        // Read body up-front for methods that carry one
        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let resp = match dispatch(&mut runtime, &method, &url, body.as_deref()) {
            Ok(resp) => resp,
            Err(e) => error_response(&e, 400),
        };
        let _ = request.respond(resp);

        // Brief access log
        println!(
            "{} {} {}",
            method,
            url,
            chrono::Local::now().format("%H:%M:%S")
        );
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
fn dispatch<B: Backend + 'static>(
    runtime: &mut Runtime<B>,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend()),

        // API: Dashboard
        (&Method::Get, "/api/state") => api::get_state(runtime),
        (&Method::Post, "/api/tab") => api::post_tab(runtime, body),
        (&Method::Post, "/api/eval/select") => api::post_eval_select(runtime, body),
        (&Method::Post, "/api/eval/submit") => api::post_eval_submit(runtime, body),
        (&Method::Post, "/api/analysis/target") => api::post_analysis_target(runtime, body),
        (&Method::Post, "/api/analysis/run") => api::post_analysis_run(runtime),
        (&Method::Post, "/api/autotune/start") => api::post_autotune_start(runtime, body),
        (&Method::Post, "/api/autotune/select") => api::post_autotune_select(runtime, body),
        (&Method::Post, "/api/query") => api::post_query(runtime, body),
        (&Method::Post, "/api/errors/clear") => api::post_errors_clear(runtime),

        // API: Activity and configuration
        (&Method::Get, "/api/activity") => api::get_activity(url),
        (&Method::Get, "/api/config") => api::get_config(),

        // 404
        _ => Ok(not_found()),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Serve the embedded single-page frontend.
fn serve_frontend() -> Response<Cursor<Vec<u8>>> {
    let html = frontend::INDEX_HTML;
    with_content_type(
        Response::from_data(html.as_bytes().to_vec()),
        "text/html; charset=utf-8",
    )
    .with_status_code(StatusCode(200))
}

/// 404 response.
fn not_found() -> Response<Cursor<Vec<u8>>> {
    let body = r#"{"error": "not found"}"#;
    with_content_type(
        Response::from_data(body.as_bytes().to_vec()),
        "application/json; charset=utf-8",
    )
    .with_status_code(StatusCode(404))
}

fn error_response(err: &anyhow::Error, status: u16) -> Response<Cursor<Vec<u8>>> {
    let body = serde_json::json!({ "error": format!("{err:#}") }).to_string();
    with_content_type(
        Response::from_data(body.into_bytes()),
        "application/json; charset=utf-8",
    )
    .with_status_code(StatusCode(status))
}

/// Attach a `Content-Type` header.
pub(crate) fn with_content_type(
    resp: Response<Cursor<Vec<u8>>>,
    value: &str,
) -> Response<Cursor<Vec<u8>>> {
    match Header::from_bytes("Content-Type", value) {
        Ok(header) => resp.with_header(header),
        Err(()) => resp,
    }
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

//! `unbundle dev` command implementation.
//!
//! Serves individual ES modules on demand instead of a bundle:
//!
//! ```text
//! Browser requests GET /src/App.vue
//!   → classify (route table)
//!   → load (project root or node_modules)
//!   → transform (component split, CSS module, ...)
//!   → rewrite imports (bare → /@modules/)
//!   → serve as application/javascript
//! ```
//!
//! Every request goes through a single fallback handler; routing lives in
//! the core route table, not in axum.

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};
use unbundle_core::version::version_string;
use unbundle_core::{ConfigOverrides, DevConfig, ModuleRequest, ModuleServer};

/// Dev server action.
#[derive(Debug, Clone)]
pub struct DevAction {
    /// Project root.
    pub cwd: PathBuf,
    /// Explicit config file.
    pub config: Option<PathBuf>,
    pub port: Option<u16>,
    pub host: Option<String>,
    pub index: Option<PathBuf>,
    pub modules_dir: Option<PathBuf>,
    /// Per-request timeout in seconds.
    pub timeout: Option<u64>,
    pub no_component_cache: bool,
}

/// Run the dev server until Ctrl+C.
pub async fn run(action: DevAction) -> Result<()> {
    let config = DevConfig::load(&action.cwd, action.config.as_deref())
        .into_diagnostic()
        .wrap_err("failed to load dev server configuration")?
        .merge_overrides(ConfigOverrides {
            host: action.host,
            port: action.port,
            index: action.index,
            modules_dir: action.modules_dir,
            request_timeout_secs: action.timeout,
            no_component_cache: action.no_component_cache,
        });

    let host_ip = if config.host == "localhost" {
        "127.0.0.1".to_string()
    } else {
        config.host.clone()
    };
    let addr: SocketAddr = format!("{}:{}", host_ip, config.port)
        .parse()
        .into_diagnostic()
        .wrap_err_with(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    let timeout = config.request_timeout_secs.map(Duration::from_secs);
    let display_host = config.host.clone();
    let server = Arc::new(ModuleServer::new(config));
    info!(root = %server.config().root.display(), %addr, "starting dev server");
    let app = router(server, timeout);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to bind {addr}"))?;

    println!();
    println!(
        "  {} dev server running at http://{}:{}",
        version_string(),
        display_host,
        addr.port()
    );
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;

    info!("dev server stopped");
    Ok(())
}

/// Build the HTTP app: one fallback handler over the module server.
fn router(server: Arc<ModuleServer>, timeout: Option<Duration>) -> Router {
    with_layers(
        Router::new().fallback(serve_module).with_state(server),
        timeout,
    )
}

/// Optional per-request timeout (408 on expiry) inside permissive CORS.
fn with_layers(app: Router, timeout: Option<Duration>) -> Router {
    let app = match timeout {
        Some(duration) => app.layer(TimeoutLayer::new(duration)),
        None => app,
    };
    app.layer(CorsLayer::permissive())
}

/// Serve any request through the core module server.
async fn serve_module(State(server): State<Arc<ModuleServer>>, uri: Uri) -> Response {
    let target = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string);
    let request = ModuleRequest::parse(&target);

    match server.handle(&request).await {
        Ok(response) => {
            info!(path = %request.path(), kind = %response.kind, "served");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, response.content_type),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                response.body,
            )
                .into_response()
        }
        Err(e) => {
            warn!(path = %request.path(), code = e.code(), error = %e, "request failed");
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                [(header::CONTENT_TYPE, "text/plain")],
                format!("{}: {}", e.code(), e),
            )
                .into_response()
        }
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "import { h } from 'vue'\n").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_cors_header_on_module_response() {
        let dir = project();
        let server = Arc::new(ModuleServer::new(DevConfig::new(dir.path())));
        let base = spawn(router(server, None)).await;

        let response = reqwest::Client::new()
            .get(format!("{base}/app.js"))
            .header("Origin", "http://localhost:5173")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(response.headers()["cache-control"], "no-cache");
        assert!(response
            .text()
            .await
            .unwrap()
            .contains("from '/@modules/vue'"));
    }

    #[tokio::test]
    async fn test_cors_header_on_error_response() {
        let dir = project();
        let server = Arc::new(ModuleServer::new(DevConfig::new(dir.path())));
        let base = spawn(router(server, None)).await;

        let response = reqwest::Client::new()
            .get(format!("{base}/logo.png"))
            .header("Origin", "http://localhost:5173")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 404);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_slow_request_times_out_with_408() {
        let slow = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "late"
            }),
        );
        let base = spawn(with_layers(slow, Some(Duration::from_millis(50)))).await;

        let response = reqwest::get(format!("{base}/slow")).await.unwrap();
        assert_eq!(response.status(), 408);
    }

    #[tokio::test]
    async fn test_fast_request_within_timeout() {
        let dir = project();
        let server = Arc::new(ModuleServer::new(DevConfig::new(dir.path())));
        let base = spawn(router(server, Some(Duration::from_secs(5)))).await;

        let response = reqwest::get(format!("{base}/app.js")).await.unwrap();
        assert_eq!(response.status(), 200);
    }
}

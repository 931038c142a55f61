mod config;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderValue;
use axum::response::{Html, IntoResponse, Response};
use axum::{routing::get, Router};
use thiserror::Error;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing_subscriber::EnvFilter;

use config::{ConfigError, ServerConfig};

#[derive(Debug, Error)]
enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Build a cache-controlled static file router.
///
/// Separated so tests can exercise the caching layer with arbitrary directories.
fn cached_static_router(dir: &Path, cache_header: &'static str) -> Router {
    let layer = SetResponseHeaderLayer::overriding(CACHE_CONTROL, HeaderValue::from_static(cache_header));
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(layer)
}

const CACHE_1DAY: &str = "public, max-age=86400, must-revalidate";
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";
const CACHE_NONE: &str = "no-cache";

const FALLBACK_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Pin Map</title></head>
<body>
<h1>Pin Map</h1>
<p>Frontend not built yet. Run <code>dx bundle</code> in <code>crates/frontend</code> and point <code>DIST_DIR</code> at the output.</p>
</body>
</html>"#;

struct AppState {
    index_path: std::path::PathBuf,
}

/// Build the full application router.
fn build_app(config: &ServerConfig) -> Router {
    // Bundler output carries content hashes in its file names
    let static_files = Router::new()
        .nest(
            "/static",
            cached_static_router(&config.assets_dir, CACHE_1DAY),
        )
        .nest(
            "/assets",
            cached_static_router(&config.dist_dir.join("assets"), CACHE_IMMUTABLE),
        )
        .nest(
            "/wasm",
            cached_static_router(&config.dist_dir.join("wasm"), CACHE_IMMUTABLE),
        );

    let state = Arc::new(AppState {
        index_path: config.dist_dir.join("index.html"),
    });

    Router::new()
        .route("/", get(serve_index))
        .route("/healthz", get(|| async { "ok" }))
        .fallback(serve_index)
        .with_state(state)
        .merge(static_files)
        .layer(CompressionLayer::new())
}

async fn serve_index(State(state): State<Arc<AppState>>) -> Response {
    // Serve the built frontend, fall back to a short notice
    let html = match tokio::fs::read_to_string(&state.index_path).await {
        Ok(html) => html,
        Err(e) => {
            tracing::debug!(path = %state.index_path.display(), error = %e, "No frontend build");
            FALLBACK_PAGE.to_string()
        }
    };
    ([(CACHE_CONTROL, CACHE_NONE)], Html(html)).into_response()
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::from_env()?;
    let app = build_app(&config);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    tracing::info!(
        port = config.port,
        dist = %config.dist_dir.display(),
        "Server running at http://localhost:{}",
        config.port
    );

    axum::serve(listener, app).await.map_err(ServerError::Serve)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server stopped");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    struct Dirs {
        assets: tempfile::TempDir,
        dist: tempfile::TempDir,
    }

    impl Dirs {
        fn config(&self) -> ServerConfig {
            ServerConfig {
                port: 0,
                dist_dir: self.dist.path().to_path_buf(),
                assets_dir: self.assets.path().to_path_buf(),
            }
        }
    }

    /// Temp dirs laid out like a bundled frontend.
    fn bundled(with_index: bool) -> Dirs {
        let assets = tempfile::tempdir().unwrap();
        std::fs::write(assets.path().join("robots.txt"), "User-agent: *").unwrap();

        let dist = tempfile::tempdir().unwrap();
        if with_index {
            std::fs::write(dist.path().join("index.html"), "<html>pin map app</html>").unwrap();
        }
        std::fs::create_dir(dist.path().join("assets")).unwrap();
        std::fs::write(dist.path().join("assets/main-abc123.css"), "body{}").unwrap();
        std::fs::create_dir(dist.path().join("wasm")).unwrap();
        std::fs::write(dist.path().join("wasm/pinmap-frontend_bg.wasm"), "\0asm").unwrap();
        Dirs { assets, dist }
    }

    async fn fetch(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn cache_control(resp: &Response) -> &str {
        resp.headers().get("cache-control").unwrap().to_str().unwrap()
    }

    #[tokio::test]
    async fn test_static_assets_have_1day_cache() {
        let dirs = bundled(true);
        let resp = fetch(build_app(&dirs.config()), "/static/robots.txt").await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(cache_control(&resp), "public, max-age=86400, must-revalidate");
    }

    #[tokio::test]
    async fn test_bundled_assets_have_immutable_cache() {
        let dirs = bundled(true);
        let app = build_app(&dirs.config());

        for uri in ["/assets/main-abc123.css", "/wasm/pinmap-frontend_bg.wasm"] {
            let resp = fetch(app.clone(), uri).await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            assert_eq!(cache_control(&resp), "public, max-age=31536000, immutable");
        }
    }

    #[tokio::test]
    async fn test_missing_static_file_returns_404() {
        let dirs = bundled(true);
        let resp = fetch(build_app(&dirs.config()), "/static/nonexistent.txt").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_index_is_not_cached() {
        let dirs = bundled(true);
        let resp = fetch(build_app(&dirs.config()), "/").await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(cache_control(&resp), "no-cache");
        assert_eq!(body_text(resp).await, "<html>pin map app</html>");
    }

    #[tokio::test]
    async fn test_unknown_paths_serve_the_app() {
        let dirs = bundled(true);
        let resp = fetch(build_app(&dirs.config()), "/some/deep/link").await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "<html>pin map app</html>");
    }

    #[tokio::test]
    async fn test_fallback_page_without_build() {
        let dirs = bundled(false);
        let resp = fetch(build_app(&dirs.config()), "/").await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Frontend not built yet"));
    }

    #[tokio::test]
    async fn test_healthz() {
        let dirs = bundled(true);
        let resp = fetch(build_app(&dirs.config()), "/healthz").await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "ok");
    }
}

//! Preview server routes and lifecycle.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use pulldown_cmark_escape::escape_html;
use relnotes_content::{
    lint, load_changelog, plain_text, read_source, render, suggest_version, Format,
};
use relnotes_core::{Changelog, LintConfig, RelnotesConfig, Section, ServeConfig, Version};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::port::{bind_address, setup_port, setup_server_url};
use crate::{Error, Result};

/// Shared state for request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Changelog file, read on every request
    pub path: PathBuf,
    /// Rules applied by `/lint`
    pub lint: LintConfig,
}

impl AppState {
    /// Create state for `path`.
    pub fn new(path: impl Into<PathBuf>, lint: LintConfig) -> Self {
        Self {
            path: path.into(),
            lint,
        }
    }

    async fn changelog(&self) -> std::result::Result<Changelog, ApiError> {
        load_changelog(&self.path).await.map_err(ApiError::internal)
    }
}

// ============================================================================
// Errors as responses
// ============================================================================

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    body: Value,
}

impl ApiError {
    fn new(status: StatusCode, message: impl std::fmt::Display) -> Self {
        Self {
            status,
            body: json!({ "error": message.to_string() }),
        }
    }

    fn internal(err: relnotes_core::Error) -> Self {
        log::error!("Request failed: {err}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

// ============================================================================
// Router
// ============================================================================

/// Build the preview router for the changelog at `state.path`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/index.html", get(index))
        .route("/changelog.json", get(changelog_json))
        .route("/changelog.md", get(changelog_markdown))
        .route("/latest", get(latest))
        .route("/versions/{version}", get(version))
        .route("/lint", get(lint_report))
        .with_state(Arc::new(state))
}

async fn index(State(state): State<Arc<AppState>>) -> ApiResult<Html<String>> {
    let changelog = state.changelog().await?;
    let body = render(&changelog, Format::Html).map_err(ApiError::internal)?;
    let title = changelog.title.as_deref().unwrap_or("Changelog");
    Ok(Html(page(title, &body)))
}

async fn changelog_json(State(state): State<Arc<AppState>>) -> ApiResult<Json<Changelog>> {
    Ok(Json(state.changelog().await?))
}

async fn changelog_markdown(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let source = read_source(&state.path).await.map_err(ApiError::internal)?;
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        source,
    )
        .into_response())
}

async fn latest(State(state): State<Arc<AppState>>) -> ApiResult<Json<Section>> {
    let changelog = state.changelog().await?;
    changelog
        .latest()
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Changelog has no releases"))
}

async fn version(
    State(state): State<Arc<AppState>>,
    UrlPath(requested): UrlPath<String>,
) -> ApiResult<Json<Section>> {
    let parsed: Version = requested
        .parse()
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e))?;
    let changelog = state.changelog().await?;

    if let Some(section) = changelog.find(&parsed) {
        return Ok(Json(section.clone()));
    }

    let mut err = ApiError::new(
        StatusCode::NOT_FOUND,
        relnotes_core::Error::version_not_found(&parsed),
    );
    if let Some(suggestion) = suggest_version(&changelog, &requested) {
        err.body["suggestion"] = json!(suggestion.to_string());
    }
    Err(err)
}

async fn lint_report(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let changelog = state.changelog().await?;
    let report = lint(&changelog, &state.lint);
    Ok(Json(json!({
        "ok": report.is_ok(state.lint.deny_warnings),
        "errors": report.error_count(),
        "warnings": report.warning_count(),
        "diagnostics": report.diagnostics(),
    })))
}

/// Wrap rendered HTML in a page titled by the plain text of `title`.
fn page(title: &str, body: &str) -> String {
    let mut escaped = String::with_capacity(title.len());
    // Writing into a String cannot fail.
    let _ = escape_html(&mut escaped, &plain_text(title));
    let title = escaped;
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; line-height: 1.5; }}
h2 {{ border-bottom: 1px solid #ddd; padding-bottom: 0.25rem; }}
code {{ background: #f4f4f4; padding: 0 0.2rem; }}
</style>
</head>
<body>
{body}</body>
</html>
"#
    )
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Resolve the configured host and port and bind a listener.
///
/// Returns the listener together with the URL it serves.
pub async fn bind(config: &ServeConfig) -> Result<(TcpListener, String)> {
    let port = setup_port(&config.port)?;
    let url = setup_server_url(&config.host, port);
    let addr = bind_address(&url);
    let listener = TcpListener::bind(addr).await.map_err(|source| Error::Bind {
        addr: addr.to_string(),
        source,
    })?;
    Ok((listener, url))
}

/// Serve `path` on an already bound listener until `shutdown` resolves.
pub async fn serve_listener<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    log::info!(
        "Serving {} on {}",
        state.path.display(),
        listener.local_addr()?
    );
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    log::info!("Preview server stopped");
    Ok(())
}

/// Bind according to `config.serve` and serve `path` until `shutdown` resolves.
pub async fn serve<F>(config: &RelnotesConfig, path: impl AsRef<Path>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (listener, url) = bind(&config.serve).await?;
    log::info!("Changelog preview at {url}");
    let state = AppState::new(path.as_ref(), config.lint.clone());
    serve_listener(listener, state, shutdown).await
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const CHANGELOG: &str = "# Changelog & Notes\n\n## [Unreleased]\n\n- Pending\n\n## [0.7.4] - 2020-05-09\n\n- Loopback fix\n  - [f340b29](https://github.com/o/r/commit/f340b29) fix\n\n## [0.7.3]\n\n- Asset embedding\n";

    fn fixture(content: &str) -> (TempDir, AppState) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CHANGELOG.md");
        std::fs::write(&path, content).unwrap();
        (dir, AppState::new(path, LintConfig::default()))
    }

    async fn get_path(state: &AppState, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router(state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn get_json(state: &AppState, uri: &str) -> (StatusCode, Value) {
        let (status, bytes) = get_path(state, uri).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_index_renders_html_page() {
        let (_dir, state) = fixture(CHANGELOG);
        for uri in ["/", "/index.html"] {
            let (status, bytes) = get_path(&state, uri).await;
            let html = String::from_utf8(bytes).unwrap();
            assert_eq!(status, StatusCode::OK);
            assert!(html.starts_with("<!DOCTYPE html>"));
            assert!(html.contains("<title>Changelog &amp; Notes</title>"));
            assert!(html.contains("<h2>[0.7.4] - 2020-05-09</h2>"));
        }
    }

    #[tokio::test]
    async fn test_changelog_json() {
        let (_dir, state) = fixture(CHANGELOG);
        let (status, value) = get_json(&state, "/changelog.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["sections"].as_array().unwrap().len(), 3);
        assert_eq!(value["sections"][0]["release"]["kind"], "unreleased");
    }

    #[tokio::test]
    async fn test_changelog_markdown_is_source() {
        let (_dir, state) = fixture(CHANGELOG);
        let (status, bytes) = get_path(&state, "/changelog.md").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(String::from_utf8(bytes).unwrap(), CHANGELOG);
    }

    #[tokio::test]
    async fn test_latest() {
        let (_dir, state) = fixture(CHANGELOG);
        let (status, value) = get_json(&state, "/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["release"]["value"], "0.7.4");
        assert_eq!(value["entries"][0]["commits"][0]["sha"], "f340b29");
    }

    #[tokio::test]
    async fn test_latest_without_releases() {
        let (_dir, state) = fixture("# Changelog\n\n## Unreleased\n\n- a\n");
        let (status, value) = get_json(&state, "/latest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(value["error"].is_string());
    }

    #[tokio::test]
    async fn test_version_lookup() {
        let (_dir, state) = fixture(CHANGELOG);

        let (status, value) = get_json(&state, "/versions/v0.7.3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["entries"][0]["text"], "Asset embedding");

        let (status, value) = get_json(&state, "/versions/0.7.5").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(value["error"], "Version not found: 0.7.5");
        assert_eq!(value["suggestion"], "0.7.4");

        let (status, value) = get_json(&state, "/versions/latest-ish").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value["error"].as_str().unwrap().starts_with("Invalid version"));
    }

    #[tokio::test]
    async fn test_lint_report() {
        let (_dir, state) = fixture("## 0.6.0\n\n- a\n\n## 0.7.0\n\n- b\n");
        let (status, value) = get_json(&state, "/lint").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["ok"], false);
        assert_eq!(value["errors"], 1);
        assert_eq!(value["warnings"], 1);
        assert_eq!(value["diagnostics"][0]["rule"], "missing-title");
        assert_eq!(value["diagnostics"][1]["rule"], "descending-order");
    }

    #[tokio::test]
    async fn test_changes_visible_without_restart() {
        let (_dir, state) = fixture(CHANGELOG);
        let (_, before) = get_json(&state, "/latest").await;
        assert_eq!(before["release"]["value"], "0.7.4");

        std::fs::write(&state.path, "## [0.8.0]\n\n- New\n").unwrap();
        let (_, after) = get_json(&state, "/latest").await;
        assert_eq!(after["release"]["value"], "0.8.0");
    }

    #[tokio::test]
    async fn test_missing_file_is_server_error() {
        let state = AppState::new("/nonexistent/CHANGELOG.md", LintConfig::default());
        let (status, value) = get_json(&state, "/changelog.json").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(value["error"].as_str().unwrap().contains("/nonexistent"));
    }

    #[tokio::test]
    async fn test_serve_until_shutdown() {
        let (_dir, state) = fixture(CHANGELOG);
        let (listener, url) = bind(&ServeConfig::default()).await.unwrap();
        assert!(url.starts_with("http://127.0.0.1:"));

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(serve_listener(listener, state, async {
            let _ = rx.await;
        }));
        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[test]
    fn test_page_title_is_plain_escaped_text() {
        let html = page("[Changelog](https://example.com) & \"draft\"", "<p>x</p>\n");
        assert!(html.contains("<title>Changelog &amp; &quot;draft&quot;</title>"));
        assert!(html.contains("<p>x</p>"));
    }

    #[tokio::test]
    async fn test_index_title_strips_link_markup() {
        let (_dir, state) =
            fixture("# [Changelog](https://example.com/tauri)\n\n## [0.1.0]\n\n- a\n");
        let (status, bytes) = get_path(&state, "/").await;
        let html = String::from_utf8(bytes).unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<title>Changelog</title>"));
    }
}

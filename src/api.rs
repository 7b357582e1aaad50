// 🌐 Local API - serve the written tables and trigger refreshes
// Axum router over the same Pipeline the CLI drives

use crate::config::Config;
use crate::events::TracingSink;
use crate::parser::SourceKind;
use crate::pipeline::{Pipeline, RefreshReport};
use crate::store::{self, Row};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("File {0} not found")]
    TableNotFound(String),

    #[error("Refresh failed: {0}")]
    Refresh(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::UnknownTable(_) | ApiError::TableNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Refresh(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

// ============================================================================
// STATE
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    refresh_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        AppState {
            pipeline: Arc::new(pipeline),
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    fn config(&self) -> &Config {
        self.pipeline.config()
    }
}

#[derive(Serialize)]
struct RefreshResponse {
    status: &'static str,
    report: RefreshReport,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /api/health
async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /api/:table - Rows of one written table
async fn get_table(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Json<Vec<Row>>, ApiError> {
    let kind = SourceKind::from_table(&table).ok_or(ApiError::UnknownTable(table))?;
    let path = state.config().csv_path(kind);

    if !path.exists() {
        return Err(ApiError::TableNotFound(kind.csv_file()));
    }

    let rows = store::read_rows(&path).map_err(|e| {
        tracing::error!(table = %kind, "Error reading {}: {:#}", path.display(), e);
        ApiError::Internal(format!("{:#}", e))
    })?;

    Ok(Json(rows))
}

/// POST /api/refresh - Re-run the whole pipeline
async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, ApiError> {
    let _guard = state.refresh_lock.lock().await;

    let pipeline = Arc::clone(&state.pipeline);
    let report = tokio::task::spawn_blocking(move || pipeline.run(&TracingSink))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| {
            tracing::error!("Refresh failed: {:#}", e);
            ApiError::Refresh(format!("{:#}", e))
        })?;

    Ok(Json(RefreshResponse {
        status: "success",
        report,
    }))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/refresh", post(refresh))
        .route("/:table", get(get_table))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind `config.bind_addr()` and serve until shutdown
pub async fn run_server(pipeline: Pipeline) -> anyhow::Result<()> {
    let addr: SocketAddr = pipeline.config().bind_addr().parse()?;
    let app = create_router(AppState::new(pipeline));

    tracing::info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use std::fs;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    fn create_test_app() -> (TempDir, Router) {
        let dir = tempdir().unwrap();
        let config = Config::with_dirs(dir.path().to_path_buf(), None);
        let app = create_router(AppState::new(Pipeline::from_config(config)));
        (dir, app)
    }

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn write_raw_documents(dir: &std::path::Path) {
        fs::write(dir.join("card_balances.json"), "{}").unwrap();
        fs::write(dir.join("cash_balances.json"), "{}").unwrap();
        fs::write(dir.join("investment_balances.json"), "{}").unwrap();
        fs::write(
            dir.join("transactions.json"),
            r#"[{"id": "t1", "date": "2024-03-01", "amount": {"value": -12.5}}]"#,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, app) = create_test_app();

        let (status, body) = send(app, "GET", "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_unknown_table_is_404() {
        let (_dir, app) = create_test_app();

        let (status, body) = send(app, "GET", "/api/set-token").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], json!("Unknown table: set-token"));
    }

    #[tokio::test]
    async fn test_missing_csv_is_404() {
        let (_dir, app) = create_test_app();

        let (status, body) = send(app, "GET", "/api/cash_balances").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], json!("File cash_balances.csv not found"));
    }

    #[tokio::test]
    async fn test_refresh_then_read_table() {
        let (dir, app) = create_test_app();
        write_raw_documents(dir.path());

        let (status, body) = send(app.clone(), "POST", "/api/refresh").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("success"));
        assert_eq!(body["report"]["tables"].as_array().unwrap().len(), 5);

        let (status, rows) = send(app, "GET", "/api/transactions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rows[0]["transaction_id"], json!("t1"));
        assert_eq!(rows[0]["amount_value"], json!("-12.5"));
    }

    #[tokio::test]
    async fn test_refresh_without_raw_documents_is_500() {
        let (_dir, app) = create_test_app();

        let (status, body) = send(app, "POST", "/api/refresh").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("Refresh failed"));
    }
}

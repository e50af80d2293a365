#![cfg(feature = "web")]
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post, put},
};
use log::{info, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::chart::{ChartKind, Figure, UnknownChartKind};
use crate::config::Config;
use crate::downloader;
use crate::graph::{self, GraphOptions};
use crate::loader;
use crate::view::{Event, StateSummary, ViewState};

/// Shared state of the running app: the one current view
pub struct AppState {
    view: Mutex<ViewState>,
    graph: GraphOptions,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            view: Mutex::new(ViewState::new()),
            graph: GraphOptions::default(),
        }
    }

    // The guarded value is always a whole state, so a poisoned lock is safe to reuse
    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current view
    pub fn current(&self) -> ViewState {
        self.lock().clone()
    }

    /// Replaces the current view with the one that follows `event`
    pub fn transition(&self, event: Event) -> ViewState {
        let mut view = self.lock();
        let next = view.apply(event);
        *view = next.clone();
        next
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct ApiResponse {
    status: &'static str,
    message: Option<String>,
}

#[derive(Serialize)]
struct ChartResponse {
    state: StateSummary,
    figure: Option<Figure>,
}

/// Error returned from a handler, rendered as `{"status":"error","message":...}`
#[derive(Debug)]
struct ApiError {
    code: StatusCode,
    message: String,
}

impl ApiError {
    fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.code,
            Json(ApiResponse {
                status: "error",
                message: Some(self.message),
            }),
        )
            .into_response()
    }
}

/// Builds the router; split from [`run`] so tests can drive it directly.
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/static/app.js", get(serve_script))
        .route("/static/app.css", get(serve_style))
        .route("/api/state", get(get_state))
        .route("/api/upload", post(upload))
        .route("/api/chart", delete(clear_chart))
        .route("/api/chart/:kind", put(select_chart))
        .route("/api/chart.png", get(chart_png))
        .route("/api/figure", get(get_figure))
        .route("/api/export/:format", get(export))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::new());
    let app = router(state, config.max_upload_bytes());

    let listener = TcpListener::bind(config.addr()).await?;
    info!("Listening on http://{}", config.addr());
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

async fn serve_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        include_str!("./static/app.js"),
    )
}

async fn serve_style() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        include_str!("./static/app.css"),
    )
}

async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateSummary> {
    Json(state.current().summary())
}

async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
        file = Some((file_name, bytes));
    }

    let (file_name, bytes) =
        file.ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "No file data received"))?;
    info!("received '{}' ({} bytes)", file_name, bytes.len());

    let name = file_name.clone();
    let decoded = tokio::task::spawn_blocking(move || loader::from_bytes(&name, &bytes))
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let code = match &decoded {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            warn!("upload rejected: {}", e);
            StatusCode::UNPROCESSABLE_ENTITY
        }
    };

    let next = state.transition(Event::from_upload(file_name, decoded));
    Ok((code, Json(next.summary())).into_response())
}

async fn select_chart(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<ChartResponse>, ApiError> {
    let kind: ChartKind = kind
        .parse()
        .map_err(|e: UnknownChartKind| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;
    info!("chart selected: {}", kind);

    let next = state.transition(Event::ChartSelected(kind));
    Ok(Json(ChartResponse {
        state: next.summary(),
        figure: next.figure(),
    }))
}

async fn clear_chart(State(state): State<Arc<AppState>>) -> Json<StateSummary> {
    Json(state.transition(Event::ChartCleared).summary())
}

async fn get_figure(State(state): State<Arc<AppState>>) -> Response {
    match state.current().figure() {
        Some(figure) => Json(figure).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn chart_png(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let figure = state
        .current()
        .figure()
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "No chart to render"))?;
    let options = state.graph.clone();

    let png = tokio::task::spawn_blocking(move || graph::render_png(&figure, &options))
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

async fn export(
    State(state): State<Arc<AppState>>,
    Path(format): Path<String>,
) -> Result<Response, ApiError> {
    let view = state.current();
    let dataset = view
        .dataset()
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "No dataset to export"))?;
    let stem = download_stem(view.file_name());
    let internal = |e: downloader::ExportError| {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    };

    let (content_type, body, extension) = match format.as_str() {
        "csv" => (
            "text/csv; charset=utf-8",
            downloader::to_csv(dataset).map_err(internal)?.into_bytes(),
            "csv",
        ),
        "xlsx" => (
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            downloader::to_xlsx(dataset).map_err(internal)?,
            "xlsx",
        ),
        other => {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                format!("Unsupported export format: {}", other),
            ));
        }
    };
    info!("exporting {} rows as {}", dataset.len(), extension);

    let disposition = format!("attachment; filename=\"{}-clean.{}\"", stem, extension);
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// File stem used for downloads, restricted to characters safe in a header
fn download_stem(file_name: Option<&str>) -> String {
    let stem = file_name
        .and_then(|name| std::path::Path::new(name).file_stem())
        .and_then(|stem| stem.to_str())
        .unwrap_or("data");

    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "data".to_string()
    } else {
        cleaned
    }
}

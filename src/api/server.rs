//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use super::handlers;
use super::models::{ErrorBody, ResultsPayload, ViewQuery};
use crate::config::Config;
use crate::error::LectureGraphError;
use crate::notify::ProcessingNotifier;
use crate::storage::ObjectStorage;
use crate::store::LectureStore;
use crate::upload::{RegisterLectureRequest, RegisterLectureResponse, UploadTargetRequest};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LectureStore>,
    pub storage: Arc<dyn ObjectStorage>,
    pub notifier: ProcessingNotifier,
    pub config: Arc<Config>,
}

/// Build the application router
pub fn router(app_state: AppState) -> Router {
    // Configure CORS to allow browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/health", get(health_handler))
        // Upload flow
        .route("/api/upload", post(upload_target_handler))
        .route("/api/lectures", get(list_lectures_handler).post(register_lecture_handler))
        // Lecture read model and views
        .route("/api/lectures/:id", get(get_lecture_handler))
        .route("/api/lectures/:id/graph", get(lecture_graph_handler))
        .route("/api/lectures/:id/concepts", get(concept_list_handler))
        // Processing backend delivery
        .route("/api/lectures/:id/results", post(save_results_handler))
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Serve the API on an already-bound listener
pub async fn serve(listener: TcpListener, app_state: AppState) -> Result<()> {
    let addr = listener.local_addr()?;
    info!("🌐 API server listening on http://{}", addr);
    axum::serve(listener, router(app_state)).await?;
    Ok(())
}

/// Bind the configured address and serve
pub async fn start_http_server(app_state: AppState) -> Result<()> {
    let addr = format!("{}:{}", app_state.config.server.host, app_state.config.server.port);
    info!("🚀 Starting HTTP server on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    serve(listener, app_state).await
}

fn error_response(e: LectureGraphError) -> Response {
    let status = match e {
        LectureGraphError::Validation(_) => StatusCode::BAD_REQUEST,
        LectureGraphError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    // storage failures keep their details in the log only
    let message = match e {
        LectureGraphError::Storage(_) => "Internal Server Error".to_string(),
        other => other.to_string(),
    };
    (status, Json(ErrorBody { error: message })).into_response()
}

/// Unparseable bodies are reported like any other validation failure
fn rejection_error(rejection: JsonRejection) -> LectureGraphError {
    LectureGraphError::Validation(rejection.body_text())
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    match handlers::health_check().await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Upload target handler
async fn upload_target_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UploadTargetRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(request) => request,
        Err(rejection) => return error_response(rejection_error(rejection)),
    };
    match handlers::upload_target(&state, &request).await {
        Ok(target) => (StatusCode::OK, Json(target)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Lecture registration handler; always 200, outcome in the body
async fn register_lecture_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterLectureRequest>, JsonRejection>,
) -> impl IntoResponse {
    match payload {
        Ok(Json(request)) => Json(handlers::register_lecture(&state, &request).await),
        Err(rejection) => Json(RegisterLectureResponse::failed(rejection.body_text())),
    }
}

/// List lectures handler
async fn list_lectures_handler(State(state): State<AppState>) -> impl IntoResponse {
    match handlers::list_lectures(&state).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Lecture read model handler
async fn get_lecture_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match handlers::get_lecture(&state, &id).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Graph view handler
async fn lecture_graph_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> impl IntoResponse {
    match handlers::lecture_graph(&state, &id, &query).await {
        Ok(graph) => (StatusCode::OK, Json(graph)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Concept list handler
async fn concept_list_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> impl IntoResponse {
    match handlers::concept_list(&state, &id, &query).await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Processing results handler
async fn save_results_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<ResultsPayload>, JsonRejection>,
) -> impl IntoResponse {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(rejection_error(rejection)),
    };
    match handlers::save_results(&state, &id, payload).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response(e),
    }
}

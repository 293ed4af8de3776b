use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        GenerateBody, GenerateQuery, GenerationRequest, GenerationResult, RequestMode,
        ResponseEnvelope,
    },
    orchestrator::Orchestrator,
};

/// Largest request body `generate` will read; anything bigger is a malformed body.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate", any(generate))
        .route("/api/gemini", any(generate))
        .route("/health", get(health_check))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[axum::debug_handler]
pub async fn generate(
    method: Method,
    State(state): State<AppState>,
    query: Option<Query<GenerateQuery>>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    // A blank `type` selects the default, same as an absent one.
    let kind = query
        .and_then(|Query(q)| q.kind)
        .filter(|kind| !kind.trim().is_empty())
        .unwrap_or_else(|| "all".to_string());
    let span = info_span!("generate", request_id = %Uuid::new_v4(), kind = %kind);

    match run(&method, &state.orchestrator, &kind, &headers, body).instrument(span).await {
        Ok(result) => (StatusCode::OK, Json(ResponseEnvelope::ok(result))).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn run(
    method: &Method,
    orchestrator: &Orchestrator,
    kind: &str,
    headers: &HeaderMap,
    body: Body,
) -> Result<GenerationResult, AppError> {
    if *method != Method::POST {
        warn!("Rejecting {} request", method);
        return Err(AppError::MethodNotAllowed);
    }

    orchestrator.ensure_configured().inspect_err(|_| error!("❌ OPENAI_API_KEY missing"))?;

    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"));
    if !is_json {
        error!("❌ Invalid content type");
        return Err(AppError::UnsupportedContentType);
    }

    let bytes = to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
        error!("❌ Could not read request body: {}", e);
        AppError::MalformedBody
    })?;
    let body: GenerateBody = serde_json::from_slice(&bytes).map_err(|e| {
        error!("❌ Invalid JSON body: {}", e);
        AppError::MalformedBody
    })?;

    let mode: RequestMode = kind.parse()?;
    let request = GenerationRequest::from_parts(mode, body)?;

    info!("🤖 Generating: {}", mode);
    let result = orchestrator.handle(request).await?;
    info!("✅ {} request complete", mode);
    Ok(result)
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "credentialConfigured": state.orchestrator.is_configured()})),
    )
}

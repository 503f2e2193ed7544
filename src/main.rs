// ABOUTME: Cloud Run relay that resolves video page URLs to direct media URLs
// ABOUTME: Authorizes the caller, runs yt-dlp, classifies the outcome into JSON

mod auth;
mod classify;
mod config;
mod error;
mod extractor;
mod media;

use axum::{
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, options, post},
    Router,
};
use bytes::Bytes;
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::Service;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::auth::is_authorized;
use crate::classify::classify;
use crate::config::Config;
use crate::error::{ResolveError, Result};
use crate::extractor::Extractor;
use crate::media::MediaType;

/// A resolve body only carries a URL
const MAX_BODY_BYTES: usize = 64 * 1024;

// App state shared across handlers
struct AppState {
    config: Config,
    extractor: Extractor,
}

impl AppState {
    fn new(config: Config) -> Self {
        let extractor = Extractor::new(config.extractor_bin.clone(), config.extractor_timeout);
        Self { config, extractor }
    }
}

// Resolve request body
#[derive(Debug, Default, Deserialize)]
struct ResolveRequest {
    #[serde(default)]
    url: String,
}

/// Body of every response, successful or not
#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    media_type: Option<MediaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ResolveResponse {
    fn healthy() -> Self {
        Self {
            ok: true,
            url: None,
            media_type: None,
            error: None,
        }
    }

    fn resolved(url: String, media_type: MediaType) -> Self {
        Self {
            ok: true,
            url: Some(url),
            media_type: Some(media_type),
            error: None,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            ok: false,
            url: None,
            media_type: None,
            error: Some(message),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vuta_resolver=info".parse()?),
        )
        .init();

    let config = Config::from_env();
    let port = config.port;

    info!(
        "Bearer auth: {}",
        if config.api_key.is_some() { "required" } else { "disabled (no RESOLVER_API_KEY)" }
    );
    info!(
        "Extractor: {} (timeout {:?})",
        config.extractor_bin, config.extractor_timeout
    );

    let state = Arc::new(AppState::new(config));
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!("Starting resolver service on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Use hyper's auto builder which supports both HTTP/1 and HTTP/2
    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let app = app.clone();

        tokio::spawn(async move {
            let builder = Builder::new(hyper_util::rt::TokioExecutor::new());
            if let Err(e) = builder
                .serve_connection(
                    io,
                    hyper::service::service_fn(move |req| {
                        let mut app = app.clone();
                        async move { app.call(req).await }
                    }),
                )
                .await
            {
                error!("Connection error: {}", e);
            }
        });
    }
}

fn build_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(86400));

    Router::new()
        .route("/resolve", post(handle_resolve))
        .route("/resolve", options(handle_cors_preflight))
        .route("/health", get(handle_health))
        .route("/", get(handle_health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_cors_preflight() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

async fn handle_health() -> impl IntoResponse {
    Json(ResolveResponse::healthy())
}

async fn handle_resolve(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    match process_resolve(&state, &headers, body).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            if e.status_code().is_server_error() {
                error!("Resolve error: {}", e);
            } else {
                warn!("Resolve rejected: {}", e);
            }
            e.into_response()
        }
    }
}

async fn process_resolve(
    state: &AppState,
    headers: &HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<ResolveResponse> {
    if !is_authorized(headers, state.config.api_key.as_deref()) {
        return Err(ResolveError::Unauthorized);
    }

    let body = match body {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(ResolveError::PayloadTooLarge);
        }
        // An unreadable body carries no url either
        Err(_) => return Err(ResolveError::MissingUrl),
    };

    let request = parse_request(&body);
    let url = request.url.trim();
    if url.is_empty() {
        return Err(ResolveError::MissingUrl);
    }

    info!("Resolving {} via {}", url, state.extractor.program());

    let result = state.extractor.invoke(url).await;
    let resolved = classify(&result).into_result()?;
    let media_type = MediaType::infer(&resolved);

    info!("Resolved {} -> {} ({})", url, resolved, media_type);

    Ok(ResolveResponse::resolved(resolved, media_type))
}

/// Malformed or non-object bodies are treated as carrying no url.
fn parse_request(body: &[u8]) -> ResolveRequest {
    serde_json::from_slice(body).unwrap_or_default()
}

use std::any::Any as PanicPayload;

use axum::{
    routing::{get, post},
    Router,
    extract::{Json, State, rejection::JsonRejection},
    http::{HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info};

use crate::error::{AppError, Result};
use crate::api::models::{HealthResponse, RewriteRequestBody, RewriteResponse};
use crate::api::response;
use crate::prompt::{ContentType, RewriteRequest, Style};
use crate::AppState;

const ALLOWED_HEADERS: [&str; 9] = [
    "x-csrf-token",
    "x-requested-with",
    "accept",
    "accept-version",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "x-api-version",
];

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/rewrite",
            post(rewrite_handler)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route("/health", get(health))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors_layer())
        .with_state(app_state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::OPTIONS,
            Method::PATCH,
            Method::DELETE,
            Method::POST,
            Method::PUT,
        ])
        .allow_headers(ALLOWED_HEADERS.map(HeaderName::from_static))
}

fn panic_response(payload: Box<dyn PanicPayload + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("handler panicked: {}", detail);

    AppError::Unexpected("Internal server error".to_string()).into_response()
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

async fn health() -> impl IntoResponse {
    response::success(HealthResponse { status: "ok" })
}

async fn rewrite_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RewriteRequestBody>, JsonRejection>,
) -> Result<impl IntoResponse> {
    // An unreadable body carries no url either.
    let Json(body) = payload.map_err(|rejection| {
        debug!("rejected request body: {}", rejection);
        AppError::InvalidInput("URL is required".to_string())
    })?;
    let url = body
        .target_url()
        .ok_or_else(|| AppError::InvalidInput("URL is required".to_string()))?
        .to_string();

    info!(%url, content_type = ?body.content_type, style = ?body.style, "processing rewrite request");
    let start = std::time::Instant::now();

    let article = state
        .fetcher
        .fetch_article(&url)
        .await
        .ok_or(AppError::FetchExhausted)?;
    let original_length = article.char_len();

    let request = RewriteRequest {
        content: article.text,
        content_type: ContentType::from_key(body.content_type.as_deref()),
        style: Style::from_key(body.style.as_deref()),
        custom_prompt: body.custom_prompt,
        custom_format: body.custom_format,
    };
    let content = state.rewriter.rewrite(&request).await?;
    let rewritten_length = content.chars().count();

    info!(%url, original_length, rewritten_length, elapsed = ?start.elapsed(), "request completed");
    Ok(response::success(RewriteResponse {
        success: true,
        content,
        original_length,
        rewritten_length,
        timestamp: response::timestamp(),
    }))
}

use crate::error::AppError;
use crate::response::{ResponseMode, SplitPdfResponse, UnknownResponseMode};
use crate::state::AppState;
use axum::{
    body::{Body, Bytes},
    extract::{
        rejection::{BytesRejection, QueryRejection},
        DefaultBodyLimit, Query, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pagesplit::{decode_body, retrieve};
use serde::Deserialize;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

/// Header that marks a body as already base64-encoded by the transport
pub const PREFLAG_HEADER: &str = "content-transfer-encoding";

const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Query parameters accepted by the split endpoint
#[derive(Debug, Default, Deserialize)]
pub struct SplitQuery {
    /// `inline` or `referenced`
    pub mode: Option<String>,
}

/// Query parameters of the download endpoint. Both are validated by the
/// handler so that a missing or malformed value gets the JSON error shape.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    pub session: Option<String>,
    pub page: Option<String>,
}

/// Build the application router with all routes configured
///
/// - `POST /api/split-pdf` - Split a PDF into single pages
/// - `GET /api/download-page?session=S&page=I` - Fetch one stored page
/// - `GET /api/health` - Liveness and session count
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    let split = with_cors_headers(
        Router::new().route(
            "/api/split-pdf",
            post(split_pdf)
                .options(preflight)
                .fallback(method_not_allowed),
        ),
        "POST, OPTIONS",
    );

    let download = with_cors_headers(
        Router::new().route(
            "/api/download-page",
            get(download_page)
                .options(preflight)
                .fallback(method_not_allowed),
        ),
        "GET, OPTIONS",
    );

    Router::new()
        .merge(split)
        .merge(download)
        .route("/api/health", get(health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Cross-origin headers attached to every response of an endpoint
fn with_cors_headers(router: Router<AppState>, methods: &'static str) -> Router<AppState> {
    router
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(methods),
        ))
}

/// CORS preflight: empty 200
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Split an uploaded PDF into one document per page
///
/// The body may be raw PDF bytes (`Content-Type: application/pdf` or no
/// content type), a JSON object `{"pdf": "<base64>"}`, or base64 flagged with
/// `Content-Transfer-Encoding: base64`.
///
/// # Response
/// - **Success**: 200 OK with `{success, totalPages, files}`. Each file has
///   either `data` (inline mode) or `downloadUrl` (referenced mode).
/// - **Error**: 400 for an empty or undecodable body, 413 for a document over
///   the size limit, 500 when the PDF cannot be processed
pub async fn split_pdf(
    State(state): State<AppState>,
    query: Result<Query<SplitQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let body = body.map_err(|rejection| {
        AppError::from_body_rejection(rejection, &headers, state.config.max_document_bytes)
    })?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let decoded = decode_body(&body, is_preflagged_base64(&headers), content_type)?;

    let mode = resolve_mode(
        query.mode.as_deref(),
        decoded.requested_mode.as_deref(),
        state.config.default_mode,
    )?;

    // Reject oversized documents before handing anything to the blocking pool
    state.splitter.check_size(decoded.document.len())?;

    let splitter = state.splitter.clone();
    let document = decoded.document;
    let pages = tokio::task::spawn_blocking(move || splitter.split(&document))
        .await
        .map_err(|e| AppError::Internal(format!("split task failed: {e}")))??;

    // A document without pages has nothing to store
    let response = if pages.is_empty() {
        SplitPdfResponse::empty()
    } else {
        match mode {
            ResponseMode::Inline => SplitPdfResponse::inline(&pages),
            ResponseMode::Referenced => {
                let session = state.store.create(pages.clone());
                SplitPdfResponse::referenced(&pages, &state.config.public_base_url, &session)
            }
        }
    };

    tracing::info!(
        total_pages = response.total_pages,
        %mode,
        encoding = ?decoded.encoding,
        "PDF split completed"
    );

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Download one page produced by an earlier referenced-mode split
///
/// # Response
/// - **Success**: 200 OK with the page as `application/pdf`
/// - **Error**: 400 when `session` or `page` is missing or malformed, 404 when
///   the session is unknown or expired or the page does not exist
pub async fn download_page(
    State(state): State<AppState>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query.map_err(|_| AppError::MissingDownloadParams)?;

    let session = query
        .session
        .filter(|s| !s.trim().is_empty())
        .ok_or(AppError::MissingDownloadParams)?;
    let page_index = query
        .page
        .and_then(|p| p.trim().parse::<usize>().ok())
        .ok_or(AppError::MissingDownloadParams)?;

    let artifact = retrieve(state.store.as_ref(), &session, page_index)?;

    let disposition = format!("attachment; filename=\"{}\"", artifact.filename());
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| AppError::Internal(format!("invalid content disposition: {e}")))?;

    tracing::debug!(session_id = %session, page_index, size = artifact.size(), "Serving page");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(artifact.size())),
        ],
        Body::from(artifact.bytes().to_vec()),
    )
        .into_response())
}

/// Health check endpoint for monitoring and load balancing
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "pagesplit API",
        "version": env!("CARGO_PKG_VERSION"),
        "liveSessions": state.store.len(),
    }))
}

fn is_preflagged_base64(headers: &HeaderMap) -> bool {
    headers
        .get(PREFLAG_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("base64"))
}

/// Query parameter first, then the JSON body's `mode`, then the configured
/// default.
fn resolve_mode(
    from_query: Option<&str>,
    from_body: Option<&str>,
    default: ResponseMode,
) -> Result<ResponseMode, AppError> {
    match from_query.or(from_body) {
        Some(value) => value
            .parse()
            .map_err(|e: UnknownResponseMode| AppError::BadRequest(e.to_string())),
        None => Ok(default),
    }
}

//! Integration tests for pagesplit-api

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use http_body_util::BodyExt;
use pagesplit::fixtures::{page_text, sample_pdf};
use pagesplit::{BackendError, DocumentBackend, InMemorySessionStore, ManualClock, OpenedDocument};
use pagesplit_api::{app, AppState, Config, ErrorResponse, SplitPdfResponse};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: Response<Body>) -> T {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn split_request(uri: &str, content_type: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).method("POST");
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(body.into()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .unwrap()
}

/// Path and query of a `downloadUrl` built with an empty base URL
fn download_path(file: &pagesplit_api::SplitFileInfo) -> String {
    file.download_url.clone().expect("referenced file has a url")
}

#[cfg(test)]
mod split_endpoint {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_preflight_returns_cors_headers() {
        let response = app(AppState::default())
            .oneshot(
                Request::builder()
                    .uri("/api/split-pdf")
                    .method("OPTIONS")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
        assert_eq!(
            headers.get("access-control-allow-headers").unwrap(),
            "Content-Type, Authorization"
        );
        assert_eq!(
            headers.get("access-control-allow-methods").unwrap(),
            "POST, OPTIONS"
        );
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_method_is_rejected() {
        let response = app(AppState::default())
            .oneshot(get("/api/split-pdf"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.error, "Method not allowed");
    }

    #[tokio::test]
    async fn test_empty_body_is_bad_request() {
        let response = app(AppState::default())
            .oneshot(split_request("/api/split-pdf", None, Body::empty()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.error, "No PDF data provided");
    }

    #[tokio::test]
    async fn test_json_without_pdf_field_is_bad_request() {
        let response = app(AppState::default())
            .oneshot(split_request(
                "/api/split-pdf",
                Some("application/json"),
                json!({ "document": "abc" }).to_string(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.error, "No PDF data provided");
        assert_eq!(
            error.details.as_deref(),
            Some("No PDF data found in request body")
        );
    }

    #[tokio::test]
    async fn test_oversized_document_is_rejected_without_session() {
        let state = AppState::default();
        let store = state.store.clone();
        let oversized = vec![0u8; 7 * 1024 * 1024];

        let response = app(state)
            .oneshot(split_request(
                "/api/split-pdf",
                Some("application/pdf"),
                oversized,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.error, "File too large");
        assert_eq!(
            error.details.as_deref(),
            Some("7.00MB exceeds maximum allowed size of 6MB")
        );
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_document_fails_processing() {
        let response = app(AppState::default())
            .oneshot(split_request(
                "/api/split-pdf",
                Some("application/pdf"),
                b"this is not a pdf document".to_vec(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.error, "Failed to process PDF");
        assert!(error.details.is_some());
    }

    #[tokio::test]
    async fn test_unknown_mode_is_bad_request() {
        let response = app(AppState::default())
            .oneshot(split_request(
                "/api/split-pdf?mode=zip",
                Some("application/pdf"),
                sample_pdf(1),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_inline_mode_embeds_pages() {
        let response = app(AppState::default())
            .oneshot(split_request(
                "/api/split-pdf?mode=inline",
                Some("application/pdf"),
                sample_pdf(3),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let result: SplitPdfResponse = body_json(response).await;

        assert!(result.success);
        assert_eq!(result.total_pages, 3);
        assert!(result.session_id.is_none());
        assert!(result.expires_at.is_none());

        for (i, file) in result.files.iter().enumerate() {
            assert_eq!(file.page, i + 1);
            assert_eq!(file.filename, format!("page_{}.pdf", i + 1));
            assert!(file.download_url.is_none());

            let bytes = STANDARD.decode(file.data.as_ref().unwrap()).unwrap();
            assert_eq!(bytes.len(), file.size);
            assert_eq!(page_text(&bytes, 1), format!("Page {}", i + 1));
        }
    }

    #[tokio::test]
    async fn test_mode_from_json_body() {
        let pdf = sample_pdf(2);
        let response = app(AppState::default())
            .oneshot(split_request(
                "/api/split-pdf",
                Some("application/json"),
                json!({ "pdf": STANDARD.encode(&pdf), "mode": "inline" }).to_string(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let result: SplitPdfResponse = body_json(response).await;
        assert_eq!(result.total_pages, 2);
        assert!(result.files.iter().all(|f| f.data.is_some()));
    }

    #[tokio::test]
    async fn test_all_encodings_produce_same_pages() {
        let pdf = sample_pdf(3);
        let encoded = STANDARD.encode(&pdf);
        let state = AppState::default();

        let native = split_request("/api/split-pdf?mode=inline", Some("application/pdf"), pdf);
        let structured = split_request(
            "/api/split-pdf?mode=inline",
            Some("application/json"),
            json!({ "pdf": encoded }).to_string(),
        );
        let preflagged = Request::builder()
            .uri("/api/split-pdf?mode=inline")
            .method("POST")
            .header("content-transfer-encoding", "base64")
            .body(Body::from(encoded.clone()))
            .unwrap();

        let mut results = Vec::new();
        for request in [native, structured, preflagged] {
            let response = app(state.clone()).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let result: SplitPdfResponse = body_json(response).await;
            results.push(result.files);
        }

        assert_eq!(results[0], results[1]);
        assert_eq!(results[0], results[2]);
    }

    #[tokio::test]
    async fn test_zero_page_document_creates_no_session() {
        let state = AppState::default();
        let store = state.store.clone();

        let response = app(state)
            .oneshot(split_request(
                "/api/split-pdf",
                Some("application/pdf"),
                sample_pdf(0),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let value: serde_json::Value = body_json(response).await;
        assert_eq!(value, json!({ "success": true, "totalPages": 0, "files": [] }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_body_over_transport_limit_reports_document_size() {
        let oversized = vec![0u8; 11 * 1024 * 1024];
        let request = Request::builder()
            .uri("/api/split-pdf")
            .method("POST")
            .header(header::CONTENT_TYPE, "application/pdf")
            .header(header::CONTENT_LENGTH, oversized.len())
            .body(Body::from(oversized))
            .unwrap();

        let response = app(AppState::default()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.error, "File too large");
        assert_eq!(
            error.details.as_deref(),
            Some("11.00MB exceeds maximum allowed size of 6MB")
        );
    }

    /// Backend that panics while parsing
    struct PanickingBackend;

    impl DocumentBackend for PanickingBackend {
        fn open(&self, _bytes: &[u8]) -> Result<Box<dyn OpenedDocument>, BackendError> {
            panic!("parser blew up");
        }
    }

    #[tokio::test]
    async fn test_panicking_backend_is_internal_error() {
        let config = Config::default();
        let store = Arc::new(InMemorySessionStore::new(config.session_ttl));
        let state = AppState::with_backend(config, store.clone(), Arc::new(PanickingBackend));

        let response = app(state)
            .oneshot(split_request(
                "/api/split-pdf",
                Some("application/pdf"),
                sample_pdf(1),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.error, "Internal server error");
        assert!(error
            .details
            .as_deref()
            .is_some_and(|d| d.starts_with("split task failed")));
        assert_eq!(store.stored_sessions(), 0);
    }
}

#[cfg(test)]
mod download_endpoint {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_referenced_split_then_download() {
        let state = AppState::default();
        let response = app(state.clone())
            .oneshot(split_request(
                "/api/split-pdf",
                Some("application/pdf"),
                sample_pdf(3),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let result: SplitPdfResponse = body_json(response).await;
        assert_eq!(result.total_pages, 3);

        let session = result.session_id.clone().unwrap();
        assert!(result.expires_at.is_some());
        for (i, file) in result.files.iter().enumerate() {
            assert!(file.data.is_none());
            assert_eq!(
                download_path(file),
                format!("/api/download-page?session={session}&page={i}")
            );
        }

        let response = app(state)
            .oneshot(get(&download_path(&result.files[1])))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers().clone();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/pdf");
        assert_eq!(
            headers.get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"page_2.pdf\""
        );
        assert_eq!(
            headers.get(header::CONTENT_LENGTH).unwrap(),
            &result.files[1].size.to_string()
        );
        assert_eq!(
            headers.get("access-control-allow-methods").unwrap(),
            "GET, OPTIONS"
        );

        let body = body_bytes(response).await;
        assert_eq!(body.len(), result.files[1].size);
        assert_eq!(page_text(&body, 1), "Page 2");
    }

    #[tokio::test]
    async fn test_public_base_url_prefixes_links() {
        let config = Config {
            public_base_url: "https://pages.example.test".to_string(),
            ..Config::default()
        };

        let response = app(AppState::new(config))
            .oneshot(split_request(
                "/api/split-pdf",
                Some("application/pdf"),
                sample_pdf(1),
            ))
            .await
            .unwrap();

        let result: SplitPdfResponse = body_json(response).await;
        assert!(download_path(&result.files[0])
            .starts_with("https://pages.example.test/api/download-page?session="));
    }

    #[tokio::test]
    async fn test_missing_parameters() {
        for uri in [
            "/api/download-page",
            "/api/download-page?session=abc",
            "/api/download-page?page=0",
            "/api/download-page?session=abc&page=first",
            "/api/download-page?session=&page=0",
        ] {
            let response = app(AppState::default()).oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            let error: ErrorResponse = body_json(response).await;
            assert_eq!(error.error, "Missing session or page parameter");
        }
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let response = app(AppState::default())
            .oneshot(get("/api/download-page?session=nope&page=0"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.error, "Session not found or expired");
    }

    #[tokio::test]
    async fn test_page_out_of_range() {
        let state = AppState::default();
        let response = app(state.clone())
            .oneshot(split_request(
                "/api/split-pdf",
                Some("application/pdf"),
                sample_pdf(2),
            ))
            .await
            .unwrap();
        let result: SplitPdfResponse = body_json(response).await;
        let session = result.session_id.unwrap();

        let response = app(state)
            .oneshot(get(&format!("/api/download-page?session={session}&page=2")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.error, "Page not found");
    }

    #[tokio::test]
    async fn test_expired_session_is_not_found() {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(InMemorySessionStore::with_clock(
            Duration::from_secs(60),
            clock.clone(),
        ));
        let state = AppState::with_store(Config::default(), store);

        let response = app(state.clone())
            .oneshot(split_request(
                "/api/split-pdf",
                Some("application/pdf"),
                sample_pdf(1),
            ))
            .await
            .unwrap();
        let result: SplitPdfResponse = body_json(response).await;
        let url = download_path(&result.files[0]);

        let response = app(state.clone()).oneshot(get(&url)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        clock.advance(chrono::Duration::seconds(61));

        let response = app(state).oneshot(get(&url)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.error, "Session not found or expired");
    }

    #[tokio::test]
    async fn test_wrong_method_is_rejected() {
        let response = app(AppState::default())
            .oneshot(split_request(
                "/api/download-page?session=a&page=0",
                None,
                Body::empty(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}

#[cfg(test)]
mod health_endpoint {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_health_reports_live_sessions() {
        let state = AppState::default();
        let app_state = state.clone();

        let response = app(app_state)
            .oneshot(split_request(
                "/api/split-pdf",
                Some("application/pdf"),
                sample_pdf(1),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app(state).oneshot(get("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "pagesplit API");
        assert!(json["version"].is_string());
        assert_eq!(json["liveSessions"], 1);
    }
}

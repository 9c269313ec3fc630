//! Axum router construction.

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
///
/// No compression or body-rewriting layers: bodies must reach the gateway and
/// the caller byte-for-byte. Request bodies are capped at
/// `state.max_body_bytes`.
pub fn build(state: AppState) -> Router {
    let forward_route = format!("{}/*path", state.route_prefix);
    Router::new()
        .route(
            &forward_route,
            get(handlers::forward)
                .post(handlers::forward)
                .layer(DefaultBodyLimit::max(state.max_body_bytes)),
        )
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http().make_span_with(middleware::make_request_span))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::Upstream;
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request, StatusCode},
        response::IntoResponse,
        routing::post,
    };
    use common::protocol::PROXY_ERROR_HEADER;
    use http_body_util::BodyExt;
    use std::{net::SocketAddr, time::Duration};
    use tower::ServiceExt;

    async fn body_bytes(resp: axum::response::Response) -> bytes::Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    /// A stand-in gateway on a random local port.
    async fn spawn_upstream() -> SocketAddr {
        let app = Router::new()
            .route(
                "/api/echo",
                post(|headers: axum::http::HeaderMap, body: bytes::Bytes| async move {
                    let ct = headers
                        .get(CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("none")
                        .to_owned();
                    ([(CONTENT_TYPE, ct)], body)
                }),
            )
            .route(
                "/api/query-echo",
                get(|uri: axum::http::Uri| async move {
                    uri.query().unwrap_or_default().to_owned()
                }),
            )
            .route(
                "/api/teapot",
                get(|| async {
                    (
                        StatusCode::IM_A_TEAPOT,
                        [(CONTENT_TYPE, "application/problem+json")],
                        r#"{"detail":"short and stout"}"#,
                    )
                        .into_response()
                }),
            )
            .route(
                "/api/bare",
                get(|| async { axum::response::Response::new(Body::from("{}")) }),
            )
            .route(
                "/api/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .layer(DefaultBodyLimit::disable());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn app_for(addr: SocketAddr, timeout: Duration) -> Router {
        app_with_limit(addr, timeout, 10 * 1024 * 1024)
    }

    fn app_with_limit(addr: SocketAddr, timeout: Duration, max_body_bytes: usize) -> Router {
        let upstream = Upstream::new(&format!("http://{addr}"), timeout).unwrap();
        build(AppState::new(upstream, "/api/gateway".into(), max_body_bytes))
    }

    fn closed_port() -> SocketAddr {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    #[tokio::test]
    async fn unknown_route_returns_404_json() {
        let app = app_for(closed_port(), Duration::from_secs(1));
        let req = Request::builder()
            .uri("/unknown")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(body["error"], "not found");
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = app_for(closed_port(), Duration::from_secs(1));
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(&body_bytes(resp).await[..], br#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn other_methods_are_405() {
        let app = app_for(closed_port(), Duration::from_secs(1));
        let req = Request::builder()
            .method("PUT")
            .uri("/api/gateway/api/query")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn body_and_content_type_pass_through_verbatim() {
        let addr = spawn_upstream().await;
        let app = app_for(addr, Duration::from_secs(5));
        let envelope = r#"{"encrypted_data":"QUJD","encrypted_key":"REVG","iv":"AAAAAAAAAAAAAAAAAAAAAA=="}"#;

        let req = Request::builder()
            .method("POST")
            .uri("/api/gateway/api/echo")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(envelope))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
        assert!(resp.headers().get(PROXY_ERROR_HEADER).is_none());
        assert_eq!(&body_bytes(resp).await[..], envelope.as_bytes());
    }

    #[tokio::test]
    async fn missing_request_content_type_defaults_to_json() {
        let addr = spawn_upstream().await;
        let app = app_for(addr, Duration::from_secs(5));
        let req = Request::builder()
            .method("POST")
            .uri("/api/gateway/api/echo")
            .body(Body::from("{}"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn missing_response_content_type_defaults_to_json() {
        let addr = spawn_upstream().await;
        let app = app_for(addr, Duration::from_secs(5));
        let req = Request::builder()
            .uri("/api/gateway/api/bare")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn query_string_is_forwarded() {
        let addr = spawn_upstream().await;
        let app = app_for(addr, Duration::from_secs(5));
        let req = Request::builder()
            .uri("/api/gateway/api/query-echo?range=1y&interval=1d")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(&body_bytes(resp).await[..], b"range=1y&interval=1d");
    }

    #[tokio::test]
    async fn upstream_error_status_passes_through() {
        let addr = spawn_upstream().await;
        let app = app_for(addr, Duration::from_secs(5));
        let req = Request::builder()
            .uri("/api/gateway/api/teapot")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/problem+json");
        assert!(resp.headers().get(PROXY_ERROR_HEADER).is_none());
        assert_eq!(
            &body_bytes(resp).await[..],
            br#"{"detail":"short and stout"}"#
        );
    }

    #[tokio::test]
    async fn unreachable_upstream_is_502_with_marker() {
        let app = app_for(closed_port(), Duration::from_secs(5));
        let req = Request::builder()
            .method("POST")
            .uri("/api/gateway/api/query")
            .body(Body::from("{}"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(resp.headers()[PROXY_ERROR_HEADER], "unreachable");
        assert_eq!(
            &body_bytes(resp).await[..],
            br#"{"error":"proxy request failed"}"#
        );
    }

    #[tokio::test]
    async fn slow_upstream_is_504_with_marker() {
        let addr = spawn_upstream().await;
        let app = app_for(addr, Duration::from_millis(200));
        let req = Request::builder()
            .uri("/api/gateway/api/slow")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(resp.headers()[PROXY_ERROR_HEADER], "timeout");
    }

    #[tokio::test]
    async fn oversized_body_is_413_with_marker() {
        let addr = spawn_upstream().await;
        let app = app_with_limit(addr, Duration::from_secs(5), 1024);
        let req = Request::builder()
            .method("POST")
            .uri("/api/gateway/api/echo")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(vec![b'A'; 4096]))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(resp.headers()[PROXY_ERROR_HEADER], "too_large");
        assert_eq!(
            &body_bytes(resp).await[..],
            br#"{"error":"proxy request failed"}"#
        );
    }

    #[tokio::test]
    async fn body_over_axum_default_limit_is_forwarded() {
        let addr = spawn_upstream().await;
        let app = app_for(addr, Duration::from_secs(5));
        let big = vec![b'A'; 3 * 1024 * 1024];
        let req = Request::builder()
            .method("POST")
            .uri("/api/gateway/api/echo")
            .body(Body::from(big.clone()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(PROXY_ERROR_HEADER).is_none());
        assert_eq!(body_bytes(resp).await.len(), big.len());
    }
}

//! API route definitions.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::error;

use super::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/debugLogs", get(debug_logs))
}

async fn health() -> Json<Value> {
    Json(json!({
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION")
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

/// Run the privileged collector and hand its output to the browser.
async fn debug_logs(State(state): State<AppState>) -> Response {
    let collector = state.collector.clone();
    // The collector blocks until the helper exits.
    match tokio::task::spawn_blocking(move || collector.collect()).await {
        Ok(Ok(bundle)) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            bundle.into_bytes(),
        )
            .into_response(),
        Ok(Err(e)) => error_response(&e.to_string()),
        Err(e) => {
            error!(error = %e, "debug log collection task did not complete");
            error_response("debug log collection did not complete")
        }
    }
}

fn error_response(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "data": null, "meta": { "error": message } })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use crate::api::{router, state::AppState};
    use crate::debug_logs::LogCollector;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt; // for `oneshot`

    fn app(program: &str, args: &[&str]) -> axum::Router {
        router(AppState {
            collector: LogCollector::new(program, args),
        })
    }

    async fn get(app: axum::Router, uri: &str) -> axum::response::Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = get(app("true", &[]), "/api/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 10_000)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"]["status"], "ok");
        assert!(json["data"]["version"].is_string());
        assert!(json["meta"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_debug_logs_returns_bundle() {
        let response = get(
            app("sh", &["-c", "printf 'kernel: ok\\nvnc: ok\\n'"]),
            "/api/debugLogs",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );

        let body = axum::body::to_bytes(response.into_body(), 10_000)
            .await
            .unwrap();
        assert_eq!(&body[..], b"kernel: ok\nvnc: ok\n");
    }

    #[tokio::test]
    async fn test_debug_logs_failure_is_500_with_message() {
        let response = get(app("sh", &["-c", "exit 1"]), "/api/debugLogs").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), 10_000)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["data"].is_null());
        assert!(json["meta"]["error"]
            .as_str()
            .unwrap()
            .contains("non-zero exit status 1"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = get(app("true", &[]), "/api/vnc").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

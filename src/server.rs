//! HTTP dashboard: the rendered results page and a JSON export.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::LoadboardError;
use crate::group::ReportGroup;

/// Build the dashboard router over a shared report group.
pub fn router(group: Arc<ReportGroup>) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/reports", get(reports_json))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(group)
}

/// Bind and serve until the listener fails.
pub async fn serve(bind: SocketAddr, group: Arc<ReportGroup>) -> Result<(), LoadboardError> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Dashboard listening on http://{}", bind);
    axum::serve(listener, router(group))
        .await
        .map_err(|e| LoadboardError::Server(e.to_string()))
}

async fn dashboard_page(State(group): State<Arc<ReportGroup>>) -> Html<String> {
    Html(group.html())
}

async fn reports_json(State(group): State<Arc<ReportGroup>>) -> impl IntoResponse {
    match group.reports_json() {
        Ok(value) => Json(value).into_response(),
        Err(e) => {
            warn!("Failed to serialize reports: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_group() -> Arc<ReportGroup> {
        Arc::new(ReportGroup::new(&DashboardConfig::default()))
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn root_serves_the_dashboard_page() {
        let group = test_group();
        group.add_report("Workload");

        let response = router(group)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("Workload"));
    }

    #[tokio::test]
    async fn reports_endpoint_serves_json() {
        let group = test_group();
        group.add_report("Workload");

        let response = router(group)
            .oneshot(
                Request::builder()
                    .uri("/reports")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value[0]["name"], "Workload");
    }

    #[tokio::test]
    async fn reports_endpoint_with_no_reports_is_an_empty_array() {
        let response = router(test_group())
            .oneshot(
                Request::builder()
                    .uri("/reports")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "[]");
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let response = router(test_group())
            .oneshot(
                Request::builder()
                    .uri("/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

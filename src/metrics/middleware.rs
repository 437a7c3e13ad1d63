//! HTTP middleware recording request count, duration and in-flight requests.
//!
//! Paths are labeled by their route template (`/v1/diseases/:name`) so
//! label cardinality stays bounded.

use super::*;
use axum::{
    extract::{MatchedPath, Request},
    response::Response,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};

const DEFAULT_EXCLUDED: &[&str] = &["/health", "/metrics"];

/// Tower layer for metrics collection
#[derive(Clone)]
pub struct MetricsLayer {
    excluded_paths: Arc<Vec<String>>,
}

impl MetricsLayer {
    pub fn new() -> Self {
        Self::with_excluded_paths(DEFAULT_EXCLUDED.iter().map(|p| p.to_string()).collect())
    }

    pub fn with_excluded_paths(paths: Vec<String>) -> Self {
        Self {
            excluded_paths: Arc::new(paths),
        }
    }
}

impl Default for MetricsLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService {
            inner,
            excluded_paths: self.excluded_paths.clone(),
        }
    }
}

/// Tower service for metrics collection
#[derive(Clone)]
pub struct MetricsService<S> {
    inner: S,
    excluded_paths: Arc<Vec<String>>,
}

impl<S> Service<Request> for MetricsService<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let method = req.method().to_string();
        let path = route_label(&req);

        if self.excluded_paths.iter().any(|p| p == &path) {
            return Box::pin(self.inner.call(req));
        }

        HTTP_CONNECTIONS_ACTIVE.inc();
        let start = Instant::now();
        let future = self.inner.call(req);

        Box::pin(async move {
            let result = future.await;
            HTTP_CONNECTIONS_ACTIVE.dec();

            if let Ok(response) = &result {
                record(&method, &path, response, start);
            }
            result
        })
    }
}

fn route_label(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

fn record(method: &str, path: &str, response: &Response, start: Instant) {
    let status = response.status().as_u16().to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_metrics_layer_records_route_template() {
        let app = Router::new()
            .route("/items/:id", get(|| async { "ok" }))
            .route_layer(MetricsLayer::new());

        let response = app
            .oneshot(Request::builder().uri("/items/42").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let count = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/items/:id", "200"])
            .get();
        assert!(count >= 1.0);
    }

    #[tokio::test]
    async fn test_excluded_paths_are_skipped() {
        let app = Router::new()
            .route("/health", get(|| async { "OK" }))
            .route_layer(MetricsLayer::new());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let count = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/health", "200"])
            .get();
        assert_eq!(count, 0.0);
    }
}

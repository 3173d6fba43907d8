//! The mock request handler.
//!
//! [`mock_handler`] is the Axum fallback for every request. It takes one
//! snapshot of the dispatch table and serves the whole request from it:
//! resolve, simulated delay, render, configured status and headers, then
//! an append to the route's request log when recording is enabled. A
//! `HEAD` request gets the same status and headers with no body.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::recorder::RecordedRequest;
use crate::render::RenderContext;
use crate::routes::Resolution;
use crate::server::AppState;

pub async fn mock_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let path = uri.path();
    let request_id = state.stats.requests.fetch_add(1, Ordering::Relaxed) + 1;

    let table = state.table.snapshot().await;
    let (route, params) = match table.resolve(&method, path) {
        Resolution::Matched(route, params) => (route, params),
        Resolution::MethodNotAllowed(allowed) => {
            tracing::debug!(
                request_id,
                method = %method,
                path = %path,
                "method not allowed"
            );
            return method_not_allowed(&allowed);
        }
        Resolution::NotFound => {
            tracing::warn!(
                request_id,
                method = %method,
                path = %path,
                "no route matched"
            );
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    let latency = route.latency();
    if !latency.is_zero() {
        match latency.wait(state.shutting_down()).await {
            Ok(delay) => tracing::debug!(
                request_id,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "simulated latency"
            ),
            Err(e) => {
                tracing::info!(request_id, error = %e, "request aborted by shutdown");
                return StatusCode::SERVICE_UNAVAILABLE.into_response();
            }
        }
    }

    let ctx = RenderContext::from_params(route.wildcards(), &params);
    let rendered = match table.render(route, &ctx) {
        Ok(rendered) => rendered,
        Err(e) => {
            state.stats.render_failures.fetch_add(1, Ordering::Relaxed);
            tracing::error!(
                request_id,
                route = %route.pattern(),
                error = %e,
                "failed to render response"
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let length = HeaderValue::from(rendered.len());
    let response_body = if method == Method::HEAD {
        Body::empty()
    } else {
        Body::from(rendered)
    };
    let mut response = Response::new(response_body);
    *response.status_mut() = route.status();
    *response.headers_mut() = route.headers().clone();
    response.headers_mut().insert(header::CONTENT_LENGTH, length);

    tracing::info!(
        request_id,
        method = %method,
        path = %path,
        route = %route.pattern(),
        status = route.status().as_u16(),
        "request served"
    );

    if route.records() {
        let log = table.record_path(route, chrono::Local::now().date_naive());
        let url = uri.to_string();
        let request = RecordedRequest {
            method: method.as_str(),
            url: &url,
            body: &body,
        };
        if let Err(e) = state.recorder.record(&log, request).await {
            tracing::warn!(
                request_id,
                path = %log.display(),
                error = %e,
                "failed to record request"
            );
        }
    }

    response
}

fn method_not_allowed(allowed: &[Method]) -> Response {
    let list = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let mut response = StatusCode::METHOD_NOT_ALLOWED.into_response();
    if let Ok(value) = HeaderValue::from_str(&list) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

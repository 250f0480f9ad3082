use axum::{
    extract::{MatchedPath, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tracing::Instrument;

/// Route template for a request, e.g. `/blogs/{id}`, so ids stay out of log keys.
fn route_of(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

fn request_id_of(request: &Request) -> String {
    request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Run the rest of the stack inside a `request` span carrying the request id
/// and route, so handler and store logs inherit both.
pub async fn log_request(request: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "request",
        request_id = %request_id_of(&request),
        method = %request.method(),
        route = %route_of(&request),
    );

    async move {
        let start = Instant::now();
        tracing::debug!(uri = %request.uri(), "incoming request");

        let response = next.run(request).await;
        log_completion(response.status(), start.elapsed().as_millis() as u64);
        response
    }
    .instrument(span)
    .await
}

/// 5xx at error, 4xx at warn, everything else at info.
fn log_completion(status: StatusCode, duration_ms: u64) {
    if status.is_server_error() {
        tracing::error!(status = %status, duration_ms, "request failed");
    } else if status.is_client_error() {
        tracing::warn!(status = %status, duration_ms, "request rejected");
    } else {
        tracing::info!(status = %status, duration_ms, "request completed");
    }
}

pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

//! Request Forwarding
//!
//! The balancer accepts any method and path, picks the least-loaded
//! healthy backend, and replays the request against it. The response is
//! streamed back while its bytes are added to the chosen backend's
//! tally, which is what future selections key on.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{HeaderName, HeaderValue, CONNECTION, HOST, TRANSFER_ENCODING};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use tracing::{info, warn};

use crate::pool::Backend;
use crate::BalancerState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Diagnostic header naming the backend that served a traced request.
pub const LB_FROM: HeaderName = HeaderName::from_static("lb-from");

/// Fallback handler: every inbound request lands here.
pub async fn forward(State(state): State<BalancerState>, request: Request) -> Response {
    let Some(backend) = state.pool.least_loaded() else {
        warn!("no healthy backend available");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    match proxy_to(&state, Arc::clone(&backend), request).await {
        Ok(response) => response,
        Err(error) => {
            warn!(backend = backend.address(), error = %error, "forward failed");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

async fn proxy_to(
    state: &BalancerState,
    backend: Arc<Backend>,
    request: Request,
) -> Result<Response, BoxError> {
    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!(
        "{}://{}{}",
        state.config.scheme(),
        backend.address(),
        path_and_query
    );

    let body_bytes = axum::body::to_bytes(body, usize::MAX).await?;

    let mut upstream = state.client.request(parts.method.clone(), &url);
    for (name, value) in parts.headers.iter() {
        // The authority changes; framing headers are hyper's business.
        if name == &HOST || name == &CONNECTION || name == &TRANSFER_ENCODING {
            continue;
        }
        upstream = upstream.header(name, value);
    }
    let response = upstream.body(body_bytes).send().await?;

    let status = response.status();
    info!(status = %status, url = %url, "fwd");

    let mut builder = Response::builder().status(status);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in response.headers().iter() {
            if name == &CONNECTION || name == &TRANSFER_ENCODING {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }
        if state.config.trace {
            headers.insert(LB_FROM, HeaderValue::from_str(backend.address())?);
        }
    }

    // Stream the body through, tallying bytes against the chosen backend.
    let counted = response.bytes_stream().inspect(move |chunk| {
        if let Ok(chunk) = chunk {
            backend.add_bytes(chunk.len() as u64);
        }
    });

    Ok(builder.body(Body::from_stream(counted))?)
}

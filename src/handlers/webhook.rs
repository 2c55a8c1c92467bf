//! Gateway webhook endpoint: authenticate, parse, dispatch, encode.

use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    response::Response,
};
use tracing::{debug, info, warn, Level};

use crate::error::RpcError;
use crate::protocol::{RpcRequest, RpcResult};
use crate::utils::sanitize::sanitize_json;
use crate::AppState;

pub async fn payme_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let outcome = dispatch(&state, &headers, &body).await;
    state.encoder.encode(outcome)
}

pub async fn dispatch(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<RpcResult, RpcError> {
    state.authenticator.verify(headers.get(AUTHORIZATION))?;

    let request = RpcRequest::parse(body).map_err(|e| {
        warn!(cause = %e, code = e.code().code(), "Rejected webhook request");
        e
    })?;
    let method = request.method();

    if tracing::enabled!(Level::DEBUG) {
        if let Ok(raw) = serde_json::from_slice::<serde_json::Value>(body) {
            debug!(method = %method, params = %sanitize_json(&raw["params"]), "Webhook params");
        }
    }

    match state.processor.handle(request).await {
        Ok(result) => {
            info!(method = %method, "Webhook handled");
            Ok(result)
        }
        Err(e) => {
            warn!(method = %method, cause = %e, code = e.code().code(), "Webhook failed");
            Err(e)
        }
    }
}

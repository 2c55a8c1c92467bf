//! Response envelope and encoder.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{ErrorCatalog, Messages, RpcError};

/// Successful result of a webhook method; one variant per response shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RpcResult {
    Allow {
        allow: bool,
    },
    Created {
        create_time: i64,
        transaction: String,
        state: i32,
    },
    Performed {
        transaction: String,
        perform_time: i64,
        state: i32,
    },
    Cancelled {
        transaction: String,
        cancel_time: i64,
        state: i32,
    },
    Snapshot {
        create_time: i64,
        perform_time: i64,
        cancel_time: i64,
        transaction: String,
        state: i32,
        reason: Option<i32>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: i32,
    pub message: Messages,
}

/// `{"result": {...}}` or `{"error": {"code", "message"}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Envelope {
    Result(RpcResult),
    Error(ErrorBody),
}

#[derive(Debug, Clone)]
pub struct ResponseEncoder {
    catalog: Arc<ErrorCatalog>,
}

impl ResponseEncoder {
    pub fn new(catalog: Arc<ErrorCatalog>) -> Self {
        Self { catalog }
    }

    pub fn envelope(&self, outcome: Result<RpcResult, RpcError>) -> Envelope {
        match outcome {
            Ok(result) => Envelope::Result(result),
            Err(err) => {
                let code = err.code();
                Envelope::Error(ErrorBody {
                    code: code.code(),
                    message: self.catalog.messages_for(code).clone(),
                })
            }
        }
    }

    /// The gateway reads the envelope, so every reply is `200 OK`.
    pub fn encode(&self, outcome: Result<RpcResult, RpcError>) -> Response {
        (StatusCode::OK, Json(self.envelope(outcome))).into_response()
    }
}

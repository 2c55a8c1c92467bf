//! Typed webhook requests.
//!
//! The body is parsed into a generic JSON object only at this boundary; each
//! method then validates its own parameters in the order the gateway expects
//! error codes to be reported.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::error::RpcError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Method {
    CheckPerformTransaction,
    CreateTransaction,
    PerformTransaction,
    CancelTransaction,
    CheckTransaction,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::CheckPerformTransaction => "CheckPerformTransaction",
            Method::CreateTransaction => "CreateTransaction",
            Method::PerformTransaction => "PerformTransaction",
            Method::CancelTransaction => "CancelTransaction",
            Method::CheckTransaction => "CheckTransaction",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckPerformParams {
    pub amount: i64,
    pub order_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateParams {
    pub amount: i64,
    pub order_id: String,
    pub external_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRef {
    pub external_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelParams {
    pub external_id: String,
    pub reason: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcRequest {
    CheckPerformTransaction(CheckPerformParams),
    CreateTransaction(CreateParams),
    PerformTransaction(TransactionRef),
    CancelTransaction(CancelParams),
    CheckTransaction(TransactionRef),
}

impl RpcRequest {
    pub fn parse(body: &[u8]) -> Result<Self, RpcError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| RpcError::MalformedRequest(format!("body is not valid JSON: {}", e)))?;
        let Value::Object(mut envelope) = value else {
            return Err(RpcError::MalformedRequest(
                "body is not a JSON object".to_string(),
            ));
        };

        let method = envelope
            .remove("method")
            .ok_or_else(|| RpcError::MalformedRequest("missing method".to_string()))?;
        let method = Method::deserialize(method)
            .map_err(|_| RpcError::MalformedRequest("unknown method".to_string()))?;

        let params = match envelope.remove("params") {
            Some(Value::Object(params)) => params,
            _ => {
                return Err(RpcError::MalformedRequest(format!(
                    "{} requires a params object",
                    method
                )))
            }
        };

        Self::from_params(method, &params)
    }

    pub fn from_params(method: Method, params: &Map<String, Value>) -> Result<Self, RpcError> {
        let request = match method {
            Method::CheckPerformTransaction => {
                RpcRequest::CheckPerformTransaction(CheckPerformParams {
                    amount: amount(params)?,
                    order_id: order_id(params)?,
                })
            }
            Method::CreateTransaction => {
                let amount = amount(params)?;
                let order_id = order_id(params)?;
                let external_id = string_field(params, "id").ok_or_else(|| {
                    RpcError::MalformedRequest("CreateTransaction requires id".to_string())
                })?;
                RpcRequest::CreateTransaction(CreateParams {
                    amount,
                    order_id,
                    external_id,
                })
            }
            Method::PerformTransaction => RpcRequest::PerformTransaction(transaction_ref(params)?),
            Method::CancelTransaction => RpcRequest::CancelTransaction(CancelParams {
                external_id: transaction_ref(params)?.external_id,
                reason: params.get("reason").and_then(Value::as_i64),
            }),
            Method::CheckTransaction => RpcRequest::CheckTransaction(transaction_ref(params)?),
        };
        Ok(request)
    }

    pub fn method(&self) -> Method {
        match self {
            RpcRequest::CheckPerformTransaction(_) => Method::CheckPerformTransaction,
            RpcRequest::CreateTransaction(_) => Method::CreateTransaction,
            RpcRequest::PerformTransaction(_) => Method::PerformTransaction,
            RpcRequest::CancelTransaction(_) => Method::CancelTransaction,
            RpcRequest::CheckTransaction(_) => Method::CheckTransaction,
        }
    }
}

fn string_field(params: &Map<String, Value>, key: &str) -> Option<String> {
    params.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Positive integral amount in minor units.
fn amount(params: &Map<String, Value>) -> Result<i64, RpcError> {
    let value = params
        .get("amount")
        .ok_or_else(|| RpcError::InvalidAmount("missing amount".to_string()))?;

    let amount = match value.as_i64() {
        Some(amount) => amount,
        None => match value.as_f64() {
            Some(float) if float.fract() == 0.0 && float.abs() < i64::MAX as f64 => float as i64,
            Some(float) => {
                return Err(RpcError::InvalidAmount(format!(
                    "amount {} is not a whole number of minor units",
                    float
                )))
            }
            None => return Err(RpcError::InvalidAmount("amount is not a number".to_string())),
        },
    };

    if amount <= 0 {
        return Err(RpcError::InvalidAmount(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    Ok(amount)
}

fn order_id(params: &Map<String, Value>) -> Result<String, RpcError> {
    let account = params
        .get("account")
        .and_then(Value::as_object)
        .ok_or_else(|| RpcError::InvalidAccount("missing account".to_string()))?;
    string_field(account, "order_id")
        .ok_or_else(|| RpcError::InvalidAccount("missing account.order_id".to_string()))
}

fn transaction_ref(params: &Map<String, Value>) -> Result<TransactionRef, RpcError> {
    let external_id = string_field(params, "id")
        .ok_or_else(|| RpcError::InvalidAccount("missing transaction id".to_string()))?;
    Ok(TransactionRef { external_id })
}

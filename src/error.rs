use thiserror::Error;

use crate::ports::RepositoryError;

pub mod catalog;

pub use catalog::{ErrorCatalog, Messages};

/// Wire-visible error codes of the merchant API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidAmount,
    TransactionNotFound,
    OperationFailed,
    InvalidAccount,
    TransactionIdConflict,
    MalformedRequest,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 6] = [
        ErrorCode::InvalidAmount,
        ErrorCode::TransactionNotFound,
        ErrorCode::OperationFailed,
        ErrorCode::InvalidAccount,
        ErrorCode::TransactionIdConflict,
        ErrorCode::MalformedRequest,
    ];

    pub fn code(self) -> i32 {
        match self {
            ErrorCode::InvalidAmount => -31001,
            ErrorCode::TransactionNotFound => -31003,
            ErrorCode::OperationFailed => -31008,
            ErrorCode::InvalidAccount => -31050,
            ErrorCode::TransactionIdConflict => -31099,
            ErrorCode::MalformedRequest => -32504,
        }
    }
}

/// Failure of a webhook call.
///
/// Variants keep the internal cause for logs; several of them collapse onto
/// the same wire code (see [`RpcError::code`]).
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("operation failed: {0}")]
    OperationFailed(String),

    #[error("invalid account: {0}")]
    InvalidAccount(String),

    #[error("transaction id conflict: order {order_id} is bound to another transaction")]
    TransactionIdConflict { order_id: String },

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl RpcError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RpcError::InvalidAmount(_) => ErrorCode::InvalidAmount,
            RpcError::TransactionNotFound(_) => ErrorCode::TransactionNotFound,
            RpcError::OperationFailed(_) => ErrorCode::OperationFailed,
            RpcError::InvalidAccount(_) => ErrorCode::InvalidAccount,
            RpcError::TransactionIdConflict { .. } => ErrorCode::TransactionIdConflict,
            RpcError::MalformedRequest(_) | RpcError::Unauthorized => ErrorCode::MalformedRequest,
        }
    }

    /// Classifies a failed lookup by gateway id: missing rows are reported as
    /// not found, everything else as an operation failure.
    pub fn from_lookup(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(key) => RpcError::TransactionNotFound(key),
            other => RpcError::OperationFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes() {
        assert_eq!(ErrorCode::InvalidAmount.code(), -31001);
        assert_eq!(ErrorCode::TransactionNotFound.code(), -31003);
        assert_eq!(ErrorCode::OperationFailed.code(), -31008);
        assert_eq!(ErrorCode::InvalidAccount.code(), -31050);
        assert_eq!(ErrorCode::TransactionIdConflict.code(), -31099);
        assert_eq!(ErrorCode::MalformedRequest.code(), -32504);
    }

    #[test]
    fn test_unauthorized_shares_malformed_code() {
        let unauthorized = RpcError::Unauthorized;
        let malformed = RpcError::MalformedRequest("missing method".to_string());
        assert_eq!(unauthorized.code(), malformed.code());
        assert_ne!(unauthorized.to_string(), malformed.to_string());
    }

    #[test]
    fn test_lookup_classification() {
        let not_found = RpcError::from_lookup(RepositoryError::NotFound("external:1".into()));
        assert_eq!(not_found.code(), ErrorCode::TransactionNotFound);

        let db = RpcError::from_lookup(RepositoryError::Database("connection reset".into()));
        assert_eq!(db.code(), ErrorCode::OperationFailed);

        let conflict = RpcError::from_lookup(RepositoryError::Conflict("7-1".into()));
        assert_eq!(conflict.code(), ErrorCode::OperationFailed);
    }
}

//! Storage port consumed by the transaction state machine.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::domain::{Transaction, TransactionState};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("transaction not found: {0}")]
    NotFound(String),

    /// The conditional update lost: the stored state or bound external id
    /// no longer matches what the caller read.
    #[error("conflicting update on transaction {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("row not found".to_string()),
            other => RepositoryError::Database(other.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Lookup key: the merchant order id or the gateway transaction id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKey {
    Order(String),
    External(String),
}

impl fmt::Display for TransactionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKey::Order(id) => write!(f, "order:{}", id),
            TransactionKey::External(id) => write!(f, "external:{}", id),
        }
    }
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Whether a `Created` transaction exists for this order with exactly this amount.
    async fn exists_payable(&self, order_id: &str, amount: i64) -> RepositoryResult<bool>;

    async fn get(&self, key: &TransactionKey) -> RepositoryResult<Transaction>;

    /// Persists `tx` only if the stored state still equals `expected` and the
    /// stored external id is unset or equal to `tx.external_id`. Otherwise
    /// returns `RepositoryError::Conflict` and leaves the row untouched.
    async fn update(&self, tx: &Transaction, expected: TransactionState) -> RepositoryResult<()>;

    async fn insert(&self, tx: &Transaction) -> RepositoryResult<Transaction>;

    async fn ping(&self) -> RepositoryResult<()>;
}

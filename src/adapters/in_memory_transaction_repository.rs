//! In-memory implementation of TransactionRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{Transaction, TransactionState};
use crate::ports::{RepositoryError, RepositoryResult, TransactionKey, TransactionRepository};

/// Thread-safe in-memory store keyed by order id.
///
/// The conditional update runs under the write lock, so concurrent callers
/// observe the same compare-and-set semantics as the Postgres adapter.
#[derive(Default, Clone)]
pub struct InMemoryTransactionRepository {
    transactions: Arc<RwLock<HashMap<String, Transaction>>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn exists_payable(&self, order_id: &str, amount: i64) -> RepositoryResult<bool> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(order_id).is_some_and(|tx| {
            tx.amount == amount && tx.state == TransactionState::Created
        }))
    }

    async fn get(&self, key: &TransactionKey) -> RepositoryResult<Transaction> {
        let transactions = self.transactions.read().await;
        let found = match key {
            TransactionKey::Order(id) => transactions.get(id),
            TransactionKey::External(id) => transactions
                .values()
                .find(|tx| tx.external_id.as_deref() == Some(id.as_str())),
        };
        found
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(key.to_string()))
    }

    async fn update(&self, tx: &Transaction, expected: TransactionState) -> RepositoryResult<()> {
        let mut transactions = self.transactions.write().await;

        if let Some(external_id) = &tx.external_id {
            let taken = transactions
                .values()
                .any(|other| other.id != tx.id && other.external_id.as_ref() == Some(external_id));
            if taken {
                return Err(RepositoryError::Conflict(tx.id.clone()));
            }
        }

        let stored = transactions
            .get_mut(&tx.id)
            .ok_or_else(|| RepositoryError::Conflict(tx.id.clone()))?;

        let id_matches = match (&stored.external_id, &tx.external_id) {
            (None, _) => true,
            (Some(bound), Some(candidate)) => bound == candidate,
            (Some(_), None) => false,
        };
        if stored.state != expected || !id_matches {
            return Err(RepositoryError::Conflict(tx.id.clone()));
        }

        stored.state = tx.state;
        stored.external_id = tx.external_id.clone();
        stored.perform_time = tx.perform_time;
        stored.cancel_time = tx.cancel_time;
        Ok(())
    }

    async fn insert(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        let mut transactions = self.transactions.write().await;
        if transactions.contains_key(&tx.id) {
            return Err(RepositoryError::Database(format!(
                "duplicate order id {}",
                tx.id
            )));
        }
        transactions.insert(tx.id.clone(), tx.clone());
        Ok(tx.clone())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

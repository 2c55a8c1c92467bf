//! Place order use case.
//! Registers a payable order and returns the checkout link the payer follows.

use chrono::Utc;
use std::sync::Arc;

use crate::config::PaymeSettings;
use crate::domain::Transaction;
use crate::ports::{RepositoryError, TransactionRepository};
use crate::services::build_checkout_link;
use thiserror::Error;

/// Minor units per whole currency unit (tiyin per sum).
pub const MINOR_UNITS: i64 = 100;

/// Input for the PlaceOrder use case.
#[derive(Debug)]
pub struct PlaceOrderInput {
    pub user_id: i64,
    /// Whole currency units.
    pub amount: i64,
    pub return_url: String,
}

/// Output of the PlaceOrder use case.
#[derive(Debug)]
pub struct PlaceOrderOutput {
    pub order_id: String,
    /// Minor currency units, as stored and as the gateway will send it back.
    pub amount: i64,
    pub checkout_url: String,
}

#[derive(Error, Debug)]
pub enum PlaceOrderError {
    #[error("order amount must be a positive number of whole units, got {0}")]
    InvalidAmount(i64),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Use case for placing orders.
pub struct PlaceOrder {
    transaction_repository: Arc<dyn TransactionRepository>,
    settings: PaymeSettings,
}

impl PlaceOrder {
    pub fn new(transaction_repository: Arc<dyn TransactionRepository>, settings: PaymeSettings) -> Self {
        Self {
            transaction_repository,
            settings,
        }
    }

    pub async fn execute(&self, input: PlaceOrderInput) -> Result<PlaceOrderOutput, PlaceOrderError> {
        let amount = input
            .amount
            .checked_mul(MINOR_UNITS)
            .filter(|amount| *amount > 0)
            .ok_or(PlaceOrderError::InvalidAmount(input.amount))?;

        let now = Utc::now();
        let order_id = format!("{}-{}", input.user_id, now.timestamp());
        let tx = Transaction::new(order_id, input.user_id, amount, now);

        let inserted = self.transaction_repository.insert(&tx).await?;
        tracing::info!(order_id = %inserted.id, amount = inserted.amount, "Order placed");

        let checkout_url = build_checkout_link(
            &self.settings.base_url,
            &self.settings.merchant_id,
            &inserted.id,
            inserted.amount,
            &input.return_url,
        );

        Ok(PlaceOrderOutput {
            order_id: inserted.id,
            amount: inserted.amount,
            checkout_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryTransactionRepository;
    use crate::domain::TransactionState;
    use crate::ports::TransactionKey;

    fn settings() -> PaymeSettings {
        PaymeSettings {
            key: "secret".to_string(),
            merchant_id: "merchant-1".to_string(),
            base_url: "https://test.paycom.uz".to_string(),
        }
    }

    #[tokio::test]
    async fn test_place_order_stores_minor_units() {
        let repo = InMemoryTransactionRepository::new();
        let use_case = PlaceOrder::new(Arc::new(repo.clone()), settings());

        let output = use_case
            .execute(PlaceOrderInput {
                user_id: 123,
                amount: 100,
                return_url: "http://example.com/callback".to_string(),
            })
            .await
            .unwrap();

        assert!(output.order_id.starts_with("123-"));
        assert_eq!(output.amount, 10_000);
        assert!(output.checkout_url.starts_with("https://test.paycom.uz/"));

        let stored = repo.get(&TransactionKey::Order(output.order_id)).await.unwrap();
        assert_eq!(stored.state, TransactionState::Created);
        assert_eq!(stored.amount, 10_000);
        assert!(stored.external_id.is_none());
    }

    #[tokio::test]
    async fn test_place_order_rejects_non_positive_amount() {
        let repo = InMemoryTransactionRepository::new();
        let use_case = PlaceOrder::new(Arc::new(repo), settings());

        let result = use_case
            .execute(PlaceOrderInput {
                user_id: 1,
                amount: 0,
                return_url: "http://example.com".to_string(),
            })
            .await;
        assert!(matches!(result, Err(PlaceOrderError::InvalidAmount(0))));
    }
}

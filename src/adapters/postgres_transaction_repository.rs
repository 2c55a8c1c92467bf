//! Postgres implementation of TransactionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Transaction, TransactionState};
use crate::ports::{RepositoryError, RepositoryResult, TransactionKey, TransactionRepository};

/// Postgres-backed transaction repository.
#[derive(Clone)]
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn exists_payable(&self, order_id: &str, amount: i64) -> RepositoryResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM payme_transactions WHERE id = $1 AND amount = $2 AND state = $3)",
        )
        .bind(order_id)
        .bind(amount)
        .bind(TransactionState::Created.code())
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from)
    }

    async fn get(&self, key: &TransactionKey) -> RepositoryResult<Transaction> {
        let (sql, value) = match key {
            TransactionKey::Order(id) => ("SELECT * FROM payme_transactions WHERE id = $1", id),
            TransactionKey::External(id) => {
                ("SELECT * FROM payme_transactions WHERE external_id = $1", id)
            }
        };

        let row = sqlx::query_as::<_, TransactionRow>(sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        row.ok_or_else(|| RepositoryError::NotFound(key.to_string()))?
            .into_domain()
    }

    async fn update(&self, tx: &Transaction, expected: TransactionState) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE payme_transactions
            SET state = $2,
                external_id = $3,
                perform_time = $4,
                cancel_time = $5
            WHERE id = $1
              AND state = $6
              AND (external_id IS NULL OR external_id = $3)
            "#,
        )
        .bind(&tx.id)
        .bind(tx.state.code())
        .bind(&tx.external_id)
        .bind(tx.perform_time)
        .bind(tx.cancel_time)
        .bind(expected.code())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // external_id is UNIQUE: another order already holds this gateway id
            let taken = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
            if taken {
                RepositoryError::Conflict(tx.id.clone())
            } else {
                RepositoryError::from(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(tx.id.clone()));
        }

        Ok(())
    }

    async fn insert(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO payme_transactions (
                id, external_id, user_id, amount, state,
                create_time, perform_time, cancel_time
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&tx.id)
        .bind(&tx.external_id)
        .bind(tx.user_id)
        .bind(tx.amount)
        .bind(tx.state.code())
        .bind(tx.create_time)
        .bind(tx.perform_time)
        .bind(tx.cancel_time)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        row.into_domain()
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    external_id: Option<String>,
    user_id: i64,
    amount: i64,
    state: i32,
    create_time: DateTime<Utc>,
    perform_time: Option<DateTime<Utc>>,
    cancel_time: Option<DateTime<Utc>>,
}

impl TransactionRow {
    fn into_domain(self) -> RepositoryResult<Transaction> {
        let state = TransactionState::from_code(self.state).ok_or_else(|| {
            RepositoryError::Database(format!(
                "transaction {} has unknown state {}",
                self.id, self.state
            ))
        })?;

        Ok(Transaction {
            id: self.id,
            external_id: self.external_id,
            user_id: self.user_id,
            amount: self.amount,
            state,
            create_time: self.create_time,
            perform_time: self.perform_time,
            cancel_time: self.cancel_time,
        })
    }
}

//! Transaction state machine behind the five gateway methods.
//!
//! Every mutation goes through the repository's conditional update with the
//! state that was read as the expected state. A lost race is answered by
//! re-reading the row and replaying what the winner stored, so duplicate
//! deliveries never mutate a transaction twice.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::{epoch_millis, Transaction, TransactionState};
use crate::error::RpcError;
use crate::ports::{RepositoryError, TransactionKey, TransactionRepository};
use crate::protocol::request::{CancelParams, CheckPerformParams, CreateParams, TransactionRef};
use crate::protocol::{RpcRequest, RpcResult};

/// Allowed clock skew between a stored `create_time` and now.
const CREATE_TIME_TOLERANCE_MS: i64 = 1_000;

#[derive(Clone)]
pub struct TransactionProcessor {
    repository: Arc<dyn TransactionRepository>,
}

impl TransactionProcessor {
    pub fn new(repository: Arc<dyn TransactionRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, request: RpcRequest) -> Result<RpcResult, RpcError> {
        match request {
            RpcRequest::CheckPerformTransaction(params) => self.check_perform(params).await,
            RpcRequest::CreateTransaction(params) => self.create(params).await,
            RpcRequest::PerformTransaction(params) => self.perform(params).await,
            RpcRequest::CancelTransaction(params) => self.cancel(params).await,
            RpcRequest::CheckTransaction(params) => self.check(params).await,
        }
    }

    pub async fn check_perform(&self, params: CheckPerformParams) -> Result<RpcResult, RpcError> {
        let payable = self
            .repository
            .exists_payable(&params.order_id, params.amount)
            .await
            .map_err(|e| {
                error!(order_id = %params.order_id, error = %e, "Payability check failed");
                RpcError::OperationFailed(e.to_string())
            })?;

        if !payable {
            return Err(RpcError::InvalidAccount(format!(
                "no payable order {} for amount {}",
                params.order_id, params.amount
            )));
        }

        Ok(RpcResult::Allow { allow: true })
    }

    pub async fn create(&self, params: CreateParams) -> Result<RpcResult, RpcError> {
        let tx = self.load_order(&params.order_id).await?;
        validate_create(&tx, &params)?;

        let mut bound = tx.clone();
        bound.external_id = Some(params.external_id.clone());

        match self.repository.update(&bound, TransactionState::Created).await {
            Ok(()) => {
                info!(
                    order_id = %tx.id,
                    external_id = %params.external_id,
                    "Transaction bound to gateway id"
                );
            }
            Err(RepositoryError::Conflict(_)) => {
                let current = self.load_order(&params.order_id).await?;
                validate_create(&current, &params)?;
                if current.external_id.as_deref() != Some(params.external_id.as_str()) {
                    // row unchanged, so the gateway id is held by another order
                    return Err(RpcError::TransactionIdConflict {
                        order_id: params.order_id,
                    });
                }
                debug!(order_id = %tx.id, "Concurrent create already bound the same id");
            }
            Err(e) => {
                error!(order_id = %tx.id, error = %e, "Failed to bind gateway id");
                return Err(RpcError::OperationFailed(e.to_string()));
            }
        }

        Ok(RpcResult::Created {
            create_time: tx.create_time.timestamp_millis(),
            transaction: params.external_id,
            state: TransactionState::Created.code(),
        })
    }

    pub async fn perform(&self, params: TransactionRef) -> Result<RpcResult, RpcError> {
        let key = TransactionKey::External(params.external_id.clone());
        let tx = self.lookup(&key).await?;

        let Some(performed) = tx.performed(Utc::now()) else {
            debug!(external_id = %params.external_id, state = %tx.state, "Replaying perform");
            return Ok(performed_result(&tx, params.external_id));
        };

        match self.repository.update(&performed, tx.state).await {
            Ok(()) => {
                info!(order_id = %tx.id, external_id = %params.external_id, "Transaction performed");
                Ok(performed_result(&performed, params.external_id))
            }
            Err(RepositoryError::Conflict(_)) => {
                warn!(external_id = %params.external_id, "Lost perform race, replaying stored state");
                let current = self.lookup(&key).await?;
                Ok(performed_result(&current, params.external_id))
            }
            Err(e) => {
                error!(external_id = %params.external_id, error = %e, "Failed to persist perform");
                Err(RpcError::OperationFailed(e.to_string()))
            }
        }
    }

    pub async fn cancel(&self, params: CancelParams) -> Result<RpcResult, RpcError> {
        let key = TransactionKey::External(params.external_id.clone());
        let tx = self.lookup(&key).await?;

        let Some(cancelled) = tx.cancelled(Utc::now()) else {
            debug!(external_id = %params.external_id, state = %tx.state, "Replaying cancel");
            return Ok(cancelled_result(&tx, params.external_id));
        };

        match self.repository.update(&cancelled, tx.state).await {
            Ok(()) => {
                info!(
                    order_id = %tx.id,
                    external_id = %params.external_id,
                    state = %cancelled.state,
                    reason = ?params.reason,
                    "Transaction cancelled"
                );
                Ok(cancelled_result(&cancelled, params.external_id))
            }
            Err(RepositoryError::Conflict(_)) => {
                // A concurrent perform may have won; retry once from the new state.
                let current = self.lookup(&key).await?;
                match current.cancelled(Utc::now()) {
                    None => Ok(cancelled_result(&current, params.external_id)),
                    Some(next) => match self.repository.update(&next, current.state).await {
                        Ok(()) => Ok(cancelled_result(&next, params.external_id)),
                        Err(RepositoryError::Conflict(_)) => {
                            let latest = self.lookup(&key).await?;
                            Ok(cancelled_result(&latest, params.external_id))
                        }
                        Err(e) => Err(RpcError::OperationFailed(e.to_string())),
                    },
                }
            }
            Err(e) => {
                error!(external_id = %params.external_id, error = %e, "Failed to persist cancel");
                Err(RpcError::OperationFailed(e.to_string()))
            }
        }
    }

    pub async fn check(&self, params: TransactionRef) -> Result<RpcResult, RpcError> {
        let tx = self
            .lookup(&TransactionKey::External(params.external_id.clone()))
            .await?;

        Ok(RpcResult::Snapshot {
            create_time: tx.create_time.timestamp_millis(),
            perform_time: epoch_millis(tx.perform_time),
            cancel_time: epoch_millis(tx.cancel_time),
            transaction: params.external_id,
            state: tx.state.code(),
            reason: tx.state.cancel_reason(),
        })
    }

    async fn load_order(&self, order_id: &str) -> Result<Transaction, RpcError> {
        self.repository
            .get(&TransactionKey::Order(order_id.to_string()))
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => {
                    RpcError::InvalidAccount(format!("order {} does not exist", order_id))
                }
                other => {
                    error!(order_id = %order_id, error = %other, "Order lookup failed");
                    RpcError::OperationFailed(other.to_string())
                }
            })
    }

    async fn lookup(&self, key: &TransactionKey) -> Result<Transaction, RpcError> {
        self.repository.get(key).await.map_err(|e| {
            if !matches!(e, RepositoryError::NotFound(_)) {
                error!(key = %key, error = %e, "Transaction lookup failed");
            }
            RpcError::from_lookup(e)
        })
    }
}

fn validate_create(tx: &Transaction, params: &CreateParams) -> Result<(), RpcError> {
    if tx.is_bound_to_other(&params.external_id) {
        return Err(RpcError::TransactionIdConflict {
            order_id: tx.id.clone(),
        });
    }

    if tx.state != TransactionState::Created {
        return Err(RpcError::InvalidAccount(format!(
            "order {} is already {}",
            tx.id, tx.state
        )));
    }

    if tx.amount != params.amount {
        return Err(RpcError::InvalidAmount(format!(
            "order {} expects {}, got {}",
            tx.id, tx.amount, params.amount
        )));
    }

    let limit = Utc::now() + Duration::milliseconds(CREATE_TIME_TOLERANCE_MS);
    if tx.create_time > limit {
        return Err(RpcError::OperationFailed(format!(
            "order {} was created in the future ({})",
            tx.id, tx.create_time
        )));
    }

    Ok(())
}

fn performed_result(tx: &Transaction, external_id: String) -> RpcResult {
    RpcResult::Performed {
        transaction: external_id,
        perform_time: epoch_millis(tx.perform_time),
        state: tx.state.code(),
    }
}

fn cancelled_result(tx: &Transaction, external_id: String) -> RpcResult {
    RpcResult::Cancelled {
        transaction: external_id,
        cancel_time: epoch_millis(tx.cancel_time),
        state: tx.state.code(),
    }
}

//! Transaction domain entity.
//! Framework-agnostic mirror of a local order as seen by the payment gateway.

use chrono::{DateTime, Utc};
use std::fmt;

/// Lifecycle state of a gateway transaction. The discriminants are the
/// values the gateway sees on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Created,
    Performed,
    Cancelled,
    CancelledAfterPerform,
}

impl TransactionState {
    pub fn code(self) -> i32 {
        match self {
            TransactionState::Created => 1,
            TransactionState::Performed => 2,
            TransactionState::Cancelled => -1,
            TransactionState::CancelledAfterPerform => -2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(TransactionState::Created),
            2 => Some(TransactionState::Performed),
            -1 => Some(TransactionState::Cancelled),
            -2 => Some(TransactionState::CancelledAfterPerform),
            _ => None,
        }
    }

    pub fn is_cancelled(self) -> bool {
        matches!(
            self,
            TransactionState::Cancelled | TransactionState::CancelledAfterPerform
        )
    }

    pub fn is_performed(self) -> bool {
        matches!(
            self,
            TransactionState::Performed | TransactionState::CancelledAfterPerform
        )
    }

    /// Gateway reason code reported by CheckTransaction.
    pub fn cancel_reason(self) -> Option<i32> {
        match self {
            TransactionState::Cancelled => Some(CANCEL_REASON_BEFORE_PERFORM),
            TransactionState::CancelledAfterPerform => Some(CANCEL_REASON_AFTER_PERFORM),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionState::Created => "created",
            TransactionState::Performed => "performed",
            TransactionState::Cancelled => "cancelled",
            TransactionState::CancelledAfterPerform => "cancelled_after_perform",
        };
        write!(f, "{}", name)
    }
}

pub const CANCEL_REASON_BEFORE_PERFORM: i32 = 3;
pub const CANCEL_REASON_AFTER_PERFORM: i32 = 5;

/// Domain entity representing a gateway transaction bound to a local order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Merchant-side order key.
    pub id: String,
    /// Gateway-assigned transaction id, bound at most once.
    pub external_id: Option<String>,
    pub user_id: i64,
    /// Minor currency units.
    pub amount: i64,
    pub state: TransactionState,
    pub create_time: DateTime<Utc>,
    pub perform_time: Option<DateTime<Utc>>,
    pub cancel_time: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(id: String, user_id: i64, amount: i64, create_time: DateTime<Utc>) -> Self {
        Self {
            id,
            external_id: None,
            user_id,
            amount,
            state: TransactionState::Created,
            create_time,
            perform_time: None,
            cancel_time: None,
        }
    }

    /// True when `external_id` is bound to something other than `candidate`.
    pub fn is_bound_to_other(&self, candidate: &str) -> bool {
        matches!(&self.external_id, Some(bound) if bound != candidate)
    }

    /// Returns the performed copy of a `Created` transaction, or `None` when
    /// the current state has no edge to `Performed`.
    pub fn performed(&self, at: DateTime<Utc>) -> Option<Self> {
        if self.state != TransactionState::Created {
            return None;
        }
        Some(Self {
            state: TransactionState::Performed,
            perform_time: Some(at),
            ..self.clone()
        })
    }

    /// Returns the cancelled copy, or `None` from a terminal state.
    pub fn cancelled(&self, at: DateTime<Utc>) -> Option<Self> {
        if self.state.is_cancelled() {
            return None;
        }
        let state = if self.state.is_performed() {
            TransactionState::CancelledAfterPerform
        } else {
            TransactionState::Cancelled
        };
        Some(Self {
            state,
            cancel_time: Some(at),
            ..self.clone()
        })
    }
}

/// Milliseconds since the epoch, `0` when unset.
pub fn epoch_millis(time: Option<DateTime<Utc>>) -> i64 {
    time.map(|t| t.timestamp_millis()).unwrap_or(0)
}

pub mod transaction;

pub use transaction::{epoch_millis, Transaction, TransactionState};

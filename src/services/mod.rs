pub mod checkout_link;
pub mod transaction_processor;

pub use checkout_link::build_checkout_link;
pub use transaction_processor::TransactionProcessor;

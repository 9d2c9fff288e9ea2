// Services - Facades over the entity operations

pub mod transaction;

pub use transaction::TransactionService;

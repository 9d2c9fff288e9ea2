// Multi-Bank Ledger - Core Library
// Banks, users and accounts, and transfers between users across banks.
// Exposes all modules for use in the CLI and tests.

pub mod config;
pub mod entities;
pub mod error;
pub mod ids;
pub mod registry;
pub mod script;
pub mod services;
pub mod transfer;

// Re-export commonly used types
pub use config::LedgerConfig;
pub use entities::{Bank, BankAccount, FundingLeg, FundingPolicy, User};
pub use error::{LedgerError, Result};
pub use ids::{generate_id, AccountId, BankId, UserId};
pub use registry::{Registry, RegistryCounts, SharedRegistry, Snapshot};
pub use script::{load_script, parse_script, RunReport, ScriptRunner, ScriptStep};
pub use services::TransactionService;
pub use transfer::TransferReceipt;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

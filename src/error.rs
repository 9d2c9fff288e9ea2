// ⚠️ Ledger Errors - Every failure is explicit and aborts the operation
//
// No retries and no partial-failure recovery: callers decide how to
// surface these.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    // ========================================================================
    // AMOUNT / BALANCE
    // ========================================================================
    /// Non-positive amount passed to deposit, withdraw or send
    #[error("Amount must be positive, got {amount}")]
    InvalidAmount { amount: Decimal },

    /// Withdrawal or transfer exceeds the policy-adjusted balance
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Decimal, available: Decimal },

    /// Balance arithmetic would leave the representable decimal range
    #[error("Amount {amount} overflows the balance of account {account_id}")]
    AmountOverflow { account_id: String, amount: Decimal },

    // ========================================================================
    // LOOKUP
    // ========================================================================
    #[error("Account {account_id} not found in bank {bank_id}")]
    AccountNotFound { account_id: String, bank_id: String },

    #[error("User {user_id} not found")]
    UserNotFound { user_id: String },

    #[error("Bank {bank_id} not found")]
    BankNotFound { bank_id: String },

    // ========================================================================
    // TRANSFER COUNTERPARTS
    // ========================================================================
    /// Sender owns no account in the sending bank
    #[error("User {user_id} has no accounts in bank {bank_id}")]
    NoAccountsInBank { user_id: String, bank_id: String },

    /// Recipient owns no account in the target bank
    #[error("Recipient {user_id} has no accounts in bank {bank_id}")]
    NoRecipientAccount { user_id: String, bank_id: String },

    #[error("Source bank ID is required")]
    MissingSourceBank,

    // ========================================================================
    // OWNERSHIP
    // ========================================================================
    /// Account handed to a bank it does not belong to
    #[error("Account {account_id} belongs to another bank than {bank_id}")]
    ForeignAccount { account_id: String, bank_id: String },

    /// Account negative-balance policy differs from its bank's
    #[error("Account {account_id} negative-balance policy differs from bank {bank_id}")]
    PolicyMismatch { account_id: String, bank_id: String },

    // ========================================================================
    // SHARED STATE
    // ========================================================================
    #[error("Registry lock poisoned")]
    LockPoisoned,
}

impl LedgerError {
    /// Short machine-friendly name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount { .. } => "InvalidAmount",
            LedgerError::InsufficientFunds { .. } => "InsufficientFunds",
            LedgerError::AmountOverflow { .. } => "AmountOverflow",
            LedgerError::AccountNotFound { .. } => "AccountNotFound",
            LedgerError::UserNotFound { .. } => "UserNotFound",
            LedgerError::BankNotFound { .. } => "BankNotFound",
            LedgerError::NoAccountsInBank { .. } => "NoAccountsInBank",
            LedgerError::NoRecipientAccount { .. } => "NoRecipientAccount",
            LedgerError::MissingSourceBank => "MissingSourceBank",
            LedgerError::ForeignAccount { .. } => "ForeignAccount",
            LedgerError::PolicyMismatch { .. } => "PolicyMismatch",
            LedgerError::LockPoisoned => "LockPoisoned",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_messages() {
        let err = LedgerError::InsufficientFunds {
            requested: dec!(150),
            available: dec!(100),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: requested 150, available 100"
        );
        assert_eq!(err.kind(), "InsufficientFunds");

        let err = LedgerError::UserNotFound { user_id: "u1".to_string() };
        assert_eq!(err.to_string(), "User u1 not found");
    }
}

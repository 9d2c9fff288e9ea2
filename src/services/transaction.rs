// 💸 Transaction Service - Transfer facade resolving the real source bank
//
// The source bank is looked up in the Registry; a transfer is never run
// against a freshly built, unregistered Bank.

use crate::error::{LedgerError, Result};
use crate::registry::Registry;
use crate::transfer::TransferReceipt;
use rust_decimal::Decimal;
use tracing::debug;

pub struct TransactionService;

impl TransactionService {
    /// Validate transfer parameters
    pub fn validate_transfer(_from_user_id: &str, _to_user_id: &str, amount: Decimal) -> bool {
        amount > Decimal::ZERO
    }

    /// Transfer funds between users through the bank `from_bank_id`
    pub fn transfer(
        registry: &mut Registry,
        from_user_id: &str,
        to_user_id: &str,
        amount: Decimal,
        from_bank_id: Option<&str>,
        to_bank_id: Option<&str>,
    ) -> Result<TransferReceipt> {
        let from_bank_id = from_bank_id.ok_or(LedgerError::MissingSourceBank)?;

        if !Self::validate_transfer(from_user_id, to_user_id, amount) {
            return Err(LedgerError::InvalidAmount { amount });
        }

        let bank_id = registry.require_bank(from_bank_id)?.id().to_string();
        debug!(%bank_id, "source bank resolved");

        registry.send(&bank_id, from_user_id, to_user_id, amount, to_bank_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_transfer() {
        assert!(TransactionService::validate_transfer("a", "b", dec!(0.01)));
        assert!(!TransactionService::validate_transfer("a", "b", dec!(0)));
        assert!(!TransactionService::validate_transfer("a", "b", dec!(-3)));
    }

    #[test]
    fn test_transfer_requires_source_bank() {
        let mut registry = Registry::new();
        let err = TransactionService::transfer(&mut registry, "a", "b", dec!(1), None, None)
            .unwrap_err();
        assert_eq!(err, LedgerError::MissingSourceBank);
    }

    #[test]
    fn test_transfer_unknown_source_bank() {
        let mut registry = Registry::new();
        let err = TransactionService::transfer(&mut registry, "a", "b", dec!(1), Some("ghost"), None)
            .unwrap_err();
        assert_eq!(err.kind(), "BankNotFound");
    }

    #[test]
    fn test_transfer_invalid_amount() {
        let mut registry = Registry::new();
        let bank_id = registry.create_bank(false);
        let err = TransactionService::transfer(&mut registry, "a", "b", dec!(-1), Some(bank_id.as_str()), None)
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidAmount");
    }

    #[test]
    fn test_transfer_uses_registered_bank() {
        let mut registry = Registry::new();
        let bank_id = registry.create_bank(false);
        let alice = registry.create_user("Alice");
        let bob = registry.create_user("Bob");
        let a1 = registry.open_account(&alice, &bank_id, dec!(100)).unwrap();
        let b1 = registry.open_account(&bob, &bank_id, dec!(0)).unwrap();

        let receipt = TransactionService::transfer(
            &mut registry,
            &alice,
            &bob,
            dec!(25),
            Some(bank_id.as_str()),
            None,
        )
        .unwrap();

        assert_eq!(receipt.source_bank, bank_id);
        assert_eq!(registry.get_account(&a1).unwrap().balance(), dec!(75));
        assert_eq!(registry.get_account(&b1).unwrap().balance(), dec!(25));
    }
}

// 💳 BankAccount Entity - Balance held at one bank
//
// Identity: UUID (never changes)
// Relationship: bank_id → owning Bank
// Policy: allow_negative, inherited from the bank at creation
//
// The balance only moves through deposit/withdraw, so the
// negative-balance policy is enforced in exactly one place.

use crate::error::{LedgerError, Result};
use crate::ids::{generate_id, AccountId, BankId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    /// Stable identity (UUID) - NEVER changes
    id: AccountId,

    /// Current balance (may be negative when the policy allows it)
    balance: Decimal,

    /// Bank ID (foreign key to owning Bank)
    bank_id: BankId,

    /// Whether withdrawals may take the balance below zero
    allow_negative: bool,

    /// When the account was opened
    opened_at: DateTime<Utc>,
}

impl BankAccount {
    /// Create new account with UUID
    ///
    /// Plain constructor: the account is not registered anywhere until a
    /// Bank or the Registry stores it.
    pub fn new(bank_id: impl Into<BankId>, initial_balance: Decimal, allow_negative: bool) -> Self {
        BankAccount {
            id: generate_id(),
            balance: initial_balance,
            bank_id: bank_id.into(),
            allow_negative,
            opened_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn bank_id(&self) -> &str {
        &self.bank_id
    }

    pub fn allows_negative(&self) -> bool {
        self.allow_negative
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Add funds
    pub fn deposit(&mut self, amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount { amount });
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| self.overflow(amount))?;
        Ok(())
    }

    /// Remove funds, honouring the negative-balance policy
    pub fn withdraw(&mut self, amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount { amount });
        }

        if !self.allow_negative && self.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            });
        }

        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or_else(|| self.overflow(amount))?;
        Ok(())
    }

    /// Always true when negative balances are allowed
    pub fn has_sufficient_funds(&self, amount: Decimal) -> bool {
        self.allow_negative || self.balance >= amount
    }

    /// Check if account is overdrawn (negative balance)
    pub fn is_overdrawn(&self) -> bool {
        self.balance < Decimal::ZERO
    }

    fn overflow(&self, amount: Decimal) -> LedgerError {
        LedgerError::AmountOverflow {
            account_id: self.id.clone(),
            amount,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

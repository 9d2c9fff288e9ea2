// 🏦 Bank Entity - Owns accounts, decides who pays for a transfer
//
// Identity: UUID (never changes)
// Policy: allow_negative (copied into every account it opens)
// Policy: funding_policy (how payer accounts are picked in `send`)
//
// The transfer itself (`Registry::send`) needs the other users and banks,
// so it is driven from the Registry. Everything that only depends on this
// bank's own accounts lives here.

use crate::entities::BankAccount;
use crate::error::{LedgerError, Result};
use crate::ids::{generate_id, AccountId, BankId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

// ============================================================================
// FUNDING POLICY
// ============================================================================

/// How the payer side of a transfer is funded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingPolicy {
    /// Take from successive accounts until the amount is covered.
    /// A bank allowing negative balances charges the first account in full.
    #[default]
    Split,

    /// Charge the first account that can cover the whole amount
    SingleAccount,
}

impl FundingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FundingPolicy::Split => "split",
            FundingPolicy::SingleAccount => "single",
        }
    }
}

impl fmt::Display for FundingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FundingPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "split" | "multi" => Ok(FundingPolicy::Split),
            "single" | "single_account" => Ok(FundingPolicy::SingleAccount),
            other => Err(format!("unknown funding policy: {}", other)),
        }
    }
}

// ============================================================================
// FUNDING LEG
// ============================================================================

/// One withdrawal in a transfer: `amount` taken from `account_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingLeg {
    pub account_id: AccountId,
    pub amount: Decimal,
}

// ============================================================================
// BANK ENTITY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bank {
    /// Stable identity (UUID) - NEVER changes
    id: BankId,

    /// Applied to every account this bank opens
    allow_negative: bool,

    funding_policy: FundingPolicy,

    /// Accounts owned by this bank (every one has bank_id == id)
    accounts: HashMap<AccountId, BankAccount>,
}

impl Bank {
    /// Create new bank with the default (split) funding policy
    pub fn new(allow_negative: bool) -> Self {
        Self::with_policy(allow_negative, FundingPolicy::default())
    }

    pub fn with_policy(allow_negative: bool, funding_policy: FundingPolicy) -> Self {
        Bank {
            id: generate_id(),
            allow_negative,
            funding_policy,
            accounts: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn allows_negative_balance(&self) -> bool {
        self.allow_negative
    }

    pub fn funding_policy(&self) -> FundingPolicy {
        self.funding_policy
    }

    pub fn set_funding_policy(&mut self, policy: FundingPolicy) {
        self.funding_policy = policy;
    }

    /// Open a new account inheriting this bank's negative-balance policy
    ///
    /// Crate-private: accounts are opened through the Registry so its
    /// account index always sees them.
    pub(crate) fn create_account(&mut self, initial_balance: Decimal) -> &BankAccount {
        let account = BankAccount::new(self.id.clone(), initial_balance, self.allow_negative);
        let account_id = account.id().to_string();
        self.accounts.entry(account_id).or_insert(account)
    }

    /// Store an account opened elsewhere
    ///
    /// The account must name this bank and carry this bank's
    /// negative-balance policy.
    pub(crate) fn adopt_account(&mut self, account: BankAccount) -> Result<()> {
        if account.bank_id() != self.id {
            return Err(LedgerError::ForeignAccount {
                account_id: account.id().to_string(),
                bank_id: self.id.clone(),
            });
        }
        if account.allows_negative() != self.allow_negative {
            return Err(LedgerError::PolicyMismatch {
                account_id: account.id().to_string(),
                bank_id: self.id.clone(),
            });
        }
        self.accounts.insert(account.id().to_string(), account);
        Ok(())
    }

    /// Overwrite an owned account with an updated copy of itself
    pub(crate) fn replace_account(&mut self, account: BankAccount) {
        if account.bank_id() == self.id {
            self.accounts.insert(account.id().to_string(), account);
        }
    }

    pub fn get_account(&self, account_id: &str) -> Result<&BankAccount> {
        self.accounts
            .get(account_id)
            .ok_or_else(|| self.account_not_found(account_id))
    }

    pub fn get_account_mut(&mut self, account_id: &str) -> Result<&mut BankAccount> {
        match self.accounts.get_mut(account_id) {
            Some(account) => Ok(account),
            None => Err(LedgerError::AccountNotFound {
                account_id: account_id.to_string(),
                bank_id: self.id.clone(),
            }),
        }
    }

    pub fn accounts(&self) -> impl Iterator<Item = &BankAccount> {
        self.accounts.values()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Sum of balances across all accounts of this bank
    ///
    /// `AmountOverflow` if the sum leaves the decimal range.
    pub fn total_balance(&self) -> Result<Decimal> {
        self.accounts.values().try_fold(Decimal::ZERO, |total, account| {
            total
                .checked_add(account.balance())
                .ok_or_else(|| LedgerError::AmountOverflow {
                    account_id: account.id().to_string(),
                    amount: account.balance(),
                })
        })
    }

    /// Decide which of `account_ids` pay for `amount`
    ///
    /// Pure: nothing is withdrawn. Accounts are considered in the given order.
    pub fn select_funding(&self, account_ids: &[AccountId], amount: Decimal) -> Result<Vec<FundingLeg>> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount { amount });
        }

        let legs = match self.funding_policy {
            FundingPolicy::Split => self.split_funding(account_ids, amount)?,
            FundingPolicy::SingleAccount => self.single_account_funding(account_ids, amount)?,
        };

        debug!(
            bank_id = %self.id,
            policy = %self.funding_policy,
            %amount,
            legs = legs.len(),
            "funding selected"
        );

        Ok(legs)
    }

    fn split_funding(&self, account_ids: &[AccountId], amount: Decimal) -> Result<Vec<FundingLeg>> {
        let mut remaining = amount;
        let mut available = Decimal::ZERO;
        let mut legs = Vec::new();

        for account_id in account_ids {
            let account = self.get_account(account_id)?;

            if self.allow_negative {
                legs.push(FundingLeg {
                    account_id: account_id.clone(),
                    amount: remaining,
                });
                remaining = Decimal::ZERO;
                break;
            }

            let balance = account.balance();
            if balance > Decimal::ZERO {
                let take = remaining.min(balance);
                available = available.saturating_add(balance);
                legs.push(FundingLeg {
                    account_id: account_id.clone(),
                    amount: take,
                });
                // take <= remaining, both positive
                remaining -= take;

                if remaining <= Decimal::ZERO {
                    break;
                }
            }
        }

        if remaining > Decimal::ZERO {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available,
            });
        }

        Ok(legs)
    }

    fn single_account_funding(&self, account_ids: &[AccountId], amount: Decimal) -> Result<Vec<FundingLeg>> {
        let mut best: Option<Decimal> = None;

        for account_id in account_ids {
            let account = self.get_account(account_id)?;
            if account.has_sufficient_funds(amount) {
                return Ok(vec![FundingLeg {
                    account_id: account_id.clone(),
                    amount,
                }]);
            }
            let balance = account.balance();
            best = Some(best.map_or(balance, |b| b.max(balance)));
        }

        Err(LedgerError::InsufficientFunds {
            requested: amount,
            available: best.unwrap_or(Decimal::ZERO),
        })
    }

    fn account_not_found(&self, account_id: &str) -> LedgerError {
        LedgerError::AccountNotFound {
            account_id: account_id.to_string(),
            bank_id: self.id.clone(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn open(bank: &mut Bank, balance: Decimal) -> AccountId {
        bank.create_account(balance).id().to_string()
    }

    #[test]
    fn test_bank_creation() {
        let bank = Bank::new(true);
        assert!(!bank.id().is_empty());
        assert!(bank.allows_negative_balance());
        assert_eq!(bank.funding_policy(), FundingPolicy::Split);
        assert_eq!(bank.account_count(), 0);
    }

    #[test]
    fn test_create_account_inherits_policy() {
        let mut bank = Bank::new(true);
        let bank_id = bank.id().to_string();
        let account = bank.create_account(dec!(25));

        assert_eq!(account.bank_id(), bank_id);
        assert!(account.allows_negative());
        assert_eq!(account.balance(), dec!(25));
    }

    #[test]
    fn test_get_account() {
        let mut bank = Bank::new(false);
        let id = open(&mut bank, dec!(5));

        assert_eq!(bank.get_account(&id).unwrap().balance(), dec!(5));
        bank.get_account_mut(&id).unwrap().deposit(dec!(5)).unwrap();
        assert_eq!(bank.get_account(&id).unwrap().balance(), dec!(10));

        let err = bank.get_account("missing").unwrap_err();
        assert_eq!(err.kind(), "AccountNotFound");
        let err = bank.get_account_mut("missing").unwrap_err();
        assert_eq!(err.kind(), "AccountNotFound");
    }

    #[test]
    fn test_total_balance() {
        let mut bank = Bank::new(true);
        open(&mut bank, dec!(10));
        open(&mut bank, dec!(-4.5));
        assert_eq!(bank.total_balance().unwrap(), dec!(5.5));
        assert_eq!(bank.accounts().count(), 2);
    }

    #[test]
    fn test_total_balance_overflow_is_an_error() {
        let mut bank = Bank::new(false);
        open(&mut bank, Decimal::MAX);
        open(&mut bank, Decimal::MAX);

        let err = bank.total_balance().unwrap_err();
        assert_eq!(err.kind(), "AmountOverflow");
    }

    #[test]
    fn test_adopt_rejects_foreign_account() {
        let mut bank = Bank::new(false);
        let foreign = BankAccount::new("elsewhere", dec!(1), false);
        let err = bank.adopt_account(foreign).unwrap_err();
        assert_eq!(err.kind(), "ForeignAccount");
        assert_eq!(bank.account_count(), 0);

        let own = BankAccount::new(bank.id().to_string(), dec!(1), false);
        bank.adopt_account(own).unwrap();
        assert_eq!(bank.account_count(), 1);
    }

    #[test]
    fn test_adopt_rejects_policy_mismatch() {
        let mut bank = Bank::new(false);
        let lenient = BankAccount::new(bank.id().to_string(), dec!(1), true);

        let err = bank.adopt_account(lenient).unwrap_err();
        assert_eq!(err.kind(), "PolicyMismatch");
        assert_eq!(bank.account_count(), 0);
    }

    #[test]
    fn test_split_funding_spans_accounts() {
        let mut bank = Bank::new(false);
        let a1 = open(&mut bank, dec!(30));
        let empty = open(&mut bank, dec!(0));
        let a3 = open(&mut bank, dec!(50));
        let a4 = open(&mut bank, dec!(100));

        let legs = bank
            .select_funding(&[a1.clone(), empty, a3.clone(), a4], dec!(60))
            .unwrap();

        assert_eq!(
            legs,
            vec![
                FundingLeg { account_id: a1, amount: dec!(30) },
                FundingLeg { account_id: a3, amount: dec!(30) },
            ]
        );
    }

    #[test]
    fn test_split_funding_insufficient() {
        let mut bank = Bank::new(false);
        let a1 = open(&mut bank, dec!(30));
        let a2 = open(&mut bank, dec!(20));

        let err = bank.select_funding(&[a1, a2], dec!(60)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                requested: dec!(60),
                available: dec!(50),
            }
        );
    }

    #[test]
    fn test_split_funding_negative_bank_uses_first_account() {
        let mut bank = Bank::new(true);
        let a1 = open(&mut bank, dec!(10));
        let a2 = open(&mut bank, dec!(1000));

        let legs = bank.select_funding(&[a1.clone(), a2], dec!(50)).unwrap();
        assert_eq!(legs, vec![FundingLeg { account_id: a1, amount: dec!(50) }]);
    }

    #[test]
    fn test_single_account_funding_does_not_split() {
        let mut bank = Bank::with_policy(false, FundingPolicy::SingleAccount);
        let a1 = open(&mut bank, dec!(30));
        let a2 = open(&mut bank, dec!(40));
        let a3 = open(&mut bank, dec!(80));

        let legs = bank
            .select_funding(&[a1.clone(), a2.clone(), a3.clone()], dec!(60))
            .unwrap();
        assert_eq!(legs, vec![FundingLeg { account_id: a3, amount: dec!(60) }]);

        let err = bank.select_funding(&[a1, a2], dec!(60)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                requested: dec!(60),
                available: dec!(40),
            }
        );
    }

    #[test]
    fn test_single_account_reports_largest_negative_balance() {
        let mut bank = Bank::with_policy(false, FundingPolicy::SingleAccount);
        let a1 = open(&mut bank, dec!(-30));
        let a2 = open(&mut bank, dec!(-5));

        let err = bank.select_funding(&[a1, a2], dec!(10)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                requested: dec!(10),
                available: dec!(-5),
            }
        );
    }

    #[test]
    fn test_select_funding_rejects_non_positive() {
        let mut bank = Bank::new(false);
        let a1 = open(&mut bank, dec!(30));
        let err = bank.select_funding(&[a1], dec!(0)).unwrap_err();
        assert_eq!(err.kind(), "InvalidAmount");
    }

    #[test]
    fn test_funding_policy_parse() {
        assert_eq!("split".parse::<FundingPolicy>().unwrap(), FundingPolicy::Split);
        assert_eq!(" Single ".parse::<FundingPolicy>().unwrap(), FundingPolicy::SingleAccount);
        assert!("random".parse::<FundingPolicy>().is_err());
        assert_eq!(FundingPolicy::SingleAccount.to_string(), "single");
    }
}

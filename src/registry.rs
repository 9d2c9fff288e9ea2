// 📚 Registry - Explicit repository of banks, users and accounts
//
// Nothing registers itself: constructors return plain entities and the
// Registry stores them when asked.
//
// Ownership:
// - banks and users are owned by the Registry
// - accounts are owned by their Bank
// - account_index maps account id → owning bank id (lookup only)
//
// Entries are never evicted; `clear()` is the only way to shrink it.

use crate::config::LedgerConfig;
use crate::entities::{Bank, BankAccount, User};
use crate::error::{LedgerError, Result};
use crate::ids::{generate_id, AccountId, BankId, UserId};
use crate::transfer::TransferReceipt;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

// ============================================================================
// REGISTRY
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Registry {
    config: LedgerConfig,
    banks: HashMap<BankId, Bank>,
    users: HashMap<UserId, User>,
    account_index: HashMap<AccountId, BankId>,
}

/// Number of registered entities per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryCounts {
    pub banks: usize,
    pub users: usize,
    pub accounts: usize,
}

/// Serializable view of the whole registry, ordered by id
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub banks: Vec<&'a Bank>,
    pub users: Vec<&'a User>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        Registry {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Registration (overwrites silently on id reuse)
    // ------------------------------------------------------------------------

    pub fn register_bank(&mut self, bank: Bank) -> BankId {
        let bank_id = bank.id().to_string();
        if self.banks.contains_key(&bank_id) {
            // Accounts of the replaced bank go with it
            self.account_index.retain(|_, owner| owner != &bank_id);
        }
        for account in bank.accounts() {
            self.account_index
                .insert(account.id().to_string(), bank_id.clone());
        }
        debug!(%bank_id, "bank registered");
        self.banks.insert(bank_id.clone(), bank);
        bank_id
    }

    pub fn register_user(&mut self, user: User) -> UserId {
        let user_id = user.id().to_string();
        debug!(%user_id, name = user.name(), "user registered");
        self.users.insert(user_id.clone(), user);
        user_id
    }

    /// Store an account in its owning bank and index it
    ///
    /// Fails with `BankNotFound` when the owning bank is not registered and
    /// `PolicyMismatch` when the account's negative-balance policy is not
    /// its bank's.
    pub fn register_account(&mut self, account: BankAccount) -> Result<AccountId> {
        let account_id = account.id().to_string();
        let bank_id = account.bank_id().to_string();

        self.require_bank_mut(&bank_id)?.adopt_account(account)?;

        self.account_index.insert(account_id.clone(), bank_id);
        Ok(account_id)
    }

    // ------------------------------------------------------------------------
    // Lookup (never fails)
    // ------------------------------------------------------------------------

    pub fn get_bank(&self, bank_id: &str) -> Option<&Bank> {
        self.banks.get(bank_id)
    }

    pub fn get_user(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    pub fn get_account(&self, account_id: &str) -> Option<&BankAccount> {
        let bank_id = self.account_index.get(account_id)?;
        self.banks.get(bank_id)?.get_account(account_id).ok()
    }

    pub fn bank_mut(&mut self, bank_id: &str) -> Option<&mut Bank> {
        self.banks.get_mut(bank_id)
    }

    pub fn user_mut(&mut self, user_id: &str) -> Option<&mut User> {
        self.users.get_mut(user_id)
    }

    pub fn account_mut(&mut self, account_id: &str) -> Option<&mut BankAccount> {
        let bank_id = self.account_index.get(account_id)?;
        self.banks.get_mut(bank_id)?.get_account_mut(account_id).ok()
    }

    /// Remove every bank, user and account
    pub fn clear(&mut self) {
        self.banks.clear();
        self.users.clear();
        self.account_index.clear();
    }

    pub fn counts(&self) -> RegistryCounts {
        RegistryCounts {
            banks: self.banks.len(),
            users: self.users.len(),
            accounts: self.account_index.len(),
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let mut banks: Vec<&Bank> = self.banks.values().collect();
        banks.sort_by(|a, b| a.id().cmp(b.id()));

        let mut users: Vec<&User> = self.users.values().collect();
        users.sort_by(|a, b| a.id().cmp(b.id()));

        Snapshot { banks, users }
    }

    // ------------------------------------------------------------------------
    // Factories (construct + register in one visible step)
    // ------------------------------------------------------------------------

    /// Create and register a bank using the configured funding policy
    pub fn create_bank(&mut self, allow_negative: bool) -> BankId {
        let bank = Bank::with_policy(allow_negative, self.config.funding_policy);
        self.register_bank(bank)
    }

    /// Create and register a bank using every configured default
    pub fn create_default_bank(&mut self) -> BankId {
        self.create_bank(self.config.default_allow_negative)
    }

    pub fn create_user(&mut self, name: impl Into<String>) -> UserId {
        self.register_user(User::new(name))
    }

    /// Open an account at `bank_id` and index it
    pub fn create_account(&mut self, bank_id: &str, initial_balance: Decimal) -> Result<AccountId> {
        let bank = self.require_bank_mut(bank_id)?;
        let account_id = bank.create_account(initial_balance).id().to_string();

        self.account_index
            .insert(account_id.clone(), bank_id.to_string());
        Ok(account_id)
    }

    /// Open an account at `bank_id` and attach it to `user_id`
    pub fn open_account(
        &mut self,
        user_id: &str,
        bank_id: &str,
        initial_balance: Decimal,
    ) -> Result<AccountId> {
        if !self.users.contains_key(user_id) {
            return Err(LedgerError::UserNotFound {
                user_id: user_id.to_string(),
            });
        }

        let account_id = self.create_account(bank_id, initial_balance)?;
        self.require_user_mut(user_id)?.add_account(account_id.clone());

        info!(%user_id, %bank_id, %account_id, %initial_balance, "account opened");
        Ok(account_id)
    }

    // ------------------------------------------------------------------------
    // Transfers
    // ------------------------------------------------------------------------

    /// Move `amount` from `from_user_id` to `to_user_id`, executed by `bank_id`
    ///
    /// The sender pays from its accounts at `bank_id` (chosen by the bank's
    /// funding policy). The recipient is credited on its first account at
    /// `to_bank_id` when that names another bank, otherwise at `bank_id`.
    ///
    /// Every check runs before the first withdrawal, so a rejected
    /// transfer leaves all balances untouched.
    pub fn send(
        &mut self,
        bank_id: &str,
        from_user_id: &str,
        to_user_id: &str,
        amount: Decimal,
        to_bank_id: Option<&str>,
    ) -> Result<TransferReceipt> {
        let result = self.execute_send(bank_id, from_user_id, to_user_id, amount, to_bank_id);

        match &result {
            Ok(receipt) => info!(
                transfer_id = %receipt.id,
                source_bank = %receipt.source_bank,
                target_bank = %receipt.target_bank,
                amount = %receipt.amount,
                legs = receipt.legs.len(),
                "transfer completed"
            ),
            Err(e) => warn!(
                %bank_id,
                from_user = %from_user_id,
                to_user = %to_user_id,
                %amount,
                kind = e.kind(),
                error = %e,
                "transfer rejected"
            ),
        }

        result
    }

    fn execute_send(
        &mut self,
        bank_id: &str,
        from_user_id: &str,
        to_user_id: &str,
        amount: Decimal,
        to_bank_id: Option<&str>,
    ) -> Result<TransferReceipt> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount { amount });
        }

        let bank = self.require_bank(bank_id)?;
        let from_user = self.require_user(from_user_id)?;
        let to_user = self.require_user(to_user_id)?;

        // 1. Payer side
        let source_accounts = from_user.accounts_in_bank(bank_id, self);
        if source_accounts.is_empty() {
            return Err(LedgerError::NoAccountsInBank {
                user_id: from_user_id.to_string(),
                bank_id: bank_id.to_string(),
            });
        }
        let legs = bank.select_funding(&source_accounts, amount)?;

        // 2. Recipient side
        let target_bank_id = match to_bank_id {
            Some(other) if other != bank_id => self.require_bank(other)?.id().to_string(),
            _ => bank_id.to_string(),
        };

        let recipient_account = to_user
            .accounts_in_bank(&target_bank_id, self)
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::NoRecipientAccount {
                user_id: to_user_id.to_string(),
                bank_id: target_bank_id.clone(),
            })?;

        // 3. Run every withdraw/deposit pair on copies of the accounts
        let mut staged: Vec<BankAccount> = Vec::new();
        for leg in &legs {
            self.stage(&mut staged, bank_id, &leg.account_id)?
                .withdraw(leg.amount)?;
            self.stage(&mut staged, &target_bank_id, &recipient_account)?
                .deposit(leg.amount)?;
        }

        // 4. All legs succeeded: write the copies back
        for account in staged {
            if let Some(owner) = self.banks.get_mut(account.bank_id()) {
                owner.replace_account(account);
            }
        }

        Ok(TransferReceipt {
            id: generate_id(),
            from_user: from_user_id.to_string(),
            to_user: to_user_id.to_string(),
            source_bank: bank_id.to_string(),
            target_bank: target_bank_id,
            recipient_account,
            amount,
            legs,
            executed_at: Utc::now(),
        })
    }

    /// Working copy of `account_id` inside `staged`, cloned on first use
    fn stage<'s>(
        &self,
        staged: &'s mut Vec<BankAccount>,
        bank_id: &str,
        account_id: &str,
    ) -> Result<&'s mut BankAccount> {
        if let Some(index) = staged.iter().position(|a| a.id() == account_id) {
            return Ok(&mut staged[index]);
        }

        let account = self.require_bank(bank_id)?.get_account(account_id)?.clone();
        let index = staged.len();
        staged.push(account);
        Ok(&mut staged[index])
    }

    // ------------------------------------------------------------------------
    // Lookup with errors
    // ------------------------------------------------------------------------

    pub(crate) fn require_bank(&self, bank_id: &str) -> Result<&Bank> {
        self.banks.get(bank_id).ok_or_else(|| LedgerError::BankNotFound {
            bank_id: bank_id.to_string(),
        })
    }

    fn require_bank_mut(&mut self, bank_id: &str) -> Result<&mut Bank> {
        self.banks
            .get_mut(bank_id)
            .ok_or_else(|| LedgerError::BankNotFound {
                bank_id: bank_id.to_string(),
            })
    }

    fn require_user(&self, user_id: &str) -> Result<&User> {
        self.users.get(user_id).ok_or_else(|| LedgerError::UserNotFound {
            user_id: user_id.to_string(),
        })
    }

    fn require_user_mut(&mut self, user_id: &str) -> Result<&mut User> {
        self.users
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::UserNotFound {
                user_id: user_id.to_string(),
            })
    }
}

// ============================================================================
// SHARED REGISTRY
// ============================================================================

/// Thread-safe handle over a Registry
///
/// `send` holds the write lock for the whole check-then-withdraw
/// sequence, so two transfers never both pass the same funds check.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        SharedRegistry {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Run `f` under the read lock
    pub fn read<R>(&self, f: impl FnOnce(&Registry) -> R) -> Result<R> {
        let guard = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(f(&guard))
    }

    /// Run `f` under the write lock
    pub fn write<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> Result<R> {
        let mut guard = self.inner.write().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(f(&mut guard))
    }

    pub fn send(
        &self,
        bank_id: &str,
        from_user_id: &str,
        to_user_id: &str,
        amount: Decimal,
        to_bank_id: Option<&str>,
    ) -> Result<TransferReceipt> {
        self.write(|registry| registry.send(bank_id, from_user_id, to_user_id, amount, to_bank_id))?
    }

    pub fn balance(&self, account_id: &str) -> Result<Option<Decimal>> {
        self.read(|registry| registry.get_account(account_id).map(|a| a.balance()))
    }
}

// ============================================================================
// TESTS
// ============================================================================

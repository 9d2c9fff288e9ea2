// 👤 User Entity - A name and the accounts it owns
//
// The user only stores account ids. Which bank an account belongs to is
// answered by resolving the id through the Registry.

use crate::ids::{generate_id, AccountId, UserId};
use crate::registry::Registry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Stable identity (UUID) - NEVER changes
    id: UserId,

    name: String,

    /// Owned accounts, in the order they were added (no duplicates)
    account_ids: Vec<AccountId>,
}

impl User {
    /// Create new user with UUID and no accounts
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_accounts(name, Vec::new())
    }

    /// Create new user owning the given accounts (duplicates are dropped)
    pub fn with_accounts(name: impl Into<String>, account_ids: Vec<AccountId>) -> Self {
        let mut user = User {
            id: generate_id(),
            name: name.into(),
            account_ids: Vec::with_capacity(account_ids.len()),
        };
        for account_id in account_ids {
            user.add_account(account_id);
        }
        user
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn account_ids(&self) -> &[AccountId] {
        &self.account_ids
    }

    /// Add an account (idempotent)
    pub fn add_account(&mut self, account_id: impl Into<AccountId>) {
        let account_id = account_id.into();
        if !self.account_ids.contains(&account_id) {
            self.account_ids.push(account_id);
        }
    }

    /// Remove an account (no-op when absent)
    pub fn remove_account(&mut self, account_id: &str) {
        self.account_ids.retain(|id| id != account_id);
    }

    /// Owned account ids held at `bank_id`, in ownership order
    ///
    /// Ids the registry cannot resolve are skipped.
    pub fn accounts_in_bank(&self, bank_id: &str, registry: &Registry) -> Vec<AccountId> {
        self.account_ids
            .iter()
            .filter(|account_id| {
                registry
                    .get_account(account_id)
                    .is_some_and(|account| account.bank_id() == bank_id)
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_user_creation() {
        let user = User::new("Alice");
        assert!(!user.id().is_empty());
        assert_eq!(user.name(), "Alice");
        assert!(user.account_ids().is_empty());
    }

    #[test]
    fn test_with_accounts_drops_duplicates() {
        let user = User::with_accounts(
            "Bob",
            vec!["a1".to_string(), "a2".to_string(), "a1".to_string()],
        );
        assert_eq!(user.account_ids(), ["a1", "a2"]);
    }

    #[test]
    fn test_add_account_is_idempotent() {
        let mut user = User::new("Alice");
        user.add_account("a1");
        user.add_account("a1");
        user.add_account("a2");
        assert_eq!(user.account_ids(), ["a1", "a2"]);
    }

    #[test]
    fn test_remove_account() {
        let mut user = User::with_accounts("Alice", vec!["a1".to_string(), "a2".to_string()]);
        user.remove_account("a1");
        assert_eq!(user.account_ids(), ["a2"]);

        // Absent id is a no-op
        user.remove_account("missing");
        assert_eq!(user.account_ids(), ["a2"]);
    }

    #[test]
    fn test_accounts_in_bank_filters_by_bank() {
        let mut registry = Registry::new();
        let b1 = registry.create_bank(false);
        let b2 = registry.create_bank(false);

        let a1 = registry.create_account(&b1, dec!(10)).unwrap();
        let a2 = registry.create_account(&b2, dec!(20)).unwrap();
        let a3 = registry.create_account(&b1, dec!(30)).unwrap();

        let user = User::with_accounts(
            "Alice",
            vec![a1.clone(), a2.clone(), "unknown".to_string(), a3.clone()],
        );

        assert_eq!(user.accounts_in_bank(&b1, &registry), vec![a1, a3]);
        assert_eq!(user.accounts_in_bank(&b2, &registry), vec![a2]);
        assert!(user.accounts_in_bank("other-bank", &registry).is_empty());
    }
}

// 🧾 Transfer Receipt - What a completed `send` did
//
// Returned to the caller, never stored: the ledger keeps balances, not a
// transaction log.

use crate::entities::FundingLeg;
use crate::ids::{AccountId, BankId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Receipt identity (UUID)
    pub id: String,

    pub from_user: UserId,
    pub to_user: UserId,

    /// Bank that executed the transfer (all legs are debited here)
    pub source_bank: BankId,

    /// Bank holding the credited account (equals source_bank when local)
    pub target_bank: BankId,

    /// Account credited with every leg
    pub recipient_account: AccountId,

    /// Total moved
    pub amount: Decimal,

    /// Withdrawals, in execution order
    pub legs: Vec<FundingLeg>,

    pub executed_at: DateTime<Utc>,
}

impl TransferReceipt {
    pub fn is_cross_bank(&self) -> bool {
        self.source_bank != self.target_bank
    }

    /// Accounts debited by this transfer
    pub fn source_accounts(&self) -> Vec<&str> {
        self.legs.iter().map(|leg| leg.account_id.as_str()).collect()
    }
}

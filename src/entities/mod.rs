// Entity Models
//
// Each entity has a stable identity (UUID) that NEVER changes.
// Constructors are plain: nothing is registered until the Registry is
// asked to.

pub mod account;
pub mod bank;
pub mod user;

pub use account::BankAccount;
pub use bank::{Bank, FundingLeg, FundingPolicy};
pub use user::User;

//! 领域服务

mod activation_ledger;
mod password_hasher;

pub use activation_ledger::ActivationLedger;
pub use password_hasher::{Argon2PasswordHasher, PasswordError, PasswordHasher};

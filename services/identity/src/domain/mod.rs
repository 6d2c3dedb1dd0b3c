//! 领域层

pub mod activation_code;
pub mod identity;
pub mod repositories;
pub mod role;
pub mod services;
pub mod unit_of_work;

pub use activation_code::{ActivationCode, ActivationCodeId, ActivationCodeState};
pub use identity::Identity;
pub use role::Role;
